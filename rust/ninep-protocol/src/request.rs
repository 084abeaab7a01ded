//! T-messages.

use alloc::string::String;
use alloc::vec::Vec;

use bytes::BytesMut;

use crate::{DecodeError, FrameBuilder, FrameView, MAX_WALK_ELEMENTS, MessageKind, Reader};

/// A message paired with the tag it travelled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged<T> {
    pub tag: u16,
    pub message: T,
}

/// A T-message with a fixed type byte.
pub trait Request: Sized {
    const KIND: MessageKind;

    fn decode_body(r: &mut Reader<'_>) -> Result<Self, DecodeError>;

    fn encode_body(&self, b: &mut FrameBuilder<'_>);
}

/// Decode one complete T-message frame.
///
/// Fails if the size field does not match `frame.len()`, if the type is not
/// `T::KIND`, if a field overruns the frame, or if bytes are left over.
pub fn decode_request<T: Request>(frame: &[u8]) -> Result<Tagged<T>, DecodeError> {
    let view = FrameView::expect(frame, T::KIND)?;
    let mut r = view.reader();
    let message = T::decode_body(&mut r)?;
    r.finish()?;
    Ok(Tagged {
        tag: view.tag,
        message,
    })
}

/// Append one T-message frame to `buf`, returning its length.
pub fn encode_request<T: Request>(tag: u16, message: &T, buf: &mut BytesMut) -> usize {
    let mut b = FrameBuilder::new(buf, T::KIND, tag);
    message.encode_body(&mut b);
    b.finish()
}

/// `size[4] Tversion tag[2] msize[4] version[s]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tversion {
    pub msize: u32,
    pub version: String,
}

impl Request for Tversion {
    const KIND: MessageKind = MessageKind::Tversion;

    fn decode_body(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            msize: r.u32("msize")?,
            version: r.string("version")?,
        })
    }

    fn encode_body(&self, b: &mut FrameBuilder<'_>) {
        b.u32(self.msize).string(&self.version);
    }
}

/// `size[4] Tattach tag[2] fid[4] afid[4] uname[s] aname[s]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tattach {
    pub fid: u32,
    pub afid: u32,
    pub uname: String,
    pub aname: String,
}

impl Request for Tattach {
    const KIND: MessageKind = MessageKind::Tattach;

    fn decode_body(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            fid: r.u32("fid")?,
            afid: r.u32("afid")?,
            uname: r.string("uname")?,
            aname: r.string("aname")?,
        })
    }

    fn encode_body(&self, b: &mut FrameBuilder<'_>) {
        b.u32(self.fid)
            .u32(self.afid)
            .string(&self.uname)
            .string(&self.aname);
    }
}

/// `size[4] Tstat tag[2] fid[4]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tstat {
    pub fid: u32,
}

impl Request for Tstat {
    const KIND: MessageKind = MessageKind::Tstat;

    fn decode_body(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self { fid: r.u32("fid")? })
    }

    fn encode_body(&self, b: &mut FrameBuilder<'_>) {
        b.u32(self.fid);
    }
}

/// `size[4] Twalk tag[2] fid[4] newfid[4] nwname[2] nwname*(wname[s])`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Twalk {
    pub fid: u32,
    pub newfid: u32,
    pub wnames: Vec<String>,
}

impl Request for Twalk {
    const KIND: MessageKind = MessageKind::Twalk;

    fn decode_body(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let fid = r.u32("fid")?;
        let newfid = r.u32("newfid")?;
        let nwname = r.u16("nwname")? as usize;
        if nwname > MAX_WALK_ELEMENTS {
            return Err(DecodeError::TooManyElements {
                field: "nwname",
                count: nwname,
                max: MAX_WALK_ELEMENTS,
            });
        }
        let wnames = (0..nwname)
            .map(|_| r.string("wname"))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            fid,
            newfid,
            wnames,
        })
    }

    fn encode_body(&self, b: &mut FrameBuilder<'_>) {
        b.u32(self.fid)
            .u32(self.newfid)
            .u16(self.wnames.len() as u16);
        for name in &self.wnames {
            b.string(name);
        }
    }
}

/// `size[4] Topen tag[2] fid[4] mode[1]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topen {
    pub fid: u32,
    pub mode: u8,
}

impl Request for Topen {
    const KIND: MessageKind = MessageKind::Topen;

    fn decode_body(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            fid: r.u32("fid")?,
            mode: r.u8("mode")?,
        })
    }

    fn encode_body(&self, b: &mut FrameBuilder<'_>) {
        b.u32(self.fid).u8(self.mode);
    }
}

/// `size[4] Tcreate tag[2] fid[4] name[s] perm[4] mode[1]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tcreate {
    pub fid: u32,
    pub name: String,
    pub perm: u32,
    pub mode: u8,
}

impl Request for Tcreate {
    const KIND: MessageKind = MessageKind::Tcreate;

    fn decode_body(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            fid: r.u32("fid")?,
            name: r.string("name")?,
            perm: r.u32("perm")?,
            mode: r.u8("mode")?,
        })
    }

    fn encode_body(&self, b: &mut FrameBuilder<'_>) {
        b.u32(self.fid)
            .string(&self.name)
            .u32(self.perm)
            .u8(self.mode);
    }
}

/// `size[4] Tread tag[2] fid[4] offset[8] count[4]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tread {
    pub fid: u32,
    pub offset: u64,
    pub count: u32,
}

impl Request for Tread {
    const KIND: MessageKind = MessageKind::Tread;

    fn decode_body(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            fid: r.u32("fid")?,
            offset: r.u64("offset")?,
            count: r.u32("count")?,
        })
    }

    fn encode_body(&self, b: &mut FrameBuilder<'_>) {
        b.u32(self.fid).u64(self.offset).u32(self.count);
    }
}

/// `size[4] Twrite tag[2] fid[4] offset[8] count[4] data[count]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Twrite {
    pub fid: u32,
    pub offset: u64,
    pub data: Vec<u8>,
}

impl Request for Twrite {
    const KIND: MessageKind = MessageKind::Twrite;

    fn decode_body(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            fid: r.u32("fid")?,
            offset: r.u64("offset")?,
            data: r.data("data")?,
        })
    }

    fn encode_body(&self, b: &mut FrameBuilder<'_>) {
        b.u32(self.fid).u64(self.offset).data(&self.data);
    }
}

/// `size[4] Tclunk tag[2] fid[4]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tclunk {
    pub fid: u32,
}

impl Request for Tclunk {
    const KIND: MessageKind = MessageKind::Tclunk;

    fn decode_body(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self { fid: r.u32("fid")? })
    }

    fn encode_body(&self, b: &mut FrameBuilder<'_>) {
        b.u32(self.fid);
    }
}

/// `size[4] Tremove tag[2] fid[4]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tremove {
    pub fid: u32,
}

impl Request for Tremove {
    const KIND: MessageKind = MessageKind::Tremove;

    fn decode_body(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self { fid: r.u32("fid")? })
    }

    fn encode_body(&self, b: &mut FrameBuilder<'_>) {
        b.u32(self.fid);
    }
}
