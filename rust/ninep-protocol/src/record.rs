//! QID and directory entry records (stat(5)).

use alloc::string::String;

use bytes::{BufMut, BytesMut};

use crate::{DecodeError, Reader};

/// Server-unique file identity: `type[1] version[4] path[8]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Qid {
    pub kind: u8,
    pub version: u32,
    pub path: u64,
}

impl Qid {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.kind);
        buf.put_u32_le(self.version);
        buf.put_u64_le(self.path);
    }
}

/// A machine-independent directory entry.
///
/// On the wire it is prefixed by its own `size[2]`, counting the bytes
/// that follow the size field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dir {
    /// Kernel use.
    pub kind: u16,
    /// Kernel use.
    pub dev: u32,
    pub qid: Qid,
    pub mode: u32,
    pub atime: u32,
    pub mtime: u32,
    pub length: u64,
    pub name: String,
    pub uid: String,
    pub gid: String,
    pub muid: String,
}

impl Dir {
    /// Bytes after the leading `size[2]`.
    pub fn body_len(&self) -> usize {
        2 + 4
            + crate::QID_SIZE
            + 4
            + 4
            + 4
            + 8
            + [&self.name, &self.uid, &self.gid, &self.muid]
                .iter()
                .map(|s| 2 + s.len())
                .sum::<usize>()
    }

    /// Full encoded length, including the leading `size[2]`.
    pub fn encoded_len(&self) -> usize {
        2 + self.body_len()
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.body_len() as u16);
        buf.put_u16_le(self.kind);
        buf.put_u32_le(self.dev);
        self.qid.encode(buf);
        buf.put_u32_le(self.mode);
        buf.put_u32_le(self.atime);
        buf.put_u32_le(self.mtime);
        buf.put_u64_le(self.length);
        for s in [&self.name, &self.uid, &self.gid, &self.muid] {
            buf.put_u16_le(s.len() as u16);
            buf.put_slice(s.as_bytes());
        }
    }

    /// Decode one entry, including its `size[2]` prefix, and check that the
    /// prefix matches what was read.
    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let size = r.u16("stat.size")? as usize;
        let mut body = Reader::new(r.bytes("stat", size)?);
        let dir = Self {
            kind: body.u16("stat.type")?,
            dev: body.u32("stat.dev")?,
            qid: body.qid("stat.qid")?,
            mode: body.u32("stat.mode")?,
            atime: body.u32("stat.atime")?,
            mtime: body.u32("stat.mtime")?,
            length: body.u64("stat.length")?,
            name: body.string("stat.name")?,
            uid: body.string("stat.uid")?,
            gid: body.string("stat.gid")?,
            muid: body.string("stat.muid")?,
        };
        body.finish()?;
        Ok(dir)
    }
}
