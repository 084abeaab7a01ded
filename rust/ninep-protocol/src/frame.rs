//! Frame header, builder and field reader.

use alloc::string::String;
use alloc::vec::Vec;

use bytes::{Buf, BufMut, BytesMut};

use crate::{DecodeError, Dir, HEADER_SIZE, MessageKind, Qid};

/// The fixed `size[4] type[1] tag[2]` header, as found on the wire.
///
/// `kind` is kept raw so that out-of-range type bytes can be inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub size: u32,
    pub kind: u8,
    pub tag: u16,
}

impl FrameHeader {
    /// Read the header from the start of `bytes`.
    ///
    /// Only the first [`HEADER_SIZE`] bytes are looked at; the declared size
    /// is not checked against the slice.
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < HEADER_SIZE {
            return Err(DecodeError::Truncated {
                needed: HEADER_SIZE,
                available: bytes.len(),
            });
        }
        let mut b = &bytes[..HEADER_SIZE];
        Ok(Self {
            size: b.get_u32_le(),
            kind: b.get_u8(),
            tag: b.get_u16_le(),
        })
    }

    pub fn message_kind(&self) -> Option<MessageKind> {
        MessageKind::from_u8(self.kind)
    }
}

/// A frame whose header has been checked against its bytes.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub kind: MessageKind,
    pub tag: u16,
    pub body: &'a [u8],
}

impl<'a> FrameView<'a> {
    /// Check that `bytes` is exactly one frame with a known type.
    ///
    /// The size field is validated before the type byte, so a frame whose
    /// only fault is its length never reports a kind error.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let header = FrameHeader::parse(bytes)?;
        if (header.size as usize) < HEADER_SIZE {
            return Err(DecodeError::SizeBelowHeader {
                declared: header.size,
            });
        }
        if header.size as usize != bytes.len() {
            return Err(DecodeError::SizeMismatch {
                declared: header.size,
                actual: bytes.len(),
            });
        }
        let kind = header
            .message_kind()
            .ok_or(DecodeError::UnknownKind(header.kind))?;
        Ok(Self {
            kind,
            tag: header.tag,
            body: &bytes[HEADER_SIZE..],
        })
    }

    /// Like [`FrameView::parse`], but also require a specific kind.
    pub fn expect(bytes: &'a [u8], expected: MessageKind) -> Result<Self, DecodeError> {
        let view = Self::parse(bytes)?;
        if view.kind != expected {
            return Err(DecodeError::UnexpectedKind {
                expected,
                actual: view.kind,
            });
        }
        Ok(view)
    }

    pub fn reader(&self) -> Reader<'a> {
        Reader::new(self.body)
    }
}

/// Bounds-checked cursor over a frame body.
///
/// Every accessor names the field it reads so that overruns are reported
/// precisely.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, field: &'static str, needed: usize) -> Result<(), DecodeError> {
        if self.buf.remaining() < needed {
            return Err(DecodeError::FieldOverrun {
                field,
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        self.need(field, 1)?;
        Ok(self.buf.get_u8())
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16, DecodeError> {
        self.need(field, 2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        self.need(field, 4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn u64(&mut self, field: &'static str) -> Result<u64, DecodeError> {
        self.need(field, 8)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn bytes(&mut self, field: &'static str, len: usize) -> Result<&'a [u8], DecodeError> {
        self.need(field, len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// `len[2]` followed by UTF-8.
    pub fn string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let len = self.u16(field)? as usize;
        let raw = self.bytes(field, len)?;
        core::str::from_utf8(raw)
            .map(String::from)
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    /// `count[4]` followed by that many bytes.
    pub fn data(&mut self, field: &'static str) -> Result<Vec<u8>, DecodeError> {
        let len = self.u32(field)? as usize;
        Ok(self.bytes(field, len)?.to_vec())
    }

    pub fn qid(&mut self, field: &'static str) -> Result<Qid, DecodeError> {
        Ok(Qid {
            kind: self.u8(field)?,
            version: self.u32(field)?,
            path: self.u64(field)?,
        })
    }

    /// Fail if any bytes are left.
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.buf.remaining() {
            0 => Ok(()),
            count => Err(DecodeError::TrailingBytes { count }),
        }
    }
}

/// Writes one well-formed frame into a buffer.
///
/// The size prefix is reserved by [`FrameBuilder::new`] and patched by
/// [`FrameBuilder::finish`], so the header always matches what was written.
pub struct FrameBuilder<'a> {
    buf: &'a mut BytesMut,
    start: usize,
}

impl<'a> FrameBuilder<'a> {
    pub fn new(buf: &'a mut BytesMut, kind: MessageKind, tag: u16) -> Self {
        let start = buf.len();
        buf.put_u32_le(0);
        buf.put_u8(kind.as_u8());
        buf.put_u16_le(tag);
        Self { buf, start }
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.put_u8(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16_le(value);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32_le(value);
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.buf.put_u64_le(value);
        self
    }

    /// Raw bytes with no length prefix.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    /// `len[2]` followed by the string. Strings longer than `u16::MAX`
    /// bytes are cut at that length.
    pub fn string(&mut self, value: &str) -> &mut Self {
        let bytes = value.as_bytes();
        let len = bytes.len().min(u16::MAX as usize);
        self.buf.put_u16_le(len as u16);
        self.buf.put_slice(&bytes[..len]);
        self
    }

    /// `count[4]` followed by the bytes.
    pub fn data(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_u32_le(bytes.len() as u32);
        self.buf.put_slice(bytes);
        self
    }

    pub fn qid(&mut self, qid: &Qid) -> &mut Self {
        qid.encode(self.buf);
        self
    }

    pub fn dir(&mut self, dir: &Dir) -> &mut Self {
        dir.encode(self.buf);
        self
    }

    /// Patch the size prefix and return the frame length.
    pub fn finish(self) -> usize {
        let len = self.buf.len() - self.start;
        self.buf[self.start..self.start + 4].copy_from_slice(&(len as u32).to_le_bytes());
        len
    }
}

/// Header overrides for deliberately malformed frames.
///
/// Each method rewrites exactly one header field of an already finished
/// frame and leaves every other byte untouched.
#[cfg(feature = "tamper")]
pub struct Tamper<'a> {
    frame: &'a mut [u8],
}

#[cfg(feature = "tamper")]
impl<'a> Tamper<'a> {
    pub fn new(frame: &'a mut [u8]) -> Result<Self, DecodeError> {
        if frame.len() < HEADER_SIZE {
            return Err(DecodeError::Truncated {
                needed: HEADER_SIZE,
                available: frame.len(),
            });
        }
        Ok(Self { frame })
    }

    pub fn force_size(&mut self, size: u32) -> &mut Self {
        self.frame[0..4].copy_from_slice(&size.to_le_bytes());
        self
    }

    pub fn force_kind(&mut self, kind: u8) -> &mut Self {
        self.frame[4] = kind;
        self
    }

    pub fn force_tag(&mut self, tag: u16) -> &mut Self {
        self.frame[5..7].copy_from_slice(&tag.to_le_bytes());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_patches_size() {
        let mut buf = BytesMut::new();
        let len = {
            let mut b = FrameBuilder::new(&mut buf, MessageKind::Rread, 0x0102);
            b.data(b"abc");
            b.finish()
        };
        assert_eq!(len, HEADER_SIZE + 4 + 3);
        assert_eq!(&buf[..], &[14, 0, 0, 0, 117, 0x02, 0x01, 3, 0, 0, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn test_header_parse_never_reads_past_slice() {
        let err = FrameHeader::parse(&[0]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                needed: HEADER_SIZE,
                available: 1
            }
        );
    }

    #[test]
    fn test_view_reports_size_before_kind() {
        // declared 8, actual 7, and an unknown kind byte
        let bytes = [8, 0, 0, 0, 200, 0, 0];
        let err = FrameView::parse(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::SizeMismatch {
                declared: 8,
                actual: 7
            }
        );
    }

    #[test]
    fn test_view_rejects_size_below_header() {
        let bytes = [6, 0, 0, 0, 101, 0, 0];
        assert_eq!(
            FrameView::parse(&bytes).unwrap_err(),
            DecodeError::SizeBelowHeader { declared: 6 }
        );
    }

    #[test]
    fn test_reader_names_overrun_field() {
        let mut r = Reader::new(&[5, 0, b'a']);
        let err = r.string("version").unwrap_err();
        assert_eq!(
            err,
            DecodeError::FieldOverrun {
                field: "version",
                needed: 5,
                remaining: 1
            }
        );
    }

    #[test]
    fn test_reader_rejects_trailing_bytes() {
        let mut r = Reader::new(&[1, 0, 0, 0, 9]);
        assert_eq!(r.u32("fid").unwrap(), 1);
        assert_eq!(
            r.finish().unwrap_err(),
            DecodeError::TrailingBytes { count: 1 }
        );
    }

    #[cfg(feature = "tamper")]
    #[test]
    fn test_tamper_touches_one_field() {
        let mut buf = BytesMut::new();
        FrameBuilder::new(&mut buf, MessageKind::Rclunk, 7).finish();
        let original = buf.clone();

        Tamper::new(&mut buf).unwrap().force_tag(8);
        assert_eq!(buf[..5], original[..5]);
        assert_eq!(FrameHeader::parse(&buf).unwrap().tag, 8);
    }
}
