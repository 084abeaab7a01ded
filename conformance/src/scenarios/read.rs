//! Rread replies.

use bytes::BytesMut;
use ninep_protocol::{Response, Tread, decode_request};

use super::reply;
use crate::ScenarioError;

/// Returned by `rread_success` whatever the request asks for.
pub const READ_HELLO: &[u8] = b"Hello!";

/// The file `rread_with_offset` serves.
pub const READ_REFERENCE: &[u8] = b"1234567890";

pub(super) fn success(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let tread = decode_request::<Tread>(request)?;
    let response = Response::Rread {
        data: READ_HELLO.to_vec(),
    };
    reply(buf, tread.tag, &response);
    Ok(())
}

/// Serve `count` bytes of [`READ_REFERENCE`] from `offset`.
///
/// A read that runs past the end is cut at the end, so an offset of
/// exactly the length yields empty data. Only an offset past the end is an
/// error.
pub(super) fn with_offset(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let tread = decode_request::<Tread>(request)?;
    let Tread { offset, count, .. } = tread.message;
    let len = READ_REFERENCE.len();
    if offset > len as u64 {
        return Err(ScenarioError::OffsetTooLarge { offset, len });
    }
    let start = offset as usize;
    let end = start.saturating_add(count as usize).min(len);
    let response = Response::Rread {
        data: READ_REFERENCE[start..end].to_vec(),
    };
    reply(buf, tread.tag, &response);
    Ok(())
}

pub(super) fn count_zero(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let tread = decode_request::<Tread>(request)?;
    reply(buf, tread.tag, &Response::Rread { data: Vec::new() });
    Ok(())
}
