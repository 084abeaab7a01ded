//! Rattach replies.

use bytes::BytesMut;
use ninep_protocol::{Qid, Response, Tattach, decode_request};

use super::{reply, shorten_by_one};
use crate::ScenarioError;

pub(super) fn success(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let tattach = decode_request::<Tattach>(request)?;
    reply(buf, tattach.tag, &Response::Rattach { qid: Qid::default() });
    Ok(())
}

/// The QID ends one byte after the declared size.
pub(super) fn invalid_len(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    success(request, buf)?;
    shorten_by_one(buf)
}
