//! Malformed frame headers, sent in reply to Tversion.
//!
//! The first three replies are cut short inside the header itself. The
//! rest are a complete, correctly sized Rversion with a single header
//! field overridden.

use bytes::{BufMut, BytesMut};
use ninep_protocol::{LAST_KIND, MessageKind, Qid, Response};

use super::{reply, tamper, version};
use crate::ScenarioError;

pub(super) fn too_short1(buf: &mut BytesMut) -> Result<(), ScenarioError> {
    buf.put_u8(0);
    Ok(())
}

/// A size field alone, declaring less than a header.
pub(super) fn too_short2(buf: &mut BytesMut) -> Result<(), ScenarioError> {
    buf.put_u32_le(6);
    Ok(())
}

/// A size field alone, declaring more than is ever sent.
pub(super) fn too_large(buf: &mut BytesMut) -> Result<(), ScenarioError> {
    buf.put_u32_le(42);
    Ok(())
}

pub(super) fn wrong_type(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    version::echo(request, buf)?;
    tamper(buf)?.force_kind(MessageKind::Tversion.as_u8());
    Ok(())
}

pub(super) fn invalid_type(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    version::echo(request, buf)?;
    tamper(buf)?.force_kind(LAST_KIND);
    Ok(())
}

pub(super) fn tag_mismatch(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let tag = version::echo(request, buf)?;
    tamper(buf)?.force_tag(tag.wrapping_add(1));
    Ok(())
}

/// A well-formed reply of the wrong kind: Rattach where Rversion is due.
pub(super) fn type_mismatch(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let tversion = version::decode(request)?;
    reply(buf, tversion.tag, &Response::Rattach { qid: Qid::default() });
    Ok(())
}
