//! Rversion replies.

use bytes::BytesMut;
use ninep_protocol::{Response, Tagged, Tversion, VERSION_UNKNOWN, decode_request};

use super::{reply, shorten_by_one};
use crate::ScenarioError;

/// One byte longer than the longest valid version string.
const VERSION_TOO_LONG: &str = "12345678";

pub(super) fn decode(request: &[u8]) -> Result<Tagged<Tversion>, ScenarioError> {
    Ok(decode_request::<Tversion>(request)?)
}

fn rversion(buf: &mut BytesMut, tag: u16, msize: u32, version: &str) {
    reply(
        buf,
        tag,
        &Response::Rversion {
            msize,
            version: version.into(),
        },
    );
}

/// Write the Rversion that echoes `request`, returning the request tag.
pub(super) fn echo(request: &[u8], buf: &mut BytesMut) -> Result<u16, ScenarioError> {
    let Tagged { tag, message } = decode(request)?;
    rversion(buf, tag, message.msize, &message.version);
    Ok(tag)
}

pub(super) fn success(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    echo(request, buf)?;
    Ok(())
}

pub(super) fn unknown(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let Tagged { tag, message } = decode(request)?;
    rversion(buf, tag, message.msize, VERSION_UNKNOWN);
    Ok(())
}

pub(super) fn msize_too_big(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let Tagged { tag, message } = decode(request)?;
    rversion(buf, tag, message.msize.wrapping_add(1), &message.version);
    Ok(())
}

pub(super) fn invalid(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let Tagged { tag, message } = decode(request)?;
    rversion(buf, tag, message.msize, "9P20009P2000");
    Ok(())
}

pub(super) fn invalid_len(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    echo(request, buf)?;
    shorten_by_one(buf)
}

pub(super) fn version_too_long(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let Tagged { tag, message } = decode(request)?;
    rversion(buf, tag, message.msize, VERSION_TOO_LONG);
    Ok(())
}
