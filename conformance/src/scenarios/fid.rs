//! Rclunk and Rremove replies.

use bytes::BytesMut;
use ninep_protocol::{Response, Tclunk, Tremove, decode_request};

use super::reply;
use crate::ScenarioError;

pub(super) fn clunk_success(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let tclunk = decode_request::<Tclunk>(request)?;
    reply(buf, tclunk.tag, &Response::Rclunk);
    Ok(())
}

pub(super) fn remove_success(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let tremove = decode_request::<Tremove>(request)?;
    reply(buf, tremove.tag, &Response::Rremove);
    Ok(())
}
