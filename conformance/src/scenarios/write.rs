//! Rwrite replies.

use bytes::BytesMut;
use ninep_protocol::{Response, Twrite, decode_request};

use super::reply;
use crate::ScenarioError;

/// Acknowledge every byte of the write.
pub(super) fn success(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let twrite = decode_request::<Twrite>(request)?;
    let count = twrite.message.data.len() as u32;
    reply(buf, twrite.tag, &Response::Rwrite { count });
    Ok(())
}
