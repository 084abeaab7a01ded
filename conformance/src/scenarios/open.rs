//! Ropen and Rcreate replies.

use bytes::BytesMut;
use ninep_protocol::{Qid, Response, Tcreate, Topen, decode_request};

use super::reply;
use crate::ScenarioError;

const OPEN_IOUNIT: u32 = 1337;
const CREATE_IOUNIT: u32 = 9001;

pub(super) fn open_success(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let topen = decode_request::<Topen>(request)?;
    let response = Response::Ropen {
        qid: Qid::default(),
        iounit: OPEN_IOUNIT,
    };
    reply(buf, topen.tag, &response);
    Ok(())
}

pub(super) fn create_success(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let tcreate = decode_request::<Tcreate>(request)?;
    let response = Response::Rcreate {
        qid: Qid::default(),
        iounit: CREATE_IOUNIT,
    };
    reply(buf, tcreate.tag, &response);
    Ok(())
}
