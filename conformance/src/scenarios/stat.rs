//! Rstat replies.

use bytes::BytesMut;
use ninep_protocol::{DMDIR, Dir, FrameBuilder, MessageKind, Qid, Response, Tstat, decode_request};

use super::reply;
use crate::ScenarioError;

/// Declared in `nstat` by [`nstat_invalid`], far more than follows it.
const BOGUS_NSTAT: u16 = 1337;

/// The entry every successful Tstat is answered with.
pub(super) fn fixture() -> Dir {
    Dir {
        kind: 9001,
        dev: 5,
        qid: Qid {
            kind: 23,
            version: 2342,
            path: 1337,
        },
        mode: DMDIR,
        atime: 1494443596,
        mtime: 1494443609,
        length: 2342,
        name: "testfile".into(),
        uid: "testuser".into(),
        gid: "testgroup".into(),
        muid: "ken".into(),
    }
}

pub(super) fn success(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let tstat = decode_request::<Tstat>(request)?;
    reply(buf, tstat.tag, &Response::Rstat { dir: fixture() });
    Ok(())
}

/// The frame size is right; only the nested `nstat` count is wrong.
pub(super) fn nstat_invalid(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let tstat = decode_request::<Tstat>(request)?;
    let mut b = FrameBuilder::new(buf, MessageKind::Rstat, tstat.tag);
    b.u16(BOGUS_NSTAT).dir(&Dir::default());
    b.finish();
    Ok(())
}
