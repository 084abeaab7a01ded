//! Rwalk replies.

use bytes::BytesMut;
use ninep_protocol::{MAX_WALK_ELEMENTS, Qid, Response, Twalk, decode_request};

use super::{reply, tamper};
use crate::ScenarioError;

const STEP: Qid = Qid {
    kind: 42,
    version: 5,
    path: 23,
};

/// Differs from [`STEP`] in every field, to expose off-by-one indexing.
const DESTINATION: Qid = Qid {
    kind: 23,
    version: 42,
    path: 1337,
};

/// Declared by [`invalid_len`]: three bytes into the `nwqid` field.
const SHORT_SIZE: u32 = 10;

/// One QID per requested name. A walk of zero names gets zero QIDs.
pub(super) fn success(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let twalk = decode_request::<Twalk>(request)?;
    let mut qids = vec![STEP; twalk.message.wnames.len()];
    if let Some(last) = qids.last_mut() {
        *last = DESTINATION;
    }
    reply(buf, twalk.tag, &Response::Rwalk { qids });
    Ok(())
}

pub(super) fn invalid_len(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let twalk = decode_request::<Twalk>(request)?;
    let qids = vec![Qid::default(); twalk.message.wnames.len()];
    reply(buf, twalk.tag, &Response::Rwalk { qids });
    tamper(buf)?.force_size(SHORT_SIZE);
    Ok(())
}

pub(super) fn nwqid_too_large(request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let twalk = decode_request::<Twalk>(request)?;
    let qids = vec![Qid::default(); MAX_WALK_ELEMENTS + 1];
    reply(buf, twalk.tag, &Response::Rwalk { qids });
    Ok(())
}

#[cfg(test)]
mod tests {
    use ninep_protocol::{DecodeError, decode_response};

    use super::super::Scenario;
    use super::super::testing::{TAG, decoded, request, run};
    use super::*;

    fn twalk(names: &[&str]) -> BytesMut {
        request(&Twalk {
            fid: 1,
            newfid: 2,
            wnames: names.iter().map(|n| n.to_string()).collect(),
        })
    }

    fn qids(out: &[u8]) -> Vec<Qid> {
        let reply = decoded(out);
        assert_eq!(reply.tag, TAG);
        match reply.message {
            Response::Rwalk { qids } => qids,
            other => panic!("expected Rwalk, got {other:?}"),
        }
    }

    #[test]
    fn test_success_last_qid_differs() {
        let out = run(Scenario::RwalkSuccess, &twalk(&["usr", "glenda", "lib"]));
        assert_eq!(qids(&out), vec![STEP, STEP, DESTINATION]);
    }

    #[test]
    fn test_success_single_name() {
        let out = run(Scenario::RwalkSuccess, &twalk(&["tmp"]));
        assert_eq!(qids(&out), vec![DESTINATION]);
    }

    #[test]
    fn test_success_empty_walk() {
        let out = run(Scenario::RwalkSuccess, &twalk(&[]));
        assert!(qids(&out).is_empty());
    }

    #[test]
    fn test_invalid_len_declares_ten() {
        let out = run(Scenario::RwalkInvalidLen, &twalk(&["a", "b"]));
        assert_eq!(
            decode_response(&out).unwrap_err(),
            DecodeError::SizeMismatch {
                declared: SHORT_SIZE,
                actual: out.len(),
            }
        );
    }

    #[test]
    fn test_nwqid_too_large() {
        let out = run(Scenario::RwalkNwqidTooLarge, &twalk(&["a"]));
        assert_eq!(
            decode_response(&out).unwrap_err(),
            DecodeError::TooManyElements {
                field: "nwqid",
                count: 17,
                max: MAX_WALK_ELEMENTS,
            }
        );
    }
}
