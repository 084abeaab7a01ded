//! R-messages.

use alloc::string::String;
use alloc::vec::Vec;

use bytes::BytesMut;

use crate::{
    DecodeError, Dir, FrameBuilder, FrameView, MAX_WALK_ELEMENTS, MessageKind, Qid, Reader,
    Tagged,
};

/// Every R-message a 9P2000 server can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `msize[4] version[s]`
    Rversion { msize: u32, version: String },
    /// `aqid[13]`
    Rauth { aqid: Qid },
    /// `qid[13]`
    Rattach { qid: Qid },
    /// `ename[s]`
    Rerror { ename: String },
    Rflush,
    /// `nwqid[2] nwqid*(wqid[13])`
    Rwalk { qids: Vec<Qid> },
    /// `qid[13] iounit[4]`
    Ropen { qid: Qid, iounit: u32 },
    /// `qid[13] iounit[4]`
    Rcreate { qid: Qid, iounit: u32 },
    /// `count[4] data[count]`
    Rread { data: Vec<u8> },
    /// `count[4]`
    Rwrite { count: u32 },
    Rclunk,
    Rremove,
    /// `stat[n]`, i.e. `nstat[2]` followed by one directory entry.
    Rstat { dir: Dir },
    Rwstat,
}

impl Response {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Rversion { .. } => MessageKind::Rversion,
            Self::Rauth { .. } => MessageKind::Rauth,
            Self::Rattach { .. } => MessageKind::Rattach,
            Self::Rerror { .. } => MessageKind::Rerror,
            Self::Rflush => MessageKind::Rflush,
            Self::Rwalk { .. } => MessageKind::Rwalk,
            Self::Ropen { .. } => MessageKind::Ropen,
            Self::Rcreate { .. } => MessageKind::Rcreate,
            Self::Rread { .. } => MessageKind::Rread,
            Self::Rwrite { .. } => MessageKind::Rwrite,
            Self::Rclunk => MessageKind::Rclunk,
            Self::Rremove => MessageKind::Rremove,
            Self::Rstat { .. } => MessageKind::Rstat,
            Self::Rwstat => MessageKind::Rwstat,
        }
    }

    /// Append this response as one frame, returning its length.
    ///
    /// Field limits that only the reader enforces (e.g. `MAX_WALK_ELEMENTS`)
    /// are not checked here.
    pub fn encode(&self, tag: u16, buf: &mut BytesMut) -> usize {
        let mut b = FrameBuilder::new(buf, self.kind(), tag);
        match self {
            Self::Rversion { msize, version } => {
                b.u32(*msize).string(version);
            }
            Self::Rauth { aqid: qid } | Self::Rattach { qid } => {
                b.qid(qid);
            }
            Self::Rerror { ename } => {
                b.string(ename);
            }
            Self::Rwalk { qids } => {
                b.u16(qids.len() as u16);
                for qid in qids {
                    b.qid(qid);
                }
            }
            Self::Ropen { qid, iounit } | Self::Rcreate { qid, iounit } => {
                b.qid(qid).u32(*iounit);
            }
            Self::Rread { data } => {
                b.data(data);
            }
            Self::Rwrite { count } => {
                b.u32(*count);
            }
            Self::Rstat { dir } => {
                b.u16(dir.encoded_len() as u16).dir(dir);
            }
            Self::Rflush | Self::Rclunk | Self::Rremove | Self::Rwstat => {}
        }
        b.finish()
    }
}

/// Decode one complete R-message frame.
///
/// This is strict: the size field must match `frame.len()`, every field
/// must fit, nested sizes must agree and nothing may trail the payload.
pub fn decode_response(frame: &[u8]) -> Result<Tagged<Response>, DecodeError> {
    let view = FrameView::parse(frame)?;
    let mut r = view.reader();
    let message = match view.kind {
        MessageKind::Rversion => Response::Rversion {
            msize: r.u32("msize")?,
            version: r.string("version")?,
        },
        MessageKind::Rauth => Response::Rauth {
            aqid: r.qid("aqid")?,
        },
        MessageKind::Rattach => Response::Rattach { qid: r.qid("qid")? },
        MessageKind::Rerror => Response::Rerror {
            ename: r.string("ename")?,
        },
        MessageKind::Rflush => Response::Rflush,
        MessageKind::Rwalk => {
            let nwqid = r.u16("nwqid")? as usize;
            if nwqid > MAX_WALK_ELEMENTS {
                return Err(DecodeError::TooManyElements {
                    field: "nwqid",
                    count: nwqid,
                    max: MAX_WALK_ELEMENTS,
                });
            }
            let qids = (0..nwqid)
                .map(|_| r.qid("wqid"))
                .collect::<Result<_, _>>()?;
            Response::Rwalk { qids }
        }
        MessageKind::Ropen => Response::Ropen {
            qid: r.qid("qid")?,
            iounit: r.u32("iounit")?,
        },
        MessageKind::Rcreate => Response::Rcreate {
            qid: r.qid("qid")?,
            iounit: r.u32("iounit")?,
        },
        MessageKind::Rread => Response::Rread {
            data: r.data("data")?,
        },
        MessageKind::Rwrite => Response::Rwrite {
            count: r.u32("count")?,
        },
        MessageKind::Rclunk => Response::Rclunk,
        MessageKind::Rremove => Response::Rremove,
        MessageKind::Rstat => {
            let nstat = r.u16("nstat")? as usize;
            let mut stat = Reader::new(r.bytes("stat", nstat)?);
            let dir = Dir::decode(&mut stat)?;
            stat.finish()?;
            Response::Rstat { dir }
        }
        MessageKind::Rwstat => Response::Rwstat,
        request => {
            return Err(DecodeError::UnexpectedKind {
                expected: request.response(),
                actual: request,
            });
        }
    };
    r.finish()?;
    Ok(Tagged {
        tag: view.tag,
        message,
    })
}
