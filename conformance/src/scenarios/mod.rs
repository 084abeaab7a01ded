//! Response and corruption library.
//!
//! Each scenario reads one decoded request and writes one reply into a
//! caller-owned buffer. Success scenarios write a well-formed R-message.
//! Corruption scenarios write a reply that is wrong in exactly the one
//! dimension reported by [`Scenario::fault`], so a client that rejects it
//! can only be rejecting that fault.
//!
//! Scenarios are grouped by the request they answer:
//!
//! - `header`: malformed frame headers, in reply to Tversion
//! - `version`: Rversion
//! - `attach`: Rattach
//! - `stat`: Rstat
//! - `walk`: Rwalk
//! - `open`: Ropen and Rcreate
//! - `read`: Rread
//! - `write`: Rwrite
//! - `fid`: Rclunk and Rremove

mod attach;
mod fid;
mod header;
mod open;
mod read;
mod stat;
mod version;
mod walk;
mod write;

use std::fmt;

use bytes::BytesMut;
use ninep_protocol::{MessageKind, Response, Tamper};

use crate::ScenarioError;

pub use read::{READ_HELLO, READ_REFERENCE};

/// The request kind a scenario accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedKind {
    /// Accept any request. Only the failure scenario uses this.
    Any,
    Exactly(MessageKind),
}

impl ExpectedKind {
    /// Whether a request with type byte `kind` may be handed to the scenario.
    pub fn admits(self, kind: u8) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(expected) => expected.as_u8() == kind,
        }
    }
}

impl fmt::Display for ExpectedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Exactly(kind) => write!(f, "{}", kind.name()),
        }
    }
}

/// The one aspect of the reply a scenario gets wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// A correct reply.
    None,
    /// The size field disagrees with the bytes sent.
    Length,
    /// The type byte is not the expected R-message.
    Kind,
    /// The tag does not echo the request.
    Tag,
    /// The frame is consistent but a nested count or size is not.
    Payload,
    /// A counted field is one unit past the protocol maximum.
    Oversized,
    /// The reply parses but a field value must be rejected.
    Semantic,
    /// No reply is produced.
    Unimplemented,
}

impl Fault {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Length => "length",
            Self::Kind => "kind",
            Self::Tag => "tag",
            Self::Payload => "payload",
            Self::Oversized => "oversized",
            Self::Semantic => "semantic",
            Self::Unimplemented => "unimplemented",
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every response behavior the server can be scripted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    HeaderTooShort1,
    HeaderTooShort2,
    HeaderTooLarge,
    HeaderWrongType,
    HeaderInvalidType,
    HeaderTagMismatch,
    HeaderTypeMismatch,

    RversionSuccess,
    RversionUnknown,
    RversionMsizeTooBig,
    RversionInvalid,
    RversionInvalidLen,
    RversionVersionTooLong,

    RattachSuccess,
    RattachInvalidLen,

    RstatSuccess,
    RstatNstatInvalid,

    RwalkSuccess,
    RwalkInvalidLen,
    RwalkNwqidTooLarge,

    RopenSuccess,
    RcreateSuccess,

    RreadSuccess,
    RreadWithOffset,
    RreadCountZero,

    RwriteSuccess,

    RclunkSuccess,
    RremoveSuccess,

    /// Stands in for an unknown scenario name. Always fails.
    Failure,
}

impl Scenario {
    /// Every named scenario, in catalogue order. Excludes [`Scenario::Failure`].
    pub const ALL: &'static [Scenario] = &[
        Self::HeaderTooShort1,
        Self::HeaderTooShort2,
        Self::HeaderTooLarge,
        Self::HeaderWrongType,
        Self::HeaderInvalidType,
        Self::HeaderTagMismatch,
        Self::HeaderTypeMismatch,
        Self::RversionSuccess,
        Self::RversionUnknown,
        Self::RversionMsizeTooBig,
        Self::RversionInvalid,
        Self::RversionInvalidLen,
        Self::RversionVersionTooLong,
        Self::RattachSuccess,
        Self::RattachInvalidLen,
        Self::RstatSuccess,
        Self::RstatNstatInvalid,
        Self::RwalkSuccess,
        Self::RwalkInvalidLen,
        Self::RwalkNwqidTooLarge,
        Self::RopenSuccess,
        Self::RcreateSuccess,
        Self::RreadSuccess,
        Self::RreadWithOffset,
        Self::RreadCountZero,
        Self::RwriteSuccess,
        Self::RclunkSuccess,
        Self::RremoveSuccess,
    ];

    /// The name a driver writes to the control socket.
    pub fn name(self) -> &'static str {
        match self {
            Self::HeaderTooShort1 => "header_too_short1",
            Self::HeaderTooShort2 => "header_too_short2",
            Self::HeaderTooLarge => "header_too_large",
            Self::HeaderWrongType => "header_wrong_type",
            Self::HeaderInvalidType => "header_invalid_type",
            Self::HeaderTagMismatch => "header_tag_mismatch",
            Self::HeaderTypeMismatch => "header_type_mismatch",
            Self::RversionSuccess => "rversion_success",
            Self::RversionUnknown => "rversion_unknown",
            Self::RversionMsizeTooBig => "rversion_msize_too_big",
            Self::RversionInvalid => "rversion_invalid",
            Self::RversionInvalidLen => "rversion_invalid_len",
            Self::RversionVersionTooLong => "rversion_version_too_long",
            Self::RattachSuccess => "rattach_success",
            Self::RattachInvalidLen => "rattach_invalid_len",
            Self::RstatSuccess => "rstat_success",
            Self::RstatNstatInvalid => "rstat_nstat_invalid",
            Self::RwalkSuccess => "rwalk_success",
            Self::RwalkInvalidLen => "rwalk_invalid_len",
            Self::RwalkNwqidTooLarge => "rwalk_nwqid_too_large",
            Self::RopenSuccess => "ropen_success",
            Self::RcreateSuccess => "rcreate_success",
            Self::RreadSuccess => "rread_success",
            Self::RreadWithOffset => "rread_with_offset",
            Self::RreadCountZero => "rread_count_zero",
            Self::RwriteSuccess => "rwrite_success",
            Self::RclunkSuccess => "rclunk_success",
            Self::RremoveSuccess => "rremove_success",
            Self::Failure => "failure",
        }
    }

    /// The request kind this scenario answers.
    pub fn expects(self) -> ExpectedKind {
        use MessageKind::*;
        let kind = match self {
            Self::HeaderTooShort1
            | Self::HeaderTooShort2
            | Self::HeaderTooLarge
            | Self::HeaderWrongType
            | Self::HeaderInvalidType
            | Self::HeaderTagMismatch
            | Self::HeaderTypeMismatch
            | Self::RversionSuccess
            | Self::RversionUnknown
            | Self::RversionMsizeTooBig
            | Self::RversionInvalid
            | Self::RversionInvalidLen
            | Self::RversionVersionTooLong => Tversion,
            Self::RattachSuccess | Self::RattachInvalidLen => Tattach,
            Self::RstatSuccess | Self::RstatNstatInvalid => Tstat,
            Self::RwalkSuccess | Self::RwalkInvalidLen | Self::RwalkNwqidTooLarge => Twalk,
            Self::RopenSuccess => Topen,
            Self::RcreateSuccess => Tcreate,
            Self::RreadSuccess | Self::RreadWithOffset | Self::RreadCountZero => Tread,
            Self::RwriteSuccess => Twrite,
            Self::RclunkSuccess => Tclunk,
            Self::RremoveSuccess => Tremove,
            Self::Failure => return ExpectedKind::Any,
        };
        ExpectedKind::Exactly(kind)
    }

    pub fn fault(self) -> Fault {
        match self {
            Self::HeaderTooShort1
            | Self::HeaderTooShort2
            | Self::HeaderTooLarge
            | Self::RversionInvalidLen
            | Self::RattachInvalidLen
            | Self::RwalkInvalidLen => Fault::Length,
            Self::HeaderWrongType | Self::HeaderInvalidType | Self::HeaderTypeMismatch => {
                Fault::Kind
            }
            Self::HeaderTagMismatch => Fault::Tag,
            Self::RstatNstatInvalid => Fault::Payload,
            Self::RversionVersionTooLong | Self::RwalkNwqidTooLarge => Fault::Oversized,
            Self::RversionUnknown
            | Self::RversionMsizeTooBig
            | Self::RversionInvalid
            | Self::RreadCountZero => Fault::Semantic,
            Self::RversionSuccess
            | Self::RattachSuccess
            | Self::RstatSuccess
            | Self::RwalkSuccess
            | Self::RopenSuccess
            | Self::RcreateSuccess
            | Self::RreadSuccess
            | Self::RreadWithOffset
            | Self::RwriteSuccess
            | Self::RclunkSuccess
            | Self::RremoveSuccess => Fault::None,
            Self::Failure => Fault::Unimplemented,
        }
    }

    /// Group used for listing, named after the module implementing it.
    pub fn category(self) -> &'static str {
        match self.expects() {
            _ if self.name().starts_with("header_") => "header",
            ExpectedKind::Exactly(MessageKind::Tversion) => "version",
            ExpectedKind::Exactly(MessageKind::Tattach) => "attach",
            ExpectedKind::Exactly(MessageKind::Tstat) => "stat",
            ExpectedKind::Exactly(MessageKind::Twalk) => "walk",
            ExpectedKind::Exactly(MessageKind::Topen | MessageKind::Tcreate) => "open",
            ExpectedKind::Exactly(MessageKind::Tread) => "read",
            ExpectedKind::Exactly(MessageKind::Twrite) => "write",
            ExpectedKind::Exactly(MessageKind::Tclunk | MessageKind::Tremove) => "fid",
            _ => "failure",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::HeaderTooShort1 => "a single byte, shorter than the size field",
            Self::HeaderTooShort2 => "only a size field, declaring 6 bytes",
            Self::HeaderTooLarge => "only a size field, declaring 42 bytes",
            Self::HeaderWrongType => "Rversion carrying the Tversion type byte",
            Self::HeaderInvalidType => "Rversion carrying an out-of-range type byte",
            Self::HeaderTagMismatch => "Rversion whose tag is the request tag plus one",
            Self::HeaderTypeMismatch => "a valid Rattach in reply to Tversion",
            Self::RversionSuccess => "echoes msize and version",
            Self::RversionUnknown => "version \"unknown\"",
            Self::RversionMsizeTooBig => "msize one larger than requested",
            Self::RversionInvalid => "version \"9P20009P2000\"",
            Self::RversionInvalidLen => "size field one byte short",
            Self::RversionVersionTooLong => "version one byte longer than \"unknown\"",
            Self::RattachSuccess => "zero qid",
            Self::RattachInvalidLen => "zero qid, size field one byte short",
            Self::RstatSuccess => "a fixed directory entry",
            Self::RstatNstatInvalid => "nstat of 1337 before an empty entry",
            Self::RwalkSuccess => "one qid per name, the last one distinct",
            Self::RwalkInvalidLen => "size field of 10",
            Self::RwalkNwqidTooLarge => "17 qids, one more than MAXWELEM",
            Self::RopenSuccess => "zero qid, iounit 1337",
            Self::RcreateSuccess => "zero qid, iounit 9001",
            Self::RreadSuccess => "data \"Hello!\" whatever the count",
            Self::RreadWithOffset => "offset and count applied to \"1234567890\"",
            Self::RreadCountZero => "empty data",
            Self::RwriteSuccess => "count equal to the bytes written",
            Self::RclunkSuccess => "empty Rclunk",
            Self::RremoveSuccess => "empty Rremove",
            Self::Failure => "fails with \"not implemented\"",
        }
    }

    /// Produce the reply to `request` in `buf`.
    ///
    /// `buf` is cleared first; on error its contents are unspecified and
    /// must not be sent.
    pub fn generate(self, request: &[u8], buf: &mut BytesMut) -> Result<(), ScenarioError> {
        buf.clear();
        match self {
            Self::HeaderTooShort1 => header::too_short1(buf),
            Self::HeaderTooShort2 => header::too_short2(buf),
            Self::HeaderTooLarge => header::too_large(buf),
            Self::HeaderWrongType => header::wrong_type(request, buf),
            Self::HeaderInvalidType => header::invalid_type(request, buf),
            Self::HeaderTagMismatch => header::tag_mismatch(request, buf),
            Self::HeaderTypeMismatch => header::type_mismatch(request, buf),
            Self::RversionSuccess => version::success(request, buf),
            Self::RversionUnknown => version::unknown(request, buf),
            Self::RversionMsizeTooBig => version::msize_too_big(request, buf),
            Self::RversionInvalid => version::invalid(request, buf),
            Self::RversionInvalidLen => version::invalid_len(request, buf),
            Self::RversionVersionTooLong => version::version_too_long(request, buf),
            Self::RattachSuccess => attach::success(request, buf),
            Self::RattachInvalidLen => attach::invalid_len(request, buf),
            Self::RstatSuccess => stat::success(request, buf),
            Self::RstatNstatInvalid => stat::nstat_invalid(request, buf),
            Self::RwalkSuccess => walk::success(request, buf),
            Self::RwalkInvalidLen => walk::invalid_len(request, buf),
            Self::RwalkNwqidTooLarge => walk::nwqid_too_large(request, buf),
            Self::RopenSuccess => open::open_success(request, buf),
            Self::RcreateSuccess => open::create_success(request, buf),
            Self::RreadSuccess => read::success(request, buf),
            Self::RreadWithOffset => read::with_offset(request, buf),
            Self::RreadCountZero => read::count_zero(request, buf),
            Self::RwriteSuccess => write::success(request, buf),
            Self::RclunkSuccess => fid::clunk_success(request, buf),
            Self::RremoveSuccess => fid::remove_success(request, buf),
            Self::Failure => Err(ScenarioError::NotImplemented),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Write `response` as the whole contents of `buf`.
fn reply(buf: &mut BytesMut, tag: u16, response: &Response) -> usize {
    buf.clear();
    response.encode(tag, buf)
}

/// Header overrides on the frame in `buf`.
fn tamper(buf: &mut BytesMut) -> Result<Tamper<'_>, ScenarioError> {
    Ok(Tamper::new(buf)?)
}

/// Overwrite the size field with the real length minus one.
fn shorten_by_one(buf: &mut BytesMut) -> Result<(), ScenarioError> {
    let declared = buf.len() as u32 - 1;
    tamper(buf)?.force_size(declared);
    Ok(())
}
