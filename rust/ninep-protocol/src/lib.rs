//! 9P2000 wire types.
//!
//! This crate defines the wire format used by the fault-injection server
//! (`ninep-conformance`) and by the tests that drive it: message kinds,
//! QID and directory records, typed T-message decoding and R-message
//! encoding/decoding.
//!
//! Every message is a frame:
//!
//! ```text
//! size[4] type[1] tag[2] payload[size - 7]
//! ```
//!
//! All integers are little-endian. `size` counts the whole frame,
//! including the size field itself.

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

mod error;
mod frame;
mod record;
mod request;
mod response;

pub use error::*;
pub use frame::*;
pub use record::*;
pub use request::*;
pub use response::*;

use facet::Facet;

// =============================================================================
// Constants (version(5), intro(5))
// =============================================================================

/// Bytes in `size[4] type[1] tag[2]`.
pub const HEADER_SIZE: usize = 4 + 1 + 2;

/// Bytes in an encoded QID: `type[1] version[4] path[8]`.
pub const QID_SIZE: usize = 1 + 4 + 8;

/// Maximum number of elements in a single walk (`MAXWELEM`).
pub const MAX_WALK_ELEMENTS: usize = 16;

/// Tag used by Tversion, which has no outstanding requests to correlate.
pub const NOTAG: u16 = !0;

/// Fid meaning "no fid", e.g. the afid of an unauthenticated Tattach.
pub const NOFID: u32 = !0;

/// The only defined protocol version.
pub const VERSION_9P2000: &str = "9P2000";

/// Version string a server answers with when it does not understand the client.
pub const VERSION_UNKNOWN: &str = "unknown";

/// Length of the longest version string a server may legitimately send.
pub const MAX_VERSION_LEN: usize = VERSION_UNKNOWN.len();

/// Directory bit in `Dir::mode`.
pub const DMDIR: u32 = 0x8000_0000;

/// Directory bit in `Qid::kind`.
pub const QTDIR: u8 = 0x80;

/// First value past the last defined message kind. Never valid on the wire.
pub const LAST_KIND: u8 = 128;

// =============================================================================
// Message kinds
// =============================================================================

/// 9P2000 message type byte.
///
/// T-messages are even, their R-message is the next odd value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Facet)]
#[repr(u8)]
pub enum MessageKind {
    Tversion = 100,
    Rversion = 101,
    Tauth = 102,
    Rauth = 103,
    Tattach = 104,
    Rattach = 105,
    /// Illegal, there is no Terror.
    Terror = 106,
    Rerror = 107,
    Tflush = 108,
    Rflush = 109,
    Twalk = 110,
    Rwalk = 111,
    Topen = 112,
    Ropen = 113,
    Tcreate = 114,
    Rcreate = 115,
    Tread = 116,
    Rread = 117,
    Twrite = 118,
    Rwrite = 119,
    Tclunk = 120,
    Rclunk = 121,
    Tremove = 122,
    Rremove = 123,
    Tstat = 124,
    Rstat = 125,
    Twstat = 126,
    Rwstat = 127,
}

impl MessageKind {
    const ALL: [MessageKind; 28] = [
        Self::Tversion,
        Self::Rversion,
        Self::Tauth,
        Self::Rauth,
        Self::Tattach,
        Self::Rattach,
        Self::Terror,
        Self::Rerror,
        Self::Tflush,
        Self::Rflush,
        Self::Twalk,
        Self::Rwalk,
        Self::Topen,
        Self::Ropen,
        Self::Tcreate,
        Self::Rcreate,
        Self::Tread,
        Self::Rread,
        Self::Twrite,
        Self::Rwrite,
        Self::Tclunk,
        Self::Rclunk,
        Self::Tremove,
        Self::Rremove,
        Self::Tstat,
        Self::Rstat,
        Self::Twstat,
        Self::Rwstat,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            100..LAST_KIND => Some(Self::ALL[(value - 100) as usize]),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for T-messages (client to server).
    #[inline]
    pub const fn is_request(self) -> bool {
        (self as u8) % 2 == 0
    }

    /// The R-message answering this T-message, or `self` for R-messages.
    pub fn response(self) -> Self {
        if self.is_request() {
            Self::ALL[(self as u8 - 100 + 1) as usize]
        } else {
            self
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Tversion => "Tversion",
            Self::Rversion => "Rversion",
            Self::Tauth => "Tauth",
            Self::Rauth => "Rauth",
            Self::Tattach => "Tattach",
            Self::Rattach => "Rattach",
            Self::Terror => "Terror",
            Self::Rerror => "Rerror",
            Self::Tflush => "Tflush",
            Self::Rflush => "Rflush",
            Self::Twalk => "Twalk",
            Self::Rwalk => "Rwalk",
            Self::Topen => "Topen",
            Self::Ropen => "Ropen",
            Self::Tcreate => "Tcreate",
            Self::Rcreate => "Rcreate",
            Self::Tread => "Tread",
            Self::Rread => "Rread",
            Self::Twrite => "Twrite",
            Self::Rwrite => "Rwrite",
            Self::Tclunk => "Tclunk",
            Self::Rclunk => "Rclunk",
            Self::Tremove => "Tremove",
            Self::Rremove => "Rremove",
            Self::Tstat => "Tstat",
            Self::Rstat => "Rstat",
            Self::Twstat => "Twstat",
            Self::Rwstat => "Rwstat",
        }
    }
}

impl core::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}({})", self.name(), *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_u8() {
        for value in 100..LAST_KIND {
            let kind = MessageKind::from_u8(value).unwrap();
            assert_eq!(kind.as_u8(), value);
        }
        assert_eq!(MessageKind::from_u8(99), None);
        assert_eq!(MessageKind::from_u8(LAST_KIND), None);
    }

    #[test]
    fn test_response_kind() {
        assert_eq!(MessageKind::Tversion.response(), MessageKind::Rversion);
        assert_eq!(MessageKind::Tstat.response(), MessageKind::Rstat);
        assert_eq!(MessageKind::Rread.response(), MessageKind::Rread);
        assert!(MessageKind::Twalk.is_request());
        assert!(!MessageKind::Rwalk.is_request());
    }

    #[test]
    fn test_version_limits() {
        assert_eq!(MAX_VERSION_LEN, 7);
        assert_eq!(HEADER_SIZE, 7);
        assert_eq!(QID_SIZE, 13);
    }
}
