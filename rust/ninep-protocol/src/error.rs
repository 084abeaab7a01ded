//! Decode errors.

use core::fmt;

use crate::MessageKind;

/// Why a byte sequence is not a valid 9P frame.
///
/// Header-level problems (`Truncated`, `SizeBelowHeader`, `SizeMismatch`,
/// `UnknownKind`, `UnexpectedKind`) are reported before any payload field
/// is read, so a frame whose only fault is its size prefix always decodes
/// to `SizeMismatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than the fixed header.
    Truncated { needed: usize, available: usize },
    /// The size field declares less than a header's worth of bytes.
    SizeBelowHeader { declared: u32 },
    /// The size field disagrees with the number of bytes in the frame.
    SizeMismatch { declared: u32, actual: usize },
    /// The type byte is not a 9P2000 message kind.
    UnknownKind(u8),
    /// The type byte is a valid kind, but not the one being decoded.
    UnexpectedKind {
        expected: MessageKind,
        actual: MessageKind,
    },
    /// A field extends past the end of the frame.
    FieldOverrun {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },
    /// Bytes left over after the last field.
    TrailingBytes { count: usize },
    /// A string field is not UTF-8.
    InvalidUtf8 { field: &'static str },
    /// A counted array is larger than the protocol allows.
    TooManyElements {
        field: &'static str,
        count: usize,
        max: usize,
    },
}

impl DecodeError {
    /// True if the error is about the frame's size field rather than its
    /// contents.
    pub fn is_length_error(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. } | Self::SizeBelowHeader { .. } | Self::SizeMismatch { .. }
        )
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, available } => {
                write!(f, "truncated frame: need {needed} bytes, have {available}")
            }
            Self::SizeBelowHeader { declared } => {
                write!(f, "declared size {declared} is smaller than the header")
            }
            Self::SizeMismatch { declared, actual } => {
                write!(f, "declared size {declared} but frame has {actual} bytes")
            }
            Self::UnknownKind(kind) => write!(f, "unknown message type {kind}"),
            Self::UnexpectedKind { expected, actual } => {
                write!(f, "expected {expected}, got {actual}")
            }
            Self::FieldOverrun {
                field,
                needed,
                remaining,
            } => write!(
                f,
                "field `{field}` needs {needed} bytes, only {remaining} remain"
            ),
            Self::TrailingBytes { count } => write!(f, "{count} trailing bytes after payload"),
            Self::InvalidUtf8 { field } => write!(f, "field `{field}` is not valid UTF-8"),
            Self::TooManyElements { field, count, max } => {
                write!(f, "field `{field}` has {count} elements, max is {max}")
            }
        }
    }
}

impl core::error::Error for DecodeError {}
