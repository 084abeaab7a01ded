//! Error types.
//!
//! Every error here is local to one connection. Nothing is retried.

use std::fmt;
use std::io;

use ninep_protocol::{DecodeError, MessageKind};

use crate::handoff::HandoffClosed;

/// A scenario could not produce a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    /// The request did not decode as the kind the scenario reads.
    Decode(DecodeError),
    /// The failure scenario: the control line named no known scenario.
    NotImplemented,
    /// `rread_with_offset` was asked to start past the end of its data.
    OffsetTooLarge { offset: u64, len: usize },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "malformed request: {e}"),
            Self::NotImplemented => write!(f, "not implemented"),
            Self::OffsetTooLarge { offset, len } => {
                write!(f, "offset is too large: {offset} > {len}")
            }
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for ScenarioError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// Dispatching one request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The selected scenario reads a different request kind than arrived.
    ///
    /// This is a driver misconfiguration, not a client conformance fault.
    KindMismatch { expected: MessageKind, actual: u8 },
    /// The scenario's response function failed.
    Scenario(ScenarioError),
    /// No scenario will ever arrive for this connection.
    HandoffClosed,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KindMismatch { expected, actual } => match MessageKind::from_u8(*actual) {
                Some(actual) => write!(f, "expected type {expected} - got {actual}"),
                None => write!(f, "expected type {expected} - got unknown type {actual}"),
            },
            Self::Scenario(e) => write!(f, "scenario failed: {e}"),
            Self::HandoffClosed => write!(f, "handoff closed, no scenario will arrive"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scenario(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ScenarioError> for DispatchError {
    fn from(e: ScenarioError) -> Self {
        Self::Scenario(e)
    }
}

impl From<HandoffClosed> for DispatchError {
    fn from(_: HandoffClosed) -> Self {
        Self::HandoffClosed
    }
}

/// A protocol connection ended abnormally.
#[derive(Debug)]
pub enum SessionError {
    Io(io::Error),
    /// The request frame itself is unusable.
    Frame(DecodeError),
    /// The declared size exceeds the configured maximum.
    FrameTooLarge { declared: u32, max: u32 },
    Dispatch(DispatchError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Frame(e) => write!(f, "bad request frame: {e}"),
            Self::FrameTooLarge { declared, max } => {
                write!(f, "request of {declared} bytes exceeds maximum of {max}")
            }
            Self::Dispatch(e) => write!(f, "dispatch error: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Frame(e) => Some(e),
            Self::Dispatch(e) => Some(e),
            Self::FrameTooLarge { .. } => None,
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<DecodeError> for SessionError {
    fn from(e: DecodeError) -> Self {
        Self::Frame(e)
    }
}

impl From<DispatchError> for SessionError {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

/// The server could not start.
#[derive(Debug)]
pub enum ServerError {
    Bind {
        role: &'static str,
        addr: String,
        source: io::Error,
    },
    Io(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { role, addr, source } => {
                write!(f, "failed to bind {role} listener on {addr}: {source}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for ServerError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
