//! Scripted fault-injection 9P2000 server.
//!
//! This crate provides a server that client implementations can use to
//! check how they handle well-formed, semantically invalid and corrupt
//! replies. A test driver picks a scenario by name on the control socket,
//! then the client under test sends its request on the protocol socket and
//! receives exactly the bytes that scenario produces.
//!
//! # Usage
//!
//! ```bash
//! ninep-fault-server --control-addr 127.0.0.1:2342 --protocol-addr 127.0.0.1:4223
//! ```
//!
//! A driver then does:
//!
//! 1. connect to the control port and write `rversion_success\n`
//! 2. connect to the protocol port and send a Tversion
//! 3. read back the Rversion
//!
//! The control connection may stay open and send one name per request.
//! Each request consumes exactly one name and waits until one is there.
//!
//! # Pairing
//!
//! By default each control connection feeds one protocol connection at a
//! time, matched oldest first, so several driver/client pairs can run at
//! once. Either side may outlive the other: an open control connection
//! moves on to the next protocol connection, and a protocol connection
//! whose control connection closed waits for the next one. `--handoff
//! global` restores a single slot shared by every connection.
//!
//! # Failures
//!
//! An unknown scenario name selects a scenario that fails the next
//! request of any kind; the protocol connection is then closed without a
//! reply. A request of a different kind than the selected scenario reads
//! also closes the connection.

pub mod config;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod handoff;
pub mod registry;
pub mod scenarios;
pub mod server;
pub mod session;

pub use config::ServerConfig;
pub use dispatch::Dispatcher;
pub use error::{DispatchError, ScenarioError, ServerError, SessionError};
pub use handoff::{HandoffClosed, HandoffHub, HandoffMode, ScenarioReceiver, ScenarioSender};
pub use registry::{ScenarioEntry, ScenarioRegistry};
pub use scenarios::{ExpectedKind, Fault, Scenario};
pub use server::Server;
pub use session::ProtocolSession;
