//! Dispatcher: one scenario per request.

use bytes::BytesMut;
use tracing::debug;

use crate::handoff::ScenarioReceiver;
use crate::scenarios::ExpectedKind;
use crate::{DispatchError, ScenarioEntry};

/// Pulls the scenario for each request of one protocol connection.
#[derive(Debug)]
pub struct Dispatcher {
    slot: ScenarioReceiver,
}

impl Dispatcher {
    pub fn new(slot: ScenarioReceiver) -> Self {
        Self { slot }
    }

    /// Wait for the next scenario and answer `request` with it.
    ///
    /// `kind` is the raw type byte of `request`. On success `buf` holds the
    /// bytes to send and the entry that produced them is returned.
    pub async fn dispatch(
        &mut self,
        request: &[u8],
        kind: u8,
        buf: &mut BytesMut,
    ) -> Result<ScenarioEntry, DispatchError> {
        let entry = self.slot.recv().await?;
        debug!(
            scenario = entry.name,
            pairing = ?self.slot.pairing(),
            kind,
            "dispatching request"
        );
        apply(entry, request, kind, buf)?;
        Ok(entry)
    }
}

/// Check `kind` against what `entry` expects, then run its scenario.
pub fn apply(
    entry: ScenarioEntry,
    request: &[u8],
    kind: u8,
    buf: &mut BytesMut,
) -> Result<(), DispatchError> {
    if let ExpectedKind::Exactly(expected) = entry.expects
        && expected.as_u8() != kind
    {
        return Err(DispatchError::KindMismatch {
            expected,
            actual: kind,
        });
    }
    entry.scenario.generate(request, buf)?;
    Ok(())
}
