//! Handoff between control connections and protocol connections.
//!
//! A control connection pushes [`ScenarioEntry`] values through a
//! [`ScenarioSender`]; a protocol session pulls exactly one per request
//! through a [`ScenarioReceiver`]. Every channel holds a single entry, so a
//! control connection that runs ahead blocks until the matching request
//! has consumed the previous one.
//!
//! In paired mode a control channel is bound to one protocol connection at
//! a time. When the protocol connection ends, an open control channel is
//! handed to the next protocol connection; when the control connection
//! ends, its protocol connection is bound to the next free control channel.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc, oneshot};

use crate::ScenarioEntry;

/// Entries buffered per channel.
const SLOT_CAPACITY: usize = 1;

/// How control connections are matched to protocol connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandoffMode {
    /// Each control channel feeds one protocol connection at a time, matched
    /// oldest first.
    #[default]
    Paired,
    /// One slot shared by every connection. Only one pair may run at a time.
    Global,
}

impl HandoffMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paired => "paired",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for HandoffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `--handoff` value that is neither `paired` nor `global`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseHandoffModeError(String);

impl fmt::Display for ParseHandoffModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown handoff mode {:?}, expected \"paired\" or \"global\"",
            self.0
        )
    }
}

impl std::error::Error for ParseHandoffModeError {}

impl FromStr for HandoffMode {
    type Err = ParseHandoffModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paired" => Ok(Self::Paired),
            "global" => Ok(Self::Global),
            _ => Err(ParseHandoffModeError(s.to_string())),
        }
    }
}

/// No entry will ever arrive: the hub behind this end is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffClosed;

impl fmt::Display for HandoffClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("handoff closed")
    }
}

impl std::error::Error for HandoffClosed {}

/// A control channel and the id of the control connection feeding it.
type Binding = (u64, mpsc::Receiver<ScenarioEntry>);

#[derive(Default)]
struct Pairings {
    next_control: u64,
    next_protocol: u64,
    /// Control channels not bound to any protocol connection.
    idle: BTreeMap<u64, mpsc::Receiver<ScenarioEntry>>,
    /// Protocol connections waiting for a control channel.
    waiting: BTreeMap<u64, oneshot::Sender<Binding>>,
}

impl Pairings {
    /// Bind a control channel to the oldest waiting protocol connection, or
    /// park it until one asks.
    fn offer(&mut self, control: u64, mut rx: mpsc::Receiver<ScenarioEntry>) {
        if rx.is_closed() && rx.is_empty() {
            return;
        }
        while let Some((_, waiting)) = self.waiting.pop_first() {
            match waiting.send((control, rx)) {
                Ok(()) => return,
                Err((_, back)) => rx = back,
            }
        }
        self.idle.insert(control, rx);
    }

    /// Take the oldest parked control channel for `protocol`, or queue it.
    fn claim(&mut self, protocol: u64) -> Source {
        match self.idle.pop_first() {
            Some(binding) => Source::Bound(binding),
            None => {
                let (tx, rx) = oneshot::channel();
                self.waiting.insert(protocol, tx);
                Source::Pending(rx)
            }
        }
    }
}

enum Slots {
    Global {
        tx: mpsc::Sender<ScenarioEntry>,
        rx: Arc<AsyncMutex<mpsc::Receiver<ScenarioEntry>>>,
    },
    Paired(Arc<Mutex<Pairings>>),
}

/// Hands out the two ends of every control/protocol pairing.
///
/// Dropping the hub closes every handoff once the channels already bound
/// to protocol connections run dry.
pub struct HandoffHub {
    slots: Slots,
}

impl HandoffHub {
    pub fn new(mode: HandoffMode) -> Self {
        let slots = match mode {
            HandoffMode::Paired => Slots::Paired(Arc::new(Mutex::new(Pairings::default()))),
            HandoffMode::Global => {
                let (tx, rx) = mpsc::channel(SLOT_CAPACITY);
                Slots::Global {
                    tx,
                    rx: Arc::new(AsyncMutex::new(rx)),
                }
            }
        };
        Self { slots }
    }

    pub fn mode(&self) -> HandoffMode {
        match self.slots {
            Slots::Global { .. } => HandoffMode::Global,
            Slots::Paired(_) => HandoffMode::Paired,
        }
    }

    /// Register a newly accepted control connection.
    pub fn open_control(&self) -> ScenarioSender {
        match &self.slots {
            Slots::Global { tx, .. } => ScenarioSender {
                tx: tx.clone(),
                pairing: None,
                hub: Weak::new(),
            },
            Slots::Paired(pairings) => {
                let (tx, rx) = mpsc::channel(SLOT_CAPACITY);
                let mut p = pairings.lock();
                let id = p.next_control;
                p.next_control += 1;
                p.offer(id, rx);
                ScenarioSender {
                    tx,
                    pairing: Some(id),
                    hub: Arc::downgrade(pairings),
                }
            }
        }
    }

    /// Register a newly accepted protocol connection.
    pub fn open_protocol(&self) -> ScenarioReceiver {
        match &self.slots {
            Slots::Global { rx, .. } => ScenarioReceiver {
                source: Source::Shared(rx.clone()),
                id: 0,
                hub: Weak::new(),
            },
            Slots::Paired(pairings) => {
                let mut p = pairings.lock();
                let id = p.next_protocol;
                p.next_protocol += 1;
                let source = p.claim(id);
                ScenarioReceiver {
                    source,
                    id,
                    hub: Arc::downgrade(pairings),
                }
            }
        }
    }

    /// Control channels parked with no protocol connection, and protocol
    /// connections waiting for one. Always `(0, 0)` in global mode.
    pub fn unmatched(&self) -> (usize, usize) {
        match &self.slots {
            Slots::Global { .. } => (0, 0),
            Slots::Paired(pairings) => {
                let p = pairings.lock();
                (p.idle.len(), p.waiting.len())
            }
        }
    }
}

impl fmt::Debug for HandoffHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandoffHub")
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}

/// Control end of a handoff.
#[derive(Debug)]
pub struct ScenarioSender {
    tx: mpsc::Sender<ScenarioEntry>,
    pairing: Option<u64>,
    hub: Weak<Mutex<Pairings>>,
}

impl ScenarioSender {
    /// Wait for the slot to be free, then fill it.
    pub async fn send(&self, entry: ScenarioEntry) -> Result<(), HandoffClosed> {
        self.tx.send(entry).await.map_err(|_| HandoffClosed)
    }

    /// Control connection id, or `None` in global mode.
    pub fn pairing(&self) -> Option<u64> {
        self.pairing
    }
}

impl Drop for ScenarioSender {
    fn drop(&mut self) {
        let (Some(id), Some(hub)) = (self.pairing, self.hub.upgrade()) else {
            return;
        };
        // A parked channel with nothing left in it can never be read.
        let mut p = hub.lock();
        if p.idle.get(&id).is_some_and(|rx| rx.is_empty()) {
            p.idle.remove(&id);
        }
    }
}

enum Source {
    /// The bound control connection ended; look for the next one.
    Unbound,
    /// Queued until a control channel is offered.
    Pending(oneshot::Receiver<Binding>),
    Bound(Binding),
    Shared(Arc<AsyncMutex<mpsc::Receiver<ScenarioEntry>>>),
}

/// Protocol end of a handoff.
pub struct ScenarioReceiver {
    source: Source,
    id: u64,
    hub: Weak<Mutex<Pairings>>,
}

impl ScenarioReceiver {
    /// Take the next entry, waiting until one is sent.
    pub async fn recv(&mut self) -> Result<ScenarioEntry, HandoffClosed> {
        loop {
            match &mut self.source {
                Source::Shared(rx) => return rx.lock().await.recv().await.ok_or(HandoffClosed),
                Source::Bound((_, rx)) => {
                    if let Some(entry) = rx.recv().await {
                        return Ok(entry);
                    }
                    self.source = Source::Unbound;
                }
                Source::Pending(waiting) => match waiting.await {
                    Ok(binding) => self.source = Source::Bound(binding),
                    Err(_) => {
                        self.source = Source::Unbound;
                        return Err(HandoffClosed);
                    }
                },
                Source::Unbound => {
                    let hub = self.hub.upgrade().ok_or(HandoffClosed)?;
                    self.source = hub.lock().claim(self.id);
                }
            }
        }
    }

    /// Id of the control connection currently feeding this end.
    pub fn pairing(&self) -> Option<u64> {
        match self.source {
            Source::Bound((control, _)) => Some(control),
            _ => None,
        }
    }
}

impl Drop for ScenarioReceiver {
    fn drop(&mut self) {
        let Some(hub) = self.hub.upgrade() else {
            return;
        };
        let mut p = hub.lock();
        match std::mem::replace(&mut self.source, Source::Unbound) {
            Source::Bound((control, rx)) => p.offer(control, rx),
            Source::Pending(mut waiting) => {
                p.waiting.remove(&self.id);
                // offered before the entry above was removed
                if let Ok((control, rx)) = waiting.try_recv() {
                    p.offer(control, rx);
                }
            }
            Source::Unbound | Source::Shared(_) => {}
        }
    }
}

impl fmt::Debug for ScenarioReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.source {
            Source::Unbound => "unbound",
            Source::Pending(_) => "pending",
            Source::Bound(_) => "bound",
            Source::Shared(_) => "shared",
        };
        f.debug_struct("ScenarioReceiver")
            .field("pairing", &self.pairing())
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::{Scenario, ScenarioRegistry};

    fn entry(name: &str) -> ScenarioEntry {
        ScenarioRegistry::builtin().lookup(name)
    }

    async fn assert_blocks(rx: &mut ScenarioReceiver) {
        assert!(
            timeout(Duration::from_millis(50), rx.recv()).await.is_err(),
            "recv should block"
        );
    }

    #[test]
    fn test_mode_parses() {
        assert_eq!("paired".parse::<HandoffMode>(), Ok(HandoffMode::Paired));
        assert_eq!("Global".parse::<HandoffMode>(), Ok(HandoffMode::Global));
        assert!("both".parse::<HandoffMode>().is_err());
        assert_eq!(HandoffMode::default(), HandoffMode::Paired);
        assert_eq!(HandoffMode::Global.to_string(), "global");
    }

    #[tokio::test]
    async fn test_paired_control_first() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let tx = hub.open_control();
        tx.send(entry("rversion_success")).await.unwrap();

        let mut rx = hub.open_protocol();
        assert_eq!(tx.pairing(), rx.pairing());
        assert_eq!(rx.recv().await.unwrap().scenario, Scenario::RversionSuccess);
        assert_blocks(&mut rx).await;
    }

    #[tokio::test]
    async fn test_paired_protocol_first() {
        let hub = Arc::new(HandoffHub::new(HandoffMode::Paired));
        let mut rx = hub.open_protocol();

        let waiter = tokio::spawn(async move { rx.recv().await });
        let tx = hub.open_control();
        tx.send(entry("rattach_success")).await.unwrap();

        let got = waiter.await.unwrap().unwrap();
        assert_eq!(got.scenario, Scenario::RattachSuccess);
    }

    #[tokio::test]
    async fn test_paired_connections_are_isolated() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let first = hub.open_control();
        let second = hub.open_control();
        second.send(entry("rread_success")).await.unwrap();
        first.send(entry("rwalk_success")).await.unwrap();

        let mut rx0 = hub.open_protocol();
        let mut rx1 = hub.open_protocol();
        assert_eq!(rx0.recv().await.unwrap().scenario, Scenario::RwalkSuccess);
        assert_eq!(rx1.recv().await.unwrap().scenario, Scenario::RreadSuccess);
    }

    #[tokio::test]
    async fn test_control_moves_to_next_protocol_connection() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let tx = hub.open_control();

        let mut first = hub.open_protocol();
        tx.send(entry("rversion_success")).await.unwrap();
        assert_eq!(first.recv().await.unwrap().scenario, Scenario::RversionSuccess);
        drop(first);

        tx.send(entry("rattach_success")).await.unwrap();
        let mut second = hub.open_protocol();
        assert_eq!(second.pairing(), tx.pairing());
        assert_eq!(second.recv().await.unwrap().scenario, Scenario::RattachSuccess);
    }

    #[tokio::test]
    async fn test_unread_entry_follows_control_channel() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let tx = hub.open_control();
        let first = hub.open_protocol();
        tx.send(entry("rstat_success")).await.unwrap();
        drop(first);

        let mut second = hub.open_protocol();
        assert_eq!(second.recv().await.unwrap().scenario, Scenario::RstatSuccess);
    }

    #[tokio::test]
    async fn test_protocol_moves_to_next_control_connection() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let mut rx = hub.open_protocol();

        let first = hub.open_control();
        first.send(entry("rclunk_success")).await.unwrap();
        drop(first);
        // already delivered entries are still consumed
        assert_eq!(rx.recv().await.unwrap().scenario, Scenario::RclunkSuccess);
        assert_blocks(&mut rx).await;

        let second = hub.open_control();
        second.send(entry("rremove_success")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().scenario, Scenario::RremoveSuccess);
        assert_eq!(rx.pairing(), second.pairing());
    }

    #[tokio::test]
    async fn test_bound_channels_are_not_taken() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let first = hub.open_control();
        let second = hub.open_control();
        let mut rx0 = hub.open_protocol();
        let mut rx1 = hub.open_protocol();

        drop(first);
        second.send(entry("rwrite_success")).await.unwrap();
        assert_blocks(&mut rx0).await;
        assert_eq!(rx1.recv().await.unwrap().scenario, Scenario::RwriteSuccess);
    }

    #[tokio::test]
    async fn test_closes_when_hub_is_gone() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let tx = hub.open_control();
        let mut bound = hub.open_protocol();
        let mut pending = hub.open_protocol();
        tx.send(entry("rclunk_success")).await.unwrap();
        drop(tx);
        drop(hub);

        assert_eq!(bound.recv().await.unwrap().scenario, Scenario::RclunkSuccess);
        assert_eq!(bound.recv().await, Err(HandoffClosed));
        assert_eq!(pending.recv().await, Err(HandoffClosed));
    }

    #[tokio::test]
    async fn test_unmatched_ends_are_forgotten() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let tx = hub.open_control();
        assert_eq!(hub.unmatched(), (1, 0));
        drop(tx);
        assert_eq!(hub.unmatched(), (0, 0));

        let rx = hub.open_protocol();
        assert_eq!(hub.unmatched(), (0, 1));
        drop(rx);
        assert_eq!(hub.unmatched(), (0, 0));

        // a closed control channel still holding an entry is kept for the
        // next protocol connection
        let tx = hub.open_control();
        tx.send(entry("ropen_success")).await.unwrap();
        drop(tx);
        assert_eq!(hub.unmatched(), (1, 0));
        let mut rx = hub.open_protocol();
        assert_eq!(rx.recv().await.unwrap().scenario, Scenario::RopenSuccess);
        drop(rx);
        assert_eq!(hub.unmatched(), (0, 0));
    }

    #[tokio::test]
    async fn test_slot_holds_one_entry() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let tx = hub.open_control();
        tx.send(entry("rversion_success")).await.unwrap();
        assert!(
            timeout(Duration::from_millis(50), tx.send(entry("rattach_success")))
                .await
                .is_err(),
            "second send should wait for the first to be consumed"
        );
    }

    #[tokio::test]
    async fn test_send_fails_without_hub() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let tx = hub.open_control();
        drop(hub);
        assert_eq!(tx.send(entry("rversion_success")).await, Err(HandoffClosed));
    }

    #[tokio::test]
    async fn test_global_shares_one_slot() {
        let hub = HandoffHub::new(HandoffMode::Global);
        let tx = hub.open_control();
        let mut rx0 = hub.open_protocol();
        let mut rx1 = hub.open_protocol();
        assert_eq!(tx.pairing(), None);

        tx.send(entry("rstat_success")).await.unwrap();
        assert_eq!(rx1.recv().await.unwrap().scenario, Scenario::RstatSuccess);

        // a second control connection feeds the same slot
        hub.open_control()
            .send(entry("ropen_success"))
            .await
            .unwrap();
        assert_eq!(rx0.recv().await.unwrap().scenario, Scenario::RopenSuccess);

        // the hub keeps the slot open
        drop(tx);
        assert_blocks(&mut rx0).await;
    }
}
