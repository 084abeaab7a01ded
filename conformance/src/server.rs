//! Listeners and accept loops.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::control::serve_control;
use crate::dispatch::Dispatcher;
use crate::session::ProtocolSession;
use crate::{HandoffHub, ScenarioRegistry, ServerConfig, ServerError};

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Both listeners, bound and ready to accept.
pub struct Server {
    control: TcpListener,
    protocol: TcpListener,
    registry: Arc<ScenarioRegistry>,
    hub: Arc<HandoffHub>,
    max_message_size: u32,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        Self::bind_with(config, ScenarioRegistry::builtin()).await
    }

    /// Bind with a custom registry.
    pub async fn bind_with(
        config: &ServerConfig,
        registry: ScenarioRegistry,
    ) -> Result<Self, ServerError> {
        let control = listen("control", &config.control_addr).await?;
        let protocol = listen("protocol", &config.protocol_addr).await?;
        Ok(Self {
            control,
            protocol,
            registry: Arc::new(registry),
            hub: Arc::new(HandoffHub::new(config.handoff)),
            max_message_size: config.max_message_size,
        })
    }

    pub fn control_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.control.local_addr()?)
    }

    pub fn protocol_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.protocol.local_addr()?)
    }

    /// Accept on both listeners forever.
    pub async fn run(self) {
        info!(
            control = ?self.control.local_addr().ok(),
            protocol = ?self.protocol.local_addr().ok(),
            handoff = %self.hub.mode(),
            scenarios = self.registry.len(),
            "fault server listening"
        );
        let Self {
            control,
            protocol,
            registry,
            hub,
            max_message_size,
        } = self;
        tokio::join!(
            accept_control(control, registry, hub.clone()),
            accept_protocol(protocol, hub, max_message_size),
        );
    }
}

async fn listen(role: &'static str, addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            role,
            addr: addr.to_string(),
            source,
        })
}

async fn accept_control(
    listener: TcpListener,
    registry: Arc<ScenarioRegistry>,
    hub: Arc<HandoffHub>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "control accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        // Pair in accept order, before the task is scheduled.
        let sender = hub.open_control();
        info!(%peer, pairing = ?sender.pairing(), "control connection accepted");
        let registry = registry.clone();
        tokio::spawn(async move {
            match serve_control(stream, &registry, &sender).await {
                Ok(delivered) => {
                    info!(%peer, delivered, "control connection closed");
                }
                Err(e) => {
                    warn!(%peer, error = %e, "control connection abandoned");
                }
            }
        });
    }
}

async fn accept_protocol(listener: TcpListener, hub: Arc<HandoffHub>, max_message_size: u32) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "protocol accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        let slot = hub.open_protocol();
        info!(%peer, pairing = ?slot.pairing(), "protocol connection accepted");
        if let Err(e) = tune_protocol_stream(&stream) {
            debug!(%peer, error = %e, "could not disable Nagle on protocol connection");
        }
        let session = ProtocolSession::new(stream, Dispatcher::new(slot), max_message_size);
        tokio::spawn(async move {
            match session.run().await {
                Ok(answered) => {
                    info!(%peer, answered, "protocol connection closed");
                }
                Err(e) => {
                    warn!(%peer, error = %e, "protocol connection aborted");
                }
            }
        });
    }
}

/// Replies go out in one write each; send them without coalescing.
fn tune_protocol_stream(stream: &TcpStream) -> std::io::Result<()> {
    stream.set_nodelay(true)
}
