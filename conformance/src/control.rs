//! Control connections.
//!
//! The driver writes one scenario name per line and may keep the
//! connection open for further names. Nothing is ever written back.
//! Lines are trimmed, blank lines are skipped and a last line without a
//! trailing newline still counts.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{info, warn};

use crate::ScenarioRegistry;
use crate::handoff::ScenarioSender;

/// Read scenario names from `stream` until it closes, pushing each
/// resolved entry through `sender`.
///
/// Returns how many entries were delivered. A read error abandons the
/// connection; entries delivered before it stay delivered, and the line
/// being read is dropped.
pub async fn serve_control<R>(
    stream: R,
    registry: &ScenarioRegistry,
    sender: &ScenarioSender,
) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    let mut delivered = 0;
    while let Some(line) = lines.next_line().await? {
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        let entry = registry.lookup(name);
        if entry.is_failure() {
            warn!(
                name,
                pairing = ?sender.pairing(),
                "unknown scenario, next request will fail"
            );
        } else {
            info!(scenario = entry.name, pairing = ?sender.pairing(), "scenario selected");
        }
        if sender.send(entry).await.is_err() {
            warn!(pairing = ?sender.pairing(), "handoff closed, dropping control connection");
            break;
        }
        delivered += 1;
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;
    use crate::{HandoffHub, HandoffMode, Scenario};

    async fn drain(input: &[u8]) -> (io::Result<usize>, Vec<Scenario>) {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let registry = ScenarioRegistry::builtin();
        let sender = hub.open_control();
        let mut receiver = hub.open_protocol();

        let reader = tokio::spawn(async move {
            let mut got = Vec::new();
            while let Ok(entry) = receiver.recv().await {
                got.push(entry.scenario);
            }
            got
        });
        let result = serve_control(input, &registry, &sender).await;
        drop(sender);
        drop(hub);
        (result, reader.await.unwrap())
    }

    #[tokio::test]
    async fn test_one_name_per_line() {
        let (result, got) = drain(b"rversion_success\nrattach_success\n").await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(got, [Scenario::RversionSuccess, Scenario::RattachSuccess]);
    }

    #[tokio::test]
    async fn test_trims_and_skips_blank_lines() {
        let (result, got) = drain(b"  rstat_success\r\n\n\t\nropen_success  \n").await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(got, [Scenario::RstatSuccess, Scenario::RopenSuccess]);
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let (result, got) = drain(b"rread_success").await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(got, [Scenario::RreadSuccess]);
    }

    #[tokio::test]
    async fn test_unknown_name_delivers_failure() {
        let (result, got) = drain(b"rversion_sucess\n").await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(got, [Scenario::Failure]);
    }

    /// Yields `data`, then fails.
    struct Broken<'a> {
        data: &'a [u8],
    }

    impl AsyncRead for Broken<'_> {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.data.is_empty() {
                return Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()));
            }
            let n = self.data.len().min(buf.remaining());
            buf.put_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_read_error_drops_partial_line() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let registry = ScenarioRegistry::builtin();
        let sender = hub.open_control();
        let mut receiver = hub.open_protocol();

        let stream = Broken {
            data: b"rwalk_success\nrread_succ",
        };
        let err = serve_control(stream, &registry, &sender).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        drop(sender);
        drop(hub);

        assert_eq!(receiver.recv().await.unwrap().scenario, Scenario::RwalkSuccess);
        assert!(receiver.recv().await.is_err());
    }
}
