//! Protocol connections.

use bytes::{BufMut, BytesMut};
use ninep_protocol::{DecodeError, FrameHeader, HEADER_SIZE};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::SessionError;
use crate::dispatch::Dispatcher;

/// One protocol connection: read a frame, dispatch it, write the reply.
pub struct ProtocolSession<S> {
    stream: S,
    dispatcher: Dispatcher,
    max_message_size: u32,
    request: BytesMut,
    response: BytesMut,
}

impl<S> ProtocolSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, dispatcher: Dispatcher, max_message_size: u32) -> Self {
        Self {
            stream,
            dispatcher,
            max_message_size,
            request: BytesMut::with_capacity(HEADER_SIZE),
            response: BytesMut::new(),
        }
    }

    /// Serve requests until the peer closes the connection.
    ///
    /// Returns the number of requests answered. A close between frames is
    /// a normal end; anything else ends the session with an error.
    pub async fn run(mut self) -> Result<u64, SessionError> {
        let mut answered = 0;
        while self.read_frame().await? {
            let header = FrameHeader::parse(&self.request)?;
            let entry = self
                .dispatcher
                .dispatch(&self.request, header.kind, &mut self.response)
                .await?;
            debug!(
                scenario = entry.name,
                tag = header.tag,
                len = self.response.len(),
                "writing response"
            );
            self.stream.write_all(&self.response).await?;
            self.stream.flush().await?;
            answered += 1;
        }
        Ok(answered)
    }

    /// Read one whole frame into `self.request`. `false` on a clean close.
    async fn read_frame(&mut self) -> Result<bool, SessionError> {
        let mut size = [0u8; 4];
        // Only a close before the first byte of a frame is clean.
        if self.stream.read(&mut size[..1]).await? == 0 {
            return Ok(false);
        }
        self.stream.read_exact(&mut size[1..]).await?;
        let declared = u32::from_le_bytes(size);
        if (declared as usize) < HEADER_SIZE {
            return Err(DecodeError::SizeBelowHeader { declared }.into());
        }
        if declared > self.max_message_size {
            return Err(SessionError::FrameTooLarge {
                declared,
                max: self.max_message_size,
            });
        }

        self.request.clear();
        self.request.put_slice(&size);
        self.request.resize(declared as usize, 0);
        self.stream.read_exact(&mut self.request[4..]).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use ninep_protocol::{
        MessageKind, Tattach, Tversion, VERSION_9P2000, decode_response,
        encode_request,
    };
    use tokio::io::duplex;

    use super::*;
    use crate::{DispatchError, HandoffHub, HandoffMode, ScenarioRegistry};

    fn tversion(tag: u16) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_request(
            tag,
            &Tversion {
                msize: 8192,
                version: VERSION_9P2000.into(),
            },
            &mut buf,
        );
        buf
    }

    async fn read_reply<R: AsyncRead + Unpin>(client: &mut R) -> Vec<u8> {
        let mut size = [0u8; 4];
        client.read_exact(&mut size).await.unwrap();
        let mut frame = size.to_vec();
        frame.resize(u32::from_le_bytes(size) as usize, 0);
        client.read_exact(&mut frame[4..]).await.unwrap();
        frame
    }

    #[tokio::test]
    async fn test_answers_until_clean_close() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let registry = ScenarioRegistry::builtin();
        let control = hub.open_control();
        let (mut client, server) = duplex(1024);
        let session = ProtocolSession::new(server, Dispatcher::new(hub.open_protocol()), 65536);
        let task = tokio::spawn(session.run());

        for (tag, name) in [(1, "rversion_success"), (2, "rversion_unknown")] {
            control.send(registry.lookup(name)).await.unwrap();
            client.write_all(&tversion(tag)).await.unwrap();
            let reply = decode_response(&read_reply(&mut client).await).unwrap();
            assert_eq!(reply.tag, tag);
            assert_eq!(reply.message.kind(), MessageKind::Rversion);
        }

        drop(client);
        assert_eq!(task.await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_writes_corrupt_bytes_verbatim() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let registry = ScenarioRegistry::builtin();
        let control = hub.open_control();
        let (mut client, server) = duplex(1024);
        let session = ProtocolSession::new(server, Dispatcher::new(hub.open_protocol()), 65536);
        let task = tokio::spawn(session.run());

        control
            .send(registry.lookup("header_too_short1"))
            .await
            .unwrap();
        client.write_all(&tversion(1)).await.unwrap();
        let mut byte = [0xFFu8; 1];
        client.read_exact(&mut byte).await.unwrap();
        assert_eq!(byte, [0]);

        drop(client);
        assert_eq!(task.await.unwrap().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_kind_mismatch_ends_session() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let registry = ScenarioRegistry::builtin();
        let control = hub.open_control();
        let (mut client, server) = duplex(1024);
        let session = ProtocolSession::new(server, Dispatcher::new(hub.open_protocol()), 65536);

        control
            .send(registry.lookup("rattach_success"))
            .await
            .unwrap();
        client.write_all(&tversion(1)).await.unwrap();
        let err = session.run().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Dispatch(DispatchError::KindMismatch {
                expected: MessageKind::Tattach,
                actual: 100,
            })
        ));
    }

    #[tokio::test]
    async fn test_rejects_bad_sizes() {
        let hub = HandoffHub::new(HandoffMode::Paired);

        let (mut client, server) = duplex(64);
        let session = ProtocolSession::new(server, Dispatcher::new(hub.open_protocol()), 65536);
        client.write_all(&[3, 0, 0, 0]).await.unwrap();
        assert!(matches!(
            session.run().await,
            Err(SessionError::Frame(DecodeError::SizeBelowHeader { declared: 3 }))
        ));

        let (mut client, server) = duplex(64);
        let session = ProtocolSession::new(server, Dispatcher::new(hub.open_protocol()), 32);
        let mut tattach = BytesMut::new();
        encode_request(
            1,
            &Tattach {
                fid: 0,
                afid: !0,
                uname: "a-rather-long-user-name".into(),
                aname: String::new(),
            },
            &mut tattach,
        );
        client.write_all(&tattach).await.unwrap();
        assert!(matches!(
            session.run().await,
            Err(SessionError::FrameTooLarge { max: 32, .. })
        ));
    }

    #[tokio::test]
    async fn test_eof_inside_frame_is_an_error() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let (mut client, server) = duplex(64);
        let session = ProtocolSession::new(server, Dispatcher::new(hub.open_protocol()), 65536);
        client.write_all(&tversion(1)[..9]).await.unwrap();
        drop(client);
        assert!(matches!(session.run().await, Err(SessionError::Io(_))));
    }

    #[tokio::test]
    async fn test_eof_inside_size_is_an_error() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let (mut client, server) = duplex(64);
        let session = ProtocolSession::new(server, Dispatcher::new(hub.open_protocol()), 65536);
        client.write_all(&[19, 0]).await.unwrap();
        drop(client);
        match session.run().await {
            Err(SessionError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("expected an io error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_before_any_frame_is_clean() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let (client, server) = duplex(64);
        let session = ProtocolSession::new(server, Dispatcher::new(hub.open_protocol()), 65536);
        drop(client);
        assert_eq!(session.run().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_name_ends_session_without_reply() {
        let hub = HandoffHub::new(HandoffMode::Paired);
        let registry = ScenarioRegistry::builtin();
        let control = hub.open_control();
        let (mut client, server) = duplex(64);
        let session = ProtocolSession::new(server, Dispatcher::new(hub.open_protocol()), 65536);
        let task = tokio::spawn(session.run());

        control.send(registry.lookup("bogus")).await.unwrap();
        client.write_all(&tversion(1)).await.unwrap();
        assert!(task.await.unwrap().is_err());

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }
}
