//! Unix domain socket channel to the answering host
//!
//! One connection carries both directions. Outbound questions wait for the
//! host's ACK or NACK; inbound DATA is decoded, queued for the event loop and
//! acknowledged in turn.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::packet::{read_packet, write_packet, Packet, PacketError};
use crate::application::ports::{
    InboundEvent, InboundReceiver, MessageChannel, SendError, INBOUND_QUEUE_DEPTH,
};
use crate::application::single_flight::SingleFlight;
use crate::domain::frame::{decode, encode, Frame};

type SharedWriter = Arc<tokio::sync::Mutex<Option<OwnedWriteHalf>>>;
type PendingAck = Arc<Mutex<AckState>>;

/// Bookkeeping for the single outstanding send
#[derive(Default)]
struct AckState {
    waiter: Option<oneshot::Sender<Result<(), SendError>>>,
    /// Acknowledgements the host still owes for abandoned sends
    orphaned: usize,
}

/// Held while a send waits for its acknowledgement.
///
/// If the send is abandoned first, its ACK or NACK is still on the way and
/// must not complete the next send.
struct AckWait<'a> {
    pending: &'a PendingAck,
}

impl Drop for AckWait<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.pending);
        if state.waiter.take().is_some() {
            state.orphaned += 1;
            debug!(orphaned = state.orphaned, "send abandoned before its acknowledgement");
        }
    }
}

/// Message channel over a Unix domain socket
pub struct UnixSocketChannel {
    path: PathBuf,
    writer: SharedWriter,
    pending: PendingAck,
    flight: SingleFlight,
}

impl UnixSocketChannel {
    /// Connect to the host socket at `path`
    pub async fn connect(path: impl AsRef<Path>) -> std::io::Result<(Self, InboundReceiver)> {
        let path = path.as_ref().to_path_buf();
        let stream = UnixStream::connect(&path).await?;
        let (reader, writer) = stream.into_split();
        info!(path = %path.display(), "connected to host");

        let channel = Self::with_writer(path, Some(writer));
        let (tx, inbound) = mpsc::channel(INBOUND_QUEUE_DEPTH);
        tokio::spawn(read_loop(
            reader,
            Arc::clone(&channel.writer),
            Arc::clone(&channel.pending),
            tx,
        ));

        Ok((channel, inbound))
    }

    /// A channel that was never opened; every send fails with "not open"
    /// and the inbound stream is already closed.
    pub fn disconnected(path: impl AsRef<Path>) -> (Self, InboundReceiver) {
        let (_, inbound) = mpsc::channel(INBOUND_QUEUE_DEPTH);
        (Self::with_writer(path.as_ref().to_path_buf(), None), inbound)
    }

    fn with_writer(path: PathBuf, writer: Option<OwnedWriteHalf>) -> Self {
        Self {
            path,
            writer: Arc::new(tokio::sync::Mutex::new(writer)),
            pending: Arc::new(Mutex::new(AckState::default())),
            flight: SingleFlight::new(),
        }
    }

    /// Socket path this channel targets
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the connection is open
    pub async fn is_open(&self) -> bool {
        self.writer.lock().await.is_some()
    }
}

#[async_trait]
impl MessageChannel for UnixSocketChannel {
    async fn send(&self, frame: &Frame) -> Result<(), SendError> {
        let _guard = self
            .flight
            .try_begin()
            .ok_or_else(|| SendError::Failed("busy".to_string()))?;

        let payload = encode(frame)?;
        let (tx, rx) = oneshot::channel();

        let _wait = {
            let mut writer = self.writer.lock().await;
            let stream = writer
                .as_mut()
                .ok_or_else(|| SendError::Failed("not open".to_string()))?;

            lock(&self.pending).waiter = Some(tx);
            let wait = AckWait {
                pending: &self.pending,
            };
            if let Err(e) = write_packet(stream, &Packet::Data(payload)).await {
                lock(&self.pending).waiter.take();
                *writer = None;
                warn!(error = %e, "write to host failed, closing channel");
                return Err(SendError::Failed(e.to_string()));
            }
            wait
        };

        rx.await
            .unwrap_or_else(|_| Err(SendError::Failed("connection closed".to_string())))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Apply an ACK or NACK from the host
fn acknowledge(pending: &PendingAck, result: Result<(), SendError>) {
    let mut state = lock(pending);
    if state.orphaned > 0 {
        state.orphaned -= 1;
        debug!(?result, "acknowledgement for an abandoned send skipped");
        return;
    }
    match state.waiter.take() {
        Some(tx) => {
            let _ = tx.send(result);
        }
        None => debug!(?result, "acknowledgement with no pending send ignored"),
    }
}

/// Fail the waiting send, if any
fn fail_pending(pending: &PendingAck, reason: &str) {
    if let Some(tx) = lock(pending).waiter.take() {
        let _ = tx.send(Err(SendError::Failed(reason.to_string())));
    }
}

/// Answer a host DATA packet. Returns false once the connection is unusable.
async fn reply(writer: &SharedWriter, packet: &Packet) -> bool {
    let mut writer = writer.lock().await;
    if let Some(stream) = writer.as_mut() {
        if let Err(e) = write_packet(stream, packet).await {
            warn!(error = %e, "could not acknowledge host frame");
            *writer = None;
            return false;
        }
    }
    true
}

/// Read packets until the host goes away
async fn read_loop(
    mut reader: OwnedReadHalf,
    writer: SharedWriter,
    pending: PendingAck,
    inbound: mpsc::Sender<InboundEvent>,
) {
    loop {
        let packet = match read_packet(&mut reader).await {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                info!("host closed the connection");
                break;
            }
            Err(e @ PacketError::TooLarge { .. }) => {
                warn!(error = %e, "oversized frame from host discarded");
                let _ = inbound.try_send(InboundEvent::Dropped(e.to_string()));
                if !reply(&writer, &Packet::Nack(e.to_string())).await {
                    break;
                }
                continue;
            }
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "malformed packet from host skipped");
                continue;
            }
            Err(e) => {
                warn!(error = %e, "unreadable packet from host, closing channel");
                break;
            }
        };

        match packet {
            Packet::Ack => acknowledge(&pending, Ok(())),
            Packet::Nack(reason) => acknowledge(&pending, Err(SendError::Dropped(reason))),
            Packet::Data(bytes) => {
                let response = match decode(&bytes) {
                    Ok(frame) => match inbound.try_send(InboundEvent::Frame(frame)) {
                        Ok(()) => Packet::Ack,
                        Err(_) => {
                            warn!("inbound queue full, refusing frame");
                            Packet::Nack("inbox full".to_string())
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "undecodable frame from host");
                        let _ = inbound.try_send(InboundEvent::Dropped(e.to_string()));
                        Packet::Nack(e.to_string())
                    }
                };

                if !reply(&writer, &response).await {
                    break;
                }
            }
        }
    }

    writer.lock().await.take();
    fail_pending(&pending, "connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::MessageKey;
    use tokio::net::UnixListener;

    async fn host() -> (tempfile::TempDir, PathBuf, UnixListener) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.sock");
        let listener = UnixListener::bind(&path).unwrap();
        (dir, path, listener)
    }

    #[tokio::test]
    async fn disconnected_send_fails_not_open() {
        let (channel, _inbound) = UnixSocketChannel::disconnected("/nonexistent.sock");
        assert!(!channel.is_open().await);
        assert_eq!(
            channel.send(&Frame::question("hi")).await,
            Err(SendError::Failed("not open".to_string()))
        );
    }

    #[tokio::test]
    async fn connect_to_missing_socket_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(UnixSocketChannel::connect(dir.path().join("none.sock")).await.is_err());
    }

    #[tokio::test]
    async fn ack_delivers_and_answer_arrives() {
        let (_dir, path, listener) = host().await;

        let host_task = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let question = match read_packet(&mut stream).await.unwrap() {
                Some(Packet::Data(bytes)) => decode(&bytes).unwrap(),
                other => panic!("expected data, got {:?}", other),
            };
            write_packet(&mut stream, &Packet::Ack).await.unwrap();

            let answer = encode(&Frame::response("Sunny, 72 degrees")).unwrap();
            write_packet(&mut stream, &Packet::Data(answer)).await.unwrap();
            let ack = read_packet(&mut stream).await.unwrap();
            (question, ack)
        });

        let (channel, mut inbound) = UnixSocketChannel::connect(&path).await.unwrap();
        assert_eq!(channel.send(&Frame::question("what is the weather")).await, Ok(()));

        let event = inbound.recv().await.unwrap();
        assert_eq!(event, InboundEvent::Frame(Frame::response("Sunny, 72 degrees")));

        let (question, ack) = host_task.await.unwrap();
        assert_eq!(
            question.get(MessageKey::Question).unwrap().as_str(),
            "what is the weather"
        );
        assert_eq!(ack, Some(Packet::Ack));
    }

    #[tokio::test]
    async fn nack_is_a_drop() {
        let (_dir, path, listener) = host().await;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_packet(&mut stream).await.unwrap();
            write_packet(&mut stream, &Packet::Nack("busy".into())).await.unwrap();
            // Keep the connection open until the client is done
            let _ = read_packet(&mut stream).await;
        });

        let (channel, _inbound) = UnixSocketChannel::connect(&path).await.unwrap();
        assert_eq!(
            channel.send(&Frame::question("hi")).await,
            Err(SendError::Dropped("busy".to_string()))
        );
    }

    #[tokio::test]
    async fn host_hangup_fails_pending_send() {
        let (_dir, path, listener) = host().await;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_packet(&mut stream).await.unwrap();
        });

        let (channel, mut inbound) = UnixSocketChannel::connect(&path).await.unwrap();
        assert_eq!(
            channel.send(&Frame::question("hi")).await,
            Err(SendError::Failed("connection closed".to_string()))
        );
        assert_eq!(inbound.recv().await, None);
        assert!(!channel.is_open().await);
    }

    #[tokio::test]
    async fn undecodable_frame_is_nacked_and_reported() {
        let (_dir, path, listener) = host().await;
        let host_task = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            // Count says one tuple but none follows
            write_packet(&mut stream, &Packet::Data(vec![1])).await.unwrap();
            read_packet(&mut stream).await.unwrap()
        });

        let (_channel, mut inbound) = UnixSocketChannel::connect(&path).await.unwrap();
        assert!(matches!(inbound.recv().await, Some(InboundEvent::Dropped(_))));
        assert!(matches!(host_task.await.unwrap(), Some(Packet::Nack(_))));
    }

    #[tokio::test]
    async fn late_ack_for_abandoned_send_is_skipped() {
        let (_dir, path, listener) = host().await;
        let (first_read_tx, first_read) = oneshot::channel();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_packet(&mut stream).await.unwrap();
            first_read_tx.send(()).unwrap();

            read_packet(&mut stream).await.unwrap();
            // Owed for the first question, then the verdict on the second
            write_packet(&mut stream, &Packet::Ack).await.unwrap();
            write_packet(&mut stream, &Packet::Nack("busy".into())).await.unwrap();
            let _ = read_packet(&mut stream).await;
        });

        let (channel, _inbound) = UnixSocketChannel::connect(&path).await.unwrap();
        {
            let first = Frame::question("first");
            let send = channel.send(&first);
            tokio::pin!(send);
            tokio::select! {
                _ = &mut send => panic!("send finished without an acknowledgement"),
                _ = first_read => {}
            }
        }

        assert_eq!(
            channel.send(&Frame::question("second")).await,
            Err(SendError::Dropped("busy".to_string()))
        );
    }

    #[tokio::test]
    async fn oversized_frame_is_dropped_and_channel_stays_open() {
        use tokio::io::AsyncWriteExt;

        let (_dir, path, listener) = host().await;
        let (done_tx, done) = oneshot::channel::<()>();
        let host_task = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut raw = vec![1u8, 0x58, 0x02];
            raw.extend(std::iter::repeat(b'x').take(600));
            stream.write_all(&raw).await.unwrap();
            let verdict = read_packet(&mut stream).await.unwrap();

            read_packet(&mut stream).await.unwrap();
            write_packet(&mut stream, &Packet::Ack).await.unwrap();
            let _ = done.await;
            verdict
        });

        let (channel, mut inbound) = UnixSocketChannel::connect(&path).await.unwrap();
        assert!(matches!(inbound.recv().await, Some(InboundEvent::Dropped(_))));
        assert_eq!(channel.send(&Frame::question("still there?")).await, Ok(()));
        assert!(channel.is_open().await);

        done_tx.send(()).unwrap();
        assert!(matches!(host_task.await.unwrap(), Some(Packet::Nack(_))));
    }
}
