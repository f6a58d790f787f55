use std::sync::Arc;

use substrata_protocol::message_id;
use substrata_protocol::wire::frame;
use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex, Notify};
use tokio_rustls::client::TlsStream;
use tracing::{debug, warn};

/// Single-producer serialization point for outbound messages. Kept separate
/// from the receiver so a large simultaneous write on both sides of the
/// socket cannot deadlock each other.
#[derive(Clone)]
pub struct SenderHandle {
    buffer: Arc<Mutex<Vec<u8>>>,
    notify: Arc<Notify>,
}

impl SenderHandle {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Appends a complete frame (or any raw bytes) to the outbound buffer
    /// and wakes the sender task.
    pub async fn enqueue(&self, bytes: Vec<u8>) {
        self.buffer.lock().await.extend_from_slice(&bytes);
        self.notify.notify_one();
    }

    pub async fn enqueue_frame(&self, message_type: u32, payload: &[u8]) {
        self.enqueue(frame(message_type, payload)).await;
    }
}

impl Default for SenderHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs until `shutdown` fires, at which point it writes `CyberspaceGoodbye`
/// and performs a graceful half-close.
pub async fn run(
    handle: SenderHandle,
    mut write_half: WriteHalf<TlsStream<TcpStream>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = handle.notify.notified() => {
                let pending = {
                    let mut buf = handle.buffer.lock().await;
                    std::mem::take(&mut *buf)
                };
                if !pending.is_empty() {
                    if let Err(e) = write_half.write_all(&pending).await {
                        warn!("sender write failed: {e}");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    debug!("sender shutting down, sending goodbye");
    let goodbye = frame(message_id::CYBERSPACE_GOODBYE, &[]);
    let _ = write_half.write_all(&goodbye).await;
    let _ = write_half.flush().await;
    let _ = write_half.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_accumulates_into_buffer() {
        let handle = SenderHandle::new();
        handle.enqueue(vec![1, 2, 3]).await;
        handle.enqueue(vec![4, 5]).await;
        let buf = handle.buffer.lock().await;
        assert_eq!(*buf, vec![1, 2, 3, 4, 5]);
    }
}
