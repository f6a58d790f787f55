//! Parallel resource upload workers (§4.H), the mirror image of §4.G:
//! dequeue a local file + URL, open an Upload session, send credentials and
//! size, wait for `UploadAllowed`, then stream the bytes. A single atomic
//! counter tracks outstanding uploads for backpressure/diagnostics.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use substrata_net::session::SessionTransport;
use substrata_protocol::handshake::ConnectionType;
use substrata_protocol::message_id;
use substrata_protocol::wire::Writer;
use substrata_protocol::UrlString;
use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct ResourceToUpload {
    pub local_path: PathBuf,
    pub url: UrlString,
}

pub trait UploadSink: Send + Sync {
    fn upload_succeeded(&self, url: &UrlString);
    fn upload_failed(&self, url: &UrlString, reason: &str);
}

/// Outstanding-upload counter shared across every upload worker.
#[derive(Default)]
pub struct OutstandingUploads(AtomicUsize);

impl OutstandingUploads {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn guard(self: &Arc<Self>) -> UploadGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        UploadGuard(self.clone())
    }
}

struct UploadGuard(Arc<OutstandingUploads>);

impl Drop for UploadGuard {
    fn drop(&mut self) {
        self.0 .0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct UploadWorkerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub reconnect_backoff: Duration,
}

async fn upload_one(
    session: &mut SessionTransport,
    username: &str,
    password: &str,
    item: &ResourceToUpload,
) -> Result<(), PipelineError> {
    let bytes = tokio::fs::read(&item.local_path).await?;

    let mut w = Writer::new();
    w.write_string(username);
    w.write_string(password);
    w.write_string(item.url.as_str());
    w.write_u64(bytes.len() as u64);
    session
        .write_raw(&w.into_bytes())
        .await
        .map_err(PipelineError::Net)?;

    let response = session.read_frame().await.map_err(PipelineError::Net)?;
    match response.0 {
        message_id::UPLOAD_ALLOWED => {}
        message_id::LOG_IN_FAILURE => {
            return Err(PipelineError::Decode {
                url: item.url.as_str().to_string(),
                reason: "login failure".into(),
            })
        }
        message_id::NO_WRITE_PERMISSIONS => {
            return Err(PipelineError::Decode {
                url: item.url.as_str().to_string(),
                reason: "no write permissions".into(),
            })
        }
        other => {
            return Err(PipelineError::Decode {
                url: item.url.as_str().to_string(),
                reason: format!("unexpected response {other}"),
            })
        }
    }

    session.write_raw(&bytes).await.map_err(PipelineError::Net)?;
    Ok(())
}

/// Runs until `shutdown` fires or `inbox` closes. Mirrors the download
/// worker's reconnect-on-error policy: a connection failure does not end
/// the task, it backs off and retries the next queued item.
pub async fn run(
    config: UploadWorkerConfig,
    mut inbox: mpsc::UnboundedReceiver<ResourceToUpload>,
    sink: Arc<dyn UploadSink>,
    outstanding: Arc<OutstandingUploads>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let item = tokio::select! {
            item = inbox.recv() => match item {
                Some(item) => item,
                None => return,
            },
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
                continue;
            }
        };

        let _guard = outstanding.guard();

        let mut session = match SessionTransport::connect(&config.host, config.port, ConnectionType::UploadResource).await {
            Ok((s, _info)) => s,
            Err(e) => {
                warn!("upload worker: connect failed: {e}");
                sink.upload_failed(&item.url, &e.to_string());
                tokio::time::sleep(config.reconnect_backoff).await;
                continue;
            }
        };

        match upload_one(&mut session, &config.username, &config.password, &item).await {
            Ok(()) => sink.upload_succeeded(&item.url),
            Err(e) => {
                warn!("upload worker: {} failed: {e}", item.url);
                sink.upload_failed(&item.url, &e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outstanding_counter_tracks_guard_lifetime() {
        let counter = Arc::new(OutstandingUploads::default());
        assert_eq!(counter.count(), 0);
        {
            let _g = counter.guard();
            assert_eq!(counter.count(), 1);
        }
        assert_eq!(counter.count(), 0);
    }
}
