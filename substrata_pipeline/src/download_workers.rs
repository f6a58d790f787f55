//! N parallel download workers (§4.G). Each worker holds a persistent
//! Downloads-type session, pulls up to 4 URLs at a time off the download
//! queue, requests them with a single `GetFiles`, and streams each file to
//! disk with a truncate-and-rewrite atomic write. A per-worker session-scoped
//! denylist remembers URLs the server reported missing so they aren't
//! retried until the session ends.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use substrata_net::session::SessionTransport;
use substrata_protocol::handshake::ConnectionType;
use substrata_protocol::message_id;
use substrata_protocol::wire::Writer;
use substrata_protocol::UrlString;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::download_queue::DownloadQueue;
use crate::error::PipelineError;

/// Streamed in chunks no larger than this, per §4.G step 3.
const STREAM_CHUNK_LEN: usize = 16 * 1024;
const MAX_BATCH: usize = 4;
const GET_FILE_OK: u32 = 0;
const GET_FILE_NOT_FOUND: u32 = 1;

/// Delivers completed/failed download outcomes back to the foreground.
/// Implemented by the load coordinator (§4.J); kept as a trait so this
/// worker never touches `WorldState` directly.
pub trait DownloadSink: Send + Sync {
    fn resource_present(&self, url: &UrlString);
    fn resource_failed(&self, url: &UrlString);
}

pub struct DownloadWorkerConfig {
    pub host: String,
    pub port: u16,
    pub resources_dir: PathBuf,
    pub reconnect_backoff: Duration,
    pub idle_poll: Duration,
}

/// Writes `bytes` to `resources_dir/<url>` via a temp file plus rename, so a
/// reader never observes a partially-written file.
async fn write_resource_atomic(resources_dir: &Path, url: &UrlString, bytes: &[u8]) -> Result<(), PipelineError> {
    tokio::fs::create_dir_all(resources_dir).await?;
    let final_path = resources_dir.join(url.as_str());
    let tmp_path = resources_dir.join(format!("{}.part", url.as_str()));
    {
        let mut f = tokio::fs::File::create(&tmp_path).await?;
        f.write_all(bytes).await?;
        f.flush().await?;
    }
    tokio::fs::rename(&tmp_path, &final_path).await?;
    Ok(())
}

/// Requests and streams one URL from an already-open Downloads session,
/// writing it to disk on success. On a mid-stream abort the partial file is
/// simply never written (the temp file is dropped).
async fn fetch_one(
    session: &mut SessionTransport,
    resources_dir: &Path,
    url: &UrlString,
) -> Result<(), PipelineError> {
    let result = session.read_u32_unframed().await?;
    if result == GET_FILE_NOT_FOUND {
        return Err(PipelineError::ResourceNotFound(url.as_str().to_string()));
    }
    if result != GET_FILE_OK {
        return Err(PipelineError::Decode {
            url: url.as_str().to_string(),
            reason: format!("unexpected result code {result}"),
        });
    }

    let file_len = session.read_u64_unframed().await? as usize;
    let mut bytes = Vec::with_capacity(file_len);
    let mut remaining = file_len;
    let mut chunk = vec![0u8; STREAM_CHUNK_LEN];
    while remaining > 0 {
        let this_chunk = remaining.min(STREAM_CHUNK_LEN);
        session.read_exact_unframed(&mut chunk[..this_chunk]).await?;
        bytes.extend_from_slice(&chunk[..this_chunk]);
        remaining -= this_chunk;
    }

    if !url.matches_bytes(&bytes) {
        return Err(PipelineError::HashMismatch { url: url.as_str().to_string() });
    }

    write_resource_atomic(resources_dir, url, &bytes).await
}

/// Sends `GetFiles` for up to `MAX_BATCH` URLs, then reads each result in
/// order, writing successes to disk and reporting outcomes via `sink`.
async fn run_batch(
    session: &mut SessionTransport,
    resources_dir: &Path,
    urls: &[UrlString],
    sink: &Arc<dyn DownloadSink>,
    failed: &mut HashSet<UrlString>,
) -> Result<(), PipelineError> {
    let mut w = Writer::new();
    w.write_u32(urls.len() as u32);
    for url in urls {
        w.write_string(url.as_str());
    }
    session
        .write_frame(message_id::GET_FILES, &w.into_bytes())
        .await
        .map_err(PipelineError::Net)?;

    for url in urls {
        match fetch_one(session, resources_dir, url).await {
            Ok(()) => sink.resource_present(url),
            Err(PipelineError::ResourceNotFound(_)) => {
                failed.insert(url.clone());
                sink.resource_failed(url);
            }
            Err(e) => {
                warn!("download worker: {url} failed: {e}");
                sink.resource_failed(url);
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Runs until `shutdown` fires. On a connection error the worker backs off
/// and reconnects rather than exiting, per the propagation policy in §7:
/// worker top-level loops never exit on a recoverable error.
pub async fn run(
    config: DownloadWorkerConfig,
    queue: Arc<DownloadQueue>,
    sink: Arc<dyn DownloadSink>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut failed: HashSet<UrlString> = HashSet::new();

    'session: loop {
        if *shutdown.borrow() {
            return;
        }

        let mut session = match SessionTransport::connect(&config.host, config.port, ConnectionType::DownloadResources).await {
            Ok((s, _info)) => s,
            Err(e) => {
                warn!("download worker: connect failed: {e}");
                tokio::time::sleep(config.reconnect_backoff).await;
                continue 'session;
            }
        };
        debug!("download worker: session open to {}:{}", config.host, config.port);

        loop {
            if *shutdown.borrow() {
                return;
            }

            let batch = queue.dequeue_with_timeout(config.idle_poll, MAX_BATCH).await;
            if batch.is_empty() {
                continue;
            }

            let urls: Vec<UrlString> = batch
                .iter()
                .map(|item| item.url.clone())
                .filter(|url| !failed.contains(url))
                .collect();
            if urls.is_empty() {
                continue;
            }

            if let Err(e) = run_batch(&mut session, &config.resources_dir, &urls, &sink, &mut failed).await {
                warn!("download worker: batch failed, reconnecting: {e}");
                continue 'session;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn atomic_write_produces_final_file_not_partial() {
        let dir = std::env::temp_dir().join(format!("substrata_dl_test_{}", std::process::id()));
        let url = UrlString::new("box_42.bmesh");
        write_resource_atomic(&dir, &url, b"hello").await.unwrap();

        let final_path = dir.join("box_42.bmesh");
        let tmp_path = dir.join("box_42.bmesh.part");
        assert!(tokio::fs::metadata(&final_path).await.is_ok());
        assert!(tokio::fs::metadata(&tmp_path).await.is_err());

        let contents = tokio::fs::read(&final_path).await.unwrap();
        assert_eq!(contents, b"hello");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    struct RecordingSink {
        present: Mutex<Vec<UrlString>>,
        failed: Mutex<Vec<UrlString>>,
    }

    impl DownloadSink for RecordingSink {
        fn resource_present(&self, url: &UrlString) {
            self.present.lock().unwrap().push(url.clone());
        }
        fn resource_failed(&self, url: &UrlString) {
            self.failed.lock().unwrap().push(url.clone());
        }
    }

    #[test]
    fn sink_trait_is_object_safe() {
        let sink: Arc<dyn DownloadSink> = Arc::new(RecordingSink {
            present: Mutex::new(Vec::new()),
            failed: Mutex::new(Vec::new()),
        });
        sink.resource_present(&UrlString::new("a_1.bmesh"));
        sink.resource_failed(&UrlString::new("b_2.bmesh"));
    }
}
