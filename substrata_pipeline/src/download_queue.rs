//! Priority-ordered set of resource downloads (§4.F). Multiple objects
//! referencing the same URL share one queue entry with multiple positions;
//! `size_factor` biases larger objects to download first.

use std::collections::HashMap;
use std::time::Duration;

use glam::DVec3;
use substrata_protocol::UrlString;
use tokio::sync::{Mutex, Notify};
use tokio::time::timeout;

/// `1 / max(1, longest_bounding_edge)` — larger objects get a smaller
/// (more important) size factor.
pub fn size_factor(longest_edge: f32) -> f32 {
    1.0 / longest_edge.max(1.0)
}

#[derive(Debug, Clone)]
pub struct DownloadQueueItem {
    pub url: UrlString,
    pub positions: Vec<(DVec3, f32)>,
    pub priority: f64,
}

impl DownloadQueueItem {
    fn new(url: UrlString, pos: DVec3, size_factor: f32) -> Self {
        Self {
            url,
            positions: vec![(pos, size_factor)],
            priority: f64::MAX,
        }
    }
}

struct Inner {
    items: HashMap<UrlString, DownloadQueueItem>,
    order: Vec<UrlString>,
}

/// Thread-safe priority queue over `(URL, positions)`. Invariant: at most
/// one entry exists per URL (P3).
pub struct DownloadQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl Default for DownloadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: HashMap::new(),
                order: Vec::new(),
            }),
            notify: Notify::new(),
        }
    }

    /// Inserts a new entry for `url`, or appends `(pos, size_factor)` to the
    /// existing entry if one is already queued. Wakes a waiting dequeuer
    /// only when a new entry is inserted.
    pub async fn enqueue_or_update(&self, url: UrlString, pos: DVec3, size_factor: f32) {
        let mut inner = self.inner.lock().await;
        match inner.items.get_mut(&url) {
            Some(existing) => {
                existing.positions.push((pos, size_factor));
            }
            None => {
                inner.order.push(url.clone());
                inner.items.insert(url.clone(), DownloadQueueItem::new(url, pos, size_factor));
                self.notify.notify_one();
            }
        }
    }

    /// Recomputes each entry's priority as `min over positions of
    /// dist(pos, cam) * size_factor` and sorts the queue ascending (P4).
    pub async fn sort(&self, cam_pos: DVec3) {
        let mut inner = self.inner.lock().await;
        for item in inner.items.values_mut() {
            item.priority = item
                .positions
                .iter()
                .map(|&(pos, factor)| cam_pos.distance(pos) * factor as f64)
                .fold(f64::MAX, f64::min);
        }
        let items = &inner.items;
        inner.order.sort_by(|a, b| {
            items[a]
                .priority
                .partial_cmp(&items[b].priority)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Non-blocking: removes and returns the lowest-priority item, if any.
    pub async fn try_dequeue_one(&self) -> Option<DownloadQueueItem> {
        let mut inner = self.inner.lock().await;
        Self::pop_front(&mut inner)
    }

    /// Blocks up to `wait` for at least one entry to exist, then removes up
    /// to `max_items` lowest-priority entries.
    pub async fn dequeue_with_timeout(&self, wait: Duration, max_items: usize) -> Vec<DownloadQueueItem> {
        {
            let inner = self.inner.lock().await;
            if inner.order.is_empty() {
                drop(inner);
                let _ = timeout(wait, self.notify.notified()).await;
            }
        }

        let mut inner = self.inner.lock().await;
        let mut out = Vec::new();
        while out.len() < max_items {
            match Self::pop_front(&mut inner) {
                Some(item) => out.push(item),
                None => break,
            }
        }
        out
    }

    fn pop_front(inner: &mut Inner) -> Option<DownloadQueueItem> {
        if inner.order.is_empty() {
            return None;
        }
        let url = inner.order.remove(0);
        inner.items.remove(&url)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
