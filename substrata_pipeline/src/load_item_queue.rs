//! Priority-ordered queue of CPU-bound decode/build tasks (§4.I): mesh,
//! texture, script, and audio. Structurally identical to the download queue
//! (§4.F) but each entry also carries `task_max_dist`, checked by the
//! consumer before execution since the task's object may have moved out of
//! range while queued.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use glam::DVec3;
use substrata_protocol::Uid;
use substrata_protocol::UrlString;
use tokio::sync::{Mutex, Notify};
use tokio::time::timeout;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoadTaskKey {
    Mesh { url: UrlString, lod_level: u8, want_dynamic_physics_shape: bool },
    Texture { url: UrlString },
    Audio { url: UrlString },
    Script { object_uid: Uid },
}

#[derive(Debug, Clone)]
pub enum LoadTask {
    DecodeMesh { url: UrlString, lod_level: u8, want_dynamic_physics_shape: bool },
    DecodeTexture { url: UrlString },
    DecodeAudio { url: UrlString },
    CompileScript { object_uid: Uid, source: String },
}

#[derive(Debug, Clone)]
pub struct LoadItem {
    pub key: LoadTaskKey,
    pub task: LoadTask,
    pub task_max_dist: f32,
    pub positions: Vec<DVec3>,
    pub priority: f64,
}

struct Inner {
    items: HashMap<LoadTaskKey, LoadItem>,
    order: Vec<LoadTaskKey>,
}

/// Thread-safe priority queue over load-item tasks, deduplicated by
/// `LoadTaskKey` so a URL/LOD/shape combination is enqueued at most once
/// while a matching entry is already pending.
pub struct LoadItemQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl Default for LoadItemQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadItemQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: HashMap::new(),
                order: Vec::new(),
            }),
            notify: Notify::new(),
        }
    }

    pub async fn enqueue_or_update(&self, key: LoadTaskKey, task: LoadTask, pos: DVec3, task_max_dist: f32) {
        let mut inner = self.inner.lock().await;
        match inner.items.get_mut(&key) {
            Some(existing) => existing.positions.push(pos),
            None => {
                inner.order.push(key.clone());
                inner.items.insert(
                    key.clone(),
                    LoadItem {
                        key,
                        task,
                        task_max_dist,
                        positions: vec![pos],
                        priority: f64::MAX,
                    },
                );
                self.notify.notify_one();
            }
        }
    }

    pub async fn sort(&self, cam_pos: DVec3) {
        let mut inner = self.inner.lock().await;
        for item in inner.items.values_mut() {
            item.priority = item
                .positions
                .iter()
                .map(|&pos| cam_pos.distance(pos))
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

    pub async fn try_dequeue_one(&self) -> Option<LoadItem> {
        let mut inner = self.inner.lock().await;
        Self::pop_front(&mut inner)
    }

    pub async fn dequeue_with_timeout(&self, wait: Duration, max_items: usize) -> Vec<LoadItem> {
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

    fn pop_front(inner: &mut Inner) -> Option<LoadItem> {
        if inner.order.is_empty() {
            return None;
        }
        let key = inner.order.remove(0);
        inner.items.remove(&key)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.order.len()
    }
}

/// True iff the camera has moved far enough from every queued position of
/// `item` that the task should be dropped rather than executed.
pub fn is_out_of_range(item: &LoadItem, cam_pos: DVec3) -> bool {
    item.positions
        .iter()
        .all(|&pos| cam_pos.distance(pos) > item.task_max_dist as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture_key(name: &str) -> LoadTaskKey {
        LoadTaskKey::Texture { url: UrlString::new(name) }
    }

    #[tokio::test]
    async fn dedup_by_key_merges_positions() {
        let queue = LoadItemQueue::new();
        let key = texture_key("tex_1.basis");
        queue
            .enqueue_or_update(
                key.clone(),
                LoadTask::DecodeTexture { url: UrlString::new("tex_1.basis") },
                DVec3::new(1.0, 0.0, 0.0),
                500.0,
            )
            .await;
        queue
            .enqueue_or_update(
                key.clone(),
                LoadTask::DecodeTexture { url: UrlString::new("tex_1.basis") },
                DVec3::new(2.0, 0.0, 0.0),
                500.0,
            )
            .await;
        assert_eq!(queue.len().await, 1);
        let item = queue.try_dequeue_one().await.unwrap();
        assert_eq!(item.positions.len(), 2);
    }

    #[tokio::test]
    async fn priority_ordering() {
        let queue = LoadItemQueue::new();
        queue
            .enqueue_or_update(
                texture_key("far.basis"),
                LoadTask::DecodeTexture { url: UrlString::new("far.basis") },
                DVec3::new(100.0, 0.0, 0.0),
                500.0,
            )
            .await;
        queue
            .enqueue_or_update(
                texture_key("near.basis"),
                LoadTask::DecodeTexture { url: UrlString::new("near.basis") },
                DVec3::new(5.0, 0.0, 0.0),
                500.0,
            )
            .await;
        queue.sort(DVec3::ZERO).await;
        let items = queue.dequeue_with_timeout(Duration::from_millis(10), 2).await;
        assert_eq!(items[0].key, texture_key("near.basis"));
    }

    #[test]
    fn out_of_range_task_is_detected() {
        let item = LoadItem {
            key: texture_key("t.basis"),
            task: LoadTask::DecodeTexture { url: UrlString::new("t.basis") },
            task_max_dist: 50.0,
            positions: vec![DVec3::new(10.0, 0.0, 0.0)],
            priority: 0.0,
        };
        assert!(!is_out_of_range(&item, DVec3::ZERO));
        assert!(is_out_of_range(&item, DVec3::new(1000.0, 0.0, 0.0)));
    }
}
