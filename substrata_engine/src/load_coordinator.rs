//! Resource-to-world-object coordination (§4.J): gates a mesh/texture/audio
//! URL into the pipeline's processing sets at most once while in flight, and
//! fans the eventual decoded result back out to every object waiting on it.
//! Also computes per-object LOD level from camera distance and drives the
//! rolling sweep that re-checks LOD for a slice of objects each tick rather
//! than the whole world at once.

use std::collections::{HashMap, HashSet};

use bevy_ecs::prelude::Resource;
use glam::DVec3;
use substrata_protocol::{Uid, UrlString};

/// Distance bands, in metres, mapping to discrete model LOD levels. Level 0
/// is full detail; higher indices are coarser meshes.
pub const LOD_LEVEL_DISTANCES: [f64; 2] = [100.0, 300.0];

pub fn lod_level_for_distance(dist: f64, max_lod_level: u8) -> u8 {
    let mut level = 0u8;
    for &threshold in LOD_LEVEL_DISTANCES.iter() {
        if dist > threshold {
            level += 1;
        }
    }
    level.min(max_lod_level)
}

/// How many objects the rolling LOD sweep re-checks per tick; bounds the
/// per-tick cost on worlds with many objects at the expense of staleness in
/// LOD selection for objects not yet reached this sweep.
pub const LOD_SWEEP_BATCH_SIZE: usize = 256;

#[derive(Default)]
struct UrlWaiters {
    object_uids: Vec<Uid>,
}

/// Tracks in-flight decode/build requests so the same URL is never queued
/// to the pipeline twice while a result is outstanding, and remembers which
/// objects are waiting on each URL so the result can be applied to all of
/// them once it arrives.
///
/// Models are additionally keyed on `want_dynamic_physics_shape`: two
/// objects referencing the same mesh URL but requiring different physics
/// shapes (static vs. dynamic) must not dedup against each other.
#[derive(Default, Resource)]
pub struct LoadCoordinator {
    textures_processing: HashSet<UrlString>,
    models_processing: HashSet<(UrlString, bool)>,
    audio_processing: HashSet<UrlString>,
    script_content_processing: HashSet<Uid>,

    loading_model_url_to_object_uids: HashMap<(UrlString, bool), UrlWaiters>,
    loading_texture_url_to_object_uids: HashMap<UrlString, UrlWaiters>,

    next_lod_sweep_begin_i: usize,
}

impl LoadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `object_uid` as waiting on `url`'s model decode, keyed also
    /// on `want_dynamic_physics_shape` so two objects wanting different
    /// physics shapes for the same mesh never share an in-flight slot.
    /// Returns `true` if this is the first waiter, meaning the caller should
    /// actually enqueue the download/decode task.
    pub fn check_add_model(&mut self, url: &UrlString, want_dynamic_physics_shape: bool, object_uid: Uid) -> bool {
        let key = (url.clone(), want_dynamic_physics_shape);
        let waiters = self
            .loading_model_url_to_object_uids
            .entry(key.clone())
            .or_default();
        waiters.object_uids.push(object_uid);
        self.models_processing.insert(key)
    }

    pub fn check_add_texture(&mut self, url: &UrlString, object_uid: Uid) -> bool {
        let waiters = self
            .loading_texture_url_to_object_uids
            .entry(url.clone())
            .or_default();
        waiters.object_uids.push(object_uid);
        self.textures_processing.insert(url.clone())
    }

    pub fn check_add_audio(&mut self, url: &UrlString) -> bool {
        self.audio_processing.insert(url.clone())
    }

    pub fn check_add_script(&mut self, object_uid: Uid) -> bool {
        self.script_content_processing.insert(object_uid)
    }

    /// Called once a model decode completes: clears the in-flight marker and
    /// returns every object that was waiting on it.
    pub fn take_model_waiters(&mut self, url: &UrlString, want_dynamic_physics_shape: bool) -> Vec<Uid> {
        let key = (url.clone(), want_dynamic_physics_shape);
        self.models_processing.remove(&key);
        self.loading_model_url_to_object_uids
            .remove(&key)
            .map(|w| w.object_uids)
            .unwrap_or_default()
    }

    pub fn take_texture_waiters(&mut self, url: &UrlString) -> Vec<Uid> {
        self.textures_processing.remove(url);
        self.loading_texture_url_to_object_uids
            .remove(url)
            .map(|w| w.object_uids)
            .unwrap_or_default()
    }

    pub fn finish_audio(&mut self, url: &UrlString) {
        self.audio_processing.remove(url);
    }

    pub fn finish_script(&mut self, object_uid: Uid) {
        self.script_content_processing.remove(&object_uid);
    }

    pub fn is_model_processing(&self, url: &UrlString, want_dynamic_physics_shape: bool) -> bool {
        self.models_processing.contains(&(url.clone(), want_dynamic_physics_shape))
    }

    pub fn is_texture_processing(&self, url: &UrlString) -> bool {
        self.textures_processing.contains(url)
    }

    /// Selects the next `LOD_SWEEP_BATCH_SIZE` UIDs from `all_uids` in
    /// rolling order, wrapping back to the start once the sweep passes the
    /// end of the list. `all_uids` is expected to be supplied in a stable
    /// order (e.g. sorted) across calls so the cursor progresses sensibly.
    pub fn next_lod_sweep_batch(&mut self, all_uids: &[Uid]) -> Vec<Uid> {
        if all_uids.is_empty() {
            return Vec::new();
        }
        if self.next_lod_sweep_begin_i >= all_uids.len() {
            self.next_lod_sweep_begin_i = 0;
        }
        let start = self.next_lod_sweep_begin_i;
        let end = (start + LOD_SWEEP_BATCH_SIZE).min(all_uids.len());
        let mut batch: Vec<Uid> = all_uids[start..end].to_vec();

        if end - start < LOD_SWEEP_BATCH_SIZE {
            let wrap_end = (LOD_SWEEP_BATCH_SIZE - (end - start)).min(start);
            batch.extend_from_slice(&all_uids[0..wrap_end]);
            self.next_lod_sweep_begin_i = wrap_end;
        } else {
            self.next_lod_sweep_begin_i = end;
        }
        batch
    }
}

pub fn closest_distance(object_pos: DVec3, cam_pos: DVec3) -> f64 {
    object_pos.distance(cam_pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lod_level_increases_with_distance() {
        assert_eq!(lod_level_for_distance(10.0, 2), 0);
        assert_eq!(lod_level_for_distance(150.0, 2), 1);
        assert_eq!(lod_level_for_distance(500.0, 2), 2);
    }

    #[test]
    fn lod_level_is_capped_at_max_model_lod_level() {
        assert_eq!(lod_level_for_distance(500.0, 1), 1);
        assert_eq!(lod_level_for_distance(500.0, 0), 0);
    }

    #[test]
    fn model_dedup_only_enqueues_first_waiter() {
        let mut coord = LoadCoordinator::new();
        let url = UrlString::new("chair.bmesh");
        assert!(coord.check_add_model(&url, false, Uid(1)));
        assert!(!coord.check_add_model(&url, false, Uid(2)));

        let waiters = coord.take_model_waiters(&url, false);
        assert_eq!(waiters, vec![Uid(1), Uid(2)]);
        assert!(!coord.is_model_processing(&url, false));
    }

    // The same mesh URL requested with a different want_dynamic_physics_shape
    // must be tracked independently, not deduped against the first request.
    #[test]
    fn model_key_distinguishes_dynamic_physics_shape() {
        let mut coord = LoadCoordinator::new();
        let url = UrlString::new("chair.bmesh");
        assert!(coord.check_add_model(&url, false, Uid(1)));
        assert!(coord.check_add_model(&url, true, Uid(2)));

        assert_eq!(coord.take_model_waiters(&url, false), vec![Uid(1)]);
        assert_eq!(coord.take_model_waiters(&url, true), vec![Uid(2)]);
    }

    #[test]
    fn texture_waiters_are_independent_of_model_waiters() {
        let mut coord = LoadCoordinator::new();
        let url = UrlString::new("brick.basis");
        assert!(coord.check_add_texture(&url, Uid(1)));
        assert!(coord.is_texture_processing(&url));
        assert!(!coord.is_model_processing(&url, false));
    }

    #[test]
    fn lod_sweep_batch_wraps_around() {
        let mut coord = LoadCoordinator::new();
        let uids: Vec<Uid> = (0..(LOD_SWEEP_BATCH_SIZE as u64 + 10)).map(Uid).collect();
        let first = coord.next_lod_sweep_batch(&uids);
        assert_eq!(first.len(), LOD_SWEEP_BATCH_SIZE);
        let second = coord.next_lod_sweep_batch(&uids);
        assert_eq!(second.len(), LOD_SWEEP_BATCH_SIZE);
        assert_eq!(second[0], uids[LOD_SWEEP_BATCH_SIZE]);
    }
}
