use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use glam::IVec3;
use parking_lot::Mutex;
use substrata_protocol::{ParcelId, Uid};

use crate::avatar::Avatar;
use crate::clock::ClockState;
use crate::lod_chunk::LodChunk;
use crate::parcel::Parcel;
use crate::world_object::WorldObject;

/// Everything protected by the single coarse lock, so that high-frequency
/// foreground code can traverse the whole world atomically.
#[derive(Default)]
struct WorldStateInner {
    objects: HashMap<Uid, WorldObject>,
    avatars: HashMap<Uid, Avatar>,
    parcels: HashMap<ParcelId, Parcel>,
    lod_chunks: HashMap<IVec3, LodChunk>,
    dirty_from_remote_objects: HashSet<Uid>,
    dirty_from_local_objects: HashSet<Uid>,
    clock: Option<ClockState>,
}

/// Replicated client-side view of the world: objects, avatars, parcels, and
/// LOD chunks, plus dirty tracking and the global-time estimator. Guarded by
/// a single lock; map mutations are idempotent (removing a missing key is a
/// no-op).
pub struct WorldState {
    inner: Mutex<WorldStateInner>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(WorldStateInner::default()),
        }
    }

    pub fn insert_object(&self, object: WorldObject) {
        let mut inner = self.inner.lock();
        let uid = object.uid;
        inner.objects.insert(uid, object);
        inner.dirty_from_remote_objects.insert(uid);
    }

    pub fn remove_object(&self, uid: Uid) -> Option<WorldObject> {
        let mut inner = self.inner.lock();
        inner.dirty_from_remote_objects.remove(&uid);
        inner.dirty_from_local_objects.remove(&uid);
        inner.objects.remove(&uid)
    }

    pub fn with_object<R>(&self, uid: Uid, f: impl FnOnce(&WorldObject) -> R) -> Option<R> {
        let inner = self.inner.lock();
        inner.objects.get(&uid).map(f)
    }

    pub fn with_object_mut<R>(
        &self,
        uid: Uid,
        f: impl FnOnce(&mut WorldObject) -> R,
    ) -> Option<R> {
        let mut inner = self.inner.lock();
        let result = inner.objects.get_mut(&uid).map(f);
        if result.is_some() {
            inner.dirty_from_remote_objects.insert(uid);
        }
        result
    }

    /// Like `with_object_mut`, but for runtime-only bookkeeping (proximity
    /// flags computed locally by this client) that must not be mistaken for
    /// a server-driven change the next time `drain_dirty_from_remote` runs.
    pub fn with_object_mut_no_dirty<R>(
        &self,
        uid: Uid,
        f: impl FnOnce(&mut WorldObject) -> R,
    ) -> Option<R> {
        let mut inner = self.inner.lock();
        inner.objects.get_mut(&uid).map(f)
    }

    pub fn object_uids(&self) -> Vec<Uid> {
        self.inner.lock().objects.keys().copied().collect()
    }

    pub fn num_objects(&self) -> usize {
        self.inner.lock().objects.len()
    }

    pub fn insert_avatar(&self, avatar: Avatar) {
        self.inner.lock().avatars.insert(avatar.uid, avatar);
    }

    pub fn remove_avatar(&self, uid: Uid) -> Option<Avatar> {
        self.inner.lock().avatars.remove(&uid)
    }

    pub fn with_avatar<R>(&self, uid: Uid, f: impl FnOnce(&Avatar) -> R) -> Option<R> {
        self.inner.lock().avatars.get(&uid).map(f)
    }

    pub fn avatar_uids(&self) -> Vec<Uid> {
        self.inner.lock().avatars.keys().copied().collect()
    }

    pub fn insert_parcel(&self, parcel: Parcel) {
        self.inner.lock().parcels.insert(parcel.id, parcel);
    }

    pub fn with_parcel<R>(&self, id: ParcelId, f: impl FnOnce(&Parcel) -> R) -> Option<R> {
        self.inner.lock().parcels.get(&id).map(f)
    }

    pub fn insert_lod_chunk(&self, chunk: LodChunk) {
        self.inner.lock().lod_chunks.insert(chunk.coord, chunk);
    }

    pub fn with_lod_chunk<R>(&self, coord: IVec3, f: impl FnOnce(&LodChunk) -> R) -> Option<R> {
        self.inner.lock().lod_chunks.get(&coord).map(f)
    }

    /// Drains and returns the set of objects mutated by the receiver since
    /// the last drain.
    pub fn drain_dirty_from_remote(&self) -> HashSet<Uid> {
        std::mem::take(&mut self.inner.lock().dirty_from_remote_objects)
    }

    pub fn mark_dirty_from_local(&self, uid: Uid) {
        self.inner.lock().dirty_from_local_objects.insert(uid);
    }

    pub fn drain_dirty_from_local(&self) -> HashSet<Uid> {
        std::mem::take(&mut self.inner.lock().dirty_from_local_objects)
    }

    pub fn update_with_global_time_received(&self, server_t: f64, local_recv_time: Instant) {
        let mut inner = self.inner.lock();
        let clock = inner
            .clock
            .get_or_insert_with(|| ClockState::new(local_recv_time));
        clock.update_with_global_time_received(server_t, local_recv_time);
    }

    pub fn new_round_trip_time_computed(&self, rtt: Duration) {
        let mut inner = self.inner.lock();
        if let Some(clock) = inner.clock.as_mut() {
            clock.new_round_trip_time_computed(rtt);
        }
    }

    pub fn current_global_time(&self, now: Instant) -> f64 {
        let inner = self.inner.lock();
        inner.clock.as_ref().map(|c| c.current_global_time(now)).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use substrata_protocol::url_string::UrlString;

    #[test]
    fn insert_and_remove_are_idempotent() {
        let state = WorldState::new();
        assert!(state.remove_object(Uid(1)).is_none());

        let ob = WorldObject::new(Uid(1), Uid(0), DVec3::ZERO, UrlString::new("a_1.bmesh"));
        state.insert_object(ob);
        assert_eq!(state.num_objects(), 1);
        assert!(state.remove_object(Uid(1)).is_some());
        assert!(state.remove_object(Uid(1)).is_none());
        assert_eq!(state.num_objects(), 0);
    }

    #[test]
    fn dirty_set_drains_once() {
        let state = WorldState::new();
        let ob = WorldObject::new(Uid(1), Uid(0), DVec3::ZERO, UrlString::new("a_1.bmesh"));
        state.insert_object(ob);
        let dirty = state.drain_dirty_from_remote();
        assert!(dirty.contains(&Uid(1)));
        assert!(state.drain_dirty_from_remote().is_empty());
    }
}
