use std::collections::{HashMap, HashSet};

use bevy_ecs::prelude::Resource;
use glam::{DVec3, IVec3};
use substrata_protocol::Uid;

/// Fixed cell width of the proximity grid, in metres.
pub const CELL_WIDTH: f64 = 200.0;

fn cell_of(pos: DVec3) -> IVec3 {
    IVec3::new(
        (pos.x / CELL_WIDTH).floor() as i32,
        (pos.y / CELL_WIDTH).floor() as i32,
        (pos.z / CELL_WIDTH).floor() as i32,
    )
}

fn hash_cell(cell: IVec3, mask: u64) -> u64 {
    let x = (cell.x as i64 as u64).wrapping_mul(73856093);
    let y = (cell.y as i64 as u64).wrapping_mul(19349663);
    let z = (cell.z as i64 as u64).wrapping_mul(83492791);
    (x ^ y ^ z) & mask
}

/// Callbacks driven by the proximity loader. Implemented by the foreground
/// coordinator; kept as a plain trait (rather than a closure) so a single
/// implementation can carry whatever state it needs to enqueue downloads
/// and load-items.
pub trait ProximityCallbacks {
    fn load_object(&mut self, uid: Uid);
    fn unload_object(&mut self, uid: Uid);
    /// A grid cell entered proximity range for the first time; the client
    /// uses this to issue a server query for objects in that cell.
    fn new_cell_in_proximity(&mut self, cell: IVec3) {
        let _ = cell;
    }
}

struct TrackedObject {
    pos: DVec3,
    max_load_dist2: Option<f64>,
    cell: IVec3,
    in_proximity: bool,
}

/// Hashed 3-D grid that decides which objects are "live" based on camera
/// distance, driving load/unload callbacks.
///
/// Ordering guarantee: for any object, the sequence of callbacks observed is
/// a valid match of `load (unload load)*` — a load never immediately
/// follows a load, and every unload follows exactly one earlier load.
#[derive(Resource)]
pub struct ProximityLoader {
    load_distance: f64,
    last_cam_pos: DVec3,
    bucket_mask: u64,
    buckets: HashMap<u64, HashSet<Uid>>,
    objects: HashMap<Uid, TrackedObject>,
    surveyed_cells: HashSet<IVec3>,
}

impl ProximityLoader {
    pub fn new(load_distance: f64, num_buckets_pow2: u32) -> Self {
        Self {
            load_distance,
            last_cam_pos: DVec3::ZERO,
            bucket_mask: (1u64 << num_buckets_pow2) - 1,
            buckets: HashMap::new(),
            objects: HashMap::new(),
            surveyed_cells: HashSet::new(),
        }
    }

    pub fn load_distance(&self) -> f64 {
        self.load_distance
    }

    fn effective_radius2(&self, max_load_dist2: Option<f64>) -> f64 {
        match max_load_dist2 {
            Some(d2) => d2.min(self.load_distance * self.load_distance),
            None => self.load_distance * self.load_distance,
        }
    }

    fn bucket_key(&self, cell: IVec3) -> u64 {
        hash_cell(cell, self.bucket_mask)
    }

    pub fn check_add_object(
        &mut self,
        uid: Uid,
        pos: DVec3,
        max_load_dist2: Option<f64>,
        callbacks: &mut impl ProximityCallbacks,
    ) {
        let cell = cell_of(pos);
        let key = self.bucket_key(cell);
        self.buckets.entry(key).or_default().insert(uid);

        let radius2 = self.effective_radius2(max_load_dist2);
        let in_range = self.last_cam_pos.distance_squared(pos) <= radius2;

        let in_proximity = in_range;
        if in_range {
            callbacks.load_object(uid);
        }
        self.objects.insert(
            uid,
            TrackedObject {
                pos,
                max_load_dist2,
                cell,
                in_proximity,
            },
        );
    }

    pub fn remove_object(&mut self, uid: Uid, callbacks: &mut impl ProximityCallbacks) {
        if let Some(tracked) = self.objects.remove(&uid) {
            let key = self.bucket_key(tracked.cell);
            if let Some(bucket) = self.buckets.get_mut(&key) {
                bucket.remove(&uid);
            }
            if tracked.in_proximity {
                callbacks.unload_object(uid);
            }
        }
    }

    pub fn object_transform_changed(
        &mut self,
        uid: Uid,
        new_pos: DVec3,
        callbacks: &mut impl ProximityCallbacks,
    ) {
        let Some(tracked) = self.objects.get_mut(&uid) else {
            return;
        };
        let new_cell = cell_of(new_pos);
        if new_cell != tracked.cell {
            let old_key = self.bucket_key(tracked.cell);
            if let Some(bucket) = self.buckets.get_mut(&old_key) {
                bucket.remove(&uid);
            }
            let new_key = self.bucket_key(new_cell);
            self.buckets.entry(new_key).or_default().insert(uid);
            tracked.cell = new_cell;
        }
        tracked.pos = new_pos;

        let radius2 = self.effective_radius2(tracked.max_load_dist2);
        let in_range = self.last_cam_pos.distance_squared(new_pos) <= radius2;
        if in_range && !tracked.in_proximity {
            tracked.in_proximity = true;
            callbacks.load_object(uid);
        } else if !in_range && tracked.in_proximity {
            tracked.in_proximity = false;
            callbacks.unload_object(uid);
        }
    }

    /// Only recomputes the load set when the camera has moved more than 1 m
    /// since the last call, matching the source's motion threshold.
    pub fn update_cam_pos(&mut self, new_cam_pos: DVec3, callbacks: &mut impl ProximityCallbacks) {
        if self.last_cam_pos.distance_squared(new_cam_pos) <= 1.0 {
            return;
        }
        self.last_cam_pos = new_cam_pos;
        self.recompute_proximity(callbacks);
    }

    pub fn set_load_distance(&mut self, new_distance: f64, callbacks: &mut impl ProximityCallbacks) {
        self.load_distance = new_distance;
        self.recompute_proximity(callbacks);
    }

    fn recompute_proximity(&mut self, callbacks: &mut impl ProximityCallbacks) {
        let cam = self.last_cam_pos;
        let mut newly_in_range = Vec::new();
        let mut newly_out_of_range = Vec::new();

        for (&uid, tracked) in self.objects.iter() {
            let radius2 = {
                let d2 = match tracked.max_load_dist2 {
                    Some(d2) => d2.min(self.load_distance * self.load_distance),
                    None => self.load_distance * self.load_distance,
                };
                d2
            };
            let in_range = cam.distance_squared(tracked.pos) <= radius2;
            if in_range && !tracked.in_proximity {
                newly_in_range.push(uid);
            } else if !in_range && tracked.in_proximity {
                newly_out_of_range.push(uid);
            }
        }

        for uid in newly_out_of_range {
            if let Some(tracked) = self.objects.get_mut(&uid) {
                tracked.in_proximity = false;
            }
            callbacks.unload_object(uid);
        }
        for uid in newly_in_range {
            if let Some(tracked) = self.objects.get_mut(&uid) {
                tracked.in_proximity = true;
            }
            let cell = self.objects.get(&uid).map(|t| t.cell);
            if let Some(cell) = cell {
                if self.surveyed_cells.insert(cell) {
                    callbacks.new_cell_in_proximity(cell);
                }
            }
            callbacks.load_object(uid);
        }
    }

    pub fn is_in_proximity(&self, uid: Uid) -> bool {
        self.objects.get(&uid).map(|t| t.in_proximity).unwrap_or(false)
    }

    /// Whether this object is already tracked by the loader, regardless of
    /// its current proximity state.
    pub fn contains(&self, uid: Uid) -> bool {
        self.objects.contains_key(&uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<(bool, Uid)>,
    }

    impl ProximityCallbacks for Recorder {
        fn load_object(&mut self, uid: Uid) {
            self.events.push((true, uid));
        }
        fn unload_object(&mut self, uid: Uid) {
            self.events.push((false, uid));
        }
    }

    fn net_balance(events: &[(bool, Uid)], uid: Uid) -> i32 {
        events
            .iter()
            .filter(|(_, u)| *u == uid)
            .map(|(is_load, _)| if *is_load { 1 } else { -1 })
            .sum()
    }

    // P1: the number of load callbacks minus unload callbacks is 0 or 1 at
    // all times, and is 1 exactly when in_proximity is true.
    #[test]
    fn proximity_single_flight_p1() {
        let mut loader = ProximityLoader::new(500.0, 10);
        let mut rec = Recorder::default();
        let uid = Uid(1);

        loader.check_add_object(uid, DVec3::new(10.0, 0.0, 0.0), None, &mut rec);
        assert_eq!(net_balance(&rec.events, uid), 1);
        assert!(loader.is_in_proximity(uid));

        loader.update_cam_pos(DVec3::new(10000.0, 0.0, 0.0), &mut rec);
        assert_eq!(net_balance(&rec.events, uid), 0);
        assert!(!loader.is_in_proximity(uid));

        loader.update_cam_pos(DVec3::new(10.0, 0.0, 0.0), &mut rec);
        assert_eq!(net_balance(&rec.events, uid), 1);
        assert!(loader.is_in_proximity(uid));

        loader.remove_object(uid, &mut rec);
        assert_eq!(net_balance(&rec.events, uid), 0);
    }

    #[test]
    fn transform_change_crosses_boundary() {
        let mut loader = ProximityLoader::new(50.0, 10);
        let mut rec = Recorder::default();
        let uid = Uid(2);
        loader.check_add_object(uid, DVec3::new(10.0, 0.0, 0.0), None, &mut rec);
        assert!(loader.is_in_proximity(uid));

        loader.object_transform_changed(uid, DVec3::new(1000.0, 0.0, 0.0), &mut rec);
        assert!(!loader.is_in_proximity(uid));
        assert_eq!(net_balance(&rec.events, uid), 0);
    }

    #[test]
    fn hash_cell_is_deterministic() {
        let cell = IVec3::new(3, -1, 7);
        assert_eq!(hash_cell(cell, 1023), hash_cell(cell, 1023));
    }
}
