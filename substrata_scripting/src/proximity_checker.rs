//! Scripted-object proximity checker (§4.L): translates "camera moved near
//! / away from an object's AABB" into local callbacks and server-bound
//! events. No hysteresis band — the 20 m threshold toggles the flag
//! directly, per the Open Question resolution in SPEC_FULL.md §9 (the
//! original source's `ScriptedObjectProximityChecker.cpp` has none either).

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;
use glam::DVec3;
use substrata_protocol::Uid;

/// Distance, in metres, inside which a "moved near" event fires.
pub const SCRIPT_PROXIMITY_RADIUS: f64 = 20.0;

pub trait ScriptProximityCallbacks {
    fn user_moved_near_to_object(&mut self, object_uid: Uid);
    fn user_moved_away_from_object(&mut self, object_uid: Uid);
}

struct TrackedScriptObject {
    aabb_min: DVec3,
    aabb_max: DVec3,
    in_script_proximity: bool,
}

fn closest_point_on_aabb(p: DVec3, min: DVec3, max: DVec3) -> DVec3 {
    DVec3::new(p.x.clamp(min.x, max.x), p.y.clamp(min.y, max.y), p.z.clamp(min.z, max.z))
}

/// Linear-iteration set of scripted objects, checked every tick against the
/// camera position.
#[derive(Default, Resource)]
pub struct ScriptedObjectProximityChecker {
    tracked: HashMap<Uid, TrackedScriptObject>,
}

impl ScriptedObjectProximityChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, uid: Uid, aabb_min: DVec3, aabb_max: DVec3) {
        self.tracked.insert(uid, TrackedScriptObject { aabb_min, aabb_max, in_script_proximity: false });
    }

    pub fn remove_object(&mut self, uid: Uid) {
        self.tracked.remove(&uid);
    }

    pub fn is_in_script_proximity(&self, uid: Uid) -> bool {
        self.tracked.get(&uid).map(|t| t.in_script_proximity).unwrap_or(false)
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.tracked.contains_key(&uid)
    }

    /// Per tick: for each tracked object, computes the closest AABB point to
    /// `cam_pos` and fires the local handler plus a server-bound callback on
    /// a radius crossing.
    pub fn update(&mut self, cam_pos: DVec3, callbacks: &mut impl ScriptProximityCallbacks) {
        for (&uid, tracked) in self.tracked.iter_mut() {
            let closest = closest_point_on_aabb(cam_pos, tracked.aabb_min, tracked.aabb_max);
            let dist = closest.distance(cam_pos);
            let now_near = dist < SCRIPT_PROXIMITY_RADIUS;

            if now_near && !tracked.in_script_proximity {
                tracked.in_script_proximity = true;
                callbacks.user_moved_near_to_object(uid);
            } else if !now_near && tracked.in_script_proximity {
                tracked.in_script_proximity = false;
                callbacks.user_moved_away_from_object(uid);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        near: Vec<Uid>,
        away: Vec<Uid>,
    }

    impl ScriptProximityCallbacks for Recorder {
        fn user_moved_near_to_object(&mut self, object_uid: Uid) {
            self.near.push(object_uid);
        }
        fn user_moved_away_from_object(&mut self, object_uid: Uid) {
            self.away.push(object_uid);
        }
    }

    // Scenario 6: object 30 m away produces no event; moving to 15 m fires
    // exactly one near event; moving to 25 m and back with no hysteresis
    // fires the symmetric away/near pair (the "no hysteresis" reading).
    #[test]
    fn scenario_6_enter_and_oscillate_without_hysteresis() {
        let uid = Uid(1);
        let mut checker = ScriptedObjectProximityChecker::new();
        checker.add_object(uid, DVec3::ZERO, DVec3::ZERO);
        let mut rec = Recorder::default();

        checker.update(DVec3::new(30.0, 0.0, 0.0), &mut rec);
        assert!(rec.near.is_empty());

        checker.update(DVec3::new(15.0, 0.0, 0.0), &mut rec);
        assert_eq!(rec.near, vec![uid]);
        assert!(rec.away.is_empty());

        checker.update(DVec3::new(25.0, 0.0, 0.0), &mut rec);
        assert_eq!(rec.away, vec![uid]);

        checker.update(DVec3::new(15.0, 0.0, 0.0), &mut rec);
        assert_eq!(rec.near, vec![uid, uid]);
    }

    #[test]
    fn closest_point_clamps_into_aabb() {
        let p = closest_point_on_aabb(DVec3::new(100.0, 0.0, -50.0), DVec3::new(-1.0, -1.0, -1.0), DVec3::new(1.0, 1.0, 1.0));
        assert_eq!(p, DVec3::new(1.0, 0.0, -1.0));
    }
}
