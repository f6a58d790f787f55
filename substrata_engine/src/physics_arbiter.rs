//! Physics ownership arbiter (§4.M): pure take/renew/stale logic over the
//! `(owner_id, last_renewal_time)` pair already stored on `WorldObject`.
//! The actual take/release network messages are sent by the caller; this
//! module only answers "who owns this, and is it stale".

use std::time::Duration;

use bevy_ecs::prelude::Resource;
use substrata_protocol::Uid;

#[derive(Debug, Clone, Copy, Resource)]
pub struct PhysicsOwnershipArbiter {
    pub renewal_period: Duration,
    pub stale_threshold: Duration,
}

impl Default for PhysicsOwnershipArbiter {
    fn default() -> Self {
        Self {
            renewal_period: Duration::from_secs(10),
            stale_threshold: Duration::from_secs(20),
        }
    }
}

impl PhysicsOwnershipArbiter {
    pub fn new(renewal_period: Duration, stale_threshold: Duration) -> Self {
        Self { renewal_period, stale_threshold }
    }

    /// `isObjectPhysicsOwnedBySelf`: true iff `self_uid` owns the object and
    /// its last renewal is still within the stale threshold.
    pub fn is_owned_by_self(&self, owner_id: Option<Uid>, last_renewal_time: f64, self_uid: Uid, now: f64) -> bool {
        owner_id == Some(self_uid) && (now - last_renewal_time) < self.stale_threshold.as_secs_f64()
    }

    /// True once an owner exists but hasn't renewed within `stale_threshold`
    /// — any client may now take the object.
    pub fn is_unowned(&self, owner_id: Option<Uid>, last_renewal_time: f64, now: f64) -> bool {
        match owner_id {
            None => true,
            Some(_) => (now - last_renewal_time) >= self.stale_threshold.as_secs_f64(),
        }
    }

    /// True once the owning client should resend `ObjectPhysicsOwnershipTaken`
    /// to renew its claim.
    pub fn should_renew(&self, last_renewal_time: f64, now: f64) -> bool {
        (now - last_renewal_time) >= self.renewal_period.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Scenario 4: client A takes ownership, then goes silent past the stale
    // threshold; client B observes the object as unowned and may take it.
    #[test]
    fn scenario_4_stale_owner_becomes_takeable() {
        let arbiter = PhysicsOwnershipArbiter::new(Duration::from_secs(10), Duration::from_secs(20));
        let client_a = Uid(1);
        let client_b = Uid(2);

        let take_time = 100.0;
        assert!(!arbiter.is_unowned(Some(client_a), take_time, 110.0));
        assert!(arbiter.is_owned_by_self(Some(client_a), take_time, client_a, 110.0));
        assert!(!arbiter.is_owned_by_self(Some(client_a), take_time, client_b, 110.0));

        // A crashes; no renewal for > stale_threshold.
        let now = take_time + 21.0;
        assert!(arbiter.is_unowned(Some(client_a), take_time, now));
        assert!(!arbiter.is_owned_by_self(Some(client_a), take_time, client_a, now));
    }

    #[test]
    fn renewal_due_after_renewal_period() {
        let arbiter = PhysicsOwnershipArbiter::default();
        assert!(!arbiter.should_renew(0.0, 5.0));
        assert!(arbiter.should_renew(0.0, 10.0));
    }

    #[test]
    fn unowned_object_has_no_owner() {
        let arbiter = PhysicsOwnershipArbiter::default();
        assert!(arbiter.is_unowned(None, 0.0, 0.0));
    }
}
