//! `bevy_ecs` systems run by the foreground `App` schedule (§9): the rolling
//! LOD sweep, proximity-driven load/unload, the load-item decode consumer,
//! and the physics-ownership sweep.

use bevy_ecs::prelude::{Res, ResMut};
use substrata_pipeline::{LoadTask, LoadTaskKey};
use substrata_protocol::wire::Writer;
use substrata_protocol::{message_id, Uid};
use substrata_world::{ObjectFlags, ProximityCallbacks, ProximityLoader};
use substrata_scripting::{ScriptEventRegistry, ScriptProximityCallbacks, ScriptedObjectProximityChecker, TimerQueue};

use crate::animated_texture::{AnimatedTextureCoordinator, MaterialChannel, MaterialSlot};
use crate::load_coordinator::{closest_distance, lod_level_for_distance, LoadCoordinator};
use crate::physics_arbiter::PhysicsOwnershipArbiter;
use crate::resource_arena::{DecodedMesh, DecodedTexture, ResourceArena};
use crate::resources::{
    CameraPosition, DownloadQueueResource, LoadItemQueueResource, ResourcesDirResource, SelfId,
    SenderHandleResource, TokioHandleResource, WorldStateResource,
};

/// Each tick, re-checks LOD for a rolling slice of objects and enqueues a
/// download for any optimised mesh variant not already in flight.
pub fn lod_and_download_sweep_system(
    world_state: Res<WorldStateResource>,
    cam: Res<CameraPosition>,
    mut coordinator: ResMut<LoadCoordinator>,
    download_queue: Res<DownloadQueueResource>,
    runtime: Res<TokioHandleResource>,
) {
    let uids = world_state.0.object_uids();
    let batch = coordinator.next_lod_sweep_batch(&uids);

    for uid in batch {
        let picked = world_state.0.with_object(uid, |ob| {
            (
                ob.model_url.clone(),
                ob.pos,
                ob.max_model_lod_level,
                ob.longest_aabb_edge(),
                ob.flags.contains(ObjectFlags::DYNAMIC),
            )
        });
        let Some((Some(model_url), pos, max_lod, longest_edge, dynamic)) = picked else {
            continue;
        };

        let dist = closest_distance(pos, cam.0);
        let lod_level = lod_level_for_distance(dist, max_lod);
        let target_url = model_url.optimised_mesh_url(lod_level as u32);

        if coordinator.check_add_model(&target_url, dynamic, uid) {
            let size_factor = substrata_pipeline::size_factor(longest_edge.max(1.0));
            runtime
                .0
                .block_on(download_queue.0.enqueue_or_update(target_url, pos, size_factor));
        }
    }
}

/// Bridges `ProximityLoader`'s load/unload callbacks into the decode-gating
/// layer: a newly-in-range object's model/audio are registered with
/// `LoadCoordinator` and, on first registration, enqueued onto the
/// load-item queue for decode. An object leaving range tears down its
/// animated-texture state.
struct ProxCallbacks<'a> {
    world_state: &'a WorldStateResource,
    coordinator: &'a mut LoadCoordinator,
    load_item_queue: &'a LoadItemQueueResource,
    animated_texture: &'a mut AnimatedTextureCoordinator,
    runtime: &'a TokioHandleResource,
}

impl ProximityCallbacks for ProxCallbacks<'_> {
    fn load_object(&mut self, uid: Uid) {
        let Some((model_url, audio_url, dynamic, pos, materials)) = self.world_state.0.with_object(uid, |ob| {
            (ob.model_url.clone(), ob.audio_source_url.clone(), ob.flags.contains(ObjectFlags::DYNAMIC), ob.pos, ob.materials.clone())
        }) else {
            return;
        };
        self.world_state.0.with_object_mut_no_dirty(uid, |ob| ob.in_proximity = true);

        if let Some(url) = model_url {
            let lod_level = 0u8;
            let target_url = url.optimised_mesh_url(lod_level as u32);
            if self.coordinator.check_add_model(&target_url, dynamic, uid) {
                let key = LoadTaskKey::Mesh { url: target_url.clone(), lod_level, want_dynamic_physics_shape: dynamic };
                let task = LoadTask::DecodeMesh { url: target_url, lod_level, want_dynamic_physics_shape: dynamic };
                self.runtime.0.block_on(self.load_item_queue.0.enqueue_or_update(key, task, pos, 1000.0));
            }
        }
        if let Some(url) = audio_url {
            if self.coordinator.check_add_audio(&url) {
                let key = LoadTaskKey::Audio { url: url.clone() };
                let task = LoadTask::DecodeAudio { url };
                self.runtime.0.block_on(self.load_item_queue.0.enqueue_or_update(key, task, pos, 1000.0));
            }
        }
        for material in &materials {
            for url in [&material.colour_texture_url, &material.emission_texture_url].into_iter().flatten() {
                if self.coordinator.check_add_texture(url, uid) {
                    let key = LoadTaskKey::Texture { url: url.clone() };
                    let task = LoadTask::DecodeTexture { url: url.clone() };
                    self.runtime.0.block_on(self.load_item_queue.0.enqueue_or_update(key, task, pos, 1000.0));
                }
            }
        }
    }

    fn unload_object(&mut self, uid: Uid) {
        self.world_state.0.with_object_mut_no_dirty(uid, |ob| ob.in_proximity = false);
        self.animated_texture.remove_object(uid);
    }
}

struct ScriptProxCallbacksImpl<'a> {
    world_state: &'a WorldStateResource,
    script_events: &'a mut ScriptEventRegistry,
}

impl ScriptProximityCallbacks for ScriptProxCallbacksImpl<'_> {
    fn user_moved_near_to_object(&mut self, object_uid: Uid) {
        self.world_state.0.with_object_mut_no_dirty(object_uid, |ob| ob.in_script_proximity = true);
        self.script_events.fire_user_moved_near_to(object_uid);
    }

    fn user_moved_away_from_object(&mut self, object_uid: Uid) {
        self.world_state.0.with_object_mut_no_dirty(object_uid, |ob| ob.in_script_proximity = false);
        self.script_events.fire_user_moved_away_from(object_uid);
    }
}

/// Each tick: drains objects the receiver touched since the last sweep,
/// feeds their position into the proximity loader and the scripted-object
/// proximity checker, and re-evaluates the camera-driven proximity set.
/// This is the seam spec.md §2's data-flow paragraph describes: receiver
/// mutation -> proximity transition -> load/unload -> scripted event.
pub fn proximity_and_script_sweep_system(
    world_state: Res<WorldStateResource>,
    cam: Res<CameraPosition>,
    mut proximity: ResMut<ProximityLoader>,
    mut coordinator: ResMut<LoadCoordinator>,
    load_item_queue: Res<LoadItemQueueResource>,
    mut animated_texture: ResMut<AnimatedTextureCoordinator>,
    mut script_checker: ResMut<ScriptedObjectProximityChecker>,
    mut script_events: ResMut<ScriptEventRegistry>,
    runtime: Res<TokioHandleResource>,
) {
    let dirty = world_state.0.drain_dirty_from_remote();
    let mut cb = ProxCallbacks {
        world_state: &world_state,
        coordinator: &mut coordinator,
        load_item_queue: &load_item_queue,
        animated_texture: &mut animated_texture,
        runtime: &runtime,
    };

    for uid in dirty {
        let picked = world_state.0.with_object(uid, |ob| (ob.pos, ob.max_load_dist2.map(|d| (d as f64) * (d as f64)), ob.aabb_ws()));
        match picked {
            Some((pos, max_load_dist2, (aabb_min, aabb_max))) => {
                if proximity.contains(uid) {
                    proximity.object_transform_changed(uid, pos, &mut cb);
                } else {
                    proximity.check_add_object(uid, pos, max_load_dist2, &mut cb);
                }
                if !script_checker.contains(uid) {
                    script_checker.add_object(uid, aabb_min, aabb_max);
                }
            }
            None => {
                proximity.remove_object(uid, &mut cb);
                script_checker.remove_object(uid);
                animated_texture.remove_object(uid);
            }
        }
    }

    proximity.update_cam_pos(cam.0, &mut cb);

    let mut script_cb = ScriptProxCallbacksImpl { world_state: &world_state, script_events: &mut script_events };
    script_checker.update(cam.0, &mut script_cb);
}

/// Each tick: for every object currently in proximity, advances its
/// material slots' browser/GIF state based on distance to the camera. There
/// is no renderer crate in this workspace to supply real frustum culling, so
/// "in proximity" stands in for "in frustum" — consistent with treating the
/// proximity grid as the visibility proxy everywhere else in this sweep.
pub fn animated_texture_sweep_system(
    world_state: Res<WorldStateResource>,
    cam: Res<CameraPosition>,
    proximity: Res<ProximityLoader>,
    mut animated_texture: ResMut<AnimatedTextureCoordinator>,
) {
    for uid in world_state.0.object_uids() {
        if !proximity.is_in_proximity(uid) {
            continue;
        }
        let Some((pos, bbox_len, materials)) =
            world_state.0.with_object(uid, |ob| (ob.pos, ob.longest_aabb_edge(), ob.materials.clone()))
        else {
            continue;
        };
        let dist = closest_distance(pos, cam.0) as f32;

        for (material_index, material) in materials.iter().enumerate() {
            if material.colour_texture_url.is_some() {
                let slot = MaterialSlot { object_uid: uid, material_index, channel: MaterialChannel::Colour };
                animated_texture.tick_slot(slot, true, dist, bbox_len);
            }
            if material.emission_texture_url.is_some() {
                let slot = MaterialSlot { object_uid: uid, material_index, channel: MaterialChannel::Emission };
                animated_texture.tick_slot(slot, true, dist, bbox_len);
            }
        }
    }
}

/// Each tick: fires every timer whose trigger time has passed. No Lua VM
/// lives in this workspace (§1 Non-goals) to hand the firing back to, so a
/// fired timer is logged rather than dispatched to a script evaluator —
/// enough to exercise `TimerQueue::update` end to end without inventing the
/// evaluator the spec never asked for.
pub fn timer_sweep_system(world_state: Res<WorldStateResource>, mut timers: ResMut<TimerQueue>) {
    let now = world_state.0.current_global_time(std::time::Instant::now());
    let mut fired = Vec::new();
    timers.update(now, &mut fired);
    for timer in fired {
        tracing::debug!(script_id = %timer.script_id, timer_id = timer.timer_id, "timer fired");
    }
}

/// Drains a bounded number of decode tasks from the load-item queue each
/// tick. No image/mesh/audio codec lives in this workspace (there is no
/// renderer crate to consume a decoded result), so the "decode" step reads
/// the already-downloaded bytes from disk and stores them verbatim in the
/// arena — enough to exercise the queue -> arena -> waiter-release path
/// end to end without inventing a codec the spec never asked for.
pub const LOAD_ITEM_CONSUMER_BATCH_SIZE: usize = 8;

pub fn load_item_consumer_system(
    load_item_queue: Res<LoadItemQueueResource>,
    mut coordinator: ResMut<LoadCoordinator>,
    mut arena: ResMut<ResourceArena>,
    resources_dir: Res<ResourcesDirResource>,
    runtime: Res<TokioHandleResource>,
) {
    for _ in 0..LOAD_ITEM_CONSUMER_BATCH_SIZE {
        let Some(item) = runtime.0.block_on(load_item_queue.0.try_dequeue_one()) else {
            break;
        };
        match item.task {
            LoadTask::DecodeMesh { url, lod_level, want_dynamic_physics_shape } => {
                let bytes = std::fs::read(resources_dir.0.join(url.as_str())).unwrap_or_default();
                arena.insert_mesh(DecodedMesh { lod_level, vertex_data: bytes, index_data: Vec::new() });
                let waiters = coordinator.take_model_waiters(&url, want_dynamic_physics_shape);
                tracing::debug!(%url, waiters = waiters.len(), "mesh decode task completed");
            }
            LoadTask::DecodeTexture { url } => {
                let bytes = std::fs::read(resources_dir.0.join(url.as_str())).unwrap_or_default();
                arena.insert_texture(DecodedTexture { width: 0, height: 0, pixels: bytes });
                let waiters = coordinator.take_texture_waiters(&url);
                tracing::debug!(%url, waiters = waiters.len(), "texture decode task completed");
            }
            LoadTask::DecodeAudio { url } => {
                coordinator.finish_audio(&url);
                tracing::debug!(%url, "audio decode task completed");
            }
            LoadTask::CompileScript { object_uid, .. } => {
                coordinator.finish_script(object_uid);
                tracing::debug!(%object_uid, "script compile task completed");
            }
        }
    }
}

/// Each tick: for every dynamic object currently in proximity, takes
/// ownership if it's unowned/stale or renews it if this client already owns
/// it and the renewal period has elapsed, sending the corresponding
/// `ObjectPhysicsOwnershipTaken` frame.
pub fn physics_ownership_sweep_system(
    world_state: Res<WorldStateResource>,
    proximity: Res<ProximityLoader>,
    arbiter: Res<PhysicsOwnershipArbiter>,
    self_id: Res<SelfId>,
    sender: Res<SenderHandleResource>,
    runtime: Res<TokioHandleResource>,
) {
    let Some(self_uid) = self_id.0 else {
        return;
    };
    let now = world_state.0.current_global_time(std::time::Instant::now());

    for uid in world_state.0.object_uids() {
        if !proximity.is_in_proximity(uid) {
            continue;
        }
        let Some((dynamic, owner_id, last_renewal)) = world_state
            .0
            .with_object(uid, |ob| (ob.flags.contains(ObjectFlags::DYNAMIC), ob.physics_owner_id, ob.physics_owner_last_renewal_time))
        else {
            continue;
        };
        if !dynamic {
            continue;
        }

        let should_take = arbiter.is_unowned(owner_id, last_renewal, now);
        let should_renew = !should_take
            && arbiter.is_owned_by_self(owner_id, last_renewal, self_uid, now)
            && arbiter.should_renew(last_renewal, now);
        if !should_take && !should_renew {
            continue;
        }

        world_state.0.with_object_mut_no_dirty(uid, |ob| {
            ob.physics_owner_id = Some(self_uid);
            if should_take {
                ob.physics_owner_take_time = now;
            }
            ob.physics_owner_last_renewal_time = now;
        });

        let mut w = Writer::new();
        w.write_u64(uid.0).write_u64(self_uid.0).write_f64(now);
        let payload = w.into_bytes();
        runtime.0.block_on(sender.0.enqueue_frame(message_id::OBJECT_PHYSICS_OWNERSHIP_TAKEN, &payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bevy_ecs::prelude::World;
    use glam::DVec3;
    use substrata_pipeline::DownloadQueue;
    use substrata_protocol::{Uid, UrlString};
    use substrata_world::{WorldObject, WorldState};

    use crate::animated_texture::BrowserState;

    #[test]
    fn sweep_enqueues_a_download_for_an_unseen_model() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let world_state = Arc::new(WorldState::new());
        let ob = WorldObject::new(Uid(1), Uid(0), DVec3::new(50.0, 0.0, 0.0), UrlString::new("chair_1.bmesh"));
        world_state.insert_object(ob);

        let mut world = World::new();
        world.insert_resource(WorldStateResource(world_state));
        world.insert_resource(CameraPosition(DVec3::ZERO));
        world.insert_resource(LoadCoordinator::default());
        world.insert_resource(DownloadQueueResource(Arc::new(DownloadQueue::new())));
        world.insert_resource(TokioHandleResource(rt.handle().clone()));

        let mut schedule = bevy_ecs::prelude::Schedule::default();
        schedule.add_systems(lod_and_download_sweep_system);
        schedule.run(&mut world);

        let queue = world.resource::<DownloadQueueResource>().0.clone();
        rt.block_on(async {
            assert_eq!(queue.len().await, 1);
        });
    }

    #[test]
    fn proximity_sweep_loads_a_dirty_object_and_enqueues_its_mesh() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let world_state = Arc::new(WorldState::new());
        let ob = WorldObject::new(Uid(1), Uid(0), DVec3::new(10.0, 0.0, 0.0), UrlString::new("chair_1.bmesh"));
        world_state.insert_object(ob);

        let mut world = World::new();
        world.insert_resource(WorldStateResource(world_state.clone()));
        world.insert_resource(CameraPosition(DVec3::ZERO));
        world.insert_resource(ProximityLoader::new(100.0, 4));
        world.insert_resource(LoadCoordinator::default());
        world.insert_resource(LoadItemQueueResource(Arc::new(substrata_pipeline::LoadItemQueue::new())));
        world.insert_resource(AnimatedTextureCoordinator::new());
        world.insert_resource(ScriptedObjectProximityChecker::new());
        world.insert_resource(ScriptEventRegistry::default());
        world.insert_resource(TokioHandleResource(rt.handle().clone()));

        let mut schedule = bevy_ecs::prelude::Schedule::default();
        schedule.add_systems(proximity_and_script_sweep_system);
        schedule.run(&mut world);

        let proximity = world.resource::<ProximityLoader>();
        assert!(proximity.is_in_proximity(Uid(1)));
        assert!(world_state.with_object(Uid(1), |ob| ob.in_proximity).unwrap());

        let load_item_queue = world.resource::<LoadItemQueueResource>().0.clone();
        rt.block_on(async {
            assert_eq!(load_item_queue.len().await, 1);
        });
    }

    #[test]
    fn animated_texture_sweep_ticks_only_objects_with_a_texture_and_in_proximity() {
        let world_state = Arc::new(WorldState::new());
        let mut with_tex = WorldObject::new(Uid(1), Uid(0), DVec3::new(5.0, 0.0, 0.0), UrlString::new("screen_1.bmesh"));
        with_tex.materials = vec![substrata_world::WorldMaterial {
            colour_rgb: glam::Vec3::ONE,
            colour_texture_url: Some(UrlString::new("clip.mp4")),
            emission_rgb: glam::Vec3::ZERO,
            emission_texture_url: None,
            tex_matrix: [1.0, 0.0, 0.0, 1.0],
            opacity: 1.0,
            flags: 0,
        }];
        world_state.insert_object(with_tex);
        world_state.insert_object(WorldObject::new(Uid(2), Uid(0), DVec3::new(5.0, 0.0, 0.0), UrlString::new("chair_1.bmesh")));

        let mut proximity = ProximityLoader::new(100.0, 4);
        struct NoopCb;
        impl ProximityCallbacks for NoopCb {
            fn load_object(&mut self, _uid: Uid) {}
            fn unload_object(&mut self, _uid: Uid) {}
        }
        let mut cb = NoopCb;
        proximity.check_add_object(Uid(1), DVec3::new(5.0, 0.0, 0.0), None, &mut cb);

        let mut world = World::new();
        world.insert_resource(WorldStateResource(world_state));
        world.insert_resource(CameraPosition(DVec3::ZERO));
        world.insert_resource(proximity);
        world.insert_resource(AnimatedTextureCoordinator::new());

        let mut schedule = bevy_ecs::prelude::Schedule::default();
        schedule.add_systems(animated_texture_sweep_system);
        schedule.run(&mut world);

        let mut coordinator = world.resource_mut::<AnimatedTextureCoordinator>();
        let slot = MaterialSlot { object_uid: Uid(1), material_index: 0, channel: MaterialChannel::Colour };
        assert_eq!(coordinator.state_mut(slot).browser_state, BrowserState::BrowserCreated);
    }
}
