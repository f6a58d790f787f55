//! Animated texture / embedded-browser coordinator (§4.K): per-material
//! state machines deciding when GIF frame advance and video/browser
//! playback are worth the cost, based on frustum membership and a
//! distance+projected-size hysteresis.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;
use substrata_protocol::Uid;

/// Objects within this distance (and with a large-enough projected size)
/// keep animating a still GIF-style texture.
pub const LARGE_ENOUGH_MAX_DIST: f32 = 200.0;
pub const LARGE_ENOUGH_MIN_PROJ_LEN: f32 = 0.01;
/// Tighter distance bound before an expensive video decoder / browser is
/// worth allocating.
pub const MP4_LARGE_ENOUGH_MAX_DIST: f32 = 20.0;

pub fn large_enough(dist: f32, proj_len: f32) -> bool {
    dist <= LARGE_ENOUGH_MAX_DIST && proj_len > LARGE_ENOUGH_MIN_PROJ_LEN
}

pub fn mp4_large_enough(dist: f32) -> bool {
    dist <= MP4_LARGE_ENOUGH_MAX_DIST
}

/// A projected-angle proxy: larger for big objects close to the camera.
pub fn proj_len(bbox_len: f32, recip_dist: f32) -> f32 {
    bbox_len * recip_dist
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserState {
    Unloaded,
    BrowserCreated,
    ErrorOccurred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialChannel {
    Colour,
    Emission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialSlot {
    pub object_uid: Uid,
    pub material_index: usize,
    pub channel: MaterialChannel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpuTextureSlot {
    A,
    B,
}

impl GpuTextureSlot {
    fn other(self) -> Self {
        match self {
            GpuTextureSlot::A => GpuTextureSlot::B,
            GpuTextureSlot::B => GpuTextureSlot::A,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimatedTextureState {
    pub browser_state: BrowserState,
    pub discarded_dirty_updates: bool,
    pub current_frame_index: usize,
    pub last_loaded_frame_index: usize,
    /// Ping-pongs between two GPU texture objects so the texture bound to
    /// materials is never mid-upload.
    pub active_slot: GpuTextureSlot,
}

impl Default for AnimatedTextureState {
    fn default() -> Self {
        Self {
            browser_state: BrowserState::Unloaded,
            discarded_dirty_updates: false,
            current_frame_index: 0,
            last_loaded_frame_index: usize::MAX,
            active_slot: GpuTextureSlot::A,
        }
    }
}

impl AnimatedTextureState {
    /// Swaps the active upload slot, returning the slot that should now
    /// receive the in-flight upload.
    pub fn begin_upload(&mut self) -> GpuTextureSlot {
        self.active_slot = self.active_slot.other();
        self.active_slot
    }

    /// True only when the frame actually changed since the last upload,
    /// avoiding redundant GPU uploads.
    pub fn needs_upload(&self) -> bool {
        self.current_frame_index != self.last_loaded_frame_index
    }

    pub fn mark_uploaded(&mut self) {
        self.last_loaded_frame_index = self.current_frame_index;
    }
}

/// Uniform-duration frame selection: `floor(t_in_loop / frame_duration)`.
pub fn frame_index_uniform(t_in_loop: f64, recip_frame_duration: f64, num_frames: usize) -> usize {
    if num_frames == 0 {
        return 0;
    }
    ((t_in_loop * recip_frame_duration).floor() as i64).rem_euclid(num_frames as i64) as usize
}

/// Variable-duration frame selection: try the current frame, then the next,
/// falling back to a binary search over cumulative `frame_end_times`.
pub fn frame_index_variable(t_in_loop: f64, frame_end_times: &[f64], current_guess: usize) -> usize {
    if frame_end_times.is_empty() {
        return 0;
    }
    let start_of = |i: usize| if i == 0 { 0.0 } else { frame_end_times[i - 1] };

    if current_guess < frame_end_times.len()
        && t_in_loop >= start_of(current_guess)
        && t_in_loop < frame_end_times[current_guess]
    {
        return current_guess;
    }
    let next = current_guess + 1;
    if next < frame_end_times.len() && t_in_loop >= frame_end_times[current_guess.min(frame_end_times.len() - 1)] && t_in_loop < frame_end_times[next] {
        return next;
    }
    match frame_end_times.binary_search_by(|end| end.partial_cmp(&t_in_loop).unwrap()) {
        Ok(i) => i,
        Err(i) => i.min(frame_end_times.len() - 1),
    }
}

/// Per-tick coordinator over every animated-texture material slot in the
/// world.
#[derive(Default, Resource)]
pub struct AnimatedTextureCoordinator {
    states: HashMap<MaterialSlot, AnimatedTextureState>,
}

impl AnimatedTextureCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_mut(&mut self, slot: MaterialSlot) -> &mut AnimatedTextureState {
        self.states.entry(slot).or_default()
    }

    pub fn remove_object(&mut self, object_uid: Uid) {
        self.states.retain(|slot, _| slot.object_uid != object_uid);
    }

    /// Applies visibility-driven transitions for one material slot. Returns
    /// `true` if the caller should advance/reupload the current frame this
    /// tick.
    pub fn tick_slot(&mut self, slot: MaterialSlot, in_frustum: bool, dist: f32, bbox_len: f32) -> bool {
        let recip_dist = if dist > 0.0 { 1.0 / dist } else { f32::MAX };
        let pl = proj_len(bbox_len, recip_dist);
        let big = large_enough(dist, pl);
        let mp4_big = mp4_large_enough(dist);
        let state = self.state_mut(slot);

        if in_frustum && big {
            if mp4_big {
                if state.browser_state == BrowserState::Unloaded {
                    state.browser_state = BrowserState::BrowserCreated;
                }
                if state.discarded_dirty_updates {
                    state.discarded_dirty_updates = false;
                }
            }
            true
        } else {
            if state.browser_state == BrowserState::BrowserCreated && !mp4_big {
                state.browser_state = BrowserState::Unloaded;
            }
            if state.browser_state == BrowserState::BrowserCreated {
                state.discarded_dirty_updates = true;
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_enough_requires_distance_and_projected_size() {
        assert!(large_enough(50.0, 0.02));
        assert!(!large_enough(250.0, 0.02));
        assert!(!large_enough(50.0, 0.001));
    }

    #[test]
    fn mp4_threshold_is_tighter_than_gif_threshold() {
        assert!(mp4_large_enough(15.0));
        assert!(!mp4_large_enough(50.0));
    }

    #[test]
    fn uniform_frame_index_wraps() {
        assert_eq!(frame_index_uniform(0.0, 10.0, 4), 0);
        assert_eq!(frame_index_uniform(0.25, 10.0, 4), 2);
        assert_eq!(frame_index_uniform(1.0, 10.0, 4), 2);
    }

    #[test]
    fn variable_frame_index_advances_sequentially() {
        let ends = [0.1, 0.3, 0.5, 1.0];
        assert_eq!(frame_index_variable(0.05, &ends, 0), 0);
        assert_eq!(frame_index_variable(0.2, &ends, 0), 1);
        assert_eq!(frame_index_variable(0.9, &ends, 2), 3);
    }

    #[test]
    fn needs_upload_only_when_frame_changed() {
        let mut state = AnimatedTextureState::default();
        assert!(state.needs_upload());
        state.mark_uploaded();
        assert!(!state.needs_upload());
        state.current_frame_index = 1;
        assert!(state.needs_upload());
    }

    #[test]
    fn upload_slot_ping_pongs() {
        let mut state = AnimatedTextureState::default();
        let first = state.begin_upload();
        let second = state.begin_upload();
        assert_ne!(first, second);
    }

    #[test]
    fn leaving_mp4_range_tears_down_browser_with_hysteresis() {
        let mut coord = AnimatedTextureCoordinator::new();
        let slot = MaterialSlot { object_uid: Uid(1), material_index: 0, channel: MaterialChannel::Colour };
        coord.tick_slot(slot, true, 10.0, 1.0);
        assert_eq!(coord.state_mut(slot).browser_state, BrowserState::BrowserCreated);

        coord.tick_slot(slot, true, 150.0, 1.0);
        assert_eq!(coord.state_mut(slot).browser_state, BrowserState::Unloaded);
    }
}
