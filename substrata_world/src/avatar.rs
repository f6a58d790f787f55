use glam::{DVec3, Vec3};
use substrata_protocol::Uid;

use crate::world_object::WorldMaterial;

#[derive(Debug, Clone)]
pub struct Avatar {
    pub uid: Uid,
    pub name: String,
    pub pos: DVec3,
    pub axis: Vec3,
    pub angle: f32,
    pub selected_gesture_id: Option<u32>,
    pub anim_state: u32,
    pub audio_source_url: Option<String>,
    pub materials: Vec<WorldMaterial>,
    pub dirty: bool,
}

impl Avatar {
    pub fn new(uid: Uid, name: impl Into<String>, pos: DVec3) -> Self {
        Self {
            uid,
            name: name.into(),
            pos,
            axis: Vec3::Z,
            angle: 0.0,
            selected_gesture_id: None,
            anim_state: 0,
            audio_source_url: None,
            materials: Vec::new(),
            dirty: false,
        }
    }
}
