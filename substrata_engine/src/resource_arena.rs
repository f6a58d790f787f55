//! Arena for decoded mesh/texture/audio payloads (§4.J/§9): the original's
//! reference-counted geometry/texture objects are represented here as
//! generational handles into a `SlotMap` rather than smart pointers, so a
//! `WorldObject` can hold a stable, `Copy`-free handle without borrowing
//! the decoded bytes directly.

use bevy_ecs::prelude::Resource;
use substrata_containers::prelude::{DefaultSlot, SlotMap};

pub struct DecodedMesh {
    pub lod_level: u8,
    pub vertex_data: Vec<u8>,
    pub index_data: Vec<u8>,
}

pub struct DecodedTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub type MeshHandle = DefaultSlot<DecodedMesh>;
pub type TextureHandle = DefaultSlot<DecodedTexture>;

/// Owns the decoded payloads produced by the CPU decode/build pool, handed
/// out as stable handles that survive a swap-remove elsewhere in the arena.
#[derive(Default, Resource)]
pub struct ResourceArena {
    meshes: SlotMap<DecodedMesh>,
    textures: SlotMap<DecodedTexture>,
}

impl ResourceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_mesh(&mut self, mesh: DecodedMesh) -> MeshHandle {
        self.meshes.insert(mesh)
    }

    pub fn mesh(&self, handle: &MeshHandle) -> Option<&DecodedMesh> {
        self.meshes.get(handle.clone())
    }

    pub fn remove_mesh(&mut self, handle: MeshHandle) -> Option<DecodedMesh> {
        self.meshes.remove(handle).ok()
    }

    pub fn insert_texture(&mut self, texture: DecodedTexture) -> TextureHandle {
        self.textures.insert(texture)
    }

    pub fn texture(&self, handle: &TextureHandle) -> Option<&DecodedTexture> {
        self.textures.get(handle.clone())
    }

    pub fn remove_texture(&mut self, handle: TextureHandle) -> Option<DecodedTexture> {
        self.textures.remove(handle).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_handle_round_trips() {
        let mut arena = ResourceArena::new();
        let handle = arena.insert_mesh(DecodedMesh {
            lod_level: 1,
            vertex_data: vec![1, 2, 3],
            index_data: vec![0, 1, 2],
        });
        assert_eq!(arena.mesh(&handle).unwrap().lod_level, 1);
        let removed = arena.remove_mesh(handle.clone());
        assert!(removed.is_some());
        assert!(arena.mesh(&handle).is_none());
    }

    #[test]
    fn stale_handle_after_removal_is_rejected() {
        let mut arena = ResourceArena::new();
        let handle = arena.insert_texture(DecodedTexture { width: 4, height: 4, pixels: vec![0; 64] });
        arena.remove_texture(handle.clone());
        let reinserted = arena.insert_texture(DecodedTexture { width: 2, height: 2, pixels: vec![0; 16] });
        assert_ne!(handle.clone(), reinserted);
        assert!(arena.texture(&handle).is_none());
    }
}
