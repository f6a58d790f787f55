pub mod animated_texture;
pub mod load_coordinator;
pub mod physics_arbiter;
pub mod resource_arena;
pub mod resources;
pub mod server;
pub mod systems;

pub use animated_texture::{AnimatedTextureCoordinator, AnimatedTextureState, BrowserState};
pub use load_coordinator::LoadCoordinator;
pub use physics_arbiter::PhysicsOwnershipArbiter;
pub use resource_arena::{DecodedMesh, DecodedTexture, MeshHandle, ResourceArena, TextureHandle};
pub use resources::{CameraPosition, DownloadQueueResource, LoadItemQueueResource, TokioHandleResource, WorldStateResource};
pub use server::{EngineClient, EngineServer};
