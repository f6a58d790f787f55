pub mod avatar;
pub mod clock;
pub mod error;
pub mod lod_chunk;
pub mod parcel;
pub mod proximity;
pub mod world_object;
pub mod world_state;

pub use avatar::Avatar;
pub use error::WorldError;
pub use lod_chunk::LodChunk;
pub use parcel::Parcel;
pub use proximity::{ProximityCallbacks, ProximityLoader};
pub use substrata_protocol::{ParcelId, Uid};
pub use world_object::{ObjectFlags, ObjectState, ObjectType, WorldMaterial, WorldObject};
pub use world_state::WorldState;
