use glam::DVec3;
use substrata_protocol::{ParcelId, Uid};

#[derive(Debug, Clone)]
pub struct Parcel {
    pub id: ParcelId,
    pub aabb_min: DVec3,
    pub aabb_max: DVec3,
    pub flags: u32,
    pub writer_ids: Vec<Uid>,
    pub spawn_point: Option<DVec3>,
    pub title: String,
}

impl Parcel {
    pub fn contains(&self, pos: DVec3) -> bool {
        pos.x >= self.aabb_min.x
            && pos.x <= self.aabb_max.x
            && pos.y >= self.aabb_min.y
            && pos.y <= self.aabb_max.y
            && pos.z >= self.aabb_min.z
            && pos.z <= self.aabb_max.z
    }
}
