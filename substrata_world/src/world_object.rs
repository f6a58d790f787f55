use bitflags::bitflags;
use glam::{DVec3, Vec3};
use substrata_protocol::url_string::UrlString;
use substrata_protocol::wire::{Reader, Writer};
use substrata_protocol::{ProtocolError, Uid};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ObjectFlags: u32 {
        const COLLIDABLE                          = 1 << 0;
        const DYNAMIC                              = 1 << 1;
        const LIGHTMAP_NEEDS_COMPUTING              = 1 << 2;
        const HIGH_QUAL_LIGHTMAP_NEEDS_COMPUTING    = 1 << 3;
        const VIDEO_AUTOPLAY                        = 1 << 4;
        const VIDEO_LOOP                            = 1 << 5;
        const VIDEO_MUTED                           = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Generic = 0,
    VoxelGroup = 1,
    Spotlight = 2,
    Hypercard = 3,
    WebView = 4,
    Video = 5,
    Text = 6,
}

impl ObjectType {
    pub fn from_wire(v: u32) -> Option<Self> {
        Some(match v {
            0 => ObjectType::Generic,
            1 => ObjectType::VoxelGroup,
            2 => ObjectType::Spotlight,
            3 => ObjectType::Hypercard,
            4 => ObjectType::WebView,
            5 => ObjectType::Video,
            6 => ObjectType::Text,
            _ => return None,
        })
    }

    pub fn wire_value(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectState {
    JustCreated,
    Alive,
    Dead,
}

/// Every field the wire protocol always sends for a material, regardless of
/// the protocol-version history that introduced each one (flags at v27,
/// emission at v35) — this client speaks only the current format.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldMaterial {
    pub colour_rgb: Vec3,
    pub colour_texture_url: Option<UrlString>,
    pub emission_rgb: Vec3,
    pub emission_texture_url: Option<UrlString>,
    pub tex_matrix: [f32; 4],
    pub opacity: f32,
    pub flags: u32,
}

impl WorldMaterial {
    fn write(&self, w: &mut Writer) {
        w.write_vec3_f32(self.colour_rgb);
        match &self.colour_texture_url {
            Some(url) => {
                w.write_bool(true);
                w.write_string(url.as_str());
            }
            None => {
                w.write_bool(false);
            }
        }
        w.write_vec3_f32(self.emission_rgb);
        match &self.emission_texture_url {
            Some(url) => {
                w.write_bool(true);
                w.write_string(url.as_str());
            }
            None => {
                w.write_bool(false);
            }
        }
        for v in self.tex_matrix {
            w.write_f32(v);
        }
        w.write_f32(self.opacity);
        w.write_u32(self.flags);
    }

    fn read(r: &mut Reader) -> Result<Self, ProtocolError> {
        let colour_rgb = r.read_vec3_f32()?;
        let colour_texture_url = if r.read_bool()? {
            Some(UrlString::new(r.read_string()?))
        } else {
            None
        };
        let emission_rgb = r.read_vec3_f32()?;
        let emission_texture_url = if r.read_bool()? {
            Some(UrlString::new(r.read_string()?))
        } else {
            None
        };
        let mut tex_matrix = [0.0f32; 4];
        for slot in &mut tex_matrix {
            *slot = r.read_f32()?;
        }
        let opacity = r.read_f32()?;
        let flags = r.read_u32()?;
        Ok(Self {
            colour_rgb,
            colour_texture_url,
            emission_rgb,
            emission_texture_url,
            tex_matrix,
            opacity,
            flags,
        })
    }
}

/// Anything placeable in the world: a mesh, a voxel volume, a text card, a
/// spotlight, a webview, a video, a decal.
#[derive(Debug, Clone)]
pub struct WorldObject {
    pub uid: Uid,
    pub creator_id: Uid,
    pub created_time: f64,
    pub last_modified_time: f64,

    pub pos: DVec3,
    pub axis: Vec3,
    pub angle: f32,
    pub scale: Vec3,

    pub object_type: ObjectType,
    pub model_url: Option<UrlString>,
    pub lightmap_url: Option<UrlString>,
    pub audio_source_url: Option<UrlString>,
    pub compressed_voxel_payload: Vec<u8>,

    pub materials: Vec<WorldMaterial>,

    pub aabb_os_min: Vec3,
    pub aabb_os_max: Vec3,

    pub state: ObjectState,
    pub flags: ObjectFlags,

    /// Runtime-only: is the object currently inside the proximity loader's
    /// load radius.
    pub in_proximity: bool,
    /// Runtime-only: is the object currently inside the 20 m script
    /// proximity radius.
    pub in_script_proximity: bool,

    pub max_load_dist2: Option<f32>,
    pub max_model_lod_level: u8,

    /// Current physics owner, if the object is dynamic and some client has
    /// claimed simulation of it. `None` means unowned.
    pub physics_owner_id: Option<Uid>,
    pub physics_owner_take_time: f64,
    pub physics_owner_last_renewal_time: f64,

    /// Opaque handle for a future renderer crate; never populated here.
    pub proxy_handle: Option<u64>,
}

impl WorldObject {
    pub fn new(uid: Uid, creator_id: Uid, pos: DVec3, model_url: UrlString) -> Self {
        Self {
            uid,
            creator_id,
            created_time: 0.0,
            last_modified_time: 0.0,
            pos,
            axis: Vec3::Z,
            angle: 0.0,
            scale: Vec3::ONE,
            object_type: ObjectType::Generic,
            model_url: Some(model_url),
            lightmap_url: None,
            audio_source_url: None,
            compressed_voxel_payload: Vec::new(),
            materials: Vec::new(),
            aabb_os_min: Vec3::ZERO,
            aabb_os_max: Vec3::ZERO,
            state: ObjectState::JustCreated,
            flags: ObjectFlags::empty(),
            in_proximity: false,
            in_script_proximity: false,
            max_load_dist2: None,
            max_model_lod_level: 2,
            physics_owner_id: None,
            physics_owner_take_time: 0.0,
            physics_owner_last_renewal_time: 0.0,
            proxy_handle: None,
        }
    }

    /// World-space AABB, derived from the object-space AABB and current
    /// transform. Approximate: scales the object-space extents rather than
    /// transforming all eight corners, adequate for proximity checks.
    pub fn aabb_ws(&self) -> (DVec3, DVec3) {
        let min = self.aabb_os_min * self.scale;
        let max = self.aabb_os_max * self.scale;
        (self.pos + min.as_dvec3(), self.pos + max.as_dvec3())
    }

    pub fn centroid_ws(&self) -> DVec3 {
        let (min, max) = self.aabb_ws();
        (min + max) * 0.5
    }

    pub fn longest_aabb_edge(&self) -> f32 {
        let extent = self.aabb_os_max - self.aabb_os_min;
        extent.x.max(extent.y).max(extent.z).abs()
    }

    pub fn write_to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_u64(self.uid.0);
        w.write_u64(self.creator_id.0);
        w.write_f64(self.created_time);
        w.write_f64(self.last_modified_time);
        w.write_vec3_f64(self.pos);
        w.write_vec3_f32(self.axis);
        w.write_f32(self.angle);
        w.write_vec3_f32(self.scale);
        w.write_u32(self.object_type.wire_value());
        write_optional_url(&mut w, &self.model_url);
        write_optional_url(&mut w, &self.lightmap_url);
        write_optional_url(&mut w, &self.audio_source_url);
        w.write_u32(self.compressed_voxel_payload.len() as u32);
        w.write_bytes(&self.compressed_voxel_payload);
        w.write_u32(self.materials.len() as u32);
        for mat in &self.materials {
            mat.write(&mut w);
        }
        w.write_vec3_f32(self.aabb_os_min);
        w.write_vec3_f32(self.aabb_os_max);
        w.write_u32(self.flags.bits());
        w.write_u32(self.max_model_lod_level as u32);
        w.into_bytes()
    }

    pub fn read_from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = Reader::new(bytes);
        let uid = Uid(r.read_u64()?);
        let creator_id = Uid(r.read_u64()?);
        let created_time = r.read_f64()?;
        let last_modified_time = r.read_f64()?;
        let pos = r.read_vec3_f64()?;
        let axis = r.read_vec3_f32()?;
        let angle = r.read_f32()?;
        let scale = r.read_vec3_f32()?;
        let object_type = ObjectType::from_wire(r.read_u32()?)
            .ok_or(ProtocolError::UnexpectedMessageType(0))?;
        let model_url = read_optional_url(&mut r)?;
        let lightmap_url = read_optional_url(&mut r)?;
        let audio_source_url = read_optional_url(&mut r)?;
        let voxel_len = r.read_u32()? as usize;
        let compressed_voxel_payload = r.read_bytes(voxel_len)?.to_vec();
        let num_materials = r.read_u32()?;
        let mut materials = Vec::with_capacity(num_materials as usize);
        for _ in 0..num_materials {
            materials.push(WorldMaterial::read(&mut r)?);
        }
        let aabb_os_min = r.read_vec3_f32()?;
        let aabb_os_max = r.read_vec3_f32()?;
        let flags = ObjectFlags::from_bits_truncate(r.read_u32()?);
        let max_model_lod_level = r.read_u32()? as u8;

        Ok(Self {
            uid,
            creator_id,
            created_time,
            last_modified_time,
            pos,
            axis,
            angle,
            scale,
            object_type,
            model_url,
            lightmap_url,
            audio_source_url,
            compressed_voxel_payload,
            materials,
            aabb_os_min,
            aabb_os_max,
            state: ObjectState::Alive,
            flags,
            in_proximity: false,
            in_script_proximity: false,
            max_load_dist2: None,
            max_model_lod_level,
            physics_owner_id: None,
            physics_owner_take_time: 0.0,
            physics_owner_last_renewal_time: 0.0,
            proxy_handle: None,
        })
    }
}

fn write_optional_url(w: &mut Writer, url: &Option<UrlString>) {
    match url {
        Some(url) => {
            w.write_bool(true);
            w.write_string(url.as_str());
        }
        None => {
            w.write_bool(false);
        }
    }
}

fn read_optional_url(r: &mut Reader) -> Result<Option<UrlString>, ProtocolError> {
    Ok(if r.read_bool()? {
        Some(UrlString::new(r.read_string()?))
    } else {
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_object() -> WorldObject {
        let mut ob = WorldObject::new(
            Uid(42),
            Uid(7),
            DVec3::new(1.0, 2.0, 3.0),
            UrlString::new("box_123.bmesh"),
        );
        ob.created_time = 100.0;
        ob.last_modified_time = 150.0;
        ob.object_type = ObjectType::Video;
        ob.lightmap_url = Some(UrlString::new("lm_99.ktx2"));
        ob.compressed_voxel_payload = vec![1, 2, 3, 4];
        ob.materials.push(WorldMaterial {
            colour_rgb: Vec3::new(1.0, 0.5, 0.25),
            colour_texture_url: Some(UrlString::new("tex_55.basis")),
            emission_rgb: Vec3::ZERO,
            emission_texture_url: None,
            tex_matrix: [1.0, 0.0, 0.0, 1.0],
            opacity: 1.0,
            flags: ObjectFlags::COLLIDABLE.bits(),
        });
        ob.aabb_os_min = Vec3::new(-1.0, -1.0, -1.0);
        ob.aabb_os_max = Vec3::new(1.0, 1.0, 1.0);
        ob.flags = ObjectFlags::COLLIDABLE | ObjectFlags::DYNAMIC;
        ob.max_model_lod_level = 1;
        ob
    }

    // P6: round-tripping a WorldObject through write/read yields an object
    // equal to the original on all persisted fields.
    #[test]
    fn round_trip_hash_p6() {
        let original = sample_object();
        let bytes = original.write_to_bytes();
        let restored = WorldObject::read_from_bytes(&bytes).unwrap();

        assert_eq!(restored.uid, original.uid);
        assert_eq!(restored.creator_id, original.creator_id);
        assert_eq!(restored.created_time, original.created_time);
        assert_eq!(restored.pos, original.pos);
        assert_eq!(restored.axis, original.axis);
        assert_eq!(restored.angle, original.angle);
        assert_eq!(restored.scale, original.scale);
        assert_eq!(restored.object_type, original.object_type);
        assert_eq!(restored.model_url, original.model_url);
        assert_eq!(restored.lightmap_url, original.lightmap_url);
        assert_eq!(
            restored.compressed_voxel_payload,
            original.compressed_voxel_payload
        );
        assert_eq!(restored.materials, original.materials);
        assert_eq!(restored.aabb_os_min, original.aabb_os_min);
        assert_eq!(restored.aabb_os_max, original.aabb_os_max);
        assert_eq!(restored.flags, original.flags);
        assert_eq!(restored.max_model_lod_level, original.max_model_lod_level);
    }

    #[test]
    fn longest_edge_picks_largest_axis() {
        let mut ob = sample_object();
        ob.aabb_os_min = Vec3::new(-5.0, -1.0, -1.0);
        ob.aabb_os_max = Vec3::new(5.0, 1.0, 1.0);
        assert_eq!(ob.longest_aabb_edge(), 10.0);
    }
}
