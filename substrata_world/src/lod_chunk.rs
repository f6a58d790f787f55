use glam::IVec3;
use substrata_protocol::url_string::UrlString;

#[derive(Debug, Clone)]
pub struct LodChunk {
    pub coord: IVec3,
    pub combined_mesh_url: Option<UrlString>,
    pub combined_array_texture_url: Option<UrlString>,
    pub compressed_material_info: Vec<u8>,
    pub needs_rebuild: bool,
}

impl LodChunk {
    pub fn new(coord: IVec3) -> Self {
        Self {
            coord,
            combined_mesh_url: None,
            combined_array_texture_url: None,
            compressed_material_info: Vec::new(),
            needs_rebuild: true,
        }
    }
}
