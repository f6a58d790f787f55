//! Connection-type constants and the fixed handshake sequence exchanged
//! before a session switches to length-prefixed framing.

use crate::message_id;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnectionType {
    Updates,
    UploadResource,
    DownloadResources,
    ScreenshotBot,
    EthBot,
    UploadPhoto,
}

impl ConnectionType {
    pub fn wire_value(self) -> u32 {
        match self {
            ConnectionType::Updates => message_id::CONNECTION_TYPE_UPDATES,
            ConnectionType::UploadResource => message_id::CONNECTION_TYPE_UPLOAD_RESOURCE,
            ConnectionType::DownloadResources => message_id::CONNECTION_TYPE_DOWNLOAD_RESOURCES,
            ConnectionType::ScreenshotBot => message_id::CONNECTION_TYPE_SCREENSHOT_BOT,
            ConnectionType::EthBot => message_id::CONNECTION_TYPE_ETH_BOT,
            ConnectionType::UploadPhoto => message_id::CONNECTION_TYPE_UPLOAD_PHOTO,
        }
    }
}

/// Minimum server capabilities sent back at or after protocol version 41.
pub const MIN_SERVER_CAPS_VERSION: u32 = 41;
/// Minimum protocol version at which a mesh-optimisation version follows.
pub const MIN_MESH_OPT_VERSION: u32 = 43;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerHandshakeInfo {
    pub server_protocol_version: u32,
    pub server_capabilities: u32,
    pub server_mesh_optimisation_version: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_type_wire_values_match_protocol() {
        assert_eq!(ConnectionType::Updates.wire_value(), 500);
        assert_eq!(ConnectionType::UploadPhoto.wire_value(), 506);
    }
}
