//! Message type identifiers, transcribed from the server's wire protocol
//! definition (protocol version 45).

pub const CYBERSPACE_HELLO: u32 = 1357924680;
pub const CYBERSPACE_PROTOCOL_VERSION: u32 = 45;

pub const CLIENT_PROTOCOL_OK: u32 = 10000;
pub const CLIENT_PROTOCOL_TOO_OLD: u32 = 10001;
pub const CLIENT_PROTOCOL_TOO_NEW: u32 = 10002;
pub const CYBERSPACE_GOODBYE: u32 = 10010;
pub const CLIENT_UDP_SOCKET_OPEN: u32 = 10003;

pub const AUDIO_STREAM_TO_SERVER_STARTED: u32 = 10020;
pub const AUDIO_STREAM_TO_SERVER_ENDED: u32 = 10021;

pub const CONNECTION_TYPE_UPDATES: u32 = 500;
pub const CONNECTION_TYPE_UPLOAD_RESOURCE: u32 = 501;
pub const CONNECTION_TYPE_DOWNLOAD_RESOURCES: u32 = 502;
pub const CONNECTION_TYPE_SCREENSHOT_BOT: u32 = 504;
pub const CONNECTION_TYPE_ETH_BOT: u32 = 505;
pub const CONNECTION_TYPE_UPLOAD_PHOTO: u32 = 506;

pub const CHANGE_TO_DIFFERENT_WORLD: u32 = 600;

pub const AVATAR_CREATED: u32 = 1000;
pub const AVATAR_DESTROYED: u32 = 1001;
pub const AVATAR_TRANSFORM_UPDATE: u32 = 1002;
pub const AVATAR_FULL_UPDATE: u32 = 1003;
pub const CREATE_AVATAR: u32 = 1004;
pub const AVATAR_IS_HERE: u32 = 1005;
pub const AVATAR_PERFORM_GESTURE: u32 = 1010;
pub const AVATAR_STOP_GESTURE: u32 = 1011;

pub const AVATAR_ENTERED_VEHICLE: u32 = 1100;
pub const AVATAR_EXITED_VEHICLE: u32 = 1101;

pub const CHAT_MESSAGE: u32 = 2000;

pub const OBJECT_CREATED: u32 = 3000;
pub const OBJECT_DESTROYED: u32 = 3001;
pub const OBJECT_TRANSFORM_UPDATE: u32 = 3002;
pub const OBJECT_FULL_UPDATE: u32 = 3003;
pub const OBJECT_LIGHTMAP_URL_CHANGED: u32 = 3010;
pub const OBJECT_FLAGS_CHANGED: u32 = 3011;
pub const OBJECT_MODEL_URL_CHANGED: u32 = 3012;
pub const OBJECT_PHYSICS_OWNERSHIP_TAKEN: u32 = 3013;
pub const OBJECT_PHYSICS_TRANSFORM_UPDATE: u32 = 3016;
pub const OBJECT_CONTENT_CHANGED: u32 = 3017;
pub const SUMMON_OBJECT: u32 = 3030;

pub const CREATE_OBJECT: u32 = 3004;
pub const DESTROY_OBJECT: u32 = 3005;

pub const QUERY_OBJECTS: u32 = 3020;
pub const OBJECT_INITIAL_SEND: u32 = 3021;
pub const QUERY_OBJECTS_IN_AABB: u32 = 3022;
pub const OBJECT_INITIAL_SEND_COMPRESSED: u32 = 3023;

pub const PARCEL_CREATED: u32 = 3100;
pub const PARCEL_DESTROYED: u32 = 3101;
pub const PARCEL_FULL_UPDATE: u32 = 3103;
pub const PARCEL_INITIAL_SEND_COMPRESSED: u32 = 3104;

pub const QUERY_PARCELS: u32 = 3150;
pub const PARCEL_LIST: u32 = 3160;

pub const GET_ALL_OBJECTS: u32 = 3600;
pub const ALL_OBJECTS_SENT: u32 = 3601;

pub const WORLD_SETTINGS_INITIAL_SEND: u32 = 3700;
pub const WORLD_SETTINGS_UPDATE: u32 = 3701;

pub const WORLD_DETAILS_INITIAL_SEND: u32 = 3750;

pub const QUERY_MAP_TILES: u32 = 3800;
pub const MAP_TILES_RESULT: u32 = 3801;

pub const QUERY_LOD_CHUNKS: u32 = 3900;
pub const LOD_CHUNK_INITIAL_SEND: u32 = 3901;
pub const LOD_CHUNK_UPDATED: u32 = 3902;

pub const GET_FILE: u32 = 4000;
pub const GET_FILES: u32 = 4001;

pub const NEW_RESOURCE_ON_SERVER: u32 = 4100;

pub const UPLOAD_ALLOWED: u32 = 5100;
pub const LOG_IN_FAILURE: u32 = 5101;
pub const INVALID_FILE_SIZE: u32 = 5102;
pub const NO_WRITE_PERMISSIONS: u32 = 5103;
pub const SERVER_IS_IN_READ_ONLY_MODE: u32 = 5104;
pub const INVALID_FILE_TYPE: u32 = 5105;

pub const USER_SELECTED_OBJECT: u32 = 6000;
pub const USER_DESELECTED_OBJECT: u32 = 6001;

pub const USER_USED_OBJECT: u32 = 6500;
pub const USER_TOUCHED_OBJECT: u32 = 6501;
pub const USER_MOVED_NEAR_TO_OBJECT: u32 = 6510;
pub const USER_MOVED_AWAY_FROM_OBJECT: u32 = 6511;
pub const USER_ENTERED_PARCEL: u32 = 6512;
pub const USER_EXITED_PARCEL: u32 = 6513;

pub const INFO_MESSAGE: u32 = 7001;
pub const ERROR_MESSAGE: u32 = 7002;
pub const SERVER_ADMIN_MESSAGE: u32 = 7010;

pub const LOG_IN_MESSAGE: u32 = 8000;
pub const LOG_OUT_MESSAGE: u32 = 8001;
pub const SIGN_UP_MESSAGE: u32 = 8002;
pub const LOGGED_IN_MESSAGE: u32 = 8003;
pub const LOGGED_OUT_MESSAGE: u32 = 8004;
pub const SIGNED_UP_MESSAGE: u32 = 8005;

pub const TIME_SYNC_MESSAGE: u32 = 9000;

pub const SCREEN_SHOT_REQUEST: u32 = 11001;
pub const SCREEN_SHOT_SUCCEEDED: u32 = 11002;
pub const TILE_SCREEN_SHOT_REQUEST: u32 = 11003;

pub const KEEP_ALIVE: u32 = 13000;

pub const PHOTO_UPLOAD_SUCCEEDED: u32 = 14000;
pub const PHOTO_UPLOAD_FAILED: u32 = 14001;

/// Client capability bit: can the client handle `ObjectInitialSendCompressed`.
pub const STREAMING_COMPRESSED_OBJECT_SUPPORT: u32 = 0x1;

/// Server capability bits.
pub const OBJECT_TEXTURE_BASISU_SUPPORT: u32 = 0x1;
pub const TERRAIN_DETAIL_MAPS_BASISU_SUPPORT: u32 = 0x2;
pub const OPTIMISED_MESH_SUPPORT: u32 = 0x4;

pub const OPTIMISED_MESH_VERSION: i32 = 3;
