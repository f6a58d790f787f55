use substrata_protocol::{ParcelId, Uid};

/// Messages the receiver cannot apply directly to `WorldState` (chat,
/// session events, errors) are delivered to the foreground via this queue
/// instead.
#[derive(Debug, Clone)]
pub enum ForegroundMessage {
    Chat { from_uid: Uid, from_name: String, text: String },
    Info(String),
    Error(String),
    ServerAdmin(String),

    LoggedIn { user_id: Uid, flags: u32, username: String },
    LoggedOut,
    SignedUp { user_id: Uid },
    ClientProtocolTooOld,

    ChangeToDifferentWorld { new_world_name: String },

    MapTilesResult { tile_urls: Vec<String> },

    ObjectPhysicsOwnershipTaken { object_uid: Uid, owner_client_id: Uid, take_time: f64 },
    ObjectPhysicsTransformUpdate { object_uid: Uid },

    AvatarPerformGesture { avatar_uid: Uid, gesture_name: String },
    AvatarStopGesture { avatar_uid: Uid },
    AvatarEnteredVehicle { avatar_uid: Uid },
    AvatarExitedVehicle { avatar_uid: Uid },

    ParcelList { parcel_ids: Vec<ParcelId> },

    ResourceDownloadedOnServer { url: String },

    KeepAlive,
}
