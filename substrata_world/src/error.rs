use thiserror::Error;

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("object {0} not found in world state")]
    ObjectNotFound(crate::Uid),
    #[error("avatar {0} not found in world state")]
    AvatarNotFound(crate::Uid),
    #[error("parcel {0} not found in world state")]
    ParcelNotFound(crate::ParcelId),
}
