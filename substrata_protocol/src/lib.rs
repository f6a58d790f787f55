pub mod error;
pub mod handshake;
pub mod message_id;
pub mod uid;
pub mod url_string;
pub mod wire;

pub use error::ProtocolError;
pub use uid::{ParcelId, Uid};
pub use url_string::UrlString;
