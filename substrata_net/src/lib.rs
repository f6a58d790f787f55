pub mod error;
pub mod message;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod voice;

pub use error::NetError;
pub use message::ForegroundMessage;
pub use sender::SenderHandle;
pub use session::SessionTransport;
