use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("frame too short: expected at least {expected} bytes, got {got}")]
    FrameTooShort { expected: usize, got: usize },

    #[error("string field exceeds max length of {max} bytes ({got} bytes)")]
    StringTooLong { max: usize, got: usize },

    #[error("string field is not valid utf8")]
    InvalidUtf8,

    #[error("handshake hello mismatch: expected {expected:#x}, got {got:#x}")]
    HandshakeMismatch { expected: u32, got: u32 },

    #[error("server rejected client protocol version as too old")]
    ClientProtocolTooOld,

    #[error("server rejected client protocol version as too new")]
    ClientProtocolTooNew,

    #[error("unknown message type {0}")]
    UnknownMessageType(u32),

    #[error("unexpected message type {0} in this context")]
    UnexpectedMessageType(u32),
}
