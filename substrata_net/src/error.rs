use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error(transparent)]
    Protocol(#[from] substrata_protocol::ProtocolError),

    #[error("network io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("server rejected client protocol version as too old")]
    ClientProtocolTooOld,

    #[error("server rejected client protocol version as too new")]
    ClientProtocolTooNew,

    #[error("login failed: {0}")]
    LogInFailure(String),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("opus codec error: {0}")]
    Opus(#[from] opus::Error),

    #[error("voice packet too short: {0} bytes")]
    VoicePacketTooShort(usize),

    #[error("voice packet from unexpected source {0}")]
    VoicePacketWrongSource(std::net::SocketAddr),
}
