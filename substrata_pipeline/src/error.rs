use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Net(#[from] substrata_net::NetError),

    #[error(transparent)]
    Protocol(#[from] substrata_protocol::ProtocolError),

    #[error("io error writing resource file: {0}")]
    Io(#[from] std::io::Error),

    #[error("server reported resource {0} not found")]
    ResourceNotFound(String),

    #[error("downloaded bytes for {url} do not match the embedded hash")]
    HashMismatch { url: String },

    #[error("decode error for {url}: {reason}")]
    Decode { url: String, reason: String },
}
