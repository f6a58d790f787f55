use std::sync::Arc;

use rustls_pki_types::ServerName;
use substrata_protocol::handshake::{ConnectionType, ServerHandshakeInfo, MIN_MESH_OPT_VERSION, MIN_SERVER_CAPS_VERSION};
use substrata_protocol::wire::{Writer, FRAME_HEADER_LEN};
use substrata_protocol::{message_id, ProtocolError};
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, TlsConnector};

use crate::error::NetError;

/// A single TLS session to `<host>:<port>`, framed per the wire protocol
/// after the initial handshake completes.
pub struct SessionTransport {
    stream: TlsStream<TcpStream>,
}

impl SessionTransport {
    pub async fn connect(
        host: &str,
        port: u16,
        connection_type: ConnectionType,
    ) -> Result<(Self, ServerHandshakeInfo), NetError> {
        let tcp = TcpStream::connect((host, port)).await?;
        tcp.set_nodelay(true)?;

        let config = rustls::ClientConfig::with_platform_verifier();
        let connector = TlsConnector::from(Arc::new(config));
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| NetError::Protocol(ProtocolError::InvalidUtf8))?;
        let stream = connector.connect(server_name, tcp).await?;

        let mut session = Self { stream };
        let info = session.perform_handshake(connection_type).await?;
        Ok((session, info))
    }

    async fn perform_handshake(
        &mut self,
        connection_type: ConnectionType,
    ) -> Result<ServerHandshakeInfo, NetError> {
        let mut w = Writer::new();
        w.write_u32(message_id::CYBERSPACE_HELLO);
        w.write_u32(message_id::CYBERSPACE_PROTOCOL_VERSION);
        w.write_u32(connection_type.wire_value());
        self.stream.write_all(&w.into_bytes()).await?;
        self.stream.flush().await?;

        let echoed_hello = self.read_u32_raw().await?;
        if echoed_hello != message_id::CYBERSPACE_HELLO {
            return Err(NetError::Protocol(ProtocolError::HandshakeMismatch {
                expected: message_id::CYBERSPACE_HELLO,
                got: echoed_hello,
            }));
        }

        let response = self.read_u32_raw().await?;
        match response {
            v if v == message_id::CLIENT_PROTOCOL_OK => {}
            v if v == message_id::CLIENT_PROTOCOL_TOO_OLD => {
                return Err(NetError::ClientProtocolTooOld)
            }
            v if v == message_id::CLIENT_PROTOCOL_TOO_NEW => {
                return Err(NetError::ClientProtocolTooNew)
            }
            other => return Err(NetError::Protocol(ProtocolError::UnexpectedMessageType(other))),
        }

        let server_protocol_version = self.read_u32_raw().await?;
        let server_capabilities = if server_protocol_version >= MIN_SERVER_CAPS_VERSION {
            self.read_u32_raw().await?
        } else {
            0
        };
        let server_mesh_optimisation_version = if server_protocol_version >= MIN_MESH_OPT_VERSION {
            self.read_i32_raw().await?
        } else {
            0
        };

        Ok(ServerHandshakeInfo {
            server_protocol_version,
            server_capabilities,
            server_mesh_optimisation_version,
        })
    }

    async fn read_u32_raw(&mut self) -> Result<u32, NetError> {
        let mut buf = [0u8; 4];
        self.stream.read_exact(&mut buf).await?;
        Ok(u32::from_le_bytes(buf))
    }

    async fn read_i32_raw(&mut self) -> Result<i32, NetError> {
        let mut buf = [0u8; 4];
        self.stream.read_exact(&mut buf).await?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Reads a bare little-endian `u32` not wrapped in frame headers, used
    /// by the download/upload workers' per-file result codes (§4.G/§4.H).
    pub async fn read_u32_unframed(&mut self) -> Result<u32, NetError> {
        self.read_u32_raw().await
    }

    pub async fn read_u64_unframed(&mut self) -> Result<u64, NetError> {
        let mut buf = [0u8; 8];
        self.stream.read_exact(&mut buf).await?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Reads exactly `buf.len()` raw bytes, used to stream file contents
    /// that aren't wrapped in the `[type][len]` message framing.
    pub async fn read_exact_unframed(&mut self, buf: &mut [u8]) -> Result<(), NetError> {
        self.stream.read_exact(buf).await?;
        Ok(())
    }

    /// Reads one complete `[type][len][payload]` frame, returning the type
    /// and the payload bytes (excluding the 8-byte header).
    pub async fn read_frame(&mut self) -> Result<(u32, Vec<u8>), NetError> {
        read_frame_from(&mut self.stream).await
    }

    pub async fn write_frame(&mut self, message_type: u32, payload: &[u8]) -> Result<(), NetError> {
        let frame = substrata_protocol::wire::frame(message_type, payload);
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    pub async fn write_raw(&mut self, bytes: &[u8]) -> Result<(), NetError> {
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    /// Splits the session into independent read/write halves so the sender
    /// and receiver tasks can each own one without contending for a lock.
    pub fn split(self) -> (ReadHalf<TlsStream<TcpStream>>, WriteHalf<TlsStream<TcpStream>>) {
        tokio::io::split(self.stream)
    }
}

/// Reads one complete `[type][len][payload]` frame from any async reader.
pub async fn read_frame_from(
    reader: &mut (impl tokio::io::AsyncRead + Unpin),
) -> Result<(u32, Vec<u8>), NetError> {
    let mut header = [0u8; FRAME_HEADER_LEN];
    reader.read_exact(&mut header).await?;
    let (message_type, total_len) = substrata_protocol::wire::read_frame_header(&header)?;
    let payload_len = (total_len as usize).saturating_sub(FRAME_HEADER_LEN);
    let mut payload = vec![0u8; payload_len];
    reader.read_exact(&mut payload).await?;
    Ok((message_type, payload))
}
