//! Little-endian primitive codecs for the session wire format. Every
//! integer, float, and string on the wire is little-endian regardless of
//! host byte order; strings are length-prefixed UTF-8.

use crate::error::ProtocolError;
use glam::{DVec3, Vec3};

pub const MAX_STRING_LEN: usize = 10 * 1024;
pub const FRAME_HEADER_LEN: usize = 8;

pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::FrameTooShort {
                expected: n,
                got: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_i64(&mut self) -> Result<i64, ProtocolError> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_f32(&mut self) -> Result<f32, ProtocolError> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_f64(&mut self) -> Result<f64, ProtocolError> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_u32()? != 0)
    }

    pub fn read_string(&mut self) -> Result<String, ProtocolError> {
        let len = self.read_u32()? as usize;
        if len > MAX_STRING_LEN {
            return Err(ProtocolError::StringTooLong {
                max: MAX_STRING_LEN,
                got: len,
            });
        }
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
    }

    pub fn read_vec3_f32(&mut self) -> Result<Vec3, ProtocolError> {
        Ok(Vec3::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    pub fn read_vec3_f64(&mut self) -> Result<DVec3, ProtocolError> {
        Ok(DVec3::new(
            self.read_f64()?,
            self.read_f64()?,
            self.read_f64()?,
        ))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        self.take(n)
    }
}

#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_f32(&mut self, v: f32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_f64(&mut self, v: f64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_bool(&mut self, v: bool) -> &mut Self {
        self.write_u32(if v { 1 } else { 0 })
    }

    pub fn write_string(&mut self, s: &str) -> &mut Self {
        self.write_u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn write_vec3_f32(&mut self, v: Vec3) -> &mut Self {
        self.write_f32(v.x).write_f32(v.y).write_f32(v.z)
    }

    pub fn write_vec3_f64(&mut self, v: DVec3) -> &mut Self {
        self.write_f64(v.x).write_f64(v.y).write_f64(v.z)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Prepends the `[u32 type][u32 total_len]` header to `payload` and returns
/// the complete frame. `total_len` includes the 8-byte header itself.
pub fn frame(message_type: u32, payload: &[u8]) -> Vec<u8> {
    let total_len = FRAME_HEADER_LEN + payload.len();
    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&message_type.to_le_bytes());
    out.extend_from_slice(&(total_len as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Parses the 8-byte frame header from the front of `buf`, returning
/// `(message_type, total_len)`.
pub fn read_frame_header(buf: &[u8]) -> Result<(u32, u32), ProtocolError> {
    let mut reader = Reader::new(buf);
    let message_type = reader.read_u32()?;
    let total_len = reader.read_u32()?;
    Ok((message_type, total_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_primitives() {
        let mut w = Writer::new();
        w.write_u32(42)
            .write_i64(-7)
            .write_f32(1.5)
            .write_bool(true)
            .write_string("hello")
            .write_vec3_f64(DVec3::new(1.0, 2.0, 3.0));
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_u32().unwrap(), 42);
        assert_eq!(r.read_i64().unwrap(), -7);
        assert_eq!(r.read_f32().unwrap(), 1.5);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_string().unwrap(), "hello");
        assert_eq!(r.read_vec3_f64().unwrap(), DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn truncated_buffer_errors() {
        let mut r = Reader::new(&[1, 2, 3]);
        assert!(matches!(
            r.read_u64(),
            Err(ProtocolError::FrameTooShort { .. })
        ));
    }

    #[test]
    fn oversized_string_rejected() {
        let mut w = Writer::new();
        w.write_u32((MAX_STRING_LEN + 1) as u32);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert!(matches!(
            r.read_string(),
            Err(ProtocolError::StringTooLong { .. })
        ));
    }

    #[test]
    fn frame_header_round_trips() {
        let payload = vec![1u8, 2, 3, 4];
        let bytes = frame(3000, &payload);
        let (ty, total_len) = read_frame_header(&bytes).unwrap();
        assert_eq!(ty, 3000);
        assert_eq!(total_len as usize, FRAME_HEADER_LEN + payload.len());
    }
}
