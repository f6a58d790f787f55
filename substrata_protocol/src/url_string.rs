use std::fmt;

/// A content-addressed resource identifier of the form `<name>_<hash>.<ext>`.
///
/// `hash` is the decimal-encoded 64-bit hash of the file's bytes. Map-tile
/// and other externally-hosted URLs legitimately carry no embedded hash;
/// [`UrlString::embedded_hash`] returns `None` for those rather than an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UrlString(String);

impl UrlString {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `<hash>` component of `<name>_<hash>.<ext>`, if the URL follows
    /// that naming convention.
    pub fn embedded_hash(&self) -> Option<u64> {
        let stem = self.0.rsplit_once('/').map(|(_, s)| s).unwrap_or(&self.0);
        let stem = stem.rsplit_once('.').map(|(s, _)| s).unwrap_or(stem);
        let (_, hash_part) = stem.rsplit_once('_')?;
        hash_part.parse().ok()
    }

    pub fn extension(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(_, ext)| ext)
    }

    /// The optimised-mesh derivation of a model URL: replace the extension
    /// with `_opt<N>.bmesh`.
    pub fn optimised_mesh_url(&self, lod_level: u32) -> UrlString {
        let stem = self.0.rsplit_once('.').map(|(s, _)| s).unwrap_or(&self.0);
        UrlString(format!("{stem}_opt{lod_level}.bmesh"))
    }

    /// 64-bit content hash used to verify a downloaded blob against its
    /// embedded hash (FNV-1a).
    pub fn hash_bytes(bytes: &[u8]) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
        const PRIME: u64 = 0x100000001b3;
        let mut hash = OFFSET_BASIS;
        for &byte in bytes {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(PRIME);
        }
        hash
    }

    /// True iff this URL's embedded hash matches the hash of `bytes`, or the
    /// URL carries no embedded hash at all (non-content-addressed URLs are
    /// trusted as-is).
    pub fn matches_bytes(&self, bytes: &[u8]) -> bool {
        match self.embedded_hash() {
            Some(expected) => expected == Self::hash_bytes(bytes),
            None => true,
        }
    }
}

impl fmt::Display for UrlString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UrlString {
    fn from(value: String) -> Self {
        UrlString(value)
    }
}

impl From<&str> for UrlString {
    fn from(value: &str) -> Self {
        UrlString(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embedded_hash() {
        let url = UrlString::new("box_12345.bmesh");
        assert_eq!(url.embedded_hash(), Some(12345));
        assert_eq!(url.extension(), Some("bmesh"));
    }

    #[test]
    fn map_tile_url_has_no_embedded_hash() {
        let url = UrlString::new("http://tiles.example.com/0/0.png");
        assert_eq!(url.embedded_hash(), None);
    }

    #[test]
    fn optimised_mesh_derivation() {
        let url = UrlString::new("box_12345.bmesh");
        assert_eq!(url.optimised_mesh_url(1).as_str(), "box_12345_opt1.bmesh");
    }

    // P2: for every URL present locally, hash(file_bytes) == url.embedded_hash.
    #[test]
    fn hash_consistency_p2() {
        let bytes = b"some mesh file contents";
        let hash = UrlString::hash_bytes(bytes);
        let url = UrlString::new(format!("mesh_{hash}.bmesh"));
        assert!(url.matches_bytes(bytes));

        let tampered = UrlString::new(format!("mesh_{}.bmesh", hash.wrapping_add(1)));
        assert!(!tampered.matches_bytes(bytes));
    }
}
