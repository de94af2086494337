//! # Snapshot Format
//!
//! Binary serialization of a `MemoryStore` for the file backend.
//! File I/O happens in the storage backend; this module is pure.
//!
//! Format: Header (5 bytes) + postcard-serialized store.
//! - 4 bytes: Magic ("VNTG")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded, and the
//! decoded store is checked for index consistency before it is handed out.

use crate::{MemoryStore, VintageError, primitives};

/// Maximum allowed snapshot size (500 MB).
pub const MAX_SNAPSHOT_SIZE: usize = 500 * 1024 * 1024;

/// Header length in bytes.
const HEADER_LEN: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes all store data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a new header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), VintageError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(VintageError::Deserialization(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(VintageError::Deserialization(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VintageError> {
        if bytes.len() < HEADER_LEN {
            return Err(VintageError::Deserialization(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a store to bytes (header + payload).
pub fn store_to_bytes(store: &MemoryStore) -> Result<Vec<u8>, VintageError> {
    let payload =
        postcard::to_stdvec(store).map_err(|e| VintageError::Serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&SnapshotHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a store from bytes.
pub fn store_from_bytes(bytes: &[u8]) -> Result<MemoryStore, VintageError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(VintageError::Deserialization(format!(
            "Snapshot size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let store: MemoryStore = postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        VintageError::Deserialization(format!("Failed to decode snapshot: {}", e))
    })?;
    store.check_integrity()?;
    Ok(store)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RecordStore, TypedStore};
    use crate::{Category, Collection, Dataset};

    #[test]
    fn header_roundtrip() {
        let header = SnapshotHeader::new();
        let restored = SnapshotHeader::from_bytes(&header.to_bytes()).expect("parse header");
        assert_eq!(restored, header);
    }

    #[test]
    fn snapshot_is_bit_exact() {
        let mut store = MemoryStore::new();
        store
            .insert_record(&Dataset::new("MEI").expect("valid"))
            .expect("insert");
        store
            .insert_record(&Category::new("ECO", "Economy").expect("valid"))
            .expect("insert");

        let bytes1 = store_to_bytes(&store).expect("first serialize");
        let restored = store_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = store_to_bytes(&restored).expect("second serialize");

        assert_eq!(bytes1, bytes2, "save -> load -> save must produce identical bytes");
        assert_eq!(restored, store);
        assert_eq!(restored.count(Collection::Categories).expect("count"), 1);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(store_from_bytes(&bytes).is_err());
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = store_to_bytes(&MemoryStore::new()).expect("serialize");
        bytes[4] = primitives::FORMAT_VERSION + 1;
        assert!(matches!(
            store_from_bytes(&bytes),
            Err(VintageError::Deserialization(_))
        ));
    }

    #[test]
    fn truncated_payload_rejected() {
        let mut store = MemoryStore::new();
        store
            .insert_record(&Dataset::new("MEI").expect("valid"))
            .expect("insert");
        let bytes = store_to_bytes(&store).expect("serialize");
        assert!(store_from_bytes(&bytes[..bytes.len() - 3]).is_err());
    }
}
