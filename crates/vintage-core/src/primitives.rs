//! # Engine Primitives
//!
//! Hardcoded runtime constants for the Vintage engine.
//!
//! These are compiled into the binary and are immutable at runtime.

/// Field that changes on every fetch and never takes part in change detection.
pub const VOLATILE_FIELD: &str = "versionDate";

/// Namespace used in drift labels when the configuration does not set one.
pub const DEFAULT_NAMESPACE: &str = "vintage";

/// Magic bytes for the Vintage snapshot file header.
///
/// - File Header = Magic Bytes ("VNTG") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"VNTG";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the record encoding.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of observations a single series may span.
///
/// Roughly three centuries of daily data. Longer ranges are rejected by the
/// series constructor, which also bounds the union range built while merging.
pub const MAX_OBSERVATIONS: usize = 100_000;

/// Maximum length for names, keys and codes.
pub const MAX_FIELD_LENGTH: usize = 256;

/// Maximum length for a single observation value.
pub const MAX_VALUE_LENGTH: usize = 64;

/// Maximum number of records accepted from one candidate file.
pub const MAX_BATCH_LENGTH: usize = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volatile_field_uses_wire_spelling() {
        assert_eq!(VOLATILE_FIELD, "versionDate");
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"VNTG");
    }
}
