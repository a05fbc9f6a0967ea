//! Error types for the codec.

/// Errors that can occur while packing or unpacking values.
#[derive(Debug, thiserror::Error)]
pub enum PackStreamError {
    /// Wire-level grammar violation: truncated input, invalid UTF-8, or a
    /// value where the grammar requires another shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A marker byte outside the grammar was read.
    #[error("Unknown packed value with marker 0x{0:02X}")]
    UnknownMarker(u8),

    /// A string, list, map, or structure too large for the widest length
    /// tier on the pack path. The stream must be treated as poisoned.
    #[error("{kind} of size {size} are not supported")]
    TooLarge { kind: &'static str, size: usize },
}

impl PackStreamError {
    /// Wraps any displayable error as a protocol error.
    pub fn protocol(e: impl std::fmt::Display) -> Self {
        Self::Protocol(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_marker_names_the_byte_in_hex() {
        let e = PackStreamError::UnknownMarker(0xDB);
        assert_eq!(e.to_string(), "Unknown packed value with marker 0xDB");
    }

    #[test]
    fn too_large_message_shape() {
        let e = PackStreamError::TooLarge {
            kind: "UTF-8 strings",
            size: 5_000_000_000,
        };
        assert_eq!(
            e.to_string(),
            "UTF-8 strings of size 5000000000 are not supported"
        );
    }
}
