//! OSTA Compressed Unicode ("dstring") framing. Declared out of scope for
//! charset *conversion*, but the compression-ID framing itself is the
//! wire format and has to round-trip exactly.

use std::fmt::Debug;

/// Helpers for OSTA Compressed Unicode aka dstring.
/// See UncompressUnicode / CompressUnicode http://www.osta.org/specs/pdf/udf260.pdf#page=116
pub mod osta {
    /// Decode a dstring: leading compression-ID byte (8 or 16), then
    /// characters, terminated by a NUL (1 or 2 bytes wide to match).
    pub fn decode(bytes: &[u8]) -> String {
        if bytes.is_empty() {
            return String::new();
        }

        let mut result = String::new();
        let compression_id = bytes[0];
        let mut i = 1;

        match compression_id {
            8 => {
                while i < bytes.len() {
                    if bytes[i] == 0 {
                        break;
                    }
                    result.push(bytes[i] as char);
                    i += 1;
                }
            }
            16 => {
                while i + 1 < bytes.len() {
                    let unicode = ((bytes[i] as u16) << 8) | (bytes[i + 1] as u16);
                    if unicode == 0 {
                        break;
                    }
                    if let Some(c) = char::from_u32(unicode as u32) {
                        result.push(c);
                    }
                    i += 2;
                }
            }
            _ => {
                log::error!(
                    "could not decode dstring: unknown compression ID {}",
                    compression_id
                );
            }
        }

        result
    }

    /// Encode a string as a dstring, choosing 8-bit compression unless a
    /// character needs more than 8 bits.
    pub fn encode(s: &str) -> Vec<u8> {
        let mut result = Vec::new();
        let needs_16bit = s.chars().any(|c| c as u32 > 0xFF);
        let compression_id = if needs_16bit { 16 } else { 8 };
        result.push(compression_id);

        if needs_16bit {
            for c in s.chars() {
                let unicode = c as u16;
                result.push((unicode >> 8) as u8);
                result.push((unicode & 0xFF) as u8);
            }
            result.push(0);
            result.push(0);
        } else {
            for c in s.chars() {
                result.push(c as u8);
            }
            result.push(0);
        }

        result
    }
}

/// A fixed-width `N`-byte field holding a dstring, NUL-padded.
#[derive(Clone, PartialEq, Eq)]
pub struct Dstring<const N: usize>(pub [u8; N]);

impl<const N: usize> Dstring<N> {
    pub fn from_str(s: &str) -> Self {
        let encoded = osta::encode(s);
        let mut bytes = [0u8; N];
        let len = encoded.len().min(N);
        bytes[..len].copy_from_slice(&encoded[..len]);
        Self(bytes)
    }

    pub fn to_string(&self) -> String {
        osta::decode(&self.0)
    }
}

impl<const N: usize> Default for Dstring<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> Debug for Dstring<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_string())
    }
}

/// A variable-width dstring, used by File Identifier Descriptors whose
/// `file_identifier` field length is declared inline.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct DynamicDstring(pub Vec<u8>);

impl DynamicDstring {
    pub fn from_str(s: &str) -> Self {
        Self(osta::encode(s))
    }

    pub fn to_string(&self) -> String {
        osta::decode(&self.0)
    }
}

impl Debug for DynamicDstring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osta_ascii_roundtrip() {
        let input = "VIDEO_TS";
        let encoded = osta::encode(input);
        assert_eq!(encoded[0], 8);
        assert_eq!(osta::decode(&encoded), input);
    }

    #[test]
    fn test_osta_unicode_roundtrip() {
        let input = "Hello, 世界!";
        let encoded = osta::encode(input);
        assert_eq!(encoded[0], 16);
        assert_eq!(osta::decode(&encoded), input);
    }

    #[test]
    fn test_osta_empty() {
        assert_eq!(osta::decode(&osta::encode("")), "");
    }

    #[test]
    fn test_dstring_truncates_to_field_width() {
        let d = Dstring::<4>::from_str("ab");
        assert_eq!(d.to_string(), "ab");
    }
}
