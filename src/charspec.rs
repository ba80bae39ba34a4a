use std::borrow::Cow;
use std::ffi::CStr;
use std::fmt::Debug;

use static_assertions::assert_eq_size;

/// UDF 1.5.0 2.1.2 OSTA CS0 Charspec.
#[derive(Clone, PartialEq)]
#[repr(C)]
pub struct CharSpec {
    /// Shall always be 0 in UDF.
    pub character_set_type: u8,
    /// Shall always be "OSTA Compressed Unicode" in UDF, NUL-padded.
    pub character_set_info: [u8; 63],
}
assert_eq_size!(CharSpec, [u8; 64]);

const OSTA_COMPRESSED_UNICODE: &[u8] = b"OSTA Compressed Unicode";

impl CharSpec {
    pub const SIZE: usize = 64;

    /// The single charspec value this codec ever emits: OSTA CS0.
    pub fn osta_cs0() -> Self {
        let mut character_set_info = [0u8; 63];
        character_set_info[..OSTA_COMPRESSED_UNICODE.len()]
            .copy_from_slice(OSTA_COMPRESSED_UNICODE);
        Self {
            character_set_type: 0,
            character_set_info,
        }
    }

    pub fn read(bytes: &[u8]) -> Self {
        let mut character_set_info = [0u8; 63];
        character_set_info.copy_from_slice(&bytes[1..64]);
        Self {
            character_set_type: bytes[0],
            character_set_info,
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0] = self.character_set_type;
        bytes[1..64].copy_from_slice(&self.character_set_info);
    }

    pub fn is_osta_compressed_unicode(&self) -> bool {
        self.character_set_type == 0
            && &self.character_set_info[..OSTA_COMPRESSED_UNICODE.len()] == OSTA_COMPRESSED_UNICODE
    }
}

impl Default for CharSpec {
    fn default() -> Self {
        Self {
            character_set_type: 0,
            character_set_info: [0; 63],
        }
    }
}

impl Debug for CharSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_osta_compressed_unicode() {
            f.write_str("OSTA Compressed Unicode")
        } else {
            f.debug_struct("CharSpec")
                .field("character_set_type", &self.character_set_type)
                .field(
                    "character_set_info",
                    &CStr::from_bytes_until_nul(&self.character_set_info)
                        .map(|s| s.to_string_lossy())
                        .unwrap_or(Cow::Borrowed("")),
                )
                .finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osta_cs0_roundtrip() {
        let cs = CharSpec::osta_cs0();
        let mut bytes = [0u8; CharSpec::SIZE];
        cs.write(&mut bytes);
        let parsed = CharSpec::read(&bytes);
        assert!(parsed.is_osta_compressed_unicode());
    }
}
