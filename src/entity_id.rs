use std::borrow::Cow;
use std::ffi::CStr;
use std::fmt::Debug;

use static_assertions::assert_eq_size;

use crate::error::{Result, UdfError};

/// 2.1.5 Entity Identifier aka ISO 13346 1/7.4.
/// http://www.osta.org/specs/pdf/udf150.pdf#page=17
#[derive(Clone, PartialEq, Eq)]
#[repr(C)]
pub struct EntityID {
    /// UDF 1.50: "Shall be set to ZERO."
    pub flags: u8,
    pub identifier: [u8; 23],
    /// Parsed by UDF as a Domain IdentifierSuffix.
    pub identifier_suffix: [u8; 8],
}
assert_eq_size!(EntityID, [u8; 32]);

impl Default for EntityID {
    fn default() -> Self {
        Self {
            flags: 0,
            identifier: [0; 23],
            identifier_suffix: [0; 8],
        }
    }
}

impl Debug for EntityID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityID")
            .field("flags", &self.flags)
            .field(
                "identifier",
                &CStr::from_bytes_until_nul(&self.identifier)
                    .map(|s| s.to_string_lossy())
                    .unwrap_or(Cow::Borrowed("")),
            )
            .field("identifier_suffix", &self.identifier_suffix)
            .finish()
    }
}

impl EntityID {
    pub const SIZE: usize = 32;

    /// Construct an EntityID from an ASCII identifier and suffix.
    /// `InvalidInput` if either is too long for its fixed field.
    pub fn new(identifier: &[u8], identifier_suffix: &[u8]) -> Result<Self> {
        if identifier.len() > 23 {
            return Err(UdfError::InvalidInput(format!(
                "EntityID identifier {} bytes exceeds 23-byte field",
                identifier.len()
            )));
        }
        if identifier_suffix.len() > 8 {
            return Err(UdfError::InvalidInput(format!(
                "EntityID identifier_suffix {} bytes exceeds 8-byte field",
                identifier_suffix.len()
            )));
        }
        let mut id = [0u8; 23];
        id[..identifier.len()].copy_from_slice(identifier);
        let mut suffix = [0u8; 8];
        suffix[..identifier_suffix.len()].copy_from_slice(identifier_suffix);
        Ok(Self {
            flags: 0,
            identifier: id,
            identifier_suffix: suffix,
        })
    }

    pub fn read(bytes: &[u8]) -> Self {
        let mut identifier = [0u8; 23];
        identifier.copy_from_slice(&bytes[1..24]);
        let mut identifier_suffix = [0u8; 8];
        identifier_suffix.copy_from_slice(&bytes[24..32]);
        Self {
            flags: bytes[0],
            identifier,
            identifier_suffix,
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0] = self.flags;
        bytes[1..24].copy_from_slice(&self.identifier);
        bytes[24..32].copy_from_slice(&self.identifier_suffix);
    }

    /// True if `identifier` begins with the given ASCII prefix, used to
    /// validate the various fixed domain/implementation identifiers the
    /// VDS records require (e.g. `*OSTA UDF Compliant`, `+NSR02`).
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.identifier.len() >= prefix.len() && &self.identifier[..prefix.len()] == prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let id = EntityID::new(b"*OSTA UDF Compliant", b"\x02\x01\x00\0\0\0\0\0").unwrap();
        let mut bytes = [0u8; EntityID::SIZE];
        id.write(&mut bytes);
        let parsed = EntityID::read(&bytes);
        assert_eq!(id, parsed);
        assert!(parsed.starts_with(b"*OSTA UDF Compliant"));
    }

    #[test]
    fn test_identifier_too_long_is_invalid_input() {
        let err = EntityID::new(&[b'x'; 24], b"").unwrap_err();
        assert!(matches!(err, UdfError::InvalidInput(_)));
    }

    #[test]
    fn test_suffix_too_long_is_invalid_input() {
        let err = EntityID::new(b"", &[0u8; 9]).unwrap_err();
        assert!(matches!(err, UdfError::InvalidInput(_)));
    }
}
