//! `DescriptorTag`, the 16-byte header present on every UDF descriptor
//! except the volume recognition structures, and the seal/verify/relocate
//! machinery built around it.

use static_assertions::assert_eq_size;

use crate::crc::cksum;
use crate::error::{Result, UdfError};

/// UDF Descriptor Tag aka ISO 13346 3/7.2.
/// http://www.osta.org/specs/pdf/udf150.pdf#page=22
#[derive(Default, Debug, Clone, PartialEq)]
#[repr(C)]
pub struct DescriptorTag {
    pub tag_identifier: u16,
    pub descriptor_version: u16,
    /// Sum modulo 256 of bytes 0-3 and 5-15 of the tag.
    /// ECMA-167 7.2.3 Tag Checksum
    pub tag_checksum: u8,
    pub reserved: u8,
    /// Ignored; intended for disaster recovery.
    pub tag_serial_number: u16,
    pub descriptor_crc: u16,
    /// (Size of the Descriptor) - (Length of Descriptor Tag)
    pub descriptor_crc_length: u16,
    pub tag_location: u32,
}
assert_eq_size!(DescriptorTag, [u8; 16]);

impl DescriptorTag {
    pub const SIZE: usize = 16;

    pub fn read(bytes: &[u8]) -> Self {
        Self {
            tag_identifier: u16::from_le_bytes([bytes[0], bytes[1]]),
            descriptor_version: u16::from_le_bytes([bytes[2], bytes[3]]),
            tag_checksum: bytes[4],
            reserved: bytes[5],
            tag_serial_number: u16::from_le_bytes([bytes[6], bytes[7]]),
            descriptor_crc: u16::from_le_bytes([bytes[8], bytes[9]]),
            descriptor_crc_length: u16::from_le_bytes([bytes[10], bytes[11]]),
            tag_location: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0..2].copy_from_slice(&self.tag_identifier.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.descriptor_version.to_le_bytes());
        bytes[4] = self.tag_checksum;
        bytes[5] = self.reserved;
        bytes[6..8].copy_from_slice(&self.tag_serial_number.to_le_bytes());
        bytes[8..10].copy_from_slice(&self.descriptor_crc.to_le_bytes());
        bytes[10..12].copy_from_slice(&self.descriptor_crc_length.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.tag_location.to_le_bytes());
    }

    /// Update `tag_location` after relocation and recompute the header
    /// checksum (the CRC is over the body, and so is untouched).
    pub fn relocate(&mut self, new_tag_location: u32) {
        self.tag_location = new_tag_location;
        let mut buf = [0u8; Self::SIZE];
        self.write(&mut buf);
        self.tag_checksum = header_checksum(&buf);
    }
}

/// Sum of all 16 tag bytes except byte 4 (the checksum field itself),
/// modulo 256. ECMA-167 7.2.3.
pub fn header_checksum(tag_bytes: &[u8]) -> u8 {
    tag_bytes[0..4]
        .iter()
        .chain(&tag_bytes[5..16])
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Build a sealed tag for a freshly constructed descriptor: computes the
/// CRC over `body[0..crc_length]` and the header checksum over the
/// resulting tag bytes.
pub fn seal(
    tag_identifier: u16,
    descriptor_version: u16,
    tag_location: u32,
    body: &[u8],
    crc_length: usize,
) -> DescriptorTag {
    let mut tag = DescriptorTag {
        tag_identifier,
        descriptor_version,
        tag_checksum: 0,
        reserved: 0,
        tag_serial_number: 0,
        descriptor_crc: cksum(&body[..crc_length]),
        descriptor_crc_length: crc_length as u16,
        tag_location,
    };
    let mut buf = [0u8; DescriptorTag::SIZE];
    tag.write(&mut buf);
    tag.tag_checksum = header_checksum(&buf);
    tag
}

/// Verify a parsed tag against the raw tag bytes (for the checksum) and
/// the descriptor body (for the CRC). `InvalidFormat` on a mismatch,
/// `InternalError` if `body` is shorter than `tag.descriptor_crc_length`
/// declares — that is a caller contract violation, not a format error.
pub fn verify(tag: &DescriptorTag, tag_bytes: &[u8], body: &[u8]) -> Result<()> {
    let checksum = header_checksum(tag_bytes);
    if checksum != tag.tag_checksum {
        log::error!(
            "tag checksum mismatch: expected {:#x}, computed {:#x}",
            tag.tag_checksum,
            checksum
        );
        return Err(UdfError::InvalidFormat(
            "Tag checksum does not match".to_string(),
        ));
    }

    let crc_length = tag.descriptor_crc_length as usize;
    if body.len() < crc_length {
        return Err(UdfError::InternalError(format!(
            "CRC buffer ({} bytes) shorter than descriptor_crc_length ({})",
            body.len(),
            crc_length
        )));
    }
    if crc_length > 0 {
        let crc = cksum(&body[..crc_length]);
        if crc != tag.descriptor_crc {
            log::error!(
                "tag CRC mismatch: expected {:#x}, computed {:#x}",
                tag.descriptor_crc,
                crc
            );
            return Err(UdfError::InvalidFormat(
                "Tag CRC does not match".to_string(),
            ));
        }
    }
    Ok(())
}

/// Tracks a descriptor's extent location across relocation. The reported
/// location is the relocated one if set, else the one recorded at parse
/// time. See spec §3 "Ownership and lifecycle".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtentLocation {
    orig_extent_loc: u32,
    new_extent_loc: Option<u32>,
}

impl ExtentLocation {
    pub fn new(orig_extent_loc: u32) -> Self {
        Self {
            orig_extent_loc,
            new_extent_loc: None,
        }
    }

    /// Current extent: the relocated value if `set` was called, else the
    /// value recorded at parse/construction time.
    pub fn current(&self) -> u32 {
        self.new_extent_loc.unwrap_or(self.orig_extent_loc)
    }

    pub fn set(&mut self, location: u32) {
        self.new_extent_loc = Some(location);
    }

    /// The tag_location value for a descriptor that lives inside a
    /// partition-relative run (File Set Descriptor, File Entry, File
    /// Identifier Descriptor, and a partition-embedded Terminating
    /// Descriptor): the current extent minus the partition's start
    /// extent. See spec §4.10.
    pub fn relative_to(&self, start_extent: u32) -> u32 {
        self.current() - start_extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_then_verify_roundtrip() {
        let body = [1u8, 2, 3, 4, 5];
        let tag = seal(1, 2, 256, &body, body.len());
        let mut tag_bytes = [0u8; 16];
        tag.write(&mut tag_bytes);
        assert!(verify(&tag, &tag_bytes, &body).is_ok());
    }

    #[test]
    fn test_bad_checksum_is_invalid_format() {
        let body = [1u8, 2, 3, 4, 5];
        let tag = seal(1, 2, 256, &body, body.len());
        let mut tag_bytes = [0u8; 16];
        tag.write(&mut tag_bytes);
        tag_bytes[4] ^= 1;
        let bad_tag = DescriptorTag::read(&tag_bytes);
        let err = verify(&bad_tag, &tag_bytes, &body).unwrap_err();
        assert_eq!(
            err,
            UdfError::InvalidFormat("Tag checksum does not match".to_string())
        );
    }

    #[test]
    fn test_short_crc_buffer_is_internal_error() {
        let body = [1u8, 2, 3, 4, 5];
        let tag = seal(1, 2, 256, &body, body.len());
        let mut tag_bytes = [0u8; 16];
        tag.write(&mut tag_bytes);
        let err = verify(&tag, &tag_bytes, &body[..2]).unwrap_err();
        assert!(matches!(err, UdfError::InternalError(_)));
    }

    #[test]
    fn test_relocation_consistency() {
        let mut loc = ExtentLocation::new(100);
        assert_eq!(loc.current(), 100);
        loc.set(200);
        assert_eq!(loc.current(), 200);
        assert_eq!(loc.relative_to(50), 150);
    }
}
