//! Logical Volume Integrity Descriptor (tag 9). ECMA-167 3/10.10.
//!
//! Unlike every other descriptor in this codec, the CRC window here is
//! fixed at 118 bytes regardless of the 496-byte body length: only the
//! fixed prefix is protected, the 424-byte implementation-use area is
//! not (spec §4.11).

use static_assertions::assert_eq_size;

use crate::alloc::ExtentAd;
use crate::entity_id::EntityID;
use crate::error::{Result, UdfError};
use crate::tag::{self, DescriptorTag, ExtentLocation};
use crate::timestamp::Timestamp;

pub const TAG_IDENTIFIER: u16 = 9;
const BODY_LEN: usize = 496;
const CRC_LENGTH: usize = 118;
const IMPL_USE_LEN: usize = 424;
const REQUIRED_INTEGRITY_TYPE: u32 = 1;
const REQUIRED_NUM_PARTITIONS: u32 = 1;

/// `logical_volume_contents_use` for an LVID: a 64-bit unique ID plus
/// reserved padding. ECMA-167 3/10.10.3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct LogicalVolumeHeaderDescriptor {
    pub unique_id: u64,
    reserved: [u8; 24],
}
assert_eq_size!(LogicalVolumeHeaderDescriptor, [u8; 32]);

impl LogicalVolumeHeaderDescriptor {
    pub const SIZE: usize = 32;

    pub fn new(unique_id: u64) -> Self {
        Self {
            unique_id,
            reserved: [0; 24],
        }
    }

    fn read(bytes: &[u8]) -> Self {
        Self {
            unique_id: u64::from_le_bytes(bytes[0..8].try_into().unwrap()),
            reserved: bytes[8..32].try_into().unwrap(),
        }
    }

    fn write(&self, bytes: &mut [u8]) {
        bytes[0..8].copy_from_slice(&self.unique_id.to_le_bytes());
        bytes[8..32].copy_from_slice(&self.reserved);
    }
}

/// Embedded LV Implementation Use record occupying the start of the
/// 424-byte implementation-use area (supplemented from
/// `original_source/pycdlib/udf.py`'s `UDFLogicalVolumeImplementationUse`,
/// SPEC_FULL §11.2).
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalVolumeImplementationUse {
    pub implementation_identifier: EntityID,
    pub num_files: u32,
    pub num_dirs: u32,
    pub min_udf_read_revision: u16,
    pub min_udf_write_revision: u16,
    pub max_udf_write_revision: u16,
    remainder: [u8; IMPL_USE_LEN - EntityID::SIZE - 4 - 4 - 2 - 2 - 2],
}

impl LogicalVolumeImplementationUse {
    pub fn new(implementation_identifier: EntityID, num_files: u32, num_dirs: u32) -> Self {
        Self {
            implementation_identifier,
            num_files,
            num_dirs,
            min_udf_read_revision: 0x0201,
            min_udf_write_revision: 0x0201,
            max_udf_write_revision: 0x0201,
            remainder: [0; IMPL_USE_LEN - EntityID::SIZE - 4 - 4 - 2 - 2 - 2],
        }
    }

    fn read(bytes: &[u8]) -> Self {
        Self {
            implementation_identifier: EntityID::read(&bytes[0..32]),
            num_files: u32::from_le_bytes(bytes[32..36].try_into().unwrap()),
            num_dirs: u32::from_le_bytes(bytes[36..40].try_into().unwrap()),
            min_udf_read_revision: u16::from_le_bytes(bytes[40..42].try_into().unwrap()),
            min_udf_write_revision: u16::from_le_bytes(bytes[42..44].try_into().unwrap()),
            max_udf_write_revision: u16::from_le_bytes(bytes[44..46].try_into().unwrap()),
            remainder: bytes[46..IMPL_USE_LEN].try_into().unwrap(),
        }
    }

    fn write(&self, bytes: &mut [u8]) {
        self.implementation_identifier.write(&mut bytes[0..32]);
        bytes[32..36].copy_from_slice(&self.num_files.to_le_bytes());
        bytes[36..40].copy_from_slice(&self.num_dirs.to_le_bytes());
        bytes[40..42].copy_from_slice(&self.min_udf_read_revision.to_le_bytes());
        bytes[42..44].copy_from_slice(&self.min_udf_write_revision.to_le_bytes());
        bytes[44..46].copy_from_slice(&self.max_udf_write_revision.to_le_bytes());
        bytes[46..IMPL_USE_LEN].copy_from_slice(&self.remainder);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalVolumeIntegrityDescriptor {
    pub tag: DescriptorTag,
    pub recording_date_and_time: Timestamp,
    pub logical_volume_contents_use: LogicalVolumeHeaderDescriptor,
    pub free_space_table: u32,
    pub size_table: u32,
    pub implementation_use: LogicalVolumeImplementationUse,
    location: ExtentLocation,
}

impl LogicalVolumeIntegrityDescriptor {
    pub fn new(
        extent: u32,
        recording_date_and_time: Timestamp,
        logical_volume_contents_use: LogicalVolumeHeaderDescriptor,
        size_table: u32,
        implementation_use: LogicalVolumeImplementationUse,
    ) -> Self {
        let mut lvid = Self {
            tag: DescriptorTag::default(),
            recording_date_and_time,
            logical_volume_contents_use,
            free_space_table: 0,
            size_table,
            implementation_use,
            location: ExtentLocation::new(extent),
        };
        lvid.reseal();
        lvid
    }

    fn body(&self) -> Vec<u8> {
        let mut b = vec![0u8; BODY_LEN];
        self.recording_date_and_time.write(&mut b[0..12]);
        b[12..16].copy_from_slice(&REQUIRED_INTEGRITY_TYPE.to_le_bytes());
        ExtentAd::default().write(&mut b[16..24]);
        self.logical_volume_contents_use.write(&mut b[24..56]);
        b[56..60].copy_from_slice(&REQUIRED_NUM_PARTITIONS.to_le_bytes());
        b[60..64].copy_from_slice(&(IMPL_USE_LEN as u32).to_le_bytes());
        b[64..68].copy_from_slice(&self.free_space_table.to_le_bytes());
        b[68..72].copy_from_slice(&self.size_table.to_le_bytes());
        self.implementation_use.write(&mut b[72..72 + IMPL_USE_LEN]);
        b
    }

    fn reseal(&mut self) {
        let body = self.body();
        self.tag = tag::seal(TAG_IDENTIFIER, 2, self.location.current(), &body, CRC_LENGTH);
    }

    pub fn parse(bytes: &[u8], extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + BODY_LEN {
            return Err(UdfError::InvalidFormat(
                "logical volume integrity descriptor buffer too small".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected logical volume integrity descriptor tag {}, got {}",
                TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }
        let body = &bytes[16..16 + BODY_LEN];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;

        let integrity_type = u32::from_le_bytes([body[12], body[13], body[14], body[15]]);
        if integrity_type != REQUIRED_INTEGRITY_TYPE {
            return Err(UdfError::InvalidFormat(format!(
                "logical volume integrity descriptor type {} is not 1",
                integrity_type
            )));
        }
        let next_integrity_extent = ExtentAd::read(&body[16..24]);
        if next_integrity_extent.length_bytes != 0 || next_integrity_extent.location_sector != 0 {
            return Err(UdfError::InvalidFormat(
                "logical volume integrity descriptor next_integrity_extent is not zero"
                    .to_string(),
            ));
        }
        let num_partitions = u32::from_le_bytes([body[56], body[57], body[58], body[59]]);
        if num_partitions != REQUIRED_NUM_PARTITIONS {
            return Err(UdfError::InvalidFormat(format!(
                "logical volume integrity descriptor num_partitions {} is not 1",
                num_partitions
            )));
        }
        let length_impl_use = u32::from_le_bytes([body[60], body[61], body[62], body[63]]) as usize;
        if length_impl_use > IMPL_USE_LEN {
            return Err(UdfError::InvalidFormat(format!(
                "logical volume integrity descriptor length_impl_use {} exceeds {}",
                length_impl_use, IMPL_USE_LEN
            )));
        }
        let free_space_table = u32::from_le_bytes([body[64], body[65], body[66], body[67]]);
        if free_space_table != 0 {
            return Err(UdfError::InvalidFormat(
                "logical volume integrity descriptor free_space_table is not 0".to_string(),
            ));
        }

        Ok(Self {
            tag: parsed_tag,
            recording_date_and_time: Timestamp::read(&body[0..12]),
            logical_volume_contents_use: LogicalVolumeHeaderDescriptor::read(&body[24..56]),
            free_space_table,
            size_table: u32::from_le_bytes([body[68], body[69], body[70], body[71]]),
            implementation_use: LogicalVolumeImplementationUse::read(&body[72..72 + IMPL_USE_LEN]),
            location: ExtentLocation::new(extent),
        })
    }

    pub fn record(&self) -> Vec<u8> {
        let mut out = vec![0u8; DescriptorTag::SIZE + BODY_LEN];
        self.tag.write(&mut out[0..16]);
        out[16..].copy_from_slice(&self.body());
        out
    }

    pub fn extent_location(&self) -> u32 {
        self.location.current()
    }

    pub fn set_location(&mut self, location: u32) {
        self.location.set(location);
        self.tag.relocate(self.location.current());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LogicalVolumeIntegrityDescriptor {
        LogicalVolumeIntegrityDescriptor::new(
            513,
            Timestamp::default(),
            LogicalVolumeHeaderDescriptor::new(1),
            5_000,
            LogicalVolumeImplementationUse::new(
                EntityID::new(b"*my impl", b"").unwrap(),
                12,
                3,
            ),
        )
    }

    #[test]
    fn test_roundtrip() {
        let lvid = sample();
        let bytes = lvid.record();
        assert_eq!(bytes.len(), 512);
        assert_eq!(lvid.tag.descriptor_crc_length, CRC_LENGTH as u16);
        let parsed = LogicalVolumeIntegrityDescriptor::parse(&bytes, 513).unwrap();
        assert_eq!(parsed.logical_volume_contents_use.unique_id, 1);
        assert_eq!(parsed.size_table, 5_000);
        assert_eq!(parsed.implementation_use.num_files, 12);
        assert_eq!(parsed.implementation_use.num_dirs, 3);
    }

    #[test]
    fn test_impl_use_corruption_does_not_affect_crc() {
        let lvid = sample();
        let mut bytes = lvid.record();
        // Corrupt a byte well inside the 424-byte implementation-use
        // area, past the 118-byte CRC window; this must still verify.
        let idx = 16 + 72 + 50;
        bytes[idx] ^= 0xFF;
        assert!(LogicalVolumeIntegrityDescriptor::parse(&bytes, 513).is_ok());
    }

    #[test]
    fn test_nonzero_next_integrity_extent_rejected() {
        let mut lvid = sample();
        let mut body = lvid.body();
        let bad_extent = ExtentAd {
            length_bytes: 1,
            location_sector: 0,
        };
        bad_extent.write(&mut body[16..24]);
        lvid.tag = tag::seal(TAG_IDENTIFIER, 2, lvid.location.current(), &body, CRC_LENGTH);
        let mut bytes = vec![0u8; DescriptorTag::SIZE + BODY_LEN];
        lvid.tag.write(&mut bytes[0..16]);
        bytes[16..].copy_from_slice(&body);
        assert!(LogicalVolumeIntegrityDescriptor::parse(&bytes, 513).is_err());
    }
}
