use static_assertions::assert_eq_size;

use crate::error::{Result, UdfError};

/// ECMA-167 10.7.2 Type 1 Partition Map. The only partition map shape
/// this codec models — the Logical Volume Descriptor's own invariants
/// (§4.8: `map_table_length=6`, `num_partition_maps=1`) make Type 2/Other
/// maps unreachable under the supported read-only single-partition
/// profile.
/// https://ecma-international.org/wp-content/uploads/ECMA-167_3rd_edition_june_1997.pdf#page=60
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct PartitionMap {
    pub partition_map_type: u8,
    pub partition_map_length: u8,
    /// Volume upon which the partition is recorded; 1 for a
    /// single-volume DVD. UDF 2.6.0 2.2.8.
    pub volume_sequence_number: u16,
    pub partition_number: u16,
}
assert_eq_size!(PartitionMap, [u8; 6]);

impl PartitionMap {
    pub const SIZE: usize = 6;
    pub const TYPE: u8 = 1;
    pub const LENGTH: u8 = 6;

    pub fn new(volume_sequence_number: u16, partition_number: u16) -> Self {
        Self {
            partition_map_type: Self::TYPE,
            partition_map_length: Self::LENGTH,
            volume_sequence_number,
            partition_number,
        }
    }

    pub fn read(bytes: &[u8]) -> Result<Self> {
        let partition_map_type = bytes[0];
        let partition_map_length = bytes[1];
        if partition_map_type != Self::TYPE {
            return Err(UdfError::InvalidFormat(format!(
                "unsupported partition map type {}",
                partition_map_type
            )));
        }
        if partition_map_length != Self::LENGTH {
            return Err(UdfError::InvalidFormat(format!(
                "type 1 partition map length {} is not 6",
                partition_map_length
            )));
        }
        Ok(Self {
            partition_map_type,
            partition_map_length,
            volume_sequence_number: u16::from_le_bytes([bytes[2], bytes[3]]),
            partition_number: u16::from_le_bytes([bytes[4], bytes[5]]),
        })
    }

    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0] = self.partition_map_type;
        bytes[1] = self.partition_map_length;
        bytes[2..4].copy_from_slice(&self.volume_sequence_number.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.partition_number.to_le_bytes());
    }
}

/// Embedded in a Partition Volume Descriptor's `partition_contents_use`
/// for the read-only profile. All length/position fields are required to
/// be zero here (no sparing tables, no metadata/VAT partitions — see
/// spec §1 Non-goals). Supplemented from
/// `original_source/pycdlib/udf.py`'s `UDFPartitionHeaderDescriptor`
/// (SPEC_FULL §11.3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct PartitionHeaderDescriptor {
    pub unallocated_space_table: ShortAd,
    pub unallocated_space_bitmap: ShortAd,
    pub partition_integrity_table: ShortAd,
    pub freed_space_table: ShortAd,
    pub freed_space_bitmap: ShortAd,
    pub reserved: [u8; 88],
}
assert_eq_size!(PartitionHeaderDescriptor, [u8; 128]);

/// `(length, position)` pair as embedded in a Partition Header
/// Descriptor — distinct from `ShortAllocationDescriptor` in that it has
/// no extent-type flag bits (ECMA-167 4/14.3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct ShortAd {
    pub length: u32,
    pub position: u32,
}

impl ShortAd {
    pub const SIZE: usize = 8;

    fn read(bytes: &[u8]) -> Self {
        Self {
            length: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            position: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    fn write(&self, bytes: &mut [u8]) {
        bytes[0..4].copy_from_slice(&self.length.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.position.to_le_bytes());
    }

    fn is_zero(&self) -> bool {
        self.length == 0 && self.position == 0
    }
}

impl PartitionHeaderDescriptor {
    pub const SIZE: usize = 128;

    pub fn read(bytes: &[u8]) -> Self {
        Self {
            unallocated_space_table: ShortAd::read(&bytes[0..8]),
            unallocated_space_bitmap: ShortAd::read(&bytes[8..16]),
            partition_integrity_table: ShortAd::read(&bytes[16..24]),
            freed_space_table: ShortAd::read(&bytes[24..32]),
            freed_space_bitmap: ShortAd::read(&bytes[32..40]),
            reserved: bytes[40..128].try_into().unwrap(),
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        self.unallocated_space_table.write(&mut bytes[0..8]);
        self.unallocated_space_bitmap.write(&mut bytes[8..16]);
        self.partition_integrity_table.write(&mut bytes[16..24]);
        self.freed_space_table.write(&mut bytes[24..32]);
        self.freed_space_bitmap.write(&mut bytes[32..40]);
        bytes[40..128].copy_from_slice(&self.reserved);
    }

    /// All length/position fields must be zero for the supported
    /// read-only, non-sparing, non-metadata-partition profile.
    pub fn validate(&self) -> Result<()> {
        let all_zero = self.unallocated_space_table.is_zero()
            && self.unallocated_space_bitmap.is_zero()
            && self.partition_integrity_table.is_zero()
            && self.freed_space_table.is_zero()
            && self.freed_space_bitmap.is_zero();
        if !all_zero {
            return Err(UdfError::InvalidFormat(
                "PartitionHeaderDescriptor has non-zero space table/bitmap fields".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_map_roundtrip() {
        let map = PartitionMap::new(1, 0);
        let mut bytes = [0u8; PartitionMap::SIZE];
        map.write(&mut bytes);
        assert_eq!(PartitionMap::read(&bytes).unwrap(), map);
    }

    #[test]
    fn test_partition_map_rejects_wrong_type() {
        let mut bytes = [0u8; PartitionMap::SIZE];
        bytes[0] = 2;
        bytes[1] = 64;
        assert!(PartitionMap::read(&bytes).is_err());
    }

    #[test]
    fn test_partition_header_zero_validates() {
        let header = PartitionHeaderDescriptor::default();
        assert!(header.validate().is_ok());
        let mut bytes = [0u8; PartitionHeaderDescriptor::SIZE];
        header.write(&mut bytes);
        assert_eq!(PartitionHeaderDescriptor::read(&bytes), header);
    }

    #[test]
    fn test_partition_header_nonzero_rejected() {
        let mut header = PartitionHeaderDescriptor::default();
        header.unallocated_space_table.length = 1;
        assert!(header.validate().is_err());
    }
}
