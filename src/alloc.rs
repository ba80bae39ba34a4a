//! Allocation descriptors: the extent-reference types used throughout
//! the VDS and file-set/directory layers.

use static_assertions::assert_eq_size;

/// ECMA-167 7.1 Extent Descriptor aka `extent_ad`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ExtentAd {
    /// Length in bytes.
    pub length_bytes: u32,
    /// Location in logical sector number, or 0 if length is 0.
    pub location_sector: u32,
}
assert_eq_size!(ExtentAd, [u8; 8]);

impl ExtentAd {
    pub const SIZE: usize = 8;

    pub fn read(bytes: &[u8]) -> Self {
        Self {
            length_bytes: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            location_sector: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0..4].copy_from_slice(&self.length_bytes.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.location_sector.to_le_bytes());
    }
}

/// ECMA-167 7.1 Recorded address aka `lb_addr`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, packed)]
pub struct LbAddr {
    pub logical_block_number: u32,
    pub partition_reference_number: u16,
}
assert_eq_size!(LbAddr, [u8; 6]);

impl LbAddr {
    pub const SIZE: usize = 6;

    pub fn read(bytes: &[u8]) -> Self {
        Self {
            logical_block_number: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            partition_reference_number: u16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0..4].copy_from_slice(&self.logical_block_number.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.partition_reference_number.to_le_bytes());
    }
}

/// ECMA-167 4/14.14.1-2 extent type, the top 2 bits of an allocation
/// descriptor's length field.
/// https://ecma-international.org/wp-content/uploads/ECMA-167_3rd_edition_june_1997.pdf#page=116
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExtentType {
    /// Extent recorded and allocated.
    RecordedAllocated = 0,
    /// Extent not recorded but allocated.
    NotRecordedAllocated = 1,
    /// Extent not recorded and not allocated.
    NotRecordedNotAllocated = 2,
    /// The extent is the next extent of allocation descriptors (4/12).
    NextExtent = 3,
}

impl ExtentType {
    pub fn from_u8(v: u8) -> Self {
        match v & 0b11 {
            0 => ExtentType::RecordedAllocated,
            1 => ExtentType::NotRecordedAllocated,
            2 => ExtentType::NotRecordedNotAllocated,
            _ => ExtentType::NextExtent,
        }
    }
}

/// ECMA-167 4/14.6 `flags & 0b11`: which allocation descriptor shape an
/// ICB uses. UDF 2.01 constrains File Entries to `Short` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AllocationDescriptorType {
    Short = 0,
    Long = 1,
    Extended = 2,
    EmbeddedData = 3,
}

impl From<u8> for AllocationDescriptorType {
    fn from(v: u8) -> Self {
        match v & 0b11 {
            0 => AllocationDescriptorType::Short,
            1 => AllocationDescriptorType::Long,
            2 => AllocationDescriptorType::Extended,
            _ => AllocationDescriptorType::EmbeddedData,
        }
    }
}

/// ECMA-167 4/14.14.1 Short Allocation Descriptor aka `struct short_ad`.
/// `(length:u32, position:u32)`. UDF constrains File Entries to use only
/// this form. http://www.osta.org/specs/pdf/udf260.pdf#page=64
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ShortAllocationDescriptor {
    pub extent_length_and_type: u32,
    /// Logical block number, within the partition the descriptor is
    /// recorded on, of the extent.
    pub extent_location: u32,
}
assert_eq_size!(ShortAllocationDescriptor, [u8; 8]);

impl ShortAllocationDescriptor {
    pub const SIZE: usize = 8;

    pub fn extent_length_bytes(&self) -> u32 {
        self.extent_length_and_type & 0x3FFF_FFFF
    }

    pub fn extent_type(&self) -> ExtentType {
        ExtentType::from_u8((self.extent_length_and_type >> 30) as u8)
    }

    pub fn read(bytes: &[u8]) -> Self {
        Self {
            extent_length_and_type: u32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]),
            extent_location: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0..4].copy_from_slice(&self.extent_length_and_type.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.extent_location.to_le_bytes());
    }
}

/// 2.3.10.1 Long Allocation Descriptor aka ECMA-167 4/14.14.2 aka
/// `struct long_ad`. http://www.osta.org/specs/pdf/udf260.pdf#page=66
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct LongAd {
    /// Length in bytes, with the most significant 2 bits used as flags
    /// (see `ExtentType`).
    pub extent_length_and_type: u32,
    /// Logical block number of the extent. If the extent's length is 0,
    /// no extent is specified and this field is 0.
    pub extent_location: LbAddr,
    pub implementation_use: [u8; 6],
}
assert_eq_size!(LongAd, [u8; 16]);

impl LongAd {
    pub const SIZE: usize = 16;

    pub fn extent_length_bytes(&self) -> u32 {
        self.extent_length_and_type & 0x3FFF_FFFF
    }

    pub fn extent_type(&self) -> ExtentType {
        ExtentType::from_u8((self.extent_length_and_type >> 30) as u8)
    }

    pub fn read(bytes: &[u8]) -> Self {
        Self {
            extent_length_and_type: u32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]),
            extent_location: LbAddr::read(&bytes[4..10]),
            implementation_use: bytes[10..16].try_into().unwrap(),
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0..4].copy_from_slice(&self.extent_length_and_type.to_le_bytes());
        self.extent_location.write(&mut bytes[4..10]);
        bytes[10..16].copy_from_slice(&self.implementation_use);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_ad_roundtrip() {
        let ad = ShortAllocationDescriptor {
            extent_length_and_type: (1 << 30) | 2048,
            extent_location: 42,
        };
        let mut bytes = [0u8; ShortAllocationDescriptor::SIZE];
        ad.write(&mut bytes);
        let parsed = ShortAllocationDescriptor::read(&bytes);
        assert_eq!(ad, parsed);
        assert_eq!(parsed.extent_length_bytes(), 2048);
        assert_eq!(parsed.extent_type(), ExtentType::NotRecordedAllocated);
    }

    #[test]
    fn test_long_ad_roundtrip() {
        let ad = LongAd {
            extent_length_and_type: 4096,
            extent_location: LbAddr {
                logical_block_number: 17,
                partition_reference_number: 0,
            },
            implementation_use: [0; 6],
        };
        let mut bytes = [0u8; LongAd::SIZE];
        ad.write(&mut bytes);
        assert_eq!(LongAd::read(&bytes), ad);
    }
}
