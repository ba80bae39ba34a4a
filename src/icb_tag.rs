use static_assertions::assert_eq_size;

use crate::alloc::{AllocationDescriptorType, LbAddr};
use crate::error::{Result, UdfError};

/// ECMA-167 4/14.6 ICB Tag. UDF 2.3.5 http://www.osta.org/specs/pdf/udf260.pdf#page=60
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ICBTag {
    pub prior_recorded_number_of_direct_entries: u32,
    pub strategy_type: u16,
    pub strategy_parameter: [u8; 2],
    pub maximum_number_of_entries: u16,
    pub reserved: u8,
    pub file_type: u8,
    pub parent_icb_location: LbAddr,
    pub flags: u16,
}
assert_eq_size!(ICBTag, [u8; 20]);

impl ICBTag {
    pub const SIZE: usize = 20;

    pub fn read(bytes: &[u8]) -> Self {
        Self {
            prior_recorded_number_of_direct_entries: u32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]),
            strategy_type: u16::from_le_bytes([bytes[4], bytes[5]]),
            strategy_parameter: [bytes[6], bytes[7]],
            maximum_number_of_entries: u16::from_le_bytes([bytes[8], bytes[9]]),
            reserved: bytes[10],
            file_type: bytes[11],
            parent_icb_location: LbAddr::read(&bytes[12..18]),
            flags: u16::from_le_bytes([bytes[18], bytes[19]]),
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0..4]
            .copy_from_slice(&self.prior_recorded_number_of_direct_entries.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.strategy_type.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.strategy_parameter);
        bytes[8..10].copy_from_slice(&self.maximum_number_of_entries.to_le_bytes());
        bytes[10] = self.reserved;
        bytes[11] = self.file_type;
        self.parent_icb_location.write(&mut bytes[12..18]);
        bytes[18..20].copy_from_slice(&self.flags.to_le_bytes());
    }

    pub fn allocation_descriptor_type(&self) -> AllocationDescriptorType {
        AllocationDescriptorType::from(self.flags as u8 & 0b11)
    }

    pub fn file_type(&self) -> FileType {
        FileType::from(self.file_type)
    }

    /// `strategy_type` must be 4 (simple) or 4096 (virtual/complex);
    /// `reserved` must be 0. See spec §3's ICBTag invariants.
    pub fn validate(&self) -> Result<()> {
        if self.strategy_type != 4 && self.strategy_type != 4096 {
            return Err(UdfError::InvalidFormat(format!(
                "ICBTag strategy_type {} is not 4 or 4096",
                self.strategy_type
            )));
        }
        if self.reserved != 0 {
            return Err(UdfError::InvalidFormat(
                "ICBTag reserved byte is non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// ECMA-167 4/14.6 file type values.
/// https://ecma-international.org/wp-content/uploads/ECMA-167_3rd_edition_june_1997.pdf#page=96
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Not specified by this field.
    Unspecified,
    /// Unallocated Space Entry (4/14.11).
    Unallocated,
    /// Partition Integrity Entry (4/14.13).
    PartitionIntegrity,
    /// Indirect Entry (4/14.7).
    Indirect,
    Directory,
    /// A sequence of randomly-accessible bytes.
    SequenceOfBytes,
    BlockSpecialDevice,
    CharacterSpecialDevice,
    /// Recording Extended Attributes (4/9.1).
    ExtendedAttributes,
    Fifo,
    Socket,
    /// Terminal Entry (4/14.8).
    TerminalEntry,
    SymbolicLink,
    /// Stream Directory (4/9.2).
    StreamDirectory,
    /// 14-247 reserved for future standardization.
    Reserved(u8),
    /// 248-255 subject to agreement between originator and recipient.
    Agreement(u8),
}

impl From<u8> for FileType {
    fn from(v: u8) -> Self {
        match v {
            0 => FileType::Unspecified,
            1 => FileType::Unallocated,
            2 => FileType::PartitionIntegrity,
            3 => FileType::Indirect,
            4 => FileType::Directory,
            5 => FileType::SequenceOfBytes,
            6 => FileType::BlockSpecialDevice,
            7 => FileType::CharacterSpecialDevice,
            8 => FileType::ExtendedAttributes,
            9 => FileType::Fifo,
            10 => FileType::Socket,
            11 => FileType::TerminalEntry,
            12 => FileType::SymbolicLink,
            13 => FileType::StreamDirectory,
            14..=247 => FileType::Reserved(v),
            _ => FileType::Agreement(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let tag = ICBTag {
            strategy_type: 4,
            file_type: 4,
            flags: 0,
            ..Default::default()
        };
        let mut bytes = [0u8; ICBTag::SIZE];
        tag.write(&mut bytes);
        let parsed = ICBTag::read(&bytes);
        assert_eq!(tag, parsed);
        assert_eq!(parsed.file_type(), FileType::Directory);
        assert_eq!(
            parsed.allocation_descriptor_type(),
            AllocationDescriptorType::Short
        );
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_bad_strategy_type_rejected() {
        let tag = ICBTag {
            strategy_type: 7,
            ..Default::default()
        };
        assert!(matches!(tag.validate(), Err(UdfError::InvalidFormat(_))));
    }
}
