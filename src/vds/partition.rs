//! Partition Volume Descriptor (tag 5). ECMA-167 3/10.5.

use crate::entity_id::EntityID;
use crate::error::{Result, UdfError};
use crate::partition_map::PartitionHeaderDescriptor;
use crate::tag::{self, DescriptorTag, ExtentLocation};

pub const TAG_IDENTIFIER: u16 = 5;
const BODY_LEN: usize = 496;

const REQUIRED_PARTITION_CONTENTS_PREFIX: &[u8] = b"+NSR02";
const REQUIRED_PARTITION_CONTENTS_FLAGS: u8 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionDescriptor {
    pub tag: DescriptorTag,
    pub volume_descriptor_sequence_number: u32,
    pub partition_flags: u16,
    pub partition_number: u16,
    pub partition_contents: EntityID,
    pub partition_contents_use: PartitionHeaderDescriptor,
    pub access_type: u32,
    pub partition_length: u32,
    pub implementation_identifier: EntityID,
    pub implementation_use: [u8; 128],
    reserved: [u8; 156],
    partition_starting_location: u32,
    location: ExtentLocation,
}

impl PartitionDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extent: u32,
        volume_descriptor_sequence_number: u32,
        partition_flags: u16,
        partition_number: u16,
        access_type: u32,
        partition_starting_location: u32,
        partition_length: u32,
        implementation_identifier: EntityID,
    ) -> Self {
        let partition_contents =
            EntityID::new(REQUIRED_PARTITION_CONTENTS_PREFIX, &[]).map(|mut id| {
                id.flags = REQUIRED_PARTITION_CONTENTS_FLAGS;
                id
            }).unwrap();
        let mut pd = Self {
            tag: DescriptorTag::default(),
            volume_descriptor_sequence_number,
            partition_flags,
            partition_number,
            partition_contents,
            partition_contents_use: PartitionHeaderDescriptor::default(),
            access_type,
            partition_length,
            implementation_identifier,
            implementation_use: [0; 128],
            reserved: [0; 156],
            partition_starting_location,
            location: ExtentLocation::new(extent),
        };
        pd.reseal();
        pd
    }

    fn body(&self) -> Vec<u8> {
        let mut b = vec![0u8; BODY_LEN];
        b[0..4].copy_from_slice(&self.volume_descriptor_sequence_number.to_le_bytes());
        b[4..6].copy_from_slice(&self.partition_flags.to_le_bytes());
        b[6..8].copy_from_slice(&self.partition_number.to_le_bytes());
        self.partition_contents.write(&mut b[8..40]);
        self.partition_contents_use.write(&mut b[40..168]);
        b[168..172].copy_from_slice(&self.access_type.to_le_bytes());
        b[172..176].copy_from_slice(&self.partition_starting_location.to_le_bytes());
        b[176..180].copy_from_slice(&self.partition_length.to_le_bytes());
        self.implementation_identifier.write(&mut b[180..212]);
        b[212..340].copy_from_slice(&self.implementation_use);
        b[340..496].copy_from_slice(&self.reserved);
        b
    }

    fn reseal(&mut self) {
        let body = self.body();
        self.tag = tag::seal(TAG_IDENTIFIER, 2, self.location.current(), &body, BODY_LEN);
    }

    pub fn parse(bytes: &[u8], extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + BODY_LEN {
            return Err(UdfError::InvalidFormat(
                "partition volume descriptor buffer too small".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected partition volume descriptor tag {}, got {}",
                TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }
        let body = &bytes[16..16 + BODY_LEN];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;

        let partition_contents = EntityID::read(&body[8..40]);
        if partition_contents.flags != REQUIRED_PARTITION_CONTENTS_FLAGS
            || !partition_contents.starts_with(REQUIRED_PARTITION_CONTENTS_PREFIX)
        {
            return Err(UdfError::InvalidFormat(
                "partition contents identifier must be flags=2, '+NSR02'".to_string(),
            ));
        }
        let partition_contents_use = PartitionHeaderDescriptor::read(&body[40..168]);
        partition_contents_use.validate()?;

        Ok(Self {
            tag: parsed_tag,
            volume_descriptor_sequence_number: u32::from_le_bytes([
                body[0], body[1], body[2], body[3],
            ]),
            partition_flags: u16::from_le_bytes([body[4], body[5]]),
            partition_number: u16::from_le_bytes([body[6], body[7]]),
            partition_contents,
            partition_contents_use,
            access_type: u32::from_le_bytes([body[168], body[169], body[170], body[171]]),
            partition_length: u32::from_le_bytes([body[176], body[177], body[178], body[179]]),
            implementation_identifier: EntityID::read(&body[180..212]),
            implementation_use: body[212..340].try_into().unwrap(),
            reserved: body[340..496].try_into().unwrap(),
            partition_starting_location: u32::from_le_bytes([
                body[172], body[173], body[174], body[175],
            ]),
            location: ExtentLocation::new(extent),
        })
    }

    pub fn record(&self) -> Vec<u8> {
        let mut out = vec![0u8; DescriptorTag::SIZE + BODY_LEN];
        self.tag.write(&mut out[0..16]);
        out[16..].copy_from_slice(&self.body());
        out
    }

    pub fn partition_starting_location(&self) -> u32 {
        self.partition_starting_location
    }

    /// Dedicated setter: relocating the partition's starting sector
    /// requires resealing the body (the field is part of the CRC-covered
    /// payload), not just updating the tag's `tag_location`.
    pub fn set_partition_starting_location(&mut self, location: u32) {
        self.partition_starting_location = location;
        self.reseal();
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

    fn sample() -> PartitionDescriptor {
        PartitionDescriptor::new(
            34,
            1,
            1,
            0,
            1,
            272,
            100_000,
            EntityID::new(b"*my impl", b"").unwrap(),
        )
    }

    #[test]
    fn test_roundtrip() {
        let pd = sample();
        let bytes = pd.record();
        assert_eq!(bytes.len(), 512);
        let parsed = PartitionDescriptor::parse(&bytes, 34).unwrap();
        assert_eq!(parsed.partition_starting_location(), 272);
        assert_eq!(parsed.partition_length, 100_000);
        assert!(parsed.partition_contents.starts_with(b"+NSR02"));
    }

    #[test]
    fn test_starting_location_relocation_reseals() {
        let mut pd = sample();
        pd.set_partition_starting_location(9999);
        let bytes = pd.record();
        let parsed = PartitionDescriptor::parse(&bytes, 34).unwrap();
        assert_eq!(parsed.partition_starting_location(), 9999);
    }

    #[test]
    fn test_nonzero_partition_header_rejected() {
        let mut pd = sample();
        pd.partition_contents_use.unallocated_space_table.length = 1;
        pd.reseal();
        let bytes = pd.record();
        assert!(PartitionDescriptor::parse(&bytes, 34).is_err());
    }
}
