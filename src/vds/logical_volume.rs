//! Logical Volume Descriptor (tag 6). ECMA-167 3/10.6.

use crate::alloc::{ExtentAd, LongAd};
use crate::charspec::CharSpec;
use crate::entity_id::EntityID;
use crate::error::{Result, UdfError};
use crate::partition_map::PartitionMap;
use crate::primitive::Dstring;
use crate::tag::{self, DescriptorTag, ExtentLocation};

pub const TAG_IDENTIFIER: u16 = 6;
const REQUIRED_LOGICAL_BLOCK_SIZE: u32 = 2048;
const REQUIRED_MAP_TABLE_LENGTH: u32 = PartitionMap::SIZE as u32;
const REQUIRED_NUM_PARTITION_MAPS: u32 = 1;
const REQUIRED_DOMAIN_IDENTIFIER_PREFIX: &[u8] = b"*OSTA UDF Compliant";
const BODY_LEN: usize = 424 + PartitionMap::SIZE;

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalVolumeDescriptor {
    pub tag: DescriptorTag,
    pub volume_descriptor_sequence_number: u32,
    pub descriptor_character_set: CharSpec,
    pub logical_volume_identifier: Dstring<128>,
    pub domain_identifier: EntityID,
    /// LongAd pointing at the File Set Descriptor.
    pub logical_volume_contents_use: LongAd,
    pub implementation_identifier: EntityID,
    pub implementation_use: [u8; 128],
    integrity_sequence_extent: ExtentAd,
    pub partition_map: PartitionMap,
    location: ExtentLocation,
}

impl LogicalVolumeDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extent: u32,
        volume_descriptor_sequence_number: u32,
        logical_volume_identifier: &str,
        logical_volume_contents_use: LongAd,
        implementation_identifier: EntityID,
        integrity_sequence_extent: ExtentAd,
        partition_map: PartitionMap,
    ) -> Self {
        let domain_identifier =
            EntityID::new(REQUIRED_DOMAIN_IDENTIFIER_PREFIX, b"\x02\x01\x00").unwrap();
        let mut lvd = Self {
            tag: DescriptorTag::default(),
            volume_descriptor_sequence_number,
            descriptor_character_set: CharSpec::osta_cs0(),
            logical_volume_identifier: Dstring::from_str(logical_volume_identifier),
            domain_identifier,
            logical_volume_contents_use,
            implementation_identifier,
            implementation_use: [0; 128],
            integrity_sequence_extent,
            partition_map,
            location: ExtentLocation::new(extent),
        };
        lvd.reseal();
        lvd
    }

    fn body(&self) -> Vec<u8> {
        let mut b = vec![0u8; BODY_LEN];
        b[0..4].copy_from_slice(&self.volume_descriptor_sequence_number.to_le_bytes());
        self.descriptor_character_set.write(&mut b[4..68]);
        b[68..196].copy_from_slice(&self.logical_volume_identifier.0);
        b[196..200].copy_from_slice(&REQUIRED_LOGICAL_BLOCK_SIZE.to_le_bytes());
        self.domain_identifier.write(&mut b[200..232]);
        self.logical_volume_contents_use.write(&mut b[232..248]);
        b[248..252].copy_from_slice(&REQUIRED_MAP_TABLE_LENGTH.to_le_bytes());
        b[252..256].copy_from_slice(&REQUIRED_NUM_PARTITION_MAPS.to_le_bytes());
        self.implementation_identifier.write(&mut b[256..288]);
        b[288..416].copy_from_slice(&self.implementation_use);
        self.integrity_sequence_extent.write(&mut b[416..424]);
        self.partition_map.write(&mut b[424..424 + PartitionMap::SIZE]);
        b
    }

    fn reseal(&mut self) {
        let body = self.body();
        self.tag = tag::seal(TAG_IDENTIFIER, 2, self.location.current(), &body, BODY_LEN);
    }

    pub fn parse(bytes: &[u8], extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + BODY_LEN {
            return Err(UdfError::InvalidFormat(
                "logical volume descriptor buffer too small".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected logical volume descriptor tag {}, got {}",
                TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }
        let body = &bytes[16..16 + BODY_LEN];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;

        let logical_block_size = u32::from_le_bytes([body[196], body[197], body[198], body[199]]);
        if logical_block_size != REQUIRED_LOGICAL_BLOCK_SIZE {
            return Err(UdfError::InvalidFormat(format!(
                "logical volume descriptor logical block size {} is not 2048",
                logical_block_size
            )));
        }
        let domain_identifier = EntityID::read(&body[200..232]);
        if !domain_identifier.starts_with(REQUIRED_DOMAIN_IDENTIFIER_PREFIX) {
            return Err(UdfError::InvalidFormat(
                "logical volume descriptor domain identifier does not start with \
                 '*OSTA UDF Compliant'"
                    .to_string(),
            ));
        }
        let map_table_length = u32::from_le_bytes([body[248], body[249], body[250], body[251]]);
        if map_table_length != REQUIRED_MAP_TABLE_LENGTH {
            return Err(UdfError::InvalidFormat(format!(
                "logical volume descriptor map table length {} is not {}",
                map_table_length, REQUIRED_MAP_TABLE_LENGTH
            )));
        }
        let num_partition_maps = u32::from_le_bytes([body[252], body[253], body[254], body[255]]);
        if num_partition_maps != REQUIRED_NUM_PARTITION_MAPS {
            return Err(UdfError::InvalidFormat(format!(
                "logical volume descriptor num partition maps {} is not 1",
                num_partition_maps
            )));
        }
        let partition_map = PartitionMap::read(&body[424..424 + PartitionMap::SIZE])?;

        Ok(Self {
            tag: parsed_tag,
            volume_descriptor_sequence_number: u32::from_le_bytes([
                body[0], body[1], body[2], body[3],
            ]),
            descriptor_character_set: CharSpec::read(&body[4..68]),
            logical_volume_identifier: {
                let mut d = Dstring::<128>::default();
                d.0.copy_from_slice(&body[68..196]);
                d
            },
            domain_identifier,
            logical_volume_contents_use: LongAd::read(&body[232..248]),
            implementation_identifier: EntityID::read(&body[256..288]),
            implementation_use: body[288..416].try_into().unwrap(),
            integrity_sequence_extent: ExtentAd::read(&body[416..424]),
            partition_map,
            location: ExtentLocation::new(extent),
        })
    }

    pub fn record(&self) -> Vec<u8> {
        let mut out = vec![0u8; DescriptorTag::SIZE + BODY_LEN];
        self.tag.write(&mut out[0..16]);
        out[16..].copy_from_slice(&self.body());
        out
    }

    pub fn integrity_sequence_extent(&self) -> ExtentAd {
        self.integrity_sequence_extent
    }

    /// Dedicated setter per spec §6: relocating the LVID sequence
    /// requires resealing the body, since the extent is CRC-covered.
    pub fn set_integrity_sequence_extent(&mut self, extent: ExtentAd) {
        self.integrity_sequence_extent = extent;
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
    use crate::alloc::LbAddr;

    fn sample() -> LogicalVolumeDescriptor {
        LogicalVolumeDescriptor::new(
            35,
            1,
            "MY_DVD",
            LongAd {
                extent_length_and_type: 2048,
                extent_location: LbAddr {
                    logical_block_number: 0,
                    partition_reference_number: 0,
                },
                implementation_use: [0; 6],
            },
            EntityID::new(b"*my impl", b"").unwrap(),
            ExtentAd {
                length_bytes: 2 * 2048,
                location_sector: 512,
            },
            PartitionMap::new(1, 0),
        )
    }

    #[test]
    fn test_roundtrip() {
        let lvd = sample();
        let bytes = lvd.record();
        let parsed = LogicalVolumeDescriptor::parse(&bytes, 35).unwrap();
        assert_eq!(parsed.logical_volume_identifier.to_string(), "MY_DVD");
        assert_eq!(parsed.integrity_sequence_extent().location_sector, 512);
        assert_eq!(parsed.partition_map, PartitionMap::new(1, 0));
    }

    #[test]
    fn test_bad_logical_block_size_rejected() {
        let mut lvd = sample();
        let mut body = lvd.body();
        body[196..200].copy_from_slice(&1024u32.to_le_bytes());
        lvd.tag = tag::seal(TAG_IDENTIFIER, 2, lvd.location.current(), &body, BODY_LEN);
        let mut bytes = vec![0u8; DescriptorTag::SIZE + BODY_LEN];
        lvd.tag.write(&mut bytes[0..16]);
        bytes[16..].copy_from_slice(&body);
        assert!(LogicalVolumeDescriptor::parse(&bytes, 35).is_err());
    }

    #[test]
    fn test_integrity_sequence_relocation_reseals() {
        let mut lvd = sample();
        lvd.set_integrity_sequence_extent(ExtentAd {
            length_bytes: 2048,
            location_sector: 9000,
        });
        let bytes = lvd.record();
        let parsed = LogicalVolumeDescriptor::parse(&bytes, 35).unwrap();
        assert_eq!(parsed.integrity_sequence_extent().location_sector, 9000);
    }
}
