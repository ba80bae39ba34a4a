//! Primary Volume Descriptor (tag 1). ECMA-167 3/10.1.

use crate::alloc::ExtentAd;
use crate::charspec::CharSpec;
use crate::entity_id::EntityID;
use crate::error::{Result, UdfError};
use crate::primitive::Dstring;
use crate::random::Random;
use crate::tag::{self, DescriptorTag, ExtentLocation};
use crate::timestamp::Timestamp;

pub const TAG_IDENTIFIER: u16 = 1;
const BODY_LEN: usize = 496;

#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryVolumeDescriptor {
    pub tag: DescriptorTag,
    pub volume_descriptor_sequence_number: u32,
    pub primary_volume_descriptor_number: u32,
    pub volume_identifier: Dstring<32>,
    pub volume_sequence_number: u16,
    pub maximum_volume_sequence_number: u16,
    pub interchange_level: u16,
    pub maximum_interchange_level: u16,
    pub character_set_list: u32,
    pub maximum_character_set_list: u32,
    pub volume_set_identifier: Dstring<128>,
    pub descriptor_character_set: CharSpec,
    pub explanatory_character_set: CharSpec,
    pub volume_abstract: ExtentAd,
    pub volume_copyright_notice: ExtentAd,
    pub application_identifier: EntityID,
    pub recording_date_and_time: Timestamp,
    pub implementation_identifier: EntityID,
    pub implementation_use: [u8; 64],
    pub predecessor_volume_descriptor_sequence_location: u32,
    pub flags: u16,
    reserved: [u8; 22],
    location: ExtentLocation,
}

/// Read-only DVD profile constants the core enforces on parse (spec
/// §4.5); any deviation is `InvalidFormat`.
const REQUIRED_VOLUME_SEQUENCE_NUMBER: u16 = 1;
const REQUIRED_INTERCHANGE_LEVEL: u16 = 2;
const REQUIRED_CHARACTER_SET_LIST: u32 = 1;
const REQUIRED_FLAGS: u16 = 0;

impl PrimaryVolumeDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extent: u32,
        volume_descriptor_sequence_number: u32,
        primary_volume_descriptor_number: u32,
        volume_identifier: &str,
        application_identifier: EntityID,
        recording_date_and_time: Timestamp,
        implementation_identifier: EntityID,
        volume_abstract: ExtentAd,
        volume_copyright_notice: ExtentAd,
        random: &dyn Random,
    ) -> Self {
        let volume_set_identifier = Dstring::from_str(&format!("{:016X}", random.next_u64()));
        let mut pvd = Self {
            tag: DescriptorTag::default(),
            volume_descriptor_sequence_number,
            primary_volume_descriptor_number,
            volume_identifier: Dstring::from_str(volume_identifier),
            volume_sequence_number: REQUIRED_VOLUME_SEQUENCE_NUMBER,
            maximum_volume_sequence_number: REQUIRED_VOLUME_SEQUENCE_NUMBER,
            interchange_level: REQUIRED_INTERCHANGE_LEVEL,
            maximum_interchange_level: REQUIRED_INTERCHANGE_LEVEL,
            character_set_list: REQUIRED_CHARACTER_SET_LIST,
            maximum_character_set_list: REQUIRED_CHARACTER_SET_LIST,
            volume_set_identifier,
            descriptor_character_set: CharSpec::osta_cs0(),
            explanatory_character_set: CharSpec::osta_cs0(),
            volume_abstract,
            volume_copyright_notice,
            application_identifier,
            recording_date_and_time,
            implementation_identifier,
            implementation_use: [0; 64],
            predecessor_volume_descriptor_sequence_location: 0,
            flags: REQUIRED_FLAGS,
            reserved: [0; 22],
            location: ExtentLocation::new(extent),
        };
        pvd.reseal();
        pvd
    }

    fn body(&self) -> Vec<u8> {
        let mut b = vec![0u8; BODY_LEN];
        b[0..4].copy_from_slice(&self.volume_descriptor_sequence_number.to_le_bytes());
        b[4..8].copy_from_slice(&self.primary_volume_descriptor_number.to_le_bytes());
        b[8..40].copy_from_slice(&self.volume_identifier.0);
        b[40..42].copy_from_slice(&self.volume_sequence_number.to_le_bytes());
        b[42..44].copy_from_slice(&self.maximum_volume_sequence_number.to_le_bytes());
        b[44..46].copy_from_slice(&self.interchange_level.to_le_bytes());
        b[46..48].copy_from_slice(&self.maximum_interchange_level.to_le_bytes());
        b[48..52].copy_from_slice(&self.character_set_list.to_le_bytes());
        b[52..56].copy_from_slice(&self.maximum_character_set_list.to_le_bytes());
        b[56..184].copy_from_slice(&self.volume_set_identifier.0);
        self.descriptor_character_set.write(&mut b[184..248]);
        self.explanatory_character_set.write(&mut b[248..312]);
        self.volume_abstract.write(&mut b[312..320]);
        self.volume_copyright_notice.write(&mut b[320..328]);
        self.application_identifier.write(&mut b[328..360]);
        self.recording_date_and_time.write(&mut b[360..372]);
        self.implementation_identifier.write(&mut b[372..404]);
        b[404..468].copy_from_slice(&self.implementation_use);
        b[468..472]
            .copy_from_slice(&self.predecessor_volume_descriptor_sequence_location.to_le_bytes());
        b[472..474].copy_from_slice(&self.flags.to_le_bytes());
        b[474..496].copy_from_slice(&self.reserved);
        b
    }

    fn reseal(&mut self) {
        let body = self.body();
        self.tag = tag::seal(TAG_IDENTIFIER, 2, self.location.current(), &body, BODY_LEN);
    }

    pub fn parse(bytes: &[u8], extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + BODY_LEN {
            return Err(UdfError::InvalidFormat(
                "primary volume descriptor buffer too small".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected primary volume descriptor tag {}, got {}",
                TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }
        let body = &bytes[16..16 + BODY_LEN];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;

        let pvd = Self {
            tag: parsed_tag,
            volume_descriptor_sequence_number: u32::from_le_bytes([
                body[0], body[1], body[2], body[3],
            ]),
            primary_volume_descriptor_number: u32::from_le_bytes([
                body[4], body[5], body[6], body[7],
            ]),
            volume_identifier: {
                let mut d = Dstring::<32>::default();
                d.0.copy_from_slice(&body[8..40]);
                d
            },
            volume_sequence_number: u16::from_le_bytes([body[40], body[41]]),
            maximum_volume_sequence_number: u16::from_le_bytes([body[42], body[43]]),
            interchange_level: u16::from_le_bytes([body[44], body[45]]),
            maximum_interchange_level: u16::from_le_bytes([body[46], body[47]]),
            character_set_list: u32::from_le_bytes([body[48], body[49], body[50], body[51]]),
            maximum_character_set_list: u32::from_le_bytes([
                body[52], body[53], body[54], body[55],
            ]),
            volume_set_identifier: {
                let mut d = Dstring::<128>::default();
                d.0.copy_from_slice(&body[56..184]);
                d
            },
            descriptor_character_set: CharSpec::read(&body[184..248]),
            explanatory_character_set: CharSpec::read(&body[248..312]),
            volume_abstract: ExtentAd::read(&body[312..320]),
            volume_copyright_notice: ExtentAd::read(&body[320..328]),
            application_identifier: EntityID::read(&body[328..360]),
            recording_date_and_time: Timestamp::read(&body[360..372]),
            implementation_identifier: EntityID::read(&body[372..404]),
            implementation_use: body[404..468].try_into().unwrap(),
            predecessor_volume_descriptor_sequence_location: u32::from_le_bytes([
                body[468], body[469], body[470], body[471],
            ]),
            flags: u16::from_le_bytes([body[472], body[473]]),
            reserved: body[474..496].try_into().unwrap(),
            location: ExtentLocation::new(extent),
        };
        pvd.validate()?;
        Ok(pvd)
    }

    fn validate(&self) -> Result<()> {
        if self.volume_sequence_number != REQUIRED_VOLUME_SEQUENCE_NUMBER
            || self.maximum_volume_sequence_number != REQUIRED_VOLUME_SEQUENCE_NUMBER
        {
            return Err(UdfError::InvalidFormat(
                "primary volume descriptor volume sequence number must be 1".to_string(),
            ));
        }
        if self.interchange_level != REQUIRED_INTERCHANGE_LEVEL
            || self.maximum_interchange_level != REQUIRED_INTERCHANGE_LEVEL
        {
            return Err(UdfError::InvalidFormat(
                "primary volume descriptor interchange level must be 2".to_string(),
            ));
        }
        if self.character_set_list != REQUIRED_CHARACTER_SET_LIST
            || self.maximum_character_set_list != REQUIRED_CHARACTER_SET_LIST
        {
            return Err(UdfError::InvalidFormat(
                "primary volume descriptor character set list must be 1".to_string(),
            ));
        }
        if self.flags != REQUIRED_FLAGS {
            return Err(UdfError::InvalidFormat(
                "primary volume descriptor flags must be 0".to_string(),
            ));
        }
        if self.reserved.iter().any(|&b| b != 0) {
            return Err(UdfError::InvalidFormat(
                "primary volume descriptor reserved area is not zero".to_string(),
            ));
        }
        self.recording_date_and_time.validate()
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

    struct FixedRandom(u64);
    impl Random for FixedRandom {
        fn next_u64(&self) -> u64 {
            self.0
        }
    }

    fn sample() -> PrimaryVolumeDescriptor {
        PrimaryVolumeDescriptor::new(
            17,
            0,
            0,
            "MY_DVD",
            EntityID::new(b"*my app", b"").unwrap(),
            Timestamp::default(),
            EntityID::new(b"*my impl", b"").unwrap(),
            ExtentAd::default(),
            ExtentAd::default(),
            &FixedRandom(0xDEAD_BEEF_0000_0001),
        )
    }

    #[test]
    fn test_roundtrip() {
        let pvd = sample();
        let bytes = pvd.record();
        assert_eq!(bytes.len(), 512);
        let parsed = PrimaryVolumeDescriptor::parse(&bytes, 17).unwrap();
        assert_eq!(parsed.volume_identifier.to_string(), "MY_DVD");
        assert_eq!(parsed.extent_location(), 17);
    }

    #[test]
    fn test_bad_interchange_level_rejected() {
        let mut pvd = sample();
        pvd.interchange_level = 1;
        pvd.reseal();
        let bytes = pvd.record();
        assert!(PrimaryVolumeDescriptor::parse(&bytes, 17).is_err());
    }
}
