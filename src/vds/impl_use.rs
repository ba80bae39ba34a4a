//! Implementation Use Volume Descriptor (tag 4). UDF 2.2.7.

use crate::charspec::CharSpec;
use crate::entity_id::EntityID;
use crate::error::{Result, UdfError};
use crate::primitive::Dstring;
use crate::tag::{self, DescriptorTag, ExtentLocation};

pub const TAG_IDENTIFIER: u16 = 4;
const BODY_LEN: usize = 4 + EntityID::SIZE + 460;
const LV_INFO_USE_LEN: usize = 460;

/// Implementation-use payload the LV Information record carries (UDF
/// 2.2.7.2): `LVICharset`, `LogicalVolumeIdentifier`, three free-text
/// info fields, the implementation identifier, and opaque use bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalVolumeInformation {
    pub lvi_charset: CharSpec,
    pub logical_volume_identifier: Dstring<128>,
    pub lv_info1: Dstring<36>,
    pub lv_info2: Dstring<36>,
    pub lv_info3: Dstring<36>,
    pub implementation_identifier: EntityID,
    pub implementation_use: [u8; 128],
}

impl LogicalVolumeInformation {
    fn read(bytes: &[u8]) -> Self {
        Self {
            lvi_charset: CharSpec::read(&bytes[0..64]),
            logical_volume_identifier: {
                let mut d = Dstring::<128>::default();
                d.0.copy_from_slice(&bytes[64..192]);
                d
            },
            lv_info1: {
                let mut d = Dstring::<36>::default();
                d.0.copy_from_slice(&bytes[192..228]);
                d
            },
            lv_info2: {
                let mut d = Dstring::<36>::default();
                d.0.copy_from_slice(&bytes[228..264]);
                d
            },
            lv_info3: {
                let mut d = Dstring::<36>::default();
                d.0.copy_from_slice(&bytes[264..300]);
                d
            },
            implementation_identifier: EntityID::read(&bytes[300..332]),
            implementation_use: bytes[332..460].try_into().unwrap(),
        }
    }

    fn write(&self, bytes: &mut [u8]) {
        self.lvi_charset.write(&mut bytes[0..64]);
        bytes[64..192].copy_from_slice(&self.logical_volume_identifier.0);
        bytes[192..228].copy_from_slice(&self.lv_info1.0);
        bytes[228..264].copy_from_slice(&self.lv_info2.0);
        bytes[264..300].copy_from_slice(&self.lv_info3.0);
        self.implementation_identifier.write(&mut bytes[300..332]);
        bytes[332..460].copy_from_slice(&self.implementation_use);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImplementationUseVolumeDescriptor {
    pub tag: DescriptorTag,
    pub volume_descriptor_sequence_number: u32,
    pub implementation_identifier: EntityID,
    pub lv_information: LogicalVolumeInformation,
    location: ExtentLocation,
}

const REQUIRED_IMPLEMENTATION_IDENTIFIER_PREFIX: &[u8] = b"*UDF LV Info";

impl ImplementationUseVolumeDescriptor {
    pub fn new(
        extent: u32,
        volume_descriptor_sequence_number: u32,
        lv_information: LogicalVolumeInformation,
    ) -> Self {
        let implementation_identifier =
            EntityID::new(REQUIRED_IMPLEMENTATION_IDENTIFIER_PREFIX, b"\x02\x01").unwrap();
        let mut ivd = Self {
            tag: DescriptorTag::default(),
            volume_descriptor_sequence_number,
            implementation_identifier,
            lv_information,
            location: ExtentLocation::new(extent),
        };
        ivd.reseal();
        ivd
    }

    fn body(&self) -> Vec<u8> {
        let mut b = vec![0u8; BODY_LEN];
        b[0..4].copy_from_slice(&self.volume_descriptor_sequence_number.to_le_bytes());
        self.implementation_identifier.write(&mut b[4..4 + EntityID::SIZE]);
        self.lv_information.write(&mut b[4 + EntityID::SIZE..BODY_LEN]);
        b
    }

    fn reseal(&mut self) {
        let body = self.body();
        self.tag = tag::seal(TAG_IDENTIFIER, 3, self.location.current(), &body, BODY_LEN);
    }

    pub fn parse(bytes: &[u8], extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + BODY_LEN {
            return Err(UdfError::InvalidFormat(
                "implementation use volume descriptor buffer too small".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected implementation use volume descriptor tag {}, got {}",
                TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }
        let body = &bytes[16..16 + BODY_LEN];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;

        let implementation_identifier = EntityID::read(&body[4..4 + EntityID::SIZE]);
        if !implementation_identifier.starts_with(REQUIRED_IMPLEMENTATION_IDENTIFIER_PREFIX) {
            return Err(UdfError::InvalidFormat(
                "implementation use volume descriptor identifier does not start with \
                 '*UDF LV Info'"
                    .to_string(),
            ));
        }

        Ok(Self {
            tag: parsed_tag,
            volume_descriptor_sequence_number: u32::from_le_bytes([
                body[0], body[1], body[2], body[3],
            ]),
            implementation_identifier,
            lv_information: LogicalVolumeInformation::read(
                &body[4 + EntityID::SIZE..BODY_LEN],
            ),
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

    fn sample_lv_info() -> LogicalVolumeInformation {
        LogicalVolumeInformation {
            lvi_charset: CharSpec::osta_cs0(),
            logical_volume_identifier: Dstring::from_str("MY_DVD"),
            lv_info1: Dstring::default(),
            lv_info2: Dstring::default(),
            lv_info3: Dstring::default(),
            implementation_identifier: EntityID::new(b"*my impl", b"").unwrap(),
            implementation_use: [0; 128],
        }
    }

    #[test]
    fn test_roundtrip() {
        let ivd = ImplementationUseVolumeDescriptor::new(33, 1, sample_lv_info());
        let bytes = ivd.record();
        assert_eq!(bytes.len(), BODY_LEN + 16);
        let parsed = ImplementationUseVolumeDescriptor::parse(&bytes, 33).unwrap();
        assert_eq!(
            parsed.lv_information.logical_volume_identifier.to_string(),
            "MY_DVD"
        );
        assert!(parsed
            .implementation_identifier
            .starts_with(b"*UDF LV Info"));
    }

    #[test]
    fn test_bad_implementation_identifier_rejected() {
        let mut ivd = ImplementationUseVolumeDescriptor::new(33, 1, sample_lv_info());
        ivd.implementation_identifier = EntityID::new(b"*not it", b"").unwrap();
        ivd.reseal();
        let bytes = ivd.record();
        assert!(ImplementationUseVolumeDescriptor::parse(&bytes, 33).is_err());
    }
}
