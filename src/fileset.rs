//! File Set Descriptor (tag 256). ECMA-167 4/14.1. Located inside the
//! partition via the Logical Volume Descriptor's
//! `logical_volume_contents_use`; its `tag_location` is partition-
//! relative (spec §4.12).

use crate::alloc::LongAd;
use crate::charspec::CharSpec;
use crate::entity_id::EntityID;
use crate::error::{Result, UdfError};
use crate::primitive::Dstring;
use crate::tag::{self, DescriptorTag, ExtentLocation};
use crate::timestamp::Timestamp;

pub const TAG_IDENTIFIER: u16 = 256;
const BODY_LEN: usize = 496;
const REQUIRED_INTERCHANGE_LEVEL: u16 = 3;
const REQUIRED_CHARSET_LIST: u32 = 1;
const REQUIRED_DOMAIN_IDENTIFIER_PREFIX: &[u8] = b"*OSTA UDF Compliant";

#[derive(Debug, Clone, PartialEq)]
pub struct FileSetDescriptor {
    pub tag: DescriptorTag,
    pub recording_date_and_time: Timestamp,
    pub log_vol_charset: CharSpec,
    pub log_vol_ident: Dstring<128>,
    pub file_set_charset: CharSpec,
    pub file_set_ident: Dstring<32>,
    pub copyright_file_ident: Dstring<32>,
    pub abstract_file_ident: Dstring<32>,
    pub root_dir_icb: LongAd,
    pub domain_ident: EntityID,
    location: ExtentLocation,
    start_extent: u32,
}

impl FileSetDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extent: u32,
        start_extent: u32,
        recording_date_and_time: Timestamp,
        log_vol_ident: &str,
        file_set_ident: &str,
        root_dir_icb: LongAd,
    ) -> Self {
        let domain_ident =
            EntityID::new(REQUIRED_DOMAIN_IDENTIFIER_PREFIX, b"\x02\x01\x00").unwrap();
        let mut fsd = Self {
            tag: DescriptorTag::default(),
            recording_date_and_time,
            log_vol_charset: CharSpec::osta_cs0(),
            log_vol_ident: Dstring::from_str(log_vol_ident),
            file_set_charset: CharSpec::osta_cs0(),
            file_set_ident: Dstring::from_str(file_set_ident),
            copyright_file_ident: Dstring::default(),
            abstract_file_ident: Dstring::default(),
            root_dir_icb,
            domain_ident,
            location: ExtentLocation::new(extent),
            start_extent,
        };
        fsd.reseal();
        fsd
    }

    fn body(&self) -> Vec<u8> {
        let mut b = vec![0u8; BODY_LEN];
        self.recording_date_and_time.write(&mut b[0..12]);
        b[12..14].copy_from_slice(&REQUIRED_INTERCHANGE_LEVEL.to_le_bytes());
        b[14..16].copy_from_slice(&REQUIRED_INTERCHANGE_LEVEL.to_le_bytes());
        b[16..20].copy_from_slice(&REQUIRED_CHARSET_LIST.to_le_bytes());
        b[20..24].copy_from_slice(&REQUIRED_CHARSET_LIST.to_le_bytes());
        // file_set_num and file_set_desc_num are 0 (bytes 24..32 left zeroed).
        self.log_vol_charset.write(&mut b[32..96]);
        b[96..224].copy_from_slice(&self.log_vol_ident.0);
        self.file_set_charset.write(&mut b[224..288]);
        b[288..320].copy_from_slice(&self.file_set_ident.0);
        b[320..352].copy_from_slice(&self.copyright_file_ident.0);
        b[352..384].copy_from_slice(&self.abstract_file_ident.0);
        self.root_dir_icb.write(&mut b[384..400]);
        self.domain_ident.write(&mut b[400..432]);
        // next_extent (432..448) and reserved (448..496) stay zero.
        b
    }

    fn reseal(&mut self) {
        let body = self.body();
        let tag_location = self.location.relative_to(self.start_extent);
        self.tag = tag::seal(TAG_IDENTIFIER, 3, tag_location, &body, BODY_LEN);
    }

    pub fn parse(bytes: &[u8], extent: u32, start_extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + BODY_LEN {
            return Err(UdfError::InvalidFormat(
                "file set descriptor buffer too small".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected file set descriptor tag {}, got {}",
                TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }
        let body = &bytes[16..16 + BODY_LEN];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;

        let interchange_level = u16::from_le_bytes([body[12], body[13]]);
        let max_interchange_level = u16::from_le_bytes([body[14], body[15]]);
        if interchange_level != REQUIRED_INTERCHANGE_LEVEL
            || max_interchange_level != REQUIRED_INTERCHANGE_LEVEL
        {
            return Err(UdfError::InvalidFormat(
                "file set descriptor interchange level must be 3".to_string(),
            ));
        }
        let charset_list = u32::from_le_bytes([body[16], body[17], body[18], body[19]]);
        let max_charset_list = u32::from_le_bytes([body[20], body[21], body[22], body[23]]);
        if charset_list != REQUIRED_CHARSET_LIST || max_charset_list != REQUIRED_CHARSET_LIST {
            return Err(UdfError::InvalidFormat(
                "file set descriptor charset list must be 1".to_string(),
            ));
        }
        let domain_ident = EntityID::read(&body[400..432]);
        if !domain_ident.starts_with(REQUIRED_DOMAIN_IDENTIFIER_PREFIX) {
            return Err(UdfError::InvalidFormat(
                "file set descriptor domain identifier does not start with \
                 '*OSTA UDF Compliant'"
                    .to_string(),
            ));
        }
        if body[432..448].iter().any(|&b| b != 0) {
            return Err(UdfError::InvalidFormat(
                "file set descriptor next_extent is not zero".to_string(),
            ));
        }

        Ok(Self {
            tag: parsed_tag,
            recording_date_and_time: Timestamp::read(&body[0..12]),
            log_vol_charset: CharSpec::read(&body[32..96]),
            log_vol_ident: {
                let mut d = Dstring::<128>::default();
                d.0.copy_from_slice(&body[96..224]);
                d
            },
            file_set_charset: CharSpec::read(&body[224..288]),
            file_set_ident: {
                let mut d = Dstring::<32>::default();
                d.0.copy_from_slice(&body[288..320]);
                d
            },
            copyright_file_ident: {
                let mut d = Dstring::<32>::default();
                d.0.copy_from_slice(&body[320..352]);
                d
            },
            abstract_file_ident: {
                let mut d = Dstring::<32>::default();
                d.0.copy_from_slice(&body[352..384]);
                d
            },
            root_dir_icb: LongAd::read(&body[384..400]),
            domain_ident,
            location: ExtentLocation::new(extent),
            start_extent,
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
        self.tag.relocate(self.location.relative_to(self.start_extent));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::LbAddr;

    fn sample() -> FileSetDescriptor {
        FileSetDescriptor::new(
            272,
            272,
            Timestamp::default(),
            "MY_DVD",
            "",
            LongAd {
                extent_length_and_type: 2048,
                extent_location: LbAddr {
                    logical_block_number: 1,
                    partition_reference_number: 0,
                },
                implementation_use: [0; 6],
            },
        )
    }

    #[test]
    fn test_roundtrip_and_partition_relative_tag_location() {
        let fsd = sample();
        assert_eq!(fsd.tag.tag_location, 0);
        let bytes = fsd.record();
        let parsed = FileSetDescriptor::parse(&bytes, 272, 272).unwrap();
        assert_eq!(parsed.log_vol_ident.to_string(), "MY_DVD");
        assert!(parsed.domain_ident.starts_with(b"*OSTA UDF Compliant"));
    }

    #[test]
    fn test_relocation_is_partition_relative() {
        let mut fsd = sample();
        fsd.set_location(280);
        assert_eq!(fsd.tag.tag_location, 8);
    }
}
