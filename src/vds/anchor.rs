//! Anchor Volume Descriptor Pointer (tag 2). ECMA-167 3/10.2.
//! Bootstraps discovery of the main and reserve Volume Descriptor
//! Sequences; recorded at least twice among logical sectors 256,
//! N-256, and N.

use crate::alloc::ExtentAd;
use crate::error::{Result, UdfError};
use crate::recognition::SECTOR_SIZE;
use crate::tag::{self, DescriptorTag, ExtentLocation};

pub const TAG_IDENTIFIER: u16 = 2;
/// Tag + two ExtentAds + reserved: the CRC-protected body.
const BODY_LEN: usize = ExtentAd::SIZE * 2 + 480;

#[derive(Debug, Clone, PartialEq)]
pub struct AnchorVolumeDescriptorPointer {
    pub tag: DescriptorTag,
    /// `main_volume_descriptor_sequence_location.length_bytes >= 16 * 2048`.
    pub main_volume_descriptor_sequence_location: ExtentAd,
    /// `reserve_volume_descriptor_sequence_location.length_bytes >= 16 * 2048`.
    pub reserve_volume_descriptor_sequence_location: ExtentAd,
    location: ExtentLocation,
}

impl AnchorVolumeDescriptorPointer {
    pub fn new(
        extent: u32,
        main_volume_descriptor_sequence_location: ExtentAd,
        reserve_volume_descriptor_sequence_location: ExtentAd,
    ) -> Self {
        let mut anchor = Self {
            tag: DescriptorTag::default(),
            main_volume_descriptor_sequence_location,
            reserve_volume_descriptor_sequence_location,
            location: ExtentLocation::new(extent),
        };
        anchor.reseal();
        anchor
    }

    fn body(&self) -> Vec<u8> {
        let mut body = vec![0u8; BODY_LEN];
        self.main_volume_descriptor_sequence_location
            .write(&mut body[0..8]);
        self.reserve_volume_descriptor_sequence_location
            .write(&mut body[8..16]);
        body
    }

    fn reseal(&mut self) {
        let body = self.body();
        self.tag = tag::seal(TAG_IDENTIFIER, 2, self.location.current(), &body, BODY_LEN);
    }

    pub fn parse(bytes: &[u8], extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + BODY_LEN {
            return Err(UdfError::InvalidFormat(
                "anchor volume descriptor buffer too small".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected anchor tag identifier {}, got {}",
                TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }
        let body = &bytes[16..16 + BODY_LEN];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;

        let main = ExtentAd::read(&body[0..8]);
        let reserve = ExtentAd::read(&body[8..16]);
        if main.length_bytes < 16 * SECTOR_SIZE as u32 {
            return Err(UdfError::InvalidFormat(
                "main volume descriptor sequence extent shorter than 16 sectors".to_string(),
            ));
        }
        if reserve.length_bytes < 16 * SECTOR_SIZE as u32 {
            return Err(UdfError::InvalidFormat(
                "reserve volume descriptor sequence extent shorter than 16 sectors".to_string(),
            ));
        }

        Ok(Self {
            tag: parsed_tag,
            main_volume_descriptor_sequence_location: main,
            reserve_volume_descriptor_sequence_location: reserve,
            location: ExtentLocation::new(extent),
        })
    }

    /// Produces a full 2048-byte sector: tag + body padded with zeros.
    pub fn record(&self) -> Vec<u8> {
        let mut out = vec![0u8; SECTOR_SIZE];
        self.tag.write(&mut out[0..16]);
        out[16..16 + BODY_LEN].copy_from_slice(&self.body());
        out
    }

    pub fn extent_location(&self) -> u32 {
        self.location.current()
    }

    pub fn set_location(&mut self, location: u32) {
        self.location.set(location);
        self.tag.relocate(self.location.current());
    }

    pub fn set_main_volume_descriptor_sequence_location(&mut self, extent: ExtentAd) {
        self.main_volume_descriptor_sequence_location = extent;
        self.reseal();
        self.tag.relocate(self.location.current());
    }

    pub fn set_reserve_volume_descriptor_sequence_location(&mut self, extent: ExtentAd) {
        self.reserve_volume_descriptor_sequence_location = extent;
        self.reseal();
        self.tag.relocate(self.location.current());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnchorVolumeDescriptorPointer {
        AnchorVolumeDescriptorPointer::new(
            256,
            ExtentAd {
                length_bytes: 16 * SECTOR_SIZE as u32,
                location_sector: 32,
            },
            ExtentAd {
                length_bytes: 16 * SECTOR_SIZE as u32,
                location_sector: 288,
            },
        )
    }

    #[test]
    fn test_tag_roundtrip() {
        let anchor = sample();
        let bytes = anchor.record();
        assert_eq!(bytes.len(), SECTOR_SIZE);
        assert_eq!(u16::from_le_bytes([bytes[0], bytes[1]]), 2);
        assert_eq!(
            u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
            256
        );

        let parsed = AnchorVolumeDescriptorPointer::parse(&bytes, 256).unwrap();
        assert_eq!(parsed.main_volume_descriptor_sequence_location.location_sector, 32);
        assert_eq!(
            parsed.reserve_volume_descriptor_sequence_location.location_sector,
            288
        );
        assert_eq!(parsed.extent_location(), 256);
    }

    #[test]
    fn test_relocation_consistency() {
        let mut anchor = sample();
        anchor.set_location(1000);
        let bytes = anchor.record();
        assert_eq!(
            u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
            1000
        );
        assert_eq!(anchor.extent_location(), 1000);
    }

    #[test]
    fn test_short_main_extent_rejected() {
        let mut anchor = sample();
        anchor.main_volume_descriptor_sequence_location.length_bytes = 1;
        anchor.reseal();
        let bytes = anchor.record();
        assert!(AnchorVolumeDescriptorPointer::parse(&bytes, 256).is_err());
    }
}
