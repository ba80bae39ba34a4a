//! Unallocated Space Descriptor (tag 7). ECMA-167 3/10.8.
//!
//! The supported read-only profile never records unallocated space
//! extents, so parse enforces `num_alloc_descriptors == 0` and emit
//! always writes a zero count.

use crate::error::{Result, UdfError};
use crate::tag::{self, DescriptorTag, ExtentLocation};

pub const TAG_IDENTIFIER: u16 = 7;
const BODY_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct UnallocatedSpaceDescriptor {
    pub tag: DescriptorTag,
    pub volume_descriptor_sequence_number: u32,
    location: ExtentLocation,
}

impl UnallocatedSpaceDescriptor {
    pub fn new(extent: u32, volume_descriptor_sequence_number: u32) -> Self {
        let mut usd = Self {
            tag: DescriptorTag::default(),
            volume_descriptor_sequence_number,
            location: ExtentLocation::new(extent),
        };
        usd.reseal();
        usd
    }

    fn body(&self) -> Vec<u8> {
        let mut b = vec![0u8; BODY_LEN];
        b[0..4].copy_from_slice(&self.volume_descriptor_sequence_number.to_le_bytes());
        // num_alloc_descriptors is always 0.
        b
    }

    fn reseal(&mut self) {
        let body = self.body();
        self.tag = tag::seal(TAG_IDENTIFIER, 2, self.location.current(), &body, BODY_LEN);
    }

    pub fn parse(bytes: &[u8], extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + BODY_LEN {
            return Err(UdfError::InvalidFormat(
                "unallocated space descriptor buffer too small".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected unallocated space descriptor tag {}, got {}",
                TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }
        let body = &bytes[16..16 + BODY_LEN];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;

        let num_alloc_descriptors = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
        if num_alloc_descriptors != 0 {
            return Err(UdfError::InvalidFormat(format!(
                "unallocated space descriptor num_alloc_descriptors {} is not 0",
                num_alloc_descriptors
            )));
        }

        Ok(Self {
            tag: parsed_tag,
            volume_descriptor_sequence_number: u32::from_le_bytes([
                body[0], body[1], body[2], body[3],
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

    #[test]
    fn test_roundtrip() {
        let usd = UnallocatedSpaceDescriptor::new(36, 1);
        let bytes = usd.record();
        let parsed = UnallocatedSpaceDescriptor::parse(&bytes, 36).unwrap();
        assert_eq!(parsed.extent_location(), 36);
    }

    #[test]
    fn test_nonzero_alloc_descriptor_count_rejected() {
        let mut body = vec![0u8; BODY_LEN];
        body[0..4].copy_from_slice(&1u32.to_le_bytes());
        body[4..8].copy_from_slice(&1u32.to_le_bytes());
        let tag = tag::seal(TAG_IDENTIFIER, 2, 36, &body, BODY_LEN);
        let mut bytes = vec![0u8; DescriptorTag::SIZE + BODY_LEN];
        tag.write(&mut bytes[0..16]);
        bytes[16..].copy_from_slice(&body);
        assert!(UnallocatedSpaceDescriptor::parse(&bytes, 36).is_err());
    }
}
