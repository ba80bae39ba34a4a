//! Terminating Descriptor (tag 8). ECMA-167 3/10.9, reused both to end
//! the Volume Descriptor Sequence and, partition-relative, to end a
//! File Set Descriptor sequence (4/8.1).

use crate::error::{Result, UdfError};
use crate::tag::{self, DescriptorTag, ExtentLocation};

pub const TAG_IDENTIFIER: u16 = 8;
const BODY_LEN: usize = 496;

#[derive(Debug, Clone, PartialEq)]
pub struct TerminatingDescriptor {
    pub tag: DescriptorTag,
    location: ExtentLocation,
}

impl TerminatingDescriptor {
    /// `start_extent` is `None` for a volume-relative terminator (VDS),
    /// `Some(partition_start)` for a partition-relative one (File Set
    /// Descriptor sequence) — see spec §4.10.
    pub fn new(extent: u32, start_extent: Option<u32>) -> Self {
        let location = ExtentLocation::new(extent);
        let tag_location = match start_extent {
            Some(start) => location.relative_to(start),
            None => location.current(),
        };
        let tag = tag::seal(TAG_IDENTIFIER, 2, tag_location, &[0u8; BODY_LEN], BODY_LEN);
        Self { tag, location }
    }

    pub fn parse(bytes: &[u8], extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + BODY_LEN {
            return Err(UdfError::InvalidFormat(
                "terminating descriptor buffer too small".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected terminating descriptor tag {}, got {}",
                TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }
        let body = &bytes[16..16 + BODY_LEN];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;
        if body.iter().any(|&b| b != 0) {
            return Err(UdfError::InvalidFormat(
                "terminating descriptor body is not all zero".to_string(),
            ));
        }

        Ok(Self {
            tag: parsed_tag,
            location: ExtentLocation::new(extent),
        })
    }

    pub fn record(&self) -> Vec<u8> {
        let mut out = vec![0u8; DescriptorTag::SIZE + BODY_LEN];
        self.tag.write(&mut out[0..16]);
        out
    }

    pub fn extent_location(&self) -> u32 {
        self.location.current()
    }

    pub fn set_location(&mut self, location: u32, start_extent: Option<u32>) {
        self.location.set(location);
        let tag_location = match start_extent {
            Some(start) => self.location.relative_to(start),
            None => self.location.current(),
        };
        self.tag.relocate(tag_location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_relative_roundtrip() {
        let td = TerminatingDescriptor::new(300, None);
        let bytes = td.record();
        let parsed = TerminatingDescriptor::parse(&bytes, 300).unwrap();
        assert_eq!(parsed.tag.tag_location, 300);
    }

    #[test]
    fn test_partition_relative_tag_location() {
        let td = TerminatingDescriptor::new(872, Some(272));
        assert_eq!(td.tag.tag_location, 600);
        let bytes = td.record();
        let parsed = TerminatingDescriptor::parse(&bytes, 872).unwrap();
        assert_eq!(parsed.tag.tag_location, 600);
        assert_eq!(parsed.extent_location(), 872);
    }

    #[test]
    fn test_nonzero_body_rejected() {
        let td = TerminatingDescriptor::new(300, None);
        let mut bytes = td.record();
        bytes[16] = 1;
        assert!(TerminatingDescriptor::parse(&bytes, 300).is_err());
    }
}
