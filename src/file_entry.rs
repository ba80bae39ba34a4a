//! File Entry (tag 261), and the two small ICB variants that chain to
//! it: Indirect Entry (tag 259) and Terminal Entry (tag 260). ECMA-167
//! 4/14.7, 4/14.8, 4/14.9.

use crate::alloc::{LongAd, ShortAllocationDescriptor};
use crate::entity_id::EntityID;
use crate::error::{Result, UdfError};
use crate::icb_tag::ICBTag;
use crate::tag::{self, DescriptorTag, ExtentLocation};
use crate::timestamp::Timestamp;

pub const FILE_ENTRY_TAG_IDENTIFIER: u16 = 261;
pub const INDIRECT_ENTRY_TAG_IDENTIFIER: u16 = 259;
pub const TERMINAL_ENTRY_TAG_IDENTIFIER: u16 = 260;

/// The fixed portion of a File Entry's body: everything before the
/// variable-length Extended Attributes and Allocation Descriptors —
/// `icb_tag` through `len_alloc_descs` (20+4+4+4+2+1+1+4+8+8+12+12+12+4+16+32+8+4+4 = 160).
/// Matches teacher's `udf.rs` (`extended_attributes` at absolute offset
/// 176 = body-relative 160, past the 16-byte tag) and pycdlib's
/// `UDFFileEntry.FMT` (`calcsize` 176 for tag+body together).
const FIXED_HEADER_LEN: usize = 160;
/// Per the pycdlib source this codec is grounded on, the CRC window
/// extends 8 bytes past the 160-byte fixed-field boundary, into the
/// start of whatever follows (Extended Attributes if present, else
/// Allocation Descriptors) — it does not stop exactly at Unique ID.
const CRC_LENGTH: usize = 168;

#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub tag: DescriptorTag,
    pub icb_tag: ICBTag,
    pub uid: u32,
    pub gid: u32,
    pub permissions: u32,
    pub file_link_count: u16,
    pub information_length: u64,
    pub logical_blocks_recorded: u64,
    pub access_date_and_time: Timestamp,
    pub modification_date_and_time: Timestamp,
    pub attribute_date_and_time: Timestamp,
    pub extended_attribute_icb: LongAd,
    pub implementation_identifier: EntityID,
    pub unique_id: u64,
    pub extended_attributes: Vec<u8>,
    pub allocation_descriptors: Vec<ShortAllocationDescriptor>,
    location: ExtentLocation,
    start_extent: u32,
}

const REQUIRED_CHECKPOINT: u32 = 1;

impl FileEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extent: u32,
        start_extent: u32,
        icb_tag: ICBTag,
        uid: u32,
        gid: u32,
        permissions: u32,
        file_link_count: u16,
        information_length: u64,
        logical_blocks_recorded: u64,
        access_date_and_time: Timestamp,
        modification_date_and_time: Timestamp,
        implementation_identifier: EntityID,
        unique_id: u64,
        allocation_descriptors: Vec<ShortAllocationDescriptor>,
    ) -> Self {
        let attribute_date_and_time = modification_date_and_time.clone();
        let mut fe = Self {
            tag: DescriptorTag::default(),
            icb_tag,
            uid,
            gid,
            permissions,
            file_link_count,
            information_length,
            logical_blocks_recorded,
            access_date_and_time,
            modification_date_and_time,
            attribute_date_and_time,
            extended_attribute_icb: LongAd::default(),
            implementation_identifier,
            unique_id,
            extended_attributes: Vec::new(),
            allocation_descriptors,
            location: ExtentLocation::new(extent),
            start_extent,
        };
        fe.reseal();
        fe
    }

    fn body_len(&self) -> usize {
        FIXED_HEADER_LEN
            + self.extended_attributes.len()
            + self.allocation_descriptors.len() * ShortAllocationDescriptor::SIZE
    }

    fn body(&self) -> Vec<u8> {
        let mut b = vec![0u8; self.body_len()];
        self.icb_tag.write(&mut b[0..20]);
        b[20..24].copy_from_slice(&self.uid.to_le_bytes());
        b[24..28].copy_from_slice(&self.gid.to_le_bytes());
        b[28..32].copy_from_slice(&self.permissions.to_le_bytes());
        b[32..34].copy_from_slice(&self.file_link_count.to_le_bytes());
        // record_format (34), record_display_attributes (35), record_length (36..40) are always 0.
        b[40..48].copy_from_slice(&self.information_length.to_le_bytes());
        b[48..56].copy_from_slice(&self.logical_blocks_recorded.to_le_bytes());
        self.access_date_and_time.write(&mut b[56..68]);
        self.modification_date_and_time.write(&mut b[68..80]);
        self.attribute_date_and_time.write(&mut b[80..92]);
        b[92..96].copy_from_slice(&REQUIRED_CHECKPOINT.to_le_bytes());
        self.extended_attribute_icb.write(&mut b[96..112]);
        self.implementation_identifier.write(&mut b[112..144]);
        b[144..152].copy_from_slice(&self.unique_id.to_le_bytes());
        b[152..156].copy_from_slice(&(self.extended_attributes.len() as u32).to_le_bytes());
        let alloc_len = (self.allocation_descriptors.len() * ShortAllocationDescriptor::SIZE) as u32;
        b[156..160].copy_from_slice(&alloc_len.to_le_bytes());
        let ea_start = FIXED_HEADER_LEN;
        let ea_end = ea_start + self.extended_attributes.len();
        b[ea_start..ea_end].copy_from_slice(&self.extended_attributes);
        for (i, ad) in self.allocation_descriptors.iter().enumerate() {
            let off = ea_end + i * ShortAllocationDescriptor::SIZE;
            ad.write(&mut b[off..off + ShortAllocationDescriptor::SIZE]);
        }
        b
    }

    fn reseal(&mut self) {
        let body = self.body();
        let tag_location = self.location.relative_to(self.start_extent);
        self.tag = tag::seal(
            FILE_ENTRY_TAG_IDENTIFIER,
            2,
            tag_location,
            &body,
            CRC_LENGTH,
        );
    }

    pub fn parse(bytes: &[u8], extent: u32, start_extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + FIXED_HEADER_LEN {
            return Err(UdfError::InvalidFormat(
                "file entry buffer too small for fixed header".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != FILE_ENTRY_TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected file entry tag {}, got {}",
                FILE_ENTRY_TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }

        let header = &bytes[16..16 + FIXED_HEADER_LEN];
        let len_extended_attrs =
            u32::from_le_bytes([header[152], header[153], header[154], header[155]]) as usize;
        let len_alloc_descs =
            u32::from_le_bytes([header[156], header[157], header[158], header[159]]) as usize;

        // The source this was translated from used true division here
        // (`len_alloc_descs / 8`), silently truncating a malformed
        // trailing partial descriptor; this rejects it instead.
        if len_alloc_descs % ShortAllocationDescriptor::SIZE != 0 {
            return Err(UdfError::InvalidFormat(format!(
                "file entry len_alloc_descs {} is not a multiple of {}",
                len_alloc_descs,
                ShortAllocationDescriptor::SIZE
            )));
        }
        let num_alloc_descs = len_alloc_descs / ShortAllocationDescriptor::SIZE;

        let body_len = FIXED_HEADER_LEN + len_extended_attrs + len_alloc_descs;
        if bytes.len() < DescriptorTag::SIZE + body_len {
            return Err(UdfError::InvalidFormat(
                "file entry buffer too small for declared EA/allocation descriptor lengths"
                    .to_string(),
            ));
        }
        let body = &bytes[16..16 + body_len];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;

        if header[34] != 0 || header[35] != 0 || u32::from_le_bytes([header[36], header[37], header[38], header[39]]) != 0 {
            return Err(UdfError::InvalidFormat(
                "file entry record_format/record_display_attributes/record_length must be zero"
                    .to_string(),
            ));
        }
        let checkpoint = u32::from_le_bytes([header[92], header[93], header[94], header[95]]);
        if checkpoint != REQUIRED_CHECKPOINT {
            return Err(UdfError::InvalidFormat(format!(
                "file entry checkpoint {} is not 1",
                checkpoint
            )));
        }

        let icb_tag = ICBTag::read(&header[0..20]);
        icb_tag.validate()?;

        let ea_start = FIXED_HEADER_LEN;
        let ea_end = ea_start + len_extended_attrs;
        let extended_attributes = body[ea_start..ea_end].to_vec();
        let mut allocation_descriptors = Vec::with_capacity(num_alloc_descs);
        for i in 0..num_alloc_descs {
            let off = ea_end + i * ShortAllocationDescriptor::SIZE;
            allocation_descriptors.push(ShortAllocationDescriptor::read(
                &body[off..off + ShortAllocationDescriptor::SIZE],
            ));
        }

        Ok(Self {
            tag: parsed_tag,
            icb_tag,
            uid: u32::from_le_bytes([header[20], header[21], header[22], header[23]]),
            gid: u32::from_le_bytes([header[24], header[25], header[26], header[27]]),
            permissions: u32::from_le_bytes([header[28], header[29], header[30], header[31]]),
            file_link_count: u16::from_le_bytes([header[32], header[33]]),
            information_length: u64::from_le_bytes(header[40..48].try_into().unwrap()),
            logical_blocks_recorded: u64::from_le_bytes(header[48..56].try_into().unwrap()),
            access_date_and_time: Timestamp::read(&header[56..68]),
            modification_date_and_time: Timestamp::read(&header[68..80]),
            attribute_date_and_time: Timestamp::read(&header[80..92]),
            extended_attribute_icb: LongAd::read(&header[96..112]),
            implementation_identifier: EntityID::read(&header[112..144]),
            unique_id: u64::from_le_bytes(header[144..152].try_into().unwrap()),
            extended_attributes,
            allocation_descriptors,
            location: ExtentLocation::new(extent),
            start_extent,
        })
    }

    pub fn record(&self) -> Vec<u8> {
        let body = self.body();
        let mut out = vec![0u8; DescriptorTag::SIZE + body.len()];
        self.tag.write(&mut out[0..16]);
        out[16..].copy_from_slice(&body);
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

/// Indirect Entry (tag 259): ICBTag plus a single LongAd pointing at
/// the next ICB in a relocation/virtual-ICB chain. ECMA-167 4/14.7.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectEntry {
    pub tag: DescriptorTag,
    pub icb_tag: ICBTag,
    pub indirect_icb: LongAd,
    location: ExtentLocation,
    start_extent: u32,
}

const INDIRECT_BODY_LEN: usize = 20 + LongAd::SIZE;

impl IndirectEntry {
    pub fn new(extent: u32, start_extent: u32, icb_tag: ICBTag, indirect_icb: LongAd) -> Self {
        let mut entry = Self {
            tag: DescriptorTag::default(),
            icb_tag,
            indirect_icb,
            location: ExtentLocation::new(extent),
            start_extent,
        };
        entry.reseal();
        entry
    }

    fn body(&self) -> Vec<u8> {
        let mut b = vec![0u8; INDIRECT_BODY_LEN];
        self.icb_tag.write(&mut b[0..20]);
        self.indirect_icb.write(&mut b[20..20 + LongAd::SIZE]);
        b
    }

    fn reseal(&mut self) {
        let body = self.body();
        let tag_location = self.location.relative_to(self.start_extent);
        self.tag = tag::seal(
            INDIRECT_ENTRY_TAG_IDENTIFIER,
            2,
            tag_location,
            &body,
            INDIRECT_BODY_LEN,
        );
    }

    pub fn parse(bytes: &[u8], extent: u32, start_extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + INDIRECT_BODY_LEN {
            return Err(UdfError::InvalidFormat(
                "indirect entry buffer too small".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != INDIRECT_ENTRY_TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected indirect entry tag {}, got {}",
                INDIRECT_ENTRY_TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }
        let body = &bytes[16..16 + INDIRECT_BODY_LEN];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;
        let icb_tag = ICBTag::read(&body[0..20]);
        icb_tag.validate()?;

        Ok(Self {
            tag: parsed_tag,
            icb_tag,
            indirect_icb: LongAd::read(&body[20..20 + LongAd::SIZE]),
            location: ExtentLocation::new(extent),
            start_extent,
        })
    }

    pub fn record(&self) -> Vec<u8> {
        let mut out = vec![0u8; DescriptorTag::SIZE + INDIRECT_BODY_LEN];
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

/// Terminal Entry (tag 260): just an ICBTag, marking the end of an
/// indirect-ICB chain. ECMA-167 4/14.8.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalEntry {
    pub tag: DescriptorTag,
    pub icb_tag: ICBTag,
    location: ExtentLocation,
    start_extent: u32,
}

const TERMINAL_BODY_LEN: usize = 20;

impl TerminalEntry {
    pub fn new(extent: u32, start_extent: u32, icb_tag: ICBTag) -> Self {
        let mut entry = Self {
            tag: DescriptorTag::default(),
            icb_tag,
            location: ExtentLocation::new(extent),
            start_extent,
        };
        entry.reseal();
        entry
    }

    fn body(&self) -> Vec<u8> {
        let mut b = vec![0u8; TERMINAL_BODY_LEN];
        self.icb_tag.write(&mut b[0..20]);
        b
    }

    fn reseal(&mut self) {
        let body = self.body();
        let tag_location = self.location.relative_to(self.start_extent);
        self.tag = tag::seal(
            TERMINAL_ENTRY_TAG_IDENTIFIER,
            2,
            tag_location,
            &body,
            TERMINAL_BODY_LEN,
        );
    }

    pub fn parse(bytes: &[u8], extent: u32, start_extent: u32) -> Result<Self> {
        if bytes.len() < DescriptorTag::SIZE + TERMINAL_BODY_LEN {
            return Err(UdfError::InvalidFormat(
                "terminal entry buffer too small".to_string(),
            ));
        }
        let parsed_tag = DescriptorTag::read(&bytes[0..16]);
        if parsed_tag.tag_identifier != TERMINAL_ENTRY_TAG_IDENTIFIER {
            return Err(UdfError::InvalidFormat(format!(
                "expected terminal entry tag {}, got {}",
                TERMINAL_ENTRY_TAG_IDENTIFIER, parsed_tag.tag_identifier
            )));
        }
        let body = &bytes[16..16 + TERMINAL_BODY_LEN];
        tag::verify(&parsed_tag, &bytes[0..16], body)?;
        let icb_tag = ICBTag::read(&body[0..20]);
        icb_tag.validate()?;

        Ok(Self {
            tag: parsed_tag,
            icb_tag,
            location: ExtentLocation::new(extent),
            start_extent,
        })
    }

    pub fn record(&self) -> Vec<u8> {
        let mut out = vec![0u8; DescriptorTag::SIZE + TERMINAL_BODY_LEN];
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

    fn sample_icb_tag(file_type: u8) -> ICBTag {
        ICBTag {
            strategy_type: 4,
            file_type,
            flags: 0,
            ..Default::default()
        }
    }

    fn sample_file_entry() -> FileEntry {
        FileEntry::new(
            280,
            272,
            sample_icb_tag(5),
            0,
            0,
            0o644,
            1,
            4096,
            2,
            Timestamp::default(),
            Timestamp::default(),
            EntityID::new(b"*my impl", b"").unwrap(),
            7,
            vec![ShortAllocationDescriptor {
                extent_length_and_type: 4096,
                extent_location: 10,
            }],
        )
    }

    #[test]
    fn test_roundtrip() {
        let fe = sample_file_entry();
        assert_eq!(fe.tag.descriptor_crc_length, CRC_LENGTH as u16);
        let bytes = fe.record();
        let parsed = FileEntry::parse(&bytes, 280, 272).unwrap();
        assert_eq!(parsed.information_length, 4096);
        assert_eq!(parsed.allocation_descriptors.len(), 1);
        assert_eq!(parsed.allocation_descriptors[0].extent_location, 10);
        assert_eq!(parsed.tag.tag_location, 8);
    }

    #[test]
    fn test_misaligned_alloc_descriptor_length_rejected() {
        let fe = sample_file_entry();
        let mut bytes = fe.record();
        // Corrupt len_alloc_descs to a non-multiple of 8; the source's
        // true-division read would have silently accepted this.
        bytes[16 + 156..16 + 160].copy_from_slice(&5u32.to_le_bytes());
        assert!(FileEntry::parse(&bytes, 280, 272).is_err());
    }

    #[test]
    fn test_bad_checkpoint_rejected() {
        let mut fe = sample_file_entry();
        let mut body = fe.body();
        body[92..96].copy_from_slice(&0u32.to_le_bytes());
        let tag_location = fe.location.relative_to(fe.start_extent);
        fe.tag = tag::seal(FILE_ENTRY_TAG_IDENTIFIER, 2, tag_location, &body, CRC_LENGTH);
        let mut bytes = vec![0u8; DescriptorTag::SIZE + body.len()];
        fe.tag.write(&mut bytes[0..16]);
        bytes[16..].copy_from_slice(&body);
        assert!(FileEntry::parse(&bytes, 280, 272).is_err());
    }

    #[test]
    fn test_parse_accepts_real_160_byte_fixed_boundary() {
        // Built from hardcoded offsets (not `FIXED_HEADER_LEN`/`body()`)
        // to pin the real on-disk boundary: icb_tag(20) + uid(4) + gid(4)
        // + permissions(4) + file_link_count(2) + record_format(1) +
        // record_display_attributes(1) + record_length(4) +
        // information_length(8) + logical_blocks_recorded(8) +
        // access/modification/attribute timestamps(12 each=36) +
        // checkpoint(4) + extended_attribute_icb(16) +
        // implementation_identifier(32) + unique_id(8) + len_ea(4) +
        // len_ads(4) = 160, with EA data starting immediately at 160 —
        // no 16-byte gap before it, matching the teacher's `udf.rs` and
        // pycdlib's `UDFFileEntry.FMT`.
        let len_ea: u32 = 8;
        let len_ads: u32 = ShortAllocationDescriptor::SIZE as u32;
        let mut body = vec![0u8; 160 + len_ea as usize + len_ads as usize];
        let icb_tag = sample_icb_tag(5);
        icb_tag.write(&mut body[0..20]);
        body[40..48].copy_from_slice(&4096u64.to_le_bytes()); // information_length
        body[48..56].copy_from_slice(&2u64.to_le_bytes()); // logical_blocks_recorded
        body[92..96].copy_from_slice(&REQUIRED_CHECKPOINT.to_le_bytes());
        EntityID::new(b"*my impl", b"")
            .unwrap()
            .write(&mut body[112..144]);
        body[144..152].copy_from_slice(&7u64.to_le_bytes()); // unique_id
        body[152..156].copy_from_slice(&len_ea.to_le_bytes());
        body[156..160].copy_from_slice(&len_ads.to_le_bytes());
        let ea_bytes = [0xAAu8; 8];
        body[160..168].copy_from_slice(&ea_bytes);
        let ad = ShortAllocationDescriptor {
            extent_length_and_type: 4096,
            extent_location: 10,
        };
        ad.write(&mut body[168..168 + ShortAllocationDescriptor::SIZE]);

        let tag = tag::seal(FILE_ENTRY_TAG_IDENTIFIER, 2, 8, &body, CRC_LENGTH);
        let mut bytes = vec![0u8; DescriptorTag::SIZE + body.len()];
        tag.write(&mut bytes[0..16]);
        bytes[16..].copy_from_slice(&body);

        let parsed = FileEntry::parse(&bytes, 280, 272).unwrap();
        assert_eq!(parsed.extended_attributes, ea_bytes.to_vec());
        assert_eq!(parsed.allocation_descriptors.len(), 1);
        assert_eq!(parsed.allocation_descriptors[0].extent_location, 10);
    }

    #[test]
    fn test_indirect_and_terminal_entry_roundtrip() {
        let indirect = IndirectEntry::new(
            300,
            272,
            sample_icb_tag(3),
            LongAd {
                extent_length_and_type: 2048,
                extent_location: LbAddr {
                    logical_block_number: 40,
                    partition_reference_number: 0,
                },
                implementation_use: [0; 6],
            },
        );
        let bytes = indirect.record();
        let parsed = IndirectEntry::parse(&bytes, 300, 272).unwrap();
        assert_eq!(parsed.indirect_icb.extent_location.logical_block_number, 40);

        let terminal = TerminalEntry::new(301, 272, sample_icb_tag(11));
        let bytes = terminal.record();
        let parsed = TerminalEntry::parse(&bytes, 301, 272).unwrap();
        assert_eq!(parsed.icb_tag.file_type(), crate::icb_tag::FileType::TerminalEntry);
    }
}
