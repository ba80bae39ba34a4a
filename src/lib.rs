//! UDF (ECMA-167 / OSTA UDF 2.01) descriptor codec for read-only
//! optical media: typed encode/decode for the volume recognition area,
//! the Volume Descriptor Sequence, and the file-set/directory layer,
//! plus the checksum/CRC and relocation machinery that ties them
//! together.

pub mod alloc;
pub mod charspec;
pub mod crc;
pub mod entity_id;
pub mod error;
pub mod file_entry;
pub mod file_identifier;
pub mod fileset;
pub mod icb_tag;
pub mod partition_map;
pub mod primitive;
pub mod random;
pub mod recognition;
pub mod tag;
pub mod timestamp;
pub mod vds;

pub use error::{Result, UdfError};
