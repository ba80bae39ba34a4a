use thiserror::Error;

/// The three error kinds the codec can produce, distinguished by origin.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UdfError {
    /// The input bytes violate the on-disk format: wrong magic, wrong
    /// version, wrong tag identifier, out-of-range date fields,
    /// checksum/CRC mismatch, non-zero reserved bytes, or a read-only
    /// profile constant not met.
    #[error("invalid UDF descriptor format: {0}")]
    InvalidFormat(String),
    /// A constructor argument cannot be encoded (e.g. an identifier
    /// longer than its fixed field).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A programmer contract was violated: a CRC buffer shorter than
    /// the tag's declared `descriptor_crc_length`, or a similar
    /// precondition callers are expected to uphold.
    #[error("internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, UdfError>;
