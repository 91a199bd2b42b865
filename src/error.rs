//! Error types for the timestamp proof engine

use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Maximum recursion depth when decoding a timestamp tree
pub const RECURSION_LIMIT: usize = 256;

/// Maximum length of a pending attestation URI
pub const MAX_URI_LEN: usize = 1000;

/// Maximum length of an operation payload (append/prepend data)
pub const MAX_OP_LENGTH: usize = 4096;

/// Errors that can occur while building, merging, or (de)serializing a timestamp proof
#[derive(Error, Debug)]
pub enum OtsError {
    /// A child's message disagrees with `op(parent.msg)`, or a merge was attempted
    /// between two timestamps with different root messages
    #[error("message mismatch: child message does not match the declared operation's output")]
    MessageMismatch,

    /// Attempted to serialize a node with no attestations and no operations
    #[error("timestamp has no attestations and no operations, nothing to serialize")]
    EmptyTimestamp,

    /// Detached-file header does not equal `HEADER_MAGIC`
    #[error("bad magic bytes, this doesn't look like a timestamp file: {0:?}")]
    BadMagic(Vec<u8>),

    /// Decoder ran out of bytes before the grammar was satisfied
    #[error("truncated input: ran out of bytes while decoding")]
    Truncated,

    /// Operation or attestation tag not in the registry
    #[error("unrecognized tag: 0x{0:02x}")]
    UnknownTag(u8),

    /// A length-prefixed field's length fell outside its declared bounds
    #[error("length {val} is out of range (expected {min}-{max} inclusive)")]
    LengthOutOfRange {
        /// Minimum allowed length, inclusive
        min: usize,
        /// Maximum allowed length, inclusive
        max: usize,
        /// The length actually read
        val: usize,
    },

    /// Merkle aggregation was invoked on an empty list of timestamps
    #[error("cannot build a merkle tree from an empty list of timestamps")]
    EmptyMerkleInput,

    /// Recursion limit exceeded while decoding
    #[error("recursion limit of {RECURSION_LIMIT} exceeded while decoding")]
    StackOverflow,

    /// Invalid character in a pending attestation URI
    #[error("invalid character '{0}' in attestation URI")]
    InvalidUriChar(char),

    /// Unexpected data after the end of a decoded timestamp
    #[error("unexpected trailing bytes after end of timestamp")]
    TrailingBytes,

    /// UTF-8 decoding error (pending attestation URIs are required to be valid UTF-8)
    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// Underlying I/O error from the injected byte stream
    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for OtsError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(e)
        }
    }
}

/// Result type alias for this crate's fallible operations
pub type Result<T> = std::result::Result<T, OtsError>;
