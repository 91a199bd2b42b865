//! Operations: deterministic, pure byte-to-byte transforms identified by a tag byte
//!
//! Two kinds matter structurally: unary crypto ops (`HashOp`) that take a message and
//! return a digest, and prepared ops (`Append`/`Prepend`) that carry a fixed payload.

use std::fmt;
use std::io::{Read, Write};

use bitcoin_hashes::{ripemd160, sha1, sha256, Hash};

use super::error::{OtsError, Result, MAX_OP_LENGTH};
use super::ser::{Deserializer, Serializer};

/// A unary cryptographic hash operation
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum HashOp {
    /// SHA-1 (20-byte digest)
    Sha1,
    /// SHA-256 (32-byte digest)
    Sha256,
    /// RIPEMD-160 (20-byte digest)
    Ripemd160,
}

impl HashOp {
    /// Returns the 8-bit tag identifying this hash op in binary format
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Sha1 => 0x02,
            Self::Ripemd160 => 0x03,
            Self::Sha256 => 0x08,
        }
    }

    /// Builds a `HashOp` from its tag byte
    ///
    /// # Errors
    ///
    /// Returns `OtsError::UnknownTag` if the tag is not a recognized hash op
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0x02 => Ok(Self::Sha1),
            0x03 => Ok(Self::Ripemd160),
            0x08 => Ok(Self::Sha256),
            x => Err(OtsError::UnknownTag(x)),
        }
    }

    /// Length in bytes of this hash's digest
    #[must_use]
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha1 | Self::Ripemd160 => 20,
            Self::Sha256 => 32,
        }
    }

    /// Applies the hash to `input`
    #[must_use]
    pub fn apply(self, input: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => sha1::Hash::hash(input).to_byte_array().to_vec(),
            Self::Sha256 => sha256::Hash::hash(input).to_byte_array().to_vec(),
            Self::Ripemd160 => ripemd160::Hash::hash(input).to_byte_array().to_vec(),
        }
    }
}

impl fmt::Display for HashOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => f.write_str("SHA1"),
            Self::Sha256 => f.write_str("SHA256"),
            Self::Ripemd160 => f.write_str("RIPEMD160"),
        }
    }
}

/// A deterministic bytes-to-bytes operation forming an edge in a timestamp tree
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Op {
    /// A unary cryptographic hash
    Hash(HashOp),
    /// Convert bytes to their hexadecimal string representation
    Hexlify,
    /// Reverse byte order
    Reverse,
    /// Append a fixed payload to the input
    Append(Vec<u8>),
    /// Prepend a fixed payload to the input
    Prepend(Vec<u8>),
}

impl Op {
    /// Returns the 8-bit tag identifying this op in binary format
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Self::Hash(h) => h.tag(),
            Self::Hexlify => 0xf3,
            Self::Reverse => 0xf2,
            Self::Append(_) => 0xf0,
            Self::Prepend(_) => 0xf1,
        }
    }

    fn payload(&self) -> &[u8] {
        match self {
            Self::Append(data) | Self::Prepend(data) => data,
            _ => &[],
        }
    }

    /// Applies the operation to `input`, producing the transformed bytes
    #[must_use]
    pub fn apply(&self, input: &[u8]) -> Vec<u8> {
        match self {
            Self::Hash(h) => h.apply(input),
            Self::Hexlify => hex::encode(input).into_bytes(),
            Self::Reverse => input.iter().copied().rev().collect(),
            Self::Append(data) => {
                let mut out = input.to_vec();
                out.extend_from_slice(data);
                out
            }
            Self::Prepend(data) => {
                let mut out = data.clone();
                out.extend_from_slice(input);
                out
            }
        }
    }

    /// Deserializes an op whose tag byte has already been consumed
    ///
    /// # Errors
    ///
    /// Returns `OtsError::UnknownTag` if the tag is not recognized, or a decode error
    /// from reading the payload
    pub fn deserialize_with_tag<R: Read>(deser: &mut Deserializer<R>, tag: u8) -> Result<Self> {
        match tag {
            0x02 | 0x03 | 0x08 => Ok(Self::Hash(HashOp::from_tag(tag)?)),
            0xf3 => Ok(Self::Hexlify),
            0xf2 => Ok(Self::Reverse),
            0xf0 => Ok(Self::Append(deser.read_varbytes(0, MAX_OP_LENGTH)?)),
            0xf1 => Ok(Self::Prepend(deser.read_varbytes(0, MAX_OP_LENGTH)?)),
            x => Err(OtsError::UnknownTag(x)),
        }
    }

    /// Serializes the op's tag and, for append/prepend, its length-prefixed payload
    ///
    /// # Errors
    ///
    /// Returns an error if the write operation fails
    pub fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        ser.write_byte(self.tag())?;
        match self {
            Self::Append(data) | Self::Prepend(data) => ser.write_varbytes(data),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash(h) => write!(f, "{h}()"),
            Self::Hexlify => f.write_str("Hexlify()"),
            Self::Reverse => f.write_str("Reverse()"),
            Self::Append(data) => write!(f, "Append({})", hex::encode(data)),
            Self::Prepend(data) => write!(f, "Prepend({})", hex::encode(data)),
        }
    }
}

// Canonical order for serialization: tag byte first, then payload bytes. This keeps sorted
// attestation/op collections deterministic regardless of insertion order, which the codec
// depends on for byte-identical output across implementations.
impl PartialOrd for Op {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Op {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.tag(), self.payload()).cmp(&(other.tag(), other.payload()))
    }
}
