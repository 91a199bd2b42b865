//! The detached timestamp file envelope: a fixed magic header wrapping a file digest,
//! the hash operation used to produce it, and the digest's timestamp proof

use std::fmt;
use std::io::{Read, Write};

use super::error::{OtsError, Result};
use super::op::HashOp;
use super::ser::{Deserializer, Serializer};
use super::timestamp::Timestamp;

/// Fixed header every detached timestamp file begins with:
/// NUL "OpenTimestamps" NUL NUL "Proof" NUL + 8 magic bytes + NUL
pub const HEADER_MAGIC: [u8; 32] = [
    0x00, 0x4f, 0x70, 0x65, 0x6e, 0x54, 0x69, 0x6d, 0x65, 0x73, 0x74, 0x61, 0x6d, 0x70, 0x73, 0x00,
    0x00, 0x50, 0x72, 0x6f, 0x6f, 0x66, 0x00, 0xbf, 0x89, 0xe2, 0xe8, 0x84, 0xe8, 0x92, 0x94, 0x00,
];

/// Minimum allowed length, in bytes, of the file digest
pub const MIN_FILE_DIGEST_LENGTH: usize = 20;

/// Maximum allowed length, in bytes, of the file digest
pub const MAX_FILE_DIGEST_LENGTH: usize = 32;

/// A stand-alone envelope containing a file's digest and its timestamp proof
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DetachedTimestampFile {
    /// The hash function claimed to have produced the document digest
    pub file_hash_op: HashOp,
    /// The timestamp proof over that digest
    pub timestamp: Timestamp,
}

impl DetachedTimestampFile {
    /// Deserializes a detached timestamp file from a reader
    ///
    /// # Errors
    ///
    /// Returns `OtsError::BadMagic` if the header doesn't match, `OtsError::LengthOutOfRange`
    /// if the digest length falls outside `[20, 32]`, `OtsError::TrailingBytes` if data
    /// remains after the timestamp, or any other decode error from its components
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut deser = Deserializer::new(reader);

        let magic = deser.read_bytes(HEADER_MAGIC.len())?;
        if magic != HEADER_MAGIC {
            return Err(OtsError::BadMagic(magic));
        }

        let digest = deser.read_varbytes(MIN_FILE_DIGEST_LENGTH, MAX_FILE_DIGEST_LENGTH)?;
        let file_hash_op = HashOp::from_tag(deser.read_byte()?)?;
        let timestamp = Timestamp::deserialize(&mut deser, digest)?;

        deser.check_eof()?;

        Ok(Self { file_hash_op, timestamp })
    }

    /// Serializes the envelope into a writer
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails, or `OtsError::EmptyTimestamp` if the proof
    /// is vacuous
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut ser = Serializer::new(writer);
        ser.write_bytes(&HEADER_MAGIC)?;
        ser.write_varbytes(self.timestamp.msg())?;
        ser.write_byte(self.file_hash_op.tag())?;
        self.timestamp.serialize(&mut ser)
    }
}

impl fmt::Display for DetachedTimestampFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} digest of some data.", self.file_hash_op)?;
        write!(f, "{}", self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::Attestation;

    #[test]
    fn header_magic_is_32_bytes() {
        assert_eq!(HEADER_MAGIC.len(), 32);
    }

    fn sample() -> DetachedTimestampFile {
        let mut ts = Timestamp::new(vec![0xaa; 32]);
        ts.add_attestation(Attestation::Bitcoin { height: 500_000 });
        DetachedTimestampFile { file_hash_op: HashOp::Sha256, timestamp: ts }
    }

    #[test]
    fn round_trip() {
        let file = sample();
        let mut buf = Vec::new();
        file.to_writer(&mut buf).unwrap();
        let decoded = DetachedTimestampFile::from_reader(&buf[..]).unwrap();
        assert_eq!(file, decoded);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut buf = vec![0u8; HEADER_MAGIC.len()];
        buf[0] = 0xff;
        let result = DetachedTimestampFile::from_reader(&buf[..]);
        assert!(matches!(result, Err(OtsError::BadMagic(_))));
    }

    #[test]
    fn digest_length_out_of_range_is_rejected() {
        let mut buf = Vec::new();
        let mut ser = Serializer::new(&mut buf);
        ser.write_bytes(&HEADER_MAGIC).unwrap();
        ser.write_varbytes(&[0u8; 10]).unwrap();

        let result = DetachedTimestampFile::from_reader(&buf[..]);
        assert!(matches!(
            result,
            Err(OtsError::LengthOutOfRange { min: MIN_FILE_DIGEST_LENGTH, max: MAX_FILE_DIGEST_LENGTH, val: 10 })
        ));
    }

    #[test]
    fn trailing_bytes_after_timestamp_are_rejected() {
        let file = sample();
        let mut buf = Vec::new();
        file.to_writer(&mut buf).unwrap();
        buf.push(0xff);
        let result = DetachedTimestampFile::from_reader(&buf[..]);
        assert!(matches!(result, Err(OtsError::TrailingBytes)));
    }

    #[test]
    fn display_mentions_hash_op_and_attestation() {
        let text = format!("{}", sample());
        assert!(text.contains("SHA256 digest"));
        assert!(text.contains("Bitcoin block 500000"));
    }
}
