//! Attestations: leaf values binding a message to external time evidence

use std::fmt;
use std::io::{Read, Write};

use super::error::{OtsError, Result, MAX_URI_LEN};
use super::ser::{Deserializer, Serializer};

/// Size in bytes of the tag identifying an attestation's type
pub const TAG_SIZE: usize = 8;

/// Tag magic for a Bitcoin blockheight attestation
pub const BITCOIN_TAG: &[u8] = b"\x05\x88\x96\x0d\x73\xd7\x19\x01";

/// Tag magic for a pending (calendar) attestation
pub const PENDING_TAG: &[u8] = b"\x83\xdf\xe3\x0d\x2e\xf9\x0c\x8e";

/// A claim that some data existed at some time, verifiable against an external time source
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Attestation {
    /// Attested by inclusion in a Bitcoin block at the given height
    Bitcoin {
        /// Bitcoin block height
        height: usize,
    },
    /// Attested by a calendar server that promises to keep the commitment forever
    Pending {
        /// URI where the attestation can be upgraded
        uri: String,
    },
    /// An attestation type not in the registry, preserved as opaque bytes
    Unknown {
        /// The 8-byte type tag
        tag: Vec<u8>,
        /// The raw attestation payload
        data: Vec<u8>,
    },
}

impl Attestation {
    fn tag_bytes(&self) -> &[u8] {
        match self {
            Self::Bitcoin { .. } => BITCOIN_TAG,
            Self::Pending { .. } => PENDING_TAG,
            Self::Unknown { tag, .. } => tag,
        }
    }

    fn payload_bytes(&self) -> Vec<u8> {
        match self {
            Self::Bitcoin { height } => height.to_be_bytes().to_vec(),
            Self::Pending { uri } => uri.clone().into_bytes(),
            Self::Unknown { data, .. } => data.clone(),
        }
    }

    /// Deserializes an attestation (the `0x00` kind byte has already been consumed)
    ///
    /// # Errors
    ///
    /// Returns an error if the tag can't be read, the declared length is out of range,
    /// or (for a pending attestation) the URI is not valid UTF-8 or contains a disallowed
    /// character
    pub fn deserialize<R: Read>(deser: &mut Deserializer<R>) -> Result<Self> {
        let tag = deser.read_bytes(TAG_SIZE)?;
        let len = deser.read_uint()?;

        if tag == BITCOIN_TAG {
            let height = deser.read_uint()?;
            Ok(Self::Bitcoin { height })
        } else if tag == PENDING_TAG {
            let uri_bytes = deser.read_varbytes(0, MAX_URI_LEN)?;
            let uri = String::from_utf8(uri_bytes)?;
            for ch in uri.chars() {
                match ch {
                    'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' | '/' | ':' => {}
                    x => return Err(OtsError::InvalidUriChar(x)),
                }
            }
            Ok(Self::Pending { uri })
        } else {
            Ok(Self::Unknown { tag, data: deser.read_bytes(len)? })
        }
    }

    /// Serializes the attestation's tag and length-prefixed payload
    ///
    /// # Errors
    ///
    /// Returns an error if the write operation fails
    pub fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        let mut inner = Serializer::new(Vec::new());
        match self {
            Self::Bitcoin { height } => {
                ser.write_bytes(BITCOIN_TAG)?;
                inner.write_uint(*height)?;
                ser.write_varbytes(&inner.into_inner())
            }
            Self::Pending { uri } => {
                ser.write_bytes(PENDING_TAG)?;
                inner.write_varbytes(uri.as_bytes())?;
                ser.write_varbytes(&inner.into_inner())
            }
            Self::Unknown { tag, data } => {
                ser.write_bytes(tag)?;
                ser.write_varbytes(data)
            }
        }
    }
}

impl fmt::Display for Attestation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitcoin { height } => write!(f, "Bitcoin block {height}"),
            Self::Pending { uri } => write!(f, "Pending: update URI {uri}"),
            Self::Unknown { tag, data } => {
                write!(f, "unknown attestation type {}: {}", hex::encode(tag), hex::encode(data))
            }
        }
    }
}

// A total order is needed so sorted attestation sets serialize to byte-identical output
// across implementations. Tag first, then payload; does not need to match the wire byte
// order exactly, only be stable and deterministic.
impl PartialOrd for Attestation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Attestation {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.tag_bytes(), self.payload_bytes()).cmp(&(other.tag_bytes(), other.payload_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants() {
        assert_eq!(TAG_SIZE, 8);
        assert_eq!(BITCOIN_TAG.len(), 8);
        assert_eq!(PENDING_TAG.len(), 8);
    }

    #[test]
    fn display_variants() {
        assert_eq!(format!("{}", Attestation::Bitcoin { height: 123 }), "Bitcoin block 123");
        assert_eq!(
            format!("{}", Attestation::Pending { uri: "https://x.example".into() }),
            "Pending: update URI https://x.example"
        );
        let unknown = Attestation::Unknown { tag: vec![0xaa; 8], data: vec![0xbb] };
        assert!(format!("{unknown}").starts_with("unknown attestation type"));
    }

    #[test]
    fn serialize_deserialize_bitcoin() {
        let att = Attestation::Bitcoin { height: 654_321 };
        let mut buf = Vec::new();
        att.serialize(&mut Serializer::new(&mut buf)).unwrap();
        let mut deser = Deserializer::new(&buf[..]);
        assert_eq!(Attestation::deserialize(&mut deser).unwrap(), att);
    }

    #[test]
    fn serialize_deserialize_pending() {
        let att = Attestation::Pending { uri: "https://alice.btc.calendar.example.org".into() };
        let mut buf = Vec::new();
        att.serialize(&mut Serializer::new(&mut buf)).unwrap();
        let mut deser = Deserializer::new(&buf[..]);
        assert_eq!(Attestation::deserialize(&mut deser).unwrap(), att);
    }

    #[test]
    fn serialize_deserialize_unknown() {
        let att = Attestation::Unknown { tag: vec![1, 2, 3, 4, 5, 6, 7, 8], data: vec![0xaa, 0xbb] };
        let mut buf = Vec::new();
        att.serialize(&mut Serializer::new(&mut buf)).unwrap();
        let mut deser = Deserializer::new(&buf[..]);
        assert_eq!(Attestation::deserialize(&mut deser).unwrap(), att);
    }

    #[test]
    fn invalid_uri_char_rejected() {
        let mut buf = Vec::new();
        let mut ser = Serializer::new(&mut buf);
        ser.write_bytes(PENDING_TAG).unwrap();
        let mut inner = Serializer::new(Vec::new());
        inner.write_varbytes(b"https://x.example/$bad").unwrap();
        ser.write_varbytes(&inner.into_inner()).unwrap();

        let mut deser = Deserializer::new(&buf[..]);
        let result = Attestation::deserialize(&mut deser);
        assert!(matches!(result, Err(OtsError::InvalidUriChar('$'))));
    }

    #[test]
    fn ordering_is_total_and_deterministic() {
        let mut atts = vec![
            Attestation::Bitcoin { height: 2 },
            Attestation::Pending { uri: "https://a".into() },
            Attestation::Bitcoin { height: 1 },
        ];
        atts.sort();
        assert_eq!(
            atts,
            vec![
                Attestation::Bitcoin { height: 1 },
                Attestation::Bitcoin { height: 2 },
                Attestation::Pending { uri: "https://a".into() },
            ]
        );
    }
}
