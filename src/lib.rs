//! Construct, merge, serialize and Merkle-aggregate `OpenTimestamps` proofs
//!
//! A timestamp proof is a tree: a message, the set of attestations claiming to place
//! that message in time, and a map of further operations applied to the message, each
//! leading to a child timestamp over the transformed bytes. [`timestamp::Timestamp`] is
//! that tree; [`file::DetachedTimestampFile`] is the on-disk envelope around one;
//! [`merkle::make_merkle_tree`] aggregates many independent timestamps under a single
//! root by repeated pairwise SHA-256 concatenation.

pub mod attestation;
pub mod error;
pub mod file;
pub mod merkle;
pub mod op;
pub mod ser;
pub mod timestamp;

pub use attestation::Attestation;
pub use error::{OtsError, Result};
pub use file::DetachedTimestampFile;
pub use merkle::{cat_sha256, cat_sha256d, cat_then_unary_op, make_merkle_tree};
pub use op::{HashOp, Op};
pub use ser::{Deserializer, Serializer};
pub use timestamp::{OpSet, Timestamp};
