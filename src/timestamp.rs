//! The operation map and timestamp tree node

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{Read, Write};

use super::attestation::Attestation;
use super::error::{OtsError, Result, RECURSION_LIMIT};
use super::op::Op;
use super::ser::{Deserializer, Serializer};

/// A mapping from distinct operations (at a given node) to their child timestamps
///
/// Every entry satisfies `child.msg == op.apply(parent.msg)`; the map itself has no notion
/// of "parent", so callers pass the parent message in explicitly to each mutating call.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct OpSet(BTreeMap<Op, Timestamp>);

impl OpSet {
    /// An empty operation map
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the existing child for `op` if present, otherwise creates one with
    /// `msg = op.apply(parent_msg)`, inserts it, and returns it. Never fails.
    pub fn add(&mut self, parent_msg: &[u8], op: Op) -> &mut Timestamp {
        let child_msg = op.apply(parent_msg);
        self.0.entry(op).or_insert_with(|| Timestamp::new(child_msg))
    }

    /// Inserts or replaces the child for `op`
    ///
    /// If no entry exists, `child` is inserted outright. If an entry exists whose message
    /// matches `child`'s, it is replaced. Otherwise this fails: the caller is trying to bind
    /// the same operation to two children with different messages.
    ///
    /// # Errors
    ///
    /// Returns `OtsError::MessageMismatch` if an existing, disagreeing entry is present
    pub fn set(&mut self, op: Op, child: Timestamp) -> Result<()> {
        if let Some(existing) = self.0.get(&op) {
            if existing.msg != child.msg {
                return Err(OtsError::MessageMismatch);
            }
        }
        self.0.insert(op, child);
        Ok(())
    }

    /// Inserts a child without checking message consistency
    ///
    /// Used internally by `merge` and the decoder, where the child message was already
    /// derived from (or validated against) the parent, so the invariant holds by construction.
    pub(crate) fn insert_raw(&mut self, op: Op, child: Timestamp) {
        self.0.insert(op, child);
    }

    /// Looks up the child for `op`
    #[must_use]
    pub fn get(&self, op: &Op) -> Option<&Timestamp> {
        self.0.get(op)
    }

    /// Mutably looks up the child for `op`
    pub fn get_mut(&mut self, op: &Op) -> Option<&mut Timestamp> {
        self.0.get_mut(op)
    }

    /// Iterates `(op, child)` pairs in canonical (sorted) order
    pub fn iter(&self) -> btree_map::Iter<'_, Op, Timestamp> {
        self.0.iter()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for OpSet {
    type Item = (Op, Timestamp);
    type IntoIter = btree_map::IntoIter<Op, Timestamp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A node in a timestamp proof tree: a message, the attestations proving it existed, and
/// the operations leading to its children
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Timestamp {
    msg: Vec<u8>,
    attestations: BTreeSet<Attestation>,
    ops: OpSet,
}

impl Timestamp {
    /// Creates a new, empty timestamp node for `msg`
    #[must_use]
    pub fn new(msg: Vec<u8>) -> Self {
        Self { msg, attestations: BTreeSet::new(), ops: OpSet::new() }
    }

    /// The message (commitment) at this node
    #[must_use]
    pub fn msg(&self) -> &[u8] {
        &self.msg
    }

    /// The attestations proving `msg` existed
    #[must_use]
    pub fn attestations(&self) -> &BTreeSet<Attestation> {
        &self.attestations
    }

    /// The operation map leading to this node's children
    #[must_use]
    pub fn ops(&self) -> &OpSet {
        &self.ops
    }

    /// Mutable access to the operation map
    pub fn ops_mut(&mut self) -> &mut OpSet {
        &mut self.ops
    }

    /// Adds an attestation to this node
    pub fn add_attestation(&mut self, attestation: Attestation) {
        self.attestations.insert(attestation);
    }

    /// Adds (or reuses) a child reached from this node via `op`
    pub fn add_op(&mut self, op: Op) -> &mut Timestamp {
        let msg = self.msg.clone();
        self.ops.add(&msg, op)
    }

    /// Merges `other` into `self`
    ///
    /// Requires `self.msg == other.msg`. Unions the attestation sets, and for every
    /// `(op, child)` in `other.ops`, recursively merges into (or grafts) the corresponding
    /// local child. Idempotent and commutative up to set/map equality.
    ///
    /// # Errors
    ///
    /// Returns `OtsError::MessageMismatch` if the two nodes' messages disagree, or if
    /// recursive merging hits a mismatch deeper in the tree
    pub fn merge(&mut self, other: Timestamp) -> Result<()> {
        if self.msg != other.msg {
            return Err(OtsError::MessageMismatch);
        }
        for attestation in other.attestations {
            self.attestations.insert(attestation);
        }
        for (op, other_child) in other.ops {
            match self.ops.get_mut(&op) {
                Some(child) => child.merge(other_child)?,
                None => self.ops.insert_raw(op, other_child),
            }
        }
        Ok(())
    }

    /// Collects every `(msg, attestation)` pair anywhere in this subtree
    ///
    /// Order is unspecified but deterministic for a given tree (depth-first, canonical
    /// op/attestation order); callers must treat it as a multiset.
    #[must_use]
    pub fn all_attestations(&self) -> Vec<(Vec<u8>, Attestation)> {
        let mut out = Vec::new();
        self.collect_attestations(&mut out);
        out
    }

    fn collect_attestations(&self, out: &mut Vec<(Vec<u8>, Attestation)>) {
        for attestation in &self.attestations {
            out.push((self.msg.clone(), attestation.clone()));
        }
        for (_, child) in self.ops.iter() {
            child.collect_attestations(out);
        }
    }

    fn serialize_node<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        let attestations: Vec<&Attestation> = self.attestations.iter().collect();
        let ops: Vec<(&Op, &Timestamp)> = self.ops.iter().collect();
        let n = attestations.len();
        let m = ops.len();

        if n + m == 0 {
            return Err(OtsError::EmptyTimestamp);
        }

        // non-terminal attestations: all of them if there are ops to follow, else all but
        // the last (the last becomes the terminal item)
        let n_nonterminal = if m > 0 { n } else { n.saturating_sub(1) };
        for attestation in &attestations[..n_nonterminal] {
            ser.write_byte(0xff)?;
            ser.write_byte(0x00)?;
            attestation.serialize(ser)?;
        }

        if m == 0 {
            ser.write_byte(0x00)?;
            attestations[n - 1].serialize(ser)?;
        } else {
            for (op, child) in &ops[..m - 1] {
                ser.write_byte(0xff)?;
                op.serialize(ser)?;
                child.serialize_node(ser)?;
            }
            let (last_op, last_child) = ops[m - 1];
            last_op.serialize(ser)?;
            last_child.serialize_node(ser)?;
        }

        Ok(())
    }

    /// Serializes this timestamp's tree, depth-first, per the canonical grammar
    ///
    /// # Errors
    ///
    /// Returns `OtsError::EmptyTimestamp` if a node with no attestations and no ops is
    /// encountered (a vacuous proof is not serializable)
    pub fn serialize<W: Write>(&self, ser: &mut Serializer<W>) -> Result<()> {
        self.serialize_node(ser)
    }

    fn deserialize_node<R: Read>(
        deser: &mut Deserializer<R>,
        msg: Vec<u8>,
        recursion_budget: usize,
    ) -> Result<Self> {
        if recursion_budget == 0 {
            return Err(OtsError::StackOverflow);
        }

        let mut node = Self::new(msg.clone());
        let mut tag = deser.read_byte()?;

        loop {
            let (kind, terminal) = if tag == 0xff { (deser.read_byte()?, false) } else { (tag, true) };

            if kind == 0x00 {
                node.attestations.insert(Attestation::deserialize(deser)?);
            } else {
                let op = Op::deserialize_with_tag(deser, kind)?;
                let child_msg = op.apply(&msg);
                let child = Self::deserialize_node(deser, child_msg, recursion_budget - 1)?;
                node.ops.insert_raw(op, child);
            }

            if terminal {
                break;
            }
            tag = deser.read_byte()?;
        }

        Ok(node)
    }

    /// Deserializes a timestamp tree rooted at `msg`
    ///
    /// # Errors
    ///
    /// Returns `OtsError::StackOverflow` if the tree is nested deeper than
    /// [`RECURSION_LIMIT`], or any decode error surfaced from a child component
    pub fn deserialize<R: Read>(deser: &mut Deserializer<R>, msg: Vec<u8>) -> Result<Self> {
        Self::deserialize_node(deser, msg, RECURSION_LIMIT)
    }
}

fn fmt_recurse(ts: &Timestamp, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            f.write_str("    ")?;
        }
        Ok(())
    }

    for attestation in ts.attestations() {
        indent(f, depth)?;
        writeln!(f, "verify {attestation}")?;
    }
    for (op, child) in ts.ops().iter() {
        indent(f, depth)?;
        writeln!(f, "{op} -> {}", hex::encode(child.msg()))?;
        fmt_recurse(child, f, depth + 1)?;
    }
    Ok(())
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "msg: {}", hex::encode(&self.msg))?;
        fmt_recurse(self, f, 0)
    }
}
