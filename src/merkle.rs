//! Merkle aggregation: folding independent timestamps into a mountain-range tip
//!
//! The exact shape of this construction is consensus-critical — two independent
//! implementations must produce byte-identical proofs from the same inputs.

use super::error::{OtsError, Result};
use super::op::{HashOp, Op};
use super::timestamp::Timestamp;

/// Concatenates `left.msg` and `right.msg`, grafts the concatenation onto both sides via
/// `Append`/`Prepend`, aliases them to a single shared subtree, then applies `make_op` to
/// that subtree to produce the returned tip.
///
/// The left and right trees are mutated in place so their `Append(right.msg)` and
/// `Prepend(left.msg)` children observably share the same downstream subtree (value-equal
/// clones rather than a single reference-counted node — see `DESIGN.md`).
pub fn cat_then_unary_op(make_op: impl Fn() -> Op, left: &mut Timestamp, right: &mut Timestamp) -> Timestamp {
    let left_msg = left.msg().to_vec();
    let right_msg = right.msg().to_vec();

    let append_op = Op::Append(right_msg.clone());
    let prepend_op = Op::Prepend(left_msg);

    // the concatenation child, reached either by appending right's msg to left or
    // prepending left's msg to right, is the same subtree
    let shared_child = right.ops_mut().add(&right_msg, prepend_op.clone());
    let shared_msg = shared_child.msg().to_vec();
    let tip = shared_child.ops_mut().add(&shared_msg, make_op()).clone();

    // fold the now fully-populated shared subtree (including the tip op) back into the
    // left side so both sides observably agree
    let shared = shared_child.clone();
    left.ops_mut().insert_raw(append_op, shared);

    tip
}

/// `cat_then_unary_op` specialized to a single SHA-256 over the concatenation
pub fn cat_sha256(left: &mut Timestamp, right: &mut Timestamp) -> Timestamp {
    cat_then_unary_op(|| Op::Hash(HashOp::Sha256), left, right)
}

/// `cat_sha256` followed by a second SHA-256 over its result
pub fn cat_sha256d(left: &mut Timestamp, right: &mut Timestamp) -> Timestamp {
    let mut tip = cat_sha256(left, right);
    let msg = tip.msg().to_vec();
    tip.ops_mut().add(&msg, Op::Hash(HashOp::Sha256)).clone()
}

/// Rolls a non-empty list of timestamps into a Merkle mountain range tip
///
/// Adjacent elements are paired with `cat_sha256` at each level; an odd element out is
/// carried up to the next level unchanged (not self-hashed) rather than paired with
/// itself. This exact algorithm is consensus-binding: two implementations must produce
/// the same tip for the same input list.
///
/// # Errors
///
/// Returns `OtsError::EmptyMerkleInput` if `stamps` is empty
pub fn make_merkle_tree(mut stamps: Vec<Timestamp>) -> Result<Timestamp> {
    if stamps.is_empty() {
        return Err(OtsError::EmptyMerkleInput);
    }

    loop {
        if stamps.len() == 1 {
            return Ok(stamps.into_iter().next().expect("checked len == 1"));
        }

        let mut next = Vec::new();
        let mut pending: Option<Timestamp> = None;
        for mut current in stamps {
            match pending.take() {
                Some(mut prev) => next.push(cat_sha256(&mut prev, &mut current)),
                None => pending = Some(current),
            }
        }
        if let Some(carried) = pending {
            next.push(carried);
        }
        stamps = next;
    }
}
