//! Algebraic property tests for `Timestamp::merge` and `make_merkle_tree`, run over
//! small generated trees with `proptest`.

use opentimestamps_core::{make_merkle_tree, Attestation, HashOp, Op, Timestamp};
use proptest::prelude::*;

fn arb_attestation() -> impl Strategy<Value = Attestation> {
    prop_oneof![
        (0usize..1_000_000).prop_map(|height| Attestation::Bitcoin { height }),
        "[a-z]{1,10}".prop_map(|s| Attestation::Pending { uri: format!("https://{s}.example") }),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Hash(HashOp::Sha256)),
        Just(Op::Hash(HashOp::Sha1)),
        Just(Op::Hash(HashOp::Ripemd160)),
        Just(Op::Reverse),
        Just(Op::Hexlify),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Op::Append),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Op::Prepend),
    ]
}

/// A shallow timestamp tree over a fixed root message: a handful of attestations at the
/// root, plus at most a couple of one-level-deep op children, each with their own
/// attestations. Deep enough to exercise recursive merge, shallow enough that proptest
/// shrinking stays fast.
fn arb_timestamp(msg: Vec<u8>) -> impl Strategy<Value = Timestamp> {
    let msg_for_ops = msg.clone();
    (
        prop::collection::vec(arb_attestation(), 0..3),
        prop::collection::vec((arb_op(), prop::collection::vec(arb_attestation(), 0..2)), 0..3),
    )
        .prop_map(move |(root_atts, op_children)| {
            let mut ts = Timestamp::new(msg_for_ops.clone());
            for att in root_atts {
                ts.add_attestation(att);
            }
            for (op, child_atts) in op_children {
                let child = ts.add_op(op);
                for att in child_atts {
                    child.add_attestation(att);
                }
            }
            ts
        })
}

fn arb_timestamp_pair() -> impl Strategy<Value = (Timestamp, Timestamp)> {
    any::<u8>().prop_flat_map(|byte| {
        let msg = vec![byte];
        (arb_timestamp(msg.clone()), arb_timestamp(msg))
    })
}

proptest! {
    /// `a.merge(b)` and `b.merge(a)` yield equal trees.
    #[test]
    fn merge_is_commutative((a, b) in arb_timestamp_pair()) {
        let mut a_then_b = a.clone();
        a_then_b.merge(b.clone()).unwrap();
        let mut b_then_a = b;
        b_then_a.merge(a).unwrap();
        prop_assert_eq!(a_then_b, b_then_a);
    }

    /// `(a.merge(b)).merge(c)` equals `a.merge(b.merge(c))`.
    #[test]
    fn merge_is_associative(byte in any::<u8>(), atts in prop::collection::vec(arb_attestation(), 1..3)) {
        let msg = vec![byte];
        let mut a = Timestamp::new(msg.clone());
        a.add_attestation(atts[0].clone());
        let mut b = Timestamp::new(msg.clone());
        if let Some(att) = atts.get(1) {
            b.add_attestation(att.clone());
        }
        let mut c = Timestamp::new(msg);
        if let Some(att) = atts.get(2) {
            c.add_attestation(att.clone());
        }

        let mut ab_then_c = a.clone();
        ab_then_c.merge(b.clone()).unwrap();
        ab_then_c.merge(c.clone()).unwrap();

        let mut bc = b;
        bc.merge(c).unwrap();
        let mut a_then_bc = a;
        a_then_bc.merge(bc).unwrap();

        prop_assert_eq!(ab_then_c, a_then_bc);
    }

    /// Merging a timestamp with a clone of itself changes nothing.
    #[test]
    fn merge_is_idempotent((mut base, _) in arb_timestamp_pair()) {
        let clone = base.clone();
        base.merge(clone).unwrap();
        let mut base_copy = base.clone();
        let again = base.clone();
        base_copy.merge(again).unwrap();
        prop_assert_eq!(base, base_copy);
    }

    /// Building a merkle tree from the same leaves twice is deterministic.
    #[test]
    fn merkle_tree_is_deterministic(leaves in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..8), 1..12)) {
        let make = || leaves.iter().cloned().map(Timestamp::new).collect::<Vec<_>>();
        let a = make_merkle_tree(make()).unwrap();
        let b = make_merkle_tree(make()).unwrap();
        prop_assert_eq!(a.msg().to_vec(), b.msg().to_vec());
    }
}
