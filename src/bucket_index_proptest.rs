#![cfg(test)]

// Property tests for BucketIndex kept inside the crate so they can drive the
// structural layer with chosen hashes.

use crate::bucket_index::BucketIndex;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

// Pool-indexed operations: indices shrink to earlier objects, op lists shrink
// in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize),
    Remove(usize),
    Contains(usize),
    // Drop the only strong pointer to the object; a later Insert makes a new one.
    Release(usize),
    Iterate,
    Len,
    Prune,
    Clear,
}

fn arb_scenario(max_hash: u64) -> impl Strategy<Value = (Vec<u64>, Vec<Op>)> {
    proptest::collection::vec(0..max_hash, 1..=8).prop_flat_map(|hashes| {
        let idx = 0..hashes.len();
        let op = prop_oneof![
            3 => idx.clone().prop_map(Op::Insert),
            2 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Contains),
            2 => idx.clone().prop_map(Op::Release),
            1 => Just(Op::Iterate),
            1 => Just(Op::Len),
            1 => Just(Op::Prune),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (hashes.clone(), ops))
    })
}

fn addr(rc: &Rc<usize>) -> usize {
    Rc::as_ptr(rc) as usize
}

// Property: state-machine equivalence against a model of (object alive?, member?).
// Invariants exercised across random operation sequences:
// - insert/remove/contains answers match the model, including after the
//   object behind a slot was dropped and a new object took its place.
// - A pass yields exactly the live members.
// - A full pass leaves exactly one slot per live member.
// - No bucket is ever physically empty.
fn run(hashes: Vec<u64>, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let n = hashes.len();
    let mut ix: BucketIndex<Weak<usize>> = BucketIndex::new();
    let mut objs: Vec<Option<Rc<usize>>> = vec![None; n];
    let mut member = vec![false; n];

    for op in ops {
        match op {
            Op::Insert(i) => {
                let obj = objs[i].get_or_insert_with(|| Rc::new(i)).clone();
                let added = ix.insert(hashes[i], &obj);
                prop_assert_eq!(added, !member[i], "insert succeeds iff not a member");
                member[i] = true;
            }
            Op::Remove(i) => {
                if let Some(obj) = &objs[i] {
                    prop_assert_eq!(ix.remove(hashes[i], obj), member[i]);
                    member[i] = false;
                }
            }
            Op::Contains(i) => {
                if let Some(obj) = &objs[i] {
                    prop_assert_eq!(ix.contains(hashes[i], obj), member[i]);
                }
            }
            Op::Release(i) => {
                objs[i] = None;
                member[i] = false;
            }
            Op::Iterate => {
                let mut cur = ix.cursor();
                let mut seen = BTreeSet::new();
                while let Some(s) = ix.next_live(&mut cur) {
                    prop_assert!(seen.insert(addr(&s)), "member yielded twice");
                }
                let expected: BTreeSet<usize> = (0..n)
                    .filter(|&i| member[i])
                    .filter_map(|i| objs[i].as_ref().map(addr))
                    .collect();
                prop_assert_eq!(seen, expected);
            }
            Op::Len => {
                let expected = member.iter().filter(|&&m| m).count();
                prop_assert_eq!(ix.live_len(), expected);
                prop_assert_eq!(ix.slot_count(), expected);
            }
            Op::Prune => {
                let before = ix.slot_count();
                let pruned = ix.prune_all();
                prop_assert_eq!(ix.slot_count(), before - pruned);
            }
            Op::Clear => {
                ix.clear();
                member.iter_mut().for_each(|m| *m = false);
                prop_assert_eq!(ix.slot_count(), 0);
            }
        }

        // Post-conditions after each op
        let live_members = member.iter().filter(|&&m| m).count();
        prop_assert!(ix.slot_count() >= live_members);
        prop_assert!(ix.bucket_count() <= ix.slot_count());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((hashes, ops) in arb_scenario(4)) {
        run(hashes, ops)?;
    }
}

// Same invariants with every object in a single bucket.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_single_bucket((hashes, ops) in arb_scenario(1)) {
        run(hashes, ops)?;
    }
}
