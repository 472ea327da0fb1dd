//! Property tests for the set algebra used by animation diffs and for the
//! reactive core's laws.
//!
//! Run with: cargo test --test properties

use proptest::prelude::*;

use spark_dom::{
    Doc, DocElemNode, DocNode, MemoryHost, NodeSet, Runtime, RuntimeConfig, Snap, Var, View,
};

// =============================================================================
// HELPERS
// =============================================================================

const POOL: usize = 12;

fn pool() -> Vec<DocElemNode> {
    let host = MemoryHost::new();
    let rt = Runtime::memory(&host, RuntimeConfig::default());
    (0..POOL)
        .map(|_| match Doc::element(&rt, "i", [], []).node() {
            DocNode::Elem(el) => el.clone(),
            _ => unreachable!(),
        })
        .collect()
}

fn pick(pool: &[DocElemNode], mask: &[bool]) -> NodeSet {
    pool.iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(n, _)| n.clone())
        .collect()
}

fn mask() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), POOL)
}

// =============================================================================
// NODE SETS
// =============================================================================

proptest! {
    #[test]
    fn intersect_keeps_exactly_the_shared_members(a in mask(), b in mask()) {
        let nodes = pool();
        let (sa, sb) = (pick(&nodes, &a), pick(&nodes, &b));
        let both = sa.intersect(&sb);
        for (i, n) in nodes.iter().enumerate() {
            prop_assert_eq!(both.contains(n), a[i] && b[i]);
        }
        prop_assert_eq!(both.len(), sb.intersect(&sa).len());
    }

    #[test]
    fn except_and_intersect_partition_a_set(a in mask(), b in mask()) {
        let nodes = pool();
        let (sa, sb) = (pick(&nodes, &a), pick(&nodes, &b));
        let gone = sa.except(&sb);
        let kept = sa.intersect(&sb);
        prop_assert_eq!(gone.len() + kept.len(), sa.len());
        prop_assert!(gone.intersect(&sb).is_empty());
        prop_assert_eq!(sa.except(&NodeSet::empty()).len(), sa.len());
        prop_assert!(sa.except(&sa).is_empty());
    }

    #[test]
    fn find_all_sees_every_element_of_a_concat(a in mask()) {
        let nodes = pool();
        let chosen = pick(&nodes, &a);
        let doc = chosen
            .to_vec()
            .into_iter()
            .fold(DocNode::Empty, |acc, el| {
                DocNode::Append(std::rc::Rc::new(acc), std::rc::Rc::new(DocNode::Elem(el)))
            });
        let found = NodeSet::find_all(&doc);
        prop_assert_eq!(found.len(), chosen.len());
        prop_assert!(found.except(&chosen).is_empty());
    }
}

// =============================================================================
// REACTIVE CORE
// =============================================================================

proptest! {
    #[test]
    fn obsolete_fires_hooks_once(extra in 0usize..4) {
        let snap = Snap::ready(1);
        let fired = std::rc::Rc::new(std::cell::Cell::new(0));
        let f = fired.clone();
        snap.when_obsolete_run(move || f.set(f.get() + 1));
        for _ in 0..=extra {
            snap.obsolete();
        }
        prop_assert_eq!(fired.get(), 1);
        prop_assert!(snap.is_obsolete());
    }

    #[test]
    fn map2_of_constants_is_forever(x in any::<i32>(), y in any::<i32>()) {
        let sum = View::map2(&View::constant(x), &View::constant(y), |a, b| {
            i64::from(*a) + i64::from(*b)
        });
        let snap = sum.snap();
        prop_assert!(snap.is_forever());
        prop_assert_eq!(snap.value(), Some(i64::from(x) + i64::from(y)));
    }

    #[test]
    fn var_view_tracks_the_last_write(writes in prop::collection::vec(any::<i16>(), 1..8)) {
        let var = Var::create(0i16);
        let doubled = var.view().map(|n| i32::from(*n) * 2);
        for w in &writes {
            var.set(*w);
        }
        let last = writes[writes.len() - 1];
        prop_assert_eq!(doubled.try_get(), Some(i32::from(last) * 2));
        prop_assert_eq!(var.get(), last);
    }
}
