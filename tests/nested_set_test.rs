//! Tests for nested-set indexing and invariant verification

use std::collections::HashMap;

use division::domain::nested_set::{index_subtree, root_offsets};
use division::domain::{
    index_forest, verify, DivisionForest, DomainError, Level, TreeBuilder,
};
use division::util::testing::{init_test_setup, records, sample_records};

fn indexed(records: &division::domain::RecordSet) -> DivisionForest {
    let mut forest = TreeBuilder::new().build(records).unwrap();
    index_forest(&mut forest).unwrap();
    forest
}

fn keys_by_code(forest: &DivisionForest) -> Vec<(String, i32, i32, i32)> {
    forest
        .pre_order()
        .map(|(_, n)| (n.data.code.clone(), n.data.left, n.data.right, n.data.depth))
        .collect()
}

#[test]
fn given_single_chain_when_indexing_then_ranges_nest() {
    // Arrange
    init_test_setup();
    let records = records(
        &[("11", "A")],
        &[("1101", "B", "11")],
        &[("110101", "C", "1101")],
        &[("1101010001", "D", "110101")],
    );

    // Act
    let forest = indexed(&records);

    // Assert
    assert_eq!(
        keys_by_code(&forest),
        vec![
            ("11".to_string(), 1, 8, 1),
            ("1101".to_string(), 2, 7, 2),
            ("110101".to_string(), 3, 6, 3),
            ("1101010001".to_string(), 4, 5, 4),
        ]
    );
}

#[test]
fn given_two_childless_provinces_when_indexing_then_ranges_are_disjoint() {
    let forest = indexed(&records(&[("11", "A"), ("12", "B")], &[], &[], &[]));

    assert_eq!(
        keys_by_code(&forest),
        vec![("11".to_string(), 1, 2, 1), ("12".to_string(), 3, 4, 1)]
    );
}

#[test]
fn given_sample_forest_when_indexing_then_summary_spans_all_keys() {
    let mut forest = TreeBuilder::new().build(&sample_records()).unwrap();

    let summary = index_forest(&mut forest).unwrap();

    assert_eq!(summary.nodes, 12);
    assert_eq!(summary.roots, 2);
    assert_eq!(summary.first_key, 1);
    assert_eq!(summary.last_key, 24);
}

#[test]
fn given_sample_forest_when_indexing_then_expected_keys_are_assigned() {
    let forest = indexed(&sample_records());
    let keys: HashMap<_, _> = keys_by_code(&forest)
        .into_iter()
        .map(|(code, l, r, _)| (code, (l, r)))
        .collect();

    assert_eq!(keys["11"], (1, 14));
    assert_eq!(keys["110101"], (3, 8));
    assert_eq!(keys["110102001"], (10, 11));
    assert_eq!(keys["13"], (15, 24));
    assert_eq!(keys["1302"], (22, 23));
}

#[test]
fn given_indexed_forest_then_every_descendant_is_contained() {
    let forest = indexed(&sample_records());

    for (idx, node) in forest.pre_order() {
        for (desc_idx, desc) in forest.subtree(idx) {
            if desc_idx == idx {
                continue;
            }
            assert!(
                node.data.left < desc.data.left && desc.data.right < node.data.right,
                "{} does not contain {}",
                node.data.code,
                desc.data.code
            );
        }
    }
}

#[test]
fn given_indexed_forest_then_siblings_are_ordered_and_disjoint() {
    let forest = indexed(&sample_records());

    for (_, node) in forest.pre_order() {
        for pair in node.children.windows(2) {
            let a = &forest.get_node(pair[0]).unwrap().data;
            let b = &forest.get_node(pair[1]).unwrap().data;
            assert!(a.right < b.left, "{} overlaps {}", a.code, b.code);
        }
    }
}

#[test]
fn given_indexed_forest_then_keys_are_exactly_one_to_twice_node_count() {
    let forest = indexed(&sample_records());
    let mut keys: Vec<i32> = forest
        .pre_order()
        .flat_map(|(_, n)| [n.data.left, n.data.right])
        .collect();
    keys.sort_unstable();

    let expected: Vec<i32> = (1..=2 * forest.len() as i32).collect();
    assert_eq!(keys, expected);
}

#[test]
fn given_indexed_forest_then_depth_follows_level() {
    let forest = indexed(&sample_records());

    for (_, node) in forest.pre_order() {
        assert_eq!(node.data.depth, node.data.level.depth());
        if node.data.level == Level::Street {
            assert_eq!(node.data.depth, 4);
        }
    }
    for &root in forest.roots() {
        assert_eq!(forest.get_node(root).unwrap().data.depth, 1);
    }
}

#[test]
fn given_indexed_forest_when_verifying_then_passes() {
    let forest = indexed(&sample_records());

    assert_eq!(verify(&forest), Ok(()));
}

#[test]
fn given_corrupted_range_when_verifying_then_reports_violation() {
    let mut forest = indexed(&sample_records());
    let (idx, _) = forest
        .pre_order()
        .find(|(_, n)| n.data.code == "1302")
        .unwrap();
    forest.get_node_mut(idx).unwrap().data.right = 30;

    let err = verify(&forest).unwrap_err();

    assert!(matches!(err, DomainError::InvariantViolation { .. }));
    assert!(!err.is_malformed_input());
}

#[test]
fn given_unindexed_forest_when_verifying_then_fails() {
    let forest = TreeBuilder::new().build(&sample_records()).unwrap();

    assert!(verify(&forest).is_err());
}

#[test]
fn given_root_offsets_when_indexing_roots_independently_then_matches_sequential_pass() {
    let sequential = indexed(&sample_records());
    let mut independent = TreeBuilder::new().build(&sample_records()).unwrap();

    let offsets = root_offsets(&independent).unwrap();
    assert_eq!(offsets.iter().map(|(_, o)| *o).collect::<Vec<_>>(), vec![0, 14]);

    for (root, offset) in offsets {
        index_subtree(&mut independent, root, offset, 1).unwrap();
    }

    assert_eq!(keys_by_code(&independent), keys_by_code(&sequential));
}

#[test]
fn given_counter_near_limit_when_indexing_subtree_then_reports_overflow() {
    let mut forest = TreeBuilder::new()
        .build(&records(&[("11", "A")], &[("1101", "B", "11")], &[], &[]))
        .unwrap();
    let root = forest.roots()[0];

    let err = index_subtree(&mut forest, root, i32::MAX - 2, 1).unwrap_err();

    assert!(matches!(err, DomainError::CounterOverflow(_)));
}
