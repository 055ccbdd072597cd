//! Nested-set indexing of the division forest.
//!
//! Every node gets `left` on entry and `right` on exit of one pre-order walk
//! over all roots, driven by a single counter that is threaded through the
//! recursion and never reset between trees. A node's range therefore strictly
//! contains the ranges of all its descendants, and the values used across the
//! forest are exactly `1..=2 * node_count`.

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::DivisionForest;
use crate::domain::error::{DomainError, DomainResult};

/// Depth assigned to province roots.
pub const ROOT_DEPTH: i32 = 1;

/// Outcome of indexing a whole forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexSummary {
    pub nodes: usize,
    pub roots: usize,
    /// `left` of the first root, 0 for an empty forest
    pub first_key: i32,
    /// `right` of the last root, equals `2 * nodes`
    pub last_key: i32,
}

/// Assign `(left, right, depth)` to every node of the forest.
#[instrument(level = "debug", skip_all, fields(nodes = forest.len()))]
pub fn index_forest(forest: &mut DivisionForest) -> DomainResult<IndexSummary> {
    let roots = forest.roots().to_vec();

    let mut counter = 0;
    for &root in &roots {
        counter = index_subtree(forest, root, counter, ROOT_DEPTH)?;
    }

    let first_key = roots
        .first()
        .and_then(|&r| forest.get_node(r))
        .map(|n| n.data.left)
        .unwrap_or(0);
    let summary = IndexSummary {
        nodes: forest.len(),
        roots: roots.len(),
        first_key,
        last_key: counter,
    };
    debug!("key from {} to {}", summary.first_key, summary.last_key);
    Ok(summary)
}

/// Index the subtree rooted at `idx`, starting after `counter`.
///
/// Returns the counter value after the subtree's last `right`, which is the
/// value the next sibling or root continues from.
pub fn index_subtree(
    forest: &mut DivisionForest,
    idx: Index,
    counter: i32,
    depth: i32,
) -> DomainResult<i32> {
    let counter = advance(forest, idx, counter)?;
    let children = {
        let node = forest.get_node_mut(idx).ok_or(DomainError::StaleNode)?;
        node.data.left = counter;
        node.data.depth = depth;
        node.children.clone()
    };

    let mut counter = counter;
    for child in children {
        counter = index_subtree(forest, child, counter, depth + 1)?;
    }

    let counter = advance(forest, idx, counter)?;
    let node = forest.get_node_mut(idx).ok_or(DomainError::StaleNode)?;
    node.data.right = counter;
    Ok(counter)
}

fn advance(forest: &DivisionForest, idx: Index, counter: i32) -> DomainResult<i32> {
    counter.checked_add(1).ok_or_else(|| {
        let code = forest
            .get_node(idx)
            .map(|n| n.data.code.clone())
            .unwrap_or_default();
        DomainError::CounterOverflow(code)
    })
}

/// Starting counter for each root when the roots are indexed independently.
///
/// Root `k` starts after `2 * size(root_0..k)`, which reproduces the ranges of
/// a single sequential pass without sharing a counter.
pub fn root_offsets(forest: &DivisionForest) -> DomainResult<Vec<(Index, i32)>> {
    let mut offsets = Vec::with_capacity(forest.roots().len());
    let mut next: i32 = 0;
    for &root in forest.roots() {
        offsets.push((root, next));
        let span = forest
            .subtree_size(root)
            .checked_mul(2)
            .and_then(|s| i32::try_from(s).ok())
            .and_then(|s| next.checked_add(s));
        next = span.ok_or_else(|| {
            let code = forest
                .get_node(root)
                .map(|n| n.data.code.clone())
                .unwrap_or_default();
            DomainError::CounterOverflow(code)
        })?;
    }
    Ok(offsets)
}

/// Check every nested-set invariant on an indexed forest.
///
/// Returns the first violation found.
#[instrument(level = "debug", skip_all)]
pub fn verify(forest: &DivisionForest) -> DomainResult<()> {
    let mut keys = Vec::with_capacity(forest.len() * 2);
    let mut previous_root_right = 0;

    for &root in forest.roots() {
        let node = forest.get_node(root).ok_or(DomainError::StaleNode)?;
        if node.data.depth != ROOT_DEPTH {
            return Err(violation(&node.data.code, "root depth is not 1"));
        }
        if node.data.left <= previous_root_right {
            return Err(violation(&node.data.code, "root range overlaps previous root"));
        }
        previous_root_right = node.data.right;
    }

    for (_, node) in forest.pre_order() {
        let data = &node.data;
        if data.left < 1 || data.left >= data.right {
            return Err(violation(
                &data.code,
                &format!("bad range ({}, {})", data.left, data.right),
            ));
        }
        keys.push(data.left);
        keys.push(data.right);

        let mut previous_right = data.left;
        for &child_idx in &node.children {
            let child = &forest.get_node(child_idx).ok_or(DomainError::StaleNode)?.data;
            if child.depth != data.depth + 1 {
                return Err(violation(&child.code, "depth is not parent depth + 1"));
            }
            if child.left <= previous_right {
                return Err(violation(&child.code, "range not after previous sibling"));
            }
            previous_right = child.right;
        }
        if previous_right >= data.right {
            return Err(violation(&data.code, "range does not contain last child"));
        }
    }

    keys.sort_unstable();
    for (expected, &key) in (1..).zip(keys.iter()) {
        if key != expected {
            return Err(violation("forest", &format!("key {expected} missing or repeated")));
        }
    }
    Ok(())
}

fn violation(code: &str, message: &str) -> DomainError {
    DomainError::InvariantViolation {
        code: code.to_string(),
        message: message.to_string(),
    }
}
