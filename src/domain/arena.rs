use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::AreaData;

/// Node in the arena-based division forest.
#[derive(Debug)]
pub struct AreaNode {
    /// Division data for this node
    pub data: AreaData,
    /// Index of parent node in the arena, None for province roots
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in build order
    pub children: Vec<Index>,
}

/// Arena-based forest holding one tree per province.
///
/// Children are appended once and never re-parented, so index-based links
/// are enough to express ownership. Root order is insertion order.
#[derive(Debug, Default)]
pub struct DivisionForest {
    /// Arena storage for all nodes
    arena: Arena<AreaNode>,
    /// Province roots in insertion order
    roots: Vec<Index>,
}

impl DivisionForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            arena: Arena::with_capacity(n),
            roots: Vec::new(),
        }
    }

    /// Insert a node, appending it to `parent`'s children or to the roots.
    ///
    /// Returns None if `parent` refers to a node that is not in the forest.
    #[instrument(level = "trace", skip(self, data), fields(code = %data.code))]
    pub fn insert_node(&mut self, data: AreaData, parent: Option<Index>) -> Option<Index> {
        if let Some(parent_idx) = parent {
            if !self.arena.contains(parent_idx) {
                return None;
            }
        }

        let node_idx = self.arena.insert(AreaNode {
            data,
            parent,
            children: Vec::new(),
        });

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent_node) => parent_node.children.push(node_idx),
            None => self.roots.push(node_idx),
        }

        Some(node_idx)
    }

    pub fn get_node(&self, idx: Index) -> Option<&AreaNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut AreaNode> {
        self.arena.get_mut(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order iterator over the whole forest, roots in order.
    pub fn pre_order(&self) -> PreOrderIterator<'_> {
        PreOrderIterator::new(self, self.roots.iter().copied())
    }

    /// Pre-order iterator over the subtree rooted at `idx`.
    pub fn subtree(&self, idx: Index) -> PreOrderIterator<'_> {
        PreOrderIterator::new(self, std::iter::once(idx))
    }

    /// Number of nodes in the subtree rooted at `idx`, including `idx`.
    pub fn subtree_size(&self, idx: Index) -> usize {
        self.subtree(idx).count()
    }

    /// Maximum number of levels over all trees, 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.pre_order()
            .filter(|(_, node)| node.children.is_empty())
            .count()
    }

    /// Codes of the root-to-node path ending at `idx`.
    pub fn ancestor_codes(&self, idx: Index) -> Vec<String> {
        let mut codes = Vec::new();
        let mut current = self.get_node(idx).and_then(|n| n.parent);
        while let Some(parent_idx) = current {
            match self.get_node(parent_idx) {
                Some(parent) => {
                    codes.push(parent.data.code.clone());
                    current = parent.parent;
                }
                None => break,
            }
        }
        codes.reverse();
        codes
    }
}

pub struct PreOrderIterator<'a> {
    forest: &'a DivisionForest,
    stack: Vec<Index>,
}

impl<'a> PreOrderIterator<'a> {
    fn new(forest: &'a DivisionForest, starts: impl DoubleEndedIterator<Item = Index>) -> Self {
        // Reverse so the first start is popped first
        let stack = starts.rev().collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for PreOrderIterator<'a> {
    type Item = (Index, &'a AreaNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
