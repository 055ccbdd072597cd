use generational_arena::Index;
use termtree::Tree;

use crate::domain::arena::DivisionForest;
use crate::domain::entities::AreaData;

/// Conversion of a forest into printable `termtree` trees.
pub trait ForestConvert {
    /// One tree per root. Levels below `max_depth` are cut off.
    fn to_tree_strings(&self, max_depth: Option<usize>) -> Vec<Tree<String>>;
}

impl ForestConvert for DivisionForest {
    fn to_tree_strings(&self, max_depth: Option<usize>) -> Vec<Tree<String>> {
        fn build_tree(
            forest: &DivisionForest,
            node_idx: Index,
            level: usize,
            max_depth: Option<usize>,
        ) -> Option<Tree<String>> {
            let node = forest.get_node(node_idx)?;
            let mut tree = Tree::new(label(&node.data));
            if max_depth.map_or(true, |max| level < max) {
                for &child_idx in &node.children {
                    if let Some(child) = build_tree(forest, child_idx, level + 1, max_depth) {
                        tree.push(child);
                    }
                }
            }
            Some(tree)
        }

        self.roots()
            .iter()
            .filter_map(|&root| build_tree(self, root, 1, max_depth))
            .collect()
    }
}

fn label(data: &AreaData) -> String {
    if data.is_indexed() {
        format!("{} [{}, {}]", data, data.left, data.right)
    } else {
        data.to_string()
    }
}
