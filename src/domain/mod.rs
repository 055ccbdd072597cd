//! Domain layer: division codes, the forest and its nested-set encoding
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod code;
pub mod entities;
pub mod error;
pub mod nested_set;
pub mod render;

pub use arena::{AreaNode, DivisionForest};
pub use builder::TreeBuilder;
pub use code::{area_of, city_of, province_of, DivisionCode};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use nested_set::{index_forest, verify, IndexSummary};
pub use render::ForestConvert;
