//! Tree builder assembling the division forest from flat records.

use std::collections::HashMap;

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::DivisionForest;
use crate::domain::code::{names_key, DivisionCode};
use crate::domain::entities::{AreaData, FlatRecord, Level, RecordSet};
use crate::domain::error::{DomainError, DomainResult};

/// Constructs the province forest from the four record collections.
///
/// Levels are attached strictly top-down; each level's lookup table is
/// complete before the next level is processed. Within a level, records are
/// appended in input order, so sibling order equals file order.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    /// Normalised code -> arena handle, one table per non-leaf level
    lookup: HashMap<Level, HashMap<String, Index>>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the forest. Any unresolvable or malformed code aborts the build.
    #[instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn build(&mut self, records: &RecordSet) -> DomainResult<DivisionForest> {
        // Reset state for a fresh build
        self.lookup.clear();

        let mut forest = DivisionForest::with_capacity(records.len());
        for level in Level::ALL {
            self.attach_level(&mut forest, records.level(level), level)?;
            debug!(
                "attached {} {}, forest has {} nodes",
                records.level(level).len(),
                level.plural(),
                forest.len()
            );
        }

        Ok(forest)
    }

    /// Handle of an already attached node, looked up by normalised key.
    pub fn lookup(&self, level: Level, key: &str) -> Option<Index> {
        self.lookup.get(&level).and_then(|t| t.get(key)).copied()
    }

    fn attach_level(
        &mut self,
        forest: &mut DivisionForest,
        records: &[FlatRecord],
        level: Level,
    ) -> DomainResult<()> {
        for record in records {
            let code = DivisionCode::parse(&record.code, level)?;
            let parent = self.resolve_parent(&code)?;

            let own_key = code.own_key().to_string();
            if level != Level::Street && self.lookup(level, &own_key).is_some() {
                return Err(DomainError::DuplicateCode {
                    code: record.code.clone(),
                    level,
                });
            }

            Self::check_declared_parent(record, &code)?;
            // pid is the code of the node actually attached to
            let parent_code = match parent {
                Some(parent_idx) => Some(
                    forest
                        .get_node(parent_idx)
                        .ok_or(DomainError::StaleNode)?
                        .data
                        .code
                        .as_str(),
                ),
                None => None,
            };
            let data = AreaData::from_record(record, level, parent_code);

            let idx = forest
                .insert_node(data, parent)
                .ok_or(DomainError::StaleNode)?;

            // Streets carry no children and need no lookup entry
            if level != Level::Street {
                self.lookup.entry(level).or_default().insert(own_key, idx);
            }
        }
        Ok(())
    }

    /// A declared `parent_code` is optional, but when present it must name the
    /// node the code's prefix resolves to.
    fn check_declared_parent(record: &FlatRecord, code: &DivisionCode) -> DomainResult<()> {
        let declared = record.parent_code.as_str();
        let (Some(parent_level), Some(parent_key)) = (code.level().parent(), code.parent_key())
        else {
            return Ok(());
        };
        if declared.is_empty() || names_key(declared, parent_key) {
            return Ok(());
        }
        Err(DomainError::ParentMismatch {
            code: record.code.clone(),
            level: code.level(),
            declared: declared.to_string(),
            parent_code: parent_key.to_string(),
            parent_level,
        })
    }

    fn resolve_parent(&self, code: &DivisionCode) -> DomainResult<Option<Index>> {
        let Some(parent_level) = code.level().parent() else {
            return Ok(None);
        };
        let parent_key = code.parent_key().ok_or(DomainError::StaleNode)?;

        self.lookup(parent_level, parent_key)
            .map(Some)
            .ok_or_else(|| DomainError::MissingParent {
                code: code.raw().to_string(),
                level: code.level(),
                parent_code: parent_key.to_string(),
                parent_level,
            })
    }
}
