//! Division dataset service
//!
//! Loads the four record files, assembles and indexes the forest, and
//! streams the nested-set rows to the configured output.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::emitter::{emit_forest, sink_for, OutputFormat};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    index_forest, verify, DivisionForest, FlatRecord, IndexSummary, Level, RecordSet, TreeBuilder,
};
use crate::infrastructure::traits::FileSystem;

/// Location of the four record files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub provinces: PathBuf,
    pub cities: PathBuf,
    pub areas: PathBuf,
    pub streets: PathBuf,
}

impl DatasetPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            provinces: dir.join("provinces.json"),
            cities: dir.join("cities.json"),
            areas: dir.join("areas.json"),
            streets: dir.join("streets.json"),
        }
    }

    pub fn path(&self, level: Level) -> &Path {
        match level {
            Level::Province => &self.provinces,
            Level::City => &self.cities,
            Level::Area => &self.areas,
            Level::Street => &self.streets,
        }
    }
}

/// Where emitted rows go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// `-` selects stdout, anything else is a file path.
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(path.to_path_buf())
        }
    }
}

/// An indexed forest together with the records it was built from.
#[derive(Debug)]
pub struct IndexedDataset {
    pub records: RecordSet,
    pub forest: DivisionForest,
    pub summary: IndexSummary,
}

/// Shape of an indexed dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestStats {
    pub records: BTreeMap<Level, usize>,
    pub nodes: usize,
    pub roots: usize,
    pub leaves: usize,
    pub max_depth: usize,
    pub first_key: i32,
    pub last_key: i32,
}

impl ForestStats {
    pub fn of(dataset: &IndexedDataset) -> Self {
        let records = Level::ALL
            .iter()
            .map(|&level| (level, dataset.records.level(level).len()))
            .collect();
        Self {
            records,
            nodes: dataset.forest.len(),
            roots: dataset.summary.roots,
            leaves: dataset.forest.leaf_count(),
            max_depth: dataset.forest.depth(),
            first_key: dataset.summary.first_key,
            last_key: dataset.summary.last_key,
        }
    }
}

/// Service turning a division dataset into nested-set rows.
pub struct DivisionService {
    fs: Arc<dyn FileSystem>,
}

impl DivisionService {
    /// Create a new division service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Read all four record files. Every file must exist; an empty array is fine.
    #[instrument(level = "debug", skip(self))]
    pub fn load_records(&self, paths: &DatasetPaths) -> ApplicationResult<RecordSet> {
        let mut records = RecordSet::default();
        for level in Level::ALL {
            let loaded = self.load_level(paths.path(level))?;
            info!("got {} {}", loaded.len(), level.plural());
            *records.level_mut(level) = loaded;
        }
        Ok(records)
    }

    fn load_level(&self, path: &Path) -> ApplicationResult<Vec<FlatRecord>> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::InputNotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read records", path)?;
        serde_json::from_str(&content).map_err(|source| ApplicationError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build and index the forest for already loaded records.
    #[instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn index(&self, records: RecordSet) -> ApplicationResult<IndexedDataset> {
        let mut forest = TreeBuilder::new().build(&records)?;
        info!("tree with {} roots", forest.roots().len());

        let summary = index_forest(&mut forest)?;
        info!("key from {} to {}", summary.first_key, summary.last_key);

        Ok(IndexedDataset {
            records,
            forest,
            summary,
        })
    }

    /// Load, build and index in one go.
    pub fn load(&self, paths: &DatasetPaths) -> ApplicationResult<IndexedDataset> {
        let records = self.load_records(paths)?;
        self.index(records)
    }

    /// Load and index, then check every nested-set invariant.
    pub fn check(&self, paths: &DatasetPaths) -> ApplicationResult<ForestStats> {
        let dataset = self.load(paths)?;
        verify(&dataset.forest)?;
        Ok(ForestStats::of(&dataset))
    }

    /// Emit the rows of `dataset` to `target`. Returns the number of rows.
    #[instrument(level = "debug", skip(self, dataset))]
    pub fn write_output(
        &self,
        dataset: &IndexedDataset,
        target: &OutputTarget,
        format: OutputFormat,
        table: &str,
    ) -> ApplicationResult<usize> {
        let written = match target {
            OutputTarget::Stdout => {
                let mut sink = sink_for(format, io::stdout().lock(), table);
                emit_forest(&dataset.forest, sink.as_mut())?
            }
            OutputTarget::File(path) => {
                self.fs
                    .ensure_parent(path)
                    .with_path_context("create output directory", path)?;
                let mut staged = self.fs.stage(path).with_path_context("create output", path)?;
                let written = {
                    let mut sink = sink_for(format, &mut staged, table);
                    emit_forest(&dataset.forest, sink.as_mut())?
                };
                // Only a complete emission replaces the target, a failed one leaves it untouched
                staged.commit().with_path_context("replace output", path)?;
                debug!("wrote {} rows to {}", written, path.display());
                written
            }
        };
        Ok(written)
    }

    /// Full pipeline: load, build, index, emit.
    pub fn generate(
        &self,
        paths: &DatasetPaths,
        target: &OutputTarget,
        format: OutputFormat,
        table: &str,
    ) -> ApplicationResult<ForestStats> {
        let dataset = self.load(paths)?;
        self.write_output(&dataset, target, format, table)?;
        Ok(ForestStats::of(&dataset))
    }
}
