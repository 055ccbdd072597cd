//! Tests for DivisionService

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use division::application::services::{DatasetPaths, DivisionService, OutputTarget};
use division::application::{ApplicationError, OutputFormat};
use division::domain::{DomainError, Level};
use division::infrastructure::traits::{FileSystem, RealFileSystem, StagedFile};
use division::util::testing::init_test_setup;

const PROVINCES: &str = r#"[
  {"code": "11", "name": "Beijing"},
  {"code": "13", "name": "Hebei"}
]"#;
const CITIES: &str = r#"[
  {"code": "1101", "name": "Beijing City", "parent_code": "11"},
  {"code": "1301", "name": "Shijiazhuang", "parent_code": "13"}
]"#;
const AREAS: &str = r#"[
  {"code": "110101", "name": "Dongcheng", "parent_code": "1101"}
]"#;
const STREETS: &str = r#"[
  {"code": "110101001", "name": "Donghuamen", "parent_code": "110101"},
  {"code": "110101002", "name": "Jingshan", "parent_code": "110101"}
]"#;

/// Helper to create the four record files in a temp dir
fn create_dataset(dir: &TempDir, streets: &str) -> DatasetPaths {
    let paths = DatasetPaths::in_dir(dir.path());
    std::fs::write(&paths.provinces, PROVINCES).expect("write provinces");
    std::fs::write(&paths.cities, CITIES).expect("write cities");
    std::fs::write(&paths.areas, AREAS).expect("write areas");
    std::fs::write(&paths.streets, streets).expect("write streets");
    paths
}

fn real_service() -> DivisionService {
    DivisionService::new(Arc::new(RealFileSystem))
}

#[test]
fn given_dataset_when_loading_records_then_keeps_file_order() {
    // Arrange
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let paths = create_dataset(&temp, STREETS);

    // Act
    let records = real_service().load_records(&paths).unwrap();

    // Assert
    assert_eq!(records.level(Level::Province).len(), 2);
    assert_eq!(records.cities[1].code, "1301");
    assert_eq!(records.provinces[0].parent_code, "");
    assert_eq!(records.streets[1].name, "Jingshan");
}

#[test]
fn given_dataset_when_generating_sql_file_then_writes_one_statement_per_node() {
    let temp = TempDir::new().unwrap();
    let paths = create_dataset(&temp, STREETS);
    let output = temp.path().join("out").join("division.sql");

    let stats = real_service()
        .generate(
            &paths,
            &OutputTarget::File(output.clone()),
            OutputFormat::Sql,
            "nested",
        )
        .unwrap();

    assert_eq!(stats.nodes, 7);
    assert_eq!(stats.roots, 2);
    assert_eq!(stats.last_key, 14);
    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(
        lines[0],
        "INSERT INTO nested(id, node, pid, depth, lft, rgt) VALUES(11, 'Beijing', 0, 1, 1, 10);"
    );
    assert_eq!(
        lines[6],
        "INSERT INTO nested(id, node, pid, depth, lft, rgt) VALUES(1301, 'Shijiazhuang', 13, 2, 12, 13);"
    );
}

#[test]
fn given_dataset_when_checking_then_reports_stats() {
    let temp = TempDir::new().unwrap();
    let paths = create_dataset(&temp, STREETS);

    let stats = real_service().check(&paths).unwrap();

    assert_eq!(stats.records[&Level::Street], 2);
    assert_eq!(stats.leaves, 3);
    assert_eq!(stats.max_depth, 4);
    assert_eq!((stats.first_key, stats.last_key), (1, 14));
}

#[test]
fn given_missing_streets_file_when_loading_then_errors_with_input_not_found() {
    let temp = TempDir::new().unwrap();
    let paths = create_dataset(&temp, STREETS);
    std::fs::remove_file(&paths.streets).unwrap();

    let err = real_service().load(&paths).unwrap_err();

    assert!(matches!(err, ApplicationError::InputNotFound(p) if p == paths.streets));
}

#[test]
fn given_invalid_json_when_loading_then_errors_with_parse() {
    let temp = TempDir::new().unwrap();
    let paths = create_dataset(&temp, "[{\"code\": 1}]");

    let err = real_service().load(&paths).unwrap_err();

    assert!(matches!(err, ApplicationError::Parse { .. }));
}

#[test]
fn given_orphan_street_when_loading_then_errors_with_domain_error() {
    let temp = TempDir::new().unwrap();
    let paths = create_dataset(
        &temp,
        r#"[{"code": "130102001", "name": "Jianbei", "parent_code": "130102"}]"#,
    );

    let err = real_service().load(&paths).unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::MissingParent { .. })
    ));
}

#[test]
fn given_empty_streets_when_generating_then_tree_is_shallower() {
    let temp = TempDir::new().unwrap();
    let paths = create_dataset(&temp, "[]");

    let dataset = real_service().load(&paths).unwrap();

    assert_eq!(dataset.forest.depth(), 3);
    assert_eq!(dataset.summary.last_key, 10);
}

// ============================================================
// In-memory filesystem
// ============================================================

/// Shared buffer handed out as a writer, optionally failing once it would
/// grow past `limit` bytes.
#[derive(Clone, Default)]
struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
    limit: Option<usize>,
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.bytes.lock().unwrap();
        if self.limit.is_some_and(|limit| bytes.len() + buf.len() > limit) {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "disk full"));
        }
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

type Files = Arc<Mutex<HashMap<PathBuf, String>>>;

/// Staged buffer that becomes visible in `files` on commit.
struct MemoryStage {
    buffer: SharedBuffer,
    target: PathBuf,
    files: Files,
}

impl Write for MemoryStage {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buffer.flush()
    }
}

impl StagedFile for MemoryStage {
    fn commit(self: Box<Self>) -> io::Result<()> {
        let MemoryStage {
            buffer,
            target,
            files,
        } = *self;
        let bytes = buffer.bytes.lock().unwrap().clone();
        let content = String::from_utf8(bytes).map_err(io::Error::other)?;
        files.lock().unwrap().insert(target, content);
        Ok(())
    }
}

#[derive(Default)]
struct MemoryFileSystem {
    files: Files,
    fail_create: bool,
    write_limit: Option<usize>,
}

impl MemoryFileSystem {
    fn with_dataset(dir: &Path) -> Self {
        let paths = DatasetPaths::in_dir(dir);
        let mut files = HashMap::new();
        files.insert(paths.provinces, PROVINCES.to_string());
        files.insert(paths.cities, CITIES.to_string());
        files.insert(paths.areas, AREAS.to_string());
        files.insert(paths.streets, STREETS.to_string());
        Self {
            files: Arc::new(Mutex::new(files)),
            ..Default::default()
        }
    }

    fn file(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.file(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "not found"))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn stage(&self, path: &Path) -> io::Result<Box<dyn StagedFile>> {
        if self.fail_create {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        Ok(Box::new(MemoryStage {
            buffer: SharedBuffer {
                limit: self.write_limit,
                ..Default::default()
            },
            target: path.to_path_buf(),
            files: Arc::clone(&self.files),
        }))
    }
}

#[test]
fn given_memory_filesystem_when_generating_jsonl_then_writes_rows() {
    let fs = Arc::new(MemoryFileSystem::with_dataset(Path::new("/data")));
    let service = DivisionService::new(fs.clone());
    let output = PathBuf::from("/out/division.jsonl");

    service
        .generate(
            &DatasetPaths::in_dir(Path::new("/data")),
            &OutputTarget::File(output.clone()),
            OutputFormat::Jsonl,
            "nested",
        )
        .unwrap();

    let content = fs.file(&output).expect("output committed");
    assert_eq!(content.lines().count(), 7);
    assert!(content.lines().next().unwrap().contains("\"left\":1"));
}

#[test]
fn given_unwritable_output_when_generating_then_errors() {
    let fs = Arc::new(MemoryFileSystem {
        fail_create: true,
        ..MemoryFileSystem::with_dataset(Path::new("/data"))
    });
    let service = DivisionService::new(fs);

    let err = service
        .generate(
            &DatasetPaths::in_dir(Path::new("/data")),
            &OutputTarget::File(PathBuf::from("/out/division.sql")),
            OutputFormat::Sql,
            "nested",
        )
        .unwrap_err();

    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    assert!(err.to_string().contains("/out/division.sql"));
}

#[test]
fn given_dash_when_building_output_target_then_selects_stdout() {
    assert_eq!(OutputTarget::from_path(Path::new("-")), OutputTarget::Stdout);
    assert_eq!(
        OutputTarget::from_path(Path::new("x.sql")),
        OutputTarget::File(PathBuf::from("x.sql"))
    );
}

#[test]
fn given_write_failure_mid_emission_when_generating_then_target_is_not_created() {
    // Arrange: room for the first statement only
    let fs = Arc::new(MemoryFileSystem {
        write_limit: Some(100),
        ..MemoryFileSystem::with_dataset(Path::new("/data"))
    });
    let service = DivisionService::new(fs.clone());
    let output = PathBuf::from("/out/division.sql");

    // Act
    let err = service
        .generate(
            &DatasetPaths::in_dir(Path::new("/data")),
            &OutputTarget::File(output.clone()),
            OutputFormat::Sql,
            "nested",
        )
        .unwrap_err();

    // Assert
    match err {
        ApplicationError::Emit { code, source } => {
            assert_eq!(code, "1101");
            assert_eq!(source.kind(), io::ErrorKind::WriteZero);
        }
        other => panic!("expected Emit error, got {:?}", other),
    }
    assert!(fs.file(&output).is_none());
}

#[test]
fn given_failing_load_when_generating_over_existing_file_then_previous_content_survives() {
    let temp = TempDir::new().unwrap();
    let paths = create_dataset(&temp, STREETS);
    let output = temp.path().join("division.sql");
    std::fs::write(&output, "-- previous run\n").unwrap();
    std::fs::remove_file(&paths.cities).unwrap();

    assert!(real_service()
        .generate(&paths, &OutputTarget::File(output.clone()), OutputFormat::Sql, "nested")
        .is_err());

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "-- previous run\n");
}

#[test]
fn given_cities_without_parent_code_when_generating_then_pid_is_province_code() {
    let temp = TempDir::new().unwrap();
    let paths = create_dataset(&temp, "[]");
    std::fs::write(
        &paths.cities,
        r#"[{"code": "1101", "name": "Beijing City"}, {"code": "1301", "name": "Shijiazhuang"}]"#,
    )
    .unwrap();
    let output = temp.path().join("division.sql");

    real_service()
        .generate(&paths, &OutputTarget::File(output.clone()), OutputFormat::Sql, "nested")
        .unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("VALUES(1101, 'Beijing City', 11, 2, 2, 5);"));
    assert!(content.contains("VALUES(110101, 'Dongcheng', 1101, 3, 3, 4);"));
    assert!(!content.contains(", ,"));
}
