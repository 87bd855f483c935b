use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use broadside_core::consts::SLIDE_METADATA_FILE_NAME;
use tempfile::TempDir;

/// A synthetic slide on disk, removed when dropped.
pub struct TestSlide {
    pub dir: TempDir,
    pub root: PathBuf,
}

impl TestSlide {
    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(SLIDE_METADATA_FILE_NAME)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("processed")
    }
}

/// Build a slide named `slide-1` from `(scene, round, tile_count)` entries
/// and write metadata declaring `declared`.
///
/// Directories are created in the order the entries are given.
pub fn build_test_slide(rounds: &[(&str, &str, usize)], declared: &[&str]) -> TestSlide {
    let dir = tempfile::tempdir().expect("create temp dir");
    let root = dir.path().join("slide-1");
    fs::create_dir_all(&root).expect("create slide root");

    for &(scene, round, count) in rounds {
        add_round(&root.join(scene).join("tiles").join(round), count);
    }
    write_metadata(&root, declared);

    TestSlide { dir, root }
}

pub fn add_round(round_dir: &Path, tile_count: usize) {
    fs::create_dir_all(round_dir).expect("create round dir");
    for i in 0..tile_count {
        fs::write(round_dir.join(format!("tile-{i:03}.ome.tiff")), b"").expect("write tile");
    }
}

pub fn write_metadata(root: &Path, declared: &[&str]) {
    let polygons: Vec<String> = declared
        .iter()
        .map(|name| format!(r#"{{"name": "{name}", "wkt": "POLYGON EMPTY"}}"#))
        .collect();
    let json = format!(
        r#"{{"polygons": [{}], "focusPoints": [], "objName": "20x"}}"#,
        polygons.join(", ")
    );
    fs::write(root.join(SLIDE_METADATA_FILE_NAME), json).expect("write metadata");
}

pub fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn paths(values: &[&str]) -> Vec<PathBuf> {
    values.iter().map(PathBuf::from).collect()
}

/// Shared buffer the test subscriber formats log lines into.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber and return its result together
/// with every warning (or worse) it logged, formatted without colors.
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (value, logs)
}
