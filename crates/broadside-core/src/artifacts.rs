//! Keys correlating derived artifacts across stages, and the plain-text
//! files handed to external tools.

use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::ROUND_INDEX_HEADER;
use crate::error::Result;
use crate::sync::CycleSequence;

/// Composite key of a per-(scene, round) artifact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneRoundKey {
    pub scene: String,
    pub round: String,
}

impl SceneRoundKey {
    pub fn new(scene: impl Into<String>, round: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            round: round.into(),
        }
    }
}

impl fmt::Display for SceneRoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scene, self.round)
    }
}

/// Flatfield and darkfield estimated for one round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IlluminationProfile {
    pub flatfield: PathBuf,
    pub darkfield: PathBuf,
}

/// A (scene, round) stack together with the tile list it was built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackArtifact {
    pub round: String,
    pub tile_list: PathBuf,
    pub stack: PathBuf,
}

/// Write `paths` one per line, creating parent directories.
pub fn write_path_list(dst: &Path, paths: &[PathBuf]) -> Result<()> {
    ensure_parent(dst)?;
    let mut out = BufWriter::new(fs::File::create(dst)?);
    for path in paths {
        writeln!(out, "{}", path.display())?;
    }
    out.flush()?;
    Ok(())
}

/// Read a path list written by [`write_path_list`]. Blank lines are skipped.
pub fn read_path_list(src: &Path) -> Result<Vec<PathBuf>> {
    let contents = fs::read_to_string(src)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Write the tab-separated `round`/`tiles-path` index of a cycle sequence.
///
/// Rows follow the sequence, which is already in round order.
pub fn write_round_index(dst: &Path, sequence: &CycleSequence) -> Result<()> {
    ensure_parent(dst)?;
    let mut out = BufWriter::new(fs::File::create(dst)?);
    writeln!(out, "{}", ROUND_INDEX_HEADER.join("\t"))?;
    for entry in sequence.entries() {
        writeln!(out, "{}\t{}", entry.round, entry.tile_list.display())?;
    }
    out.flush()?;
    Ok(())
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
