use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{TILES_DIR_NAME, TILE_EXTENSIONS};
use crate::error::Result;
use crate::order::compare_round_names;

/// One imaging pass over a scene and the tiles it produced.
#[derive(Clone, Debug)]
pub struct Round {
    name: String,
    path: PathBuf,
    tiles: Vec<PathBuf>,
}

impl Round {
    fn open(path: PathBuf, name: String) -> Result<Self> {
        let mut tiles = Vec::new();
        for entry in fs::read_dir(&path)? {
            let tile = entry?.path();
            if tile.is_file() && is_tile(&tile) {
                tiles.push(tile);
            }
        }
        tiles.sort();
        Ok(Self { name, path, tiles })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tiles(&self) -> &[PathBuf] {
        &self.tiles
    }
}

fn is_tile(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TILE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// A spatial region of a slide, imaged over one or more rounds.
///
/// Rounds live in `<scene>/tiles/<round>/`. When a round selection is given,
/// rounds outside of it are never instantiated and stay invisible to every
/// lookup on this scene.
#[derive(Clone, Debug)]
pub struct Scene {
    name: String,
    path: PathBuf,
    rounds: Vec<Round>,
}

impl Scene {
    pub fn open(path: &Path, selected_rounds: Option<&BTreeSet<String>>) -> Result<Self> {
        let name = dir_name(path);
        let tiles_dir = path.join(TILES_DIR_NAME);

        let mut rounds = Vec::new();
        for entry in fs::read_dir(&tiles_dir)? {
            let round_path = entry?.path();
            if !round_path.is_dir() {
                continue;
            }
            let round_name = dir_name(&round_path);
            if let Some(selected) = selected_rounds {
                if !selected.contains(&round_name) {
                    continue;
                }
            }
            rounds.push(Round::open(round_path, round_name)?);
        }
        rounds.sort_by(|a, b| compare_round_names(&a.name, &b.name));

        debug!(scene = %name, rounds = rounds.len(), "Opened scene");
        Ok(Self {
            name,
            path: path.to_path_buf(),
            rounds,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn round_names(&self) -> Vec<String> {
        self.rounds.iter().map(|r| r.name.clone()).collect()
    }

    pub fn round(&self, name: &str) -> Option<&Round> {
        self.rounds.iter().find(|r| r.name == name)
    }

    pub fn has_round(&self, name: &str) -> bool {
        self.round(name).is_some()
    }

    /// Tiles for `round`, or an empty slice if this scene lacks it.
    pub fn tile_paths_for_round(&self, round: &str) -> &[PathBuf] {
        self.round(round).map(Round::tiles).unwrap_or(&[])
    }

    pub fn tile_count(&self) -> usize {
        self.rounds.iter().map(|r| r.tiles.len()).sum()
    }

    /// One-line description used in slide summaries.
    pub fn summary(&self) -> String {
        let rounds: Vec<String> = self
            .rounds
            .iter()
            .map(|r| format!("{} ({} tiles)", r.name, r.tiles.len()))
            .collect();
        format!("scene {}: {}", self.name, rounds.join(", "))
    }
}

pub(super) fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
