use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::consts::{SLIDE_METADATA_FILE_NAME, TILES_DIR_NAME};
use crate::error::{BroadsideError, Result};

use super::metadata::read_declared_scene_names;
use super::scene::{dir_name, Scene};

/// Narrowing and strictness options applied while building a [`Slide`].
#[derive(Clone, Debug, Default)]
pub struct CatalogOptions {
    /// Only these scenes are instantiated. Unknown names are reported.
    pub selected_scenes: Option<BTreeSet<String>>,
    /// Only these rounds are instantiated in every scene.
    pub selected_rounds: Option<BTreeSet<String>>,
    /// Escalate reconciliation mismatches to errors instead of warnings.
    pub strict: bool,
}

/// A multi-scene, multi-round acquisition.
///
/// Built once from a read-only scan; immutable afterwards.
#[derive(Clone, Debug)]
pub struct Slide {
    path: PathBuf,
    name: String,
    metadata_path: PathBuf,
    discovered_scene_names: Vec<String>,
    scenes: Vec<Scene>,
}

/// Discover and validate the slide hierarchy rooted at `root`.
///
/// The filesystem is authoritative for scene membership: a scene is any
/// immediate subdirectory of `root` holding a `tiles` directory. Scenes
/// declared in the metadata but missing on disk (or vice versa) are reported
/// and then ignored, unless `options.strict` is set.
pub fn build_slide(root: &Path, metadata_path: &Path, options: &CatalogOptions) -> Result<Slide> {
    if !root.exists() {
        return Err(BroadsideError::InvalidSlide {
            path: root.to_path_buf(),
            reason: "slide directory does not exist".into(),
        });
    }
    if !metadata_path.exists() {
        return Err(BroadsideError::InvalidSlide {
            path: root.to_path_buf(),
            reason: format!("metadata file {} does not exist", metadata_path.display()),
        });
    }

    let declared = read_declared_scene_names(metadata_path)?;
    let discovered = discover_scene_names(root)?;

    let mismatch: Vec<&String> = declared.symmetric_difference(&discovered).collect();
    if !mismatch.is_empty() {
        let message = format!(
            "scenes in metadata and on filesystem differ ({:?}); using filesystem",
            mismatch
        );
        if options.strict {
            return Err(BroadsideError::Reconciliation(message));
        }
        warn!(slide = %root.display(), mismatched = ?mismatch, "Mismatch between scenes in metadata and scenes on filesystem; using filesystem");
    }

    let mut retained = discovered.clone();
    if let Some(selected) = &options.selected_scenes {
        let unknown: Vec<&String> = selected.difference(&discovered).collect();
        if !unknown.is_empty() {
            if options.strict {
                return Err(BroadsideError::Reconciliation(format!(
                    "unrecognized scene names: {:?}",
                    unknown
                )));
            }
            warn!(unknown = ?unknown, "Unrecognized scene names");
        }
        retained = retained.intersection(selected).cloned().collect();
    }

    // BTreeSet iteration is already lexicographic.
    let scenes = retained
        .iter()
        .map(|name| Scene::open(&root.join(name), options.selected_rounds.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let slide = Slide {
        path: root.to_path_buf(),
        name: dir_name(root),
        metadata_path: metadata_path.to_path_buf(),
        discovered_scene_names: discovered.into_iter().collect(),
        scenes,
    };

    if let Some(selected) = &options.selected_rounds {
        let known = slide.round_names();
        let unknown: Vec<&String> = selected.iter().filter(|r| !known.contains(r)).collect();
        if !unknown.is_empty() {
            warn!(unknown = ?unknown, "Unrecognized round names");
        }
    }

    info!(
        slide = %slide.name,
        scenes = slide.scenes.len(),
        rounds = slide.round_names().len(),
        "Built slide catalog"
    );
    Ok(slide)
}

fn discover_scene_names(root: &Path) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.join(TILES_DIR_NAME).is_dir() {
            names.insert(dir_name(&path));
        }
    }
    Ok(names)
}

impl Slide {
    /// Open a slide using the metadata file stored at its root.
    pub fn open(root: &Path, options: &CatalogOptions) -> Result<Self> {
        build_slide(root, &root.join(SLIDE_METADATA_FILE_NAME), options)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    /// Scenes found on disk, before any selection was applied.
    pub fn discovered_scene_names(&self) -> &[String] {
        &self.discovered_scene_names
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene(&self, name: &str) -> Result<&Scene> {
        self.scenes
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| BroadsideError::SceneNotFound(name.to_string()))
    }

    pub fn scene_names(&self) -> Vec<String> {
        self.scenes.iter().map(|s| s.name().to_string()).collect()
    }

    /// Union of all scenes' round names, in first-seen order across scenes.
    pub fn round_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for scene in &self.scenes {
            for round in scene.rounds() {
                if !names.iter().any(|n| n == round.name()) {
                    names.push(round.name().to_string());
                }
            }
        }
        names
    }

    /// Whether `scene` exists in this catalog and contains `round`.
    pub fn contains(&self, scene: &str, round: &str) -> bool {
        self.scenes
            .iter()
            .any(|s| s.name() == scene && s.has_round(round))
    }

    /// Tiles of `round` across every scene, in scene order.
    ///
    /// An unknown round yields an empty list and a warning.
    pub fn tile_paths_for_round(&self, round: &str) -> Vec<PathBuf> {
        if !self.scenes.iter().any(|s| s.has_round(round)) {
            warn!(round, "No tile paths found for round");
            return Vec::new();
        }
        self.scenes
            .iter()
            .flat_map(|s| s.tile_paths_for_round(round).iter().cloned())
            .collect()
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("slide:             {}", self.name),
            format!("location:          {}", self.path.display()),
            format!("scenes found:      {:?}", self.discovered_scene_names),
            format!("scenes to process: {:?}", self.scene_names()),
            format!("rounds to process: {:?}", self.round_names()),
        ];
        lines.extend(self.scenes.iter().map(Scene::summary));
        lines.join("\n")
    }
}
