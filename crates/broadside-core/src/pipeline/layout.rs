use std::path::{Path, PathBuf};

use crate::artifacts::{IlluminationProfile, SceneRoundKey};
use crate::pipeline::config::PyramidVariant;

/// Where every derived artifact of a run lives.
///
/// Each key owns a distinct directory, so no two tasks ever write the same
/// path.
#[derive(Clone, Debug)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn illumination_dir(&self, round: &str) -> PathBuf {
        self.root.join("illumination").join(round)
    }

    pub fn illumination_tile_list(&self, round: &str) -> PathBuf {
        self.illumination_dir(round).join("tiles.txt")
    }

    pub fn illumination_profile(&self, round: &str) -> IlluminationProfile {
        let dir = self.illumination_dir(round);
        IlluminationProfile {
            flatfield: dir.join("flatfield.tiff"),
            darkfield: dir.join("darkfield.tiff"),
        }
    }

    fn assessment_dir(&self, round: &str) -> PathBuf {
        self.root.join("assessment").join(round)
    }

    pub fn assessment_tile_list(&self, round: &str) -> PathBuf {
        self.assessment_dir(round).join("tiles.txt")
    }

    pub fn assessment_report(&self, round: &str) -> PathBuf {
        self.assessment_dir(round).join("assessment.csv")
    }

    fn stack_dir(&self, key: &SceneRoundKey) -> PathBuf {
        self.root.join("stacks").join(&key.scene).join(&key.round)
    }

    pub fn stack_tile_list(&self, key: &SceneRoundKey) -> PathBuf {
        self.stack_dir(key).join("tiles.txt")
    }

    pub fn stack(&self, key: &SceneRoundKey) -> PathBuf {
        self.stack_dir(key).join("stack.ome.tiff")
    }

    pub fn scene_dir(&self, scene: &str) -> PathBuf {
        self.root.join("scenes").join(scene)
    }

    pub fn round_index(&self, scene: &str) -> PathBuf {
        self.scene_dir(scene).join("rounds.tsv")
    }

    pub fn stack_list(&self, scene: &str) -> PathBuf {
        self.scene_dir(scene).join("stacks.txt")
    }

    fn registered_dir(&self, scene: &str) -> PathBuf {
        self.scene_dir(scene).join("registered")
    }

    /// Output path format handed to the registration tool. The tool renders
    /// it once per (cycle, channel); zero padding keeps a sorted glob in
    /// cycle-major order.
    pub fn registered_format(&self, scene: &str) -> PathBuf {
        self.registered_dir(scene)
            .join("cycle-{cycle:03d}-channel-{channel:03d}.tiff")
    }

    /// Every registration produces at least cycle 0, channel 0.
    pub fn registered_first_channel(&self, scene: &str) -> PathBuf {
        self.registered_dir(scene).join("cycle-000-channel-000.tiff")
    }

    pub fn registered_pattern(&self, scene: &str) -> PathBuf {
        self.registered_dir(scene).join("cycle-*-channel-*.tiff")
    }

    pub fn zarr(&self, scene: &str) -> PathBuf {
        self.scene_dir(scene).join(format!("{scene}.zarr"))
    }

    /// Root group marker written into every Zarr store.
    pub fn zarr_group_marker(&self, scene: &str) -> PathBuf {
        self.zarr(scene).join(".zgroup")
    }

    pub fn ome_tiff(&self, scene: &str) -> PathBuf {
        self.scene_dir(scene).join(format!("{scene}.ome.tiff"))
    }

    /// Final image of `scene` under the given variant.
    pub fn final_image(&self, scene: &str, variant: PyramidVariant) -> PathBuf {
        match variant {
            PyramidVariant::Zarr => self.zarr(scene),
            PyramidVariant::ZarrToTiff => self.ome_tiff(scene),
        }
    }
}
