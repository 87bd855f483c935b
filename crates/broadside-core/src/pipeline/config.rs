use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogOptions;
use crate::consts::{
    DEFAULT_ASSESSMENT_SAMPLES, DEFAULT_MAXIMUM_SHIFT, DEFAULT_MAX_ILLUMINATION_SAMPLES,
    DEFAULT_PYRAMID_DOWNSCALE, DEFAULT_PYRAMID_TILE_SIZE, DEFAULT_PYRAMID_TOP_LEVEL_SIZE,
    DEFAULT_REGISTRATION_CONCURRENCY, DEFAULT_SAMPLE_SEED, DEFAULT_WORKING_SIZE,
    SLIDE_METADATA_FILE_NAME,
};
use crate::error::{BroadsideError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub slide: PathBuf,
    /// Defaults to `<slide>/.slide.json`.
    #[serde(default)]
    pub metadata: Option<PathBuf>,
    /// Defaults to `<slide>/processed`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub scenes: Option<Vec<String>>,
    #[serde(default)]
    pub rounds: Option<Vec<String>>,
    /// Fail instead of warning when metadata and filesystem disagree.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub runner: RunnerMode,
    #[serde(default)]
    pub illumination: IlluminationConfig,
    #[serde(default)]
    pub assessment: AssessmentConfig,
    #[serde(default)]
    pub stacking: StackingConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub pyramid: PyramidConfig,
    #[serde(default)]
    pub commands: StageCommands,
}

impl PipelineConfig {
    pub fn for_slide(slide: impl Into<PathBuf>) -> Self {
        Self {
            slide: slide.into(),
            metadata: None,
            output_dir: None,
            scenes: None,
            rounds: None,
            strict: false,
            runner: RunnerMode::default(),
            illumination: IlluminationConfig::default(),
            assessment: AssessmentConfig::default(),
            stacking: StackingConfig::default(),
            registration: RegistrationConfig::default(),
            pyramid: PyramidConfig::default(),
            commands: StageCommands::default(),
        }
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.metadata
            .clone()
            .unwrap_or_else(|| self.slide.join(SLIDE_METADATA_FILE_NAME))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.slide.join("processed"))
    }

    /// Reject settings the external tools cannot run with.
    ///
    /// The illumination tool requires a dark-frame directory, so a process
    /// run without one would fail every round.
    pub fn validate(&self) -> Result<()> {
        if self.runner == RunnerMode::Process && self.illumination.dark_dir.is_none() {
            return Err(BroadsideError::InvalidConfig(
                "illumination.dark_dir is required when running external tools".into(),
            ));
        }
        Ok(())
    }

    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            selected_scenes: self.scenes.as_ref().map(|s| s.iter().cloned().collect::<BTreeSet<_>>()),
            selected_rounds: self.rounds.as_ref().map(|r| r.iter().cloned().collect::<BTreeSet<_>>()),
            strict: self.strict,
        }
    }
}

/// How stage invocations are executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunnerMode {
    /// Run the external tools.
    #[default]
    Process,
    /// Create empty placeholder outputs only.
    Stub,
}

impl fmt::Display for RunnerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process => write!(f, "Process"),
            Self::Stub => write!(f, "Stub"),
        }
    }
}

/// Pass-through resource limits for one external stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResources {
    pub n_cpus: Option<usize>,
    pub memory_limit: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IlluminationConfig {
    /// Maximum number of tiles sampled per round.
    pub max_samples: usize,
    pub seed: u64,
    pub working_size: usize,
    pub compute_darkfield: bool,
    /// Directory of dark frames used for hot pixel removal.
    pub dark_dir: Option<PathBuf>,
    pub resources: StageResources,
}

impl Default for IlluminationConfig {
    fn default() -> Self {
        Self {
            max_samples: DEFAULT_MAX_ILLUMINATION_SAMPLES,
            seed: DEFAULT_SAMPLE_SEED,
            working_size: DEFAULT_WORKING_SIZE,
            compute_darkfield: false,
            dark_dir: None,
            resources: StageResources::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub enabled: bool,
    /// Number of tiles per round corrected for visual assessment.
    pub sample_count: usize,
    pub resources: StageResources,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_count: DEFAULT_ASSESSMENT_SAMPLES,
            resources: StageResources::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StackingConfig {
    pub resources: StageResources,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub align_channel: usize,
    pub filter_sigma: f64,
    pub maximum_shift: f64,
    /// Maximum number of scenes registered at the same time.
    pub concurrency: usize,
    /// Worker threads per registration. The tool takes no memory limit.
    pub n_cpus: Option<usize>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            align_channel: 0,
            filter_sigma: 0.0,
            maximum_shift: DEFAULT_MAXIMUM_SHIFT,
            concurrency: DEFAULT_REGISTRATION_CONCURRENCY,
            n_cpus: None,
        }
    }
}

/// How the final per-scene image is produced from registered channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PyramidVariant {
    /// Write an OME-Zarr pyramid directly.
    #[default]
    Zarr,
    /// Write an intermediate OME-Zarr pyramid, then convert it to a tiled
    /// pyramidal BigTIFF.
    ZarrToTiff,
}

impl fmt::Display for PyramidVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zarr => write!(f, "Zarr"),
            Self::ZarrToTiff => write!(f, "Zarr to TIFF"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidConfig {
    pub variant: PyramidVariant,
    pub tile_size: usize,
    pub max_top_level_size: usize,
    pub downscale: usize,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            variant: PyramidVariant::default(),
            tile_size: DEFAULT_PYRAMID_TILE_SIZE,
            max_top_level_size: DEFAULT_PYRAMID_TOP_LEVEL_SIZE,
            downscale: DEFAULT_PYRAMID_DOWNSCALE,
        }
    }
}

/// Executable invoked for each external stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageCommands {
    pub illumination: String,
    pub assessment: String,
    pub stacking: String,
    pub registration: String,
    pub pyramid: String,
    pub conversion: String,
}

impl Default for StageCommands {
    fn default() -> Self {
        Self {
            illumination: "make-illum-profiles".into(),
            assessment: "assess-illum-profiles".into(),
            stacking: "make-stack".into(),
            registration: "register-and-stitch".into(),
            pyramid: "make-zarr-pyramid".into(),
            conversion: "convert-zarr-to-tiff".into(),
        }
    }
}
