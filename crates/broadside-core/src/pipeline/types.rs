use std::path::PathBuf;

use crate::sync::CycleSequence;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Cataloging,
    IlluminationProfiles,
    Assessment,
    TileLists,
    Stacking,
    CycleOrdering,
    Registration,
    FinalImage,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cataloging => write!(f, "Cataloging slide"),
            Self::IlluminationProfiles => write!(f, "Illumination profiles"),
            Self::Assessment => write!(f, "Assessing profiles"),
            Self::TileLists => write!(f, "Writing tile lists"),
            Self::Stacking => write!(f, "Stacking"),
            Self::CycleOrdering => write!(f, "Ordering cycles"),
            Self::Registration => write!(f, "Registering"),
            Self::FinalImage => write!(f, "Building pyramids"),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// keys processed in this stage, if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One key within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// A key whose stage invocation failed. Independent keys keep going.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: PipelineStage,
    pub key: String,
    pub message: String,
}

/// Final artifact of one fully processed scene.
#[derive(Clone, Debug)]
pub struct SceneOutput {
    pub sequence: CycleSequence,
    pub final_image: PathBuf,
}

#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub scenes: Vec<SceneOutput>,
    /// `stage/key` entries whose outputs were already present.
    pub reused: Vec<String>,
    pub failures: Vec<StageFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn scene(&self, name: &str) -> Option<&SceneOutput> {
        self.scenes.iter().find(|s| s.sequence.scene() == name)
    }
}
