pub mod config;
pub mod layout;
mod orchestrator;
mod types;

pub use orchestrator::{run_pipeline, run_pipeline_reported};
pub use types::{PipelineStage, ProgressReporter, RunReport, SceneOutput, StageFailure};
