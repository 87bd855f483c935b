use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BroadsideError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid slide at {path}: {reason}")]
    InvalidSlide { path: PathBuf, reason: String },

    #[error("Invalid slide metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    #[error("Scene reconciliation failed: {0}")]
    Reconciliation(String),

    #[error("External stage '{stage}' failed (exit code {}): {stderr}", display_exit_code(.exit_code))]
    ExternalStage {
        stage: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Invalid pipeline config: {0}")]
    InvalidConfig(String),

    #[error("Synchronization error: {0}")]
    Sync(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

fn display_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, BroadsideError>;
