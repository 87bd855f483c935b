use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use tracing::{debug, info};

use crate::artifacts::ensure_parent;
use crate::error::{BroadsideError, Result};
use crate::pipeline::config::RunnerMode;

use super::invocation::StageInvocation;

/// Executes stage invocations. Shared across worker threads.
pub trait StageRunner: Send + Sync {
    /// Human-readable runner name.
    fn name(&self) -> &str;

    /// Run `invocation` and return its declared outputs once they exist.
    fn invoke(&self, invocation: &StageInvocation) -> Result<Vec<PathBuf>>;
}

/// Runs the real external tool as a child process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

impl StageRunner for ProcessRunner {
    fn name(&self) -> &str {
        "process"
    }

    fn invoke(&self, invocation: &StageInvocation) -> Result<Vec<PathBuf>> {
        for output in &invocation.outputs {
            ensure_parent(output)?;
        }

        debug!(stage = %invocation.stage, command = %invocation.command_line(), "Invoking external stage");
        let output = Command::new(&invocation.command)
            .args(invocation.render_args())
            .output()
            .map_err(|e| BroadsideError::ExternalStage {
                stage: invocation.stage.clone(),
                exit_code: None,
                stderr: format!("failed to start {}: {e}", invocation.command),
            })?;

        if !output.status.success() {
            return Err(BroadsideError::ExternalStage {
                stage: invocation.stage.clone(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let missing: Vec<String> = invocation
            .outputs
            .iter()
            .filter(|p| !p.exists())
            .map(|p| p.display().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(BroadsideError::ExternalStage {
                stage: invocation.stage.clone(),
                exit_code: output.status.code(),
                stderr: format!("declared outputs missing: {}", missing.join(", ")),
            });
        }

        Ok(invocation.outputs.clone())
    }
}

/// Dry-run runner: creates empty placeholders at every declared output
/// instead of running the tool. Existing files are left untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubRunner;

impl StageRunner for StubRunner {
    fn name(&self) -> &str {
        "stub"
    }

    fn invoke(&self, invocation: &StageInvocation) -> Result<Vec<PathBuf>> {
        info!(stage = %invocation.stage, command = %invocation.command_line(), "Stub run");
        for output in &invocation.outputs {
            ensure_parent(output)?;
            if !output.exists() {
                OpenOptions::new().create(true).append(true).open(output)?;
            }
        }
        Ok(invocation.outputs.clone())
    }
}

pub fn runner_for(mode: RunnerMode) -> Arc<dyn StageRunner> {
    match mode {
        RunnerMode::Process => Arc::new(ProcessRunner),
        RunnerMode::Stub => Arc::new(StubRunner),
    }
}
