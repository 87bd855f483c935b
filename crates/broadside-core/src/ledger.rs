use std::path::{Path, PathBuf};

use tracing::info;

/// Answers whether an artifact path is present.
///
/// The filesystem implementation is [`FsProbe`]; tests inject closures.
pub trait PathProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsProbe;

impl PathProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

impl<F> PathProbe for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn exists(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Resume gate for derived artifacts.
///
/// A stage needs to run iff any of its declared outputs is missing. Presence
/// is the only check: an artifact produced with different parameters, or a
/// truncated one, is indistinguishable from a good one.
#[derive(Clone, Debug, Default)]
pub struct ArtifactLedger<P: PathProbe = FsProbe> {
    probe: P,
}

impl ArtifactLedger<FsProbe> {
    pub fn filesystem() -> Self {
        Self { probe: FsProbe }
    }
}

impl<P: PathProbe> ArtifactLedger<P> {
    pub fn with_probe(probe: P) -> Self {
        Self { probe }
    }

    /// Declared outputs that are not present.
    pub fn missing(&self, expected: &[PathBuf]) -> Vec<PathBuf> {
        expected
            .iter()
            .filter(|p| !self.probe.exists(p))
            .cloned()
            .collect()
    }

    pub fn needs_compute(&self, expected: &[PathBuf]) -> bool {
        expected.iter().any(|p| !self.probe.exists(p))
    }

    /// Like [`needs_compute`](Self::needs_compute), logging the skip for `key`.
    pub fn gate(&self, stage: &str, key: &str, expected: &[PathBuf]) -> bool {
        let needed = self.needs_compute(expected);
        if !needed {
            info!(stage, key, "Outputs already present; skipping");
        }
        needed
    }
}
