pub mod config;
pub mod info;
pub mod run;
pub mod sample;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use broadside_core::consts::SLIDE_METADATA_FILE_NAME;

/// Metadata path given on the command line, or the slide's default.
pub(crate) fn metadata_or_default(slide: &Path, metadata: Option<&PathBuf>) -> PathBuf {
    metadata
        .cloned()
        .unwrap_or_else(|| slide.join(SLIDE_METADATA_FILE_NAME))
}

pub(crate) fn to_selection(names: &[String]) -> Option<BTreeSet<String>> {
    if names.is_empty() {
        None
    } else {
        Some(names.iter().cloned().collect())
    }
}
