use std::path::PathBuf;

use anyhow::Result;
use broadside_core::catalog::{build_slide, CatalogOptions};
use clap::Args;

use super::{metadata_or_default, to_selection};
use crate::summary::print_slide_summary;

#[derive(Args)]
pub struct InfoArgs {
    /// Slide directory
    pub slide: PathBuf,

    /// Slide metadata file (defaults to <slide>/.slide.json)
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Comma-separated scene names to include
    #[arg(long, value_delimiter = ',')]
    pub scenes: Vec<String>,

    /// Comma-separated round names to include
    #[arg(long, value_delimiter = ',')]
    pub rounds: Vec<String>,

    /// Fail when metadata and filesystem disagree
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let options = CatalogOptions {
        selected_scenes: to_selection(&args.scenes),
        selected_rounds: to_selection(&args.rounds),
        strict: args.strict,
    };
    let metadata = metadata_or_default(&args.slide, args.metadata.as_ref());
    let slide = build_slide(&args.slide, &metadata, &options)?;

    print_slide_summary(&slide);
    Ok(())
}
