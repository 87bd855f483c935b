use std::path::PathBuf;

use anyhow::Result;
use broadside_core::catalog::{build_slide, CatalogOptions};
use broadside_core::consts::{DEFAULT_MAX_ILLUMINATION_SAMPLES, DEFAULT_SAMPLE_SEED};
use broadside_core::sampler::Sampler;
use clap::Args;

use super::{metadata_or_default, to_selection};

#[derive(Args)]
pub struct SampleArgs {
    /// Slide directory
    pub slide: PathBuf,

    /// Slide metadata file (defaults to <slide>/.slide.json)
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Comma-separated round names (default: every round)
    #[arg(long, value_delimiter = ',')]
    pub rounds: Vec<String>,

    /// Maximum number of tiles per round
    #[arg(long, default_value_t = DEFAULT_MAX_ILLUMINATION_SAMPLES)]
    pub max_samples: usize,

    /// Shuffle seed
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SEED)]
    pub seed: u64,
}

pub fn run(args: &SampleArgs) -> Result<()> {
    let options = CatalogOptions {
        selected_rounds: to_selection(&args.rounds),
        ..Default::default()
    };
    let metadata = metadata_or_default(&args.slide, args.metadata.as_ref());
    let slide = build_slide(&args.slide, &metadata, &options)?;
    let sampler = Sampler::new(args.seed, args.max_samples);

    for round in slide.round_names() {
        let tiles = slide.tile_paths_for_round(&round);
        let sample = sampler.sample(&tiles);
        println!("# {} ({} of {} tiles)", round, sample.len(), tiles.len());
        for path in sample {
            println!("{}", path.display());
        }
    }
    Ok(())
}
