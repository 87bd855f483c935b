use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use broadside_core::consts::{DEFAULT_MAX_ILLUMINATION_SAMPLES, DEFAULT_REGISTRATION_CONCURRENCY};
use broadside_core::pipeline::config::{PipelineConfig, PyramidVariant, RunnerMode};
use broadside_core::pipeline::{run_pipeline_reported, PipelineStage, ProgressReporter};
use broadside_core::stage::runner_for;
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use crate::summary::{print_pipeline_summary, print_run_report};

#[derive(Clone, Copy, ValueEnum)]
pub enum PyramidArg {
    Zarr,
    ZarrToTiff,
}

#[derive(Args)]
pub struct RunArgs {
    /// Slide directory (overrides the config file's slide)
    pub slide: PathBuf,

    /// Pipeline config file (TOML). Flags given alongside it override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Slide metadata file (defaults to <slide>/.slide.json)
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Directory for derived artifacts (defaults to <slide>/processed)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Comma-separated scene names to process
    #[arg(long, value_delimiter = ',')]
    pub scenes: Vec<String>,

    /// Comma-separated round names to process
    #[arg(long, value_delimiter = ',')]
    pub rounds: Vec<String>,

    /// Fail when metadata and filesystem disagree
    #[arg(long)]
    pub strict: bool,

    /// Create placeholder outputs instead of running external tools
    #[arg(long)]
    pub stub: bool,

    /// Maximum number of tiles sampled per round for illumination profiles
    #[arg(long, default_value_t = DEFAULT_MAX_ILLUMINATION_SAMPLES, conflicts_with = "config")]
    pub max_samples: usize,

    /// Also estimate darkfield profiles
    #[arg(long)]
    pub darkfield: bool,

    /// Directory of dark frames for hot pixel removal (required unless --stub)
    #[arg(long)]
    pub dark_dir: Option<PathBuf>,

    /// Skip profile assessment
    #[arg(long)]
    pub no_assessment: bool,

    /// Maximum number of scenes registered at once
    #[arg(long, default_value_t = DEFAULT_REGISTRATION_CONCURRENCY, conflicts_with = "config")]
    pub registration_concurrency: usize,

    /// Final image format
    #[arg(long, value_enum, default_value_t = PyramidArg::Zarr, conflicts_with = "config")]
    pub pyramid: PyramidArg,
}

/// Drives a progress bar from pipeline stage events.
struct BarReporter {
    bar: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.bar.reset();
        self.bar.set_length(total_items.unwrap_or(1) as u64);
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        self.bar.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
    }
}

pub fn run(args: &RunArgs) -> Result<()> {
    let mut config = match args.config {
        Some(ref config_path) => load_config(config_path)?,
        None => config_from_defaults(args),
    };
    apply_overrides(&mut config, args);
    config.validate()?;

    print_pipeline_summary(&config);

    let bar = ProgressBar::new(1);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:24} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { bar: bar.clone() });

    let report = run_pipeline_reported(&config, runner_for(config.runner), reporter)?;
    bar.finish_with_message("Done");

    print_run_report(&report);
    if !report.is_success() {
        bail!("{} stage invocation(s) failed", report.failures.len());
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<PipelineConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).context("Invalid pipeline config")
}

/// Settings that only come from flags when no config file is given.
fn config_from_defaults(args: &RunArgs) -> PipelineConfig {
    let mut config = PipelineConfig::for_slide(&args.slide);
    config.illumination.max_samples = args.max_samples;
    config.registration.concurrency = args.registration_concurrency;
    config.pyramid.variant = match args.pyramid {
        PyramidArg::Zarr => PyramidVariant::Zarr,
        PyramidArg::ZarrToTiff => PyramidVariant::ZarrToTiff,
    };
    config
}

/// Apply every explicitly given flag on top of `config`.
fn apply_overrides(config: &mut PipelineConfig, args: &RunArgs) {
    config.slide = args.slide.clone();
    if let Some(ref metadata) = args.metadata {
        config.metadata = Some(metadata.clone());
    }
    if let Some(ref output_dir) = args.output_dir {
        config.output_dir = Some(output_dir.clone());
    }
    if !args.scenes.is_empty() {
        config.scenes = Some(args.scenes.clone());
    }
    if !args.rounds.is_empty() {
        config.rounds = Some(args.rounds.clone());
    }
    if args.strict {
        config.strict = true;
    }
    if args.stub {
        config.runner = RunnerMode::Stub;
    }
    if args.darkfield {
        config.illumination.compute_darkfield = true;
    }
    if let Some(ref dark_dir) = args.dark_dir {
        config.illumination.dark_dir = Some(dark_dir.clone());
    }
    if args.no_assessment {
        config.assessment.enabled = false;
    }
}
