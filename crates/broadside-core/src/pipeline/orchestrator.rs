use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::artifacts::{
    write_path_list, write_round_index, IlluminationProfile, SceneRoundKey, StackArtifact,
};
use crate::catalog::{build_slide, Slide};
use crate::error::{BroadsideError, Result};
use crate::ledger::ArtifactLedger;
use crate::sampler::Sampler;
use crate::stage::{commands, runner_for, StageInvocation, StageRunner};
use crate::sync::{assemble_cycle_sequences, broadcast_to_members, CycleSequence};

use super::config::PipelineConfig;
use super::layout::RunLayout;
use super::types::{
    NoOpReporter, PipelineStage, ProgressReporter, RunReport, SceneOutput, StageFailure,
};

/// Shared, read-only state of one pipeline run.
struct RunContext<'a> {
    config: &'a PipelineConfig,
    slide: &'a Slide,
    layout: &'a RunLayout,
    ledger: &'a ArtifactLedger,
    runner: &'a dyn StageRunner,
    reporter: &'a dyn ProgressReporter,
}

/// Run the full pipeline with a stage runner and a thread-safe progress
/// reporter.
///
/// Every phase processes its keys in parallel. A failing key is recorded in
/// the returned report and only its dependents are dropped; catalog and
/// artifact-file I/O errors abort the run.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    runner: Arc<dyn StageRunner>,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<RunReport> {
    config.validate()?;

    reporter.begin_stage(PipelineStage::Cataloging, None);
    let slide = build_slide(&config.slide, &config.metadata_path(), &config.catalog_options())?;
    reporter.finish_stage();

    let layout = RunLayout::new(config.output_dir());
    let ledger = ArtifactLedger::filesystem();
    let ctx = RunContext {
        config,
        slide: &slide,
        layout: &layout,
        ledger: &ledger,
        runner: runner.as_ref(),
        reporter: reporter.as_ref(),
    };
    info!(
        slide = slide.name(),
        runner = runner.name(),
        output = %layout.root().display(),
        "Starting pipeline"
    );

    let mut report = RunReport::default();

    let profiles = ctx.illumination_profiles(&mut report);
    if config.assessment.enabled {
        ctx.assess_profiles(&profiles, &mut report);
    }

    let tile_lists = ctx.write_stack_tile_lists()?;
    let jobs = broadcast_to_members(profiles, tile_lists, |key| {
        slide.contains(&key.scene, &key.round)
    });
    let stacks = ctx.stack_rounds(jobs, &mut report);

    let sequences = ctx.order_cycles(stacks, &mut report)?;
    let registered = ctx.register_scenes(sequences, &mut report)?;
    report.scenes = ctx.build_final_images(registered, &mut report);

    info!(
        scenes = report.scenes.len(),
        reused = report.reused.len(),
        failures = report.failures.len(),
        "Pipeline finished"
    );
    Ok(report)
}

/// Run the full pipeline with the runner selected in `config`.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunReport> {
    run_pipeline_reported(config, runner_for(config.runner), Arc::new(NoOpReporter))
}

impl RunContext<'_> {
    /// Run `task` for every item in parallel, collecting successes and
    /// recording failures under the key each task reports.
    fn run_keyed<I, T, F>(
        &self,
        stage: PipelineStage,
        items: Vec<I>,
        report: &mut RunReport,
        task: F,
    ) -> Vec<T>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> (String, Result<T>) + Sync + Send,
    {
        self.reporter.begin_stage(stage, Some(items.len()));
        let done = AtomicUsize::new(0);
        let outcomes: Vec<(String, Result<T>)> = items
            .into_par_iter()
            .map(|item| {
                let outcome = task(item);
                self.reporter
                    .advance(done.fetch_add(1, Ordering::Relaxed) + 1);
                outcome
            })
            .collect();
        self.reporter.finish_stage();

        let mut succeeded = Vec::with_capacity(outcomes.len());
        for (key, outcome) in outcomes {
            match outcome {
                Ok(value) => succeeded.push(value),
                Err(e) => {
                    warn!(%stage, key = %key, error = %e, "Stage failed");
                    report.failures.push(StageFailure {
                        stage,
                        key,
                        message: e.to_string(),
                    });
                }
            }
        }
        succeeded
    }

    /// Invoke unless every declared output already exists. Returns whether
    /// the outputs were reused.
    fn invoke_gated(&self, key: &str, invocation: &StageInvocation) -> Result<bool> {
        if self.ledger.gate(&invocation.stage, key, &invocation.outputs) {
            self.runner.invoke(invocation)?;
            Ok(false)
        } else {
            Ok(true)
        }
    }

    fn illumination_profiles(&self, report: &mut RunReport) -> Vec<(String, IlluminationProfile)> {
        let illum = &self.config.illumination;
        let sampler = Sampler::new(illum.seed, illum.max_samples);

        let profiled = self.run_keyed(
            PipelineStage::IlluminationProfiles,
            self.slide.round_names(),
            report,
            |round| {
                let outcome = self
                    .profile_round(&sampler, &round)
                    .map(|(profile, reused)| (round.clone(), profile, reused));
                (round, outcome)
            },
        );

        profiled
            .into_iter()
            .map(|(round, profile, reused)| {
                if reused {
                    report.reused.push(format!("illumination/{round}"));
                }
                (round, profile)
            })
            .collect()
    }

    fn profile_round(&self, sampler: &Sampler, round: &str) -> Result<(IlluminationProfile, bool)> {
        let sample = sampler.sample(&self.slide.tile_paths_for_round(round));
        if sample.is_empty() {
            return Err(BroadsideError::Pipeline(format!("round {round} has no tiles")));
        }
        let tile_list = self.layout.illumination_tile_list(round);
        write_path_list(&tile_list, &sample)?;

        let profile = self.layout.illumination_profile(round);
        let invocation = commands::illumination_profiles(self.config, &tile_list, &profile);
        let reused = self.invoke_gated(round, &invocation)?;
        Ok((profile, reused))
    }

    fn assess_profiles(&self, profiles: &[(String, IlluminationProfile)], report: &mut RunReport) {
        let assessment = &self.config.assessment;
        let sampler = Sampler::new(self.config.illumination.seed, assessment.sample_count);

        let assessed = self.run_keyed(
            PipelineStage::Assessment,
            profiles.to_vec(),
            report,
            |(round, profile)| {
                let outcome = self
                    .assess_round(&sampler, &round, &profile)
                    .map(|reused| (round.clone(), reused));
                (round, outcome)
            },
        );

        for (round, reused) in assessed {
            if reused {
                report.reused.push(format!("assessment/{round}"));
            }
        }
    }

    fn assess_round(
        &self,
        sampler: &Sampler,
        round: &str,
        profile: &IlluminationProfile,
    ) -> Result<bool> {
        let sample = sampler.sample(&self.slide.tile_paths_for_round(round));
        let tile_list = self.layout.assessment_tile_list(round);
        write_path_list(&tile_list, &sample)?;
        let invocation = commands::assessment(
            self.config,
            &tile_list,
            profile,
            &self.layout.assessment_report(round),
        );
        self.invoke_gated(round, &invocation)
    }

    /// Write one tile list per (scene, round) present in the catalog.
    fn write_stack_tile_lists(&self) -> Result<Vec<(SceneRoundKey, PathBuf)>> {
        self.reporter.begin_stage(PipelineStage::TileLists, None);
        let mut lists = Vec::new();
        for scene in self.slide.scenes() {
            for round in scene.rounds() {
                let key = SceneRoundKey::new(scene.name(), round.name());
                let path = self.layout.stack_tile_list(&key);
                write_path_list(&path, round.tiles())?;
                lists.push((key, path));
            }
        }
        self.reporter.finish_stage();
        Ok(lists)
    }

    fn stack_rounds(
        &self,
        jobs: Vec<(SceneRoundKey, PathBuf, IlluminationProfile)>,
        report: &mut RunReport,
    ) -> Vec<(String, StackArtifact)> {
        self.run_keyed(
            PipelineStage::Stacking,
            jobs,
            report,
            |(key, tile_list, profile)| {
                let stack = self.layout.stack(&key);
                let invocation = commands::stack(self.config, &tile_list, &profile, &stack);
                let outcome = self.runner.invoke(&invocation).map(|_| {
                    (
                        key.scene.clone(),
                        StackArtifact {
                            round: key.round.clone(),
                            tile_list,
                            stack,
                        },
                    )
                });
                (key.to_string(), outcome)
            },
        )
    }

    /// Regroup stacks per scene in round order and write the per-scene index
    /// files. Scenes missing any of their rounds, including scenes with no
    /// stacks at all, are reported and not registered.
    fn order_cycles(
        &self,
        stacks: Vec<(String, StackArtifact)>,
        report: &mut RunReport,
    ) -> Result<Vec<CycleSequence>> {
        self.reporter.begin_stage(PipelineStage::CycleOrdering, None);
        let mut by_scene: HashMap<String, CycleSequence> = assemble_cycle_sequences(stacks)?
            .into_iter()
            .map(|s| (s.scene().to_string(), s))
            .collect();

        let mut complete = Vec::new();
        for scene in self.slide.scenes() {
            let rounds = scene.round_names();
            if rounds.is_empty() {
                continue;
            }
            let sequence = by_scene.remove(scene.name());
            let present: Vec<&str> = sequence.as_ref().map(|s| s.rounds()).unwrap_or_default();
            let missing: Vec<&String> = rounds
                .iter()
                .filter(|r| !present.contains(&r.as_str()))
                .collect();

            let sequence = match sequence {
                Some(sequence) if missing.is_empty() => sequence,
                _ => {
                    warn!(scene = %scene.name(), missing = ?missing, "Incomplete cycle sequence; skipping scene");
                    report.failures.push(StageFailure {
                        stage: PipelineStage::CycleOrdering,
                        key: scene.name().to_string(),
                        message: format!("missing stacks for rounds {missing:?}"),
                    });
                    continue;
                }
            };
            write_round_index(&self.layout.round_index(scene.name()), &sequence)?;
            write_path_list(&self.layout.stack_list(scene.name()), &sequence.stacks())?;
            info!(scene = %scene.name(), rounds = ?sequence.rounds(), "Ordered cycle sequence");
            complete.push(sequence);
        }
        self.reporter.finish_stage();
        Ok(complete)
    }

    /// Registration runs on its own pool, capped by the configured
    /// concurrency.
    fn register_scenes(
        &self,
        sequences: Vec<CycleSequence>,
        report: &mut RunReport,
    ) -> Result<Vec<CycleSequence>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.registration.concurrency.max(1))
            .build()
            .map_err(|e| BroadsideError::Pipeline(format!("registration pool: {e}")))?;

        Ok(pool.install(|| {
            self.run_keyed(
                PipelineStage::Registration,
                sequences,
                report,
                |sequence| {
                    let scene = sequence.scene().to_string();
                    let invocation = commands::register_and_stitch(self.config, self.layout, &scene);
                    let outcome = self.runner.invoke(&invocation).map(|_| sequence);
                    (scene, outcome)
                },
            )
        }))
    }

    fn build_final_images(
        &self,
        sequences: Vec<CycleSequence>,
        report: &mut RunReport,
    ) -> Vec<SceneOutput> {
        let variant = self.config.pyramid.variant;
        self.run_keyed(
            PipelineStage::FinalImage,
            sequences,
            report,
            |sequence| {
                let scene = sequence.scene().to_string();
                let outcome = commands::final_image(self.config, self.layout, &scene)
                    .iter()
                    .try_for_each(|invocation| self.runner.invoke(invocation).map(|_| ()))
                    .map(|_| SceneOutput {
                        final_image: self.layout.final_image(&scene, variant),
                        sequence,
                    });
                (scene, outcome)
            },
        )
    }
}
