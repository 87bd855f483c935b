#[allow(dead_code)]
mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use broadside_core::artifacts::{read_path_list, SceneRoundKey};
use broadside_core::error::{BroadsideError, Result};
use broadside_core::pipeline::config::{PipelineConfig, PyramidVariant, RunnerMode};
use broadside_core::pipeline::layout::RunLayout;
use broadside_core::pipeline::{run_pipeline, run_pipeline_reported, PipelineStage, ProgressReporter};
use broadside_core::stage::{StageInvocation, StageRunner, StubRunner};

use common::{build_test_slide, capture_warnings, TestSlide};

/// Stub runner that records every invocation and can fail chosen outputs.
#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<StageInvocation>>,
    fail_when_output_contains: Option<String>,
}

impl RecordingRunner {
    fn failing_on(fragment: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_when_output_contains: Some(fragment.to_string()),
        }
    }

    fn stages(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.stage.clone()).collect()
    }

    fn count(&self, stage: &str) -> usize {
        self.stages().iter().filter(|s| *s == stage).count()
    }
}

impl StageRunner for RecordingRunner {
    fn name(&self) -> &str {
        "recording"
    }

    fn invoke(&self, invocation: &StageInvocation) -> Result<Vec<PathBuf>> {
        self.calls.lock().unwrap().push(invocation.clone());
        if let Some(fragment) = &self.fail_when_output_contains {
            if invocation
                .outputs
                .iter()
                .any(|p| p.to_string_lossy().contains(fragment.as_str()))
            {
                return Err(BroadsideError::ExternalStage {
                    stage: invocation.stage.clone(),
                    exit_code: Some(1),
                    stderr: "simulated failure".into(),
                });
            }
        }
        StubRunner.invoke(invocation)
    }
}

#[derive(Default)]
struct StageLog {
    stages: Mutex<Vec<PipelineStage>>,
}

impl ProgressReporter for StageLog {
    fn begin_stage(&self, stage: PipelineStage, _total_items: Option<usize>) {
        self.stages.lock().unwrap().push(stage);
    }
}

fn two_scene_slide() -> TestSlide {
    // sceneB's rounds are created in reverse order on purpose.
    build_test_slide(
        &[
            ("sceneA", "r0", 4),
            ("sceneA", "r1", 3),
            ("sceneB", "r1", 2),
            ("sceneB", "r0", 5),
        ],
        &["sceneA", "sceneB"],
    )
}

fn stub_config(slide: &TestSlide) -> PipelineConfig {
    let mut config = PipelineConfig::for_slide(&slide.root);
    config.output_dir = Some(slide.output_dir());
    config.runner = RunnerMode::Stub;
    config
}

#[test]
fn test_stub_run_orders_cycles_for_every_scene() {
    let slide = two_scene_slide();
    let config = stub_config(&slide);

    let report = run_pipeline(&config).unwrap();
    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert_eq!(report.scenes.len(), 2);

    for scene in ["sceneA", "sceneB"] {
        let output = report.scene(scene).unwrap();
        assert_eq!(output.sequence.rounds(), vec!["r0", "r1"]);
        assert!(output.final_image.exists(), "missing {}", output.final_image.display());
    }
}

#[test]
fn test_stub_run_writes_index_files() {
    let slide = two_scene_slide();
    let config = stub_config(&slide);
    let layout = RunLayout::new(slide.output_dir());

    run_pipeline(&config).unwrap();

    let index = fs::read_to_string(layout.round_index("sceneB")).unwrap();
    let lines: Vec<&str> = index.lines().collect();
    assert_eq!(lines[0], "round\ttiles-path");
    assert!(lines[1].starts_with("r0\t"));
    assert!(lines[2].starts_with("r1\t"));
    assert_eq!(lines.len(), 3);

    let stacks = read_path_list(&layout.stack_list("sceneB")).unwrap();
    assert_eq!(
        stacks,
        vec![
            layout.stack(&SceneRoundKey::new("sceneB", "r0")),
            layout.stack(&SceneRoundKey::new("sceneB", "r1")),
        ]
    );

    // Per-(scene, round) tile lists hold exactly that scene's tiles.
    let key = SceneRoundKey::new("sceneB", "r0");
    let tiles = read_path_list(&layout.stack_tile_list(&key)).unwrap();
    assert_eq!(tiles.len(), 5);
    assert!(tiles.iter().all(|t| t.starts_with(slide.root.join("sceneB"))));
}

#[test]
fn test_illumination_sample_spans_all_scenes() {
    let slide = two_scene_slide();
    let mut config = stub_config(&slide);
    config.illumination.max_samples = 100;
    let layout = RunLayout::new(slide.output_dir());

    run_pipeline(&config).unwrap();

    // r0 has 4 tiles in sceneA and 5 in sceneB.
    let sample = read_path_list(&layout.illumination_tile_list("r0")).unwrap();
    assert_eq!(sample.len(), 9);

    config.illumination.max_samples = 3;
    fs::remove_dir_all(slide.output_dir()).unwrap();
    run_pipeline(&config).unwrap();
    let first = read_path_list(&layout.illumination_tile_list("r0")).unwrap();
    fs::remove_dir_all(slide.output_dir()).unwrap();
    run_pipeline(&config).unwrap();
    let second = read_path_list(&layout.illumination_tile_list("r0")).unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[test]
fn test_rerun_reuses_profiles_and_assessments() {
    let slide = two_scene_slide();
    let config = stub_config(&slide);

    let first = Arc::new(RecordingRunner::default());
    let report = run_pipeline_reported(&config, first.clone(), Arc::new(StageLog::default())).unwrap();
    assert!(report.reused.is_empty());
    assert_eq!(first.count("illumination"), 2);
    assert_eq!(first.count("assessment"), 2);
    assert_eq!(first.count("stacking"), 4);

    let second = Arc::new(RecordingRunner::default());
    let report = run_pipeline_reported(&config, second.clone(), Arc::new(StageLog::default())).unwrap();
    assert_eq!(second.count("illumination"), 0);
    assert_eq!(second.count("assessment"), 0);
    assert_eq!(second.count("stacking"), 4);
    let mut reused = report.reused.clone();
    reused.sort();
    assert_eq!(
        reused,
        vec!["assessment/r0", "assessment/r1", "illumination/r0", "illumination/r1"]
    );
}

#[test]
fn test_missing_profile_output_triggers_recompute() {
    let slide = two_scene_slide();
    let config = stub_config(&slide);
    let layout = RunLayout::new(slide.output_dir());
    run_pipeline(&config).unwrap();

    fs::remove_file(layout.illumination_profile("r1").darkfield).unwrap();

    let runner = Arc::new(RecordingRunner::default());
    run_pipeline_reported(&config, runner.clone(), Arc::new(StageLog::default())).unwrap();
    assert_eq!(runner.count("illumination"), 1);
}

#[test]
fn test_failed_stack_only_drops_its_scene() {
    let slide = two_scene_slide();
    let config = stub_config(&slide);
    let runner = Arc::new(RecordingRunner::failing_on("stacks/sceneB/r1"));

    let report = run_pipeline_reported(&config, runner.clone(), Arc::new(StageLog::default())).unwrap();

    assert!(!report.is_success());
    assert!(report.scene("sceneA").is_some());
    assert!(report.scene("sceneB").is_none());
    let stages: Vec<PipelineStage> = report.failures.iter().map(|f| f.stage).collect();
    assert_eq!(stages, vec![PipelineStage::Stacking, PipelineStage::CycleOrdering]);
    assert_eq!(report.failures[0].key, "sceneB/r1");
    assert_eq!(runner.count("registration"), 1);
}

#[test]
fn test_failed_profile_skips_round_everywhere() {
    let slide = two_scene_slide();
    let mut config = stub_config(&slide);
    config.assessment.enabled = false;
    let runner = Arc::new(RecordingRunner::failing_on("illumination/r1"));

    let report = run_pipeline_reported(&config, runner.clone(), Arc::new(StageLog::default())).unwrap();

    assert_eq!(runner.count("stacking"), 2);
    assert!(report.scenes.is_empty());
    assert_eq!(report.failures[0].stage, PipelineStage::IlluminationProfiles);
    assert_eq!(report.failures[0].key, "r1");
}

#[test]
fn test_scene_with_fewer_rounds_gets_no_foreign_stacks() {
    let slide = build_test_slide(
        &[("A", "r0", 2), ("A", "r1", 2), ("B", "r0", 2)],
        &["A", "B"],
    );
    let config = stub_config(&slide);
    let runner = Arc::new(RecordingRunner::default());

    let report = run_pipeline_reported(&config, runner.clone(), Arc::new(StageLog::default())).unwrap();

    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert_eq!(runner.count("stacking"), 3);
    assert_eq!(report.scene("A").unwrap().sequence.rounds(), vec!["r0", "r1"]);
    assert_eq!(report.scene("B").unwrap().sequence.rounds(), vec!["r0"]);
    assert!(!slide.output_dir().join("stacks").join("B").join("r1").exists());
}

#[test]
fn test_zarr_to_tiff_variant_produces_ome_tiff() {
    let slide = two_scene_slide();
    let mut config = stub_config(&slide);
    config.pyramid.variant = PyramidVariant::ZarrToTiff;
    config.registration.concurrency = 1;
    let runner = Arc::new(RecordingRunner::default());

    let report = run_pipeline_reported(&config, runner.clone(), Arc::new(StageLog::default())).unwrap();

    let layout = RunLayout::new(slide.output_dir());
    assert_eq!(report.scene("sceneA").unwrap().final_image, layout.ome_tiff("sceneA"));
    assert!(layout.ome_tiff("sceneA").exists());
    assert_eq!(runner.count("pyramid"), 2);
    assert_eq!(runner.count("conversion"), 2);
}

#[test]
fn test_progress_stages_in_order() {
    let slide = two_scene_slide();
    let config = stub_config(&slide);
    let log = Arc::new(StageLog::default());

    run_pipeline_reported(&config, Arc::new(StubRunner), log.clone()).unwrap();

    assert_eq!(
        *log.stages.lock().unwrap(),
        vec![
            PipelineStage::Cataloging,
            PipelineStage::IlluminationProfiles,
            PipelineStage::Assessment,
            PipelineStage::TileLists,
            PipelineStage::Stacking,
            PipelineStage::CycleOrdering,
            PipelineStage::Registration,
            PipelineStage::FinalImage,
        ]
    );
}

#[test]
fn test_selected_scene_only() {
    let slide = two_scene_slide();
    let mut config = stub_config(&slide);
    config.scenes = Some(vec!["sceneB".into(), "sceneZ".into()]);

    let report = run_pipeline(&config).unwrap();
    assert_eq!(report.scenes.len(), 1);
    assert_eq!(report.scenes[0].sequence.scene(), "sceneB");
}

#[test]
fn test_metadata_mismatch_is_not_fatal_by_default() {
    let slide = build_test_slide(&[("A", "r0", 2)], &["A", "ghost"]);
    let mut config = stub_config(&slide);

    let (report, logs) = capture_warnings(|| run_pipeline(&config));
    assert_eq!(report.unwrap().scenes.len(), 1);
    assert!(logs.contains("Mismatch between scenes in metadata"), "logs: {logs}");
    assert!(logs.contains("\"ghost\""), "logs: {logs}");

    config.strict = true;
    assert!(matches!(
        run_pipeline(&config),
        Err(BroadsideError::Reconciliation(_))
    ));
}

#[test]
fn test_invalid_slide_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = PipelineConfig::for_slide(dir.path().join("missing"));
    config.runner = RunnerMode::Stub;
    assert!(matches!(
        run_pipeline(&config),
        Err(BroadsideError::InvalidSlide { .. })
    ));
}

#[test]
fn test_process_run_without_dark_dir_fails_before_any_stage() {
    let slide = two_scene_slide();
    let mut config = stub_config(&slide);
    config.runner = RunnerMode::Process;
    let runner = Arc::new(RecordingRunner::default());

    let result = run_pipeline_reported(&config, runner.clone(), Arc::new(StageLog::default()));

    assert!(matches!(result, Err(BroadsideError::InvalidConfig(_))));
    assert!(runner.stages().is_empty());
    assert!(!slide.output_dir().exists());
}

#[test]
fn test_scene_losing_every_round_is_reported() {
    // B only has r1, so a failed r1 profile leaves it with no stacks at all.
    let slide = build_test_slide(
        &[("A", "r0", 2), ("A", "r1", 2), ("B", "r1", 2)],
        &["A", "B"],
    );
    let mut config = stub_config(&slide);
    config.assessment.enabled = false;
    let runner = Arc::new(RecordingRunner::failing_on("illumination/r1"));

    let report = run_pipeline_reported(&config, runner.clone(), Arc::new(StageLog::default())).unwrap();

    assert!(report.scenes.is_empty());
    let ordering: Vec<&str> = report
        .failures
        .iter()
        .filter(|f| f.stage == PipelineStage::CycleOrdering)
        .map(|f| f.key.as_str())
        .collect();
    assert_eq!(ordering, vec!["A", "B"]);
}
