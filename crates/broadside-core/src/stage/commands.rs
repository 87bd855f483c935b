//! Invocation builders for each external stage.

use std::path::Path;

use crate::artifacts::IlluminationProfile;
use crate::pipeline::config::{PipelineConfig, PyramidVariant, StageResources};
use crate::pipeline::layout::RunLayout;

use super::invocation::StageInvocation;

fn with_resources(invocation: StageInvocation, resources: &StageResources) -> StageInvocation {
    invocation
        .arg_opt("n-cpus", resources.n_cpus)
        .arg_opt("memory-limit", resources.memory_limit.clone())
}

/// Estimate flatfield/darkfield for one round from a sampled tile list.
pub fn illumination_profiles(
    config: &PipelineConfig,
    tile_list: &Path,
    profile: &IlluminationProfile,
) -> StageInvocation {
    let illum = &config.illumination;
    let invocation = StageInvocation::new("illumination", config.commands.illumination.as_str())
        .arg("tiles-path", tile_list)
        .arg("flatfield-path", profile.flatfield.as_path())
        .arg("darkfield-path", profile.darkfield.as_path())
        .arg("darkfield", illum.compute_darkfield)
        .arg("working-size", illum.working_size)
        .arg_opt("dark-dir", illum.dark_dir.clone())
        .output(profile.flatfield.clone())
        .output(profile.darkfield.clone());
    with_resources(invocation, &illum.resources)
}

/// Apply a round's profiles to a few tiles for visual assessment.
pub fn assessment(
    config: &PipelineConfig,
    tile_list: &Path,
    profile: &IlluminationProfile,
    report: &Path,
) -> StageInvocation {
    let invocation = StageInvocation::new("assessment", config.commands.assessment.as_str())
        .arg("tiles-path", tile_list)
        .arg("flatfield-path", profile.flatfield.as_path())
        .arg("darkfield-path", profile.darkfield.as_path())
        .arg("dst", report)
        .output(report);
    with_resources(invocation, &config.assessment.resources)
}

/// Correct and stack every tile of one (scene, round).
pub fn stack(
    config: &PipelineConfig,
    tile_list: &Path,
    profile: &IlluminationProfile,
    dst: &Path,
) -> StageInvocation {
    let invocation = StageInvocation::new("stacking", config.commands.stacking.as_str())
        .arg("tiles-path", tile_list)
        .arg("flatfield-path", profile.flatfield.as_path())
        .arg("darkfield-path", profile.darkfield.as_path())
        .arg("dst", dst)
        .output(dst);
    with_resources(invocation, &config.stacking.resources)
}

/// Register and stitch a scene's ordered stacks into per-channel images.
pub fn register_and_stitch(config: &PipelineConfig, layout: &RunLayout, scene: &str) -> StageInvocation {
    let reg = &config.registration;
    StageInvocation::new("registration", config.commands.registration.as_str())
        .arg("stacks-path", layout.stack_list(scene))
        .arg("output-format", layout.registered_format(scene))
        .arg("align-channel", reg.align_channel)
        .arg("filter-sigma", reg.filter_sigma)
        .arg("maximum-shift", reg.maximum_shift)
        .arg_opt("n-cpus", reg.n_cpus)
        .output(layout.registered_first_channel(scene))
}

/// Invocations producing the final image of `scene`, in execution order.
pub fn final_image(config: &PipelineConfig, layout: &RunLayout, scene: &str) -> Vec<StageInvocation> {
    let pyr = &config.pyramid;
    let pyramid = StageInvocation::new("pyramid", config.commands.pyramid.as_str())
        .arg("src-pattern", layout.registered_pattern(scene))
        .arg("dst", layout.zarr(scene))
        .arg("tile-size", pyr.tile_size)
        .arg("max-top-level-size", pyr.max_top_level_size)
        .arg("downscale", pyr.downscale)
        .output(layout.zarr_group_marker(scene));

    match pyr.variant {
        PyramidVariant::Zarr => vec![pyramid],
        PyramidVariant::ZarrToTiff => {
            let convert = StageInvocation::new("conversion", config.commands.conversion.as_str())
                .arg("src", layout.zarr(scene))
                .arg("dst", layout.ome_tiff(scene))
                .arg("tile-size", pyr.tile_size)
                .output(layout.ome_tiff(scene));
            vec![pyramid, convert]
        }
    }
}
