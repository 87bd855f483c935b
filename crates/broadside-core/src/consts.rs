/// Name of the per-scene subdirectory whose presence marks a scene.
pub const TILES_DIR_NAME: &str = "tiles";

/// Metadata file expected at the root of every slide.
pub const SLIDE_METADATA_FILE_NAME: &str = ".slide.json";

/// File extensions (lowercase) recognized as tiles.
pub const TILE_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// Seed for the illumination tile sampler. Changing it invalidates every
/// previously computed illumination profile.
pub const DEFAULT_SAMPLE_SEED: u64 = 0;

/// Default number of tiles sampled per round for illumination profiles.
pub const DEFAULT_MAX_ILLUMINATION_SAMPLES: usize = 200;

/// Default number of tiles sampled per round for profile assessment.
pub const DEFAULT_ASSESSMENT_SAMPLES: usize = 20;

/// Default working size (pixels) tiles are resized to before estimation.
pub const DEFAULT_WORKING_SIZE: usize = 128;

/// Registration and stitching is memory-hungry; at most this many scenes are
/// registered at once unless configured otherwise.
pub const DEFAULT_REGISTRATION_CONCURRENCY: usize = 2;

/// Default maximum shift (pixels) allowed between aligned tiles.
pub const DEFAULT_MAXIMUM_SHIFT: f64 = 15.0;

/// Default edge length of pyramid tiles.
pub const DEFAULT_PYRAMID_TILE_SIZE: usize = 1024;

/// Default maximum edge length of the coarsest pyramid level.
pub const DEFAULT_PYRAMID_TOP_LEVEL_SIZE: usize = 1024;

/// Default downscale factor between pyramid levels.
pub const DEFAULT_PYRAMID_DOWNSCALE: usize = 2;

/// Header of the per-scene round index.
pub const ROUND_INDEX_HEADER: [&str; 2] = ["round", "tiles-path"];
