//! Slide / Scene / Round / Tile hierarchy discovered from disk and
//! reconciled against the slide metadata file.

mod metadata;
mod scene;
mod slide;

pub use metadata::{read_declared_scene_names, NamedPolygon, SlideMetadata};
pub use scene::{Round, Scene};
pub use slide::{build_slide, CatalogOptions, Slide};
