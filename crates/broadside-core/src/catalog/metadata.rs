use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// A named region of the slide. Only the name takes part in reconciliation.
#[derive(Clone, Debug, Deserialize)]
pub struct NamedPolygon {
    pub name: String,
}

/// The subset of the slide metadata file the catalog reads.
#[derive(Clone, Debug, Deserialize)]
pub struct SlideMetadata {
    pub polygons: Vec<NamedPolygon>,
}

impl SlideMetadata {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn scene_names(&self) -> BTreeSet<String> {
        self.polygons.iter().map(|p| p.name.clone()).collect()
    }
}

/// Read the set of scene names declared by the metadata file.
pub fn read_declared_scene_names(path: &Path) -> Result<BTreeSet<String>> {
    Ok(SlideMetadata::open(path)?.scene_names())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_fields_are_ignored() {
        let json = r#"{
            "polygons": [
                {"name": "scene-a", "wkt": "POLYGON ((0 0, 1 0, 1 1, 0 0))"},
                {"name": "scene-b", "wkt": ""}
            ],
            "focusPoints": [],
            "objName": "20x"
        }"#;
        let meta: SlideMetadata = serde_json::from_str(json).unwrap();
        let names: Vec<_> = meta.scene_names().into_iter().collect();
        assert_eq!(names, vec!["scene-a", "scene-b"]);
    }

    #[test]
    fn missing_polygons_is_an_error() {
        let result: std::result::Result<SlideMetadata, _> = serde_json::from_str(r#"{"objName": "20x"}"#);
        assert!(result.is_err());
    }
}
