//! The list of models offered in the carousel.
//!
//! A catalog is either the built-in set or a TOML/JSON file:
//!
//! ```toml
//! [[items]]
//! name = "Robot"
//! url = "https://modelviewer.dev/shared-assets/models/RobotExpressive.glb"
//! ext = "glb"
//! size = "2.3 MB"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::asset::AssetSource;
use crate::error::VitrineError;

/// One selectable model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Card title.
    pub name: String,
    /// `http(s)` URL or filesystem path of the `.glb` / `.gltf`.
    pub url: String,
    /// Optional thumbnail image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
    /// File extension shown on the card (`glb`, `gltf`).
    pub ext: String,
    /// Human-readable size label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl CatalogItem {
    /// Where to load the model from.
    #[must_use]
    pub fn source(&self) -> AssetSource {
        AssetSource::from_location(&self.url)
    }

    /// Card subtitle: `"GLB • 2.4 MB"`, or just the extension without a
    /// size.
    #[must_use]
    pub fn subtitle(&self) -> String {
        let ext = self.ext.to_uppercase();
        match self.size.as_deref().filter(|s| !s.is_empty()) {
            Some(size) => format!("{ext} \u{2022} {size}"),
            None => ext,
        }
    }

    /// Thumbnail URL, if one is set and non-empty.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumb.as_deref().filter(|t| !t.is_empty())
    }
}

/// Ordered catalog of models.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Items in display order.
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

const MODELVIEWER: &str = "https://modelviewer.dev/shared-assets/models";

impl Catalog {
    /// The four showcase models shipped with the application.
    #[must_use]
    pub fn builtin() -> Self {
        let glb = |name: &str, file: &str, size: &str| CatalogItem {
            name: name.to_owned(),
            url: format!("{MODELVIEWER}/{file}.glb"),
            thumb: Some(format!("{MODELVIEWER}/thumbnails/{file}.webp")),
            ext: "glb".to_owned(),
            size: Some(size.to_owned()),
        };
        Self {
            items: vec![
                glb("Astronaut", "Astronaut", "2.4 MB"),
                glb("Flight helmet", "FlightHelmet", "7.1 MB"),
                glb("Robot", "RobotExpressive", "2.3 MB"),
                CatalogItem {
                    name: "Chair (glTF + BIN)".to_owned(),
                    url: "https://threejs.org/examples/models/gltf/Chair/Chair.gltf"
                        .to_owned(),
                    thumb: None,
                    ext: "gltf".to_owned(),
                    size: Some("binary".to_owned()),
                },
            ],
        }
    }

    /// Load a catalog file. `.json` files are parsed as JSON, anything else
    /// as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::Io`] if the file cannot be read and
    /// [`VitrineError::CatalogParse`] if it is malformed.
    pub fn load(path: &Path) -> Result<Self, VitrineError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let catalog: Self = if is_json {
            serde_json::from_str(&content)
                .map_err(|e| VitrineError::CatalogParse(e.to_string()))?
        } else {
            toml::from_str(&content)
                .map_err(|e| VitrineError::CatalogParse(e.to_string()))?
        };
        log::info!(
            "Loaded {} catalog items from {}",
            catalog.items.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_catalog_has_four_models() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.items[0].subtitle(), "GLB \u{2022} 2.4 MB");
        assert_eq!(
            catalog.items[1].thumbnail(),
            Some("https://modelviewer.dev/shared-assets/models/thumbnails/FlightHelmet.webp")
        );
        assert_eq!(catalog.items[3].thumbnail(), None);
        assert!(matches!(catalog.items[3].source(), AssetSource::Url(_)));
    }

    #[test]
    fn subtitle_without_size_is_just_the_extension() {
        let item = CatalogItem {
            name: "Local".into(),
            url: "models/local.gltf".into(),
            thumb: Some(String::new()),
            ext: "gltf".into(),
            size: None,
        };
        assert_eq!(item.subtitle(), "GLTF");
        assert_eq!(item.thumbnail(), None);
        assert!(matches!(item.source(), AssetSource::Path(_)));
    }

    #[test]
    fn loads_toml_catalog() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[items]]
name = "Box"
url = "https://example.com/Box.glb"
ext = "glb"
size = "1 KB"

[[items]]
name = "Local"
url = "/tmp/local.gltf"
ext = "gltf"
"#
        )
        .unwrap();
        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.items[1].size, None);
    }

    #[test]
    fn loads_json_catalog() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"items": [{{"name": "Box", "url": "Box.glb", "ext": "glb"}}]}}"#
        )
        .unwrap();
        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.items[0].name, "Box");
    }

    #[test]
    fn malformed_catalog_is_a_parse_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "[[items]]\nname = 3").unwrap();
        assert!(matches!(
            Catalog::load(file.path()),
            Err(VitrineError::CatalogParse(_))
        ));
    }
}
