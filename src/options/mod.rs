//! Centralized viewer options with TOML preset support.
//!
//! All tweakable settings (camera, controls, framing behavior, display,
//! lighting, capture device, key bindings) are consolidated here. Options
//! serialize to/from TOML so a partial file can override a single section.

mod behavior;
mod camera;
mod capture;
mod controls;
mod display;
mod lighting;

use std::path::Path;

pub use behavior::BehaviorOptions;
pub use camera::CameraOptions;
pub use capture::CaptureOptions;
pub use controls::ControlsOptions;
pub use display::DisplayOptions;
pub use lighting::LightingOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::VitrineError;
use crate::input::KeyBindings;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[lighting]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Camera projection and starting pose.
    pub camera: CameraOptions,
    /// Orbit-controls limits and sensitivities.
    pub controls: ControlsOptions,
    /// Framing, zoom, tween and auto-rotation constants.
    pub behavior: BehaviorOptions,
    /// Background and grid.
    pub display: DisplayOptions,
    /// Light intensities and directions.
    pub lighting: LightingOptions,
    /// Capture device for the camera background.
    #[schemars(skip)]
    pub capture: CaptureOptions,
    /// Keyboard binding options.
    #[schemars(skip)]
    pub keybindings: KeyBindings,
}

impl Options {
    /// Generate JSON Schema describing the user-tunable options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::Io`] if the file cannot be read and
    /// [`VitrineError::OptionsParse`] if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, VitrineError> {
        let content =
            std::fs::read_to_string(path).map_err(VitrineError::Io)?;
        toml::from_str(&content)
            .map_err(|e| VitrineError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::OptionsParse`] if serialization fails and
    /// [`VitrineError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), VitrineError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VitrineError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(VitrineError::Io)?;
        }
        std::fs::write(path, content).map_err(VitrineError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::ViewerCommand;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[lighting]
ambient = 0.4
";
        let opts: Options = toml::from_str(toml_str).unwrap();
        assert_eq!(opts.lighting.ambient, 0.4);
        assert_eq!(opts.lighting.key_intensity, 0.8);
        assert_eq!(opts.camera.fovy, 55.0);
        assert_eq!(opts.controls.min_distance, 0.3);
        assert_eq!(opts.behavior.zoom_in_factor, 0.85);
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets").join("studio.toml");
        let mut opts = Options::default();
        opts.display.show_grid = false;
        opts.behavior.auto_rotate = true;
        opts.save(&path).unwrap();

        let loaded = Options::load(&path).unwrap();
        assert_eq!(loaded, opts);
        assert_eq!(
            Options::list_presets(&dir.path().join("presets")),
            vec!["studio".to_owned()]
        );
    }

    #[test]
    fn invalid_toml_is_an_options_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[camera\nfovy = ").unwrap();
        assert!(matches!(
            Options::load(&path),
            Err(VitrineError::OptionsParse(_))
        ));
    }

    #[test]
    fn keybinding_lookup() {
        let opts = Options::default();
        assert_eq!(
            opts.keybindings.lookup("ArrowRight"),
            Some(ViewerCommand::CarouselNext)
        );
        assert_eq!(
            opts.keybindings.lookup("KeyF"),
            Some(ViewerCommand::FitToView)
        );
        assert_eq!(opts.keybindings.lookup("KeyZ"), None);
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        assert!(props.contains_key("camera"));
        assert!(props.contains_key("controls"));
        assert!(props.contains_key("behavior"));
        assert!(props.contains_key("display"));
        assert!(props.contains_key("lighting"));

        assert!(!props.contains_key("capture"));
        assert!(!props.contains_key("keybindings"));

        let lighting = &props["lighting"]["properties"];
        assert!(lighting.get("ambient").is_some());
        assert!(lighting.get("key_position").is_none());
    }
}
