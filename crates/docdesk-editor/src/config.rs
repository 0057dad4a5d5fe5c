//! Editor configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::ConfigError;

/// Upper bound on undo steps a config file may ask for.
pub const MAX_HISTORY_DEPTH: usize = 10_000;

/// Preset text colors offered by the color popover.
pub const DEFAULT_PALETTE: [&str; 15] = [
    "#000000", "#434343", "#666666", "#999999", "#ffffff", "#e03131", "#f08c00", "#fab005",
    "#2f9e44", "#1098ad", "#1971c2", "#5f3dc4", "#c2255c", "#8d6e63", "#ff8787",
];

pub const DEFAULT_VIDEO_MIME_TYPES: [&str; 3] = ["video/mp4", "video/webm", "video/ogg"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo steps kept. Zero disables history.
    pub history_depth: usize,
    /// Height of the sticky page header that anchor scrolling clears, in px.
    pub sticky_header_offset: f64,
    /// MIME types accepted for video ingestion.
    pub video_mime_types: Vec<String>,
    pub palette: Vec<SmolStr>,
    /// Distance between a popover and its trigger, in px.
    pub popover_gap: f64,
    /// Minimum distance kept between a popover and the viewport edge, in px.
    pub viewport_margin: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 100,
            sticky_header_offset: 80.0,
            video_mime_types: DEFAULT_VIDEO_MIME_TYPES.into_iter().map(String::from).collect(),
            palette: DEFAULT_PALETTE.into_iter().map(SmolStr::new_static).collect(),
            popover_gap: 4.0,
            viewport_margin: 8.0,
        }
    }
}

impl EditorConfig {
    /// Load from a `.toml` or `.json` file, chosen by extension. Missing
    /// keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&contents)?,
            Some("json") => Self::from_json_str(&contents)?,
            _ => {
                return Err(ConfigError::UnknownFormat {
                    path: path.to_owned(),
                });
            }
        };
        tracing::debug!(path = %path.display(), "loaded editor config");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.history_depth > MAX_HISTORY_DEPTH {
            return Err(ConfigError::HistoryDepth {
                max: MAX_HISTORY_DEPTH,
                got: self.history_depth,
            });
        }
        Ok(self)
    }

    pub fn allows_video_type(&self, mime: &str) -> bool {
        self.video_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.history_depth, 100);
        assert_eq!(config.palette.len(), 15);
        assert!(config.allows_video_type("video/webm"));
        assert!(config.allows_video_type("VIDEO/MP4"));
        assert!(!config.allows_video_type("video/avi"));
    }

    #[test]
    fn test_toml_partial_override() {
        let config = EditorConfig::from_toml_str(
            "history_depth = 20\nvideo_mime_types = [\"video/mp4\"]\n",
        )
        .unwrap();
        assert_eq!(config.history_depth, 20);
        assert!(!config.allows_video_type("video/ogg"));
        assert_eq!(config.sticky_header_offset, 80.0);
    }

    #[test]
    fn test_json_override() {
        let config =
            EditorConfig::from_json_str(r##"{"sticky_header_offset": 64.0, "palette": ["#123456"]}"##)
                .unwrap();
        assert_eq!(config.sticky_header_offset, 64.0);
        assert_eq!(config.palette, vec![SmolStr::new_static("#123456")]);
    }

    #[test]
    fn test_history_depth_bounded() {
        assert!(matches!(
            EditorConfig::from_toml_str("history_depth = 99999"),
            Err(ConfigError::HistoryDepth { got: 99999, .. })
        ));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = std::env::temp_dir().join(format!("docdesk-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let toml_path = dir.join("editor.toml");
        fs::write(&toml_path, "popover_gap = 6.0").unwrap();
        assert_eq!(EditorConfig::load(&toml_path).unwrap().popover_gap, 6.0);

        let yaml_path = dir.join("editor.yaml");
        fs::write(&yaml_path, "popover_gap: 6.0").unwrap();
        assert!(matches!(
            EditorConfig::load(&yaml_path),
            Err(ConfigError::UnknownFormat { .. })
        ));

        assert!(matches!(
            EditorConfig::load(&dir.join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
