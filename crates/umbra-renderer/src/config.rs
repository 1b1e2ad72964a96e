//! Scene configuration structures
//!
//! Every tunable of the frame pipeline lives here so that it can be
//! serialized to and loaded from a RON file. Defaults reproduce the stock
//! viewer.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised while loading or saving a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("IO error on {path}: {reason}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying error.
        reason: String,
    },

    /// The file is not valid RON for [`SceneConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Viewport rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewportConfig {
    /// Background clear color (RGBA)
    pub clear_color: [f32; 4],
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            clear_color: [190.0 / 255.0, 210.0 / 255.0, 215.0 / 255.0, 1.0],
        }
    }
}

/// Shadow mapping configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShadowConfig {
    /// Shadow map resolution (square, fixed for the process lifetime)
    pub map_size: u32,
    /// Depth comparison bias applied in the shaded pass
    pub bias: f32,
    /// Constant rasterizer depth bias for layers flagged with `depth_bias`
    pub layer_bias_constant: i32,
    /// Slope-scaled rasterizer depth bias for layers flagged with `depth_bias`
    pub layer_bias_slope: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_size: 2048,
            bias: 0.002,
            layer_bias_constant: 1,
            layer_bias_slope: 1.0,
        }
    }
}

/// Eye camera configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraConfig {
    /// Perspective field of view in degrees
    pub fov_degrees: f32,
    /// Perspective near clipping plane
    pub near_plane: f32,
    /// Far clipping plane (both projections)
    pub far_plane: f32,
    /// Eye distance from the centroid at zoom 0
    pub max_distance: f32,
    /// Orthographic half-height at zoom 0
    pub ortho_half_extent: f32,
    /// Orthographic near clipping plane
    pub ortho_near_plane: f32,
    /// Fraction of the distance/extent removed at zoom 100
    pub zoom_range: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near_plane: 1.0,
            far_plane: 50000.0,
            max_distance: 3000.0,
            ortho_half_extent: 5000.0,
            ortho_near_plane: -1.0,
            zoom_range: 0.99,
        }
    }
}

/// Shadow-casting light configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LightConfig {
    /// Horizontal orbit radius around the centroid
    pub orbit_radius: f32,
    /// Height of the light above the centroid
    pub height: f32,
    /// Half-size of the light's orthographic frustum
    pub half_extent: f32,
    /// Light near clipping plane
    pub near_plane: f32,
    /// Light far clipping plane
    pub far_plane: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            orbit_radius: 2000.0,
            height: 2000.0,
            half_extent: 2400.0,
            near_plane: -1.0,
            far_plane: 20000.0,
        }
    }
}

/// Layer ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerConfig {
    /// Layers that get the rasterizer depth bias when the document does not
    /// say otherwise
    pub depth_bias_layers: Vec<String>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            depth_bias_layers: vec!["surface".to_string()],
        }
    }
}

impl LayerConfig {
    /// Resolve the depth-bias flag for a layer.
    pub fn depth_bias_for(&self, name: &str, requested: Option<bool>) -> bool {
        requested.unwrap_or_else(|| self.depth_bias_layers.iter().any(|l| l == name))
    }
}

/// Complete scene configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SceneConfig {
    /// Viewport settings
    #[serde(default)]
    pub viewport: ViewportConfig,
    /// Shadow settings
    #[serde(default)]
    pub shadow: ShadowConfig,
    /// Eye camera settings
    #[serde(default)]
    pub camera: CameraConfig,
    /// Light settings
    #[serde(default)]
    pub light: LightConfig,
    /// Layer settings
    #[serde(default)]
    pub layers: LayerConfig,
}

impl SceneConfig {
    /// Create a new scene configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Serialize the configuration to pretty RON text.
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_ron(&text)?;
        tracing::info!("Loaded scene config from {}", path.display());
        Ok(config)
    }

    /// Save the configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = self.to_ron()?;
        std::fs::write(path, text).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_viewer() {
        let config = SceneConfig::default();
        assert_eq!(config.shadow.map_size, 2048);
        assert_eq!(config.camera.fov_degrees, 45.0);
        assert_eq!(config.light.half_extent, 2400.0);
        assert_eq!(config.layers.depth_bias_layers, vec!["surface".to_string()]);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = SceneConfig::from_ron("(shadow: (map_size: 1024, bias: 0.001, layer_bias_constant: 2, layer_bias_slope: 1.5))").unwrap();
        assert_eq!(config.shadow.map_size, 1024);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_ron_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.ron");

        let mut config = SceneConfig::default();
        config.light.orbit_radius = 1500.0;
        config.save(&path).unwrap();

        assert_eq!(SceneConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_ron() {
        assert!(matches!(
            SceneConfig::from_ron("(shadow: nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_depth_bias_resolution() {
        let layers = LayerConfig::default();
        assert!(layers.depth_bias_for("surface", None));
        assert!(!layers.depth_bias_for("water", None));
        assert!(layers.depth_bias_for("water", Some(true)));
        assert!(!layers.depth_bias_for("surface", Some(false)));
    }
}
