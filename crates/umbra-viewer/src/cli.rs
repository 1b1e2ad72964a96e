//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;
use umbra_renderer::{ConfigError, SceneConfig};

/// Interactive two-pass shadow-map viewer
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "umbra", version, about = "Interactive shadow-map viewer for layered geometry")]
pub struct Args {
    /// Geometry document (JSON, keyed by layer name) to load at startup
    pub geometry: Option<PathBuf>,

    /// Scene configuration file (RON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Shadow map resolution, overrides the configuration file
    #[arg(long)]
    pub shadow_map_size: Option<u32>,

    /// Print the effective configuration as RON and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    /// Resolve the scene configuration: file (or defaults), then overrides.
    pub fn scene_config(&self) -> Result<SceneConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SceneConfig::load(path)?,
            None => SceneConfig::default(),
        };
        if let Some(size) = self.shadow_map_size {
            config.shadow.map_size = size;
        }
        Ok(config)
    }
}
