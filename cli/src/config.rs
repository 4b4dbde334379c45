use std::path::{Path, PathBuf};

use bytedit_buffer::BufferOptions;
use serde::Deserialize;

pub(crate) const CONFIG_FILE: &str = "bytedit.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub buffer: BufferOptions,
}

impl Config {
    /// Load configuration from `path` or the user configuration directory.
    /// Missing or broken files fall back to defaults.
    pub fn new(path: Option<&Path>) -> Config {
        let path = match path.map(Path::to_path_buf).or_else(default_path) {
            Some(path) => path,
            None => return Config::default(),
        };

        if !path.exists() {
            log::info!("No configuration at {path:?}, using defaults");
            return Config::default();
        }

        match Self::try_new(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load configuration, using default instead: {e}");
                Config::default()
            }
        }
    }

    pub fn try_new(path: &Path) -> anyhow::Result<Config> {
        let builder = ::config::Config::builder().add_source(::config::File::from(path));
        let config = builder.build()?.try_deserialize::<Config>()?;
        Ok(config)
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_FILE))
}
