//! Persistent resolver configuration model, defaults and toml persistence.

use std::path::{Path, PathBuf};

use log::warn;

pub const DEFAULT_WEBSITE: &str = "https://www.comics.org/";
const CONFIG_FILE_NAME: &str = "gcd_resolver.toml";
const DATA_DIR_NAME: &str = "gcd_resolver";

/// Root configuration persisted to `gcd_resolver.toml`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct GcdConfig {
    /// Path of the GCD SQLite dump. Empty means unconfigured; checked
    /// eagerly before any query runs.
    #[serde(default)]
    pub db_file: String,
    /// Source website base, used for cover pages and canonical web links.
    #[serde(default = "default_website")]
    pub website: String,
    /// Use the series start year as the volume number.
    #[serde(default)]
    pub use_series_start_as_volume: bool,
    /// Attempt to download covers for series and issue list views.
    #[serde(default)]
    pub download_gui_covers: bool,
    /// Attempt to download covers for auto-tagging.
    #[serde(default)]
    pub download_tag_covers: bool,
    /// Structured cache directory. Empty means the platform data dir.
    #[serde(default)]
    pub cache_dir: String,
}

fn default_website() -> String {
    DEFAULT_WEBSITE.to_string()
}

impl Default for GcdConfig {
    fn default() -> Self {
        Self {
            db_file: String::new(),
            website: default_website(),
            use_series_start_as_volume: false,
            download_gui_covers: false,
            download_tag_covers: false,
            cache_dir: String::new(),
        }
    }
}

impl GcdConfig {
    /// Resolved cache directory, falling back to the platform data dir.
    pub fn cache_dir_path(&self) -> PathBuf {
        if !self.cache_dir.is_empty() {
            return PathBuf::from(&self.cache_dir);
        }
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(DATA_DIR_NAME)
    }
}

/// Default config file location under the platform config dir.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(DATA_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Loads configuration, falling back to defaults when the file is missing
/// or unparseable. A broken config file is reported, never fatal.
pub fn load_config(path: &Path) -> GcdConfig {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return GcdConfig::default(),
    };
    match toml::from_str(&raw) {
        Ok(config) => config,
        Err(error) => {
            warn!("Could not parse {}: {error}; using defaults", path.display());
            GcdConfig::default()
        }
    }
}

pub fn save_config(path: &Path, config: &GcdConfig) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let rendered = toml::to_string_pretty(config)
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error))?;
    std::fs::write(path, rendered)
}
