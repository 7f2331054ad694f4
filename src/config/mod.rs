pub mod session_store;

pub use session_store::{
    MemorySessionStore, SESSIONS_FILE, SessionError, SessionStore, YamlSessionStore,
};

use crate::models::ExtensionSettings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, File, FileFormat};
use std::fs;

/// Name of the settings file inside the settings directory
pub const SETTINGS_FILE: &str = "procconf.yaml";

/// Configuration directory used when `config_root` is not set
pub const DEFAULT_CONFIG_ROOT: &str = "cfg";

/// Absolute configuration root for `settings`.
///
/// Relative roots are taken against the working directory, since the file
/// prompt always answers with an absolute path.
pub fn absolute_config_root(settings: &ExtensionSettings) -> Result<Utf8PathBuf> {
    let root = settings.config_root.as_deref().unwrap_or(DEFAULT_CONFIG_ROOT);

    let absolute = std::path::absolute(root)
        .with_context(|| format!("Failed to make configuration root absolute: {}", root))?;
    Utf8PathBuf::try_from(absolute)
        .with_context(|| format!("Configuration root is not valid UTF-8: {}", root))
}

/// Loads and saves [`ExtensionSettings`].
///
/// The settings file is optional; missing keys take their defaults.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl SettingsManager {
    /// Create a SettingsManager for the given directory.
    ///
    /// # Arguments
    /// * `settings_dir` - Directory containing `procconf.yaml`
    pub fn new<P: AsRef<Utf8Path>>(settings_dir: P) -> Result<Self> {
        let settings_dir = settings_dir.as_ref().to_path_buf();

        if !settings_dir.exists() {
            fs::create_dir_all(&settings_dir).with_context(|| {
                format!("Failed to create settings directory: {}", settings_dir)
            })?;
        }

        Ok(Self {
            settings_path: settings_dir.join(SETTINGS_FILE),
            settings_dir,
        })
    }

    /// Load the settings file.
    ///
    /// # Returns
    /// The loaded settings, or defaults if the file doesn't exist
    pub fn load(&self) -> Result<ExtensionSettings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
            return Ok(ExtensionSettings::default());
        }

        let source = Config::builder()
            .add_source(File::new(self.settings_path.as_str(), FileFormat::Yaml))
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: ExtensionSettings = source
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save the settings file.
    pub fn save(&self, settings: &ExtensionSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    pub fn settings_dir(&self) -> &Utf8Path {
        &self.settings_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}
