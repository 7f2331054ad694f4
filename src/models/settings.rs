use serde::{Deserialize, Serialize};

/// Extension settings from `procconf.yaml`.
///
/// Every field has a default so an absent or partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionSettings {
    /// Key of the persisted device record
    pub namespace: String,

    /// Directory holding the persisted session records
    pub state_dir: String,

    /// Overrides the host configuration directory (standalone harness only)
    pub config_root: Option<String>,

    /// Response flags offered when the host does not ask the user
    pub default_response_flags: u32,

    pub logging: LoggingSettings,
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            namespace: "$ procconf".to_string(),
            state_dir: "procconf-state".to_string(),
            config_root: None,
            default_response_flags: 7,
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: String,
    pub prefix: String,
    pub debug: bool,
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            prefix: "procconf".to_string(),
            debug: false,
            console: true,
        }
    }
}
