//! The "load processor configuration" action.
//!
//! One invocation walks through
//!
//! ```text
//! Idle → AwaitingFileChoice → ResolvingPath → Parsing → Applying → Idle
//! ```
//!
//! and stops early on cancellation or failure. Nothing is persisted and the
//! port table is untouched unless a device choice is made. Choosing the
//! "no device" sentinel persists the sentinel and clears the table without
//! applying anything or requesting re-analysis.

use crate::config::{SessionError, SessionStore};
use crate::host::{AddressRange, Host};
use crate::metrics::Metrics;
use crate::models::{
    DeviceSession, LoadPhase, NO_DEVICE, PortTable, ResponseFlags, is_real_device,
};
use crate::services::cfg_parser::{CfgParseError, CfgParser};
use crate::services::path_resolver::{join_relative, resolve};
use crate::state::StateManager;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// File pattern offered by the file prompt
pub const FILE_PATTERN: &str = "*.cfg";

/// Title of the file prompt
pub const PROMPT_TITLE: &str = "Load Processor Configuration";

/// Prefix of lines written to the host's message window
const MESSAGE_PREFIX: &str = "ProcConf";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("No configuration file chosen")]
    NoFileChosen,

    #[error("{selected} cannot be reached from {root}")]
    PathResolutionFailed {
        selected: Utf8PathBuf,
        root: Utf8PathBuf,
    },

    #[error(transparent)]
    Parse(#[from] CfgParseError),

    #[error("No device chosen from {0}")]
    DeviceSelectFailed(String),

    #[error("Device {device} is not described in {config_file}")]
    UnknownDevice { device: String, config_file: String },

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// How one invocation of the loader ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file prompt was dismissed
    Cancelled,
    /// The chosen file shares no ancestor with the config root
    ResolutionFailed,
    /// The file could not be parsed or no device could be chosen
    ParseFailed,
    /// The user declined to select a device
    NoDevice,
    /// The device could not be persisted; nothing was applied
    SessionSaveFailed,
    Applied { device: String, ports: usize },
}

impl LoadOutcome {
    /// Status reported back to the host's action dispatcher.
    ///
    /// False only when no configuration file name could be produced.
    pub fn handled(&self) -> bool {
        !matches!(self, LoadOutcome::Cancelled | LoadOutcome::ResolutionFailed)
    }

    fn from_error(err: &LoadError) -> Self {
        match err {
            LoadError::NoFileChosen => LoadOutcome::Cancelled,
            LoadError::PathResolutionFailed { .. } => LoadOutcome::ResolutionFailed,
            LoadError::Parse(_)
            | LoadError::DeviceSelectFailed(_)
            | LoadError::UnknownDevice { .. } => LoadOutcome::ParseFailed,
            LoadError::Session(_) => LoadOutcome::SessionSaveFailed,
        }
    }
}

/// Orchestrates file choice, parsing, persistence and re-analysis.
pub struct ConfigLoader {
    parser: CfgParser,
    namespace: String,
    default_flags: ResponseFlags,
    metrics: Arc<Metrics>,
}

impl ConfigLoader {
    pub fn new(namespace: impl Into<String>, default_flags: ResponseFlags, metrics: Arc<Metrics>) -> Self {
        Self {
            parser: CfgParser::new(),
            namespace: namespace.into(),
            default_flags,
            metrics,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Run the load action once. Always returns with the loader idle.
    pub fn run<H: Host + ?Sized>(
        &self,
        host: &H,
        state: &StateManager,
        store: &mut dyn SessionStore,
    ) -> LoadOutcome {
        let outcome = match self.load(host, state, store) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.report_failure(host, &err);
                LoadOutcome::from_error(&err)
            }
        };

        state.set_phase(LoadPhase::Idle);
        self.metrics
            .record_load(matches!(outcome, LoadOutcome::Applied { .. }));

        tracing::debug!("Load finished: {:?}", outcome);
        outcome
    }

    fn load<H: Host + ?Sized>(
        &self,
        host: &H,
        state: &StateManager,
        store: &mut dyn SessionStore,
    ) -> Result<LoadOutcome, LoadError> {
        let root = host.config_dir();

        state.set_phase(LoadPhase::AwaitingFileChoice);
        let selected = host
            .ask_for_file(&root, FILE_PATTERN, PROMPT_TITLE)
            .ok_or(LoadError::NoFileChosen)?;

        state.set_phase(LoadPhase::ResolvingPath);
        let config_file = resolve(selected.as_str(), root.as_str()).ok_or_else(|| {
            LoadError::PathResolutionFailed {
                selected: selected.clone(),
                root: root.clone(),
            }
        })?;

        self.message(host, &format!("loading config \"{}\"...", config_file));

        state.set_phase(LoadPhase::Parsing);
        let started = Instant::now();
        let parsed = self.parser.parse_file(&join_relative(&root, &config_file));
        self.metrics.record_parse_time(started.elapsed());
        let catalog = parsed?;

        let device_name = host
            .choose_device(&config_file, &catalog)
            .ok_or_else(|| LoadError::DeviceSelectFailed(config_file.clone()))?;

        if !is_real_device(&device_name) {
            self.message(host, "... done");

            // A later start must stay inert too
            let session = DeviceSession::new(NO_DEVICE, self.default_flags);
            store.save(&self.namespace, &session)?;

            tracing::info!("No device selected from {}, symbolization disabled", config_file);
            state.record_no_device();
            return Ok(LoadOutcome::NoDevice);
        }

        let device = catalog
            .get(&device_name)
            .ok_or_else(|| LoadError::UnknownDevice {
                device: device_name.clone(),
                config_file: config_file.clone(),
            })?;

        self.message(host, "... done");
        self.message(host, &format!("device chosen \"{}\"", device_name));

        state.set_phase(LoadPhase::Applying);
        let flags = host.ask_response_flags(self.default_flags, &config_file);
        let ports = PortTable::from_device(device);
        let port_count = ports.len();

        let session = DeviceSession::new(device_name.clone(), flags).with_config_file(config_file.clone());
        store.save(&self.namespace, &session)?;

        state.commit_device(device_name.clone(), flags, Some(config_file), ports);
        host.apply_device(device, flags);
        host.request_reanalysis(AddressRange::FULL);

        tracing::info!(
            "Applied device {} with {} ports (flags={:#x})",
            device_name,
            port_count,
            flags.bits()
        );

        Ok(LoadOutcome::Applied {
            device: device_name,
            ports: port_count,
        })
    }

    /// Rebuild the port table from the persisted session.
    ///
    /// # Returns
    /// The restored device name, or `None` when there is nothing to restore
    pub fn restore(
        &self,
        state: &StateManager,
        store: &dyn SessionStore,
        root: &Utf8Path,
    ) -> Result<Option<String>, LoadError> {
        let Some(session) = store.load(&self.namespace)? else {
            tracing::debug!("No saved device for {}", self.namespace);
            return Ok(None);
        };

        if !session.has_device() {
            state.record_no_device();
            return Ok(None);
        }

        let Some(config_file) = session.config_file.clone() else {
            tracing::warn!(
                "Saved device {} has no configuration file; ports stay unnamed until reloaded",
                session.device_name
            );
            state.commit_device(
                session.device_name.clone(),
                session.response_flags,
                None,
                PortTable::empty(),
            );
            return Ok(Some(session.device_name));
        };

        let catalog = self.parser.parse_file(&join_relative(root, &config_file))?;
        let device = catalog
            .get(&session.device_name)
            .ok_or_else(|| LoadError::UnknownDevice {
                device: session.device_name.clone(),
                config_file: config_file.clone(),
            })?;

        state.commit_device(
            session.device_name.clone(),
            session.response_flags,
            Some(config_file),
            PortTable::from_device(device),
        );

        tracing::info!("Restored device {}", session.device_name);
        Ok(Some(session.device_name))
    }

    fn report_failure<H: Host + ?Sized>(&self, host: &H, err: &LoadError) {
        match err {
            LoadError::NoFileChosen => tracing::debug!("Load cancelled"),
            LoadError::PathResolutionFailed { .. } => {
                tracing::error!("{}", err);
                self.message(host, &format!("cannot load config: {}", err));
            }
            LoadError::Session(_) => {
                tracing::error!("{}", err);
                self.message(host, &format!("cannot save device: {}", err));
            }
            _ => {
                tracing::error!("{}", err);
                self.message(host, "... failed");
            }
        }
    }

    fn message<H: Host + ?Sized>(&self, host: &H, text: &str) {
        tracing::info!("{}", text);
        host.message(&format!("{}: {}", MESSAGE_PREFIX, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handled_status() {
        assert!(!LoadOutcome::Cancelled.handled());
        assert!(!LoadOutcome::ResolutionFailed.handled());
        assert!(LoadOutcome::ParseFailed.handled());
        assert!(LoadOutcome::NoDevice.handled());
        assert!(
            LoadOutcome::Applied {
                device: "A".into(),
                ports: 0
            }
            .handled()
        );
    }

    #[test]
    fn test_outcome_for_errors() {
        assert_eq!(
            LoadOutcome::from_error(&LoadError::NoFileChosen),
            LoadOutcome::Cancelled
        );
        assert_eq!(
            LoadOutcome::from_error(&LoadError::DeviceSelectFailed("a.cfg".into())),
            LoadOutcome::ParseFailed
        );
        assert_eq!(
            LoadOutcome::from_error(&LoadError::Parse(CfgParseError::NoDevices)),
            LoadOutcome::ParseFailed
        );
    }
}
