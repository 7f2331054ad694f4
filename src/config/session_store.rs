use crate::models::DeviceSession;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;
use thiserror::Error;

/// File holding every namespace's record inside the state directory
pub const SESSIONS_FILE: &str = "sessions.yaml";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access session file {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed session file {path}: {source}")]
    Format {
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

/// Storage for the persisted device choice, keyed by namespace.
///
/// `save` always overwrites the namespace's record. A namespace that was never
/// saved loads as `None`, which is the normal first-run state.
pub trait SessionStore {
    fn save(&mut self, namespace: &str, session: &DeviceSession) -> Result<(), SessionError>;
    fn load(&self, namespace: &str) -> Result<Option<DeviceSession>, SessionError>;
}

/// Session records kept in `<state_dir>/sessions.yaml`.
#[derive(Debug, Clone)]
pub struct YamlSessionStore {
    path: Utf8PathBuf,
}

impl YamlSessionStore {
    /// Create a store inside `state_dir`, creating the directory if needed.
    pub fn new<P: AsRef<Utf8Path>>(state_dir: P) -> Result<Self, SessionError> {
        let state_dir = state_dir.as_ref();
        if !state_dir.exists() {
            fs::create_dir_all(state_dir).map_err(|source| SessionError::Io {
                path: state_dir.to_path_buf(),
                source,
            })?;
        }

        Ok(Self {
            path: state_dir.join(SESSIONS_FILE),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Where a malformed session file is kept before being rewritten
    pub fn backup_path(&self) -> Utf8PathBuf {
        self.path.with_extension("yaml.bak")
    }

    fn read_all(&self) -> Result<IndexMap<String, DeviceSession>, SessionError> {
        if !self.path.exists() {
            return Ok(IndexMap::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })?;

        if contents.trim().is_empty() {
            return Ok(IndexMap::new());
        }

        serde_yaml_ng::from_str(&contents).map_err(|source| SessionError::Format {
            path: self.path.clone(),
            source,
        })
    }
}

impl SessionStore for YamlSessionStore {
    fn save(&mut self, namespace: &str, session: &DeviceSession) -> Result<(), SessionError> {
        let mut records = match self.read_all() {
            Ok(records) => records,
            Err(SessionError::Format { source, .. }) => {
                // Keep the unreadable file for repair, then start over
                let backup = self.backup_path();
                fs::copy(&self.path, &backup).map_err(|source| SessionError::Io {
                    path: backup.clone(),
                    source,
                })?;
                tracing::warn!(
                    "Session file {} is malformed ({}); copied to {} and rewritten",
                    self.path,
                    source,
                    backup
                );
                IndexMap::new()
            }
            Err(e) => return Err(e),
        };
        records.insert(namespace.to_string(), session.clone());

        let yaml = serde_yaml_ng::to_string(&records).map_err(|source| SessionError::Format {
            path: self.path.clone(),
            source,
        })?;

        fs::write(&self.path, yaml).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(
            "Saved device {} (flags={:#x}) for {} to {}",
            session.device_name,
            session.response_flags.bits(),
            namespace,
            self.path
        );
        Ok(())
    }

    fn load(&self, namespace: &str) -> Result<Option<DeviceSession>, SessionError> {
        let session = self.read_all()?.shift_remove(namespace);
        match &session {
            Some(s) => tracing::debug!("Loaded device {} for {}", s.device_name, namespace),
            None => tracing::debug!("No saved device for {}", namespace),
        }
        Ok(session)
    }
}

/// In-process store for embedding hosts that persist state themselves.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    records: IndexMap<String, DeviceSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&mut self, namespace: &str, session: &DeviceSession) -> Result<(), SessionError> {
        self.records.insert(namespace.to_string(), session.clone());
        Ok(())
    }

    fn load(&self, namespace: &str) -> Result<Option<DeviceSession>, SessionError> {
        Ok(self.records.get(namespace).cloned())
    }
}
