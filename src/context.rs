//! Extension lifecycle.
//!
//! [`ExtensionContext`] owns everything the extension keeps between host
//! calls: the shared state, the session store, the loader and the render hook.
//! The host calls [`start`](ExtensionContext::start) once when the extension is
//! loaded, [`run`](ExtensionContext::run) for every user invocation and
//! [`stop`](ExtensionContext::stop) once at teardown.

use crate::config::SessionStore;
use crate::host::{EventClass, EventHandler, Host};
use crate::metrics::Metrics;
use crate::models::{ExtensionSettings, ResponseFlags};
use crate::services::{ConfigLoader, LoadOutcome, OperandSymbolizer};
use crate::state::StateManager;
use std::sync::Arc;
use thiserror::Error;

/// Event class the render hook is registered for
pub const HOOK_CLASS: EventClass = EventClass::Processor;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContextError {
    #[error("Extension is already started")]
    AlreadyStarted,

    #[error("Extension is not started")]
    NotStarted,

    #[error("Host refused the {0:?} hook")]
    HookRefused(EventClass),

    #[error("Host had no {0:?} hook to remove")]
    HookMissing(EventClass),
}

pub struct ExtensionContext {
    settings: ExtensionSettings,
    state: StateManager,
    store: Box<dyn SessionStore>,
    loader: ConfigLoader,
    symbolizer: Arc<OperandSymbolizer>,
    metrics: Arc<Metrics>,

    /// The exact handler given to the host; `Some` while started
    hook: Option<Arc<dyn EventHandler>>,
}

impl ExtensionContext {
    pub fn new(settings: ExtensionSettings, store: Box<dyn SessionStore>) -> Self {
        let metrics = Arc::new(Metrics::new());
        let state = StateManager::new();
        let loader = ConfigLoader::new(
            settings.namespace.clone(),
            ResponseFlags::from_mask(settings.default_response_flags),
            metrics.clone(),
        );
        let symbolizer = Arc::new(OperandSymbolizer::new(state.clone(), metrics.clone()));

        Self {
            settings,
            state,
            store,
            loader,
            symbolizer,
            metrics,
            hook: None,
        }
    }

    /// Restore the previous device and install the render hook.
    pub fn start<H: Host + ?Sized>(&mut self, host: &H) -> Result<(), ContextError> {
        if self.hook.is_some() {
            return Err(ContextError::AlreadyStarted);
        }

        let root = host.config_dir();
        match self.loader.restore(&self.state, self.store.as_ref(), &root) {
            Ok(Some(device)) => tracing::info!("Resuming with device {}", device),
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not restore previous device: {}", e),
        }

        let handler: Arc<dyn EventHandler> = self.symbolizer.clone();
        if !host.register_hook(HOOK_CLASS, handler.clone()) {
            return Err(ContextError::HookRefused(HOOK_CLASS));
        }
        self.hook = Some(handler);

        tracing::info!("Extension started (namespace {})", self.settings.namespace);
        Ok(())
    }

    /// Handle one user invocation of the load action.
    pub fn run<H: Host + ?Sized>(&mut self, host: &H) -> LoadOutcome {
        self.loader.run(host, &self.state, self.store.as_mut())
    }

    /// Remove the render hook installed by [`start`](Self::start).
    pub fn stop<H: Host + ?Sized>(&mut self, host: &H) -> Result<(), ContextError> {
        let handler = self.hook.take().ok_or(ContextError::NotStarted)?;
        let removed = host.unregister_hook(HOOK_CLASS, &handler);

        self.metrics.log_summary();
        tracing::info!("Extension stopped");

        if removed {
            Ok(())
        } else {
            Err(ContextError::HookMissing(HOOK_CLASS))
        }
    }

    pub fn is_started(&self) -> bool {
        self.hook.is_some()
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn settings(&self) -> &ExtensionSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn symbolizer(&self) -> &OperandSymbolizer {
        &self.symbolizer
    }
}

impl Drop for ExtensionContext {
    fn drop(&mut self) {
        if self.hook.is_some() {
            tracing::warn!("Extension dropped while its render hook is still registered");
        }
    }
}
