// procconf - processor configuration loader for disassembler hosts
//
// This is the library crate containing the extension logic and data structures.
// The binary crate (main.rs) drives it through a standalone host.

pub mod config;
pub mod context;
pub mod hooks;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::{MemorySessionStore, SessionStore, SettingsManager, YamlSessionStore};
pub use context::{ContextError, ExtensionContext};
pub use host::{Host, StandaloneHost};
pub use models::{DeviceSession, ExtensionSettings, PortEntry, PortTable, ResponseFlags};
pub use services::{ConfigLoader, LoadOutcome};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
