//! Services module - the logic of loading a device and symbolizing operands.
//!
//! The services know the host only through the [`Host`](crate::host::Host) trait
//! and share runtime data only through [`StateManager`](crate::state::StateManager),
//! so each one can be driven directly from tests.
//!
//! # Components
//!
//! - [`path_resolver`]: path of a chosen file relative to the host configuration
//!   directory, expressed as `../` steps plus a tail
//! - [`CfgParser`]: reader for `.cfg` port description files
//! - [`ConfigLoader`]: the load action (file prompt → path → parse → persist →
//!   re-analysis) and restoring the previous session at start-up
//! - [`OperandSymbolizer`]: render hook that prints port names for matching immediates
//!
//! # Usage Example
//!
//! ```ignore
//! use procconf::services::ConfigLoader;
//!
//! let loader = ConfigLoader::new("$ procconf", ResponseFlags::ALL, metrics);
//! let outcome = loader.run(&host, &state, &mut store);
//! if let LoadOutcome::Applied { device, ports } = outcome {
//!     println!("{device}: {ports} ports");
//! }
//! ```

pub mod cfg_parser;
pub mod loader;
pub mod path_resolver;
pub mod symbolizer;

pub use cfg_parser::{CfgParseError, CfgParser, parse_number};
pub use loader::{ConfigLoader, FILE_PATTERN, LoadError, LoadOutcome, PROMPT_TITLE};
pub use path_resolver::{PathStyle, join_relative, resolve, resolve_with};
pub use symbolizer::OperandSymbolizer;
