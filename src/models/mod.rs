//! Data models for procconf.
//!
//! - [`PortTable`]: lookup table of the selected device's ports, built from a [`DeviceDescription`]
//! - [`DeviceCatalog`]: every device section of one `.cfg` file
//! - [`DeviceSession`]: the persisted device choice and [`ResponseFlags`]
//! - [`ExtensionState`]: runtime state shared by the loader and the render hook
//! - [`ExtensionSettings`]: settings loaded from `procconf.yaml`

pub mod extension_state;
pub mod port;
pub mod session;
pub mod settings;

pub use extension_state::{ExtensionState, LoadPhase};
pub use port::{DeviceCatalog, DeviceDescription, EntryPoint, MemoryArea, PortEntry, PortTable};
pub use session::{DeviceSession, NO_DEVICE, ResponseFlags, is_real_device};
pub use settings::{ExtensionSettings, LoggingSettings};
