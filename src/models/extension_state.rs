use crate::models::{PortEntry, PortTable, ResponseFlags, is_real_device};

/// Step of the configuration loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    AwaitingFileChoice,
    ResolvingPath,
    Parsing,
    Applying,
}

/// Runtime state shared by the loader and the operand symbolizer.
///
/// Owned by [`StateManager`](crate::state::StateManager); the loader is the
/// only writer, the render hook only reads.
#[derive(Debug, Clone, Default)]
pub struct ExtensionState {
    /// Selected device; `None` until a device was loaded or restored
    pub device: Option<String>,
    pub response_flags: ResponseFlags,

    /// Configuration file of the device, relative to the config root
    pub config_file: Option<String>,

    pub ports: PortTable,
    pub phase: LoadPhase,
}

impl ExtensionState {
    /// True when a real device is selected (not the "no device" sentinel).
    pub fn has_device(&self) -> bool {
        self.device.as_deref().is_some_and(is_real_device)
    }

    /// Port for an immediate value, or `None` when symbolization is inert.
    pub fn lookup(&self, value: u64) -> Option<&PortEntry> {
        if !self.has_device() {
            return None;
        }
        self.ports.lookup(value)
    }
}
