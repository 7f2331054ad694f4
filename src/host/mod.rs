//! The surface of the host disassembler that procconf consumes.
//!
//! The host owns the database, the UI and the rendering pipeline. procconf
//! reaches them only through [`Host`] and receives rendering notifications as
//! typed [`HostEvent`]s delivered to an [`EventHandler`].

pub mod standalone;

pub use standalone::StandaloneHost;

use crate::models::{DeviceCatalog, DeviceDescription, ResponseFlags};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;

/// Address range of the analysed program, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub start: u64,
    pub end: u64,
}

impl AddressRange {
    /// The whole address space
    pub const FULL: AddressRange = AddressRange {
        start: 0,
        end: u64::MAX,
    };
}

/// Notification classes a handler can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    /// Processor module events, including operand rendering
    Processor,
    /// Database events
    Database,
    /// User interface events
    Ui,
}

/// Answer of a handler to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    /// The host falls back to its default behaviour
    NotHandled,
    /// The handler produced the output; the host skips its default
    Handled,
}

impl HookStatus {
    /// The integer convention used by host notification callbacks
    pub fn code(self) -> isize {
        match self {
            HookStatus::NotHandled => 0,
            HookStatus::Handled => 1,
        }
    }
}

/// Kind of an instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Void,
    Register,
    Memory,
    Phrase,
    Displacement,
    Immediate,
    Far,
    Near,
    Other(u8),
}

/// Operand about to be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandDescriptor {
    pub kind: OperandKind,
    /// Immediate value; meaningful only for [`OperandKind::Immediate`]
    pub value: u64,
}

impl OperandDescriptor {
    pub fn immediate(value: u64) -> Self {
        Self {
            kind: OperandKind::Immediate,
            value,
        }
    }
}

/// Colour class of a rendered token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTag {
    Default,
    Number,
    Register,
    /// Style used for names imported from outside the program
    ImportedName,
}

/// Output line being built by the host's renderer.
pub trait RenderContext {
    fn out_line(&mut self, text: &str, color: ColorTag);
}

/// A notification from the host.
pub enum HostEvent<'a> {
    /// An operand is about to be rendered
    OperandRender {
        context: &'a mut dyn RenderContext,
        operand: &'a OperandDescriptor,
    },
    /// Any notification procconf does not interpret
    Other { code: i32 },
}

impl HostEvent<'_> {
    /// Borrow the event again so it can be offered to several handlers in turn.
    pub fn reborrow(&mut self) -> HostEvent<'_> {
        match self {
            HostEvent::OperandRender { context, operand } => HostEvent::OperandRender {
                context: &mut **context,
                operand: *operand,
            },
            HostEvent::Other { code } => HostEvent::Other { code: *code },
        }
    }
}

/// Receiver of host notifications.
///
/// Implementors override the methods for the events they care about; every
/// other event is answered with [`HookStatus::NotHandled`].
pub trait EventHandler: Send + Sync {
    fn on_operand_render(
        &self,
        _context: &mut dyn RenderContext,
        _operand: &OperandDescriptor,
    ) -> HookStatus {
        HookStatus::NotHandled
    }

    fn handle(&self, event: HostEvent<'_>) -> HookStatus {
        match event {
            HostEvent::OperandRender { context, operand } => {
                self.on_operand_render(context, operand)
            }
            HostEvent::Other { .. } => HookStatus::NotHandled,
        }
    }
}

/// Services the host disassembler provides to procconf.
pub trait Host {
    /// Directory holding the host's `.cfg` device descriptions
    fn config_dir(&self) -> Utf8PathBuf;

    /// Ask the user for a file. `None` means the prompt was dismissed.
    fn ask_for_file(&self, root: &Utf8Path, pattern: &str, title: &str) -> Option<Utf8PathBuf>;

    /// Let the user pick a device of a parsed configuration file.
    ///
    /// Returns the chosen device name ([`NO_DEVICE`](crate::models::NO_DEVICE)
    /// when the user declines), or `None` if the choice failed.
    fn choose_device(&self, config_file: &str, catalog: &DeviceCatalog) -> Option<String>;

    /// Ask which parts of the device description should be applied.
    fn ask_response_flags(&self, default: ResponseFlags, config_file: &str) -> ResponseFlags;

    /// Apply areas, port names and entry points of the chosen device.
    fn apply_device(&self, device: &DeviceDescription, flags: ResponseFlags);

    fn request_reanalysis(&self, range: AddressRange);

    /// Show a line in the host's message window
    fn message(&self, text: &str);

    /// Returns false if the host refused the registration.
    fn register_hook(&self, class: EventClass, handler: Arc<dyn EventHandler>) -> bool;

    /// Returns false if the handler was not registered for `class`.
    fn unregister_hook(&self, class: EventClass, handler: &Arc<dyn EventHandler>) -> bool;
}
