// Host implementation for running procconf outside a disassembler
//
// Uses a native file dialog for the file prompt, picks the file's default
// device without asking, and keeps render hooks in a HookRegistry so
// operands can be rendered through the same path a real host would use.

use crate::hooks::HookRegistry;
use crate::host::{
    AddressRange, ColorTag, EventClass, EventHandler, HookStatus, Host, HostEvent,
    OperandDescriptor, RenderContext,
};
use crate::models::{DeviceCatalog, DeviceDescription, ResponseFlags};
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::{Cell, RefCell};
use std::sync::Arc;

pub struct StandaloneHost {
    config_dir: Utf8PathBuf,
    default_flags: ResponseFlags,

    /// Answer for the file prompt instead of showing a dialog
    preselected: Option<Utf8PathBuf>,
    /// Answer for the device prompt; the file's default device otherwise
    device_choice: Option<String>,

    hooks: RefCell<HookRegistry>,
    reanalysis_requests: Cell<usize>,
    messages: RefCell<Vec<String>>,
}

impl StandaloneHost {
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P, default_flags: ResponseFlags) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
            default_flags,
            preselected: None,
            device_choice: None,
            hooks: RefCell::new(HookRegistry::new()),
            reanalysis_requests: Cell::new(0),
            messages: RefCell::new(Vec::new()),
        }
    }

    /// Answer the file prompt with `path` instead of opening a dialog.
    pub fn with_selected_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.preselected = Some(path.as_ref().to_path_buf());
        self
    }

    /// Answer the device prompt with `device`, which may be the "no device" sentinel.
    pub fn with_device_choice(mut self, device: impl Into<String>) -> Self {
        self.device_choice = Some(device.into());
        self
    }

    /// Render one operand through the registered processor hooks.
    pub fn render_operand(&self, operand: &OperandDescriptor) -> String {
        let mut line = TextLine::default();
        let status = self.hooks.borrow().dispatch(
            EventClass::Processor,
            HostEvent::OperandRender {
                context: &mut line,
                operand,
            },
        );

        if status == HookStatus::NotHandled {
            line.out_line(&format!("{:#x}", operand.value), ColorTag::Number);
        }
        line.into_text()
    }

    pub fn reanalysis_requests(&self) -> usize {
        self.reanalysis_requests.get()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn active_hooks(&self) -> usize {
        self.hooks.borrow().active()
    }

    /// (installs, removals) over the host's lifetime
    pub fn hook_counts(&self) -> (usize, usize) {
        let hooks = self.hooks.borrow();
        (hooks.installs(), hooks.removals())
    }

    fn show_file_picker(root: &Utf8Path, pattern: &str, title: &str) -> Option<Utf8PathBuf> {
        use rfd::FileDialog;

        let extension = pattern.trim_start_matches("*.");
        let dialog = FileDialog::new()
            .set_title(title)
            .set_directory(root)
            .add_filter("Processor configuration", &[extension]);

        dialog.pick_file().and_then(|path| {
            Utf8PathBuf::try_from(path)
                .map_err(|e| {
                    tracing::error!("Failed to convert path to UTF-8: {}", e);
                    e
                })
                .ok()
        })
    }
}

impl Host for StandaloneHost {
    fn config_dir(&self) -> Utf8PathBuf {
        self.config_dir.clone()
    }

    fn ask_for_file(&self, root: &Utf8Path, pattern: &str, title: &str) -> Option<Utf8PathBuf> {
        match &self.preselected {
            Some(path) => Some(path.clone()),
            None => Self::show_file_picker(root, pattern, title),
        }
    }

    fn choose_device(&self, config_file: &str, catalog: &DeviceCatalog) -> Option<String> {
        let names: Vec<_> = catalog.device_names().collect();
        tracing::debug!("Devices in {}: {}", config_file, names.join(", "));

        match &self.device_choice {
            Some(device) => Some(device.clone()),
            None => catalog.preferred_device().map(|device| device.name.clone()),
        }
    }

    fn ask_response_flags(&self, default: ResponseFlags, _config_file: &str) -> ResponseFlags {
        if default != self.default_flags {
            tracing::debug!(
                "Using configured flags {:#x} instead of {:#x}",
                self.default_flags.bits(),
                default.bits()
            );
        }
        self.default_flags
    }

    fn apply_device(&self, device: &DeviceDescription, flags: ResponseFlags) {
        if flags.contains(ResponseFlags::AREA) {
            for area in &device.areas {
                tracing::info!(
                    "Area {} {} {:#x}..{:#x}",
                    area.class,
                    area.name,
                    area.start,
                    area.end
                );
            }
        }
        if flags.contains(ResponseFlags::INTERRUPT) {
            for entry in &device.entries {
                tracing::info!("Entry {} at {:#x}", entry.name, entry.address);
            }
        }
        if flags.contains(ResponseFlags::PORT) {
            tracing::info!("{} ports named for {}", device.ports.len(), device.name);
        }
    }

    fn request_reanalysis(&self, range: AddressRange) {
        self.reanalysis_requests.set(self.reanalysis_requests.get() + 1);
        tracing::info!("Re-analysis requested for {:#x}..{:#x}", range.start, range.end);
    }

    fn message(&self, text: &str) {
        tracing::info!(target: "host", "{}", text);
        self.messages.borrow_mut().push(text.to_string());
    }

    fn register_hook(&self, class: EventClass, handler: Arc<dyn EventHandler>) -> bool {
        match self.hooks.borrow_mut().register(class, handler) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }

    fn unregister_hook(&self, class: EventClass, handler: &Arc<dyn EventHandler>) -> bool {
        match self.hooks.borrow_mut().unregister(class, handler) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }
}

/// Render context that collects the tokens of one operand as plain text.
#[derive(Debug, Default)]
pub struct TextLine {
    text: String,
}

impl TextLine {
    pub fn into_text(self) -> String {
        self.text
    }
}

impl RenderContext for TextLine {
    fn out_line(&mut self, text: &str, _color: ColorTag) {
        self.text.push_str(text);
    }
}
