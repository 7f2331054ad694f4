//! Integration tests for the extension lifecycle
//!
//! These tests run ExtensionContext against the standalone host and verify that:
//! - start installs exactly one render hook and stop removes that same hook
//! - Immediates render as port names only while a device is loaded
//! - A device chosen in one session is restored by the next one
//! - Declining a device keeps later sessions inert
//! - start and stop reject being called out of order

use camino::Utf8PathBuf;
use procconf::config::{MemorySessionStore, SessionStore, YamlSessionStore};
use procconf::host::{EventClass, EventHandler, Host, OperandDescriptor};
use procconf::models::{DeviceSession, ExtensionSettings, NO_DEVICE, ResponseFlags};
use procconf::{ContextError, ExtensionContext, LoadOutcome, StandaloneHost};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const BOARD_CFG: &str = "\
.default board
.board
LED     0x20    status LED
BUTTON  0x21
";

struct Workspace {
    _temp: TempDir,
    root: Utf8PathBuf,
    state_dir: Utf8PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let base = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let root = base.join("cfg");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("board.cfg"), BOARD_CFG).unwrap();

        Self {
            _temp: temp,
            state_dir: base.join("state"),
            root,
        }
    }

    fn host(&self) -> StandaloneHost {
        StandaloneHost::new(&self.root, ResponseFlags::ALL).with_selected_file(self.root.join("board.cfg"))
    }

    fn context(&self) -> ExtensionContext {
        let store = YamlSessionStore::new(&self.state_dir).unwrap();
        ExtensionContext::new(ExtensionSettings::default(), Box::new(store))
    }
}

#[test]
fn test_start_and_stop_balance_hooks() {
    let workspace = Workspace::new();
    let host = workspace.host();
    let mut context = workspace.context();

    context.start(&host).unwrap();
    assert!(context.is_started());
    assert_eq!(host.active_hooks(), 1);

    context.stop(&host).unwrap();
    assert!(!context.is_started());
    assert_eq!(host.active_hooks(), 0);
    assert_eq!(host.hook_counts(), (1, 1));
}

#[test]
fn test_rendering_follows_loaded_device() {
    let workspace = Workspace::new();
    let host = workspace.host();
    let mut context = workspace.context();
    context.start(&host).unwrap();

    // No device yet
    assert_eq!(host.render_operand(&OperandDescriptor::immediate(0x20)), "0x20");

    let outcome = context.run(&host);
    assert_eq!(
        outcome,
        LoadOutcome::Applied {
            device: "board".to_string(),
            ports: 2
        }
    );
    assert_eq!(host.reanalysis_requests(), 1);
    assert_eq!(host.render_operand(&OperandDescriptor::immediate(0x20)), "LED");
    assert_eq!(host.render_operand(&OperandDescriptor::immediate(0x21)), "BUTTON");
    assert_eq!(host.render_operand(&OperandDescriptor::immediate(0x22)), "0x22");
    assert_eq!(context.metrics().hit_ratio(), 0.5);

    context.stop(&host).unwrap();

    // Hook gone, the host prints numbers again
    assert_eq!(host.render_operand(&OperandDescriptor::immediate(0x20)), "0x20");
}

#[test]
fn test_next_session_restores_device() {
    let workspace = Workspace::new();

    {
        let host = workspace.host();
        let mut context = workspace.context();
        context.start(&host).unwrap();
        context.run(&host);
        context.stop(&host).unwrap();
    }

    let host = StandaloneHost::new(&workspace.root, ResponseFlags::ALL);
    let mut context = workspace.context();
    context.start(&host).unwrap();

    assert_eq!(context.state().snapshot().device.as_deref(), Some("board"));
    assert_eq!(context.symbolizer().symbol_for(0x21).as_deref(), Some("BUTTON"));
    assert_eq!(host.render_operand(&OperandDescriptor::immediate(0x20)), "LED");
    assert_eq!(host.reanalysis_requests(), 0);

    context.stop(&host).unwrap();
}

#[test]
fn test_declined_device_stays_declined_after_restart() {
    let workspace = Workspace::new();

    {
        let host = workspace.host();
        let mut context = workspace.context();
        context.start(&host).unwrap();
        context.run(&host);
        context.stop(&host).unwrap();
    }

    {
        let host = workspace.host().with_device_choice(NO_DEVICE);
        let mut context = workspace.context();
        context.start(&host).unwrap();
        assert_eq!(context.symbolizer().symbol_for(0x20).as_deref(), Some("LED"));

        assert_eq!(context.run(&host), LoadOutcome::NoDevice);
        assert_eq!(context.symbolizer().symbol_for(0x20), None);
        context.stop(&host).unwrap();
    }

    let host = StandaloneHost::new(&workspace.root, ResponseFlags::ALL);
    let mut context = workspace.context();
    context.start(&host).unwrap();

    assert_eq!(context.state().snapshot().device.as_deref(), Some(NO_DEVICE));
    assert_eq!(context.symbolizer().symbol_for(0x20), None);
    assert_eq!(host.render_operand(&OperandDescriptor::immediate(0x20)), "0x20");

    context.stop(&host).unwrap();
}

#[test]
fn test_broken_saved_session_still_starts() {
    let workspace = Workspace::new();
    let mut store = MemorySessionStore::new();
    store
        .save(
            &ExtensionSettings::default().namespace,
            &DeviceSession::new("board", ResponseFlags::ALL).with_config_file("missing.cfg"),
        )
        .unwrap();

    let host = StandaloneHost::new(&workspace.root, ResponseFlags::ALL);
    let mut context = ExtensionContext::new(ExtensionSettings::default(), Box::new(store));

    context.start(&host).unwrap();
    assert!(!context.state().snapshot().has_device());
    assert_eq!(host.render_operand(&OperandDescriptor::immediate(0x20)), "0x20");
    context.stop(&host).unwrap();
}

#[test]
fn test_double_start_is_rejected() {
    let workspace = Workspace::new();
    let host = workspace.host();
    let mut context = workspace.context();

    context.start(&host).unwrap();
    assert_eq!(context.start(&host), Err(ContextError::AlreadyStarted));
    assert_eq!(host.active_hooks(), 1);

    context.stop(&host).unwrap();
}

#[test]
fn test_stop_without_start_is_rejected() {
    let workspace = Workspace::new();
    let host = workspace.host();
    let mut context = workspace.context();

    assert_eq!(context.stop(&host), Err(ContextError::NotStarted));
    assert_eq!(host.hook_counts(), (0, 0));
}

#[test]
fn test_foreign_handler_cannot_remove_ours() {
    let workspace = Workspace::new();
    let host = workspace.host();
    let mut context = workspace.context();
    context.start(&host).unwrap();

    // Identity is the Arc, not the handler type
    let stranger: Arc<dyn EventHandler> = Arc::new(Stranger);
    assert!(!host.unregister_hook(EventClass::Processor, &stranger));
    assert_eq!(host.active_hooks(), 1);

    context.stop(&host).unwrap();
    assert_eq!(context.stop(&host), Err(ContextError::NotStarted));
}

struct Stranger;
impl EventHandler for Stranger {}
