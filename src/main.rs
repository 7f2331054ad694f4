//! procconf - load a processor configuration outside a disassembler
//!
//! Main entry point for the standalone tool.
//!
//! # Overview
//!
//! The binary drives the extension through [`StandaloneHost`], which answers
//! host requests with a native file dialog and the file's default device. It
//! initializes:
//! - Settings ([`SettingsManager`], `procconf.yaml` in the working directory)
//! - Logging infrastructure (file rotation + console output)
//! - The session store remembering the last device between runs
//! - The extension context (restore, load action, render hook)
//!
//! # Execution Flow
//!
//! 1. Load settings, then initialize logging → logs/procconf.<date>
//! 2. Start the extension, restoring the previously chosen device
//! 3. Run the load action once (file prompt → parse → persist)
//! 4. Print the resulting port table and the state changes it caused
//! 5. Stop the extension, removing its render hook

use anyhow::{Context, Result};
use procconf::config::absolute_config_root;
use procconf::host::OperandDescriptor;
use procconf::{
    APP_NAME, ExtensionContext, LoadOutcome, ResponseFlags, SettingsManager, StandaloneHost,
    StateChange, VERSION, YamlSessionStore,
};

fn main() -> Result<()> {
    let settings_manager = SettingsManager::new(".")?;
    let settings = settings_manager.load()?;

    let _guard = procconf::logging::setup_logging(&settings.logging)?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let store = YamlSessionStore::new(&settings.state_dir)
        .with_context(|| format!("Failed to open session store in {}", settings.state_dir))?;

    let config_root = absolute_config_root(&settings)?;
    tracing::debug!("Configuration root: {}", config_root);
    let host = StandaloneHost::new(
        &config_root,
        ResponseFlags::from_mask(settings.default_response_flags),
    );

    let mut context = ExtensionContext::new(settings, Box::new(store));
    context.start(&host)?;

    let mut changes = context.state().subscribe();
    let outcome = context.run(&host);

    while let Ok(change) = changes.try_recv() {
        match change {
            StateChange::DeviceChanged { device } => {
                tracing::info!("Device is now {}", device.as_deref().unwrap_or("<none>"))
            }
            StateChange::PortsReloaded { count } => tracing::info!("{} ports loaded", count),
            other => tracing::debug!("{:?}", other),
        }
    }

    match &outcome {
        LoadOutcome::Applied { device, ports } => {
            println!("{device}: {ports} ports");
            let state = context.state().snapshot();
            for port in state.ports.iter() {
                let rendered = host.render_operand(&OperandDescriptor::immediate(port.address));
                println!("  {:#06x}  {}", port.address, rendered);
            }
        }
        LoadOutcome::NoDevice => println!("No device selected; operands are left as numbers"),
        LoadOutcome::Cancelled => println!("No configuration file chosen"),
        other => println!("Load did not complete: {:?}", other),
    }

    context.stop(&host)?;

    if !outcome.handled() {
        tracing::warn!("Load action reported failure");
    }
    tracing::info!("{} shutting down", APP_NAME);
    Ok(())
}
