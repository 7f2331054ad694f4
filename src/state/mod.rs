// State management module
//
// StateManager wraps ExtensionState with shared access through Arc<RwLock<T>>
// and emits change events. The loader writes through it; the render hook reads.

use crate::models::{ExtensionState, LoadPhase, NO_DEVICE, PortTable, ResponseFlags};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The loader moved to another step
    PhaseChanged { phase: LoadPhase },

    /// A different device (or the "no device" sentinel) was selected
    DeviceChanged { device: Option<String> },

    /// The port table was replaced
    PortsReloaded { count: usize },

    /// Response flags of the selected device changed
    FlagsChanged { flags: ResponseFlags },
}

/// Fields compared before and after an update to derive [`StateChange`]s.
///
/// The port table itself is not cloned; a replacement is detected through
/// `generation`.
struct Fingerprint {
    phase: LoadPhase,
    device: Option<String>,
    flags: ResponseFlags,
    generation: u64,
}

struct Shared {
    state: ExtensionState,
    /// Bumped every time the port table is replaced
    generation: u64,
}

/// Shared extension state with change notification
///
/// - [`read()`](Self::read) for read access (used per rendered operand)
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    shared: Arc<RwLock<Shared>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with an inert state
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(64);
        Self {
            shared: Arc::new(RwLock::new(Shared {
                state: ExtensionState::default(),
                generation: 0,
            })),
            state_tx,
        }
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ExtensionState) -> R,
    {
        let shared = self.shared.read().unwrap_or_else(PoisonError::into_inner);
        f(&shared.state)
    }

    /// Clone the current state
    pub fn snapshot(&self) -> ExtensionState {
        self.read(ExtensionState::clone)
    }

    /// Update the state and emit change events
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut ExtensionState),
    {
        self.update_inner(false, update_fn)
    }

    fn update_inner<F>(&self, replaces_ports: bool, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut ExtensionState),
    {
        let mut shared = self.shared.write().unwrap_or_else(PoisonError::into_inner);
        let before = Self::fingerprint(&shared);

        update_fn(&mut shared.state);
        if replaces_ports {
            shared.generation += 1;
        }

        let changes = Self::detect_changes(&before, &shared);
        drop(shared);

        for change in &changes {
            // Nobody listening is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn fingerprint(shared: &Shared) -> Fingerprint {
        Fingerprint {
            phase: shared.state.phase,
            device: shared.state.device.clone(),
            flags: shared.state.response_flags,
            generation: shared.generation,
        }
    }

    fn detect_changes(before: &Fingerprint, after: &Shared) -> Vec<StateChange> {
        let mut changes = Vec::new();
        let state = &after.state;

        if before.phase != state.phase {
            changes.push(StateChange::PhaseChanged { phase: state.phase });
        }

        if before.device != state.device {
            changes.push(StateChange::DeviceChanged {
                device: state.device.clone(),
            });
        }

        if before.flags != state.response_flags {
            changes.push(StateChange::FlagsChanged {
                flags: state.response_flags,
            });
        }

        if before.generation != after.generation {
            changes.push(StateChange::PortsReloaded {
                count: state.ports.len(),
            });
        }

        changes
    }

    // Convenience methods used by the loader

    pub fn set_phase(&self, phase: LoadPhase) -> Vec<StateChange> {
        self.update(|state| state.phase = phase)
    }

    /// Make a device current, replacing the port table.
    pub fn commit_device(
        &self,
        device: String,
        flags: ResponseFlags,
        config_file: Option<String>,
        ports: PortTable,
    ) -> Vec<StateChange> {
        self.update_inner(true, |state| {
            state.device = Some(device);
            state.response_flags = flags;
            state.config_file = config_file;
            state.ports = ports;
        })
    }

    /// Record that the user declined to select a device. Symbolization goes inert.
    pub fn record_no_device(&self) -> Vec<StateChange> {
        self.update_inner(true, |state| {
            state.device = Some(NO_DEVICE.to_string());
            state.config_file = None;
            state.ports = PortTable::empty();
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same state
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            state_tx: self.state_tx.clone(),
        }
    }
}
