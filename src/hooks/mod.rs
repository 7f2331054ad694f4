// Notification dispatch for hosts that run procconf in-process
//
// A real disassembler owns its own dispatcher; the standalone harness and the
// tests use this registry instead. Handler identity is the Arc allocation, so a
// handler can only be removed with the same Arc that registered it.

use crate::host::{EventClass, EventHandler, HookStatus, HostEvent};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HookError {
    #[error("Handler already registered for {0:?} events")]
    AlreadyRegistered(EventClass),

    #[error("Handler is not registered for {0:?} events")]
    NotRegistered(EventClass),
}

struct Registration {
    class: EventClass,
    handler: Arc<dyn EventHandler>,
}

/// Registered handlers, offered events in registration order.
#[derive(Default)]
pub struct HookRegistry {
    registrations: Vec<Registration>,
    installs: usize,
    removals: usize,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        class: EventClass,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), HookError> {
        if self.position(class, &handler).is_some() {
            return Err(HookError::AlreadyRegistered(class));
        }

        self.registrations.push(Registration { class, handler });
        self.installs += 1;
        tracing::debug!("Hook registered for {:?} events", class);
        Ok(())
    }

    pub fn unregister(
        &mut self,
        class: EventClass,
        handler: &Arc<dyn EventHandler>,
    ) -> Result<(), HookError> {
        let index = self
            .position(class, handler)
            .ok_or(HookError::NotRegistered(class))?;

        self.registrations.remove(index);
        self.removals += 1;
        tracing::debug!("Hook unregistered from {:?} events", class);
        Ok(())
    }

    /// Offer an event to the handlers of `class`; the first `Handled` answer wins.
    pub fn dispatch(&self, class: EventClass, mut event: HostEvent<'_>) -> HookStatus {
        for registration in self.registrations.iter().filter(|r| r.class == class) {
            if registration.handler.handle(event.reborrow()) == HookStatus::Handled {
                return HookStatus::Handled;
            }
        }
        HookStatus::NotHandled
    }

    pub fn is_registered(&self, class: EventClass, handler: &Arc<dyn EventHandler>) -> bool {
        self.position(class, handler).is_some()
    }

    /// Number of handlers currently registered
    pub fn active(&self) -> usize {
        self.registrations.len()
    }

    /// Successful registrations over the registry's lifetime
    pub fn installs(&self) -> usize {
        self.installs
    }

    /// Successful removals over the registry's lifetime
    pub fn removals(&self) -> usize {
        self.removals
    }

    fn position(&self, class: EventClass, handler: &Arc<dyn EventHandler>) -> Option<usize> {
        self.registrations
            .iter()
            .position(|r| r.class == class && Arc::ptr_eq(&r.handler, handler))
    }
}
