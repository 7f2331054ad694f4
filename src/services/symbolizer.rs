use crate::host::{ColorTag, EventHandler, HookStatus, OperandDescriptor, OperandKind, RenderContext};
use crate::metrics::Metrics;
use crate::state::StateManager;
use std::sync::Arc;

/// Render hook that prints port names in place of matching immediates.
///
/// Only reads the shared state, so repeated calls with the same operand and an
/// unchanged port table always give the same answer.
pub struct OperandSymbolizer {
    state: StateManager,
    metrics: Arc<Metrics>,
}

impl OperandSymbolizer {
    pub fn new(state: StateManager, metrics: Arc<Metrics>) -> Self {
        Self { state, metrics }
    }

    /// Port name for an immediate value, if the selected device defines one
    pub fn symbol_for(&self, value: u64) -> Option<String> {
        self.state.read(|s| s.lookup(value).map(|port| port.name.clone()))
    }
}

impl EventHandler for OperandSymbolizer {
    fn on_operand_render(
        &self,
        context: &mut dyn RenderContext,
        operand: &OperandDescriptor,
    ) -> HookStatus {
        if operand.kind != OperandKind::Immediate {
            return HookStatus::NotHandled;
        }

        let status = self.state.read(|s| match s.lookup(operand.value) {
            Some(port) => {
                context.out_line(&port.name, ColorTag::ImportedName);
                HookStatus::Handled
            }
            None => HookStatus::NotHandled,
        });

        self.metrics.record_operand(status == HookStatus::Handled);
        status
    }
}
