use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use super::bus::{kernel_bus, KernelBusReceiver, KernelBusSender, KernelMessage};
use super::ports::{AsyncExecutor, BoxFuture};
use crate::kernel::{Effect, Store};

pub struct KernelServiceHost {
    bus: KernelBusSender,
    rx: KernelBusReceiver,
    executor: Arc<dyn AsyncExecutor>,
}

/// Handle given to adapters: spawn work, report back with actions.
#[derive(Clone)]
pub struct KernelServiceContext {
    bus: KernelBusSender,
    executor: Arc<dyn AsyncExecutor>,
}

impl KernelServiceHost {
    pub fn new(executor: Arc<dyn AsyncExecutor>) -> Self {
        let (bus, rx) = kernel_bus();
        Self { bus, rx, executor }
    }

    pub fn context(&self) -> KernelServiceContext {
        KernelServiceContext {
            bus: self.bus.clone(),
            executor: Arc::clone(&self.executor),
        }
    }

    pub fn try_recv(&mut self) -> Result<KernelMessage, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<KernelMessage, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Dispatches every queued action into `store`, returning the effects
    /// they produced and whether any state changed.
    pub fn drain_into(&mut self, store: &mut Store) -> (bool, Vec<Effect>) {
        let mut changed = false;
        let mut effects = Vec::new();
        while let Ok(KernelMessage::Action(action)) = self.rx.try_recv() {
            let result = store.dispatch(action);
            changed |= result.state_changed;
            effects.extend(result.effects);
        }
        (changed, effects)
    }
}

impl KernelServiceContext {
    pub fn dispatch(&self, action: crate::kernel::Action) {
        if self.bus.send_action(action).is_err() {
            tracing::debug!("kernel bus closed, dropping action");
        }
    }

    pub fn spawn(&self, task: BoxFuture) {
        self.executor.spawn(task);
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/services/host.rs"]
mod tests;
