//! Change notification for presentation layers.
//!
//! A watcher receives one [`RegistryEvent`] per successful mutation, after the
//! mutation is fully applied. Failed mutations publish nothing.

use std::collections::BTreeSet;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use serde::{Deserialize, Serialize};

use super::EntityId;

/// What changed in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    Added { id: EntityId },
    Replaced { id: EntityId },
    Removed { id: EntityId, former_partners: BTreeSet<EntityId> },
    Paired { first: EntityId, second: EntityId },
    Unpaired { first: EntityId, second: EntityId },
    /// Everything was replaced; previously seen ids are meaningless.
    Reset { count: usize },
}

/// Receiving end of a registry subscription.
///
/// Dropping the watch unsubscribes; the registry prunes the sender on its
/// next publish.
#[derive(Debug)]
pub struct RegistryWatch {
    rx: Receiver<RegistryEvent>,
}

impl RegistryWatch {
    /// Next pending event, without blocking.
    #[must_use]
    pub fn try_next(&self) -> Option<RegistryEvent> {
        self.rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event.
    #[must_use]
    pub fn next_timeout(&self, timeout: Duration) -> Option<RegistryEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// All pending events, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<RegistryEvent> {
        self.rx.try_iter().collect()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Publisher {
    senders: Vec<Sender<RegistryEvent>>,
}

impl Publisher {
    pub(crate) fn subscribe(&mut self, capacity: usize) -> RegistryWatch {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        self.senders.push(tx);
        RegistryWatch { rx }
    }

    pub(crate) fn publish(&mut self, event: &RegistryEvent) {
        self.senders.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(?dropped, "registry watcher is full; event dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    #[cfg(test)]
    pub(crate) fn watcher_count(&self) -> usize {
        self.senders.len()
    }
}
