// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! In-process domain event bus.
//!
//! Fire-and-forget broadcast: emitters never wait for or learn about
//! subscribers. Events are emitted only after the originating write
//! transaction has committed, so listeners never observe uncommitted state.

use tokio::sync::broadcast;
use tracing::debug;

use crate::storage::StoredProperty;

const EVENT_BUS_CAPACITY: usize = 64;

/// Events published by the orchestrators for downstream listeners.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A property listing was created and committed.
    PropertyCreated(StoredProperty),
}

impl DomainEvent {
    /// Stable event name for logging and routing.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::PropertyCreated(_) => "property.created",
        }
    }
}

/// Cloneable handle to the broadcast channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { tx }
    }

    /// Publish an event. A send with no subscribers is not an error.
    pub fn emit(&self, event: DomainEvent) {
        let name = event.name();
        let delivered = self.tx.send(event).unwrap_or(0);
        debug!(event = name, subscribers = delivered, "domain event emitted");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
