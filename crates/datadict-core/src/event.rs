//! Event bus for datadict using tokio::broadcast
//!
//! Provides a publish-subscribe mechanism for metadata load updates.

use crate::models::{ExploreId, Progress};
use tokio::sync::broadcast;

/// Events emitted by the loaders
#[derive(Debug, Clone, PartialEq)]
pub enum DataEvent {
    /// Model list fetched from the API
    ModelsLoaded { count: usize },
    /// `ExploreLoader` resolved an explore
    ExploreLoaded(ExploreId),
    /// `ExploreLoader` failed to resolve an explore
    ExploreFailed { id: ExploreId, error: String },
    /// Batch index state changed
    IndexProgress(Progress),
    /// Batch index finished its worklist
    IndexCompleted { loaded: usize, failed: usize },
    /// Cache was cleared
    CacheCleared,
}

/// Event bus for broadcasting data events
///
/// Uses tokio::broadcast for multi-consumer support. Slow subscribers
/// lag and lose the oldest events rather than blocking publishers.
pub struct EventBus {
    sender: broadcast::Sender<DataEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: DataEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
