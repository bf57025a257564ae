/// Typed notifications broadcast when the active cluster context changes
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use super::models::TabId;

/// Reason attached to rescans triggered by a context switch
pub const CONTEXT_SWITCH_REASON: &str = "context-switch";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClusterEvent {
    /// Cluster-scoped views should reset their selection
    #[serde(rename_all = "camelCase")]
    ClusterChanged { cluster: String, tab_id: TabId },

    /// Cluster-scoped data should be fetched again
    #[serde(rename_all = "camelCase")]
    ForceRescan {
        cluster: String,
        tab_id: TabId,
        reason: String,
    },
}

impl ClusterEvent {
    pub fn cluster(&self) -> &str {
        match self {
            Self::ClusterChanged { cluster, .. } | Self::ForceRescan { cluster, .. } => cluster,
        }
    }
}

/// Sink for cluster events
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: ClusterEvent);
}

/// Event as seen by bus subscribers
#[derive(Debug, Clone, Serialize)]
pub struct PublishedEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ClusterEvent,
}

/// In-process publish/subscribe bus
pub struct EventBus {
    sender: broadcast::Sender<PublishedEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: ClusterEvent) {
        let published = PublishedEvent {
            at: Utc::now(),
            event,
        };
        if self.sender.send(published).is_err() {
            debug!("No subscribers for cluster event");
        }
    }
}
