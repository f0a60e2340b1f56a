//! Per-table change notifications
//!
//! The original UI auto-refreshed through framework live queries. Here the
//! contract is explicit: every committed mutation publishes which table
//! changed, and subscribers (the rendering surface, or a test harness)
//! re-query. Readers never hold locks; they simply read again.

use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Which table a committed mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreChange {
    Drinks,
    Events,
    Settings,
}

/// Broadcast bus for table change notifications.
#[derive(Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<StoreChange>,
}

impl ChangeBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to change notifications. Slow subscribers that fall more
    /// than the channel capacity behind see a `Lagged` error and should
    /// simply re-query everything.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }

    /// Publish a change. A send error only means nobody is subscribed.
    pub fn publish(&self, change: StoreChange) {
        if self.tx.send(change).is_err() {
            tracing::trace!("No subscribers for {:?} change", change);
        }
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}
