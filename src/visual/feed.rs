use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::debug;

use crate::audio::AnalysisSnapshot;

/// Fans rendered snapshots out to external consumers
///
/// Slow subscribers miss frames instead of stalling the render loop;
/// dropped receivers are pruned on the next publish.
#[derive(Debug, Default)]
pub struct SnapshotFeed {
    subscribers: Vec<Sender<AnalysisSnapshot>>,
}

impl SnapshotFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// New subscriber buffering at most `capacity` snapshots
    pub fn subscribe(&mut self, capacity: usize) -> Receiver<AnalysisSnapshot> {
        let (tx, rx) = bounded(capacity.max(1));
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, snapshot: &AnalysisSnapshot) {
        if self.subscribers.is_empty() {
            return;
        }
        self.subscribers.retain(|tx| match tx.try_send(snapshot.clone()) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => {
                debug!("snapshot subscriber dropped");
                false
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
