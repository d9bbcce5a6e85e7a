//! Publication of world snapshots.
//!
//! The engine only sees [`StatePublisher`]; what happens to a snapshot after
//! that (channels, logs, nothing) is up to the implementation.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::snapshot::WorldStateSnapshot;

pub trait StatePublisher: Send + Sync {
    fn publish(&self, snapshot: &WorldStateSnapshot);
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

impl StatePublisher for NullPublisher {
    fn publish(&self, _snapshot: &WorldStateSnapshot) {}
}

/// Logs a one-line summary of each snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

impl StatePublisher for LogPublisher {
    fn publish(&self, snapshot: &WorldStateSnapshot) {
        info!(
            tick = snapshot.tick,
            plots = snapshot.plots.len(),
            plants = snapshot.plant_count(),
            insects = snapshot.insect_count(),
            "garden state"
        );
    }
}

/// Broadcasts snapshots on a named topic to any number of subscribers.
///
/// Subscribers whose receiver has been dropped are forgotten on the next
/// publication.
pub struct ChannelPublisher {
    topic: String,
    subscribers: Mutex<Vec<Sender<Arc<WorldStateSnapshot>>>>,
}

impl ChannelPublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn subscribe(&self) -> Receiver<Arc<WorldStateSnapshot>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl StatePublisher for ChannelPublisher {
    fn publish(&self, snapshot: &WorldStateSnapshot) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        if subscribers.is_empty() {
            return;
        }
        let shared = Arc::new(snapshot.clone());
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(Arc::clone(&shared)).is_ok());
        if subscribers.len() < before {
            debug!(
                topic = %self.topic,
                dropped = before - subscribers.len(),
                "removed disconnected subscribers"
            );
        }
    }
}

/// Forwards each snapshot to several publishers in order.
#[derive(Default)]
pub struct FanoutPublisher {
    targets: Vec<Arc<dyn StatePublisher>>,
}

impl FanoutPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: Arc<dyn StatePublisher>) -> Self {
        self.targets.push(target);
        self
    }
}

impl StatePublisher for FanoutPublisher {
    fn publish(&self, snapshot: &WorldStateSnapshot) {
        for target in &self.targets {
            target.publish(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tick: u64) -> WorldStateSnapshot {
        WorldStateSnapshot {
            tick,
            running: false,
            width: 0,
            height: 0,
            plots: Vec::new(),
        }
    }

    #[test]
    fn test_channel_delivers_to_every_subscriber() {
        let publisher = ChannelPublisher::new("potager-updates");
        let first = publisher.subscribe();
        let second = publisher.subscribe();

        publisher.publish(&snapshot(3));
        assert_eq!(first.recv().unwrap().tick, 3);
        assert_eq!(second.recv().unwrap().tick, 3);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let publisher = ChannelPublisher::new("simulation");
        let kept = publisher.subscribe();
        drop(publisher.subscribe());
        assert_eq!(publisher.subscriber_count(), 2);

        publisher.publish(&snapshot(1));
        assert_eq!(publisher.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap().tick, 1);
    }

    #[test]
    fn test_fanout_reaches_both_topics() {
        let updates = Arc::new(ChannelPublisher::new("potager-updates"));
        let simulation = Arc::new(ChannelPublisher::new("simulation"));
        let rx_updates = updates.subscribe();
        let rx_simulation = simulation.subscribe();

        let fanout = FanoutPublisher::new()
            .with(updates.clone())
            .with(simulation.clone())
            .with(Arc::new(NullPublisher));
        fanout.publish(&snapshot(9));

        assert_eq!(rx_updates.try_recv().unwrap().tick, 9);
        assert_eq!(rx_simulation.try_recv().unwrap().tick, 9);
    }
}
