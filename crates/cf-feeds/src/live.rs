//! [`LiveFeed`] — two subscriptions feeding one [`FeedAggregator`].
//!
//! The UI calls [`LiveFeed::drain`] once per frame; headless callers and tests
//! `await` [`LiveFeed::next_update`] or [`LiveFeed::wait_loaded`]. Either way
//! updates are applied one at a time on the caller's thread, so the aggregator
//! never sees two snapshots interleaved.

use crate::{LiveQuery, Subscription};
use cf_core::{FeedAggregator, Identity, ItemType, SourceUpdate};
use tokio::{runtime::Handle, sync::mpsc};

pub struct LiveFeed {
    aggregator: FeedAggregator,
    updates: mpsc::UnboundedReceiver<SourceUpdate>,
    subscriptions: Vec<Subscription>,
}

impl LiveFeed {
    /// Subscribe to both collections of `query` and start aggregating.
    pub fn start(query: &dyn LiveQuery, runtime: &Handle, identity: Option<Identity>) -> Self {
        let (tx, updates) = mpsc::unbounded_channel();
        let subscriptions = ItemType::ALL
            .iter()
            .map(|&kind| Subscription::spawn(runtime, kind, query.subscribe(kind), tx.clone()))
            .collect();
        Self {
            aggregator: FeedAggregator::new(identity),
            updates,
            subscriptions,
        }
    }

    /// Apply every update that has already arrived. Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates.try_recv() {
            self.aggregator.apply(update);
            applied += 1;
        }
        applied
    }

    /// Wait for the next update and apply it. Returns `false` once both
    /// subscriptions have ended and nothing more can arrive.
    pub async fn next_update(&mut self) -> bool {
        match self.updates.recv().await {
            Some(update) => {
                self.aggregator.apply(update);
                true
            }
            None => false,
        }
    }

    /// Apply updates until the aggregator stops loading (or the streams end).
    pub async fn wait_loaded(&mut self) {
        while self.aggregator.is_loading() {
            if !self.next_update().await {
                break;
            }
        }
    }

    pub fn aggregator(&self) -> &FeedAggregator {
        &self.aggregator
    }

    pub fn aggregator_mut(&mut self) -> &mut FeedAggregator {
        &mut self.aggregator
    }

    /// Number of subscriptions whose pump is still running.
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.iter().filter(|s| !s.is_finished()).count()
    }
}
