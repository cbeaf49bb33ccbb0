//! Owned subscription handles.
//!
//! A [`Subscription`] runs one pump task that forwards a collection's
//! [`SnapshotStream`](crate::SnapshotStream) into the aggregator channel.
//! Dropping the handle cancels the task, which drops the stream and with it the
//! underlying watch.

use crate::SnapshotStream;
use cf_core::{ItemType, SourceUpdate};
use futures::StreamExt;
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

pub struct Subscription {
    source: ItemType,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Start pumping `stream` into `tx` on `runtime`.
    pub fn spawn(
        runtime: &Handle,
        source: ItemType,
        stream: SnapshotStream,
        tx: mpsc::UnboundedSender<SourceUpdate>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task = runtime.spawn(pump(source, stream, tx, cancel.clone()));
        tracing::debug!(collection = source.collection(), "subscribed");
        Self { source, cancel, task }
    }

    pub fn source(&self) -> ItemType {
        self.source
    }

    /// True once the pump has stopped (stream ended, receiver gone, or cancelled).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
        tracing::debug!(collection = self.source.collection(), "unsubscribed");
    }
}

async fn pump(
    source: ItemType,
    mut stream: SnapshotStream,
    tx: mpsc::UnboundedSender<SourceUpdate>,
    cancel: CancellationToken,
) {
    loop {
        let update = tokio::select! {
            _ = cancel.cancelled() => break,
            next = stream.next() => match next {
                Some(Ok(items)) => SourceUpdate::snapshot(source, items),
                Some(Err(e)) => SourceUpdate::failed(source, e.to_string()),
                None => {
                    tracing::debug!(collection = source.collection(), "snapshot stream ended");
                    break;
                }
            },
        };
        if tx.send(update).is_err() {
            break;
        }
    }
}
