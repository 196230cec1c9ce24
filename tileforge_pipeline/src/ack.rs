//! The Ack Writer stage: consumes stored-notifications and calls
//! `queue.done(handle)` only once every one of a handle's formats has been
//! durably stored. Refcount bookkeeping is a mutex-guarded map, per-handle
//! format refcounts guarded by a mutex in the Ack Writer.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tileforge_core::PipelineStats;
use tileforge_queue::{MessageHandle, QueueBackend};
use tokio::sync::{mpsc, Mutex};

/// One artifact durably stored for `handle`; the Ack Writer decrements
/// `handle`'s refcount and acks once it reaches zero.
pub struct StoredNotification {
	pub handle: MessageHandle,
}

struct Refcounts {
	counts: HashMap<String, usize>,
}

/// Consumes `StoredNotification`s and acks a handle once `initial_refcount`
/// (the number of configured output formats) notifications for it have
/// arrived. Terminates when `input` closes, after draining whatever was
/// already buffered.
pub struct AckWriter {
	queue: Arc<dyn QueueBackend>,
	initial_refcount: usize,
	refcounts: Mutex<Refcounts>,
	stats: Arc<PipelineStats>,
}

impl AckWriter {
	pub fn new(queue: Arc<dyn QueueBackend>, initial_refcount: usize, stats: Arc<PipelineStats>) -> AckWriter {
		AckWriter {
			queue,
			initial_refcount: initial_refcount.max(1),
			refcounts: Mutex::new(Refcounts { counts: HashMap::new() }),
			stats,
		}
	}

	pub async fn run(&self, mut input: mpsc::Receiver<StoredNotification>) {
		while let Some(notification) = input.recv().await {
			if let Err(e) = self.handle_one(notification).await {
				log::error!("ack writer failed to process notification: {e:#}");
			}
		}
	}

	async fn handle_one(&self, notification: StoredNotification) -> Result<()> {
		let handle = notification.handle;
		let ready = {
			let mut refcounts = self.refcounts.lock().await;
			let count = refcounts.counts.entry(handle.receipt.clone()).or_insert(self.initial_refcount);
			*count = count.saturating_sub(1);
			let ready = *count == 0;
			if ready {
				refcounts.counts.remove(&handle.receipt);
			}
			ready
		};
		if ready {
			self.queue.done(&handle).await?;
			self.stats.incr_acked();
			log::trace!("acked handle {}", handle.receipt);
		}
		Ok(())
	}

	/// Number of handles with at least one outstanding format. Used by tests
	/// and the shutdown path to assert full drain.
	pub async fn n_pending(&self) -> usize {
		self.refcounts.lock().await.counts.len()
	}
}
