//! The `stdout` back-end: `enqueue` prints each payload and nothing else
//! works, per spec — it exists only so `process`/`seed` can run against a
//! terminal for inspection rather than a real queue.

use crate::backend::{ensure_batch_size, EnqueueOutcome, QueueBackend};
use crate::handle::MessageHandle;
use anyhow::{bail, Result};
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct StdoutQueue;

impl StdoutQueue {
	pub fn new() -> StdoutQueue {
		StdoutQueue
	}
}

#[async_trait]
impl QueueBackend for StdoutQueue {
	async fn enqueue(&self, payloads: &[Vec<u8>]) -> Result<EnqueueOutcome> {
		ensure_batch_size(payloads)?;
		for payload in payloads {
			println!("{}", String::from_utf8_lossy(payload));
		}
		Ok(EnqueueOutcome {
			n_queued: payloads.len(),
			n_in_flight: 0,
		})
	}

	async fn read(&self) -> Result<Option<MessageHandle>> {
		bail!("the stdout queue does not support read(); it is a write-only sink");
	}

	async fn done(&self, _handle: &MessageHandle) -> Result<()> {
		bail!("the stdout queue does not support done(); it is a write-only sink");
	}

	async fn clear(&self) -> Result<usize> {
		bail!("the stdout queue does not support clear(); it is a write-only sink");
	}
}
