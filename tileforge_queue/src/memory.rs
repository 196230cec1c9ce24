//! An in-process queue back-end for tests and local runs: a
//! mutex-guarded `VecDeque` with no persistence or visibility timeout.

use crate::backend::{ensure_batch_size, EnqueueOutcome, QueueBackend};
use crate::handle::MessageHandle;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct InMemoryQueue {
	messages: Mutex<VecDeque<Vec<u8>>>,
	next_receipt: AtomicU64,
}

impl InMemoryQueue {
	pub fn new() -> InMemoryQueue {
		InMemoryQueue::default()
	}

	pub fn len(&self) -> usize {
		self.messages.lock().unwrap().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[async_trait]
impl QueueBackend for InMemoryQueue {
	async fn enqueue(&self, payloads: &[Vec<u8>]) -> Result<EnqueueOutcome> {
		ensure_batch_size(payloads)?;
		let mut messages = self.messages.lock().unwrap();
		messages.extend(payloads.iter().cloned());
		Ok(EnqueueOutcome {
			n_queued: payloads.len(),
			n_in_flight: 0,
		})
	}

	async fn read(&self) -> Result<Option<MessageHandle>> {
		let payload = self.messages.lock().unwrap().pop_front();
		Ok(payload.map(|payload| {
			let receipt = self.next_receipt.fetch_add(1, Ordering::SeqCst).to_string();
			MessageHandle::new(receipt, payload)
		}))
	}

	async fn done(&self, _handle: &MessageHandle) -> Result<()> {
		Ok(())
	}

	async fn clear(&self) -> Result<usize> {
		let mut messages = self.messages.lock().unwrap();
		let n = messages.len();
		messages.clear();
		Ok(n)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn enqueue_then_read_is_fifo() {
		let queue = InMemoryQueue::new();
		queue.enqueue(&[b"a".to_vec(), b"b".to_vec()]).await.unwrap();
		assert_eq!(queue.read().await.unwrap().unwrap().payload, b"a");
		assert_eq!(queue.read().await.unwrap().unwrap().payload, b"b");
		assert!(queue.read().await.unwrap().is_none());
	}

	#[tokio::test]
	async fn enqueue_rejects_oversized_batch() {
		let queue = InMemoryQueue::new();
		let payloads: Vec<Vec<u8>> = (0..11).map(|i| vec![i]).collect();
		assert!(queue.enqueue(&payloads).await.is_err());
	}

	#[tokio::test]
	async fn clear_drains_and_counts() {
		let queue = InMemoryQueue::new();
		queue.enqueue(&[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]).await.unwrap();
		assert_eq!(queue.clear().await.unwrap(), 3);
		assert!(queue.is_empty());
	}
}
