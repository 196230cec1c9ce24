//! A queue back-end implemented entirely atop the `Cache` trait's
//! list-append shape, for deployments that already run a distributed
//! cache and would rather not stand up a separate queue service. Messages
//! for one logical queue live under a single cache key as an append-only
//! list; `read()` pops the front by rewriting the list.

use crate::backend::{ensure_batch_size, EnqueueOutcome, QueueBackend};
use crate::handle::MessageHandle;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tileforge_core::cache::Cache;

fn queue_key() -> String {
	"queue".to_string()
}

pub struct CacheBackedQueue<C> {
	cache: Mutex<C>,
	next_receipt: AtomicU64,
}

impl<C> CacheBackedQueue<C>
where
	C: Cache<String, Vec<u8>>,
{
	pub fn new(cache: C) -> CacheBackedQueue<C> {
		CacheBackedQueue {
			cache: Mutex::new(cache),
			next_receipt: AtomicU64::new(1),
		}
	}
}

#[async_trait]
impl<C> QueueBackend for CacheBackedQueue<C>
where
	C: Cache<String, Vec<u8>> + Send,
{
	async fn enqueue(&self, payloads: &[Vec<u8>]) -> Result<EnqueueOutcome> {
		ensure_batch_size(payloads)?;
		let mut cache = self.cache.lock().unwrap();
		cache.append(&queue_key(), payloads.to_vec())?;
		Ok(EnqueueOutcome {
			n_queued: payloads.len(),
			n_in_flight: 0,
		})
	}

	async fn read(&self) -> Result<Option<MessageHandle>> {
		let mut cache = self.cache.lock().unwrap();
		let Some(mut messages) = cache.get_clone(&queue_key())? else {
			return Ok(None);
		};
		if messages.is_empty() {
			return Ok(None);
		}
		let payload = messages.remove(0);
		cache.insert(&queue_key(), messages)?;
		let receipt = self.next_receipt.fetch_add(1, Ordering::SeqCst).to_string();
		Ok(Some(MessageHandle::new(receipt, payload)))
	}

	async fn done(&self, _handle: &MessageHandle) -> Result<()> {
		Ok(())
	}

	async fn clear(&self) -> Result<usize> {
		let mut cache = self.cache.lock().unwrap();
		let n = cache.get_clone(&queue_key())?.map(|v| v.len()).unwrap_or(0);
		cache.remove(&queue_key())?;
		Ok(n)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tileforge_core::cache::InMemoryCache;

	#[tokio::test]
	async fn enqueue_then_read_preserves_order() {
		let queue = CacheBackedQueue::new(InMemoryCache::<String, Vec<u8>>::default());
		queue.enqueue(&[b"a".to_vec(), b"b".to_vec()]).await.unwrap();
		assert_eq!(queue.read().await.unwrap().unwrap().payload, b"a");
		assert_eq!(queue.read().await.unwrap().unwrap().payload, b"b");
		assert!(queue.read().await.unwrap().is_none());
	}

	#[tokio::test]
	async fn clear_counts_remaining() {
		let queue = CacheBackedQueue::new(InMemoryCache::<String, Vec<u8>>::default());
		queue.enqueue(&[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]).await.unwrap();
		assert_eq!(queue.clear().await.unwrap(), 3);
	}
}
