//! A simulated cloud message queue (stand-in for SQS/PubSub), modelling
//! visibility timeouts and at-least-once delivery the way the real thing
//! does: `read()` moves a message into an in-flight set keyed by receipt and
//! makes it invisible until either `done()` removes it or the visibility
//! timeout elapses and it's returned to the ready queue.
//!
//! In-flight coordinate tracking is layered on top via the `Cache`
//! trait so a cloud-queue-backed pipeline can suppress re-enqueuing a tile
//! that's already in flight, except during seeding where that dedup is
//! deliberately bypassed.

use crate::backend::{ensure_batch_size, EnqueueOutcome, QueueBackend};
use crate::handle::MessageHandle;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tileforge_core::cache::{Cache, InMemoryCache};

struct InFlight {
	handle: MessageHandle,
	visible_again_at: SystemTime,
}

struct State {
	ready: VecDeque<Vec<u8>>,
	in_flight: Vec<InFlight>,
}

pub struct CloudQueue {
	state: Mutex<State>,
	visibility_timeout: Duration,
	next_receipt: AtomicU64,
	/// Coords currently believed to be in flight, for dedup at enqueue time.
	/// `None` while seeding, when dedup is deliberately suppressed.
	in_flight_coords: Mutex<InMemoryCache<String, ()>>,
	suppress_dedup: bool,
}

impl CloudQueue {
	pub fn new(visibility_timeout: Duration) -> CloudQueue {
		CloudQueue {
			state: Mutex::new(State {
				ready: VecDeque::new(),
				in_flight: Vec::new(),
			}),
			visibility_timeout,
			next_receipt: AtomicU64::new(1),
			in_flight_coords: Mutex::new(InMemoryCache::default()),
			suppress_dedup: false,
		}
	}

	/// Builds a queue with in-flight dedup suppressed, for seeding runs,
	/// since seeding bypasses the normal in-flight check.
	pub fn new_for_seeding(visibility_timeout: Duration) -> CloudQueue {
		CloudQueue {
			suppress_dedup: true,
			..CloudQueue::new(visibility_timeout)
		}
	}

	/// Moves any in-flight message whose visibility timeout has elapsed back
	/// onto the ready queue. Callers don't call this directly; `read()` does.
	fn requeue_expired(&self, state: &mut State, now: SystemTime) {
		let mut i = 0;
		while i < state.in_flight.len() {
			if state.in_flight[i].visible_again_at <= now {
				let expired = state.in_flight.remove(i);
				state.ready.push_back(expired.handle.payload);
			} else {
				i += 1;
			}
		}
	}

	pub fn n_in_flight(&self) -> usize {
		self.state.lock().unwrap().in_flight.len()
	}
}

#[async_trait]
impl QueueBackend for CloudQueue {
	async fn enqueue(&self, payloads: &[Vec<u8>]) -> Result<EnqueueOutcome> {
		ensure_batch_size(payloads)?;
		let mut state = self.state.lock().unwrap();
		let mut dedup = self.in_flight_coords.lock().unwrap();
		let mut n_queued = 0;
		for payload in payloads {
			let key = String::from_utf8_lossy(payload).into_owned();
			if !self.suppress_dedup && dedup.contains_key(&key) {
				continue;
			}
			state.ready.push_back(payload.clone());
			dedup.insert(&key, vec![()])?;
			n_queued += 1;
		}
		Ok(EnqueueOutcome {
			n_queued,
			n_in_flight: state.in_flight.len(),
		})
	}

	async fn read(&self) -> Result<Option<MessageHandle>> {
		let now = SystemTime::now();
		let mut state = self.state.lock().unwrap();
		self.requeue_expired(&mut state, now);
		let Some(payload) = state.ready.pop_front() else {
			return Ok(None);
		};
		let receipt = self.next_receipt.fetch_add(1, Ordering::SeqCst).to_string();
		let handle = MessageHandle::new(receipt, payload);
		state.in_flight.push(InFlight {
			handle: handle.clone(),
			visible_again_at: now + self.visibility_timeout,
		});
		Ok(Some(handle))
	}

	async fn done(&self, handle: &MessageHandle) -> Result<()> {
		let mut state = self.state.lock().unwrap();
		state.in_flight.retain(|m| m.handle.receipt != handle.receipt);
		let mut dedup = self.in_flight_coords.lock().unwrap();
		let key = String::from_utf8_lossy(&handle.payload).into_owned();
		dedup.remove(&key)?;
		Ok(())
	}

	async fn clear(&self) -> Result<usize> {
		let mut state = self.state.lock().unwrap();
		let n = state.ready.len() + state.in_flight.len();
		state.ready.clear();
		state.in_flight.clear();
		self.in_flight_coords.lock().unwrap().clean_up();
		Ok(n)
	}

	fn supports_in_flight_tracking(&self) -> bool {
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn read_hides_message_until_done() {
		let queue = CloudQueue::new(Duration::from_secs(30));
		queue.enqueue(&[b"3/1/1".to_vec()]).await.unwrap();
		let handle = queue.read().await.unwrap().unwrap();
		assert_eq!(queue.n_in_flight(), 1);
		queue.done(&handle).await.unwrap();
		assert_eq!(queue.n_in_flight(), 0);
	}

	#[tokio::test]
	async fn expired_visibility_requeues() {
		let queue = CloudQueue::new(Duration::from_millis(1));
		queue.enqueue(&[b"3/1/1".to_vec()]).await.unwrap();
		let _handle = queue.read().await.unwrap().unwrap();
		tokio::time::sleep(Duration::from_millis(20)).await;
		let again = queue.read().await.unwrap();
		assert!(again.is_some());
	}

	#[tokio::test]
	async fn dedup_suppresses_duplicate_enqueue() {
		let queue = CloudQueue::new(Duration::from_secs(30));
		queue.enqueue(&[b"3/1/1".to_vec()]).await.unwrap();
		let outcome = queue.enqueue(&[b"3/1/1".to_vec()]).await.unwrap();
		assert_eq!(outcome.n_queued, 0);
	}

	#[tokio::test]
	async fn seeding_queue_bypasses_dedup() {
		let queue = CloudQueue::new_for_seeding(Duration::from_secs(30));
		queue.enqueue(&[b"3/1/1".to_vec()]).await.unwrap();
		let outcome = queue.enqueue(&[b"3/1/1".to_vec()]).await.unwrap();
		assert_eq!(outcome.n_queued, 1);
	}
}
