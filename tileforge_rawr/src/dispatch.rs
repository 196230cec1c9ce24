//! The RAWR dispatcher: partitions a stream of coords by their ancestor
//! at `group_by_zoom`, marshals each bucket into one payload, and sends
//! payloads to the RAWR queue in batches of at most 10.

use crate::payload::marshal;
use anyhow::Result;
use std::collections::HashMap;
use tileforge_core::Coord;
use tileforge_queue::{EnqueueOutcome, QueueBackend, MAX_BATCH_SIZE};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchMetrics {
	pub n_coords: usize,
	pub n_payloads: usize,
	pub n_enqueue_calls: usize,
}

/// Groups `coords` by `ancestor(coord, group_by_zoom)`, marshals one payload
/// per group, and sends them to `rawr_queue` in batches of ≤10.
pub async fn dispatch(rawr_queue: &dyn QueueBackend, group_by_zoom: u8, coords: impl IntoIterator<Item = Coord>) -> Result<DispatchMetrics> {
	let mut grouped: HashMap<Coord, Vec<Coord>> = HashMap::new();
	let mut n_coords = 0;
	for coord in coords {
		let parent = coord.ancestor(group_by_zoom);
		grouped.entry(parent).or_default().push(coord);
		n_coords += 1;
	}

	let payloads: Vec<Vec<u8>> = grouped.values().map(|group| marshal(group).into_bytes()).collect();
	let n_payloads = payloads.len();

	let mut n_enqueue_calls = 0;
	for chunk in payloads.chunks(MAX_BATCH_SIZE) {
		let EnqueueOutcome { .. } = rawr_queue.enqueue(chunk).await?;
		n_enqueue_calls += 1;
	}

	log::info!("rawr dispatch: coords({n_coords}) payloads({n_payloads}) enqueue-calls({n_enqueue_calls})");
	Ok(DispatchMetrics {
		n_coords,
		n_payloads,
		n_enqueue_calls,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::payload::unmarshal;
	use tileforge_queue::InMemoryQueue;

	#[tokio::test]
	async fn groups_by_ancestor_zoom() {
		let queue = InMemoryQueue::new();
		let coords = vec![
			Coord::new(10, 4, 4).unwrap(),
			Coord::new(10, 5, 5).unwrap(), // same parent as above at zoom 9
			Coord::new(10, 0, 0).unwrap(), // different parent
		];
		let metrics = dispatch(&queue, 9, coords).await.unwrap();
		assert_eq!(metrics.n_coords, 3);
		assert_eq!(metrics.n_payloads, 2);
		assert_eq!(metrics.n_enqueue_calls, 1);

		let mut seen = Vec::new();
		while let Some(handle) = queue.read().await.unwrap() {
			seen.extend(unmarshal(std::str::from_utf8(&handle.payload).unwrap()).unwrap());
		}
		assert_eq!(seen.len(), 3);
	}

	#[tokio::test]
	async fn batches_payloads_at_ten() {
		let queue = InMemoryQueue::new();
		// 25 distinct ancestor groups at zoom 10 -> 25 payloads -> 3 batches.
		let coords = (0..25).map(|i| Coord::new(10, i, 0).unwrap());
		let metrics = dispatch(&queue, 10, coords).await.unwrap();
		assert_eq!(metrics.n_payloads, 25);
		assert_eq!(metrics.n_enqueue_calls, 3);
	}
}
