//! The queue back-end contract, duck-typed as a capability set the
//! way the design notes suggest: every back-end implements the same
//! trait, and `stdout` simply fails loudly on the operations it can't
//! support.

use crate::handle::MessageHandle;
use anyhow::{bail, Result};
use async_trait::async_trait;
use tileforge_core::Coord;

pub const MAX_BATCH_SIZE: usize = 10;

/// Result of an `enqueue` call. `n_in_flight` is best-effort — callers
/// must not use it for correctness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnqueueOutcome {
	pub n_queued: usize,
	pub n_in_flight: usize,
}

#[async_trait]
pub trait QueueBackend: Send + Sync {
	/// Enqueues up to `MAX_BATCH_SIZE` payloads. Atomic w.r.t. partial
	/// failure: an error means no payload was marked in flight locally.
	async fn enqueue(&self, payloads: &[Vec<u8>]) -> Result<EnqueueOutcome>;

	/// Returns one message, or `None` if none are currently visible. A
	/// back-end that can only ever return exactly one or none (never block
	/// forever) satisfies this; callers should treat `None` as idle and
	/// retry rather than assert.
	async fn read(&self) -> Result<Option<MessageHandle>>;

	/// Acknowledges a message. Idempotent from the caller's view.
	async fn done(&self, handle: &MessageHandle) -> Result<()>;

	/// Drains every currently visible message, returning the count removed.
	async fn clear(&self) -> Result<usize>;

	fn supports_in_flight_tracking(&self) -> bool {
		false
	}
}

/// Serializes a coord the way the expired-tiles wire format does: `z/x/y`.
pub fn coord_payload(coord: Coord) -> Vec<u8> {
	coord.as_zxy_string().into_bytes()
}

pub fn parse_coord_payload(bytes: &[u8]) -> Result<Coord> {
	let text = std::str::from_utf8(bytes).map_err(|e| anyhow::anyhow!("payload is not utf8: {e}"))?;
	Coord::parse_zxy(text)
}

/// Enqueues `coords` in batches of at most `MAX_BATCH_SIZE`, summing the
/// outcome across calls.
pub async fn enqueue_coords(backend: &dyn QueueBackend, coords: &[Coord]) -> Result<EnqueueOutcome> {
	let mut total = EnqueueOutcome::default();
	for chunk in coords.chunks(MAX_BATCH_SIZE) {
		let payloads: Vec<Vec<u8>> = chunk.iter().map(|c| coord_payload(*c)).collect();
		let outcome = backend.enqueue(&payloads).await?;
		total.n_queued += outcome.n_queued;
		total.n_in_flight += outcome.n_in_flight;
	}
	Ok(total)
}

/// Shared guard every back-end's `enqueue` should call first.
pub fn ensure_batch_size(payloads: &[Vec<u8>]) -> Result<()> {
	if payloads.len() > MAX_BATCH_SIZE {
		bail!("batch of {} exceeds max batch size {MAX_BATCH_SIZE}", payloads.len());
	}
	Ok(())
}
