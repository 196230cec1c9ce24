//! The RAWR consumer: reads one RAWR message, regenerates the raw tile
//! for its common ancestor, intersects the message's coords with the
//! (conditionally refreshed) TOI, and re-dispatches survivors to the main
//! input queue. Per-phase timing is tracked in `ConsumeTimings`; the
//! ETag-conditional TOI refetch is handled by `CachedToiSource`.

use crate::payload::{common_parent, marshal, unmarshal};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tileforge_core::{explode_and_intersect, Coord, Toi};
use tileforge_queue::{MessageHandle, QueueBackend};
use tokio::sync::Mutex;

/// Generates and durably stores the raw-tile data for one ancestor coord.
/// The actual raw-tile renderer and its zip upload are collaborator
/// concerns; this trait only names the seam the RAWR consumer calls
/// through.
#[async_trait]
pub trait RawTileGenerator: Send + Sync {
	async fn generate(&self, tile: Coord) -> Result<()>;
}

/// Result of one conditional TOI fetch attempt.
pub enum ToiFetch {
	NotModified,
	Modified { toi: Toi, etag: String },
}

/// Conditionally fetches the TOI set from wherever it's stored, consulting
/// an ETag the caller remembers between calls. The concrete store (S3, a
/// directory, …) is a collaborator; this trait only names the seam.
#[async_trait]
pub trait ToiSource: Send + Sync {
	async fn get_if_none_match(&self, etag: Option<&str>) -> Result<ToiFetch>;
}

/// Caches the last-fetched TOI set and its ETag so repeated consume passes
/// don't re-download an unchanged set, mirroring `prev_toi`/`etag` on the
/// intersector this wraps.
pub struct CachedToiSource {
	source: Arc<dyn ToiSource>,
	prev_toi: Mutex<Option<(Toi, String)>>,
}

impl CachedToiSource {
	pub fn new(source: Arc<dyn ToiSource>) -> CachedToiSource {
		CachedToiSource {
			source,
			prev_toi: Mutex::new(None),
		}
	}

	/// Returns the current TOI set, fetching only if it's changed since the
	/// last call.
	pub async fn current(&self) -> Result<Toi> {
		let mut cache = self.prev_toi.lock().await;
		let etag = cache.as_ref().map(|(_, e)| e.as_str());
		match self.source.get_if_none_match(etag).await? {
			ToiFetch::NotModified => {
				let (toi, _) = cache.as_ref().context("received NotModified with no cached TOI")?;
				Ok(toi.clone())
			}
			ToiFetch::Modified { toi, etag } => {
				*cache = Some((toi.clone(), etag));
				Ok(toi)
			}
		}
	}
}

/// Wall-clock time of each consume phase (queue read, raw-tile
/// generation, TOI intersection, queue write, queue ack), in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConsumeTimings {
	pub queue_read_ms: f64,
	pub rawr_gen_ms: f64,
	pub toi_intersect_ms: f64,
	pub queue_write_ms: f64,
	pub queue_done_ms: f64,
}

pub struct RawrConsumer {
	rawr_queue: Arc<dyn QueueBackend>,
	main_queue: Arc<dyn QueueBackend>,
	group_by_zoom: u8,
	generator: Arc<dyn RawTileGenerator>,
	toi: Arc<CachedToiSource>,
}

impl RawrConsumer {
	/// `generator` is responsible for both producing and durably storing the
	/// raw tile's formatted data; this consumer only sequences the call and
	/// times it.
	pub fn new(rawr_queue: Arc<dyn QueueBackend>, main_queue: Arc<dyn QueueBackend>, group_by_zoom: u8, generator: Arc<dyn RawTileGenerator>, toi: Arc<CachedToiSource>) -> RawrConsumer {
		RawrConsumer {
			rawr_queue,
			main_queue,
			group_by_zoom,
			generator,
			toi,
		}
	}

	/// Processes exactly one RAWR message. Returns `Ok(None)` on an idle
	/// read (0 messages is normal idle, not an error),
	/// `Ok(Some(timings))` after a full consume pass.
	pub async fn consume_once(&self) -> Result<Option<ConsumeTimings>> {
		let mut timings = ConsumeTimings::default();

		let read_start = Instant::now();
		let Some(handle) = self.rawr_queue.read().await? else {
			return Ok(None);
		};
		timings.queue_read_ms = elapsed_ms(read_start);

		if let Err(e) = self.process_message(&handle, &mut timings).await {
			// : invalid RAWR payloads fail fast (programming bug); other
			// failures are logged and the message is left unacked for
			// redelivery.
			log::error!("rawr consume failed for handle {}: {e:#}", handle.receipt);
			return Err(e);
		}

		Ok(Some(timings))
	}

	async fn process_message(&self, handle: &MessageHandle, timings: &mut ConsumeTimings) -> Result<()> {
		let payload = std::str::from_utf8(&handle.payload).context("rawr payload is not utf8")?;
		let coords = unmarshal(payload).context("unmarshalling rawr payload")?;
		let parent = common_parent(&coords, self.group_by_zoom).context("rawr payload coords must share one ancestor")?;

		let gen_start = Instant::now();
		self.generator.generate(parent).await.context("generating raw tile")?;
		timings.rawr_gen_ms = elapsed_ms(gen_start);

		let intersect_start = Instant::now();
		let toi = self.toi.current().await.context("fetching tiles of interest")?;
		let (survivors, _metrics) = explode_and_intersect(coords.iter().copied(), &toi, 0);
		timings.toi_intersect_ms = elapsed_ms(intersect_start);

		let write_start = Instant::now();
		if !survivors.is_empty() {
			let payloads: Vec<Vec<u8>> = survivors
				.chunks(tileforge_queue::MAX_BATCH_SIZE)
				.flat_map(|chunk| chunk.iter().map(|c| tileforge_queue::coord_payload(*c)))
				.collect();
			for chunk in payloads.chunks(tileforge_queue::MAX_BATCH_SIZE) {
				self.main_queue.enqueue(chunk).await.context("enqueueing toi-surviving coords")?;
			}
		}
		timings.queue_write_ms = elapsed_ms(write_start);

		let done_start = Instant::now();
		self.rawr_queue.done(handle).await.context("acking rawr message")?;
		timings.queue_done_ms = elapsed_ms(done_start);

		log::info!(
			"rawr message processed: tile({parent:?}) n-coords({}) payload({})",
			coords.len(),
			marshal(&coords)
		);
		Ok(())
	}
}

fn elapsed_ms(start: Instant) -> f64 {
	start.elapsed().as_secs_f64() * 1000.0
}
