//! The pipeline lifecycle state machine and supervisor.
//!
//! **Sentinel convention**: "no more work" is modeled by closing a
//! `tokio::sync::mpsc` channel rather than threading an explicit sentinel
//! value through each queue, since a channel with no live senders makes
//! every pending and future `recv()` return `None` exactly once all
//! buffered items are drained — drain fully, then observe end-of-input. Each
//! stage's `run` loop is `while let Some(item) = rx.recv().await { .. }` and
//! it drops its own sender(s) when that loop ends, propagating closure
//! downstream in topological order without a supervisor having to inject
//! per-worker sentinel counts by hand.
//!
//! The supervisor owns every stage's `JoinHandle` and the Queue Reader's
//! stop flag, and joins stages in the same source-to-sink order they were
//! started.

use crate::ack::{AckWriter, StoredNotification};
use crate::blob::{self, BlobStore};
use crate::fetcher::DataFetcher;
use crate::formatter::CpuFormatter;
use crate::reader::QueueReader;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tileforge_core::{FeatureBundle, FormattedArtifact, LayerDescriptor, PipelineStats};
use tileforge_queue::{MessageHandle, QueueBackend};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
	Init,
	Running,
	Draining,
	Stopped,
}

/// Bounded sizes for the channels connecting each pipeline stage.
pub struct QueueSizes {
	pub input: usize,
	pub fetched: usize,
	pub formatted: usize,
	pub stored: usize,
}

impl Default for QueueSizes {
	fn default() -> Self {
		QueueSizes {
			input: 10,
			fetched: 256,
			formatted: 256,
			stored: 256,
		}
	}
}

/// Configuration for one `Supervisor::run` pass, gathered so the call site
/// doesn't need a dozen positional arguments.
pub struct PipelineConfig {
	pub queue: Arc<dyn QueueBackend>,
	pub blob_store: Arc<dyn BlobStore>,
	pub fetcher: Arc<DataFetcher>,
	pub formatter: Arc<CpuFormatter>,
	pub layers: Arc<Vec<LayerDescriptor>>,
	pub output_formats: Arc<Vec<String>>,
	pub blob_prefix: String,
	pub reduced_redundancy: bool,
	pub sizes: QueueSizes,
	pub stats: Arc<PipelineStats>,
}

/// A coord paired with the message handle that produced it, carried
/// alongside the `FeatureBundle`/`FormattedArtifact` payloads so the Ack
/// Writer can be reached without a module-level lookup table — this map is
/// an explicit, per-run field, not a static.
type HandleMap = Arc<Mutex<HashMap<u64, MessageHandle>>>;

pub struct Supervisor;

impl Supervisor {
	/// Runs one full pipeline pass: starts every stage, waits for either the
	/// queue reader to naturally exhaust its input or a shutdown signal, then
	/// drains and joins every stage in order.
	pub async fn run(config: PipelineConfig, shutdown: Arc<AtomicBool>) -> Result<PipelineState> {
		let PipelineConfig {
			queue,
			blob_store,
			fetcher,
			formatter,
			layers,
			output_formats,
			blob_prefix,
			reduced_redundancy,
			sizes,
			stats,
		} = config;

		let handles: HandleMap = Arc::new(Mutex::new(HashMap::new()));

		let reader = Arc::new(QueueReader::new(queue.clone()));
		let stop_flag = reader.stop_flag();

		let (tx_input, mut rx_input) = mpsc::channel(sizes.input);
		let (tx_fetched, rx_fetched) = mpsc::channel::<FeatureBundle>(sizes.fetched);
		let (tx_formatted, mut rx_formatted) = mpsc::channel::<FormattedArtifact>(sizes.formatted);
		let (tx_stored, rx_stored) = mpsc::channel::<StoredNotification>(sizes.stored);

		let reader_task: JoinHandle<Result<()>> = {
			let reader = reader.clone();
			tokio::spawn(async move { reader.run(tx_input).await })
		};

		let fetch_task: JoinHandle<()> = {
			let fetcher = fetcher.clone();
			let layers = layers.clone();
			let handles = handles.clone();
			let stats = stats.clone();
			tokio::spawn(async move {
				while let Some((coord, handle)) = rx_input.recv().await {
					match fetcher.fetch(coord, &layers).await {
						Ok(bundle) => {
							handles.lock().unwrap().insert(coord.as_packed(), handle);
							if tx_fetched.send(bundle).await.is_err() {
								break;
							}
						}
						Err(e) => {
							stats.incr_errors_fetch();
							log::error!("errors.fetch: {coord:?}: {e:#}");
						}
					}
				}
			})
		};

		let format_task: JoinHandle<()> = {
			let formatter = formatter.clone();
			tokio::spawn(async move {
				formatter.run(rx_fetched, tx_formatted).await;
			})
		};

		let n_formats = output_formats.len().max(1);
		let ack_writer = Arc::new(AckWriter::new(queue.clone(), n_formats, stats.clone()));

		let sink_task: JoinHandle<()> = {
			let blob_store = blob_store.clone();
			let handles = handles.clone();
			let tx_stored = tx_stored.clone();
			let blob_prefix = blob_prefix.clone();
			let stats = stats.clone();
			tokio::spawn(async move {
				while let Some(artifact) = rx_formatted.recv().await {
					let key = blob::tile_key(&blob_prefix, &artifact.format, &artifact.format, artifact.coord);
					match blob::put_with_retry(blob_store.as_ref(), &key, &artifact.bytes, reduced_redundancy).await {
						Ok(()) => {
							stats.incr_stored();
							let handle = handles.lock().unwrap().get(&artifact.coord.as_packed()).cloned();
							if let Some(handle) = handle {
								if tx_stored.send(StoredNotification { handle }).await.is_err() {
									break;
								}
							}
						}
						Err(e) => {
							stats.incr_skipped();
							log::error!("store failure for {key}: {e:#}");
						}
					}
				}
			})
		};
		drop(tx_stored);

		let ack_task: JoinHandle<()> = {
			let ack_writer = ack_writer.clone();
			tokio::spawn(async move {
				ack_writer.run(rx_stored).await;
			})
		};

		// running: wait for either natural end-of-input or a shutdown signal.
		tokio::select! {
			res = reader_task => {
				res??;
			}
			_ = wait_for_shutdown(&shutdown) => {
				stop_flag.store(true, Ordering::SeqCst);
			}
		}

		// draining: each stage continues until its upstream closes.
		fetch_task.await.ok();
		format_task.await.ok();
		sink_task.await.ok();
		ack_task.await.ok();

		Ok(PipelineState::Stopped)
	}
}

async fn wait_for_shutdown(shutdown: &Arc<AtomicBool>) {
	loop {
		if shutdown.load(Ordering::SeqCst) {
			return;
		}
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
	}
}

/// Installs a handler that flips `shutdown` on SIGTERM/SIGINT/SIGQUIT,
/// triggering the running-to-draining transition.
#[cfg(unix)]
pub async fn install_shutdown_signal_handler(shutdown: Arc<AtomicBool>) -> Result<()> {
	use tokio::signal::unix::{signal, SignalKind};
	let mut term = signal(SignalKind::terminate())?;
	let mut int = signal(SignalKind::interrupt())?;
	let mut quit = signal(SignalKind::quit())?;
	tokio::select! {
		_ = term.recv() => log::info!("received SIGTERM"),
		_ = int.recv() => log::info!("received SIGINT"),
		_ = quit.recv() => log::info!("received SIGQUIT"),
	}
	shutdown.store(true, Ordering::SeqCst);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pipeline_state_has_four_lifecycle_stages() {
		let states = [PipelineState::Init, PipelineState::Running, PipelineState::Draining, PipelineState::Stopped];
		assert_eq!(states.len(), 4);
	}
}
