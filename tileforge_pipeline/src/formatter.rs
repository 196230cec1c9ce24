//! The CPU Formatter stage: rather than a pool of OS processes, this is a
//! bounded pool of blocking OS threads driven through
//! `tokio::task::spawn_blocking`, gated by a `tokio::sync::Semaphore` sized
//! to `ConcurrencyLimits::cpu_bound`, feeding the same bounded
//! `tokio::sync::mpsc` channels used between every other stage.

use anyhow::Result;
use std::sync::Arc;
use tileforge_core::{FeatureBundle, FormattedArtifact, PipelineStats};
use tokio::sync::{mpsc, Semaphore};

/// One output format. `encode` is synchronous and potentially CPU-heavy; it
/// always runs inside `spawn_blocking`. The vector-tile binary encoder
/// itself is a collaborator; this trait only names the seam.
pub trait Format: Send + Sync {
	fn name(&self) -> &str;
	fn file_extension(&self) -> &str;
	fn mime(&self) -> &str;
	/// `extents` defaults to 4096 for the vector-tile encoder.
	fn encode(&self, bundle: &FeatureBundle, extents: u32) -> Result<Vec<u8>>;
}

#[derive(Default)]
pub struct FormatRegistry {
	formats: Vec<Arc<dyn Format>>,
}

impl FormatRegistry {
	pub fn new() -> FormatRegistry {
		FormatRegistry::default()
	}

	pub fn register(&mut self, format: Arc<dyn Format>) {
		self.formats.push(format);
	}

	pub fn get(&self, name: &str) -> Option<Arc<dyn Format>> {
		self.formats.iter().find(|f| f.name() == name).cloned()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Format>> {
		self.formats.iter()
	}
}

pub const DEFAULT_EXTENTS: u32 = 4096;

/// Consumes feature bundles, encodes each into every requested format, and
/// forwards one `FormattedArtifact` per `(coord, format)`. Terminates when
/// `input` closes (the channel-close-as-sentinel convention used throughout
/// this pipeline — see `supervisor` module docs), after draining whatever
/// was already buffered, then drops `output` to propagate the close
/// downstream.
pub struct CpuFormatter {
	registry: Arc<FormatRegistry>,
	concurrency: Arc<Semaphore>,
	stats: Arc<PipelineStats>,
}

impl CpuFormatter {
	pub fn new(registry: Arc<FormatRegistry>, cpu_bound_workers: usize, stats: Arc<PipelineStats>) -> CpuFormatter {
		CpuFormatter {
			registry,
			concurrency: Arc::new(Semaphore::new(cpu_bound_workers.max(1))),
			stats,
		}
	}

	pub async fn run(&self, mut input: mpsc::Receiver<FeatureBundle>, output: mpsc::Sender<FormattedArtifact>) {
		let mut joins = Vec::new();
		while let Some(bundle) = input.recv().await {
			let permit = self.concurrency.clone().acquire_owned().await.expect("semaphore never closed");
			let registry = self.registry.clone();
			let output = output.clone();
			let stats = self.stats.clone();
			joins.push(tokio::task::spawn_blocking(move || {
				let _permit = permit;
				let coord = bundle.coord();
				for format in registry.iter() {
					match format.encode(&bundle, DEFAULT_EXTENTS) {
						Ok(bytes) => {
							if output
								.blocking_send(FormattedArtifact {
									coord,
									format: format.name().to_string(),
									bytes,
								})
								.is_err()
							{
								log::warn!("formatted-artifact channel closed while forwarding {coord:?}/{}", format.name());
							}
						}
						Err(e) => {
							stats.incr_errors_process();
							log::error!("errors.process: encoding {coord:?} as {} failed: {e:#}", format.name());
						}
					}
				}
			}));
		}
		for join in joins {
			let _ = join.await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tileforge_core::Coord;

	struct UppercaseFormat;
	impl Format for UppercaseFormat {
		fn name(&self) -> &str {
			"upper"
		}
		fn file_extension(&self) -> &str {
			"upper"
		}
		fn mime(&self) -> &str {
			"application/octet-stream"
		}
		fn encode(&self, bundle: &FeatureBundle, _extents: u32) -> Result<Vec<u8>> {
			Ok(format!("{:?}", bundle.coord()).to_uppercase().into_bytes())
		}
	}

	struct FailingFormat;
	impl Format for FailingFormat {
		fn name(&self) -> &str {
			"broken"
		}
		fn file_extension(&self) -> &str {
			"bin"
		}
		fn mime(&self) -> &str {
			"application/octet-stream"
		}
		fn encode(&self, _bundle: &FeatureBundle, _extents: u32) -> Result<Vec<u8>> {
			anyhow::bail!("simulated encoder failure")
		}
	}

	#[tokio::test]
	async fn encodes_one_artifact_per_format_and_skips_failures() {
		let mut registry = FormatRegistry::new();
		registry.register(Arc::new(UppercaseFormat));
		registry.register(Arc::new(FailingFormat));
		let stats = Arc::new(PipelineStats::default());
		let formatter = CpuFormatter::new(Arc::new(registry), 2, stats.clone());

		let (tx_in, rx_in) = mpsc::channel(8);
		let (tx_out, mut rx_out) = mpsc::channel(8);

		let coord = Coord::new(5, 1, 1).unwrap();
		tx_in.send(FeatureBundle::new(coord)).await.unwrap();
		drop(tx_in);

		formatter.run(rx_in, tx_out).await;

		let artifact = rx_out.recv().await.unwrap();
		assert_eq!(artifact.format, "upper");
		assert_eq!(artifact.coord, coord);
		assert!(rx_out.recv().await.is_none());
		assert_eq!(stats.snapshot().errors_process, 1);
	}
}
