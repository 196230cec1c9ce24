//! Pipeline metrics counters, named after the dotted keys a metrics
//! emitter would report them under (`process.errors.fetch`,
//! `process.storage.stored`, ...). The sink here is a set of atomics a
//! caller can snapshot or wire into whatever metrics emitter they use; the
//! emitter itself is out of scope.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineStats {
	pub errors_fetch: AtomicU64,
	pub errors_process: AtomicU64,
	pub storage_stored: AtomicU64,
	pub storage_skipped: AtomicU64,
	pub acked: AtomicU64,
}

impl PipelineStats {
	pub fn snapshot(&self) -> PipelineStatsSnapshot {
		PipelineStatsSnapshot {
			errors_fetch: self.errors_fetch.load(Ordering::Relaxed),
			errors_process: self.errors_process.load(Ordering::Relaxed),
			storage_stored: self.storage_stored.load(Ordering::Relaxed),
			storage_skipped: self.storage_skipped.load(Ordering::Relaxed),
			acked: self.acked.load(Ordering::Relaxed),
		}
	}

	pub fn incr_errors_fetch(&self) {
		self.errors_fetch.fetch_add(1, Ordering::Relaxed);
	}

	pub fn incr_errors_process(&self) {
		self.errors_process.fetch_add(1, Ordering::Relaxed);
	}

	pub fn incr_stored(&self) {
		self.storage_stored.fetch_add(1, Ordering::Relaxed);
	}

	pub fn incr_skipped(&self) {
		self.storage_skipped.fetch_add(1, Ordering::Relaxed);
	}

	pub fn incr_acked(&self) {
		self.acked.fetch_add(1, Ordering::Relaxed);
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStatsSnapshot {
	pub errors_fetch: u64,
	pub errors_process: u64,
	pub storage_stored: u64,
	pub storage_skipped: u64,
	pub acked: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counters_accumulate() {
		let stats = PipelineStats::default();
		stats.incr_errors_fetch();
		stats.incr_stored();
		stats.incr_stored();
		let snap = stats.snapshot();
		assert_eq!(snap.errors_fetch, 1);
		assert_eq!(snap.storage_stored, 2);
		assert_eq!(snap.storage_skipped, 0);
	}
}
