//! Concurrency sizing for the shared I/O pool and the CPU
//! formatter pool.

use num_cpus;

/// Resource sizing for one pipeline run, computed from the configured
/// fan-out and the host's CPU count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
	/// Shared I/O pool size for the fetcher's query tasks plus the sink's
	/// uploads: `min(L * n_simultaneous_query_sets + F * n_simultaneous_s3_storage, 50)`.
	pub io_pool: usize,
	/// CPU formatter worker count: one per logical CPU.
	pub cpu_bound: usize,
}

impl ConcurrencyLimits {
	/// `n_layers` is `L`, `n_formats` is `F` in the formula.
	pub fn new(n_layers: usize, n_simultaneous_query_sets: usize, n_formats: usize, n_simultaneous_s3_storage: usize) -> ConcurrencyLimits {
		let io_pool = (n_layers * n_simultaneous_query_sets + n_formats * n_simultaneous_s3_storage).clamp(1, 50);
		ConcurrencyLimits {
			io_pool,
			cpu_bound: num_cpus::get().max(1),
		}
	}

	pub fn cpu_count() -> usize {
		num_cpus::get()
	}

	/// Default `n_simultaneous_s3_storage`: `max(ncpu/2, 1)`.
	pub fn default_s3_storage_concurrency() -> usize {
		(num_cpus::get() / 2).max(1)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn io_pool_is_capped_at_50() {
		let limits = ConcurrencyLimits::new(20, 10, 20, 10);
		assert_eq!(limits.io_pool, 50);
	}

	#[test]
	fn io_pool_uses_formula_below_cap() {
		let limits = ConcurrencyLimits::new(3, 2, 2, 1);
		assert_eq!(limits.io_pool, 3 * 2 + 2 * 1);
	}

	#[test]
	fn io_pool_is_at_least_one() {
		let limits = ConcurrencyLimits::new(0, 0, 0, 0);
		assert_eq!(limits.io_pool, 1);
	}

	#[test]
	fn default_s3_storage_concurrency_is_at_least_one() {
		assert!(ConcurrencyLimits::default_s3_storage_concurrency() >= 1);
	}
}
