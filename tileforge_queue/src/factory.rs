//! Builds a boxed [`QueueBackend`] from the parsed config, matching the
//! `kind` tag to one of the five back-ends.

use crate::backend::QueueBackend;
use crate::cache_backed::CacheBackedQueue;
use crate::cloud::CloudQueue;
use crate::file::FileQueue;
use crate::memory::InMemoryQueue;
use crate::stdout::StdoutQueue;
use anyhow::{Context, Result};
use std::time::Duration;
use tileforge_core::cache::InMemoryCache;
use tileforge_core::config::{QueueConfig, QueueKind};

const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(300);

/// Builds the queue named by `config`. `for_seeding` suppresses in-flight
/// dedup on cloud-queue back-ends; it has no effect on the others.
pub fn build(config: &QueueConfig, for_seeding: bool) -> Result<Box<dyn QueueBackend>> {
	Ok(match config.kind {
		QueueKind::InMemory => Box::new(InMemoryQueue::new()),
		QueueKind::Stdout => Box::new(StdoutQueue::new()),
		QueueKind::File => {
			let path = if config.name.is_empty() {
				anyhow::bail!("file queue requires `name` to be a file path");
			} else {
				&config.name
			};
			Box::new(FileQueue::new(path).with_context(|| format!("opening file queue at {path:?}"))?)
		}
		QueueKind::CloudQueue => {
			if for_seeding {
				Box::new(CloudQueue::new_for_seeding(DEFAULT_VISIBILITY_TIMEOUT))
			} else {
				Box::new(CloudQueue::new(DEFAULT_VISIBILITY_TIMEOUT))
			}
		}
		QueueKind::CacheBacked => Box::new(CacheBackedQueue::new(InMemoryCache::<String, Vec<u8>>::default())),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builds_in_memory_by_default() {
		let config = QueueConfig::default();
		let queue = build(&config, false).unwrap();
		assert!(!queue.supports_in_flight_tracking());
	}

	#[test]
	fn file_queue_requires_a_name() {
		let config = QueueConfig {
			kind: QueueKind::File,
			name: String::new(),
		};
		assert!(build(&config, false).is_err());
	}
}
