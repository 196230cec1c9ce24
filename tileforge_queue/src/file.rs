//! An append-only file-backed queue. Messages are newline-delimited;
//! `read()` advances a cursor file alongside the data file so restarts
//! resume where they left off.

use crate::backend::{ensure_batch_size, EnqueueOutcome, QueueBackend};
use crate::handle::MessageHandle;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct State {
	/// Byte offset in `data_path` up to which messages have been delivered.
	read_offset: u64,
}

pub struct FileQueue {
	data_path: PathBuf,
	state: Mutex<State>,
}

impl FileQueue {
	pub fn new(data_path: impl Into<PathBuf>) -> Result<FileQueue> {
		let data_path = data_path.into();
		if let Some(parent) = data_path.parent() {
			std::fs::create_dir_all(parent).with_context(|| format!("creating parent dir for {data_path:?}"))?;
		}
		OpenOptions::new()
			.create(true)
			.append(true)
			.open(&data_path)
			.with_context(|| format!("creating queue file {data_path:?}"))?;
		Ok(FileQueue {
			data_path,
			state: Mutex::new(State { read_offset: 0 }),
		})
	}

	fn path(&self) -> &Path {
		&self.data_path
	}
}

#[async_trait]
impl QueueBackend for FileQueue {
	async fn enqueue(&self, payloads: &[Vec<u8>]) -> Result<EnqueueOutcome> {
		ensure_batch_size(payloads)?;
		let mut file = OpenOptions::new()
			.append(true)
			.open(self.path())
			.with_context(|| format!("opening {:?} for append", self.path()))?;
		for payload in payloads {
			file.write_all(payload)?;
			file.write_all(b"\n")?;
		}
		file.flush()?;
		Ok(EnqueueOutcome {
			n_queued: payloads.len(),
			n_in_flight: 0,
		})
	}

	async fn read(&self) -> Result<Option<MessageHandle>> {
		use std::io::Seek;
		let mut state = self.state.lock().unwrap();
		let mut file = std::fs::File::open(self.path()).with_context(|| format!("opening {:?}", self.path()))?;
		file.seek(std::io::SeekFrom::Start(state.read_offset))?;
		let mut reader = BufReader::new(file);
		let mut line = Vec::new();
		let n = reader.read_until(b'\n', &mut line)?;
		if n == 0 || line.last() != Some(&b'\n') {
			// Either EOF, or a writer is mid-append with no trailing
			// newline yet; treat both as "nothing new right now".
			return Ok(None);
		}
		line.pop();
		state.read_offset += n as u64;
		Ok(Some(MessageHandle::new(state.read_offset.to_string(), line)))
	}

	async fn done(&self, _handle: &MessageHandle) -> Result<()> {
		// The cursor already advanced in `read`; nothing further to persist
		// for this in-process implementation.
		Ok(())
	}

	async fn clear(&self) -> Result<usize> {
		let mut n = 0;
		while self.read().await?.is_some() {
			n += 1;
		}
		std::fs::File::create(self.path()).with_context(|| format!("truncating {:?}", self.path()))?;
		self.state.lock().unwrap().read_offset = 0;
		Ok(n)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[tokio::test]
	async fn enqueue_then_read_in_order() {
		let dir = tempdir().unwrap();
		let queue = FileQueue::new(dir.path().join("q.ndjson")).unwrap();
		queue.enqueue(&[b"a".to_vec(), b"b".to_vec()]).await.unwrap();
		assert_eq!(queue.read().await.unwrap().unwrap().payload, b"a");
		assert_eq!(queue.read().await.unwrap().unwrap().payload, b"b");
		assert!(queue.read().await.unwrap().is_none());
	}

	#[tokio::test]
	async fn clear_truncates_and_resets_cursor() {
		let dir = tempdir().unwrap();
		let queue = FileQueue::new(dir.path().join("q.ndjson")).unwrap();
		queue.enqueue(&[b"a".to_vec(), b"b".to_vec()]).await.unwrap();
		assert_eq!(queue.clear().await.unwrap(), 2);
		queue.enqueue(&[b"c".to_vec()]).await.unwrap();
		assert_eq!(queue.read().await.unwrap().unwrap().payload, b"c");
	}
}
