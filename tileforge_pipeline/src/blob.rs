//! The Blob Sink stage: uploads formatted artifacts under the tile
//! key schema (`tileforge_core::blobkey`). `DirectoryBlobStore` does plain
//! filesystem writes under a root path.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub use tileforge_core::{hash8, rawr_key, tile_key};

const MAX_STORE_RETRIES: u32 = 3;

#[async_trait]
pub trait BlobStore: Send + Sync {
	async fn put(&self, key: &str, bytes: &[u8], reduced_redundancy: bool) -> Result<()>;
	async fn head(&self, key: &str) -> Result<Option<u64>>;
}

/// Local-filesystem blob store, grounded on `DirectoryTilesWriter`'s plain
/// `root.join(key)` + `create_dir_all` + `write` pattern.
pub struct DirectoryBlobStore {
	root: PathBuf,
}

impl DirectoryBlobStore {
	pub fn new(root: impl Into<PathBuf>) -> DirectoryBlobStore {
		DirectoryBlobStore { root: root.into() }
	}

	fn path_for(&self, key: &str) -> PathBuf {
		self.root.join(key)
	}
}

#[async_trait]
impl BlobStore for DirectoryBlobStore {
	async fn put(&self, key: &str, bytes: &[u8], _reduced_redundancy: bool) -> Result<()> {
		let path = self.path_for(key);
		if let Some(parent) = path.parent() {
			tokio::fs::create_dir_all(parent).await.with_context(|| format!("creating parent dir for {path:?}"))?;
		}
		tokio::fs::write(&path, bytes).await.with_context(|| format!("writing blob {path:?}"))
	}

	async fn head(&self, key: &str) -> Result<Option<u64>> {
		match tokio::fs::metadata(self.path_for(key)).await {
			Ok(meta) => Ok(Some(meta.len())),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e).with_context(|| format!("HEAD-ing blob {key}")),
		}
	}
}

/// In-process test double.
#[derive(Default)]
pub struct InMemoryBlobStore {
	objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
	pub fn new() -> InMemoryBlobStore {
		InMemoryBlobStore::default()
	}

	pub fn len(&self) -> usize {
		self.objects.lock().unwrap().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn keys(&self) -> Vec<String> {
		self.objects.lock().unwrap().keys().cloned().collect()
	}
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
	async fn put(&self, key: &str, bytes: &[u8], _reduced_redundancy: bool) -> Result<()> {
		self.objects.lock().unwrap().insert(key.to_string(), bytes.to_vec());
		Ok(())
	}

	async fn head(&self, key: &str) -> Result<Option<u64>> {
		Ok(self.objects.lock().unwrap().get(key).map(|b| b.len() as u64))
	}
}

/// Retries a transient store failure up to `MAX_STORE_RETRIES` times before
/// giving up. On final failure the caller must not decrement the format's
/// refcount, since the artifact was never durably stored.
pub async fn put_with_retry(store: &dyn BlobStore, key: &str, bytes: &[u8], reduced_redundancy: bool) -> Result<()> {
	let mut last_err = None;
	for attempt in 0..=MAX_STORE_RETRIES {
		match store.put(key, bytes, reduced_redundancy).await {
			Ok(()) => return Ok(()),
			Err(e) => {
				log::warn!("blob store put({key}) attempt {attempt} failed: {e:#}");
				last_err = Some(e);
			}
		}
	}
	Err(last_err.unwrap()).context(format!("exhausted {MAX_STORE_RETRIES} retries storing {key}"))
}
