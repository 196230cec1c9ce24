//! Config loading and component construction shared by every subcommand,
//! factoring out the setup each subcommand would otherwise repeat before
//! its real work.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tileforge_core::config::{BlobStoreConfig, BlobStoreKind, QueueConfig};
use tileforge_core::Config;
use tileforge_pipeline::{BlobStore, DirectoryBlobStore};
use tileforge_queue::QueueBackend;

pub fn load_config(path: &Path) -> Result<Config> {
	Config::from_path(path).with_context(|| format!("loading config from {path:?}"))
}

pub fn build_queue(config: &QueueConfig, for_seeding: bool) -> Result<Arc<dyn QueueBackend>> {
	Ok(Arc::from(tileforge_queue::build_queue(config, for_seeding)?))
}

/// The S3 blob store is a collaborator concern; only the directory
/// back-end is wired up here.
pub fn build_blob_store(config: &BlobStoreConfig) -> Result<Arc<dyn BlobStore>> {
	match config.kind {
		BlobStoreKind::Directory => Ok(Arc::new(DirectoryBlobStore::new(config.path.clone()))),
		BlobStoreKind::S3 => bail!("blob-store kind \"s3\" is not implemented by this build; configure a directory store"),
	}
}
