//! A directory-rooted [`ToiSource`]: reads the gzipped TOI blob from a
//! local path and uses an MD5 digest of its raw bytes as the ETag. The
//! production transport (S3, a distributed cache) is a collaborator
//! concern; this mirrors `DirectoryBlobStore`'s directory-rooted style so
//! the CLI has a genuine, swappable implementation of the seam
//! `tileforge_rawr::ToiSource` names.

use anyhow::{Context, Result};
use async_trait::async_trait;
use md5::{Digest, Md5};
use std::path::PathBuf;
use tileforge_core::Toi;
use tileforge_rawr::{ToiFetch, ToiSource};

pub struct FileToiSource {
	path: PathBuf,
}

impl FileToiSource {
	pub fn new(path: PathBuf) -> FileToiSource {
		FileToiSource { path }
	}

	fn digest(bytes: &[u8]) -> String {
		let mut hasher = Md5::new();
		hasher.update(bytes);
		format!("{:x}", hasher.finalize())
	}
}

#[async_trait]
impl ToiSource for FileToiSource {
	async fn get_if_none_match(&self, etag: Option<&str>) -> Result<ToiFetch> {
		let bytes = tokio::fs::read(&self.path).await.with_context(|| format!("reading TOI blob {:?}", self.path))?;
		let digest = Self::digest(&bytes);
		if Some(digest.as_str()) == etag {
			return Ok(ToiFetch::NotModified);
		}
		let toi = Toi::load_gzipped(&bytes[..]).with_context(|| format!("parsing TOI blob {:?}", self.path))?;
		Ok(ToiFetch::Modified { toi, etag: digest })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tileforge_core::Coord;

	#[tokio::test]
	async fn unchanged_bytes_report_not_modified() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("toi.gz");
		let toi = Toi::from_iter([Coord::new(5, 1, 1).unwrap()]);
		let mut buf = Vec::new();
		toi.save_gzipped(&mut buf).unwrap();
		tokio::fs::write(&path, &buf).await.unwrap();

		let source = FileToiSource::new(path);
		let first = source.get_if_none_match(None).await.unwrap();
		let etag = match first {
			ToiFetch::Modified { etag, .. } => etag,
			ToiFetch::NotModified => panic!("expected Modified on first fetch"),
		};

		let second = source.get_if_none_match(Some(&etag)).await.unwrap();
		assert!(matches!(second, ToiFetch::NotModified));
	}
}
