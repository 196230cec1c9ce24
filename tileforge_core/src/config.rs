//! The configuration surface, parsed from YAML: every section is
//! optional and defaults to an empty value.

use crate::layer::LayerDescriptor;
use crate::seed::{GeoBBox, MetroExtract, SeedConfig, SeedSource};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueKind {
	CloudQueue,
	InMemory,
	File,
	Stdout,
	CacheBacked,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueueConfig {
	pub kind: QueueKind,
	/// queue name/url for cloud-queue, file path for the file back-end;
	/// unused by the in-memory and stdout back-ends.
	#[serde(default)]
	pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlobStoreKind {
	Directory,
	S3,
}

impl Default for BlobStoreKind {
	fn default() -> Self {
		BlobStoreKind::Directory
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlobStoreConfig {
	#[serde(default)]
	pub kind: BlobStoreKind,
	#[serde(default)]
	pub bucket: String,
	#[serde(default)]
	pub path: PathBuf,
	#[serde(default)]
	pub reduced_redundancy: bool,
}

impl Default for BlobStoreConfig {
	fn default() -> Self {
		BlobStoreConfig {
			kind: BlobStoreKind::Directory,
			bucket: String::new(),
			path: PathBuf::new(),
			reduced_redundancy: false,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DatabaseConfig {
	pub dbnames: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DistributedCacheConfig {
	pub host: String,
	pub port: u16,
	pub db: u8,
	pub toi_set_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueueSizeLoggingConfig {
	pub enabled: bool,
	pub interval_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntersectConfig {
	pub expired_tiles_location: PathBuf,
	#[serde(default)]
	pub zoom_floor: u8,
}

impl Default for IntersectConfig {
	fn default() -> Self {
		IntersectConfig {
			expired_tiles_location: PathBuf::new(),
			zoom_floor: 0,
		}
	}
}

/// YAML shape for one seed source, tagged by `kind`. Resolved into
/// [`SeedSource`] by [`SeedSourceConfig::resolve`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SeedSourceConfig {
	ZoomRange {
		z_start: u8,
		z_until: u8,
	},
	MetroExtract {
		cities: Vec<MetroExtract>,
		#[serde(default)]
		city_filter: Option<Vec<String>>,
		z_start: u8,
		z_until: u8,
	},
	TopTiles {
		/// `z/x/y` strings, as read from a top-tiles document.
		coords: Vec<String>,
		z_start: u8,
		z_until: u8,
	},
	CustomBoxes {
		boxes: Vec<GeoBBox>,
		z_start: u8,
		z_until: u8,
	},
}

impl SeedSourceConfig {
	pub fn resolve(&self) -> Result<SeedSource> {
		use crate::coord::Coord;
		Ok(match self {
			SeedSourceConfig::ZoomRange { z_start, z_until } => SeedSource::ZoomRange {
				z_start: *z_start,
				z_until: *z_until,
			},
			SeedSourceConfig::MetroExtract {
				cities,
				city_filter,
				z_start,
				z_until,
			} => SeedSource::MetroExtract {
				cities: cities.clone(),
				city_filter: city_filter.clone(),
				z_start: *z_start,
				z_until: *z_until,
			},
			SeedSourceConfig::TopTiles { coords, z_start, z_until } => SeedSource::TopTiles {
				coords: coords
					.iter()
					.map(|s| Coord::parse_zxy(s))
					.collect::<Result<Vec<_>>>()
					.context("parsing top-tiles document")?,
				z_start: *z_start,
				z_until: *z_until,
			},
			SeedSourceConfig::CustomBoxes { boxes, z_start, z_until } => SeedSource::CustomBoxes {
				boxes: boxes.clone(),
				z_start: *z_start,
				z_until: *z_until,
			},
		})
	}
}

/// Top-level configuration. All sections are optional and default to
/// empty values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	pub input_queue: QueueConfig,
	pub rawr_queue: QueueConfig,
	#[serde(default)]
	pub output_formats: Vec<String>,
	#[serde(default)]
	pub database: DatabaseConfig,
	#[serde(default)]
	pub blob_store: BlobStoreConfig,
	#[serde(default)]
	pub distributed_cache: DistributedCacheConfig,
	#[serde(default)]
	pub seed_sources: Vec<SeedSourceConfig>,
	#[serde(default)]
	pub intersect: IntersectConfig,
	pub n_simultaneous_query_sets: Option<usize>,
	pub n_simultaneous_s3_storage: Option<usize>,
	#[serde(default)]
	pub queue_size_logging: QueueSizeLoggingConfig,
	pub log_config_path: Option<PathBuf>,
	#[serde(default)]
	pub layers: Vec<LayerDescriptor>,
	#[serde(default = "default_group_by_zoom")]
	pub group_by_zoom: u8,
}

fn default_group_by_zoom() -> u8 {
	7
}

impl Default for QueueConfig {
	fn default() -> Self {
		QueueConfig {
			kind: QueueKind::InMemory,
			name: String::new(),
		}
	}
}

impl Default for QueueKind {
	fn default() -> Self {
		QueueKind::InMemory
	}
}

impl Config {
	#[allow(clippy::should_implement_trait)]
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		serde_yaml_ng::from_reader(reader).context("parsing config from reader (YAML)")
	}

	pub fn from_string(text: &str) -> Result<Self> {
		serde_yaml_ng::from_str(text).context("parsing config from string (YAML)")
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = std::fs::File::open(path).with_context(|| format!("opening config file {path:?}"))?;
		Config::from_reader(std::io::BufReader::new(file)).with_context(|| format!("reading config file {path:?}"))
	}

	pub fn seed_config(&self) -> Result<SeedConfig> {
		Ok(SeedConfig {
			sources: self.seed_sources.iter().map(|s| s.resolve()).collect::<Result<Vec<_>>>()?,
		})
	}

	pub fn n_simultaneous_query_sets(&self) -> usize {
		self.n_simultaneous_query_sets.unwrap_or(self.database.dbnames.len().max(1))
	}

	pub fn n_simultaneous_s3_storage(&self) -> usize {
		self
			.n_simultaneous_s3_storage
			.unwrap_or_else(crate::concurrency::ConcurrencyLimits::default_s3_storage_concurrency)
	}
}
