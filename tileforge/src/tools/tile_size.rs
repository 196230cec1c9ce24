//! `tile-size`: reports count/avg/median artifact sizes per
//! region/zoom/format by HEAD-ing blob-store keys.
//!
//! "Region" is the configured metro-extract city name when the config
//! names one or more `MetroExtract` seed sources (filtered the same way
//! the seed generator filters them); otherwise every coord is reported
//! under the single region `"global"`. Candidate coords come from the
//! configured seed sources rather than a live crawl of the store, since
//! enumerating a blob store's keyspace is a collaborator concern — long-term
//! storage layout beyond the blob key schema is out of scope here.

use crate::support::{build_blob_store, load_config};
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tileforge_core::config::SeedSourceConfig;
use tileforge_core::{generate_seed, tile_key, tiles_in_bbox, Coord, Config};
use tileforge_pipeline::BlobStore;

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// path to the YAML config file
	#[arg(long)]
	config: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeStats {
	pub count: usize,
	pub total_bytes: u64,
	sizes: Vec<u64>,
}

impl SizeStats {
	fn record(&mut self, size: u64) {
		self.count += 1;
		self.total_bytes += size;
		self.sizes.push(size);
	}

	pub fn average(&self) -> f64 {
		if self.count == 0 {
			0.0
		} else {
			self.total_bytes as f64 / self.count as f64
		}
	}

	pub fn median(&self) -> u64 {
		if self.sizes.is_empty() {
			return 0;
		}
		let mut sorted = self.sizes.clone();
		sorted.sort_unstable();
		sorted[sorted.len() / 2]
	}
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SizeKey {
	pub region: String,
	pub zoom: u8,
	pub format: String,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = load_config(&arguments.config)?;
	let report = execute(&config).await?;
	for (key, stats) in &report {
		println!(
			"{:<20} z{:<3} {:<8} count={:<6} avg={:<10.1} median={}",
			key.region,
			key.zoom,
			key.format,
			stats.count,
			stats.average(),
			stats.median()
		);
	}
	Ok(())
}

async fn execute(config: &Config) -> Result<BTreeMap<SizeKey, SizeStats>> {
	let blob_store = build_blob_store(&config.blob_store)?;
	let mut report: BTreeMap<SizeKey, SizeStats> = BTreeMap::new();

	let metro_sources: Vec<&SeedSourceConfig> = config
		.seed_sources
		.iter()
		.filter(|s| matches!(s, SeedSourceConfig::MetroExtract { .. }))
		.collect();

	if metro_sources.is_empty() {
		let seed_config = config.seed_config()?;
		for coord in generate_seed(&seed_config) {
			record_coord(blob_store.as_ref(), &mut report, "global", coord, &config.output_formats, &config.blob_store.bucket).await?;
		}
		return Ok(report);
	}

	for source in metro_sources {
		let SeedSourceConfig::MetroExtract {
			cities,
			city_filter,
			z_start,
			z_until,
		} = source
		else {
			unreachable!()
		};
		for city in cities {
			if let Some(names) = city_filter {
				if !names.contains(&city.city) {
					continue;
				}
			}
			for zoom in *z_start..=*z_until {
				for coord in tiles_in_bbox(&city.bbox, zoom) {
					record_coord(blob_store.as_ref(), &mut report, &city.city, coord, &config.output_formats, &config.blob_store.bucket).await?;
				}
			}
		}
	}

	Ok(report)
}

async fn record_coord(
	blob_store: &dyn BlobStore,
	report: &mut BTreeMap<SizeKey, SizeStats>,
	region: &str,
	coord: Coord,
	output_formats: &[String],
	prefix: &str,
) -> Result<()> {
	for format in output_formats {
		let key = tile_key(prefix, format, format, coord);
		if let Some(size) = blob_store.head(&key).await? {
			report
				.entry(SizeKey {
					region: region.to_string(),
					zoom: coord.zoom(),
					format: format.clone(),
				})
				.or_default()
				.record(size);
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tileforge_pipeline::DirectoryBlobStore;

	#[tokio::test]
	async fn reports_count_average_and_median_for_existing_objects() {
		let dir = tempfile::tempdir().unwrap();
		let store = DirectoryBlobStore::new(dir.path());
		let a = Coord::new(0, 0, 0).unwrap();
		let b = Coord::new(1, 0, 0).unwrap();
		store.put(&tile_key("", "pbf", "pbf", a), &[0u8; 10], false).await.unwrap();
		store.put(&tile_key("", "pbf", "pbf", b), &[0u8; 20], false).await.unwrap();

		let config = Config::from_string(&format!(
			r#"
input_queue: {{ kind: in-memory }}
rawr_queue: {{ kind: in-memory }}
output_formats: [pbf]
blob_store: {{ kind: directory, path: {:?} }}
seed_sources:
  - kind: zoom-range
    z_start: 0
    z_until: 1
"#,
			dir.path()
		))
		.unwrap();

		let report = execute(&config).await.unwrap();
		assert_eq!(report.len(), 2);
		let zoom0 = report
			.get(&SizeKey {
				region: "global".to_string(),
				zoom: 0,
				format: "pbf".to_string(),
			})
			.unwrap();
		assert_eq!(zoom0.count, 1);
		assert_eq!(zoom0.average(), 10.0);
		assert_eq!(zoom0.median(), 10);
	}

	#[tokio::test]
	async fn missing_objects_are_skipped() {
		let dir = tempfile::tempdir().unwrap();
		let config = Config::from_string(&format!(
			"input_queue: {{ kind: in-memory }}\nrawr_queue: {{ kind: in-memory }}\noutput_formats: [pbf]\nblob_store: {{ kind: directory, path: {:?} }}\n",
			dir.path()
		))
		.unwrap();
		let report = execute(&config).await.unwrap();
		assert!(report.is_empty());
	}
}
