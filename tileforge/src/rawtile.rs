//! Concrete `RawTileGenerator`: fetches the same feature bundle the main
//! pipeline would fetch for the RAWR message's ancestor coord, formats it
//! with every registered format, zips the results, and
//! stores the zip under the RAWR key schema. Reuses the Data Fetcher / CPU
//! Formatter's `Format` registry / Blob Sink building blocks rather than
//! inventing a second encode path.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tileforge_core::{rawr_key, Coord, LayerDescriptor};
use tileforge_pipeline::{put_with_retry, BlobStore, DataFetcher, FormatRegistry, DEFAULT_EXTENTS};
use tileforge_rawr::{make_rawr_zip_payload, RawTileGenerator, RawrFormattedData};

pub struct PipelineRawTileGenerator {
	fetcher: Arc<DataFetcher>,
	formats: Arc<FormatRegistry>,
	layers: Arc<Vec<LayerDescriptor>>,
	blob_store: Arc<dyn BlobStore>,
	blob_prefix: String,
}

impl PipelineRawTileGenerator {
	pub fn new(fetcher: Arc<DataFetcher>, formats: Arc<FormatRegistry>, layers: Arc<Vec<LayerDescriptor>>, blob_store: Arc<dyn BlobStore>, blob_prefix: String) -> PipelineRawTileGenerator {
		PipelineRawTileGenerator {
			fetcher,
			formats,
			layers,
			blob_store,
			blob_prefix,
		}
	}
}

#[async_trait]
impl RawTileGenerator for PipelineRawTileGenerator {
	async fn generate(&self, tile: Coord) -> Result<()> {
		let bundle = self.fetcher.fetch(tile, &self.layers).await.with_context(|| format!("fetching raw-tile features for {tile:?}"))?;

		let mut members = Vec::new();
		for format in self.formats.iter() {
			let bytes = format.encode(&bundle, DEFAULT_EXTENTS).with_context(|| format!("encoding raw-tile {tile:?} as {}", format.name()))?;
			members.push(RawrFormattedData {
				name: format!("tile.{}", format.file_extension()),
				data: bytes,
			});
		}

		let payload = make_rawr_zip_payload(&members, None).with_context(|| format!("zipping raw-tile payload for {tile:?}"))?;
		let key = rawr_key(&self.blob_prefix, ".zip", tile);
		put_with_retry(self.blob_store.as_ref(), &key, &payload, false).await.with_context(|| format!("storing raw-tile zip {key}"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use tileforge_core::Feature;
	use tileforge_pipeline::{ConnectionFactory, DbPool, Format, InMemoryBlobStore, QueryConnection};
	use zip::ZipArchive;

	struct StubConnection;
	#[async_trait]
	impl QueryConnection for StubConnection {
		async fn query_layer(&self, layer: &LayerDescriptor, _coord: Coord) -> Result<Vec<Feature>> {
			Ok(vec![Feature {
				geometry: vec![],
				attributes: [("layer".to_string(), layer.name.clone())].into_iter().collect(),
			}])
		}
	}

	struct CountingFormat {
		calls: Arc<AtomicUsize>,
	}
	impl Format for CountingFormat {
		fn name(&self) -> &str {
			"stub"
		}
		fn file_extension(&self) -> &str {
			"stub"
		}
		fn mime(&self) -> &str {
			"application/octet-stream"
		}
		fn encode(&self, bundle: &tileforge_core::FeatureBundle, _extents: u32) -> Result<Vec<u8>> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(format!("{:?}", bundle.coord()).into_bytes())
		}
	}

	fn layer(name: &str) -> LayerDescriptor {
		LayerDescriptor {
			name: name.to_string(),
			queries: vec![],
			geometry_types: vec![],
			clip: false,
			simplify_until: None,
			suppress_simplification: false,
			transforms: vec![],
			sort_fn: None,
			pre_intersect_simplify: false,
		}
	}

	#[tokio::test]
	async fn generates_and_stores_a_zip_under_the_rawr_key() {
		let factory: ConnectionFactory = Arc::new(|| Ok(Box::new(StubConnection) as Box<dyn QueryConnection>));
		let pool = Arc::new(DbPool::new(vec![factory], 1).unwrap());
		let fetcher = Arc::new(DataFetcher::new(pool));

		let calls = Arc::new(AtomicUsize::new(0));
		let mut registry = FormatRegistry::new();
		registry.register(Arc::new(CountingFormat { calls: calls.clone() }));

		let blob_store: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
		let generator = PipelineRawTileGenerator::new(fetcher, Arc::new(registry), Arc::new(vec![layer("water")]), blob_store.clone(), "rawr".to_string());

		let tile = Coord::new(9, 2, 2).unwrap();
		generator.generate(tile).await.unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 1);

		let key = rawr_key("rawr", ".zip", tile);
		assert!(blob_store.head(&key).await.unwrap().is_some());
	}

	#[test]
	fn zip_payload_has_one_entry_per_format() {
		let members = vec![RawrFormattedData {
			name: "tile.stub".to_string(),
			data: b"hello".to_vec(),
		}];
		let bytes = make_rawr_zip_payload(&members, None).unwrap();
		let archive = ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
		assert_eq!(archive.len(), 1);
	}
}
