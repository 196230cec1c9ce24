//! Feature bundles and formatted artifacts, the payloads that flow between
//! the Data Fetcher, CPU Formatter and Blob Sink stages.

use crate::coord::Coord;
use std::collections::HashMap;

/// One feature: geometry plus attributes. The geometry post-processing
/// pipeline and its binary representation are collaborators;
/// this crate only needs to carry the bytes through.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
	pub geometry: Vec<u8>,
	pub attributes: HashMap<String, String>,
}

/// For a coord, a mapping layer-name -> features. Produced by the Data
/// Fetcher, consumed by the CPU Formatter. Lives for one pipeline pass.
#[derive(Debug, Clone, Default)]
pub struct FeatureBundle {
	pub coord: Option<Coord>,
	pub layers: HashMap<String, Vec<Feature>>,
}

impl FeatureBundle {
	pub fn new(coord: Coord) -> FeatureBundle {
		FeatureBundle {
			coord: Some(coord),
			layers: HashMap::new(),
		}
	}

	pub fn insert_layer(&mut self, name: impl Into<String>, features: Vec<Feature>) {
		self.layers.insert(name.into(), features);
	}

	pub fn coord(&self) -> Coord {
		self.coord.expect("FeatureBundle constructed without a coord")
	}
}

/// One encoded payload per `(coord, format)`. Lifetime: from CPU Formatter
/// to Blob Sink.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedArtifact {
	pub coord: Coord,
	pub format: String,
	pub bytes: Vec<u8>,
}
