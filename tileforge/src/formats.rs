//! A minimal concrete [`Format`] registered once per configured output
//! format name. The vector-tile binary encoder is a collaborator concern;
//! this placeholder lists each layer's feature count so the pipeline has
//! real bytes to encode, store and size until a production encoder is
//! registered in its place.

use anyhow::Result;
use std::fmt::Write as _;
use tileforge_core::FeatureBundle;
use tileforge_pipeline::Format;

pub struct PassthroughFormat {
	name: String,
}

impl PassthroughFormat {
	pub fn new(name: impl Into<String>) -> PassthroughFormat {
		PassthroughFormat { name: name.into() }
	}
}

impl Format for PassthroughFormat {
	fn name(&self) -> &str {
		&self.name
	}

	fn file_extension(&self) -> &str {
		&self.name
	}

	fn mime(&self) -> &str {
		"application/octet-stream"
	}

	fn encode(&self, bundle: &FeatureBundle, _extents: u32) -> Result<Vec<u8>> {
		let mut out = String::new();
		let mut layers: Vec<_> = bundle.layers.iter().collect();
		layers.sort_by(|a, b| a.0.cmp(b.0));
		for (layer, features) in layers {
			writeln!(out, "{layer}:{}", features.len())?;
		}
		Ok(out.into_bytes())
	}
}
