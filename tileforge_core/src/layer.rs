//! Layer descriptors: per-layer configuration loaded once at startup. The
//! SQL query text and geometry post-processing named here are collaborators
//! — this type only carries the configuration that the
//! fetcher and formatter need to address them.

use serde::Deserialize;

/// Per-layer configuration. A fixed list of these is loaded at startup; the
/// special name `"all"` denotes the composed layer list (see
/// [`LayerDescriptor::expand_all`]).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayerDescriptor {
	pub name: String,
	/// One query template per database in the pool.
	#[serde(default)]
	pub queries: Vec<String>,
	#[serde(default)]
	pub geometry_types: Vec<String>,
	#[serde(default)]
	pub clip: bool,
	#[serde(default)]
	pub simplify_until: Option<u8>,
	#[serde(default)]
	pub suppress_simplification: bool,
	#[serde(default)]
	pub transforms: Vec<String>,
	#[serde(default)]
	pub sort_fn: Option<String>,
	#[serde(default)]
	pub pre_intersect_simplify: bool,
}

impl LayerDescriptor {
	pub const ALL: &'static str = "all";

	/// Resolves the list of layer names a caller asked to render, expanding
	/// the special `"all"` descriptor into every configured layer name other
	/// than itself.
	pub fn expand_all<'a>(requested: &'a [String], configured: &'a [LayerDescriptor]) -> Vec<&'a str> {
		if requested.iter().any(|n| n == Self::ALL) {
			configured.iter().map(|l| l.name.as_str()).filter(|n| *n != Self::ALL).collect()
		} else {
			requested.iter().map(String::as_str).collect()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

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

	#[test]
	fn expand_all_resolves_wildcard() {
		let configured = vec![layer("water"), layer("roads"), layer(LayerDescriptor::ALL)];
		let requested = vec![LayerDescriptor::ALL.to_string()];
		assert_eq!(LayerDescriptor::expand_all(&requested, &configured), vec!["water", "roads"]);
	}

	#[test]
	fn expand_all_passes_through_explicit_list() {
		let configured = vec![layer("water"), layer("roads")];
		let requested = vec!["roads".to_string()];
		assert_eq!(LayerDescriptor::expand_all(&requested, &configured), vec!["roads"]);
	}
}
