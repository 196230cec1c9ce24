//! Blob store key schema, shared by the pipeline's sink stage and the RAWR
//! consumer's zip upload so both derive the same key from a coord.

use crate::coord::Coord;
use md5::{Digest, Md5};

/// Tile artifact key: `<prefix>/<fmt>/<z>/<x>/<y>.<ext>`. An empty `prefix`
/// is dropped rather than emitted as a leading slash, so the key stays
/// relative to whatever root the blob store was configured with.
pub fn tile_key(prefix: &str, format: &str, ext: &str, coord: Coord) -> String {
	let tail = format!("{format}/{}/{}/{}.{ext}", coord.zoom(), coord.x(), coord.y());
	join_prefix(prefix, &tail)
}

/// First 8 hex digits of the MD5 digest of `relative_path`, used as a shard
/// prefix for uniform key distribution.
pub fn hash8(relative_path: &str) -> String {
	let mut hasher = Md5::new();
	hasher.update(relative_path.as_bytes());
	let digest = hasher.finalize();
	let mut hex = String::with_capacity(32);
	for byte in digest {
		hex.push_str(&format!("{byte:02x}"));
	}
	hex[..8].to_string()
}

/// RAWR intermediate key: `<prefix>/<hash8>/<z>/<x>/<y><suffix>`, where
/// `hash8` hashes the relative path `z/x/y<suffix>`.
pub fn rawr_key(prefix: &str, suffix: &str, coord: Coord) -> String {
	let relative = format!("{}/{}/{}{suffix}", coord.zoom(), coord.x(), coord.y());
	let shard = hash8(&relative);
	join_prefix(prefix, &format!("{shard}/{relative}"))
}

/// Joins a key prefix onto a relative tail, omitting the separator (and
/// thus any leading slash) when `prefix` is empty — `Path::join` discards
/// everything before a leading-slash component, so an empty prefix must
/// never produce one.
fn join_prefix(prefix: &str, tail: &str) -> String {
	if prefix.is_empty() {
		tail.to_string()
	} else {
		format!("{prefix}/{tail}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tile_key_matches_schema() {
		let coord = Coord::new(12, 100, 200).unwrap();
		assert_eq!(tile_key("tiles", "pbf", "pbf", coord), "tiles/pbf/12/100/200.pbf");
	}

	#[test]
	fn rawr_key_has_shard_prefix_and_suffix() {
		let coord = Coord::new(7, 1, 2).unwrap();
		let key = rawr_key("rawr", ".zip", coord);
		assert!(key.starts_with("rawr/"));
		assert!(key.ends_with("7/1/2.zip"));
		let parts: Vec<&str> = key.split('/').collect();
		assert_eq!(parts[1].len(), 8);
	}

	#[test]
	fn hash8_is_deterministic() {
		assert_eq!(hash8("7/1/2.zip"), hash8("7/1/2.zip"));
		assert_ne!(hash8("7/1/2.zip"), hash8("7/1/3.zip"));
	}

	#[test]
	fn empty_prefix_produces_no_leading_slash() {
		let coord = Coord::new(12, 100, 200).unwrap();
		let key = tile_key("", "pbf", "pbf", coord);
		assert_eq!(key, "pbf/12/100/200.pbf");
		assert!(!key.starts_with('/'));

		let key = rawr_key("", ".zip", coord);
		assert!(!key.starts_with('/'));
	}
}
