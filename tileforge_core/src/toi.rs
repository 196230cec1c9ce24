//! The tiles-of-interest (TOI) set: an unordered set of packed coordinate
//! integers, loaded from a gzipped blob. The on-disk representation is
//! deliberately simple (one little-endian `u64` per member) since the wire
//! format is out of scope — the TOI *loader's* exact framing
//! is a collaborator, not something this crate renders pixel-for-pixel
//! compatible with any particular upstream writer.

use crate::coord::Coord;
use anyhow::Result;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::io::{Read, Write};

/// An immutable (per processing pass) set of coordinates eligible for
/// rendering.
#[derive(Debug, Clone, Default)]
pub struct Toi {
	members: HashSet<Coord>,
}

impl Toi {
	pub fn from_iter(coords: impl IntoIterator<Item = Coord>) -> Toi {
		Toi {
			members: coords.into_iter().collect(),
		}
	}

	pub fn contains(&self, coord: Coord) -> bool {
		self.members.contains(&coord)
	}

	pub fn len(&self) -> usize {
		self.members.len()
	}

	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
		self.members.iter().copied()
	}

	/// Coordinates with `zoom <= max_zoom`, the subset the
	/// `enqueue-tiles-of-interest` CLI command enqueues.
	pub fn below_or_at(&self, max_zoom: u8) -> impl Iterator<Item = Coord> + '_ {
		self.members.iter().copied().filter(move |c| c.zoom() <= max_zoom)
	}

	/// Loads a TOI set from a gzipped stream of little-endian packed `u64`s.
	pub fn load_gzipped(reader: impl Read) -> Result<Toi> {
		let mut decoder = GzDecoder::new(reader);
		let mut bytes = Vec::new();
		decoder.read_to_end(&mut bytes)?;
		let members = bytes
			.chunks_exact(8)
			.map(|chunk| Coord::from_packed(u64::from_le_bytes(chunk.try_into().unwrap())))
			.collect();
		Ok(Toi { members })
	}

	/// Serializes the set in the same gzipped little-endian-`u64` framing
	/// `load_gzipped` reads. Used by tests and by tooling that refreshes a
	/// TOI blob.
	pub fn save_gzipped(&self, writer: impl Write) -> Result<()> {
		let mut encoder = GzEncoder::new(writer, Compression::default());
		for coord in &self.members {
			encoder.write_all(&coord.as_packed().to_le_bytes())?;
		}
		encoder.finish()?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn gzipped_roundtrip() {
		let coords = vec![Coord::new(5, 1, 2).unwrap(), Coord::new(10, 100, 200).unwrap()];
		let toi = Toi::from_iter(coords.clone());

		let mut buf = Vec::new();
		toi.save_gzipped(&mut buf).unwrap();

		let loaded = Toi::load_gzipped(&buf[..]).unwrap();
		assert_eq!(loaded.len(), 2);
		for c in coords {
			assert!(loaded.contains(c));
		}
	}

	#[test]
	fn below_or_at_filters_by_zoom() {
		let toi = Toi::from_iter([Coord::new(5, 0, 0).unwrap(), Coord::new(18, 0, 0).unwrap(), Coord::new(19, 0, 0).unwrap()]);
		let kept: Vec<_> = toi.below_or_at(18).collect();
		assert_eq!(kept.len(), 2);
		assert!(kept.iter().all(|c| c.zoom() <= 18));
	}
}
