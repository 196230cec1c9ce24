//! The seed generator: a deduplicated, lazy stream over the union of
//! up to four configured sources.

use crate::coord::{seed_zoom_range, Coord};
use serde::Deserialize;
use std::collections::HashSet;
use std::f64::consts::PI;

/// A geographic bounding box in degrees, `(min_lon, min_lat, max_lon, max_lat)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoBBox {
	pub min_lon: f64,
	pub min_lat: f64,
	pub max_lon: f64,
	pub max_lat: f64,
}

fn lon_lat_to_tile(lon: f64, lat: f64, zoom: u8) -> (u32, u32) {
	let size = 2f64.powi(zoom as i32);
	let x = ((lon + 180.0) / 360.0 * size).floor().clamp(0.0, size - 1.0) as u32;
	let lat_rad = lat.to_radians();
	let y = ((1.0 - ((lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI)) / 2.0 * size)
		.floor()
		.clamp(0.0, size - 1.0) as u32;
	(x, y)
}

/// Every coordinate in `bbox` at `zoom`, inclusive of the edge tiles.
pub fn tiles_in_bbox(bbox: &GeoBBox, zoom: u8) -> impl Iterator<Item = Coord> + '_ {
	let (x0, y0) = lon_lat_to_tile(bbox.min_lon, bbox.max_lat, zoom);
	let (x1, y1) = lon_lat_to_tile(bbox.max_lon, bbox.min_lat, zoom);
	let (x_min, x_max) = (x0.min(x1), x0.max(x1));
	let (y_min, y_max) = (y0.min(y1), y0.max(y1));
	(y_min..=y_max).flat_map(move |y| (x_min..=x_max).map(move |x| Coord::new(zoom, x, y).unwrap()))
}

/// A single named city extract: a bounding box the caller can filter by name
/// before bound-expansion into individual coords.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetroExtract {
	pub city: String,
	pub bbox: GeoBBox,
}

/// One configured seed source.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedSource {
	/// (a) a flat zoom range.
	ZoomRange { z_start: u8, z_until: u8 },
	/// (b) a metro-extract document: bounding boxes with a shared zoom range,
	/// optionally restricted to a set of city names.
	MetroExtract {
		cities: Vec<MetroExtract>,
		city_filter: Option<Vec<String>>,
		z_start: u8,
		z_until: u8,
	},
	/// (c) a top-tiles document of already-packed coordinates, restricted to
	/// a zoom range.
	TopTiles { coords: Vec<Coord>, z_start: u8, z_until: u8 },
	/// (d) an explicit list of custom bounding boxes with a zoom range.
	CustomBoxes { boxes: Vec<GeoBBox>, z_start: u8, z_until: u8 },
}

impl SeedSource {
	fn emit(&self) -> Vec<Coord> {
		match self {
			SeedSource::ZoomRange { z_start, z_until } => seed_zoom_range(*z_start, *z_until).collect(),
			SeedSource::MetroExtract {
				cities,
				city_filter,
				z_start,
				z_until,
			} => cities
				.iter()
				.filter(|c| match city_filter {
					Some(names) => names.contains(&c.city),
					None => true,
				})
				.flat_map(|c| (*z_start..=*z_until).flat_map(move |z| tiles_in_bbox(&c.bbox, z).collect::<Vec<_>>()))
				.collect(),
			SeedSource::TopTiles { coords, z_start, z_until } => coords
				.iter()
				.copied()
				.filter(|c| (*z_start..=*z_until).contains(&c.zoom()))
				.collect(),
			SeedSource::CustomBoxes { boxes, z_start, z_until } => boxes
				.iter()
				.flat_map(|b| (*z_start..=*z_until).flat_map(move |z| tiles_in_bbox(b, z).collect::<Vec<_>>()))
				.collect(),
		}
	}
}

/// Configuration for the seed generator: any combination of the four
/// sources above.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedConfig {
	pub sources: Vec<SeedSource>,
}

/// Produces the deduplicated union of every configured source's output. The
/// seed generator emits each coord at most once; memory cost
/// is O(distinct coords emitted).
pub fn generate_seed(config: &SeedConfig) -> impl Iterator<Item = Coord> {
	let mut seen = HashSet::new();
	config
		.sources
		.iter()
		.flat_map(|s| s.emit())
		.collect::<Vec<_>>()
		.into_iter()
		.filter(move |c| seen.insert(*c))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zoom_only_counts_21() {
		let config = SeedConfig {
			sources: vec![SeedSource::ZoomRange { z_start: 0, z_until: 2 }],
		};
		let coords: Vec<_> = generate_seed(&config).collect();
		assert_eq!(coords.len(), 21);
	}

	#[test]
	fn union_is_deduplicated() {
		let config = SeedConfig {
			sources: vec![
				SeedSource::ZoomRange { z_start: 0, z_until: 1 },
				SeedSource::TopTiles {
					coords: vec![Coord::new(0, 0, 0).unwrap(), Coord::new(1, 1, 1).unwrap()],
					z_start: 0,
					z_until: 1,
				},
			],
		};
		let coords: Vec<_> = generate_seed(&config).collect();
		// zoom 0 has 1 tile, zoom 1 has 4 tiles, all already covered by the
		// zoom range source, so the top-tiles source contributes nothing new.
		assert_eq!(coords.len(), 5);
		let uniq: HashSet<_> = coords.into_iter().collect();
		assert_eq!(uniq.len(), 5);
	}

	#[test]
	fn metro_extract_filters_by_city_before_expansion() {
		let berlin = MetroExtract {
			city: "berlin".to_string(),
			bbox: GeoBBox {
				min_lon: 13.0,
				min_lat: 52.0,
				max_lon: 13.1,
				max_lat: 52.1,
			},
		};
		let paris = MetroExtract {
			city: "paris".to_string(),
			bbox: GeoBBox {
				min_lon: 2.0,
				min_lat: 48.0,
				max_lon: 2.1,
				max_lat: 48.1,
			},
		};
		let config = SeedConfig {
			sources: vec![SeedSource::MetroExtract {
				cities: vec![berlin, paris],
				city_filter: Some(vec!["berlin".to_string()]),
				z_start: 10,
				z_until: 10,
			}],
		};
		let coords: Vec<_> = generate_seed(&config).collect();
		assert!(!coords.is_empty());
		// all coords should land near berlin's tile, not paris's
		let (bx, by) = lon_lat_to_tile(13.05, 52.05, 10);
		assert!(coords.iter().any(|c| c.x() == bx && c.y() == by));
	}
}
