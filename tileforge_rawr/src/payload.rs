//! RAWR payload marshal/unmarshal: a comma-separated `z/x/y` list, with
//! the invariant that every member shares one common ancestor at the
//! group-by zoom.

use anyhow::{bail, ensure, Result};
use tileforge_core::Coord;

pub fn marshal(coords: &[Coord]) -> String {
	coords.iter().map(Coord::as_zxy_string).collect::<Vec<_>>().join(",")
}

pub fn unmarshal(payload: &str) -> Result<Vec<Coord>> {
	payload.split(',').map(|part| Coord::parse_zxy(part)).collect()
}

/// The common ancestor of `coords` at `group_by_zoom`, or an error if they
/// don't all share one. The RAWR dispatcher guarantees this by construction;
/// a mismatch here means a bug upstream, not a runtime condition callers
/// should expect to handle.
pub fn common_parent(coords: &[Coord], group_by_zoom: u8) -> Result<Coord> {
	ensure!(!coords.is_empty(), "no coords in RAWR payload");
	let mut parent = None;
	for coord in coords {
		ensure!(
			group_by_zoom <= coord.zoom(),
			"coord {coord:?} is above the group-by zoom {group_by_zoom}"
		);
		let candidate = coord.ancestor(group_by_zoom);
		match parent {
			None => parent = Some(candidate),
			Some(p) if p == candidate => {}
			Some(p) => bail!("RAWR payload coords do not share a common ancestor: {p:?} vs {candidate:?}"),
		}
	}
	Ok(parent.unwrap())
}
