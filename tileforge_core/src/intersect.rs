//! The expiry-intersection algorithm: walk expired coordinates up the
//! zoom pyramid, keeping anything that is a member of the tiles-of-interest
//! set along the way.

use crate::coord::Coord;
use crate::toi::Toi;
use std::collections::HashSet;

/// Counters alongside an `explode_and_intersect` run, for the observability
/// surface callers are expected to emit as metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntersectMetrics {
	pub toi_len: usize,
	pub candidates: usize,
	pub hits: usize,
	pub misses: usize,
}

/// Given expired coordinates `expired` and a tiles-of-interest set `toi`,
/// yields every coordinate (or ancestor of one, down to `until`) that is a
/// member of `toi`. Each input or ancestor coordinate is tested for TOI
/// membership and yielded at most once.
pub fn explode_and_intersect(expired: impl IntoIterator<Item = Coord>, toi: &Toi, until: u8) -> (Vec<Coord>, IntersectMetrics) {
	let mut metrics = IntersectMetrics {
		toi_len: toi.len(),
		..Default::default()
	};

	let mut seen: HashSet<Coord> = HashSet::new();
	let mut out = Vec::new();
	let mut current: Vec<Coord> = expired.into_iter().collect();

	loop {
		let mut next: HashSet<Coord> = HashSet::new();
		for c in current {
			if !seen.insert(c) {
				continue;
			}
			metrics.candidates += 1;
			if toi.contains(c) {
				metrics.hits += 1;
				out.push(c);
			} else {
				metrics.misses += 1;
			}
			if c.zoom() > until {
				next.insert(c.parent());
			}
		}
		if next.is_empty() {
			break;
		}
		current = next.into_iter().collect();
	}

	(out, metrics)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn toi_of(coords: &[Coord]) -> Toi {
		Toi::from_iter(coords.iter().copied())
	}

	#[test]
	fn explode_simple() {
		let e = Coord::new(14, 1, 1).unwrap();
		let t = Coord::new(12, 0, 0).unwrap();
		let (out, _) = explode_and_intersect([e], &toi_of(&[t]), 0);
		assert_eq!(out, vec![t]);

		let (out, _) = explode_and_intersect([e], &toi_of(&[t]), 13);
		assert!(out.is_empty());
	}

	#[test]
	fn self_hit() {
		let c = Coord::new(10, 5, 5).unwrap();
		let (out, _) = explode_and_intersect([c], &toi_of(&[c]), 0);
		assert_eq!(out, vec![c]);
	}

	#[test]
	fn every_output_is_in_toi_and_above_until() {
		let until = 2;
		let expired: Vec<Coord> = (0..20).map(|i| Coord::new(10, i, i).unwrap()).collect();
		let toi = toi_of(&expired.iter().map(|c| c.ancestor(5)).collect::<Vec<_>>());
		let (out, _) = explode_and_intersect(expired, &toi, until);
		let mut uniq = HashSet::new();
		for c in &out {
			assert!(toi.contains(*c));
			assert!(c.zoom() >= until);
			assert!(uniq.insert(*c), "duplicate output {c:?}");
		}
	}

	#[test]
	fn subset_of_toi_at_zoom_returns_itself() {
		let until = 5;
		let expired: Vec<Coord> = (0..10).map(|i| Coord::new(8, i, 0).unwrap()).collect();
		let toi = toi_of(&expired);
		let (out, _) = explode_and_intersect(expired.clone(), &toi, until);
		let out_set: HashSet<_> = out.into_iter().collect();
		let expired_set: HashSet<_> = expired.into_iter().collect();
		assert_eq!(out_set, expired_set);
	}

	#[test]
	fn metrics_counts_are_consistent() {
		let expired: Vec<Coord> = (0..5).map(|i| Coord::new(6, i, 0).unwrap()).collect();
		let toi = toi_of(&[expired[0]]);
		let (_, m) = explode_and_intersect(expired, &toi, 0);
		assert_eq!(m.hits + m.misses, m.candidates);
		assert_eq!(m.toi_len, 1);
	}
}
