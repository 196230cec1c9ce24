//! `intersect`: runs the expiry intersector over all files in the
//! configured expired-tiles directory (sorted, capped at 20 per
//! invocation), dispatches survivors to the RAWR queue for regeneration,
//! and deletes consumed files on success.
//!
//! Survivors are routed through `tileforge_rawr::dispatch` into the RAWR
//! queue rather than straight back onto the input queue, since RAWR
//! grouping exists precisely to batch already-filtered expired/TOI coords
//! for raw-tile regeneration.

use crate::support::{build_queue, load_config};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tileforge_core::{explode_and_intersect, Coord, Config, Toi};
use tileforge_queue::QueueBackend;
use tileforge_rawr::dispatch;

const MAX_FILES_PER_RUN: usize = 20;

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// path to the YAML config file
	#[arg(long)]
	config: PathBuf,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = load_config(&arguments.config)?;
	let rawr_queue = build_queue(&config.rawr_queue, false)?;
	let (n_files, n_survivors) = execute(&config, rawr_queue.as_ref()).await?;
	println!("intersected {n_files} expired-tiles files, dispatched {n_survivors} survivors");
	Ok(())
}

/// Dispatches survivors into `rawr_queue`, the queue instance the caller
/// will go on to read from or inspect; building a second, unrelated queue
/// here would silently discard everything just dispatched whenever the
/// configured back-end is in-memory.
async fn execute(config: &Config, rawr_queue: &dyn QueueBackend) -> Result<(usize, usize)> {
	let mut files: Vec<PathBuf> = std::fs::read_dir(&config.intersect.expired_tiles_location)
		.with_context(|| format!("listing expired-tiles directory {:?}", config.intersect.expired_tiles_location))?
		.filter_map(|entry| entry.ok().map(|entry| entry.path()))
		.filter(|path| path.is_file())
		.collect();
	files.sort();
	files.truncate(MAX_FILES_PER_RUN);

	let mut expired = Vec::new();
	for path in &files {
		expired.extend(read_expired_file(path)?);
	}

	let toi = load_toi(config).await?;
	let (survivors, metrics) = explode_and_intersect(expired, &toi, config.intersect.zoom_floor);
	log::info!("intersect: toi({}) candidates({}) hits({}) misses({})", metrics.toi_len, metrics.candidates, metrics.hits, metrics.misses);

	if !survivors.is_empty() {
		dispatch(rawr_queue, config.group_by_zoom, survivors.iter().copied()).await?;
	}

	for path in &files {
		std::fs::remove_file(path).with_context(|| format!("removing consumed expired-tiles file {path:?}"))?;
	}

	Ok((files.len(), survivors.len()))
}

/// Parses `z/x/y` lines, skipping blanks and logging+skipping malformed
/// ones rather than failing the whole file.
fn read_expired_file(path: &Path) -> Result<Vec<Coord>> {
	let text = std::fs::read_to_string(path).with_context(|| format!("reading expired-tiles file {path:?}"))?;
	let mut coords = Vec::new();
	for line in text.lines() {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		match Coord::parse_zxy(line) {
			Ok(coord) => coords.push(coord),
			Err(e) => log::warn!("malformed coord in {path:?}: {e:#}"),
		}
	}
	Ok(coords)
}

async fn load_toi(config: &Config) -> Result<Toi> {
	let path = config.blob_store.path.join("toi.gz");
	let bytes = tokio::fs::read(&path).await.with_context(|| format!("reading TOI blob {path:?}"))?;
	Toi::load_gzipped(&bytes[..]).with_context(|| format!("parsing TOI blob {path:?}"))
}
