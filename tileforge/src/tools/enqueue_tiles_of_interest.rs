//! `enqueue-tiles-of-interest`: enqueues every coord in the TOI set
//! at or below zoom 18.

use crate::support::{build_queue, load_config};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tileforge_core::{Config, Toi};
use tileforge_queue::{enqueue_coords, EnqueueOutcome};

const MAX_ZOOM_CEILING: u8 = 18;

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// path to the YAML config file
	#[arg(long)]
	config: PathBuf,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = load_config(&arguments.config)?;
	let outcome = execute(&config).await?;
	println!("enqueued {} tiles of interest", outcome.n_queued);
	Ok(())
}

async fn execute(config: &Config) -> Result<EnqueueOutcome> {
	let path = config.blob_store.path.join("toi.gz");
	let bytes = tokio::fs::read(&path).await.with_context(|| format!("reading TOI blob {path:?}"))?;
	let toi = Toi::load_gzipped(&bytes[..]).with_context(|| format!("parsing TOI blob {path:?}"))?;
	let coords: Vec<_> = toi.below_or_at(MAX_ZOOM_CEILING).collect();
	let queue = build_queue(&config.input_queue, false)?;
	enqueue_coords(queue.as_ref(), &coords).await
}
