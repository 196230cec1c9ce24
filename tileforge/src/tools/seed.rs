//! `seed`: enqueues the seed generator's deduplicated output onto
//! the input queue.

use crate::support::{build_queue, load_config};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tileforge_core::{generate_seed, Config};
use tileforge_queue::{enqueue_coords, EnqueueOutcome};

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
	println!("seeded {} coords", outcome.n_queued);
	Ok(())
}

async fn execute(config: &Config) -> Result<EnqueueOutcome> {
	let seed_config = config.seed_config().context("resolving seed sources")?;
	let coords: Vec<_> = generate_seed(&seed_config).collect();
	// seeding bulk-loads the queue, so in-flight dedup on cloud-queue
	// back-ends is suppressed.
	let queue = build_queue(&config.input_queue, true)?;
	enqueue_coords(queue.as_ref(), &coords).await
}
