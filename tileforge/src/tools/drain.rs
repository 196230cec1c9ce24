//! `drain`: clears the input queue and reports the
//! count removed.

use crate::support::{build_queue, load_config};
use anyhow::Result;
use std::path::PathBuf;
use tileforge_core::Config;

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// path to the YAML config file
	#[arg(long)]
	config: PathBuf,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = load_config(&arguments.config)?;
	let n = execute(&config).await?;
	println!("drained {n} messages");
	Ok(())
}

async fn execute(config: &Config) -> Result<usize> {
	let queue = build_queue(&config.input_queue, false)?;
	queue.clear().await
}

#[cfg(test)]
mod tests {
	use super::*;
	use tileforge_core::Coord;
	use tileforge_queue::{enqueue_coords, InMemoryQueue, QueueBackend};

	#[tokio::test]
	async fn drains_preloaded_messages() {
		let queue = InMemoryQueue::new();
		let coords: Vec<Coord> = (0..7).map(|i| Coord::new(5, i, 0).unwrap()).collect();
		enqueue_coords(&queue, &coords).await.unwrap();
		let n = queue.clear().await.unwrap();
		assert_eq!(n, 7);
		assert!(queue.read().await.unwrap().is_none());
	}

	#[tokio::test]
	async fn execute_builds_queue_from_config_and_drains() {
		let config = Config::from_string("input_queue: { kind: in-memory }\nrawr_queue: { kind: in-memory }\n").unwrap();
		// a freshly built in-memory queue is always empty; assert the plumbing works end to end.
		assert_eq!(execute(&config).await.unwrap(), 0);
	}
}
