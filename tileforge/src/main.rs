mod db;
mod formats;
mod rawtile;
mod support;
mod tools;
mod toi_source;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Run the full pipeline until signaled
	Process(tools::process::Subcommand),

	/// Enqueue the seed generator's output
	Seed(tools::seed::Subcommand),

	/// Clear the input queue, printing the count removed
	Drain(tools::drain::Subcommand),

	/// Run the expiry intersector over the configured expired-tiles directory
	Intersect(tools::intersect::Subcommand),

	/// Enqueue every tile of interest at or below a zoom ceiling
	EnqueueTilesOfInterest(tools::enqueue_tiles_of_interest::Subcommand),

	/// Report artifact size statistics per region/zoom/format
	TileSize(tools::tile_size::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new().filter_level(cli.verbose.log_level_filter()).format_timestamp(None).init();

	run(cli)
}

fn run(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Process(arguments) => tools::process::run(arguments),
		Commands::Seed(arguments) => tools::seed::run(arguments),
		Commands::Drain(arguments) => tools::drain::run(arguments),
		Commands::Intersect(arguments) => tools::intersect::run(arguments),
		Commands::EnqueueTilesOfInterest(arguments) => tools::enqueue_tiles_of_interest::run(arguments),
		Commands::TileSize(arguments) => tools::tile_size::run(arguments),
	}
}

#[cfg(test)]
mod tests {
	use crate::{run, Cli};
	use anyhow::Result;
	use clap::Parser;

	pub fn run_command(arg_vec: Vec<&str>) -> Result<String> {
		let cli = Cli::try_parse_from(arg_vec)?;
		let msg = format!("{:?}", cli);
		run(cli)?;
		Ok(msg)
	}

	#[test]
	fn help() {
		let err = run_command(vec!["tileforge"]).unwrap_err().to_string();
		assert!(err.contains("\nUsage: tileforge [OPTIONS] <COMMAND>"));
	}

	#[test]
	fn version() {
		let err = run_command(vec!["tileforge", "-V"]).unwrap_err().to_string();
		assert!(err.starts_with("tileforge "));
	}

	#[test]
	fn process_subcommand_requires_config() {
		let output = run_command(vec!["tileforge", "process"]).unwrap_err().to_string();
		assert!(output.contains("--config"));
	}

	#[test]
	fn drain_subcommand_requires_config() {
		let output = run_command(vec!["tileforge", "drain"]).unwrap_err().to_string();
		assert!(output.contains("--config"));
	}

	#[test]
	fn tile_size_subcommand_requires_config() {
		let output = run_command(vec!["tileforge", "tile-size"]).unwrap_err().to_string();
		assert!(output.contains("--config"));
	}
}
