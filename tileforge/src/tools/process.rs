//! `process`: runs the full pipeline until signaled to stop, concurrently
//! with a RAWR consume loop that regenerates raw tiles and re-enqueues
//! TOI survivors.
//!
//! There is no separate RAWR entry point among the subcommands; since the
//! RAWR queue only ever receives work from `intersect`, something has to
//! drain it. `process` runs both the Supervisor's pipeline and a
//! `RawrConsumer` loop side by side, sharing one shutdown flag.

use crate::db::NullConnection;
use crate::formats::PassthroughFormat;
use crate::rawtile::PipelineRawTileGenerator;
use crate::support::{build_blob_store, build_queue, load_config};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tileforge_core::{Config, ConcurrencyLimits, PipelineStats};
use tileforge_pipeline::{ConnectionFactory, CpuFormatter, DataFetcher, DbPool, Format, FormatRegistry, PipelineConfig, QueryConnection, QueueSizes, Supervisor};
use tileforge_rawr::{CachedToiSource, RawrConsumer, ToiSource};

const RAWR_IDLE_BACKOFF: std::time::Duration = std::time::Duration::from_millis(200);

#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// path to the YAML config file
	#[arg(long)]
	config: PathBuf,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = load_config(&arguments.config)?;
	let shutdown = Arc::new(AtomicBool::new(false));

	#[cfg(unix)]
	{
		let shutdown = shutdown.clone();
		tokio::spawn(async move {
			if let Err(e) = tileforge_pipeline::install_shutdown_signal_handler(shutdown).await {
				log::error!("failed installing shutdown signal handler: {e:#}");
			}
		});
	}

	execute(&config, shutdown).await
}

async fn execute(config: &Config, shutdown: Arc<AtomicBool>) -> Result<()> {
	let dbnames = if config.database.dbnames.is_empty() {
		vec![String::new()]
	} else {
		config.database.dbnames.clone()
	};
	let factories: Vec<ConnectionFactory> = dbnames
		.iter()
		.map(|_| Arc::new(|| Ok(Box::new(NullConnection) as Box<dyn QueryConnection>)) as ConnectionFactory)
		.collect();
	let n_simultaneous_query_sets = config.n_simultaneous_query_sets.unwrap_or(4);
	let pool = Arc::new(DbPool::new(factories, n_simultaneous_query_sets)?);
	let fetcher = Arc::new(DataFetcher::new(pool));

	let mut registry = FormatRegistry::new();
	for name in &config.output_formats {
		registry.register(Arc::new(PassthroughFormat::new(name.clone())) as Arc<dyn Format>);
	}
	let registry = Arc::new(registry);

	let n_simultaneous_s3_storage = config.n_simultaneous_s3_storage.unwrap_or_else(ConcurrencyLimits::default_s3_storage_concurrency);
	let limits = ConcurrencyLimits::new(config.layers.len(), n_simultaneous_query_sets, config.output_formats.len(), n_simultaneous_s3_storage);
	let stats = Arc::new(PipelineStats::default());
	let formatter = Arc::new(CpuFormatter::new(registry.clone(), limits.cpu_bound, stats.clone()));

	let layers = Arc::new(config.layers.clone());
	let blob_store = build_blob_store(&config.blob_store)?;
	let input_queue = build_queue(&config.input_queue, false)?;
	let rawr_queue = build_queue(&config.rawr_queue, false)?;
	let blob_prefix = config.blob_store.bucket.clone();

	let generator = Arc::new(PipelineRawTileGenerator::new(fetcher.clone(), registry.clone(), layers.clone(), blob_store.clone(), blob_prefix.clone()));
	let toi_source: Arc<dyn ToiSource> = Arc::new(crate::toi_source::FileToiSource::new(config.blob_store.path.join("toi.gz")));
	let toi = Arc::new(CachedToiSource::new(toi_source));
	let consumer = Arc::new(RawrConsumer::new(rawr_queue, input_queue.clone(), config.group_by_zoom, generator, toi));

	let rawr_task = {
		let shutdown = shutdown.clone();
		let consumer = consumer.clone();
		tokio::spawn(async move { run_rawr_loop(consumer, shutdown).await })
	};

	let pipeline_config = PipelineConfig {
		queue: input_queue,
		blob_store,
		fetcher,
		formatter,
		layers,
		output_formats: Arc::new(config.output_formats.clone()),
		blob_prefix,
		reduced_redundancy: config.blob_store.reduced_redundancy,
		sizes: QueueSizes::default(),
		stats,
	};

	let result = Supervisor::run(pipeline_config, shutdown.clone()).await;

	// the pipeline may have ended by natural input exhaustion rather than a
	// signal; flip shutdown either way so the RAWR loop also winds down.
	shutdown.store(true, Ordering::SeqCst);
	rawr_task.await.ok();

	result.map(|_state| ())
}

async fn run_rawr_loop(consumer: Arc<RawrConsumer>, shutdown: Arc<AtomicBool>) {
	while !shutdown.load(Ordering::SeqCst) {
		match consumer.consume_once().await {
			Ok(Some(_timings)) => {}
			Ok(None) => tokio::time::sleep(RAWR_IDLE_BACKOFF).await,
			Err(e) => log::error!("rawr consume loop error: {e:#}"),
		}
	}
}
