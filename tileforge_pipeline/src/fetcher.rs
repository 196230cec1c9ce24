//! The Data Fetcher stage: for a coord, issues one concurrent query
//! per configured layer against a rotating connection-pool slot, and
//! assembles the resulting `FeatureBundle`.
//!
//! The connection pool is modeled with `deadpool::managed`: a `Manager`
//! whose `create` wraps a possibly-blocking connection open in
//! `tokio::task::spawn_blocking`. The SQL query text and feature-geometry
//! post-processing are collaborators; this stage only needs
//! something that can answer "features for this layer at this coord".

use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool::managed::{Manager, Pool, RecycleResult};
use futures::future::try_join_all;
use std::sync::Arc;
use tileforge_core::{Feature, FeatureBundle, LayerDescriptor};

use tileforge_core::Coord;

/// One open database connection able to answer a layer query. Concrete
/// wire protocol and query text are out of scope here; callers supply an
/// implementation.
#[async_trait]
pub trait QueryConnection: Send + Sync + 'static {
	async fn query_layer(&self, layer: &LayerDescriptor, coord: Coord) -> Result<Vec<Feature>>;
}

pub type ConnectionFactory = Arc<dyn Fn() -> Result<Box<dyn QueryConnection>> + Send + Sync>;

struct ConnectionManager {
	factory: ConnectionFactory,
}

impl Manager for ConnectionManager {
	type Type = Box<dyn QueryConnection>;
	type Error = anyhow::Error;

	async fn create(&self) -> Result<Self::Type, Self::Error> {
		let factory = self.factory.clone();
		tokio::task::spawn_blocking(move || (factory)())
			.await
			.map_err(|e| anyhow::anyhow!("spawn_blocking failed opening db connection: {e}"))?
	}

	async fn recycle(&self, _obj: &mut Self::Type, _metrics: &deadpool::managed::Metrics) -> RecycleResult<Self::Error> {
		Ok(())
	}
}

/// One pool per configured database name.
pub struct DbPool {
	pools: Vec<Pool<ConnectionManager>>,
}

impl DbPool {
	/// Builds one pool per factory in `factories`, each sized to
	/// `n_simultaneous_query_sets`.
	pub fn new(factories: Vec<ConnectionFactory>, n_simultaneous_query_sets: usize) -> Result<DbPool> {
		let pools = factories
			.into_iter()
			.map(|factory| {
				Pool::builder(ConnectionManager { factory })
					.max_size(n_simultaneous_query_sets.max(1))
					.build()
					.context("building database connection pool")
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(DbPool { pools })
	}

	pub fn n_databases(&self) -> usize {
		self.pools.len()
	}

	/// Picks a pool slot for the `index`-th concurrent query, rotating
	/// across the configured databases.
	fn pool_for(&self, index: usize) -> &Pool<ConnectionManager> {
		&self.pools[index % self.pools.len()]
	}
}

/// Fetches feature data for one coord, one layer query per configured
/// layer, run concurrently against rotating pool slots.
pub struct DataFetcher {
	pool: Arc<DbPool>,
}

impl DataFetcher {
	pub fn new(pool: Arc<DbPool>) -> DataFetcher {
		DataFetcher { pool }
	}

	/// Spawns one query task per layer; if any fails, surfaces the error and
	/// emits no bundle.
	pub async fn fetch(&self, coord: Coord, layers: &[LayerDescriptor]) -> Result<FeatureBundle> {
		let tasks = layers.iter().enumerate().map(|(i, layer)| {
			let pool = self.pool.clone();
			let layer = layer.clone();
			async move {
				let conn = pool
					.pool_for(i)
					.get()
					.await
					.map_err(|e| anyhow::anyhow!("checking out db connection: {e}"))?;
				conn.query_layer(&layer, coord)
					.await
					.with_context(|| format!("querying layer {:?} for {coord:?}", layer.name))
					.map(|features| (layer.name.clone(), features))
			}
		});

		let results = try_join_all(tasks).await.context("fetching feature bundle")?;
		let mut bundle = FeatureBundle::new(coord);
		for (name, features) in results {
			bundle.insert_layer(name, features);
		}
		Ok(bundle)
	}
}
