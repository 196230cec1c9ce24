//! A placeholder [`QueryConnection`] used when no real database driver is
//! wired in. The SQL query text and the wire protocol to reach it are
//! collaborators; deployments implement `QueryConnection`
//! against their own driver and supply a [`ConnectionFactory`] that builds
//! it in place of [`NullConnection`].

use anyhow::Result;
use async_trait::async_trait;
use tileforge_core::{Coord, Feature, LayerDescriptor};
use tileforge_pipeline::QueryConnection;

pub struct NullConnection;

#[async_trait]
impl QueryConnection for NullConnection {
	async fn query_layer(&self, _layer: &LayerDescriptor, _coord: Coord) -> Result<Vec<Feature>> {
		Ok(Vec::new())
	}
}
