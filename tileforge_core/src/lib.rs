//! Core types and algorithms for the tile work-distribution pipeline:
//! packed coordinates, the tiles-of-interest set, the expiry intersector,
//! the seed generator, layer descriptors, feature/artifact payloads, the
//! cache abstraction, concurrency sizing, configuration, and metrics
//! counters.

pub mod blobkey;
pub mod bundle;
pub mod cache;
pub mod concurrency;
pub mod config;
pub mod coord;
pub mod intersect;
pub mod layer;
pub mod seed;
pub mod stats;
pub mod toi;

pub use blobkey::{hash8, rawr_key, tile_key};
pub use bundle::{Feature, FeatureBundle, FormattedArtifact};
pub use concurrency::ConcurrencyLimits;
pub use config::Config;
pub use coord::{seed_zoom_range, Coord, MAX_ZOOM};
pub use intersect::{explode_and_intersect, IntersectMetrics};
pub use layer::LayerDescriptor;
pub use seed::{generate_seed, tiles_in_bbox, GeoBBox, MetroExtract, SeedConfig, SeedSource};
pub use stats::{PipelineStats, PipelineStatsSnapshot};
pub use toi::Toi;
