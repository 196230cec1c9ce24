//! RAWR grouping, dispatch and consume: bucket expired coords by
//! ancestor zoom, dispatch batched payloads, and consume them to regenerate
//! raw tiles and re-enqueue their TOI-intersected descendants.

pub mod consume;
pub mod dispatch;
pub mod payload;
pub mod zip;

pub use consume::{CachedToiSource, ConsumeTimings, RawTileGenerator, RawrConsumer, ToiFetch, ToiSource};
pub use dispatch::{dispatch, DispatchMetrics};
pub use payload::{common_parent, marshal, unmarshal};
pub use zip::{make_rawr_zip_payload, RawrFormattedData};
