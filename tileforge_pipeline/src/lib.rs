//! The staged processing pipeline: data fetcher, CPU
//! formatter, blob sink, ack writer, queue reader, and the supervisor that
//! wires them together and drives the shutdown state machine.

pub mod ack;
pub mod blob;
pub mod fetcher;
pub mod formatter;
pub mod reader;
pub mod supervisor;

pub use ack::{AckWriter, StoredNotification};
pub use blob::{hash8, put_with_retry, rawr_key, tile_key, BlobStore, DirectoryBlobStore, InMemoryBlobStore};
pub use fetcher::{ConnectionFactory, DataFetcher, DbPool, QueryConnection};
pub use formatter::{CpuFormatter, Format, FormatRegistry, DEFAULT_EXTENTS};
pub use reader::QueueReader;
#[cfg(unix)]
pub use supervisor::install_shutdown_signal_handler;
pub use supervisor::{PipelineConfig, PipelineState, QueueSizes, Supervisor};
