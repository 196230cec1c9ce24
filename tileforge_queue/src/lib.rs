//! The queue abstraction: one `QueueBackend` contract, five
//! back-ends (in-memory, file, stdout, simulated cloud queue, cache-backed),
//! and the coord<->payload helpers shared by every caller.

pub mod backend;
pub mod cache_backed;
pub mod cloud;
pub mod factory;
pub mod file;
pub mod handle;
pub mod memory;
pub mod stdout;

pub use backend::{coord_payload, enqueue_coords, parse_coord_payload, EnqueueOutcome, QueueBackend, MAX_BATCH_SIZE};
pub use cache_backed::CacheBackedQueue;
pub use cloud::CloudQueue;
pub use factory::build as build_queue;
pub use file::FileQueue;
pub use handle::MessageHandle;
pub use memory::InMemoryQueue;
pub use stdout::StdoutQueue;
