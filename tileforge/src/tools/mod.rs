//! One module per subcommand, each exposing a `Subcommand` args struct
//! and a `run` entry point.

pub mod drain;
pub mod enqueue_tiles_of_interest;
pub mod intersect;
pub mod process;
pub mod seed;
pub mod tile_size;
