// src/lib.rs
pub mod batch;
pub mod cli;
pub mod error;
pub mod processing;
pub mod utils;

pub use error::{Error, ItemError};
pub use processing::{collect, partition, Batch, Pair, Range, WorkerDeadline};
pub use utils::context::Context;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
