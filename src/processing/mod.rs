// src/processing/mod.rs
pub mod collector;
pub mod parallel;
pub mod partition;

// Re-export main components
pub use collector::{collect, Pair};
pub use parallel::{Batch, WorkerDeadline};
pub use partition::{partition, Range};
