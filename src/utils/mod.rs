// src/utils/mod.rs
pub mod context;
pub mod logging;

pub use context::Context;
