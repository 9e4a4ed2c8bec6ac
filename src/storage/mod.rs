// src/storage/mod.rs

//! Local persistence: the raw-document cache and record export.

mod cache;
mod export;

pub use cache::{CachePolicy, JobCache};
pub use export::write_outcome;
