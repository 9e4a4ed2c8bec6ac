// src/pipeline/mod.rs

//! Mining pipeline entry points.

mod mine;

pub use mine::{FailedJob, MineOutcome, MinedJob, Miner};
