// src/utils/mod.rs

//! Shared utilities.

pub mod fs;
pub mod http;
