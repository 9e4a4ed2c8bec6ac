// src/services/mod.rs

//! Extraction and portal services.

mod assemble;
mod extract;
mod lines;
mod portal;
mod prices;
mod sections;

pub use assemble::{Assembly, RecordAssembler};
pub use extract::extract;
pub use lines::LineSequence;
pub use portal::{JobSource, PortalClient};
pub use prices::remap_table;
pub use sections::{locate_all_lines, locate_lines};
