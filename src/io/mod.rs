//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - CSV/JSON artifact exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
