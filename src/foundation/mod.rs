//! Shared infrastructure: errors, run context, logging.

pub mod context;
pub mod error;
pub mod logging;
