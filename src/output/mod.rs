//! Output module for publishing scraped items
//!
//! This module handles:
//! - The `Emitter` seam the scrape cycle publishes through
//! - JSON rendering to stdout, any writer, or a file replaced every cycle
//! - Fanning one batch out to several sinks

mod json;
mod traits;

pub use json::{render_json, FanoutEmitter, JsonEmitter, JsonFileEmitter};
pub use traits::{Emitter, OutputError, OutputResult, Staged};
