//! Data model for scraped betting lines
//!
//! An [`Item`] is one game row from the odds page. It is built once by the
//! parser, serialized by an emitter, and then dropped; nothing is carried
//! across cycles.

mod item;

pub use item::{EventDate, Item, Line, Market, UNKNOWN_LEAGUE};
