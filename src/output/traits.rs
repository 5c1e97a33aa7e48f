//! Emitter trait and error types
//!
//! An emitter receives the items of every successful cycle. It is not called
//! for failed cycles.

use crate::model::Item;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A batch prepared by [`Emitter::stage`] but not yet visible to readers
pub trait Staged: Send {
    /// Publishes the batch
    fn commit(self: Box<Self>) -> OutputResult<()>;

    /// Drops the batch without publishing it
    fn discard(self: Box<Self>) {}
}

/// Sink for the items produced by one cycle
///
/// Implementations must be thread-safe; the scheduler may run on any tokio
/// worker.
pub trait Emitter: Send + Sync {
    /// Publishes one cycle's items as a single batch
    ///
    /// # Arguments
    ///
    /// * `items` - Items in page order; may be empty
    fn emit(&self, items: &[Item]) -> OutputResult<()>;

    /// Does every fallible step of [`Emitter::emit`] short of publishing
    ///
    /// Sinks that can separate preparing from publishing (rendering, writing
    /// a temp file) override this. The default defers the whole `emit` to
    /// the commit.
    fn stage<'a>(&'a self, items: &[Item]) -> OutputResult<Box<dyn Staged + 'a>> {
        Ok(Box::new(Deferred {
            emitter: self,
            items: items.to_vec(),
        }))
    }
}

struct Deferred<'a, E: ?Sized> {
    emitter: &'a E,
    items: Vec<Item>,
}

impl<E: Emitter + ?Sized> Staged for Deferred<'_, E> {
    fn commit(self: Box<Self>) -> OutputResult<()> {
        self.emitter.emit(&self.items)
    }
}

impl<T: Emitter + ?Sized> Emitter for Arc<T> {
    fn emit(&self, items: &[Item]) -> OutputResult<()> {
        (**self).emit(items)
    }

    fn stage<'a>(&'a self, items: &[Item]) -> OutputResult<Box<dyn Staged + 'a>> {
        (**self).stage(items)
    }
}

impl<T: Emitter + ?Sized> Emitter for Box<T> {
    fn emit(&self, items: &[Item]) -> OutputResult<()> {
        (**self).emit(items)
    }

    fn stage<'a>(&'a self, items: &[Item]) -> OutputResult<Box<dyn Staged + 'a>> {
        (**self).stage(items)
    }
}
