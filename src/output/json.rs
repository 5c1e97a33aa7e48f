//! JSON emitters
//!
//! Every cycle is written as one pretty-printed JSON array of items.

use crate::model::Item;
use crate::output::traits::{Emitter, OutputError, OutputResult, Staged};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Renders items as a pretty-printed JSON array
pub fn render_json(items: &[Item]) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(items)?)
}

/// Writes each batch to a `Write` sink, one array per cycle
pub struct JsonEmitter<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|_| OutputError::Write("writer lock poisoned".to_string()))
    }
}

impl JsonEmitter<std::io::Stdout> {
    /// Emitter printing to standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonEmitter<W> {
    fn write_rendered(&self, rendered: &str) -> OutputResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| OutputError::Write("writer lock poisoned".to_string()))?;
        writeln!(writer, "{}", rendered)?;
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> Emitter for JsonEmitter<W> {
    fn emit(&self, items: &[Item]) -> OutputResult<()> {
        self.write_rendered(&render_json(items)?)
    }

    fn stage<'a>(&'a self, items: &[Item]) -> OutputResult<Box<dyn Staged + 'a>> {
        Ok(Box::new(StagedWrite {
            emitter: self,
            rendered: render_json(items)?,
        }))
    }
}

struct StagedWrite<'a, W: Write + Send> {
    emitter: &'a JsonEmitter<W>,
    rendered: String,
}

impl<W: Write + Send> Staged for StagedWrite<'_, W> {
    fn commit(self: Box<Self>) -> OutputResult<()> {
        self.emitter.write_rendered(&self.rendered)
    }
}

/// Replaces a file with the latest batch on every cycle
///
/// The batch is written to a sibling temp file and renamed into place, so a
/// reader never sees a half-written array.
pub struct JsonFileEmitter {
    path: PathBuf,
}

impl JsonFileEmitter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Emitter for JsonFileEmitter {
    fn emit(&self, items: &[Item]) -> OutputResult<()> {
        self.stage(items)?.commit()
    }

    fn stage<'a>(&'a self, items: &[Item]) -> OutputResult<Box<dyn Staged + 'a>> {
        let rendered = render_json(items)?;
        let temp = self.temp_path();
        std::fs::write(&temp, rendered)?;
        Ok(Box::new(StagedFile {
            temp,
            path: &self.path,
        }))
    }
}

/// Temp file holding the next batch; renamed over the target on commit
struct StagedFile<'a> {
    temp: PathBuf,
    path: &'a Path,
}

impl Staged for StagedFile<'_> {
    fn commit(self: Box<Self>) -> OutputResult<()> {
        if let Err(e) = std::fs::rename(&self.temp, self.path) {
            let _ = std::fs::remove_file(&self.temp);
            return Err(e.into());
        }
        tracing::info!("Data saved to {}", self.path.display());
        Ok(())
    }

    fn discard(self: Box<Self>) {
        if let Err(e) = std::fs::remove_file(&self.temp) {
            tracing::debug!("Failed to remove {}: {}", self.temp.display(), e);
        }
    }
}

/// Sends every batch to several emitters in order
///
/// Every sink is staged before any is committed, so a sink that fails to
/// prepare (serialization, temp file write) leaves all of them untouched.
/// Commits run in insertion order; a failed commit discards the rest.
#[derive(Default)]
pub struct FanoutEmitter {
    emitters: Vec<Box<dyn Emitter>>,
}

impl FanoutEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, emitter: impl Emitter + 'static) -> Self {
        self.emitters.push(Box::new(emitter));
        self
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }
}

impl Emitter for FanoutEmitter {
    fn emit(&self, items: &[Item]) -> OutputResult<()> {
        let mut staged = Vec::with_capacity(self.emitters.len());
        for emitter in &self.emitters {
            match emitter.stage(items) {
                Ok(batch) => staged.push(batch),
                Err(e) => {
                    staged.into_iter().for_each(|batch| batch.discard());
                    return Err(e);
                }
            }
        }

        let mut pending = staged.into_iter();
        while let Some(batch) = pending.next() {
            if let Err(e) = batch.commit() {
                pending.for_each(|batch| batch.discard());
                return Err(e);
            }
        }
        Ok(())
    }
}
