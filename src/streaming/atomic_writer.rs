//! Directory output with atomic file replacement.
//!
//! Each batch file is written to a temporary file in the destination
//! directory and renamed into place once complete. A writer dropped before
//! `finish()` removes its temporary file, so a failed job never leaves a
//! truncated batch behind.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::AppError;
use crate::streaming::batch_writer::BatchSink;

/// Writes one file atomically.
pub struct AtomicFileWriter {
    writer: BufWriter<NamedTempFile>,
    final_path: PathBuf,
}

impl AtomicFileWriter {
    /// Creates a writer targeting `final_path`.
    ///
    /// The temporary file lives next to the destination so the final rename
    /// stays on one filesystem.
    pub fn new(final_path: impl AsRef<Path>) -> Result<Self, AppError> {
        let final_path = final_path.as_ref().to_path_buf();

        let parent_dir = final_path.parent().ok_or_else(|| {
            AppError::Sink(format!(
                "Cannot determine parent directory for: {}",
                final_path.display()
            ))
        })?;

        let temp_file = NamedTempFile::new_in(parent_dir)
            .map_err(|e| AppError::Sink(format!("Failed to create temporary file: {}", e)))?;

        Ok(Self {
            writer: BufWriter::new(temp_file),
            final_path,
        })
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), AppError> {
        self.writer
            .write_all(bytes)
            .map_err(|e| AppError::Sink(format!("Failed to write {}: {}", self.final_path.display(), e)))
    }

    /// Flushes and renames the temporary file onto the final path,
    /// replacing any existing file. Returns the final path.
    pub fn finish(self) -> Result<PathBuf, AppError> {
        let named_temp = self.writer.into_inner().map_err(|e| {
            AppError::Sink(format!("Failed to flush buffer: {}", e.error()))
        })?;

        named_temp.persist(&self.final_path).map_err(|e| {
            AppError::Sink(format!(
                "Failed to persist file to {}: {}",
                self.final_path.display(),
                e.error
            ))
        })?;

        Ok(self.final_path)
    }
}

/// Writes each batch as `{dir}/{name}`.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Creates the sink, creating `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Sink(format!("Failed to create output directory {}: {}", dir.display(), e))
        })?;
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl BatchSink for DirectorySink {
    fn put(&mut self, name: &str, contents: &[u8]) -> Result<(), AppError> {
        let is_plain_name = Path::new(name)
            .file_name()
            .is_some_and(|file_name| file_name == name);
        if !is_plain_name {
            return Err(AppError::Sink(format!("invalid output file name: {}", name)));
        }

        let mut writer = AtomicFileWriter::new(self.dir.join(name))?;
        writer.write_all(contents)?;
        let path = writer.finish()?;

        tracing::debug!(path = %path.display(), bytes = contents.len(), "Wrote batch file");
        self.written.push(path);
        Ok(())
    }
}
