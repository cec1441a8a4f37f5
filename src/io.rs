//! Line-delimited JSON readers and the append-only inspection log.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// Read a line-delimited JSON file, one value per line.
///
/// Parsing is strict: a malformed line is a fatal [`RagError::Data`] naming
/// the file and line number. There is no best-effort mode.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)
        .map_err(|e| RagError::Data(format!("cannot open {}: {e}", path.display())))?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line
            .map_err(|e| RagError::Data(format!("cannot read {}: {e}", path.display())))?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line).map_err(|e| {
            RagError::Data(format!("malformed line {} in {}: {e}", lineno + 1, path.display()))
        })?;
        rows.push(value);
    }
    Ok(rows)
}

/// An append-only JSONL audit trail of persisted chunks.
///
/// Each persisted chunk becomes one JSON object on its own line. The file is
/// only ever opened in append mode; it is never truncated or rewritten.
#[derive(Debug, Clone)]
pub struct InspectionLog {
    path: PathBuf,
}

impl InspectionLog {
    /// Create a log writer targeting the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line per chunk and flush.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Pipeline`] if the file cannot be opened or written.
    pub fn append(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let map_err =
            |e: std::io::Error| RagError::Pipeline(format!("inspection log write failed: {e}"));

        let file =
            OpenOptions::new().create(true).append(true).open(&self.path).map_err(map_err)?;
        let mut writer = BufWriter::new(file);

        for chunk in chunks {
            let line = json!({
                "chunk_id": chunk.chunk_id,
                "record_id": chunk.record_id,
                "text": chunk.text,
                "metadata": chunk.metadata,
            });
            serde_json::to_writer(&mut writer, &line)
                .map_err(|e| RagError::Pipeline(format!("inspection log write failed: {e}")))?;
            writer.write_all(b"\n").map_err(map_err)?;
        }
        writer.flush().map_err(map_err)
    }
}
