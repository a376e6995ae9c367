use std::path::{Path, PathBuf};

use dilution_core::TrialRecord;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::persist::{AtomicFileWriter, PersistError};

/// Ordered trial records plus the file they are flushed to.
#[derive(Debug)]
pub struct ResultLog {
    writer: AtomicFileWriter,
    filename: String,
    records: Vec<TrialRecord>,
}

impl ResultLog {
    pub fn new(dir: PathBuf, filename: impl Into<String>) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
            filename: filename.into(),
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.writer.dir().join(&self.filename)
    }

    pub fn push(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TrialRecord> {
        self.records
    }

    /// Overwrites the results file with every record collected so far.
    pub fn save(&self) -> Result<PathBuf, PersistError> {
        let bytes = to_indented_json(&self.records)?;
        self.writer.write(&self.filename, &bytes)
    }

    /// Reads a results file written by [`ResultLog::save`].
    pub fn load(path: &Path) -> Result<Vec<TrialRecord>, PersistError> {
        let content = std::fs::read(path)?;
        Ok(serde_json::from_slice(&content)?)
    }
}

fn to_indented_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(out)
}
