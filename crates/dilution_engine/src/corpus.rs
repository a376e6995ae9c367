use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dilution_logging::dilution_info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("filler corpus not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to read filler corpus {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

/// Loads the whole filler corpus as UTF-8 text.
pub fn load_filler_corpus(path: &Path) -> Result<String, CorpusError> {
    dilution_info!("Loading filler text from: {}", path.display());
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(CorpusError::NotFound(path.to_path_buf()))
        }
        Err(source) => Err(CorpusError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
