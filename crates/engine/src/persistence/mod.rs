mod atomic_io;
mod background;
mod json_store;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use background::{BackgroundWriter, WritePolicy};
pub use json_store::{parse_json, JsonFileStore, JsonLinesLog, JsonParseError};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode json for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: JsonParseError,
    },
    #[error("failed to start {name} writer thread: {source}")]
    SpawnWriter {
        name: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{name} writer is no longer accepting jobs")]
    WriterClosed { name: &'static str },
    #[error("{0}")]
    Rejected(String),
}
