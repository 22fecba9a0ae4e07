use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::atomic_io::{append_line, write_text_atomic};
use super::PersistenceError;

#[derive(Debug, Error)]
#[error("parse json at {json_path}: {source}")]
pub struct JsonParseError {
    pub json_path: String,
    #[source]
    pub source: serde_json::Error,
}

/// Parses JSON and reports the failing field path (`crates[1][0].x`) on error.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, JsonParseError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let json_path = if path.is_empty() { ".".to_string() } else { path };
        JsonParseError {
            json_path,
            source: error.into_inner(),
        }
    })
}

/// One JSON document per file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore<T> {
    path: PathBuf,
    _value: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _value: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when the file does not exist yet.
    pub fn load(&self) -> Result<Option<T>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        parse_json(&raw)
            .map(Some)
            .map_err(|source| PersistenceError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    pub fn save(&self, value: &T) -> Result<(), PersistenceError> {
        let json =
            serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Encode {
                path: self.path.clone(),
                source,
            })?;
        write_text_atomic(&self.path, &json).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Append-only JSON-lines file.
#[derive(Debug, Clone)]
pub struct JsonLinesLog<T> {
    path: PathBuf,
    _value: PhantomData<fn(T)>,
}

impl<T: Serialize> JsonLinesLog<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _value: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, value: &T) -> Result<(), PersistenceError> {
        let line = serde_json::to_string(value).map_err(|source| PersistenceError::Encode {
            path: self.path.clone(),
            source,
        })?;
        append_line(&self.path, &line).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
