use std::path::{Path, PathBuf};

use engine::{BackgroundWriter, JsonFileStore, JsonLinesLog, PersistenceError, WritePolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::snapshot::SessionSnapshot;
use super::{DEFAULT_PLAYER_COLOR, DEFAULT_PLAYER_NAME};

const SAVE_FILE_SUFFIX: &str = ".save.json";
const AVATAR_FILE_NAME: &str = "avatar.json";
const SCORES_FILE_NAME: &str = "scores.jsonl";

/// Where session snapshots come from and go to. `save` must not block the
/// tick on I/O; implementations hand the write off and report failures
/// themselves.
pub(crate) trait PersistenceGateway {
    fn load(&mut self, player_id: &str) -> Result<Option<SessionSnapshot>, PersistenceError>;
    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Avatar {
    pub(crate) name: String,
    pub(crate) color: String,
}

pub(crate) trait AvatarGateway {
    fn avatar(&mut self) -> Option<Avatar>;
}

/// Name and color the session runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlayerIdentity {
    pub(crate) name: String,
    pub(crate) color: String,
}

impl PlayerIdentity {
    /// Avatar first, then the configured player id, then the default.
    pub(crate) fn resolve(avatar: Option<Avatar>, player_id: Option<&str>) -> Self {
        if let Some(avatar) = avatar {
            let color = if avatar.color.trim().is_empty() {
                DEFAULT_PLAYER_COLOR.to_string()
            } else {
                avatar.color
            };
            return Self {
                name: avatar.name.trim().to_string(),
                color,
            };
        }
        let name = player_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_PLAYER_NAME);
        Self {
            name: name.to_string(),
            color: DEFAULT_PLAYER_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CompletionRecord {
    pub(crate) player_name: String,
    pub(crate) completion_time_ms: u64,
}

pub(crate) trait ScoreReporter {
    fn report(&mut self, record: &CompletionRecord) -> Result<(), PersistenceError>;
}

/// One pretty-printed JSON snapshot per player under the saves directory.
pub(crate) struct FileSaveGateway {
    saves_dir: PathBuf,
    writer: BackgroundWriter<(PathBuf, SessionSnapshot)>,
}

impl FileSaveGateway {
    pub(crate) fn open(saves_dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let writer = BackgroundWriter::spawn(
            "save",
            WritePolicy::LatestOnly,
            |(path, snapshot): (PathBuf, SessionSnapshot)| {
                JsonFileStore::<SessionSnapshot>::new(&path).save(&snapshot)?;
                debug!(path = %path.display(), "save_written");
                Ok(())
            },
        )?;
        Ok(Self {
            saves_dir: saves_dir.into(),
            writer,
        })
    }

    pub(crate) fn save_path(&self, player_id: &str) -> PathBuf {
        self.saves_dir
            .join(format!("{}{SAVE_FILE_SUFFIX}", save_file_stem(player_id)))
    }
}

impl PersistenceGateway for FileSaveGateway {
    fn load(&mut self, player_id: &str) -> Result<Option<SessionSnapshot>, PersistenceError> {
        JsonFileStore::<SessionSnapshot>::new(self.save_path(player_id)).load()
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError> {
        let path = self.save_path(&snapshot.player_name);
        self.writer.submit((path, snapshot.clone()))
    }
}

/// File-name-safe form of a player id; anything outside `[A-Za-z0-9_-]`
/// becomes `_`.
pub(crate) fn save_file_stem(player_id: &str) -> String {
    let stem = player_id
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect::<String>();
    if stem.is_empty() {
        DEFAULT_PLAYER_NAME.to_string()
    } else {
        stem
    }
}

pub(crate) struct FileAvatarGateway {
    store: JsonFileStore<Avatar>,
}

impl FileAvatarGateway {
    pub(crate) fn in_dir(root: &Path) -> Self {
        Self {
            store: JsonFileStore::new(root.join(AVATAR_FILE_NAME)),
        }
    }
}

impl AvatarGateway for FileAvatarGateway {
    fn avatar(&mut self) -> Option<Avatar> {
        match self.store.load() {
            Ok(Some(avatar)) if !avatar.name.trim().is_empty() => Some(avatar),
            Ok(Some(_)) => {
                warn!(path = %self.store.path().display(), "avatar_name_empty");
                None
            }
            Ok(None) => None,
            Err(error) => {
                warn!(error = %error, "avatar_load_failed");
                None
            }
        }
    }
}

/// Appends completion records to `scores.jsonl` off the tick thread.
pub(crate) struct ScoreLogReporter {
    path: PathBuf,
    writer: BackgroundWriter<CompletionRecord>,
}

impl ScoreLogReporter {
    pub(crate) fn in_dir(dir: &Path) -> Result<Self, PersistenceError> {
        let path = dir.join(SCORES_FILE_NAME);
        let log = JsonLinesLog::<CompletionRecord>::new(&path);
        let writer = BackgroundWriter::spawn("scores", WritePolicy::EveryJob, move |record| {
            log.append(&record)
        })?;
        Ok(Self { path, writer })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreReporter for ScoreLogReporter {
    fn report(&mut self, record: &CompletionRecord) -> Result<(), PersistenceError> {
        self.writer.submit(record.clone())
    }
}
