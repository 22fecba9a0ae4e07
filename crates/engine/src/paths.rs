use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const ROOT_ENV_VAR: &str = "SEEDWAY_ROOT";
const SAVES_DIR_NAME: &str = "saves";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub saves_dir: PathBuf,
}

impl AppPaths {
    /// Paths under an explicit root; creates the saves directory.
    pub fn at_root(root: impl Into<PathBuf>) -> Result<Self, StartupError> {
        let root = root.into();
        let saves_dir = root.join(SAVES_DIR_NAME);
        fs::create_dir_all(&saves_dir).map_err(|source| StartupError::CreateSavesDir {
            path: saves_dir.clone(),
            source,
        })?;
        Ok(Self { root, saves_dir })
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("failed to create saves directory at {path}: {source}")]
    CreateSavesDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "{}={path} is not a project root (needs Cargo.toml plus crates/ or saves/)",
        ROOT_ENV_VAR
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "no project root above {searched}; set {} to the directory holding Cargo.toml",
        ROOT_ENV_VAR
    )]
    RootNotFound { searched: PathBuf },
}

/// Root from `SEEDWAY_ROOT`, else the nearest project root above the
/// executable.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let path = canonical_or_raw(Path::new(&value));
            if !is_project_root(&path) {
                return Err(StartupError::InvalidEnvRoot { path });
            }
            path
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let start = exe.parent().unwrap_or(exe.as_path());
            find_project_root(start).ok_or_else(|| StartupError::RootNotFound {
                searched: canonical_or_raw(start),
            })?
        }
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: ROOT_ENV_VAR,
                source,
            })
        }
    };
    AppPaths::at_root(root)
}

fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_project_root(candidate))
        .map(canonical_or_raw)
}

fn is_project_root(path: &Path) -> bool {
    path.join("Cargo.toml").is_file()
        && (path.join("crates").is_dir() || path.join(SAVES_DIR_NAME).is_dir())
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
