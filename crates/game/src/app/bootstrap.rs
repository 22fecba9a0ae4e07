use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use engine::{resolve_app_paths, resolve_target_tps, LoopConfig, PersistenceError, StartupError};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay::{
    build_world, AvatarGateway, FileAvatarGateway, FileSaveGateway, GameSession, PlayerIdentity,
    ScoreLogReporter, ScoreReporter, SessionConfig,
};
use super::script::{load_script, IntentScript, ScriptError};

const PLAYER_ENV_VAR: &str = "SEEDWAY_PLAYER";
const REALTIME_FLAG: &str = "--realtime";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("unexpected argument `{0}`; usage: seedway [--realtime] [SCRIPT]")]
    UnexpectedArgument(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LaunchOptions {
    pub(crate) script_path: Option<PathBuf>,
    pub(crate) realtime: bool,
}

impl LaunchOptions {
    /// Parses `[--realtime] [SCRIPT]` (program name already skipped).
    pub(crate) fn from_args(
        args: impl IntoIterator<Item = OsString>,
    ) -> Result<Self, BootstrapError> {
        let mut options = Self::default();
        for arg in args {
            if arg == REALTIME_FLAG {
                options.realtime = true;
            } else if options.script_path.is_none() && !arg.to_string_lossy().starts_with("--") {
                options.script_path = Some(PathBuf::from(arg));
            } else {
                return Err(BootstrapError::UnexpectedArgument(
                    arg.to_string_lossy().into_owned(),
                ));
            }
        }
        Ok(options)
    }
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: GameSession,
    pub(crate) script: IntentScript,
}

pub(crate) fn build_app(options: LaunchOptions) -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Seedway Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        saves = %paths.saves_dir.display(),
        "app_paths_resolved"
    );

    let script = load_script(options.script_path.as_deref())?;
    info!(total_ticks = script.total_ticks(), "intent_script_loaded");

    let avatar = FileAvatarGateway::in_dir(&paths.root).avatar();
    let player_id = read_player_env();
    let identity = PlayerIdentity::resolve(avatar, player_id.as_deref());

    let persistence = FileSaveGateway::open(&paths.saves_dir)?;
    let scores = ScoreLogReporter::in_dir(&paths.saves_dir)?;
    info!(scores = %scores.path().display(), "score_log_ready");
    let scores: Box<dyn ScoreReporter> = Box::new(scores);

    let session = GameSession::start(
        SessionConfig::default(),
        build_world(),
        &identity.name,
        &identity.color,
        Box::new(persistence),
        Some(scores),
    );

    let defaults = LoopConfig::default();
    let config = LoopConfig {
        target_tps: resolve_target_tps(defaults.target_tps),
        realtime: options.realtime,
        ..defaults
    };

    Ok(AppWiring {
        config,
        session,
        script,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn read_player_env() -> Option<String> {
    match env::var(PLAYER_ENV_VAR) {
        Ok(value) => Some(value),
        Err(env::VarError::NotPresent) => None,
        Err(error) => {
            warn!(
                env_var = PLAYER_ENV_VAR,
                error = %error,
                "unable to read player env var; using default"
            );
            None
        }
    }
}
