pub mod app;
mod paths;
pub mod persistence;

pub use app::{
    overlaps, resolve_target_tps, run_loop, InputAction, Intent, IntentCollector, IntentSource,
    LoopConfig, LoopExit, LoopMetricsSnapshot, LoopSummary, Rect, Simulation, TickControl, Vec2,
    TPS_ENV_VAR,
};
pub use paths::{resolve_app_paths, AppPaths, StartupError, ROOT_ENV_VAR};
pub use persistence::{
    parse_json, BackgroundWriter, JsonFileStore, JsonLinesLog, JsonParseError, PersistenceError,
    WritePolicy,
};
