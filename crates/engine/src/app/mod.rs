mod geometry;
mod input;
mod loop_runner;
mod metrics;

pub use geometry::{overlaps, Rect, Vec2};
pub use input::{InputAction, Intent, IntentCollector};
pub use loop_runner::{
    resolve_target_tps, run_loop, IntentSource, LoopConfig, LoopExit, LoopSummary, Simulation,
    TickControl, TPS_ENV_VAR,
};
pub use metrics::LoopMetricsSnapshot;
