use std::env;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::input::Intent;
use super::metrics::MetricsAccumulator;

pub const TPS_ENV_VAR: &str = "SEEDWAY_TPS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    /// Pace ticks against the wall clock. When false, ticks run back to back.
    pub realtime: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            realtime: true,
        }
    }
}

impl LoopConfig {
    pub fn fixed_dt(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_tps.max(1) as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// A tick-driven simulation. Ticks are synchronous and must not block on I/O.
pub trait Simulation {
    fn tick(&mut self, fixed_dt_seconds: f32, intent: &Intent) -> TickControl;
}

pub trait IntentSource {
    /// Next tick's intent, or `None` when the source is exhausted.
    fn next_intent(&mut self) -> Option<Intent>;
}

impl<I> IntentSource for I
where
    I: Iterator<Item = Intent>,
{
    fn next_intent(&mut self) -> Option<Intent> {
        self.next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    SourceExhausted,
    SimulationStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks_run: u64,
    pub exit: LoopExit,
}

pub fn run_loop(
    config: &LoopConfig,
    simulation: &mut dyn Simulation,
    source: &mut dyn IntentSource,
) -> LoopSummary {
    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = config.fixed_dt();
    let fixed_dt_seconds = fixed_dt.as_secs_f32();

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        realtime = config.realtime,
        "loop_config"
    );

    let mut metrics = MetricsAccumulator::new(metrics_log_interval);
    let mut ticks_run = 0u64;
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();

    loop {
        let ticks_to_run = if config.realtime {
            let now = Instant::now();
            let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
            last_frame_instant = now;
            accumulator =
                accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));

            let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
            accumulator = step_plan.remaining_accumulator;
            if step_plan.dropped_backlog > Duration::ZERO {
                let dropped =
                    (step_plan.dropped_backlog.as_secs_f64() / fixed_dt.as_secs_f64()) as u32;
                metrics.record_dropped(dropped);
                warn!(
                    dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                    max_ticks_per_frame, "sim_clamp_triggered"
                );
            }
            step_plan.ticks_to_run
        } else {
            1
        };

        for _ in 0..ticks_to_run {
            let Some(intent) = source.next_intent() else {
                info!(ticks_run, "intent_source_exhausted");
                return LoopSummary {
                    ticks_run,
                    exit: LoopExit::SourceExhausted,
                };
            };

            let tick_start = Instant::now();
            let control = simulation.tick(fixed_dt_seconds, &intent);
            metrics.record_tick(tick_start.elapsed());
            ticks_run = ticks_run.saturating_add(1);

            if control == TickControl::Stop {
                info!(ticks_run, "simulation_stopped");
                return LoopSummary {
                    ticks_run,
                    exit: LoopExit::SimulationStopped,
                };
            }
        }

        if let Some(snapshot) = metrics.maybe_snapshot(Instant::now()) {
            info!(
                tps = snapshot.tps,
                tick_time_ms = snapshot.tick_time_ms,
                dropped_ticks = snapshot.dropped_ticks,
                "loop_metrics"
            );
        }

        if config.realtime {
            let until_next_tick = fixed_dt.saturating_sub(accumulator);
            if until_next_tick > Duration::ZERO {
                thread::sleep(until_next_tick);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        let dropped_backlog = accumulator;
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

/// Tick rate from `SEEDWAY_TPS`, falling back to `config_tps` when unset or invalid.
pub fn resolve_target_tps(config_tps: u32) -> u32 {
    match env::var(TPS_ENV_VAR) {
        Ok(value) => match value.parse::<u32>() {
            Ok(tps) if tps > 0 => tps,
            _ => {
                warn!(
                    env_var = TPS_ENV_VAR,
                    value = value.as_str(),
                    "invalid tick-rate env var value; falling back to config"
                );
                config_tps
            }
        },
        Err(env::VarError::NotPresent) => config_tps,
        Err(err) => {
            warn!(
                env_var = TPS_ENV_VAR,
                error = %err,
                "unable to read tick-rate env var; falling back to config"
            );
            config_tps
        }
    }
}
