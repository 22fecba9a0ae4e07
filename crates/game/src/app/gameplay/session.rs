use std::f32::consts::TAU;

use engine::{overlaps, Intent, Rect, Simulation, TickControl, Vec2};
use tracing::{debug, info, trace, warn};

use super::content::World;
use super::gateways::{CompletionRecord, PersistenceGateway, ScoreReporter};
use super::movement::resolve_movement;
use super::puzzles::{PuzzleContext, PuzzleEvent, PuzzleKind};
use super::snapshot::{RestoreIssue, SessionSnapshot};
use super::transition::{resolve_transition, TransitionOutcome};
use super::types::{Direction, Player, Region, RegionId};
use super::{
    COLLECT_FLASH_SECONDS, PLAYER_SIZE, PLAYER_SPEED_PX_PER_SECOND, SEED_SPIN_RADIANS_PER_SECOND,
    TRANSITION_INSET,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SessionConfig {
    pub(crate) player_size: f32,
    pub(crate) player_speed: f32,
    pub(crate) transition_inset: f32,
    pub(crate) collect_flash_seconds: f32,
    pub(crate) seed_spin_radians_per_second: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_size: PLAYER_SIZE,
            player_speed: PLAYER_SPEED_PX_PER_SECOND,
            transition_inset: TRANSITION_INSET,
            collect_flash_seconds: COLLECT_FLASH_SECONDS,
            seed_spin_radians_per_second: SEED_SPIN_RADIANS_PER_SECOND,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SessionEvent {
    SeedCollected { region: RegionId, index: usize },
    PuzzleSolved { region: RegionId, kind: PuzzleKind },
    RegionChanged {
        from: RegionId,
        to: RegionId,
        via: Direction,
    },
    Won { completion_time_ms: u64 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TickReport {
    pub(crate) events: Vec<SessionEvent>,
    /// A snapshot was handed to the persistence gateway this tick.
    pub(crate) saved: bool,
}

pub(crate) struct GameSession {
    config: SessionConfig,
    layout: World,
    world: World,
    player: Player,
    current_region: RegionId,
    game_time: f64,
    collect_flash: f32,
    paused: bool,
    won: bool,
    persistence: Box<dyn PersistenceGateway>,
    scores: Option<Box<dyn ScoreReporter>>,
}

impl GameSession {
    /// A fresh session at the world's start position. `layout` is kept as the
    /// template every restore starts from.
    pub(crate) fn new(
        config: SessionConfig,
        layout: World,
        player_name: &str,
        player_color: &str,
        persistence: Box<dyn PersistenceGateway>,
        scores: Option<Box<dyn ScoreReporter>>,
    ) -> Self {
        let player = Player {
            position: layout.start_position,
            size: Vec2 {
                x: config.player_size,
                y: config.player_size,
            },
            speed: config.player_speed,
            name: player_name.to_string(),
            color: player_color.to_string(),
        };
        Self {
            config,
            world: layout.clone(),
            current_region: layout.start_region,
            layout,
            player,
            game_time: 0.0,
            collect_flash: 0.0,
            paused: false,
            won: false,
            persistence,
            scores,
        }
    }

    /// Builds a session and resumes the player's saved progress when the
    /// gateway has any. A failed load starts fresh.
    pub(crate) fn start(
        config: SessionConfig,
        layout: World,
        player_name: &str,
        player_color: &str,
        persistence: Box<dyn PersistenceGateway>,
        scores: Option<Box<dyn ScoreReporter>>,
    ) -> Self {
        let mut session = Self::new(
            config,
            layout,
            player_name,
            player_color,
            persistence,
            scores,
        );
        let restored = match session.persistence.load(player_name) {
            Ok(Some(snapshot)) => {
                session.restore(&snapshot);
                true
            }
            Ok(None) => false,
            Err(error) => {
                warn!(player = player_name, error = %error, "save_load_failed");
                false
            }
        };
        info!(
            player = player_name,
            region = session.current_region,
            restored,
            remaining_seeds = session.world.remaining_collectibles(),
            "session_started"
        );
        session
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(
            &self.world,
            &self.player,
            self.current_region,
            self.game_time,
        )
    }

    /// Replaces all progress with `snapshot`, applied to a fresh copy of the
    /// layout. Parts that do not fit are skipped and returned. A snapshot that
    /// already meets the goal leaves the session won and paused.
    pub(crate) fn restore(&mut self, snapshot: &SessionSnapshot) -> Vec<RestoreIssue> {
        let mut world = self.layout.clone();
        let mut player = self.player.clone();
        player.position = world.start_position;

        let restored = snapshot.restore_into(&mut world, &mut player);
        for issue in &restored.issues {
            warn!(player = %self.player.name, issue = %issue, "snapshot_restore_skipped");
        }

        self.world = world;
        self.player = player;
        self.current_region = restored.region;
        self.game_time = restored.game_time;
        self.collect_flash = 0.0;
        // A save written on the winning tick resumes as already won, so the
        // completion is never reported twice.
        self.won = self.has_reached_goal();
        self.paused = self.won;
        if self.won {
            info!(player = %self.player.name, "session_restored_won");
        }
        restored.issues
    }

    pub(crate) fn tick(&mut self, dt: f32, intent: &Intent) -> TickReport {
        let mut report = TickReport::default();
        if self.paused {
            return report;
        }
        let mut save_requested = false;
        let region_id = self.current_region;

        if let Some(region) = self.world.regions.get_mut(region_id) {
            let delta = intent
                .movement
                .normalized_or_zero()
                .scaled(self.player.speed * dt);
            let movement = resolve_movement(&mut self.player, region, delta);
            if let Some(index) = movement.pushed_crate {
                debug!(
                    region = region_id,
                    crate_index = index,
                    dx = movement.applied.x,
                    dy = movement.applied.y,
                    "crate_pushed"
                );
            } else if movement.blocked_x || movement.blocked_y {
                trace!(
                    region = region_id,
                    blocked_x = movement.blocked_x,
                    blocked_y = movement.blocked_y,
                    "movement_blocked"
                );
            }
        }

        self.game_time += f64::from(dt);
        self.collect_flash = (self.collect_flash - dt).max(0.0);

        let player_rect = self.player.rect();
        if let Some(region) = self.world.regions.get_mut(region_id) {
            let collected = collect_seeds(
                region,
                &player_rect,
                dt * self.config.seed_spin_radians_per_second,
            );
            for index in collected {
                info!(
                    region = region_id,
                    seed = index,
                    remaining = region.remaining_collectibles(),
                    "seed_collected"
                );
                report.events.push(SessionEvent::SeedCollected {
                    region: region_id,
                    index,
                });
                self.collect_flash = self.config.collect_flash_seconds;
                save_requested = true;
            }

            if let Some(kind) = update_puzzle(region, player_rect, intent.interact_pressed) {
                info!(region = region_id, kind = kind.as_token(), "puzzle_solved");
                report.events.push(SessionEvent::PuzzleSolved {
                    region: region_id,
                    kind,
                });
                save_requested = true;
            }
        }

        match resolve_transition(
            &mut self.player,
            region_id,
            &self.world.regions,
            &self.world.graph,
            self.config.transition_inset,
        ) {
            TransitionOutcome::Stayed => {}
            TransitionOutcome::Clamped(edge) => {
                debug!(region = region_id, edge = edge.as_token(), "world_edge_clamped");
            }
            TransitionOutcome::Entered { from, to, via } => {
                self.current_region = to;
                self.collect_flash = 0.0;
                info!(from, to, via = via.as_token(), "region_changed");
                report
                    .events
                    .push(SessionEvent::RegionChanged { from, to, via });
                save_requested = true;
            }
        }

        if !self.won && self.has_reached_goal() {
            let completion_time_ms = self.completion_time_ms();
            self.won = true;
            self.paused = true;
            info!(
                player = %self.player.name,
                completion_time_ms,
                "game_won"
            );
            self.report_completion(completion_time_ms);
            report.events.push(SessionEvent::Won { completion_time_ms });
            save_requested = true;
        }

        if save_requested {
            report.saved = self.save_now();
        }
        report
    }

    fn has_reached_goal(&self) -> bool {
        if self.current_region != self.world.terminal_region || !self.world.all_collected() {
            return false;
        }
        self.world
            .landmark()
            .is_some_and(|landmark| overlaps(&self.player.rect(), &landmark))
    }

    fn completion_time_ms(&self) -> u64 {
        (self.game_time * 1000.0).round().max(0.0) as u64
    }

    fn report_completion(&mut self, completion_time_ms: u64) {
        let Some(scores) = self.scores.as_mut() else {
            return;
        };
        let record = CompletionRecord {
            player_name: self.player.name.clone(),
            completion_time_ms,
        };
        if let Err(error) = scores.report(&record) {
            warn!(error = %error, "score_report_failed");
        }
    }

    fn save_now(&mut self) -> bool {
        let snapshot = self.snapshot();
        match self.persistence.save(&snapshot) {
            Ok(()) => true,
            Err(error) => {
                warn!(player = %self.player.name, error = %error, "save_failed");
                false
            }
        }
    }

    pub(crate) fn is_won(&self) -> bool {
        self.won
    }

    pub(crate) fn player(&self) -> &Player {
        &self.player
    }

    pub(crate) fn current_region(&self) -> RegionId {
        self.current_region
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn game_time(&self) -> f64 {
        self.game_time
    }
}

/// Controls for an interactive front end; the headless host never pauses or
/// teleports.
#[allow(dead_code)]
impl GameSession {
    pub(crate) fn pause(&mut self) {
        self.paused = true;
    }

    /// No effect once the game is won.
    pub(crate) fn resume(&mut self) {
        if !self.won {
            self.paused = false;
        }
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    /// Seconds left on the collection flash; zero when idle.
    pub(crate) fn collect_flash(&self) -> f32 {
        self.collect_flash
    }

    /// Debug placement. Rejects unknown regions and non-finite positions.
    pub(crate) fn place_player(&mut self, region: RegionId, position: Vec2) -> bool {
        if region >= self.world.regions.len() || !position.is_finite() {
            return false;
        }
        self.current_region = region;
        self.player.position = position;
        true
    }
}

impl Simulation for GameSession {
    fn tick(&mut self, fixed_dt_seconds: f32, intent: &Intent) -> TickControl {
        GameSession::tick(self, fixed_dt_seconds, intent);
        if self.won {
            TickControl::Stop
        } else {
            TickControl::Continue
        }
    }
}

/// Marks every uncollected seed under the player and spins the rest.
fn collect_seeds(region: &mut Region, player_rect: &Rect, spin: f32) -> Vec<usize> {
    let mut collected = Vec::new();
    for (index, seed) in region.collectibles.iter_mut().enumerate() {
        if seed.collected {
            continue;
        }
        seed.anim_phase = (seed.anim_phase + spin).rem_euclid(TAU);
        if overlaps(player_rect, &seed.rect()) {
            seed.collected = true;
            collected.push(index);
        }
    }
    collected
}

/// Runs the region's puzzle for one tick and syncs its gate. Returns the kind
/// on the tick the puzzle becomes solved.
fn update_puzzle(region: &mut Region, player: Rect, interact_pressed: bool) -> Option<PuzzleKind> {
    let region_id = region.id;
    let crates = region.crate_rects();
    let solved_kind = region.puzzle.as_mut().and_then(|puzzle| {
        let was_solved = puzzle.is_solved();
        let ctx = PuzzleContext {
            player,
            crates: &crates,
            interact_pressed,
        };
        match puzzle.update(&ctx) {
            Some(PuzzleEvent::SequenceAdvanced { next_index }) => {
                debug!(region = region_id, next_index, "sequence_advanced");
            }
            Some(PuzzleEvent::SequenceReset) => debug!(region = region_id, "sequence_reset"),
            Some(PuzzleEvent::SwitchToggled { index, active }) => {
                debug!(region = region_id, switch = index, active, "switch_toggled");
            }
            Some(PuzzleEvent::Solved) | None => {}
        }
        (!was_solved && puzzle.is_solved()).then(|| puzzle.kind())
    });
    region.sync_gate();
    solved_kind
}
