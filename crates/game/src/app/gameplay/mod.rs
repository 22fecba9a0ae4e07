mod content;
mod gateways;
mod graph;
mod movement;
mod puzzles;
mod session;
mod snapshot;
mod transition;
mod types;

pub(crate) use content::build_world;
pub(crate) use gateways::{
    AvatarGateway, CompletionRecord, FileAvatarGateway, FileSaveGateway, PersistenceGateway,
    PlayerIdentity, ScoreLogReporter, ScoreReporter,
};
pub(crate) use session::{GameSession, SessionConfig, SessionEvent, TickReport};

const TILE_SIZE: f32 = 32.0;
const REGION_COLS: u32 = 25;
const REGION_ROWS: u32 = 18;
const PLAYER_SIZE: f32 = 24.0;
const PLAYER_SPEED_PX_PER_SECOND: f32 = 160.0;
const COLLECTIBLE_SIZE: f32 = 16.0;
const CRATE_SIZE: f32 = 32.0;
const TRANSITION_INSET: f32 = 2.0;
const COLLECT_FLASH_SECONDS: f32 = 0.4;
const SEED_SPIN_RADIANS_PER_SECOND: f32 = 3.0;
const DEFAULT_PLAYER_NAME: &str = "wanderer";
const DEFAULT_PLAYER_COLOR: &str = "#f4d35e";
