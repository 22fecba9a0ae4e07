use std::process::ExitCode;

use engine::run_loop;
use tracing::{error, info};

use super::bootstrap::{build_app, LaunchOptions};

pub(crate) fn run(options: LaunchOptions) -> ExitCode {
    let mut app = match build_app(options) {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let summary = run_loop(&app.config, &mut app.session, &mut app.script);
    let world = app.session.world();
    info!(
        player = %app.session.player().name,
        ticks_run = summary.ticks_run,
        exit = ?summary.exit,
        won = app.session.is_won(),
        region = app.session.current_region(),
        remaining_seeds = world.remaining_collectibles(),
        total_seeds = world.total_collectibles(),
        game_time_s = app.session.game_time(),
        "session_finished"
    );

    // Dropping the session drains the background writers before exit.
    drop(app);
    ExitCode::SUCCESS
}
