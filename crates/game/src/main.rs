mod app;

use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    match app::LaunchOptions::from_args(env::args_os().skip(1)) {
        Ok(options) => app::run(options),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
