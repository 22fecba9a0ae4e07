mod bootstrap;
mod gameplay;
mod loop_runner;
mod script;

pub(crate) use bootstrap::LaunchOptions;
pub(crate) use loop_runner::run;
