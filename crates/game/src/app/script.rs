use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use engine::{InputAction, Intent, IntentCollector};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("failed to read intent script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read intent script from stdin: {0}")]
    ReadStdin(#[source] io::Error),
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: `{command}` needs a tick count")]
    MissingTicks { line: usize, command: String },
    #[error("line {line}: `{value}` is not a tick count")]
    InvalidTicks { line: usize, value: String },
    #[error("line {line}: unexpected `{token}`")]
    TrailingInput { line: usize, token: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScriptStep {
    Hold { actions: Vec<InputAction>, ticks: u32 },
    Interact,
    Wait { ticks: u32 },
}

impl ScriptStep {
    fn ticks(&self) -> u32 {
        match self {
            ScriptStep::Hold { ticks, .. } | ScriptStep::Wait { ticks } => *ticks,
            ScriptStep::Interact => 1,
        }
    }
}

/// A scripted stand-in for the keyboard: each step holds actions for some
/// ticks and the collector turns them into per-tick intents.
#[derive(Debug)]
pub(crate) struct IntentScript {
    steps: Vec<ScriptStep>,
    step: usize,
    ticks_into_step: u32,
    collector: IntentCollector,
}

impl IntentScript {
    pub(crate) fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            step: 0,
            ticks_into_step: 0,
            collector: IntentCollector::new(),
        }
    }

    pub(crate) fn total_ticks(&self) -> u64 {
        self.steps.iter().map(|step| u64::from(step.ticks())).sum()
    }

    fn hold_only(&mut self, held: &[InputAction]) {
        for action in [
            InputAction::MoveUp,
            InputAction::MoveDown,
            InputAction::MoveLeft,
            InputAction::MoveRight,
            InputAction::Interact,
        ] {
            self.collector.set_action(action, held.contains(&action));
        }
    }
}

impl Iterator for IntentScript {
    type Item = Intent;

    fn next(&mut self) -> Option<Intent> {
        while self
            .steps
            .get(self.step)
            .is_some_and(|step| self.ticks_into_step >= step.ticks())
        {
            self.step += 1;
            self.ticks_into_step = 0;
        }
        let step = self.steps.get(self.step)?.clone();

        match step {
            ScriptStep::Hold { actions, .. } => self.hold_only(&actions),
            ScriptStep::Interact => {
                // Release first so back-to-back interacts each register a press.
                self.hold_only(&[]);
                self.hold_only(&[InputAction::Interact]);
            }
            ScriptStep::Wait { .. } => self.hold_only(&[]),
        }
        self.ticks_into_step += 1;
        Some(self.collector.intent_for_tick())
    }
}

/// Script from `path`, or stdin when no path is given.
pub(crate) fn load_script(path: Option<&Path>) -> Result<IntentScript, ScriptError> {
    let raw = match path {
        Some(path) => fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?,
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .map_err(ScriptError::ReadStdin)?;
            raw
        }
    };
    parse_script(&raw).map(IntentScript::new)
}

/// Parses `<dir>[+<dir>] <ticks>`, `interact` and `wait <ticks>` lines.
/// Everything after `#` is a comment.
pub(crate) fn parse_script(raw: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut steps = Vec::new();
    for (index, full_line) in raw.lines().enumerate() {
        let line = index + 1;
        let content = full_line
            .split_once('#')
            .map_or(full_line, |(before, _)| before);
        let mut tokens = content.split_whitespace();
        let Some(command) = tokens.next() else {
            continue;
        };

        let step = match command {
            "interact" => ScriptStep::Interact,
            "wait" => ScriptStep::Wait {
                ticks: parse_ticks(line, command, tokens.next())?,
            },
            _ => ScriptStep::Hold {
                actions: parse_directions(line, command)?,
                ticks: parse_ticks(line, command, tokens.next())?,
            },
        };
        if let Some(token) = tokens.next() {
            return Err(ScriptError::TrailingInput {
                line,
                token: token.to_string(),
            });
        }
        steps.push(step);
    }
    Ok(steps)
}

fn parse_directions(line: usize, command: &str) -> Result<Vec<InputAction>, ScriptError> {
    command
        .split('+')
        .map(|direction| match direction {
            "up" => Ok(InputAction::MoveUp),
            "down" => Ok(InputAction::MoveDown),
            "left" => Ok(InputAction::MoveLeft),
            "right" => Ok(InputAction::MoveRight),
            _ => Err(ScriptError::UnknownCommand {
                line,
                command: command.to_string(),
            }),
        })
        .collect()
}

fn parse_ticks(line: usize, command: &str, token: Option<&str>) -> Result<u32, ScriptError> {
    let token = token.ok_or_else(|| ScriptError::MissingTicks {
        line,
        command: command.to_string(),
    })?;
    token.parse::<u32>().map_err(|_| ScriptError::InvalidTicks {
        line,
        value: token.to_string(),
    })
}
