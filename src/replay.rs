//! Plain-text touch scripts, for driving a [`Session`] without a touchscreen.
//!
//! ```text
//! # two fingers, the second one slides
//! down 0 100 900
//! down 1 500 900
//! move 1 700 900
//! wait 250
//! up 0 100 900
//! cancel 1 700 900
//! ```
//!
//! `move` may carry several `ID X Y` triples, like a batched multitouch move.

use thiserror::Error;

use crate::host::HostRequests;
use crate::reminder::ManualClock;
use crate::session::Session;
use crate::touch::{PointerId, PointerSample, TouchEvent, TouchPhase};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}, column {column}: unknown command '{command}'")]
    UnknownCommand {
        line: usize,
        column: usize,
        command: String,
    },
    #[error("line {line}: '{command}' expects {expected}")]
    Arity {
        line: usize,
        command: String,
        expected: &'static str,
    },
    #[error("line {line}, column {column}: '{text}' is not a valid {what}")]
    BadNumber {
        line: usize,
        column: usize,
        text: String,
        what: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Touch(TouchEvent),
    /// Advance the clock, in ms.
    Wait(i64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub line: usize,
    pub action: Action,
}

/// Words of a line with their 1-based column.
fn tokens(line: &str) -> Vec<(usize, &str)> {
    line.split_whitespace()
        .map(|tok| (tok.as_ptr() as usize - line.as_ptr() as usize + 1, tok))
        .collect()
}

fn number<T: std::str::FromStr>(
    line: usize,
    (column, text): (usize, &str),
    what: &'static str,
) -> Result<T, ScriptError> {
    text.parse().map_err(|_| ScriptError::BadNumber {
        line,
        column,
        text: text.to_string(),
        what,
    })
}

fn pointers(line: usize, args: &[(usize, &str)]) -> Result<Vec<PointerSample>, ScriptError> {
    args.chunks_exact(3)
        .map(|c| {
            Ok(PointerSample {
                id: PointerId(number(line, c[0], "pointer id")?),
                x: number(line, c[1], "coordinate")?,
                y: number(line, c[2], "coordinate")?,
            })
        })
        .collect()
}

pub fn parse_script(text: &str) -> Result<Vec<Step>, ScriptError> {
    let mut steps = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let content = raw.split('#').next().unwrap_or("");
        let toks = tokens(content);
        let Some((&(column, command), args)) = toks.split_first() else {
            continue;
        };

        let arity = |expected| ScriptError::Arity {
            line,
            command: command.to_string(),
            expected,
        };

        let action = match command {
            "down" | "up" | "cancel" => {
                if args.len() != 3 {
                    return Err(arity("ID X Y"));
                }
                let phase = match command {
                    "down" => TouchPhase::Down,
                    "up" => TouchPhase::Up,
                    _ => TouchPhase::Cancel,
                };
                Action::Touch(TouchEvent {
                    phase,
                    pointers: pointers(line, args)?,
                })
            }
            "move" => {
                if args.is_empty() || args.len() % 3 != 0 {
                    return Err(arity("one or more ID X Y triples"));
                }
                Action::Touch(TouchEvent {
                    phase: TouchPhase::Move,
                    pointers: pointers(line, args)?,
                })
            }
            "wait" => {
                let [ms] = args else {
                    return Err(arity("a duration in ms"));
                };
                let ms: u32 = number(line, *ms, "duration")?;
                Action::Wait(i64::from(ms))
            }
            other => {
                return Err(ScriptError::UnknownCommand {
                    line,
                    column,
                    command: other.to_string(),
                })
            }
        };
        steps.push(Step { line, action });
    }

    Ok(steps)
}

/// Tally of what a replay asked of the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub touch_events: usize,
    pub redraws: usize,
    pub configs_opened: usize,
    pub tooltips_shown: usize,
}

/// Plays `steps` into `session`. `clock` must be the clock the session was built with.
/// `on_requests` sees every event that asked something of the host.
pub fn replay(
    session: &mut Session,
    clock: &ManualClock,
    steps: &[Step],
    mut on_requests: impl FnMut(&Step, HostRequests),
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();

    for step in steps {
        match &step.action {
            Action::Wait(ms) => clock.advance(*ms),
            Action::Touch(event) => {
                summary.touch_events += 1;
                let r = session.handle_touch(event);
                if r.contains(HostRequests::REDRAW) {
                    summary.redraws += 1;
                }
                if r.contains(HostRequests::OPEN_CONFIG) {
                    summary.configs_opened += 1;
                }
                if r.contains(HostRequests::SHOW_TOOLTIP) {
                    summary.tooltips_shown += 1;
                }
                if !r.is_empty() {
                    on_requests(step, r);
                }
            }
        }
    }

    summary
}
