//! Interactive stepping on top of a cursor

use std::fmt;
use std::str::FromStr;

use sw_core::{Direction, Step, Visit};
use tracing::info;

use crate::cursors::SeismogramCursor;
use crate::CursorError;

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "v" | "next" => Ok(Command::Next),
            "p" | "r" | "prev" => Ok(Command::Prev),
            "q" | "quit" => Ok(Command::Quit),
            other => Err(format!("unknown command '{}', expected n, p or q", other)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Next => write!(f, "next"),
            Command::Prev => write!(f, "prev"),
            Command::Quit => write!(f, "quit"),
        }
    }
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Visit(Visit),
    /// Ran off the end in the requested direction
    Finished,
    Quit,
}

/// Drives a cursor one command at a time, passing over visits without data
pub struct Session<C> {
    cursor: C,
    current: Option<Visit>,
    visited: usize,
    skipped: usize,
}

impl<C: SeismogramCursor> Session<C> {
    pub fn new(cursor: C) -> Self {
        Self {
            cursor,
            current: None,
            visited: 0,
            skipped: 0,
        }
    }

    pub async fn apply(&mut self, command: Command) -> Result<Outcome, CursorError> {
        let direction = match command {
            Command::Next => Direction::Forward,
            Command::Prev => Direction::Backward,
            Command::Quit => return Ok(Outcome::Quit),
        };

        loop {
            match self.cursor.step(direction).await? {
                Step::End => {
                    info!("No more stations going {}", direction);
                    self.current = None;
                    return Ok(Outcome::Finished);
                }
                Step::Data(visit) if !visit.has_data() => {
                    info!("No data for {} for event {}", visit.station_label(), visit.event.describe());
                    self.skipped += 1;
                }
                Step::Data(visit) => {
                    self.visited += 1;
                    self.current = Some(visit.clone());
                    return Ok(Outcome::Visit(visit));
                }
            }
        }
    }

    /// The visit last returned, `None` before the first and after running off an end
    pub fn current(&self) -> Option<&Visit> {
        self.current.as_ref()
    }

    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Steps passed over for lack of data
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn cursor_mut(&mut self) -> &mut C {
        &mut self.cursor
    }

    pub fn into_cursor(self) -> C {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursors::testing::{event_at, visit, VecCursor};
    use std::sync::Arc;

    fn session() -> Session<VecCursor> {
        let e1 = Arc::new(event_at("e1", 0));
        Session::new(VecCursor::new(vec![
            visit(&e1, "S0", &["HHZ"]),
            visit(&e1, "S1", &[]),
            visit(&e1, "S2", &["HHZ"]),
        ]))
    }

    fn station(outcome: &Outcome) -> &str {
        match outcome {
            Outcome::Visit(visit) => &visit.station.code,
            Outcome::Finished => "finished",
            Outcome::Quit => "quit",
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("n".parse::<Command>(), Ok(Command::Next));
        assert_eq!(" V ".parse::<Command>(), Ok(Command::Next));
        assert_eq!("r".parse::<Command>(), Ok(Command::Prev));
        assert_eq!("prev".parse::<Command>(), Ok(Command::Prev));
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
        assert!("x".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn test_skips_empty_visits() {
        let mut session = session();
        let mut seen = Vec::new();
        for command in [Command::Next, Command::Next, Command::Next, Command::Prev, Command::Prev, Command::Prev] {
            seen.push(station(&session.apply(command).await.unwrap()).to_string());
        }
        assert_eq!(seen, vec!["S0", "S2", "finished", "S2", "S0", "finished"]);
        assert_eq!(session.visited(), 4);
        assert_eq!(session.skipped(), 2);
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn test_quit_leaves_position() {
        let mut session = session();
        session.apply(Command::Next).await.unwrap();
        assert_eq!(session.apply(Command::Quit).await.unwrap(), Outcome::Quit);
        assert_eq!(session.current().unwrap().station.code, "S0");
    }

    #[tokio::test]
    async fn test_error_propagates() {
        let mut session = session();
        session.apply(Command::Next).await.unwrap();
        *session.cursor_mut().failures.lock() = 1;
        assert!(session.apply(Command::Next).await.is_err());
        assert_eq!(station(&session.apply(Command::Next).await.unwrap()), "S2");
    }
}
