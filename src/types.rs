//! This module defines the core data structures and types used throughout the quintuple
//! machine, including states, symbols, transitions, the transition table, execution
//! snapshots and outcomes, and the error types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// The default start state, used when a program has no `init:` line.
pub const DEFAULT_INIT_STATE: &str = "1";
/// The default halt state, used when a program has no `halt:` line.
pub const DEFAULT_HALT_STATE: &str = "0";
/// The default blank symbol, the value of every never-written tape cell.
pub const DEFAULT_BLANK_SYMBOL: &str = "_";
/// In the read position matches any symbol, in the write position keeps the scanned one.
pub const WILDCARD_SYMBOL: &str = "*";
/// The maximum allowed size for a program source in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB

/// An opaque machine state identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(String);

/// An opaque tape symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

macro_rules! token_type {
    ($name:ident) => {
        impl $name {
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(token: &str) -> Self {
                Self(token.to_string())
            }
        }

        impl From<String> for $name {
            fn from(token: String) -> Self {
                Self(token)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

token_type!(State);
token_type!(Symbol);

impl Symbol {
    /// Returns `true` for the wildcard symbol `*`.
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD_SYMBOL
    }
}

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left (`-1`).
    Left,
    /// Keep the head in the same position (`0`).
    Stay,
    /// Move the head one position to the right (`1`).
    Right,
}

impl Direction {
    /// The head position delta for this direction.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Stay => 0,
            Direction::Right => 1,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Direction::Left),
            0 => Ok(Direction::Stay),
            1 => Ok(Direction::Right),
            other => Err(other),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.offset())
    }
}

/// A single quintuple: `(state, read) -> (next_state, write, direction)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub state: State,
    pub read: Symbol,
    pub next_state: State,
    pub write: Symbol,
    pub direction: Direction,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {})",
            self.state, self.read, self.next_state, self.write, self.direction
        )
    }
}

/// The transition table. Keys `(state, read)` are unique by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionTable {
    rules: HashMap<State, HashMap<Symbol, Transition>>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a transition, handing it back if its `(state, read)` key is already taken.
    pub fn insert(&mut self, transition: Transition) -> Result<(), Transition> {
        let by_symbol = self.rules.entry(transition.state.clone()).or_default();
        if by_symbol.contains_key(&transition.read) {
            return Err(transition);
        }

        by_symbol.insert(transition.read.clone(), transition);
        Ok(())
    }

    /// Looks up the exact `(state, symbol)` entry.
    pub fn get(&self, state: &str, symbol: &str) -> Option<&Transition> {
        self.rules.get(state)?.get(symbol)
    }

    /// Looks up the rule that applies when `symbol` is scanned in `state`: the exact entry
    /// first, then the state's wildcard entry.
    pub fn lookup(&self, state: &str, symbol: &str) -> Option<&Transition> {
        let by_symbol = self.rules.get(state)?;
        by_symbol
            .get(symbol)
            .or_else(|| by_symbol.get(WILDCARD_SYMBOL))
    }

    /// Returns `true` if `state` has at least one outgoing rule.
    pub fn has_state(&self, state: &str) -> bool {
        self.rules.get(state).is_some_and(|rules| !rules.is_empty())
    }

    /// Iterates over the states that have outgoing rules.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.rules.keys()
    }

    /// Iterates over every transition in the table.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.rules.values().flat_map(|by_symbol| by_symbol.values())
    }

    /// Iterates over the transitions leaving `state`.
    pub fn transitions_from<'a>(&'a self, state: &str) -> impl Iterator<Item = &'a Transition> {
        self.rules
            .get(state)
            .into_iter()
            .flat_map(|by_symbol| by_symbol.values())
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A parsed and validated program: the transition table plus its resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The state the machine starts in.
    pub initial_state: State,
    /// The sole terminal state. No rules are consulted once it is reached.
    pub halt_state: State,
    /// The value of every never-written tape cell.
    pub blank: Symbol,
    pub rules: TransitionTable,
}

impl Program {
    /// Number of distinct states mentioned by the program, including start and halt.
    pub fn state_count(&self) -> usize {
        let mut states: Vec<&State> = self
            .rules
            .transitions()
            .flat_map(|t| [&t.state, &t.next_state])
            .chain([&self.initial_state, &self.halt_state])
            .collect();
        states.sort();
        states.dedup();
        states.len()
    }
}

/// A contiguous slice of the tape, starting at position `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeWindow {
    pub start: i64,
    pub cells: Vec<Symbol>,
}

impl TapeWindow {
    /// Returns the symbol at an absolute tape position, if it lies within the window.
    pub fn get(&self, position: i64) -> Option<&Symbol> {
        let index = usize::try_from(position.checked_sub(self.start)?).ok()?;
        self.cells.get(index)
    }

    /// The absolute position one past the last cell.
    pub fn end(&self) -> i64 {
        self.start + self.cells.len() as i64
    }
}

/// The machine state handed to a renderer after each step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub step_count: usize,
    pub head_moves: usize,
    pub state: State,
    /// Every state visited so far, starting with the start state.
    pub path: Vec<State>,
    pub head: i64,
    /// The materialized tape, always covering the head position.
    pub tape: TapeWindow,
    pub blank: Symbol,
    /// The transition applied by the most recent step.
    pub rule: Option<Transition>,
}

impl Snapshot {
    /// The symbol currently under the head.
    pub fn scanned(&self) -> &Symbol {
        self.tape.get(self.head).unwrap_or(&self.blank)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The halt state was reached.
    Halted,
    /// No rule matches the scanned symbol in the current state.
    Stuck { state: State, symbol: Symbol },
    /// The caller-supplied step limit was exhausted first.
    StepLimitExceeded { limit: usize },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Halted => write!(f, "Halted"),
            Outcome::Stuck { state, symbol } => {
                write!(f, "Stuck: no rule for state {state} with symbol {symbol}")
            }
            Outcome::StepLimitExceeded { limit } => {
                write!(f, "Step limit exceeded after {limit} steps")
            }
        }
    }
}

/// The final snapshot of a run together with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub outcome: Outcome,
    pub snapshot: Snapshot,
}

/// Errors detected while parsing a program. None of them leave a partial table behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Malformed line: bad syntax, wrong field count or an unparseable direction.
    #[error("Program parsing error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
    #[error("Line {line}: ambiguous transition for state {state} with symbol {symbol} (first defined on line {first_line})")]
    AmbiguousTransition {
        state: State,
        symbol: Symbol,
        line: usize,
        first_line: usize,
    },
    #[error("Line {line}: duplicate \"{key}:\" declaration (first declared on line {first_line})")]
    DuplicateConfig {
        key: String,
        line: usize,
        first_line: usize,
    },
    #[error("Line {line}: alias '{name}' is used before its declaration on line {declared_on}")]
    UndeclaredAlias {
        name: String,
        line: usize,
        declared_on: usize,
    },
    #[error("Line {line}: alias '{name}' is already declared on line {first_line}")]
    DuplicateAlias {
        name: String,
        line: usize,
        first_line: usize,
    },
    #[error("Program contains no quintuples")]
    EmptyProgram,
}

/// Errors reported by the machine while stepping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// The program is stuck. An expected outcome for incomplete programs.
    #[error("No rule found from state {state} with symbol {symbol} at position {position}")]
    UndefinedTransition {
        state: State,
        symbol: Symbol,
        position: i64,
        snapshot: Box<Snapshot>,
    },
    /// `step` was called after the halt state was reached.
    #[error("Machine already halted in state {state}")]
    AlreadyHalted { state: State },
}

/// Top-level error type of the crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuintError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Machine(#[from] MachineError),
    /// Indicates an error related to file system operations, such as reading program files.
    #[error("File error: {0}")]
    FileError(String),
    /// A renderer or input source failed.
    #[error("I/O error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(state: &str, read: &str, next: &str, write: &str) -> Transition {
        Transition {
            state: state.into(),
            read: read.into(),
            next_state: next.into(),
            write: write.into(),
            direction: Direction::Right,
        }
    }

    #[test]
    fn test_direction_from_offset() {
        assert_eq!(Direction::try_from(-1), Ok(Direction::Left));
        assert_eq!(Direction::try_from(0), Ok(Direction::Stay));
        assert_eq!(Direction::try_from(1), Ok(Direction::Right));
        assert_eq!(Direction::try_from(2), Err(2));
        assert_eq!(Direction::Left.to_string(), "-1");
    }

    #[test]
    fn test_direction_serialization() {
        let json = serde_json::to_string(&Direction::Left).unwrap();
        assert_eq!(json, "\"Left\"");
        let back: Direction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Direction::Left);
    }

    #[test]
    fn test_tokens_serialize_transparently() {
        let state = State::from("q1");
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"q1\"");
        assert_eq!(state, "q1");
    }

    #[test]
    fn test_table_rejects_duplicate_key() {
        let mut table = TransitionTable::new();
        assert!(table.insert(transition("a", "0", "b", "1")).is_ok());
        let rejected = table.insert(transition("a", "0", "c", "0")).unwrap_err();

        assert_eq!(rejected.next_state, "c");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a", "0").unwrap().next_state, "b");
    }

    #[test]
    fn test_table_lookup_prefers_exact_over_wildcard() {
        let mut table = TransitionTable::new();
        table.insert(transition("a", "*", "any", "*")).unwrap();
        table.insert(transition("a", "1", "one", "1")).unwrap();

        assert_eq!(table.lookup("a", "1").unwrap().next_state, "one");
        assert_eq!(table.lookup("a", "0").unwrap().next_state, "any");
        assert!(table.lookup("b", "0").is_none());
    }

    #[test]
    fn test_window_get() {
        let window = TapeWindow {
            start: -2,
            cells: vec!["a".into(), "b".into(), "c".into()],
        };

        assert_eq!(window.get(-2).unwrap(), "a");
        assert_eq!(window.get(0).unwrap(), "c");
        assert!(window.get(1).is_none());
        assert!(window.get(-3).is_none());
        assert_eq!(window.end(), 1);
    }

    #[test]
    fn test_error_display() {
        let error = MachineError::AlreadyHalted {
            state: "done".into(),
        };
        assert_eq!(error.to_string(), "Machine already halted in state done");

        let error: QuintError = ParseError::EmptyProgram.into();
        assert_eq!(error.to_string(), "Program contains no quintuples");
    }
}
