//! This crate provides the core logic for a quintuple Turing machine simulator.
//! It includes modules for parsing quintuple programs, analyzing them, simulating their
//! execution on an unbounded tape, driving runs through a renderer-agnostic controller,
//! and managing a collection of bundled programs.

pub mod analyzer;
pub mod controller;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the controller and the traits its frontends implement.
pub use controller::{
    Conclusion, Controller, ControllerSettings, Event, Frame, Input, Mode, Renderer,
};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `TuringMachine` struct from the machine module.
pub use machine::TuringMachine;
/// Re-exports the parsing entry points from the parser module.
pub use parser::{parse, parse_with, ParserOptions};
/// Re-exports `BundledProgram`, `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{BundledProgram, ProgramInfo, ProgramManager, PROGRAMS};
pub use tape::Tape;
/// Re-exports the core types from the types module.
pub use types::{
    Direction, MachineError, Outcome, ParseError, Program, QuintError, Report, Snapshot, State,
    Symbol, TapeWindow, Transition, TransitionTable, MAX_PROGRAM_SIZE,
};
