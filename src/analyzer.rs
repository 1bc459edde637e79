//! This module provides functions for analyzing quintuple programs before execution.
//! An empty program is rejected outright; the remaining findings are authoring hints
//! (a start state without rules, an unreachable halt state, dead states) that are logged
//! but don't prevent loading.

use crate::types::{ParseError, Program, State};
use std::collections::HashSet;
use std::fmt;

/// Represents the issues that can be found while analyzing a program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The program contains no quintuples.
    EmptyProgram,
    /// The start state has no rules, so the first step is always stuck.
    InvalidStartState(State),
    /// No transition ever enters the halt state.
    HaltNotReachable(State),
    /// States with rules that can't be reached from the start state.
    UnreachableStates(Vec<State>),
}

impl AnalysisError {
    /// The load-time error for findings that reject the program.
    pub fn as_fatal(&self) -> Option<ParseError> {
        match self {
            AnalysisError::EmptyProgram => Some(ParseError::EmptyProgram),
            _ => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.as_fatal().is_some()
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::EmptyProgram => write!(f, "Program contains no quintuples"),
            AnalysisError::InvalidStartState(state) => {
                write!(f, "Start state {state} has no rules")
            }
            AnalysisError::HaltNotReachable(state) => {
                write!(f, "Halt state {state} is never entered")
            }
            AnalysisError::UnreachableStates(states) => {
                let names: Vec<&str> = states.iter().map(State::as_str).collect();
                write!(f, "Unreachable states detected: {names:?}")
            }
        }
    }
}

/// Runs every check against `program` and returns all findings, fatal ones first.
pub fn analyze(program: &Program) -> Vec<AnalysisError> {
    let mut findings = [
        check_not_empty,
        check_valid_start_state,
        check_halt_reachable,
        check_unreachable_states,
    ]
    .iter()
    .filter_map(|f| f(program).err())
    .collect::<Vec<_>>();

    findings.sort_by_key(|finding| !finding.is_fatal());
    findings
}

/// Rejects programs with fatal findings and logs the rest as warnings.
pub fn validate(program: &Program) -> Result<(), ParseError> {
    let mut fatal = None;

    for finding in analyze(program) {
        match finding.as_fatal() {
            Some(error) => {
                fatal.get_or_insert(error);
            }
            None => log::warn!("{finding}"),
        }
    }

    fatal.map_or(Ok(()), Err)
}

fn check_not_empty(program: &Program) -> Result<(), AnalysisError> {
    if program.rules.is_empty() {
        return Err(AnalysisError::EmptyProgram);
    }

    Ok(())
}

/// Checks whether the start state has rules, unless it is also the halt state.
fn check_valid_start_state(program: &Program) -> Result<(), AnalysisError> {
    if !program.rules.is_empty()
        && program.initial_state != program.halt_state
        && !program.rules.has_state(program.initial_state.as_str())
    {
        return Err(AnalysisError::InvalidStartState(
            program.initial_state.clone(),
        ));
    }

    Ok(())
}

fn check_halt_reachable(program: &Program) -> Result<(), AnalysisError> {
    if program.rules.is_empty() || reachable(program).contains(&program.halt_state) {
        return Ok(());
    }

    Err(AnalysisError::HaltNotReachable(program.halt_state.clone()))
}

/// Checks for states whose rules are never consulted: states a traversal from the start
/// state never visits, and the halt state itself.
fn check_unreachable_states(program: &Program) -> Result<(), AnalysisError> {
    let visited = reachable(program);

    let mut unreachable: Vec<State> = program
        .rules
        .states()
        .filter(|state| !visited.contains(*state) || **state == program.halt_state)
        .cloned()
        .collect();

    if !unreachable.is_empty() {
        unreachable.sort(); // Sort for deterministic output
        return Err(AnalysisError::UnreachableStates(unreachable));
    }

    Ok(())
}

/// States reachable from the start state. Traversal stops at the halt state.
fn reachable(program: &Program) -> HashSet<State> {
    let mut visited = HashSet::new();
    let mut queue = vec![program.initial_state.clone()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state.clone()) || state == program.halt_state {
            continue;
        }

        for transition in program.rules.transitions_from(state.as_str()) {
            if !visited.contains(&transition.next_state) {
                queue.push(transition.next_state.clone());
            }
        }
    }

    visited
}
