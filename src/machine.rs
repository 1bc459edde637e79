//! This module defines the `TuringMachine` struct, which executes a quintuple program on a
//! single bi-infinite tape. It owns the runtime state (tape, head, current state, counters
//! and the visited state path) and exposes single-step and run-to-completion execution
//! sharing one deterministic transition core.

use std::convert::Infallible;

use crate::tape::Tape;
use crate::types::{
    MachineError, Outcome, Program, Report, Snapshot, State, Symbol, Transition,
};

/// Represents a single-tape Turing Machine executing a quintuple program.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    program: Program,
    initial_tape: Tape,
    tape: Tape,
    head: i64,
    state: State,
    step_count: usize,
    head_moves: usize,
    path: Vec<State>,
    rule: Option<Transition>,
}

impl TuringMachine {
    /// Creates a machine in the program's start state, with the head at position 0 of `tape`.
    pub fn new(program: Program, tape: Tape) -> Self {
        let state = program.initial_state.clone();

        Self {
            initial_tape: tape.clone(),
            tape,
            head: 0,
            path: vec![state.clone()],
            state,
            step_count: 0,
            head_moves: 0,
            rule: None,
            program,
        }
    }

    /// Creates a machine whose initial tape is parsed from `input` (see `Tape::from_input`).
    pub fn with_input(program: Program, input: &str) -> Self {
        let tape = Tape::from_input(input, program.blank.clone());
        Self::new(program, tape)
    }

    /// Executes a single transition.
    ///
    /// Reads the symbol under the head, looks up the rule for the current state, writes,
    /// changes state and moves the head.
    ///
    /// # Returns
    ///
    /// * `Ok(Snapshot)` with the updated machine state.
    /// * `Err(MachineError::UndefinedTransition)` if no rule matches. The machine is left
    ///   unchanged and the error carries a snapshot of it.
    /// * `Err(MachineError::AlreadyHalted)` if the machine is already in the halt state.
    pub fn step(&mut self) -> Result<Snapshot, MachineError> {
        self.advance()?;
        Ok(self.snapshot())
    }

    /// Steps until the halt state is reached, no rule matches, or `limit` steps have been
    /// executed by this call. `None` disables the limit.
    ///
    /// A machine already in the halt state reports `Outcome::Halted` without stepping.
    pub fn run(&mut self, limit: Option<usize>) -> Report {
        self.run_with(limit, |_| Ok::<(), Infallible>(()))
            .unwrap_or_else(|never| match never {})
    }

    /// Like `run`, calling `observer` after every executed step. An observer error stops
    /// the run and is returned as is.
    pub fn run_with<E>(
        &mut self,
        limit: Option<usize>,
        mut observer: impl FnMut(&Self) -> Result<(), E>,
    ) -> Result<Report, E> {
        let mut executed = 0;

        let outcome = loop {
            if let Some(outcome) = self.terminal_outcome(executed, limit) {
                break outcome;
            }

            match self.advance() {
                Ok(()) => executed += 1,
                Err(MachineError::UndefinedTransition { state, symbol, .. }) => {
                    break Outcome::Stuck { state, symbol };
                }
                Err(MachineError::AlreadyHalted { .. }) => break Outcome::Halted,
            }

            observer(self)?;
        };

        log::debug!(
            "Run finished: {} after {} steps ({} head moves)",
            outcome,
            self.step_count,
            self.head_moves
        );

        Ok(Report {
            outcome,
            snapshot: self.snapshot(),
        })
    }

    /// The outcome that ends a run before the next step, given `executed` steps so far.
    pub fn terminal_outcome(&self, executed: usize, limit: Option<usize>) -> Option<Outcome> {
        if self.is_halted() {
            return Some(Outcome::Halted);
        }

        limit
            .filter(|&limit| executed >= limit)
            .map(|limit| Outcome::StepLimitExceeded { limit })
    }

    /// The deterministic core shared by `step` and `run`. Doesn't capture a snapshot.
    pub(crate) fn advance(&mut self) -> Result<(), MachineError> {
        if self.is_halted() {
            return Err(MachineError::AlreadyHalted {
                state: self.state.clone(),
            });
        }

        let scanned = self.scanned().clone();
        let Some(transition) = self.transition().cloned() else {
            return Err(MachineError::UndefinedTransition {
                state: self.state.clone(),
                symbol: scanned,
                position: self.head,
                snapshot: Box::new(self.snapshot()),
            });
        };

        let write = if transition.write.is_wildcard() {
            scanned
        } else {
            transition.write.clone()
        };
        self.tape.write(self.head, write);

        let offset = transition.direction.offset();
        self.head += offset;
        if offset != 0 {
            self.head_moves += 1;
        }

        self.state = transition.next_state.clone();
        self.step_count += 1;
        self.path.push(self.state.clone());

        log::trace!(
            "step {}: {} -> state {}, head {}",
            self.step_count,
            transition,
            self.state,
            self.head
        );

        self.rule = Some(transition);

        Ok(())
    }

    /// Returns the rule that applies to the current state and scanned symbol, if any.
    pub fn transition(&self) -> Option<&Transition> {
        self.program
            .rules
            .lookup(self.state.as_str(), self.scanned().as_str())
    }

    /// Captures the current machine state for rendering.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            step_count: self.step_count,
            head_moves: self.head_moves,
            state: self.state.clone(),
            path: self.path.clone(),
            head: self.head,
            tape: self.tape.window(self.head),
            blank: self.program.blank.clone(),
            rule: self.rule.clone(),
        }
    }

    /// Resets the machine to its initial tape, state and counters.
    pub fn reset(&mut self) {
        self.tape = self.initial_tape.clone();
        self.head = 0;
        self.state = self.program.initial_state.clone();
        self.step_count = 0;
        self.head_moves = 0;
        self.path = vec![self.state.clone()];
        self.rule = None;
    }

    /// Replaces the tape and resets the machine, keeping the loaded program.
    pub fn load_tape(&mut self, tape: Tape) {
        self.initial_tape = tape;
        self.reset();
    }

    /// Returns `true` once the halt state has been reached.
    pub fn is_halted(&self) -> bool {
        self.state == self.program.halt_state
    }

    /// The symbol under the head.
    pub fn scanned(&self) -> &Symbol {
        self.tape.read(self.head)
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn head_moves(&self) -> usize {
        self.head_moves
    }

    /// The states visited so far, starting with the start state.
    pub fn path(&self) -> &[State] {
        &self.path
    }

    /// The transition applied by the most recent step.
    pub fn rule(&self) -> Option<&Transition> {
        self.rule.as_ref()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }
}
