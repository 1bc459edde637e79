//! Property-based tests for the parser, tape and machine.
//!
//! Programs are generated as source text over a small alphabet so every property also
//! goes through the parser.

use proptest::prelude::*;
use proptest::sample::Index;
use quint::{parse, Direction, MachineError, Outcome, ParseError, Symbol, Tape, TuringMachine};

const STATES: [&str; 4] = ["q0", "q1", "q2", "q3"];
const TARGETS: [&str; 5] = ["q0", "q1", "q2", "q3", "h"];
const SYMBOLS: [&str; 3] = ["0", "1", "_"];
const ALIASES: [&str; 3] = ["zero", "one", "empty"];
const LIMIT: usize = 200;

/// One generated rule: next state index, written symbol index, direction offset.
type Rule = (usize, usize, i64);

prop_compose! {
    fn arbitrary_rule()(next in 0..TARGETS.len(), write in 0..SYMBOLS.len(), offset in -1i64..=1) -> Rule {
        (next, write, offset)
    }
}

prop_compose! {
    /// Rules for every `(state, symbol)` key, some of them missing. The first key always
    /// has a rule so the program is never empty.
    fn arbitrary_rules()(
        first in arbitrary_rule(),
        rest in proptest::collection::vec(proptest::option::of(arbitrary_rule()), STATES.len() * SYMBOLS.len() - 1),
    ) -> Vec<Option<Rule>> {
        std::iter::once(Some(first)).chain(rest).collect()
    }
}

fn rule_lines(rules: &[Option<Rule>], symbols: &[&str]) -> Vec<String> {
    rules
        .iter()
        .enumerate()
        .filter_map(|(key, rule)| {
            let (next, write, offset) = (*rule)?;
            Some(format!(
                "{}, {}, {}, {}, {}",
                STATES[key / SYMBOLS.len()],
                symbols[key % SYMBOLS.len()],
                TARGETS[next],
                symbols[write],
                offset
            ))
        })
        .collect()
}

fn source(rules: &[Option<Rule>]) -> String {
    let mut lines = vec!["init: q0".to_string(), "halt: h".to_string()];
    lines.extend(rule_lines(rules, &SYMBOLS));
    lines.join("\n")
}

fn aliased_source(rules: &[Option<Rule>]) -> String {
    let mut lines = vec!["init: q0".to_string(), "halt: h".to_string()];
    for (alias, symbol) in ALIASES.iter().zip(SYMBOLS) {
        lines.push(format!("{alias}: {symbol}"));
    }
    lines.extend(rule_lines(rules, &ALIASES));
    lines.join("\n")
}

fn machine(rules: &[Option<Rule>], input: &str) -> TuringMachine {
    let program = parse(&source(rules)).unwrap();
    TuringMachine::with_input(program, input)
}

proptest! {
    #[test]
    fn runs_are_deterministic(rules in arbitrary_rules(), input in "[01_]{0,6}") {
        let first = machine(&rules, &input).run(Some(LIMIT));
        let second = machine(&rules, &input).run(Some(LIMIT));

        prop_assert_eq!(first, second);
    }

    #[test]
    fn head_moves_never_exceed_steps(rules in arbitrary_rules(), input in "[01_]{0,6}") {
        let mut machine = machine(&rules, &input);
        let mut stays = 0;

        while machine.step_count() < LIMIT {
            match machine.step() {
                Ok(snapshot) => {
                    if snapshot.rule.map(|rule| rule.direction) == Some(Direction::Stay) {
                        stays += 1;
                    }
                }
                Err(_) => break,
            }
        }

        prop_assert!(machine.head_moves() <= machine.step_count());
        prop_assert_eq!(machine.head_moves() + stays, machine.step_count());
        prop_assert_eq!(machine.path().len(), machine.step_count() + 1);
    }

    #[test]
    fn stepping_matches_run(
        rules in arbitrary_rules(),
        input in "[01_]{0,6}",
        limit in 0..LIMIT,
        extra in 0..10usize,
    ) {
        let mut stepped = machine(&rules, &input);
        let outcome = loop {
            if stepped.is_halted() {
                break Outcome::Halted;
            }
            if stepped.step_count() == limit {
                break Outcome::StepLimitExceeded { limit };
            }
            match stepped.step() {
                Ok(_) => {}
                Err(MachineError::UndefinedTransition { state, symbol, .. }) => {
                    break Outcome::Stuck { state, symbol };
                }
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }
        };

        let report = machine(&rules, &input).run(Some(limit));
        prop_assert_eq!(&report.outcome, &outcome);
        prop_assert_eq!(&report.snapshot, &stepped.snapshot());

        if !matches!(outcome, Outcome::StepLimitExceeded { .. }) {
            // A larger limit changes nothing once the run ends on its own.
            let relaxed = machine(&rules, &input).run(Some(limit + extra));
            prop_assert_eq!(relaxed, report);
        }
    }

    #[test]
    fn aliases_are_transparent(rules in arbitrary_rules()) {
        let literal = parse(&source(&rules)).unwrap();
        let aliased = parse(&aliased_source(&rules)).unwrap();

        prop_assert_eq!(literal, aliased);
    }

    #[test]
    fn duplicate_keys_are_rejected_in_any_order(
        rules in arbitrary_rules(),
        duplicate in arbitrary_rule(),
        which in any::<Index>(),
        at in any::<Index>(),
    ) {
        let mut lines = rule_lines(&rules, &SYMBOLS);
        let original = lines[which.index(lines.len())].clone();
        let key: Vec<&str> = original.split(", ").take(2).collect();
        let line = format!(
            "{}, {}, {}, {}, {}",
            key[0], key[1], TARGETS[duplicate.0], SYMBOLS[duplicate.1], duplicate.2
        );
        lines.insert(at.index(lines.len() + 1), line);

        let result = parse(&lines.join("\n"));
        prop_assert!(
            matches!(
                &result,
                Err(ParseError::AmbiguousTransition { state, symbol, .. })
                    if state.as_str() == key[0] && symbol.as_str() == key[1]
            ),
            "unexpected result {:?}",
            result
        );
    }

    #[test]
    fn blank_tape_is_idempotent(
        writes in proptest::collection::vec((-20i64..20, "[01]"), 0..10),
        blank_at in -40i64..40,
        probes in proptest::collection::vec(-60i64..60, 1..20),
    ) {
        let blank = Symbol::from("_");
        let mut tape = Tape::new(blank.clone());
        for (position, symbol) in &writes {
            tape.write(*position, Symbol::from(symbol.as_str()));
        }

        let written = |position: i64| writes.iter().any(|(p, _)| *p == position);
        for probe in &probes {
            if !written(*probe) {
                prop_assert_eq!(tape.read(*probe), &blank);
            }
        }

        if tape.read(blank_at) == &blank {
            let before: Vec<Symbol> = probes.iter().map(|p| tape.read(*p).clone()).collect();
            tape.write(blank_at, blank.clone());
            let after: Vec<Symbol> = probes.iter().map(|p| tape.read(*p).clone()).collect();

            prop_assert_eq!(before, after);
        }
    }
}
