//! This module provides the parser for quintuple programs, utilizing the `pest` crate.
//! The grammar lives in `grammar.pest`; this module turns its parse tree into a validated
//! `Program`, resolving aliases and configuration lines along the way.

use crate::{
    analyzer::validate,
    types::{
        Direction, ParseError, Program, State, Symbol, Transition, TransitionTable,
        DEFAULT_BLANK_SYMBOL, DEFAULT_HALT_STATE, DEFAULT_INIT_STATE, WILDCARD_SYMBOL,
    },
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashMap;

/// Derives a `PestParser` for the quintuple grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct QuintupleParser;

/// Defaults applied to programs that don't declare their own configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Start state when there is no `init:` line. Defaults to `1`.
    pub init: State,
    /// Halt state when there is no `halt:` line. Defaults to `0`.
    pub halt: State,
    /// Blank symbol. `_` in the source always denotes it. Defaults to `_`.
    pub blank: Symbol,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            init: State::from(DEFAULT_INIT_STATE),
            halt: State::from(DEFAULT_HALT_STATE),
            blank: Symbol::from(DEFAULT_BLANK_SYMBOL),
        }
    }
}

/// Parses the given source text into a `Program` using the default options.
///
/// # Returns
///
/// * `Ok(Program)` if the source is successfully parsed and validated.
/// * `Err(ParseError::Syntax)` for malformed lines, naming the offending line.
/// * `Err(ParseError::AmbiguousTransition)` if two quintuples share a `(state, symbol)` key.
/// * `Err(ParseError::DuplicateConfig)` if `init:` or `halt:` is declared twice.
/// * `Err(ParseError::EmptyProgram)` if the source contains no quintuples.
pub fn parse(input: &str) -> Result<Program, ParseError> {
    parse_with(input, &ParserOptions::default())
}

/// Parses the given source text into a `Program`, falling back to `options` for anything
/// the source doesn't configure itself.
pub fn parse_with(input: &str, options: &ParserOptions) -> Result<Program, ParseError> {
    let root = QuintupleParser::parse(Rule::program, input)
        .map_err(|e| ParseError::Syntax(Box::new(e)))?
        .next()
        .ok_or(ParseError::EmptyProgram)?;

    let program = parse_program(root, options)?;

    validate(&program)?;

    log::debug!(
        "Parsed program: {} transitions, init {}, halt {}",
        program.rules.len(),
        program.initial_state,
        program.halt_state
    );

    Ok(program)
}

/// Parses the top-level `Rule::program` pair line by line.
fn parse_program(pair: Pair<Rule>, options: &ParserOptions) -> Result<Program, ParseError> {
    let mut context = Context::new(options);

    for line in pair.into_inner() {
        if line.as_rule() != Rule::line {
            continue; // EOI
        }

        let Some(inner) = line.into_inner().next() else {
            continue; // Blank or comment-only line
        };

        match inner.as_rule() {
            Rule::declaration => context.declaration(inner)?,
            Rule::quintuple => context.quintuple(inner)?,
            _ => {}
        }
    }

    Ok(context.finish())
}

/// State accumulated while walking the lines of a program.
struct Context<'o> {
    options: &'o ParserOptions,
    init: Option<(State, usize)>,
    halt: Option<(State, usize)>,
    /// Alias name -> (symbol, declaration line).
    aliases: HashMap<String, (Symbol, usize)>,
    /// First line each literal symbol token was used on.
    literals: HashMap<String, usize>,
    /// First line each `(state, symbol)` key was defined on.
    keys: HashMap<(State, Symbol), usize>,
    rules: TransitionTable,
}

impl<'o> Context<'o> {
    fn new(options: &'o ParserOptions) -> Self {
        Self {
            options,
            init: None,
            halt: None,
            aliases: HashMap::new(),
            literals: HashMap::new(),
            keys: HashMap::new(),
            rules: TransitionTable::new(),
        }
    }

    /// Handles `init: <state>`, `halt: <state>` and `<name>: <symbol>` lines.
    fn declaration(&mut self, pair: Pair<Rule>) -> Result<(), ParseError> {
        let line = pair.line_col().0;
        let mut pairs = pair.into_inner();
        let (Some(name), Some(value)) = (pairs.next(), pairs.next()) else {
            return Ok(());
        };

        let key = name.as_str().to_ascii_lowercase();
        match key.as_str() {
            "init" => check_unique_config(&mut self.init, "init", value.as_str(), line),
            "halt" => check_unique_config(&mut self.halt, "halt", value.as_str(), line),
            _ => self.declare_alias(name, value, line),
        }
    }

    fn declare_alias(
        &mut self,
        name: Pair<Rule>,
        value: Pair<Rule>,
        line: usize,
    ) -> Result<(), ParseError> {
        let alias = name.as_str();

        if alias == DEFAULT_BLANK_SYMBOL || alias == WILDCARD_SYMBOL {
            return Err(parse_error(
                &format!("Reserved symbol '{alias}' cannot be used as an alias name"),
                name.as_span(),
            ));
        }

        if let Some((_, first_line)) = self.aliases.get(alias) {
            return Err(ParseError::DuplicateAlias {
                name: alias.to_string(),
                line,
                first_line: *first_line,
            });
        }

        // The token already meant a literal symbol on an earlier line.
        if let Some(used_on) = self.literals.get(alias) {
            return Err(ParseError::UndeclaredAlias {
                name: alias.to_string(),
                line: *used_on,
                declared_on: line,
            });
        }

        let symbol = self.literal(value.as_str());
        self.aliases.insert(alias.to_string(), (symbol, line));

        Ok(())
    }

    /// Handles `state, symbol, state, symbol, direction` lines.
    fn quintuple(&mut self, pair: Pair<Rule>) -> Result<(), ParseError> {
        let span = pair.as_span();
        let line = pair.line_col().0;
        let fields: Vec<Pair<Rule>> = pair.into_inner().collect();

        let [state, read, next_state, write, direction] = fields.as_slice() else {
            return Err(parse_error(
                &format!(
                    "Expected 5 comma-separated fields (state, symbol, state, symbol, direction), found {}",
                    fields.len()
                ),
                span,
            ));
        };

        let transition = Transition {
            state: State::from(state.as_str()),
            read: self.resolve(read.as_str(), line),
            next_state: State::from(next_state.as_str()),
            write: self.resolve(write.as_str(), line),
            direction: parse_direction(direction)?,
        };

        let key = (transition.state.clone(), transition.read.clone());
        self.rules.insert(transition).map_err(|rejected| {
            ParseError::AmbiguousTransition {
                first_line: self.keys.get(&key).copied().unwrap_or(line),
                state: rejected.state,
                symbol: rejected.read,
                line,
            }
        })?;
        self.keys.insert(key, line);

        Ok(())
    }

    /// Resolves a symbol field: a declared alias, or else a literal symbol.
    fn resolve(&mut self, token: &str, line: usize) -> Symbol {
        if let Some((symbol, _)) = self.aliases.get(token) {
            return symbol.clone();
        }

        self.literals.entry(token.to_string()).or_insert(line);
        self.literal(token)
    }

    /// `_` always denotes the configured blank symbol.
    fn literal(&self, token: &str) -> Symbol {
        if token == DEFAULT_BLANK_SYMBOL {
            self.options.blank.clone()
        } else {
            Symbol::from(token)
        }
    }

    fn finish(self) -> Program {
        Program {
            initial_state: self
                .init
                .map(|(state, _)| state)
                .unwrap_or_else(|| self.options.init.clone()),
            halt_state: self
                .halt
                .map(|(state, _)| state)
                .unwrap_or_else(|| self.options.halt.clone()),
            blank: self.options.blank.clone(),
            rules: self.rules,
        }
    }
}

/// Parses a direction field: one of `-1`, `0` or `1`.
fn parse_direction(pair: &Pair<Rule>) -> Result<Direction, ParseError> {
    pair.as_str()
        .parse::<i64>()
        .ok()
        .and_then(|offset| Direction::try_from(offset).ok())
        .ok_or_else(|| {
            parse_error(
                &format!(
                    "Unsupported direction: {} (expected -1, 0 or 1)",
                    pair.as_str()
                ),
                pair.as_span(),
            )
        })
}

/// Creates a `ParseError::Syntax` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> ParseError {
    ParseError::Syntax(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Records a configuration value, rejecting a second declaration of the same key.
fn check_unique_config(
    slot: &mut Option<(State, usize)>,
    key: &str,
    value: &str,
    line: usize,
) -> Result<(), ParseError> {
    if let Some((_, first_line)) = slot {
        return Err(ParseError::DuplicateConfig {
            key: key.to_string(),
            line,
            first_line: *first_line,
        });
    }

    *slot = Some((State::from(value), line));

    Ok(())
}
