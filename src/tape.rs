//! A bi-infinite tape. Only the written region is materialized; every other cell reads
//! as the blank symbol.

use std::collections::VecDeque;

use crate::types::{Symbol, TapeWindow};

#[derive(Debug, Clone, PartialEq)]
pub struct Tape {
    cells: VecDeque<Symbol>,
    /// Absolute position of `cells[0]`.
    origin: i64,
    blank: Symbol,
}

impl Tape {
    /// Creates an all-blank tape.
    pub fn new(blank: Symbol) -> Self {
        Self {
            cells: VecDeque::new(),
            origin: 0,
            blank,
        }
    }

    /// Creates a tape holding `symbols` from position 0 onwards.
    pub fn with_symbols(symbols: impl IntoIterator<Item = Symbol>, blank: Symbol) -> Self {
        Self {
            cells: symbols.into_iter().collect(),
            origin: 0,
            blank,
        }
    }

    /// Parses initial tape contents.
    ///
    /// Input containing a comma is split on commas, each trimmed field being one symbol.
    /// An empty field is a blank cell. Otherwise every non-whitespace character is one
    /// symbol. `_` stands for the blank symbol in either form.
    pub fn from_input(input: &str, blank: Symbol) -> Self {
        let to_symbol = |token: &str| {
            if token.is_empty() || token == crate::types::DEFAULT_BLANK_SYMBOL {
                blank.clone()
            } else {
                Symbol::from(token)
            }
        };

        let symbols: Vec<Symbol> = if input.contains(',') {
            input.split(',').map(|field| to_symbol(field.trim())).collect()
        } else {
            input
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| to_symbol(&c.to_string()))
                .collect()
        };

        Self::with_symbols(symbols, blank)
    }

    pub fn blank(&self) -> &Symbol {
        &self.blank
    }

    /// Reads the symbol at `position`. Never-written cells read as blank.
    pub fn read(&self, position: i64) -> &Symbol {
        self.index(position)
            .and_then(|index| self.cells.get(index))
            .unwrap_or(&self.blank)
    }

    /// Writes `symbol` at `position`, growing the materialized region as needed.
    pub fn write(&mut self, position: i64, symbol: Symbol) {
        if let Some(index) = self.index(position).filter(|&i| i < self.cells.len()) {
            self.cells[index] = symbol;
            return;
        }

        // Blank cells outside the region already read as blank.
        if symbol == self.blank {
            return;
        }

        if self.cells.is_empty() {
            self.origin = position;
            self.cells.push_back(symbol);
        } else if position < self.origin {
            for _ in position + 1..self.origin {
                self.cells.push_front(self.blank.clone());
            }
            self.cells.push_front(symbol);
            self.origin = position;
        } else {
            let end = self.origin + self.cells.len() as i64;
            for _ in end..position {
                self.cells.push_back(self.blank.clone());
            }
            self.cells.push_back(symbol);
        }
    }

    /// The materialized region, widened to include `head`.
    pub fn window(&self, head: i64) -> TapeWindow {
        let (start, end) = if self.cells.is_empty() {
            (head, head + 1)
        } else {
            let end = self.origin + self.cells.len() as i64;
            (self.origin.min(head), end.max(head + 1))
        };

        self.range(start, end)
    }

    /// The materialized cells with leading and trailing blanks trimmed.
    pub fn contents(&self) -> Vec<Symbol> {
        let first = self.cells.iter().position(|s| *s != self.blank);
        let last = self.cells.iter().rposition(|s| *s != self.blank);

        match (first, last) {
            (Some(first), Some(last)) => self.cells.range(first..=last).cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn range(&self, start: i64, end: i64) -> TapeWindow {
        TapeWindow {
            start,
            cells: (start..end).map(|p| self.read(p).clone()).collect(),
        }
    }

    fn index(&self, position: i64) -> Option<usize> {
        usize::try_from(position - self.origin).ok()
    }
}
