//! Programs bundled with the crate, addressable by name.

use crate::parser::parse;
use crate::types::{Program, QuintError};

/// A bundled program: its name, a sample input and the quintuple source.
#[derive(Debug, Clone, Copy)]
pub struct BundledProgram {
    pub name: &'static str,
    pub input: &'static str,
    pub source: &'static str,
}

const BUNDLED: [BundledProgram; 4] = [
    BundledProgram {
        name: "palindrome",
        input: "1,0,1,1,0,1",
        source: include_str!("../programs/palindrome.tm"),
    },
    BundledProgram {
        name: "binary-increment",
        input: "1011",
        source: include_str!("../programs/binary-increment.tm"),
    },
    BundledProgram {
        name: "busy-beaver-2",
        input: "",
        source: include_str!("../programs/busy-beaver-2.tm"),
    },
    BundledProgram {
        name: "unary-addition",
        input: "11+111",
        source: include_str!("../programs/unary-addition.tm"),
    },
];

lazy_static::lazy_static! {
    /// Bundled programs that parse, in declaration order.
    pub static ref PROGRAMS: Vec<(BundledProgram, Program)> = BUNDLED
        .iter()
        .filter_map(|bundled| match parse(bundled.source) {
            Ok(program) => Some((*bundled, program)),
            Err(e) => {
                log::error!("Failed to parse bundled program {}: {}", bundled.name, e);
                None
            }
        })
        .collect();
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get a program by its name
    pub fn get_program_by_name(name: &str) -> Result<Program, QuintError> {
        Self::find(name).map(|(_, program)| program.clone())
    }

    /// The bundled entry for `name`, with its sample input and source text.
    pub fn get_bundled(name: &str) -> Result<BundledProgram, QuintError> {
        Self::find(name).map(|(bundled, _)| *bundled)
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        PROGRAMS
            .iter()
            .map(|(bundled, _)| bundled.name.to_string())
            .collect()
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, QuintError> {
        let (bundled, program) = PROGRAMS
            .get(index)
            .ok_or_else(|| QuintError::FileError(format!("Program index {} out of range", index)))?;

        Ok(ProgramInfo {
            index,
            name: bundled.name.to_string(),
            initial_state: program.initial_state.to_string(),
            halt_state: program.halt_state.to_string(),
            sample_input: bundled.input.to_string(),
            state_count: program.state_count(),
            transition_count: program.rules.len(),
        })
    }

    /// Indices of the programs whose name contains `query`, ignoring case.
    pub fn search_programs(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();
        PROGRAMS
            .iter()
            .enumerate()
            .filter(|(_, (bundled, _))| bundled.name.to_lowercase().contains(&query))
            .map(|(index, _)| index)
            .collect()
    }

    fn find(name: &str) -> Result<&'static (BundledProgram, Program), QuintError> {
        PROGRAMS
            .iter()
            .find(|(bundled, _)| bundled.name == name)
            .ok_or_else(|| {
                QuintError::FileError(format!(
                    "Program '{}' not found. Bundled programs: {}",
                    name,
                    Self::list_program_names().join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub initial_state: String,
    pub halt_state: String,
    pub sample_input: String,
    pub state_count: usize,
    pub transition_count: usize,
}
