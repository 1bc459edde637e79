//! This module provides the `ProgramLoader` struct, responsible for loading quintuple
//! programs from files, directories and strings.

use crate::parser::{parse_with, ParserOptions};
use crate::types::{Program, QuintError, MAX_PROGRAM_SIZE};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of quintuple program files.
pub const PROGRAM_EXTENSION: &str = "tm";

/// `ProgramLoader` is a utility struct for loading programs.
/// It provides methods to load programs from individual files, from string content,
/// and to discover and load all `.tm` files within a specified directory.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single program from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and parsed into a `Program`.
    /// * `Err(QuintError::FileError)` if the file cannot be read or is too large.
    /// * `Err(QuintError::Parse)` if the file content is not a valid program.
    pub fn load_program(path: &Path) -> Result<Program, QuintError> {
        Self::load_program_with(path, &ParserOptions::default())
    }

    /// Loads a single program from `path`, using `options` for unconfigured defaults.
    pub fn load_program_with(path: &Path, options: &ParserOptions) -> Result<Program, QuintError> {
        let content = Self::read_source(path)?;
        log::debug!("Loading program from {}", path.display());

        Ok(parse_with(&content, options)?)
    }

    /// Reads program source text, enforcing `MAX_PROGRAM_SIZE`.
    pub fn read_source(path: &Path) -> Result<String, QuintError> {
        let content = fs::read_to_string(path).map_err(|e| {
            QuintError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        check_size(&content)?;

        Ok(content)
    }

    /// Loads a single program from the provided string content.
    pub fn load_program_from_string(content: &str) -> Result<Program, QuintError> {
        Self::load_program_from_string_with(content, &ParserOptions::default())
    }

    /// Loads a single program from string content, using `options` for unconfigured defaults.
    pub fn load_program_from_string_with(
        content: &str,
        options: &ParserOptions,
    ) -> Result<Program, QuintError> {
        check_size(content)?;
        Ok(parse_with(content, options)?)
    }

    /// Loads every `.tm` file in `directory`.
    ///
    /// Directories and files with other extensions are skipped. Each element of the result
    /// is either the path and its program, or the error that prevented loading it.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), QuintError>> {
        if !directory.exists() {
            return vec![Err(QuintError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(QuintError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(QuintError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                // Skip directories and non-.tm files
                if path.is_dir() || path.extension().map_or(true, |ext| ext != PROGRAM_EXTENSION) {
                    return None;
                }

                match Self::load_program(&path) {
                    Ok(program) => Some(Ok((path, program))),
                    Err(e) => Some(Err(QuintError::FileError(format!(
                        "Failed to load program from {}: {}",
                        path.display(),
                        e
                    )))),
                }
            })
            .collect();

        // Directory order is platform dependent.
        results.sort_by(|a, b| match (a, b) {
            (Ok((a, _)), Ok((b, _))) => a.cmp(b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(a), Err(b)) => a.to_string().cmp(&b.to_string()),
        });

        results
    }
}

fn check_size(content: &str) -> Result<(), QuintError> {
    if content.len() > MAX_PROGRAM_SIZE {
        return Err(QuintError::FileError(format!(
            "Program is {} bytes, larger than the {} byte limit",
            content.len(),
            MAX_PROGRAM_SIZE
        )));
    }

    Ok(())
}
