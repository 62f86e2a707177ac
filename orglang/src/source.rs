//! Source-file loading and parsing.
//!
//! A source file is a value-producing expression sequence: its top level
//! denotes the same construct as a `[ ... ]` table literal, with
//! positional elements for expression results and named bindings for the
//! identifiers introduced by `:`.

use std::fs;
use std::path::{Path, PathBuf};

use org_syntax::{Lexer, ParseError, Parser, Program, Token};
use thiserror::Error;

/// Failure to load a source file.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be read or is not valid UTF-8.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A named UTF-8 source buffer.
#[derive(Debug, Clone)]
pub struct Source {
    /// Display name, usually the path.
    pub name: String,
    /// Source text.
    pub text: String,
}

impl Source {
    /// Load a file, validating UTF-8.
    pub fn read(path: &Path) -> Result<Self, SourceError> {
        let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            name: path.display().to_string(),
            text,
        })
    }

    /// Wrap an in-memory buffer.
    pub fn from_string(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Drain the lexer over this source.
    pub fn tokens(&self) -> Vec<Token> {
        Lexer::tokens(&self.text)
    }

    /// Parse this source to a program and its recorded errors.
    pub fn parse(&self) -> (Program, Vec<ParseError>) {
        Parser::parse(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_in_memory_sources() {
        let source = Source::from_string("<test>", "a : 1; a;");
        let (program, errors) = source.parse();
        assert!(errors.is_empty());
        assert_eq!(program.to_string(), "(a : 1)\na");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Source::read(Path::new("/nonexistent/path.org")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/path.org"));
    }
}
