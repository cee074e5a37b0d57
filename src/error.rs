//! The single error type every fallible operation in this crate returns.
//!
//! The language itself has no catch mechanism (spec §7): every error
//! surfaces through this enum to one top-level boundary in the `gal`
//! binary, which prints it and exits non-zero.

use std::fmt::{self, Display};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum GalError {
    Lex { message: String, line: usize },
    Parse { message: String, line: Option<usize> },
    Name { message: String, line: Option<usize> },
    Type { message: String, line: Option<usize> },
    Arity { message: String, line: Option<usize> },
    Import { message: String, path: PathBuf },
    Io { message: String, path: Option<PathBuf> },
    NoMain,
}

impl GalError {
    pub fn lex(message: impl Into<String>, line: usize) -> Self {
        Self::Lex { message: message.into(), line }
    }

    pub fn parse(message: impl Into<String>, line: Option<usize>) -> Self {
        Self::Parse { message: message.into(), line }
    }

    pub fn name(message: impl Into<String>, line: Option<usize>) -> Self {
        Self::Name { message: message.into(), line }
    }

    pub fn ty(message: impl Into<String>, line: Option<usize>) -> Self {
        Self::Type { message: message.into(), line }
    }

    pub fn arity(message: impl Into<String>, line: Option<usize>) -> Self {
        Self::Arity { message: message.into(), line }
    }

    pub fn import(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Import { message: message.into(), path: path.into() }
    }

    pub fn io(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Io { message: message.into(), path }
    }
}

impl Display for GalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex { message, line } => write!(f, "LexError at line {line}: {message}"),
            Self::Parse { message, line: Some(line) } => {
                write!(f, "ParseError at line {line}: {message}")
            }
            Self::Parse { message, line: None } => write!(f, "ParseError: {message}"),
            Self::Name { message, line: Some(line) } => {
                write!(f, "NameError at line {line}: {message}")
            }
            Self::Name { message, line: None } => write!(f, "NameError: {message}"),
            Self::Type { message, line: Some(line) } => {
                write!(f, "TypeError at line {line}: {message}")
            }
            Self::Type { message, line: None } => write!(f, "TypeError: {message}"),
            Self::Arity { message, line: Some(line) } => {
                write!(f, "ArityError at line {line}: {message}")
            }
            Self::Arity { message, line: None } => write!(f, "ArityError: {message}"),
            Self::Import { message, path } => {
                write!(f, "ImportError: {message} ('{}')", path.display())
            }
            Self::Io { message, path: Some(path) } => {
                write!(f, "IOError: {message} ('{}')", path.display())
            }
            Self::Io { message, path: None } => write!(f, "IOError: {message}"),
            Self::NoMain => write!(f, "NoMainError: no 'main' function declared"),
        }
    }
}

impl std::error::Error for GalError {}

pub type GalResult<T> = Result<T, GalError>;
