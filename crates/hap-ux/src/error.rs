//! Compile error taxonomy.

use std::fmt;

use hap_graph::ModuleId;
use serde::Serialize;
use thiserror::Error;

/// Largest unit the compiler accepts.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// One problem found while compiling a unit. Never fatal on its own: the
/// compiler keeps going and reports every error it can find.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("{module}:{line}:{column}: {message}")]
    Parse {
        module: ModuleId,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("cannot resolve '{specifier}' from '{module}'")]
    UnresolvedImport { module: ModuleId, specifier: String },

    #[error("{module}: unsupported {feature}")]
    UnsupportedFeature { module: ModuleId, feature: String },

    #[error("{module}: invalid JSON: {message}")]
    InvalidJson { module: ModuleId, message: String },

    #[error("{module}: file is {size} bytes, limit is {max}")]
    FileTooLarge {
        module: ModuleId,
        size: usize,
        max: usize,
    },

    /// The unit was resolved but could not be read back.
    #[error("cannot read '{module}': {message}")]
    Unreadable { module: ModuleId, message: String },

    /// Two units lower to the same output asset.
    #[error("{module}: output '{asset}' is also produced by '{other}'")]
    OutputConflict {
        module: ModuleId,
        other: ModuleId,
        asset: String,
    },
}

impl CompileError {
    /// Stable kind name used in build statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::Parse { .. } | CompileError::InvalidJson { .. } | CompileError::FileTooLarge { .. } => {
                "ParseError"
            }
            CompileError::UnresolvedImport { .. } | CompileError::Unreadable { .. } => "UnresolvedImport",
            CompileError::UnsupportedFeature { .. } | CompileError::OutputConflict { .. } => "UnsupportedFeature",
        }
    }

    pub fn module(&self) -> &ModuleId {
        match self {
            CompileError::Parse { module, .. }
            | CompileError::UnresolvedImport { module, .. }
            | CompileError::UnsupportedFeature { module, .. }
            | CompileError::InvalidJson { module, .. }
            | CompileError::FileTooLarge { module, .. }
            | CompileError::Unreadable { module, .. }
            | CompileError::OutputConflict { module, .. } => module,
        }
    }

    /// Statistics record for this error.
    pub fn record(&self) -> ErrorRecord {
        ErrorRecord {
            kind: self.kind().to_string(),
            module: self.module().to_string(),
            message: self.to_string(),
        }
    }
}

/// Serializable `{ kind, module, message }` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub kind: String,
    pub module: String,
    pub message: String,
}

/// Every error found while compiling one unit, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileErrors(Vec<CompileError>);

impl CompileErrors {
    pub fn new(errors: Vec<CompileError>) -> Self {
        Self(errors)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompileError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<CompileError> {
        self.0
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileErrors {}

impl IntoIterator for CompileErrors {
    type Item = CompileError;
    type IntoIter = std::vec::IntoIter<CompileError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Byte offset to 1-based line/column conversion.
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(memchr::memchr_iter(b'\n', source.as_bytes()).map(|pos| pos + 1));
        Self { starts }
    }

    /// Line and column (in bytes) of `offset`.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.starts[line] + 1)
    }
}

/// Error located at a byte offset of the unit, before it is tied to a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn into_compile_error(self, module: &ModuleId, lines: &LineIndex) -> CompileError {
        let (line, column) = lines.position(self.offset);
        CompileError::Parse {
            module: module.clone(),
            line,
            column,
            message: self.message,
        }
    }
}
