//! Error taxonomy shared by the compiler, preview and patcher.

use thiserror::Error;

/// Result alias used across the workspace.
pub type EditorResult<T> = Result<T, EditorError>;

/// Coarse classification used to pick the panel an error is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    Compile,
    Runtime,
    Patch,
    Config,
    Io,
}

impl ErrorKind {
    /// Heading shown above the raw message.
    pub fn title(self) -> &'static str {
        match self {
            Self::Syntax => "Syntax error in JSX",
            Self::Compile => "Unable to compile component",
            Self::Runtime => "Component crashed during render",
            Self::Patch => "Unable to modify code structure",
            Self::Config => "Invalid configuration",
            Self::Io => "File access failed",
        }
    }
}

/// Top-level editor error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// Source text could not be transformed into executable form.
    #[error("{message} ({line}:{column})")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    /// Transformed source failed to evaluate or did not yield a component.
    #[error("{message}")]
    Compile { message: String },

    /// The instantiated component threw while rendering.
    #[error("{message}")]
    Runtime { message: String },

    /// The source patcher could not rewrite the target tag.
    #[error("{message}")]
    Patch { code: &'static str, message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("{path}: {message}")]
    Io { path: String, message: String },
}

impl EditorError {
    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile {
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Compile { .. } => ErrorKind::Compile,
            Self::Runtime { .. } => ErrorKind::Runtime,
            Self::Patch { .. } => ErrorKind::Patch,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Stable dotted code, suitable for logs and tests.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "compiler.syntax",
            Self::Compile { .. } => "compiler.compile",
            Self::Runtime { .. } => "preview.runtime",
            Self::Patch { code, .. } => *code,
            Self::Config { .. } => "config.invalid",
            Self::Io { .. } => "io.failed",
        }
    }

    pub fn title(&self) -> &'static str {
        self.kind().title()
    }
}
