/// Orchestrator error types
use bytebundle_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No project root: set `context` in the plugin options or provide one from the host")]
    MissingContext,

    #[error("No build session is active: session start must run before discovery or optimize")]
    SessionNotStarted,

    #[error("Template compilation failed: {error}")]
    CompilationError { error: String },

    #[error("Rebuild failed for module '{module}': {error}")]
    RebuildError { module: String, error: String },

    #[error("Bundle for session {session} was already compiled")]
    AlreadyCompiled { session: u64 },

    #[error("Build did not settle after {passes} seal passes")]
    ResealLimit { passes: usize },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl BuildError {
    /// Create a compilation error, keeping the full cause chain
    pub fn compilation(error: anyhow::Error) -> Self {
        Self::CompilationError {
            error: format!("{:#}", error),
        }
    }

    /// Create a rebuild error for a placeholder module
    pub fn rebuild(module: impl Into<String>, error: anyhow::Error) -> Self {
        Self::RebuildError {
            module: module.into(),
            error: format!("{:#}", error),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Whether this error was raised while resolving configuration
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::MissingContext)
    }
}
