use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can escape pipeline execution.
///
/// Everything else the executor runs into is handled internally: broken pipes
/// from downstream stages exiting early are swallowed by the relay threads,
/// and builtin failures are printed to the error sink without aborting the
/// shell loop.
#[derive(Debug)]
pub enum ShellError {
    /// The named command is neither a registered builtin nor an executable
    /// found on PATH.
    CommandNotFound(String),
    /// The OS refused to start an external process.
    SpawnFailure { name: String, source: io::Error },
    /// A redirection target file could not be created or opened.
    RedirectionIo { path: PathBuf, source: io::Error },
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandNotFound(name) => write!(f, "{}: command not found", name),
            Self::SpawnFailure { name, source } => {
                write!(f, "{}: failed to start: {}", name, source)
            }
            Self::RedirectionIo { path, source } => {
                write!(f, "cannot redirect to {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CommandNotFound(_) => None,
            Self::SpawnFailure { source, .. } => Some(source),
            Self::RedirectionIo { source, .. } => Some(source),
        }
    }
}
