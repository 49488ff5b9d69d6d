use crate::env::Environment;
use anyhow::Result;
use std::fmt;
use std::io::{Read, Write};
use std::path::PathBuf;

/// Output/error redirection requested by a single command.
///
/// A target is set only when the parser actually saw the corresponding
/// operator; the append flag is meaningless while its target is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionInfo {
    /// File receiving standard output (`>`, `1>`, `>>`, `1>>`).
    pub stdout_target: Option<PathBuf>,
    /// Whether stdout is appended to rather than truncated.
    pub stdout_append: bool,
    /// File receiving standard error (`2>`, `2>>`).
    pub stderr_target: Option<PathBuf>,
    /// Whether stderr is appended to rather than truncated.
    pub stderr_append: bool,
}

/// One parsed command: a name, its arguments in original order, and any
/// redirection it carried. Immutable once constructed by the parser.
///
/// An empty `name` marks a degenerate (whitespace-only) input; the executor
/// treats such a command as a no-op rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    pub redirection: RedirectionInfo,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<String>, redirection: RedirectionInfo) -> Self {
        Self {
            name: name.into(),
            args,
            redirection,
        }
    }

    /// True for the no-op command produced from an empty input line.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// An ordered sequence of commands connected by pipes. Never empty: a bare
/// line parses to a single stage.
///
/// Created once per input line and consumed once by the executor; the
/// `Display` rendering is what the history collaborator records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Command>,
}

impl Pipeline {
    /// Build a pipeline from parsed stages. `stages` must be non-empty;
    /// the parser guarantees this by emitting a no-op command for blank input.
    pub fn new(stages: Vec<Command>) -> Self {
        debug_assert!(!stages.is_empty());
        Self { stages }
    }

    pub fn stages(&self) -> &[Command] {
        &self.stages
    }

    /// True iff the pipeline has exactly one stage.
    pub fn is_single(&self) -> bool {
        self.stages.len() == 1
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}

/// The one value execution reports back to the shell loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// False only when the termination builtin ran somewhere in the pipeline.
    pub continue_shell: bool,
}

impl ExecutionOutcome {
    pub const CONTINUE: Self = Self {
        continue_shell: true,
    };
    pub const TERMINATE: Self = Self {
        continue_shell: false,
    };
}

/// A command implemented in-process.
///
/// Handlers receive the arguments verbatim (no re-quoting), the streams the
/// executor wired for this invocation, and the mutable environment. The
/// returned bool follows the registry contract: `true` keeps the shell loop
/// running, `false` requests termination.
pub trait Builtin {
    fn execute(
        &self,
        args: &[String],
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirection_defaults_to_unset() {
        let redir = RedirectionInfo::default();
        assert!(redir.stdout_target.is_none());
        assert!(redir.stderr_target.is_none());
        assert!(!redir.stdout_append);
        assert!(!redir.stderr_append);
    }

    #[test]
    fn pipeline_is_single() {
        let cmd = Command::new("echo", vec!["hi".to_string()], RedirectionInfo::default());
        let single = Pipeline::new(vec![cmd.clone()]);
        assert!(single.is_single());
        let double = Pipeline::new(vec![cmd.clone(), cmd]);
        assert!(!double.is_single());
    }

    #[test]
    fn pipeline_renders_back_to_text() {
        let stages = vec![
            Command::new(
                "echo",
                vec!["a".to_string(), "b".to_string()],
                RedirectionInfo::default(),
            ),
            Command::new("wc", vec![], RedirectionInfo::default()),
        ];
        let pipeline = Pipeline::new(stages);
        assert_eq!(pipeline.to_string(), "echo a b | wc");
    }
}
