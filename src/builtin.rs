//! Stock builtin commands.
//!
//! Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
//! directly in-process without spawning a child process. The set here is the
//! minimal one the executor and the registry need; richer command bodies
//! live outside this core.

use crate::command::Builtin;
use crate::env::Environment;
use crate::registry::CommandRegistry;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

/// Builtin commands known to the shell at compile time.
///
/// The returned bool is the continue-shell flag: every builtin except `exit`
/// answers `true`.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command using the provided IO streams and environment.
    fn run(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<bool>;
}

/// Adapter turning a [`BuiltinCommand`] type into a registry handler.
///
/// Argument parsing happens here, per invocation; `argh`'s help/usage early
/// exit is written to the appropriate stream instead of aborting the shell.
pub(crate) struct Handler<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Handler<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: BuiltinCommand> Builtin for Handler<T> {
    fn execute(
        &self,
        args: &[String],
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<bool> {
        let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        match T::from_args(&[T::name()], &arg_refs) {
            Ok(cmd) => cmd.run(stdin, stdout, stderr, env),
            Err(EarlyExit { output, status }) => {
                if status.is_err() {
                    write!(stderr, "{}", output)?;
                } else {
                    write!(stdout, "{}", output)?;
                }
                Ok(true)
            }
        }
    }
}

fn handler<T: BuiltinCommand + 'static>() -> Box<dyn Builtin> {
    Box::new(Handler::<T>::default())
}

/// Register the stock builtins into `registry`.
pub fn install_defaults(registry: &mut CommandRegistry) {
    registry.register(Echo::name(), handler::<Echo>());
    registry.register(Pwd::name(), handler::<Pwd>());
    registry.register(Cd::name(), handler::<Cd>());
    registry.register(Exit::name(), handler::<Exit>());
}

#[derive(FromArgs)]
/// write the arguments to standard output, separated by spaces.
/// by default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn run(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<bool> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(true)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn run(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<bool> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(true)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME
/// environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    /// Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn run(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<bool> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => {
                if let Some(home) = env.get_var("HOME") {
                    PathBuf::from(home)
                } else {
                    return Err(anyhow::anyhow!("cd: no target and HOME not set"));
                }
            }
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;
        env.current_dir = canonical;
        Ok(true)
    }
}

#[derive(FromArgs)]
/// Terminate the shell loop.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; kept so `exit 0` and friends parse.
    pub args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn run(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemReader;

    fn run_handler(
        handler: &dyn Builtin,
        args: &[&str],
        env: &mut Environment,
    ) -> (bool, String, String) {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut stdin = MemReader::empty();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let cont = handler
            .execute(&args, &mut stdin, &mut stdout, &mut stderr, env)
            .expect("builtin run");
        (
            cont,
            String::from_utf8(stdout).expect("utf8 stdout"),
            String::from_utf8(stderr).expect("utf8 stderr"),
        )
    }

    #[test]
    fn echo_joins_args_with_newline() {
        let mut env = Environment::new();
        let (cont, out, _) = run_handler(&Handler::<Echo>::default(), &["hello", "world"], &mut env);
        assert!(cont);
        assert_eq!(out, "hello world\n");
    }

    #[test]
    fn echo_n_suppresses_newline() {
        let mut env = Environment::new();
        let (_, out, _) = run_handler(&Handler::<Echo>::default(), &["-n", "hi"], &mut env);
        assert_eq!(out, "hi");
    }

    #[test]
    fn pwd_prints_environment_dir() {
        let mut env = Environment::new();
        env.current_dir = PathBuf::from("/some/where");
        let (cont, out, _) = run_handler(&Handler::<Pwd>::default(), &[], &mut env);
        assert!(cont);
        assert_eq!(out, "/some/where\n");
    }

    #[test]
    fn exit_requests_termination() {
        let mut env = Environment::new();
        let (cont, out, _) = run_handler(&Handler::<Exit>::default(), &[], &mut env);
        assert!(!cont);
        assert!(out.is_empty());
    }

    #[test]
    fn exit_ignores_arguments() {
        let mut env = Environment::new();
        let (cont, _, _) = run_handler(&Handler::<Exit>::default(), &["0"], &mut env);
        assert!(!cont);
    }

    #[test]
    fn cd_updates_environment_dir() {
        let mut env = Environment::new();
        let temp = std::env::temp_dir();
        let temp_arg = temp.to_string_lossy().into_owned();
        let (cont, _, _) = run_handler(&Handler::<Cd>::default(), &[temp_arg.as_str()], &mut env);
        assert!(cont);
        assert_eq!(env.current_dir, fs::canonicalize(&temp).unwrap());
    }

    #[test]
    fn help_request_is_not_an_error() {
        let mut env = Environment::new();
        let (cont, out, err) = run_handler(&Handler::<Echo>::default(), &["--help"], &mut env);
        assert!(cont);
        assert!(err.is_empty());
        assert!(out.contains("Usage") || out.contains("echo"));
    }
}
