//! Pipeline execution.
//!
//! The executor decides builtin-vs-external per stage, wires stdin/stdout
//! across stage boundaries, applies redirection, supervises process
//! lifetimes, and reports a single continue/terminate outcome.
//!
//! Concurrency lives entirely inside one pipeline run: background threads
//! copy bytes across stage boundaries (external-to-external pipe relays and
//! builtin-buffer-to-external feeders). Each thread touches only the stream
//! handles handed to it. A downstream stage exiting before its upstream
//! finishes writing shows up as a broken pipe in those threads and is
//! swallowed there; it is never a user-visible error.
//!
//! There is no cancellation or timeout: a hung external command blocks the
//! shell. Documented limitation.

use crate::command::{Builtin, Command, ExecutionOutcome, Pipeline, RedirectionInfo};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::find_command_path;
use crate::io_adapters::{MemReader, MemWriter};
use crate::registry::CommandRegistry;
use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Stdio};
use std::thread::{self, JoinHandle};

/// The shell's current stream context: where builtins read from and where
/// terminal-stage output lands.
///
/// This is the explicit replacement for a process-global "current sink"
/// swap: redirection temporarily rebinds `out`/`err` through a
/// [`RedirectGuard`] and restores them when the guard drops.
pub struct ShellIo {
    pub input: Box<dyn Read>,
    pub out: Box<dyn Write>,
    pub err: Box<dyn Write>,
}

impl ShellIo {
    /// The process's real standard streams.
    pub fn inherited() -> Self {
        Self {
            input: Box::new(io::stdin()),
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
        }
    }
}

/// Executes pipelines against a registry and an environment.
///
/// The registry is read-only after construction; the environment is mutated
/// only by builtins (e.g. `cd`) running synchronously between stages.
pub struct Executor {
    registry: CommandRegistry,
    env: Environment,
}

impl Executor {
    pub fn new(registry: CommandRegistry, env: Environment) -> Self {
        Self { registry, env }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Run one pipeline to completion.
    ///
    /// Every stage is resolved before anything is spawned, so an
    /// unresolvable stage fails with [`ShellError::CommandNotFound`] without
    /// starting any process. On success the executor has waited for all
    /// spawned children and all relay/feeder threads.
    pub fn execute(
        &mut self,
        pipeline: &Pipeline,
        io: &mut ShellIo,
    ) -> Result<ExecutionOutcome, ShellError> {
        let registry = &self.registry;
        let env = &mut self.env;

        let resolved = resolve_stages(registry, env, pipeline)?;

        let mut supervision = Supervision::default();
        match run_stages(pipeline, resolved, io, env, &mut supervision) {
            Ok(continue_shell) => {
                supervision.wait_all();
                Ok(if continue_shell {
                    ExecutionOutcome::CONTINUE
                } else {
                    ExecutionOutcome::TERMINATE
                })
            }
            Err(e) => {
                // No orphaned children: anything already spawned is torn
                // down before the error surfaces.
                supervision.dispose();
                Err(e)
            }
        }
    }
}

/// How a stage will run.
enum Resolved<'r> {
    /// Empty-name degenerate stage; nothing runs.
    Noop,
    Builtin(&'r dyn Builtin),
    External(PathBuf),
}

fn resolve_stages<'r>(
    registry: &'r CommandRegistry,
    env: &Environment,
    pipeline: &Pipeline,
) -> Result<Vec<Resolved<'r>>, ShellError> {
    let path_var = env.get_var("PATH").unwrap_or_default();
    pipeline
        .stages()
        .iter()
        .map(|stage| {
            if stage.is_empty() {
                return Ok(Resolved::Noop);
            }
            if let Some(handler) = registry.resolve(&stage.name) {
                return Ok(Resolved::Builtin(handler));
            }
            match find_command_path(
                OsStr::new(&path_var),
                &env.current_dir,
                Path::new(&stage.name),
            ) {
                Some(path) => Ok(Resolved::External(path.into_owned())),
                None => Err(ShellError::CommandNotFound(stage.name.clone())),
            }
        })
        .collect()
}

/// What the previous stage left behind for the next one's stdin.
enum StageInput {
    /// First stage: the shell's own input.
    Inherited,
    /// Upstream produced nothing (or sent its output to a file).
    Empty,
    /// Captured output of an upstream builtin.
    Buffer(Vec<u8>),
    /// Live pipe from an upstream external process.
    Stream(ChildStdout),
}

/// Children and background copy threads spawned for one pipeline run.
#[derive(Default)]
struct Supervision {
    children: Vec<Child>,
    threads: Vec<JoinHandle<()>>,
}

impl Supervision {
    /// Block until every thread and child has finished.
    fn wait_all(&mut self) {
        for t in self.threads.drain(..) {
            let _ = t.join();
        }
        for child in &mut self.children {
            let _ = child.wait();
        }
    }

    /// Error-path teardown: kill whatever was spawned, then reap it.
    fn dispose(&mut self) {
        for child in &mut self.children {
            let _ = child.kill();
            let _ = child.wait();
        }
        for t in self.threads.drain(..) {
            let _ = t.join();
        }
    }
}

fn run_stages(
    pipeline: &Pipeline,
    resolved: Vec<Resolved<'_>>,
    io: &mut ShellIo,
    env: &mut Environment,
    supervision: &mut Supervision,
) -> Result<bool, ShellError> {
    let ShellIo { input, out, err } = io;
    let stages = pipeline.stages();
    let count = stages.len();

    let mut prev = StageInput::Inherited;
    let mut continue_shell = true;
    let mut terminal_stream: Option<ChildStdout> = None;

    for (i, (stage, resolution)) in stages.iter().zip(resolved).enumerate() {
        let is_last = i + 1 == count;
        match resolution {
            Resolved::Noop => {
                // Upstream output, if any, is passed along untouched.
            }
            Resolved::Builtin(handler) => {
                let mut stdin = builtin_stdin(&mut prev, input);
                if is_last {
                    let cont =
                        invoke_builtin(handler, stage, stdin.as_read(), out, err, env, None)?;
                    continue_shell &= cont;
                } else {
                    let (mut capture, handle) = MemWriter::with_handle();
                    let cont = invoke_builtin(
                        handler,
                        stage,
                        stdin.as_read(),
                        out,
                        err,
                        env,
                        Some(&mut capture),
                    )?;
                    continue_shell &= cont;
                    drop(capture);
                    let captured = handle.borrow().clone();
                    prev = if stage.redirection.stdout_target.is_some() {
                        StageInput::Empty
                    } else {
                        StageInput::Buffer(captured)
                    };
                }
            }
            Resolved::External(path) => {
                let child_stdout = launch_external(stage, &path, &mut prev, env, supervision)?;
                prev = match child_stdout {
                    Some(stdout) if is_last => {
                        terminal_stream = Some(stdout);
                        StageInput::Empty
                    }
                    Some(stdout) => StageInput::Stream(stdout),
                    None => StageInput::Empty,
                };
            }
        }
    }

    // The terminal stage's live output is streamed to the shell's sink as
    // it becomes available, before blocking on process exits.
    if let Some(stream) = terminal_stream {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(text) => {
                    let _ = writeln!(out, "{}", text);
                }
                Err(_) => break,
            }
        }
        let _ = out.flush();
    }

    Ok(continue_shell)
}

/// Spawn one external stage, wiring its stdin from `prev` and registering
/// any background feeder/relay thread with the supervision bag.
///
/// Returns the child's piped stdout, unless the stage redirected stdout to
/// a file.
fn launch_external(
    stage: &Command,
    path: &Path,
    prev: &mut StageInput,
    env: &Environment,
    supervision: &mut Supervision,
) -> Result<Option<ChildStdout>, ShellError> {
    let mut cmd = std::process::Command::new(path);
    cmd.args(&stage.args)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir);

    let mut feed: Option<Vec<u8>> = None;
    let mut relay: Option<ChildStdout> = None;
    match std::mem::replace(prev, StageInput::Empty) {
        StageInput::Inherited => {
            cmd.stdin(Stdio::inherit());
        }
        StageInput::Empty => {
            cmd.stdin(Stdio::null());
        }
        StageInput::Buffer(buf) => {
            cmd.stdin(Stdio::piped());
            feed = Some(buf);
        }
        StageInput::Stream(upstream) => {
            cmd.stdin(Stdio::piped());
            relay = Some(upstream);
        }
    }

    let stdout_redirected = stage.redirection.stdout_target.is_some();
    if let Some(target) = &stage.redirection.stdout_target {
        let file = open_redirection_target(target, stage.redirection.stdout_append)?;
        cmd.stdout(Stdio::from(file));
    } else {
        cmd.stdout(Stdio::piped());
    }
    if let Some(target) = &stage.redirection.stderr_target {
        let file = open_redirection_target(target, stage.redirection.stderr_append)?;
        cmd.stderr(Stdio::from(file));
    } else {
        cmd.stderr(Stdio::inherit());
    }

    let mut child = cmd.spawn().map_err(|source| ShellError::SpawnFailure {
        name: stage.name.clone(),
        source,
    })?;

    if let Some(buf) = feed {
        if let Some(mut child_stdin) = child.stdin.take() {
            supervision.threads.push(thread::spawn(move || {
                // The child may exit before consuming everything; the
                // resulting broken pipe stays here.
                let _ = child_stdin.write_all(&buf);
            }));
        }
    }
    if let Some(mut upstream) = relay {
        if let Some(mut child_stdin) = child.stdin.take() {
            supervision.threads.push(thread::spawn(move || {
                let _ = io::copy(&mut upstream, &mut child_stdin);
            }));
        }
    }

    let stdout = if stdout_redirected {
        None
    } else {
        child.stdout.take()
    };
    supervision.children.push(child);
    Ok(stdout)
}

/// A builtin's stdin for one invocation: either the shell's own input
/// (first stage) or an in-memory buffer.
enum BuiltinStdin<'a> {
    Borrowed(&'a mut dyn Read),
    Owned(MemReader),
}

impl BuiltinStdin<'_> {
    fn as_read(&mut self) -> &mut dyn Read {
        match self {
            Self::Borrowed(r) => &mut **r,
            Self::Owned(m) => m,
        }
    }
}

fn builtin_stdin<'a>(prev: &mut StageInput, input: &'a mut Box<dyn Read>) -> BuiltinStdin<'a> {
    match std::mem::replace(prev, StageInput::Empty) {
        StageInput::Inherited => BuiltinStdin::Borrowed(input.as_mut()),
        StageInput::Empty => BuiltinStdin::Owned(MemReader::empty()),
        StageInput::Buffer(buf) => BuiltinStdin::Owned(MemReader::new(buf)),
        StageInput::Stream(mut upstream) => {
            // A builtin is not a stream: drain the upstream process fully
            // before the handler runs.
            let mut buf = Vec::new();
            let _ = upstream.read_to_end(&mut buf);
            BuiltinStdin::Owned(MemReader::new(buf))
        }
    }
}

/// Run one builtin stage with its redirection applied.
///
/// `capture`, when given, receives the builtin's stdout instead of the
/// context sink; a stage-local `>` redirection takes precedence over it.
/// Handler failures are printed to the (possibly redirected) error stream
/// and the shell keeps running.
fn invoke_builtin(
    handler: &dyn Builtin,
    stage: &Command,
    stdin: &mut dyn Read,
    out: &mut Box<dyn Write>,
    err: &mut Box<dyn Write>,
    env: &mut Environment,
    capture: Option<&mut dyn Write>,
) -> Result<bool, ShellError> {
    let mut guard = RedirectGuard::apply(out, err, &stage.redirection)?;
    let (guard_out, guard_err) = guard.streams();
    let stdout: &mut dyn Write = match capture {
        Some(cap) if stage.redirection.stdout_target.is_none() => cap,
        _ => guard_out,
    };

    match handler.execute(&stage.args, stdin, stdout, guard_err, env) {
        Ok(cont) => Ok(cont),
        Err(e) => {
            let _ = writeln!(guard_err, "{}: {}", stage.name, e);
            Ok(true)
        }
    }
}

/// Scoped rebinding of the context sinks for one builtin invocation.
///
/// Opening the target files happens in `apply`; restoring the original
/// sinks happens in `Drop`, so the swap is undone on every exit path,
/// including handler failure.
struct RedirectGuard<'a> {
    out: &'a mut Box<dyn Write>,
    err: &'a mut Box<dyn Write>,
    saved_out: Option<Box<dyn Write>>,
    saved_err: Option<Box<dyn Write>>,
}

impl<'a> RedirectGuard<'a> {
    fn apply(
        out: &'a mut Box<dyn Write>,
        err: &'a mut Box<dyn Write>,
        redirection: &RedirectionInfo,
    ) -> Result<Self, ShellError> {
        let mut guard = RedirectGuard {
            out,
            err,
            saved_out: None,
            saved_err: None,
        };
        if let Some(path) = &redirection.stdout_target {
            let file = open_redirection_target(path, redirection.stdout_append)?;
            guard.saved_out = Some(std::mem::replace(&mut *guard.out, Box::new(file)));
        }
        if let Some(path) = &redirection.stderr_target {
            let file = open_redirection_target(path, redirection.stderr_append)?;
            guard.saved_err = Some(std::mem::replace(&mut *guard.err, Box::new(file)));
        }
        Ok(guard)
    }

    fn streams(&mut self) -> (&mut dyn Write, &mut dyn Write) {
        (self.out.as_mut(), self.err.as_mut())
    }
}

impl Drop for RedirectGuard<'_> {
    fn drop(&mut self) {
        if let Some(original) = self.saved_out.take() {
            let _ = self.out.flush();
            *self.out = original;
        }
        if let Some(original) = self.saved_err.take() {
            let _ = self.err.flush();
            *self.err = original;
        }
    }
}

fn open_redirection_target(path: &Path, append: bool) -> Result<File, ShellError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(!append)
        .append(append)
        .open(path)
        .map_err(|source| ShellError::RedirectionIo {
            path: path.to_path_buf(),
            source,
        })
}
