//! The parsing-and-execution core of an interactive command shell.
//!
//! This crate turns a raw input line into a structured [`Pipeline`] and runs
//! it, including multi-stage pipelines that mix in-process builtins and
//! external OS processes. The moving parts:
//!
//! - [`parser`]: quoting/escaping lexer, pipe splitting, redirection
//!   extraction;
//! - [`registry`]: the name-to-builtin map consulted per stage;
//! - [`external`]: PATH lookup for external executables;
//! - [`executor`]: wires stdin/stdout across stages, applies redirection,
//!   supervises process lifetimes, and reports a continue/terminate outcome;
//! - [`autocomplete`] / [`trie`]: prefix completion over known command
//!   names, exposed to the line editor.
//!
//! Interactive line editing itself, on-disk history, and the bodies of
//! richer builtin commands are collaborators outside this core.

pub mod autocomplete;
pub mod builtin;
pub mod command;
pub mod env;
pub mod error;
pub mod executor;
pub mod external;
pub mod history;
pub mod io_adapters;
pub mod parser;
pub mod registry;
pub mod trie;

pub use command::{Command, ExecutionOutcome, Pipeline, RedirectionInfo};
pub use error::ShellError;
pub use executor::{Executor, ShellIo};
pub use parser::parse_pipeline;
pub use registry::CommandRegistry;
