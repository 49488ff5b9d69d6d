//! Command-name completion over the [`Trie`], plus the rustyline binding
//! used by the interactive reader.

use crate::trie::{DEFAULT_MAX_RESULTS, Trie};
use rustyline::Context;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use std::fs;

/// Result of an autocomplete query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    /// Sorted match list, or a single partial common-prefix suggestion.
    pub matches: Vec<String>,
    /// True only for a single, complete match; the caller is expected to
    /// append a trailing separator in that case.
    pub is_complete: bool,
}

/// Owns completion state: the trie of known command names.
///
/// Write-heavy only during startup registration, read-only during normal
/// interactive use.
pub struct Autocomplete {
    trie: Trie,
}

impl Autocomplete {
    pub fn new() -> Self {
        Self { trie: Trie::new() }
    }

    /// Register a single word for completion.
    pub fn register(&mut self, word: &str) {
        self.trie.insert(word);
    }

    /// Register a batch of words.
    pub fn register_many<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for w in words {
            self.register(w.as_ref());
        }
    }

    /// Register the file names found in every directory listed on PATH.
    pub fn register_path_executables(&mut self) {
        let Some(path_var) = std::env::var_os("PATH") else {
            return;
        };
        for dir in std::env::split_paths(&path_var) {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                if let Ok(name) = entry.file_name().into_string() {
                    self.register(&name);
                }
            }
        }
    }

    /// Forget everything. Exists for test isolation.
    pub fn clear(&mut self) {
        self.trie.clear();
    }

    /// Compute the suggestion for a typed prefix.
    ///
    /// Policy, given the sorted match list:
    /// - no matches: empty result;
    /// - one match: that match, complete;
    /// - several matches: the common extension of the lexicographically
    ///   smallest and largest matches — if longer than the prefix, a single
    ///   partial suggestion; otherwise the whole list, for display only.
    ///
    /// The extremes comparison is a cheap bound on the true longest common
    /// prefix of the set and is kept for compatibility with the original
    /// behavior.
    pub fn suggest(&self, prefix: &str) -> CompletionResult {
        let mut matches = self.trie.find_all_with_prefix(prefix, DEFAULT_MAX_RESULTS);
        matches.sort();

        if matches.is_empty() {
            return CompletionResult {
                matches,
                is_complete: false,
            };
        }
        if matches.len() == 1 {
            return CompletionResult {
                matches,
                is_complete: true,
            };
        }

        let first = &matches[0];
        let last = &matches[matches.len() - 1];
        let common_length = first
            .chars()
            .zip(last.chars())
            .take_while(|(a, b)| {
                a.to_lowercase().eq(b.to_lowercase())
            })
            .count();

        if common_length > prefix.chars().count() {
            let partial: String = first.chars().take(common_length).collect();
            return CompletionResult {
                matches: vec![partial],
                is_complete: false,
            };
        }

        CompletionResult {
            matches,
            is_complete: false,
        }
    }
}

impl Default for Autocomplete {
    fn default() -> Self {
        Self::new()
    }
}

/// rustyline helper exposing the suggestion policy to the line editor.
///
/// Only the first word of the line (the command name) is completed;
/// everything after it is left alone.
pub struct ShellHelper {
    autocomplete: Autocomplete,
}

impl ShellHelper {
    pub fn new(autocomplete: Autocomplete) -> Self {
        Self { autocomplete }
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];
        if input.chars().any(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }

        let result = self.autocomplete.suggest(input);
        let candidates = result
            .matches
            .into_iter()
            .map(|m| {
                let replacement = if result.is_complete {
                    format!("{} ", m)
                } else {
                    m.clone()
                };
                Pair {
                    display: m,
                    replacement,
                }
            })
            .collect();
        Ok((pos - input.len(), candidates))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl rustyline::Helper for ShellHelper {}
