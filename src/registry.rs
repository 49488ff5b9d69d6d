//! Name-to-handler mapping for builtin commands.

use crate::command::Builtin;
use std::collections::HashMap;

/// Registry of builtin commands, keyed case-insensitively by name.
///
/// Populated once at startup and read-only afterward; the executor consults
/// it to decide builtin-vs-external per pipeline stage, and autocomplete
/// seeds its trie from [`CommandRegistry::names`].
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Builtin>>,
}

impl CommandRegistry {
    /// An empty registry. Useful for tests that register their own handlers.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// A registry holding the stock builtins.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::builtin::install_defaults(&mut registry);
        registry
    }

    /// Register a handler under `name`. Later registrations replace earlier
    /// ones.
    pub fn register(&mut self, name: &str, handler: Box<dyn Builtin>) {
        self.commands.insert(name.to_lowercase(), handler);
    }

    /// Whether `name` resolves to a builtin, ignoring case.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_lowercase())
    }

    /// Look up the handler for `name`, ignoring case.
    pub fn resolve(&self, name: &str) -> Option<&dyn Builtin> {
        self.commands.get(&name.to_lowercase()).map(|b| b.as_ref())
    }

    /// Registered command names, in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(|s| s.as_str())
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_core_builtins() {
        let registry = CommandRegistry::with_defaults();
        for name in ["echo", "pwd", "cd", "exit"] {
            assert!(registry.is_builtin(name), "{} should be builtin", name);
        }
        assert!(!registry.is_builtin("definitely-not-registered"));
    }

    #[test]
    fn lookup_ignores_case() {
        let registry = CommandRegistry::with_defaults();
        assert!(registry.is_builtin("ECHO"));
        assert!(registry.is_builtin("Echo"));
        assert!(registry.resolve("EXIT").is_some());
    }

    #[test]
    fn empty_name_is_not_a_builtin() {
        let registry = CommandRegistry::with_defaults();
        assert!(!registry.is_builtin(""));
    }
}
