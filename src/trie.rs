//! Prefix trie over known command names.
//!
//! Built once at startup from the registry and PATH, then queried read-only
//! by the interactive reader. Case-insensitive: every word is folded to
//! lowercase before indexing, and lookups fold the prefix the same way.

use std::collections::HashMap;

/// Default cap on collected matches, matching the lookup entry point.
pub const DEFAULT_MAX_RESULTS: usize = 100;

#[derive(Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    is_end_of_word: bool,
}

/// The trie itself. Each node is exclusively owned by its parent; node
/// lifetime equals trie lifetime.
#[derive(Default)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a word, case-folded. Blank words are ignored.
    pub fn insert(&mut self, word: &str) {
        if word.trim().is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for c in word.to_lowercase().chars() {
            node = node.children.entry(c).or_default();
        }
        node.is_end_of_word = true;
    }

    /// All stored words starting with `prefix` (case-insensitive), capped at
    /// `max_results`, in trie traversal order.
    ///
    /// A blank prefix yields no matches.
    pub fn find_all_with_prefix(&self, prefix: &str, max_results: usize) -> Vec<String> {
        let mut results = Vec::new();
        if prefix.trim().is_empty() {
            return results;
        }

        let lower = prefix.to_lowercase();
        let mut node = &self.root;
        for c in lower.chars() {
            match node.children.get(&c) {
                Some(child) => node = child,
                None => return results,
            }
        }

        collect_words(node, &lower, &mut results, max_results);
        results
    }

    /// Drop every stored word. Exists for test isolation.
    pub fn clear(&mut self) {
        self.root.children.clear();
        self.root.is_end_of_word = false;
    }
}

/// Recursively gathers words under a node. Command names are short, so the
/// recursion depth stays shallow.
fn collect_words(node: &TrieNode, current: &str, results: &mut Vec<String>, max_results: usize) {
    if results.len() >= max_results {
        return;
    }

    if node.is_end_of_word {
        results.push(current.to_string());
    }

    for (c, child) in &node.children {
        if results.len() >= max_results {
            break;
        }
        let mut next = String::with_capacity(current.len() + c.len_utf8());
        next.push_str(current);
        next.push(*c);
        collect_words(child, &next, results, max_results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie_with(words: &[&str]) -> Trie {
        let mut trie = Trie::new();
        for w in words {
            trie.insert(w);
        }
        trie
    }

    #[test]
    fn inserted_word_is_found_by_its_own_prefix() {
        let trie = trie_with(&["echo", "exit", "env"]);
        for w in ["echo", "exit", "env"] {
            let matches = trie.find_all_with_prefix(w, DEFAULT_MAX_RESULTS);
            assert!(matches.contains(&w.to_string()), "{} should match itself", w);
        }
    }

    #[test]
    fn prefix_collects_all_words_below() {
        let trie = trie_with(&["echo", "exit", "env", "pwd"]);
        let mut matches = trie.find_all_with_prefix("e", DEFAULT_MAX_RESULTS);
        matches.sort();
        assert_eq!(matches, vec!["echo", "env", "exit"]);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let trie = trie_with(&["Echo"]);
        assert_eq!(
            trie.find_all_with_prefix("EC", DEFAULT_MAX_RESULTS),
            vec!["echo"]
        );
    }

    #[test]
    fn blank_prefix_yields_no_matches() {
        let trie = trie_with(&["echo"]);
        assert!(trie.find_all_with_prefix("", DEFAULT_MAX_RESULTS).is_empty());
        assert!(
            trie.find_all_with_prefix("  ", DEFAULT_MAX_RESULTS)
                .is_empty()
        );
    }

    #[test]
    fn unknown_prefix_yields_no_matches() {
        let trie = trie_with(&["echo"]);
        assert!(trie.find_all_with_prefix("x", DEFAULT_MAX_RESULTS).is_empty());
    }

    #[test]
    fn blank_words_are_ignored() {
        let trie = trie_with(&["", "  "]);
        assert!(trie.find_all_with_prefix("a", DEFAULT_MAX_RESULTS).is_empty());
    }

    #[test]
    fn max_results_caps_collection() {
        let trie = trie_with(&["aa", "ab", "ac", "ad"]);
        let matches = trie.find_all_with_prefix("a", 2);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut trie = trie_with(&["echo"]);
        trie.clear();
        assert!(trie.find_all_with_prefix("e", DEFAULT_MAX_RESULTS).is_empty());

        // Reusable after clearing.
        trie.insert("pwd");
        assert_eq!(
            trie.find_all_with_prefix("p", DEFAULT_MAX_RESULTS),
            vec!["pwd"]
        );
    }
}
