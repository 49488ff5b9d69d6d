//! Turns a raw input line into a [`Pipeline`] of [`Command`] values.
//!
//! Parsing runs in two passes over the same quote/escape state machine:
//! first the line is split on unquoted `|` characters with quotes and
//! escapes retained, then each segment is re-scanned to produce words,
//! this time consuming the quote and escape markers. Redirection operators
//! are extracted from the word list last.
//!
//! The parser never fails: malformed input (unterminated quotes, trailing
//! backslashes, missing redirection filenames) degrades to the closest
//! sensible reading instead of erroring out.

use crate::command::{Command, Pipeline, RedirectionInfo};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Normal,
    InSingleQuote,
    InDoubleQuote,
}

/// Parse one input line into a pipeline.
///
/// An empty or whitespace-only line yields a single command with an empty
/// name, which the executor treats as a no-op.
pub fn parse_pipeline(line: &str) -> Pipeline {
    if line.trim().is_empty() {
        return Pipeline::new(vec![Command::new(
            "",
            Vec::new(),
            RedirectionInfo::default(),
        )]);
    }

    let stages = split_stages(line).into_iter().map(parse_stage).collect();
    Pipeline::new(stages)
}

fn parse_stage(segment: String) -> Command {
    let words = split_words(&segment);
    let (mut args, redirection) = extract_redirection(words);
    if args.is_empty() {
        // Segment held only whitespace or redirections; degrade to a no-op.
        return Command::new("", Vec::new(), redirection);
    }
    let name = args.remove(0);
    Command::new(name, args, redirection)
}

/// First pass: split the line on `|` characters that sit outside any quote
/// and are not escaped. Quote and escape characters stay in the segment
/// text; word splitting consumes them in the second pass.
fn split_stages(line: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut state = QuoteState::Normal;
    let mut escaped = false;

    for ch in line.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            // Backslash has no meaning inside single quotes.
            '\\' if state != QuoteState::InSingleQuote => {
                current.push(ch);
                escaped = true;
            }
            '\'' => {
                current.push(ch);
                state = match state {
                    QuoteState::Normal => QuoteState::InSingleQuote,
                    QuoteState::InSingleQuote => QuoteState::Normal,
                    QuoteState::InDoubleQuote => QuoteState::InDoubleQuote,
                };
            }
            '"' => {
                current.push(ch);
                state = match state {
                    QuoteState::Normal => QuoteState::InDoubleQuote,
                    QuoteState::InDoubleQuote => QuoteState::Normal,
                    QuoteState::InSingleQuote => QuoteState::InSingleQuote,
                };
            }
            '|' if state == QuoteState::Normal => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }

    segments.push(current);
    segments
}

/// Second pass: split one pipeline segment into words, consuming quote and
/// escape markers.
///
/// Rules, matching the first pass's state machine:
/// - outside quotes a backslash escapes exactly the next character; a
///   trailing backslash is kept literally;
/// - inside double quotes a backslash escapes only `"` and `\`; before any
///   other character the backslash itself is kept;
/// - inside single quotes every character is literal;
/// - unquoted whitespace ends the current word, runs collapse to one
///   separator;
/// - an empty quoted string still produces an (empty) word.
fn split_words(segment: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut state = QuoteState::Normal;
    let mut chars = segment.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            QuoteState::Normal => match ch {
                '\\' => {
                    in_word = true;
                    match chars.next() {
                        Some(next) => current.push(next),
                        // Trailing unmatched backslash stays literal.
                        None => current.push('\\'),
                    }
                }
                '\'' => {
                    in_word = true;
                    state = QuoteState::InSingleQuote;
                }
                '"' => {
                    in_word = true;
                    state = QuoteState::InDoubleQuote;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    in_word = true;
                    current.push(c);
                }
            },
            QuoteState::InSingleQuote => match ch {
                '\'' => state = QuoteState::Normal,
                c => current.push(c),
            },
            QuoteState::InDoubleQuote => match ch {
                '"' => state = QuoteState::Normal,
                '\\' => match chars.peek() {
                    Some('"') | Some('\\') => {
                        current.push(chars.next().unwrap_or('\\'));
                    }
                    Some(_) => current.push('\\'),
                    None => current.push('\\'),
                },
                c => current.push(c),
            },
        }
    }

    // Unterminated quotes degrade gracefully: whatever accumulated becomes
    // the final word.
    if in_word {
        words.push(current);
    }
    words
}

/// Third step: pull redirection operators and their filename out of the word
/// list. Operators are recognized anywhere in the list, not only at the end.
///
/// An operator with no following word is dropped silently. The original
/// shell behaves this way and the behavior is kept as documented rather than
/// turned into an error.
fn extract_redirection(words: Vec<String>) -> (Vec<String>, RedirectionInfo) {
    let mut args = Vec::new();
    let mut redirection = RedirectionInfo::default();
    let mut iter = words.into_iter().peekable();

    while let Some(word) = iter.next() {
        let (stream, append) = match word.as_str() {
            ">" | "1>" => (Stream::Stdout, false),
            ">>" | "1>>" => (Stream::Stdout, true),
            "2>" => (Stream::Stderr, false),
            "2>>" => (Stream::Stderr, true),
            _ => {
                args.push(word);
                continue;
            }
        };
        if let Some(target) = iter.next() {
            match stream {
                Stream::Stdout => {
                    redirection.stdout_target = Some(PathBuf::from(target));
                    redirection.stdout_append = append;
                }
                Stream::Stderr => {
                    redirection.stderr_target = Some(PathBuf::from(target));
                    redirection.stderr_append = append;
                }
            }
        }
    }

    (args, redirection)
}

enum Stream {
    Stdout,
    Stderr,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(line: &str) -> Command {
        let pipeline = parse_pipeline(line);
        assert!(pipeline.is_single(), "expected one stage for {:?}", line);
        pipeline.stages()[0].clone()
    }

    #[test]
    fn splits_on_whitespace_runs() {
        let cmd = single("echo   hello\t world");
        assert_eq!(cmd.name, "echo");
        assert_eq!(cmd.args, vec!["hello", "world"]);
    }

    #[test]
    fn empty_line_yields_noop_command() {
        let cmd = single("   \t  ");
        assert!(cmd.is_empty());
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn pipe_splits_stages() {
        let pipeline = parse_pipeline("echo hi | wc -l | sort");
        assert_eq!(pipeline.stages().len(), 3);
        assert_eq!(pipeline.stages()[0].name, "echo");
        assert_eq!(pipeline.stages()[1].name, "wc");
        assert_eq!(pipeline.stages()[1].args, vec!["-l"]);
        assert_eq!(pipeline.stages()[2].name, "sort");
    }

    #[test]
    fn pipe_inside_double_quotes_is_not_a_separator() {
        let cmd = single("echo \"a | b\"");
        assert_eq!(cmd.name, "echo");
        assert_eq!(cmd.args, vec!["a | b"]);
    }

    #[test]
    fn pipe_inside_single_quotes_is_not_a_separator() {
        let cmd = single("echo 'x|y'");
        assert_eq!(cmd.args, vec!["x|y"]);
    }

    #[test]
    fn escaped_pipe_is_not_a_separator() {
        let cmd = single("echo a\\|b");
        assert_eq!(cmd.args, vec!["a|b"]);
    }

    #[test]
    fn backslash_escapes_space() {
        let cmd = single("echo hello\\ world");
        assert_eq!(cmd.args, vec!["hello world"]);
    }

    #[test]
    fn backslash_is_literal_inside_single_quotes() {
        let cmd = single("echo 'a\\b'");
        assert_eq!(cmd.args, vec!["a\\b"]);
    }

    #[test]
    fn double_quote_suppressed_inside_single_quotes() {
        let cmd = single("echo 'he said \"hi\"'");
        assert_eq!(cmd.args, vec!["he said \"hi\""]);
    }

    #[test]
    fn backslash_in_double_quotes_escapes_quote_and_backslash_only() {
        let cmd = single("echo \"a\\\"b\"");
        assert_eq!(cmd.args, vec!["a\"b"]);
        let cmd = single("echo \"a\\\\b\"");
        assert_eq!(cmd.args, vec!["a\\b"]);
        // Any other character keeps the backslash literally.
        let cmd = single("echo \"a\\nb\"");
        assert_eq!(cmd.args, vec!["a\\nb"]);
    }

    #[test]
    fn trailing_backslash_kept_literally() {
        let cmd = single("echo abc\\");
        assert_eq!(cmd.args, vec!["abc\\"]);
    }

    #[test]
    fn empty_quotes_produce_empty_argument() {
        let cmd = single("echo '' \"\"");
        assert_eq!(cmd.args, vec!["", ""]);
    }

    #[test]
    fn adjacent_quoted_pieces_join_into_one_word() {
        let cmd = single("echo 'ab'\"cd\"ef");
        assert_eq!(cmd.args, vec!["abcdef"]);
    }

    #[test]
    fn stdout_redirection_truncate() {
        let cmd = single("cmd > out.txt");
        assert_eq!(cmd.name, "cmd");
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.redirection.stdout_target, Some(PathBuf::from("out.txt")));
        assert!(!cmd.redirection.stdout_append);
    }

    #[test]
    fn explicit_fd_one_is_equivalent_to_bare_caret() {
        let a = single("cmd > out.txt");
        let b = single("cmd 1> out.txt");
        assert_eq!(a.redirection, b.redirection);
    }

    #[test]
    fn stdout_append_forms() {
        for line in ["cmd >> out.txt", "cmd 1>> out.txt"] {
            let cmd = single(line);
            assert_eq!(cmd.redirection.stdout_target, Some(PathBuf::from("out.txt")));
            assert!(cmd.redirection.stdout_append, "append for {:?}", line);
        }
    }

    #[test]
    fn stderr_redirection_forms() {
        let cmd = single("cmd 2> err.txt");
        assert_eq!(cmd.redirection.stderr_target, Some(PathBuf::from("err.txt")));
        assert!(!cmd.redirection.stderr_append);

        let cmd = single("cmd 2>> err.txt");
        assert_eq!(cmd.redirection.stderr_target, Some(PathBuf::from("err.txt")));
        assert!(cmd.redirection.stderr_append);
    }

    #[test]
    fn redirection_recognized_mid_argument_list() {
        let cmd = single("cmd > out.txt arg1 arg2");
        assert_eq!(cmd.args, vec!["arg1", "arg2"]);
        assert_eq!(cmd.redirection.stdout_target, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn both_streams_redirected() {
        let cmd = single("cmd > out.txt 2>> err.txt");
        assert_eq!(cmd.redirection.stdout_target, Some(PathBuf::from("out.txt")));
        assert_eq!(cmd.redirection.stderr_target, Some(PathBuf::from("err.txt")));
        assert!(cmd.redirection.stderr_append);
    }

    #[test]
    fn redirection_without_filename_is_dropped() {
        // Documented original behavior: the dangling operator is ignored.
        let cmd = single("cmd arg >");
        assert_eq!(cmd.args, vec!["arg"]);
        assert!(cmd.redirection.stdout_target.is_none());
    }

    #[test]
    fn redirection_applies_per_stage() {
        let pipeline = parse_pipeline("echo hi 2> err.txt | wc > out.txt");
        let stages = pipeline.stages();
        assert_eq!(
            stages[0].redirection.stderr_target,
            Some(PathBuf::from("err.txt"))
        );
        assert!(stages[0].redirection.stdout_target.is_none());
        assert_eq!(
            stages[1].redirection.stdout_target,
            Some(PathBuf::from("out.txt"))
        );
    }

    #[test]
    fn empty_segment_between_pipes_degrades_to_noop_stage() {
        let pipeline = parse_pipeline("echo hi | | wc");
        assert_eq!(pipeline.stages().len(), 3);
        assert!(pipeline.stages()[1].is_empty());
    }

    #[test]
    fn plain_pipeline_round_trips_through_rendering() {
        let pipeline = parse_pipeline("echo a b | wc -l");
        let rendered = pipeline.to_string();
        let reparsed = parse_pipeline(&rendered);
        assert_eq!(pipeline, reparsed);
    }
}
