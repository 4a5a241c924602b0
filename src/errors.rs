// File: src/errors.rs
//
// Error handling and reporting for the mini language.
// Every stage of the pipeline (lexer, parser, evaluator, builtins) reports
// failures through `MiniError`, a structured error carrying its kind, an
// optional source location and pretty-printed context.

use colored::Colorize;
use std::fmt;

/// Source location information for tracking where code appears in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Location used for runtime errors, which are not tied to a token
    pub fn unknown() -> Self {
        Self { line: 0, column: 0 }
    }

    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The three fatal error classes of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Lexical,
    Syntax,
    Runtime,
}

/// Types of errors that can occur in mini
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    SyntaxError,
    UndefinedVariable,
    TypeError,
    ArityMismatch,
    InvalidAssignment,
    KeyError,
    IndexError,
    NotCallable,
    DivisionByZero,
    RuntimeError,
}

impl ErrorKind {
    pub fn class(self) -> ErrorClass {
        match self {
            ErrorKind::LexError => ErrorClass::Lexical,
            ErrorKind::SyntaxError => ErrorClass::Syntax,
            _ => ErrorClass::Runtime,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::LexError => write!(f, "Lexical Error"),
            ErrorKind::SyntaxError => write!(f, "Syntax Error"),
            ErrorKind::UndefinedVariable => write!(f, "Undefined Variable"),
            ErrorKind::TypeError => write!(f, "Type Error"),
            ErrorKind::ArityMismatch => write!(f, "Arity Mismatch"),
            ErrorKind::InvalidAssignment => write!(f, "Invalid Assignment"),
            ErrorKind::KeyError => write!(f, "Key Error"),
            ErrorKind::IndexError => write!(f, "Index Error"),
            ErrorKind::NotCallable => write!(f, "Not Callable"),
            ErrorKind::DivisionByZero => write!(f, "Division By Zero"),
            ErrorKind::RuntimeError => write!(f, "Runtime Error"),
        }
    }
}

/// A structured error with location information
#[derive(Debug, Clone)]
pub struct MiniError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: SourceLocation,
    pub suggestion: Option<String>,
    pub help: Option<String>,
    pub note: Option<String>,
    /// Names of the user functions the error unwound through, innermost first
    pub call_stack: Vec<String>,
}

impl MiniError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
            suggestion: None,
            help: None,
            note: None,
            call_stack: Vec::new(),
        }
    }

    /// Create an error that is not tied to a source position
    pub fn runtime(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, SourceLocation::unknown())
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Record a function frame the error is unwinding through
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.call_stack.push(frame.into());
        self
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// Create a lexical error
    pub fn lex_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::LexError, message, location)
    }

    /// Create a syntax error
    pub fn syntax_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::SyntaxError, message, location)
    }

    /// Create a type error
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::runtime(ErrorKind::TypeError, message)
    }

    /// Create an undefined variable error
    pub fn undefined_variable(name: &str) -> Self {
        Self::runtime(ErrorKind::UndefinedVariable, format!("Identifier '{}' is not defined", name))
    }

    /// Create an arity mismatch error
    pub fn arity_mismatch(callee: &str, expected: usize, actual: usize) -> Self {
        Self::runtime(
            ErrorKind::ArityMismatch,
            format!(
                "Function '{}' expects {} argument{} but got {}",
                callee,
                expected,
                if expected == 1 { "" } else { "s" },
                actual
            ),
        )
    }
}

impl fmt::Display for MiniError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind_str = format!("{}", self.kind);
        writeln!(f, "{}: {}", kind_str.red().bold(), self.message.bold())?;

        if self.location.is_known() {
            let location_str = format!("  --> {}", self.location);
            writeln!(f, "{}", location_str.bright_blue())?;
        }

        if let Some(ref help) = self.help {
            writeln!(
                f,
                "   {} {}",
                "=".bright_yellow(),
                format!("help: {}", help).bright_yellow()
            )?;
        }

        if let Some(ref suggestion) = self.suggestion {
            writeln!(
                f,
                "   {} {}",
                "=".bright_green(),
                format!("Did you mean '{}'?", suggestion).bright_green()
            )?;
        }

        if let Some(ref note) = self.note {
            writeln!(f, "   {} {}", "=".bright_cyan(), format!("note: {}", note).bright_cyan())?;
        }

        Ok(())
    }
}

impl std::error::Error for MiniError {}

/// Computes the Levenshtein distance between two strings
/// Used for "Did you mean?" suggestions
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    if s1_chars.is_empty() {
        return s2_chars.len();
    }
    if s2_chars.is_empty() {
        return s1_chars.len();
    }

    // Single rolling row instead of the full matrix
    let mut previous: Vec<usize> = (0..=s2_chars.len()).collect();
    let mut current = vec![0; s2_chars.len() + 1];

    for (i, c1) in s1_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, c2) in s2_chars.iter().enumerate() {
            let cost = if c1 == c2 { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1).min(current[j] + 1).min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[s2_chars.len()]
}

/// Find the closest match from a list of candidates using Levenshtein distance
/// Returns None if no good match is found (distance > 3)
pub fn find_closest_match<'a>(target: &str, candidates: &'a [String]) -> Option<&'a str> {
    let mut best_match = None;
    let mut best_distance = usize::MAX;

    for candidate in candidates {
        let distance = levenshtein_distance(target, candidate);
        if distance <= 3 && distance < best_distance {
            best_distance = distance;
            best_match = Some(candidate.as_str());
        }
    }

    best_match
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("counter", "counter"), 0);
        assert_eq!(levenshtein_distance("lenght", "length"), 2);
    }

    #[test]
    fn test_find_closest_match_respects_threshold() {
        let candidates = vec!["counter".to_string(), "print".to_string()];
        assert_eq!(find_closest_match("countr", &candidates), Some("counter"));
        assert_eq!(find_closest_match("completely_different", &candidates), None);
    }

    #[test]
    fn test_error_kinds_map_to_classes() {
        assert_eq!(ErrorKind::LexError.class(), ErrorClass::Lexical);
        assert_eq!(ErrorKind::SyntaxError.class(), ErrorClass::Syntax);
        assert_eq!(ErrorKind::KeyError.class(), ErrorClass::Runtime);
        assert_eq!(ErrorKind::DivisionByZero.class(), ErrorClass::Runtime);
    }

    #[test]
    fn test_display_includes_location_and_suggestion() {
        colored::control::set_override(false);
        let err = MiniError::syntax_error("Unexpected token RPAREN", SourceLocation::new(3, 7))
            .with_suggestion("foo");
        let rendered = err.to_string();
        assert!(rendered.contains("Syntax Error: Unexpected token RPAREN"));
        assert!(rendered.contains("--> 3:7"));
        assert!(rendered.contains("Did you mean 'foo'?"));
    }
}
