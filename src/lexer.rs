// File: src/lexer.rs
//
// Lexical analyzer (tokenizer) for the mini language.
// Converts source text into a stream of position-tagged tokens, handed out
// one at a time with a single memoized token of lookahead.
//
// Supports:
// - Keywords: if, else, match, class, enum, while, for, break, continue, return
// - Booleans (true/false), identifiers and floating-point numbers
// - Single- or double-quoted strings with \n \t \r \\ \" \' escapes
// - Operators: + - * / % ^ == != < > <= >= && || ! = += -= *= /= %= ^= => .
// - Punctuation: , ; : ? ( ) { } [ ] #{
// - Comments: // to end of line and /* ... */ (non-nesting)

use crate::errors::{MiniError, SourceLocation};
use std::fmt;

pub const KEYWORDS: [&str; 10] =
    ["if", "else", "match", "class", "enum", "while", "for", "break", "continue", "return"];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Bool(bool),
    Identifier(String),
    Keyword(String),
    Comment(String),
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
    Not,
    Assignment,
    PlusEqual,
    MinusEqual,
    TimesEqual,
    DivEqual,
    ModEqual,
    PowEqual,
    RightArrow,
    Dot,
    Comma,
    Semicolon,
    Colon,
    Question,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    HashBrace,
    Eof,
}

impl TokenKind {
    /// Upper-case kind name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Number(_) => "NUMBER",
            TokenKind::Str(_) => "STRING",
            TokenKind::Bool(_) => "BOOLEAN",
            TokenKind::Identifier(_) => "IDENTIFIER",
            TokenKind::Keyword(_) => "KEYWORD",
            TokenKind::Comment(_) => "COMMENT",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Multiply => "MULTIPLY",
            TokenKind::Divide => "DIVIDE",
            TokenKind::Modulo => "MODULO",
            TokenKind::Power => "POWER",
            TokenKind::Equal => "EQUAL",
            TokenKind::NotEqual => "NOTEQUAL",
            TokenKind::Less => "LESS",
            TokenKind::Greater => "GREATER",
            TokenKind::LessEqual => "LESSEQUAL",
            TokenKind::GreaterEqual => "GREATEREQUAL",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::Assignment => "ASSIGNMENT",
            TokenKind::PlusEqual => "PLUSEQUAL",
            TokenKind::MinusEqual => "MINUSEQUAL",
            TokenKind::TimesEqual => "TIMESEQUAL",
            TokenKind::DivEqual => "DIVEQUAL",
            TokenKind::ModEqual => "MODEQUAL",
            TokenKind::PowEqual => "POWEQUAL",
            TokenKind::RightArrow => "RIGHTARROW",
            TokenKind::Dot => "DOT",
            TokenKind::Comma => "COMMA",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Colon => "COLON",
            TokenKind::Question => "QUESTION",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::HashBrace => "HASHBRACE",
            TokenKind::Eof => "EOF",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            TokenKind::Number(n) => write!(f, "{}: '{}'", self.kind.name(), n),
            TokenKind::Str(s) | TokenKind::Identifier(s) | TokenKind::Keyword(s) => {
                write!(f, "{}: '{}'", self.kind.name(), s)
            }
            TokenKind::Bool(b) => write!(f, "{}: '{}'", self.kind.name(), b),
            _ => write!(f, "{}", self.kind.name()),
        }?;
        write!(f, " at {}:{}", self.line, self.column)
    }
}

/// Pull-based tokenizer over a source string
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    peeked: Option<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer { chars: source.chars().collect(), pos: 0, line: 1, column: 1, peeked: None }
    }

    /// Consume and return the next token
    pub fn next_token(&mut self) -> Result<Token, MiniError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan_token(),
        }
    }

    /// Return the next token without consuming it
    pub fn peek_token(&mut self) -> Result<&Token, MiniError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// True once only end of input remains (comments count as input)
    pub fn is_done(&mut self) -> Result<bool, MiniError> {
        Ok(self.peek_token()?.kind == TokenKind::Eof)
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn lookahead(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: String) -> MiniError {
        MiniError::lex_error(message, SourceLocation::new(self.line, self.column))
    }

    fn scan_token(&mut self) -> Result<Token, MiniError> {
        while let Some(' ' | '\t' | '\r' | '\n') = self.current() {
            self.bump();
        }

        let (line, column) = (self.line, self.column);
        let token = |kind| Token { kind, line, column };

        let c = match self.bump() {
            Some(c) => c,
            None => return Ok(token(TokenKind::Eof)),
        };

        let kind = match c {
            '/' if self.current() == Some('/') => self.read_line_comment(),
            '/' if self.current() == Some('*') => self.read_block_comment(line, column)?,
            '"' | '\'' => self.read_string(c, line, column)?,
            '0'..='9' => self.read_number(c),
            'a'..='z' | 'A'..='Z' | '_' => self.read_identifier(c),
            '#' if self.current() == Some('{') => {
                self.bump();
                TokenKind::HashBrace
            }
            '&' if self.current() == Some('&') => {
                self.bump();
                TokenKind::And
            }
            '|' if self.current() == Some('|') => {
                self.bump();
                TokenKind::Or
            }
            '+' | '-' | '*' | '/' | '%' | '^' | '=' | '!' | '<' | '>' => self.read_operator(c),
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            other => {
                return Err(MiniError::lex_error(
                    format!("Unexpected character '{}'", other),
                    SourceLocation::new(line, column),
                ))
            }
        };

        Ok(token(kind))
    }

    /// Operators that may be followed by `=` (or `>` for `=>`)
    fn read_operator(&mut self, op: char) -> TokenKind {
        if self.current() == Some('=') {
            let kind = match op {
                '+' => TokenKind::PlusEqual,
                '-' => TokenKind::MinusEqual,
                '*' => TokenKind::TimesEqual,
                '/' => TokenKind::DivEqual,
                '%' => TokenKind::ModEqual,
                '^' => TokenKind::PowEqual,
                '=' => TokenKind::Equal,
                '!' => TokenKind::NotEqual,
                '<' => TokenKind::LessEqual,
                _ => TokenKind::GreaterEqual,
            };
            self.bump();
            return kind;
        }
        if op == '=' && self.current() == Some('>') {
            self.bump();
            return TokenKind::RightArrow;
        }
        match op {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Multiply,
            '/' => TokenKind::Divide,
            '%' => TokenKind::Modulo,
            '^' => TokenKind::Power,
            '=' => TokenKind::Assignment,
            '!' => TokenKind::Not,
            '<' => TokenKind::Less,
            _ => TokenKind::Greater,
        }
    }

    fn read_line_comment(&mut self) -> TokenKind {
        self.bump(); // second '/'
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        TokenKind::Comment(text.trim().to_string())
    }

    fn read_block_comment(&mut self, line: usize, column: usize) -> Result<TokenKind, MiniError> {
        self.bump(); // '*'
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('*') if self.current() == Some('/') => {
                    self.bump();
                    return Ok(TokenKind::Comment(text.trim().to_string()));
                }
                Some(c) => text.push(c),
                None => {
                    return Err(MiniError::lex_error(
                        "Unterminated block comment",
                        SourceLocation::new(line, column),
                    ))
                }
            }
        }
    }

    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Result<TokenKind, MiniError> {
        let mut s = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(TokenKind::Str(s)),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some(other) => {
                            return Err(self.error(format!("Invalid escape sequence '\\{}'", other)))
                        }
                        None => break,
                    };
                    s.push(escaped);
                }
                Some(c) => s.push(c),
                None => break,
            }
        }
        Err(MiniError::lex_error("Unterminated string literal", SourceLocation::new(line, column)))
    }

    /// Digits with at most one decimal point; a '.' only belongs to the
    /// number when a digit follows it
    fn read_number(&mut self, first: char) -> TokenKind {
        let mut num = String::from(first);
        let mut seen_dot = false;
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                num.push(c);
            } else if c == '.'
                && !seen_dot
                && self.lookahead().map_or(false, |next| next.is_ascii_digit())
            {
                seen_dot = true;
                num.push(c);
            } else {
                break;
            }
            self.bump();
        }
        // Only ASCII digits and one '.' were collected
        TokenKind::Number(num.parse().unwrap_or(f64::NAN))
    }

    fn read_identifier(&mut self, first: char) -> TokenKind {
        let mut ident = String::from(first);
        while let Some(c) = self.current() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            word if KEYWORDS.contains(&word) => TokenKind::Keyword(ident),
            _ => TokenKind::Identifier(ident),
        }
    }
}

/// Tokenizes a whole source string, including comments, up to and
/// including the final Eof token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, MiniError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("== != <= >= && || += -= *= /= %= ^= =>"),
            vec![
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::PlusEqual,
                TokenKind::MinusEqual,
                TokenKind::TimesEqual,
                TokenKind::DivEqual,
                TokenKind::ModEqual,
                TokenKind::PowEqual,
                TokenKind::RightArrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hash_brace_is_distinct_from_brace() {
        assert_eq!(
            kinds("#{ } { }"),
            vec![
                TokenKind::HashBrace,
                TokenKind::RBrace,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_keywords_booleans_and_identifiers() {
        assert_eq!(
            kinds("if else while true false _foo bar2"),
            vec![
                TokenKind::Keyword("if".into()),
                TokenKind::Keyword("else".into()),
                TokenKind::Keyword("while".into()),
                TokenKind::Bool(true),
                TokenKind::Bool(false),
                TokenKind::Identifier("_foo".into()),
                TokenKind::Identifier("bar2".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_allow_one_decimal_point() {
        assert_eq!(
            kinds("42 3.5 1.2.3"),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(3.5),
                TokenKind::Number(1.2),
                TokenKind::Dot,
                TokenKind::Number(3.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_member_access_after_number_index() {
        assert_eq!(
            kinds("l[0].a"),
            vec![
                TokenKind::Identifier("l".into()),
                TokenKind::LBracket,
                TokenKind::Number(0.0),
                TokenKind::RBracket,
                TokenKind::Dot,
                TokenKind::Identifier("a".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\n\t\"b" 'it\'s'"#),
            vec![
                TokenKind::Str("a\n\t\"b".into()),
                TokenKind::Str("it's".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_are_emitted() {
        assert_eq!(
            kinds("// line\n/* block */ 1"),
            vec![
                TokenKind::Comment("line".into()),
                TokenKind::Comment("block".into()),
                TokenKind::Number(1.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_positions_are_tracked() {
        let tokens = tokenize("a\n  bb").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }

    #[test]
    fn test_unknown_character_is_fatal() {
        let err = tokenize("a = $").unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexError);
        assert_eq!(err.location, SourceLocation::new(1, 5));
    }

    #[test]
    fn test_unterminated_string_is_fatal() {
        let err = tokenize("\"abc").unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexError);
        assert!(err.message.contains("Unterminated"));
    }

    #[test]
    fn test_invalid_escape_is_fatal() {
        let err = tokenize(r#""\q""#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexError);
    }

    #[test]
    fn test_peek_is_memoized() {
        let mut lexer = Lexer::new("x y");
        assert_eq!(lexer.peek_token().unwrap().kind, TokenKind::Identifier("x".into()));
        assert_eq!(lexer.peek_token().unwrap().kind, TokenKind::Identifier("x".into()));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier("x".into()));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier("y".into()));
        assert!(lexer.is_done().unwrap());
    }
}
