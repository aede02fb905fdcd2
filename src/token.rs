use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

/// Token kinds, spelled the way `tokenize` prints them.
///
/// Only `STRING` and `NUMBER` carry a payload: the unquoted text and the
/// parsed value respectively.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenType {
    // Punctuation, including the `?` / `:` pair of the conditional operator.
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    DOT,
    MINUS,
    PLUS,
    SEMICOLON,
    SLASH,
    STAR,
    QUESTION,
    COLON,

    // One or two characters
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    // Literals
    IDENTIFIER,
    STRING(String),
    NUMBER(f64),

    // Reserved words
    AND,
    CLASS,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,

    EOF,
}

/// Maps every payload-free kind to its own identifier.
macro_rules! kind_names {
    ($value:expr; $($kind:ident),* $(,)?) => {
        match $value {
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            $(TokenType::$kind => stringify!($kind),)*
        }
    };
}

impl TokenType {
    /// Two TokenTypes are the same *kind* if they share the same variant,
    /// ignoring any literal payload. The parser matches on kinds only.
    #[inline]
    pub fn same_kind(&self, other: &TokenType) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// Variant name without payload, as printed by `tokenize`.
    pub fn name(&self) -> &'static str {
        kind_names!(self;
            LEFT_PAREN, RIGHT_PAREN, LEFT_BRACE, RIGHT_BRACE, COMMA, DOT, MINUS, PLUS,
            SEMICOLON, SLASH, STAR, QUESTION, COLON,
            BANG, BANG_EQUAL, EQUAL, EQUAL_EQUAL, GREATER, GREATER_EQUAL, LESS, LESS_EQUAL,
            IDENTIFIER,
            AND, CLASS, ELSE, FALSE, FUN, FOR, IF, NIL, OR, PRINT, RETURN, SUPER, THIS,
            TRUE, VAR, WHILE,
            EOF,
        )
    }
}

/// Literal payload of a scanned token, borrowed from its [`TokenType`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'t> {
    Number(f64),
    Str(&'t str),
}

/// A scanned token, including its type, the original lexeme,
/// and the line number where it was found.
///
/// Tokens own their lexeme so that AST nodes (and the closures built from
/// them) can outlive the source buffer of a single REPL line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl Token {
    /// Create a new Token with the given type, lexeme, and line.
    pub fn new(token_type: TokenType, lexeme: impl Into<String>, line: usize) -> Self {
        let lexeme: String = lexeme.into();

        debug!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type, lexeme, line
        );

        Self {
            token_type,
            lexeme,
            line,
        }
    }

    /// The literal value carried by NUMBER and STRING tokens.
    pub fn literal(&self) -> Option<Literal<'_>> {
        match &self.token_type {
            TokenType::NUMBER(n) => Some(Literal::Number(*n)),
            TokenType::STRING(s) => Some(Literal::Str(s)),
            _ => None,
        }
    }

    #[inline]
    pub fn is(&self, kind: &TokenType) -> bool {
        self.token_type.same_kind(kind)
    }
}

/// Formats a number literal the way the tokenizer and AST printer show it:
/// integral values keep a trailing `.0` (`3` → `3.0`), others print as is.
pub fn format_number_literal(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        // 3 → "3.0", -0 → "-0.0"
        let mut buf: itoa::Buffer = itoa::Buffer::new();
        let sign: &str = if n.is_sign_negative() && n == 0.0 { "-" } else { "" };
        format!("{}{}.0", sign, buf.format(n as i64))
    } else {
        format!("{:?}", n)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.literal() {
            Some(Literal::Str(s)) => write!(f, "{} {} {}", self.token_type.name(), self.lexeme, s),
            Some(Literal::Number(n)) => write!(
                f,
                "{} {} {}",
                self.token_type.name(),
                self.lexeme,
                format_number_literal(n)
            ),
            None => write!(f, "{} {} null", self.token_type.name(), self.lexeme),
        }
    }
}
