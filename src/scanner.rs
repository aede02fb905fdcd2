//! Lexical analysis.
//!
//! [`Scanner`] walks the source once and yields one `Result<Token>` per
//! lexeme. A bad character or an unterminated string produces an `Err` item
//! and scanning carries on after it, so a single pass reports every lexical
//! problem. The stream always finishes with exactly one `EOF` token and stays
//! exhausted afterwards.
//!
//! [`scan_tokens`] drains a scanner into tokens and diagnostics.
//!
//! # Lexemes
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`, `?`, `:`.
//! - Two‑character operators: `!=`, `==`, `<=`, `>=` (maximal munch).
//! - Comments: `//` to end of line, `/* … */` up to the *first* `*/` (no nesting).
//! - String literals: `"` … `"`, allowing multi‑line and reporting unterminated errors.
//! - Numeric literals: integer and optional fractional part.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a perfect‑hash `KEYWORDS` map.
//!
//! Comment bodies are skipped with `memchr`/`memmem` searches; the newlines
//! they contain still advance the line counter.
//!
//! # Example
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let mut scanner = Scanner::new("print 123; // example");
//! for result in &mut scanner {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr_iter, memmem};
use phf::phf_map;
use std::iter::FusedIterator;

// Reserved words, looked up once an identifier has been consumed.

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Streaming lexer over one source unit.
pub struct Scanner<'a> {
    text: &'a str,
    src: &'a [u8],

    /// Byte offset where the lexeme being scanned begins.
    start: usize,
    /// Next byte to look at.
    curr: usize,
    line: usize,

    /// Kind of the lexeme `scan_token` just recognised, if it was not trivia.
    pending: Option<TokenType>,
    finished: bool,
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `text`.
    #[inline]
    pub fn new(text: &'a str) -> Self {
        info!("Scanner created over {} bytes", text.len());

        Self {
            text,
            src: text.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
            finished: false,
        }
    }

    // ── cursor ──────────────────────────────────────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Consumes one byte. Only called when input remains.
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Current byte, or `0` at the end.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Byte after the current one, or `0`.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Pick between a two‑byte operator and its one‑byte prefix.
    #[inline(always)]
    fn either(&mut self, second: u8, long: TokenType, short: TokenType) -> TokenType {
        if self.match_byte(second) {
            long
        } else {
            short
        }
    }

    // ── lexemes ─────────────────────────────────────────────────────────

    /// Consumes one lexeme starting at `start`. Trivia leaves `pending` empty.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt: TokenType = match b {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,
            b'?' => TokenType::QUESTION,
            b':' => TokenType::COLON,

            // Longest match wins.
            b'!' => self.either(b'=', TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(b'=', TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            b' ' | b'\r' | b'\t' => return Ok(()),

            b'\n' => {
                self.line += 1;
                return Ok(());
            }

            b'/' => {
                if self.match_byte(b'/') {
                    self.skip_line_comment();
                    return Ok(());
                }

                if self.match_byte(b'*') {
                    self.skip_block_comment();
                    return Ok(());
                }

                TokenType::SLASH
            }

            b'"' => return self.parse_string(),

            b'0'..=b'9' => self.parse_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            _ => {
                // Skip the rest of a multi‑byte UTF‑8 sequence so the error is
                // reported once per character and lexemes stay on char boundaries.
                while !self.is_at_end() && !self.text.is_char_boundary(self.curr) {
                    self.curr += 1;
                }

                debug!(
                    "Unexpected character {:?} on line {}",
                    &self.text[self.start..self.curr],
                    self.line
                );

                return Err(LoxError::lex(self.line, "Unexpected character."));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// `//` comment: fast‑forward to the next newline (left for the main loop
    /// so it bumps `line`), or to EOF.
    fn skip_line_comment(&mut self) {
        match memchr(b'\n', &self.src[self.curr..]) {
            Some(pos) => self.curr += pos,
            None => self.curr = self.len(),
        }
    }

    /// `/* … */` comment: ends at the first `*/`; stray `*` or `/` inside are
    /// plain content. An unterminated comment runs to EOF.
    fn skip_block_comment(&mut self) {
        let rest: &[u8] = &self.src[self.curr..];

        let (body_len, skip) = match memmem::find(rest, b"*/") {
            Some(pos) => (pos, pos + 2),
            None => (rest.len(), rest.len()),
        };

        self.line += memchr_iter(b'\n', &rest[..body_len]).count();
        self.curr += skip;
    }

    /// String body up to the closing quote. Newlines are allowed and counted.
    fn parse_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        let s: &str = &self.text[self.start + 1..self.curr - 1];

        self.pending = Some(TokenType::STRING(s.to_owned()));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`).  Fractions are optional; a
    /// trailing `.` with no digit after it is left for the next token.
    fn parse_number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let s: &str = &self.text[self.start..self.curr];

        // Only ASCII digits with at most one inner '.' reach this point.
        let n: f64 = s.parse::<f64>().unwrap_or(0.0);

        TokenType::NUMBER(n)
    }

    fn parse_identifier(&mut self) -> TokenType {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.advance();
        }

        match KEYWORDS.get(&self.src[self.start..self.curr]) {
            Some(keyword) => keyword.clone(),
            None => TokenType::IDENTIFIER,
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            if self.is_at_end() {
                self.finished = true;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(kind) = self.pending.take() {
                let lexeme: &str = &self.text[self.start..self.curr];
                debug!("Scanned {:?} on line {}", kind, self.line);

                return Some(Ok(Token::new(kind, lexeme, self.line)));
            }
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan a whole source unit, separating tokens from lexical diagnostics.
/// The token vector always ends with a single `EOF`.
pub fn scan_tokens(source: &str) -> (Vec<Token>, Vec<LoxError>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Scanned {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
