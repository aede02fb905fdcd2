//! Driver‑facing context for running source units.
//!
//! A [`Session`] owns everything that outlives a single unit: the interpreter
//! (and with it the global scope) plus the two error flags the driver turns
//! into an exit code. Nothing here is process‑global, so a REPL can keep one
//! session alive and [`Session::reset`] it between lines.

use std::io::{self, Write};

use log::{debug, info, warn};

use crate::error::LoxError;
use crate::expr::Expr;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::stmt::Stmt;
use crate::token::Token;
use crate::value::Value;

/// Invalid invocation of the driver.
pub const EXIT_USAGE: i32 = 64;

/// A syntax, lexical or static error was reported.
pub const EXIT_DATA_ERROR: i32 = 65;

/// A runtime error was reported.
pub const EXIT_SOFTWARE: i32 = 70;

pub struct Session {
    interpreter: Interpreter,
    diagnostics: Box<dyn Write>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Program output on stdout, diagnostics on stderr.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_output(out: Box<dyn Write>, diagnostics: Box<dyn Write>) -> Self {
        info!("Session created");

        Self {
            interpreter: Interpreter::with_output(out),
            diagnostics,
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clears both flags. Global bindings are kept.
    pub fn reset(&mut self) {
        debug!("Resetting session error flags");

        self.had_error = false;
        self.had_runtime_error = false;
    }

    /// 65 after a static error, 70 after a runtime error, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.had_error {
            EXIT_DATA_ERROR
        } else if self.had_runtime_error {
            EXIT_SOFTWARE
        } else {
            0
        }
    }

    /// Writes one diagnostic line and raises the matching flag.
    pub fn report(&mut self, error: &LoxError) {
        debug!("Reporting error on line {:?}: {}", error.line(), error.message());

        if error.is_static() {
            self.had_error = true;
        } else {
            self.had_runtime_error = true;
        }

        if let Err(e) = writeln!(self.diagnostics, "{}", error) {
            warn!("Failed to write diagnostic: {}", e);
        }
        if let Err(e) = self.diagnostics.flush() {
            warn!("Failed to flush diagnostics: {}", e);
        }
    }

    fn report_all(&mut self, errors: &[LoxError]) {
        for error in errors {
            self.report(error);
        }
    }

    /// Scan, parse, validate and run one unit. Returns `true` when it ran to
    /// completion without any reported error.
    pub fn run(&mut self, source: &str) -> bool {
        let (tokens, lex_errors) = scan_tokens(source);
        self.report_all(&lex_errors);

        // Parse even after lexical errors so syntax errors surface too.
        let Some(program) = self.parse(tokens) else {
            return false;
        };

        if !lex_errors.is_empty() {
            return false;
        }

        self.interpret(&program)
    }

    /// Lexical errors are reported; the token stream is returned regardless.
    pub fn scan(&mut self, source: &str) -> Vec<Token> {
        let (tokens, errors) = scan_tokens(source);
        self.report_all(&errors);
        tokens
    }

    /// Parses and validates a program; `None` when any error was reported.
    pub fn parse(&mut self, tokens: Vec<Token>) -> Option<Vec<Stmt>> {
        let program: Vec<Stmt> = match Parser::new(tokens).parse() {
            Ok(program) => program,
            Err(errors) => {
                self.report_all(&errors);
                return None;
            }
        };

        if let Err(errors) = Resolver::new().resolve(&program) {
            self.report_all(&errors);
            return None;
        }

        Some(program)
    }

    /// Parses and validates a single expression.
    pub fn parse_expression(&mut self, tokens: Vec<Token>) -> Option<Expr> {
        let expr: Expr = match Parser::new(tokens).parse_expression() {
            Ok(expr) => expr,
            Err(errors) => {
                self.report_all(&errors);
                return None;
            }
        };

        if let Err(errors) = Resolver::new().resolve_expression(&expr) {
            self.report_all(&errors);
            return None;
        }

        Some(expr)
    }

    /// Runs a validated program; `false` if a runtime error was reported.
    pub fn interpret(&mut self, program: &[Stmt]) -> bool {
        match self.interpreter.interpret(program) {
            Ok(()) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Evaluates one expression in the global scope.
    pub fn evaluate(&mut self, expr: &Expr) -> Option<Value> {
        match self.interpreter.evaluate(expr) {
            Ok(value) => Some(value),
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }
}
