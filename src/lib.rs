//! `rox` ‑ a tree‑walking interpreter for the Lox scripting language.
//!
//! Pipeline: [`scanner`] → [`parser`] → [`resolver`] → [`interpreter`],
//! driven one source unit at a time through a [`session::Session`].

pub mod ast_printer;
pub mod callable;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod session;
pub mod stmt;
pub mod token;
pub mod value;

pub use error::{LoxError, Result};
pub use session::Session;
