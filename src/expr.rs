use serde::Serialize;

use crate::token::Token;

/// A **literal constant** that appears directly in the source code.
///
/// These variants are the *terminal leaves* of the expression tree; the
/// parser copies the value out of the token at parse‑time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
/// Operator and name tokens are kept for error reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Literal(LiteralValue),

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix `!` or `-`.
    Unary { operator: Token, right: Box<Expr> },

    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// `left , right` ‑ evaluates `left`, discards it, yields `right`.
    Comma { left: Box<Expr>, right: Box<Expr> },

    Variable(Token),

    Assign { name: Token, value: Box<Expr> },

    Call {
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This(Token),

    /// `super.method`
    Super { keyword: Token, method: Token },
}
