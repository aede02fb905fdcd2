//! Static validation pass for the **Lox** interpreter.
//!
//! Runs over a parsed program before it is executed and reports the errors
//! that depend on *where* a construct appears rather than on its shape:
//!
//! 1. `return` outside of any function body.
//! 2. `this` outside of a class method.
//! 3. `super` outside of a class, or in a class that has no superclass.
//! 4. A class that names itself as its superclass.
//!
//! Name lookup stays dynamic (see [`Environment`]); this pass never rewrites
//! or annotates the tree. All errors are collected so that one unit can report
//! several of them, and any error keeps the unit from running.
//!
//! [`Environment`]: crate::environment::Environment

use crate::error::LoxError;
use crate::expr::Expr;
use crate::stmt::{FunctionDecl, Stmt};
use log::{debug, info};

/// Innermost enclosing function body, if any.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
}

/// Innermost enclosing class body, if any.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver {
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<LoxError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements, returning every error found.
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<(), Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    /// Validate a lone expression (expression‑only mode).
    pub fn resolve_expression(mut self, expr: &Expr) -> Result<(), Vec<LoxError>> {
        self.resolve_expr(expr);

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ── statements ──────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::Var { initializer, .. } => {
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
            }

            Stmt::Block(statements) => self.resolve_stmts(statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Function(decl) => self.resolve_function(decl, FunctionType::Function),

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.errors.push(LoxError::resolve(
                        keyword,
                        "Can't return from top-level code.",
                    ));
                }

                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Resolving class '{}'", name.lexeme);

                let enclosing: ClassType = self.current_class;
                self.current_class = ClassType::Class;

                if let Some(superclass) = superclass {
                    if let Expr::Variable(super_name) = superclass {
                        if super_name.lexeme == name.lexeme {
                            self.errors.push(LoxError::resolve(
                                super_name,
                                "A class can't inherit from itself.",
                            ));
                        }
                    }

                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(superclass);
                }

                for method in methods {
                    self.resolve_function(method, FunctionType::Method);
                }

                self.current_class = enclosing;
            }
        }
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        self.resolve_stmts(&decl.body);

        self.current_function = enclosing;
    }

    // ── expressions ─────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) | Expr::Variable(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. }
            | Expr::Logical { left, right, .. }
            | Expr::Comma { left, right } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Assign { value, .. } => self.resolve_expr(value),

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This(keyword) => {
                if self.current_class == ClassType::None {
                    self.errors.push(LoxError::resolve(
                        keyword,
                        "Can't use 'this' outside of a class.",
                    ));
                }
            }

            Expr::Super { keyword, .. } => match self.current_class {
                ClassType::None => self.errors.push(LoxError::resolve(
                    keyword,
                    "Can't use 'super' outside of a class.",
                )),
                ClassType::Class => self.errors.push(LoxError::resolve(
                    keyword,
                    "Can't use 'super' in a class with no superclass.",
                )),
                ClassType::Subclass => {}
            },
        }
    }
}
