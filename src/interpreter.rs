//! Tree‑walking evaluator.
//!
//! Statements run for their effect and yield a [`Flow`]; expressions yield a
//! [`Value`]. `return` travels up as `Flow::Return` until the function call
//! that owns it consumes it, so the error channel only ever carries real
//! failures.

use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::callable::{Callable, LoxClass, LoxFunction, LoxInstance, NativeFunction};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::expr::{Expr, LiteralValue};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Deepest chain of nested Lox calls before "Stack overflow." is reported.
///
/// Each Lox call costs several native frames (call, block, statement and
/// expression evaluation), so the driver runs on a thread whose stack is sized
/// to hold this many.
pub const MAX_CALL_DEPTH: usize = 1024;

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    out: Box<dyn Write>,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter printing to `out`; the global scope is seeded with the
    /// native functions.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::global();

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: |_args: &[Value]| {
                    let micros: i64 = chrono::Utc::now().timestamp_micros();
                    Ok(Value::Number(micros as f64 / 1_000_000.0))
                },
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            out,
            depth: 0,
        }
    }

    /// Runs a program. The first runtime error aborts the rest of it; global
    /// bindings made before that point are kept.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        // A previous unit may have failed inside a block or a call.
        self.environment = Rc::clone(&self.globals);
        self.depth = 0;

        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                warn!("Top-level return of {} ignored", value);
                break;
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");

        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope: EnvRef = Environment::child(&self.environment);
                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let flow @ Flow::Return(_) = self.execute(body)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                let function =
                    LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let superclass: Option<Rc<LoxClass>> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let token: &Token = match expr {
                                Expr::Variable(token) => token,
                                _ => name,
                            };
                            return Err(LoxError::runtime(token, "Superclass must be a class."));
                        }
                    },
                    None => None,
                };

                // Bound first so methods can refer to their own class.
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                let method_scope: EnvRef = match &superclass {
                    Some(superclass) => {
                        let scope: EnvRef = Environment::child(&self.environment);
                        scope
                            .borrow_mut()
                            .define("super", Value::Class(Rc::clone(superclass)));
                        scope
                    }
                    None => Rc::clone(&self.environment),
                };

                let mut table: HashMap<String, Rc<LoxFunction>> = HashMap::new();

                for method in methods {
                    let is_init: bool = method.name.lexeme == "init";
                    let function =
                        LoxFunction::new(Rc::clone(method), Rc::clone(&method_scope), is_init);
                    table.insert(method.name.lexeme.clone(), Rc::new(function));
                }

                let class = LoxClass::new(&name.lexeme, superclass, table);

                debug!("Defined class '{}'", name.lexeme);

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(Rc::new(class)))?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` inside `scope`, restoring the current scope afterwards
    /// on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: EnvRef) -> Result<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, scope);

        let result: Result<Flow> = self.execute_all(statements);

        self.environment = previous;

        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let flow @ Flow::Return(_) = self.execute(stmt)? {
                return Ok(flow);
            }
        }

        Ok(Flow::Normal)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let decided: bool = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Comma { left, right } => {
                self.evaluate(left)?;
                self.evaluate(right)
            }

            Expr::Variable(name) => self.environment.borrow().get(name),

            Expr::Assign { name, value } => {
                let value: Value = self.evaluate(value)?;

                self.environment
                    .borrow_mut()
                    .assign(name, value.clone())?;

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call_value(&callee, paren, args)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;

                instance.borrow_mut().set(&name.lexeme, value.clone());

                Ok(value)
            }

            Expr::This(keyword) => self.environment.borrow().get(keyword),

            Expr::Super { keyword, method } => self.evaluate_super(keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(
                    operator,
                    format!("Operand of '{}' must be a number.", operator.lexeme),
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

            _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        debug!("Binary '{}' on {} and {}", operator.lexeme, left, right);

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands of '+' must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a - b)),

            TokenType::STAR => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a * b)),

            // IEEE‑754: x / 0 is ±Infinity or NaN, not an error.
            TokenType::SLASH => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a / b)),

            TokenType::GREATER => numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a > b)),

            TokenType::GREATER_EQUAL => {
                numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a >= b))
            }

            TokenType::LESS => numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a < b)),

            TokenType::LESS_EQUAL => {
                numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
        }
    }

    fn evaluate_super(&mut self, keyword: &Token, method: &Token) -> Result<Value> {
        let superclass: Option<Value> = self.environment.borrow().lookup("super");
        let this: Option<Value> = self.environment.borrow().lookup("this");

        let (Some(Value::Class(superclass)), Some(Value::Instance(instance))) = (superclass, this)
        else {
            return Err(LoxError::runtime(
                keyword,
                "Can't use 'super' outside of a subclass method.",
            ));
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    /// Dispatches a call on any callable value after checking arity.
    fn call_value(
        &mut self,
        callee: &Value,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let callable: &dyn Callable = match callee {
            Value::Function(function) => function.as_ref(),
            Value::NativeFunction(native) => native.as_ref(),
            Value::Class(class) => class,
            other => {
                debug!("Attempted to call a {}", other.type_name());

                return Err(LoxError::runtime(
                    paren,
                    "Can only call functions and classes.",
                ));
            }
        };

        if arguments.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.depth >= MAX_CALL_DEPTH {
            debug!("Call depth limit of {} reached", MAX_CALL_DEPTH);
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.depth += 1;
        let result: Result<Value> = callable.call(self, arguments, paren);
        self.depth -= 1;

        result
    }
}

/// Both operands as numbers, or a type error naming the operator.
fn numbers(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(
            operator,
            format!("Operands of '{}' must be numbers.", operator.lexeme),
        )),
    }
}
