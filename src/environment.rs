use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope. Closures keep their defining scope alive through it.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: a name → value table plus a link to the enclosing scope
/// (`None` for globals). Chains only point outward, so `Rc` never cycles
/// through the parent link.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Fresh global scope behind a shared handle.
    pub fn global() -> EnvRef {
        Rc::new(RefCell::new(Environment::new()))
    }

    /// New scope nested inside `parent`.
    pub fn child(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(parent))))
    }

    /// Binds `name` in this scope, overwriting an earlier binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks `name` up through the whole chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().lookup(name)
        } else {
            None
        }
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        self.lookup(&name.lexeme).ok_or_else(|| {
            LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
        })
    }

    /// Overwrites the innermost existing binding of `name`. Never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn define_then_get() {
        let mut env = Environment::new();
        env.define("foo", Value::from("bar"));
        env.define("baz", Value::Bool(false));

        assert_eq!(env.get(&ident("foo")).unwrap(), Value::from("bar"));
        assert_eq!(env.get(&ident("baz")).unwrap(), Value::Bool(false));
    }

    #[test]
    fn redefinition_in_same_scope_overwrites() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.define("a", Value::Number(2.0));

        assert_eq!(env.get(&ident("a")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let mut env = Environment::new();

        let err = env.get(&ident("nope")).unwrap_err();
        assert_eq!(err.to_string(), "[line 1] Error: Undefined variable 'nope'.");

        assert!(env.assign(&ident("nope"), Value::Nil).is_err());
        assert!(env.lookup("nope").is_none());
    }

    #[test]
    fn assign_walks_out_to_the_defining_scope() {
        let outer = Environment::global();
        outer.borrow_mut().define("foo", Value::from("bar"));

        let inner = Environment::child(&outer);
        inner
            .borrow_mut()
            .assign(&ident("foo"), Value::Number(3.0))
            .unwrap();

        assert!(inner.borrow().values.is_empty());
        assert_eq!(outer.borrow().lookup("foo"), Some(Value::Number(3.0)));
    }

    #[test]
    fn inner_definition_shadows_outer() {
        let outer = Environment::global();
        outer.borrow_mut().define("x", Value::Number(1.0));

        let inner = Environment::child(&outer);
        inner.borrow_mut().define("x", Value::Number(2.0));

        assert_eq!(inner.borrow().lookup("x"), Some(Value::Number(2.0)));
        assert_eq!(outer.borrow().lookup("x"), Some(Value::Number(1.0)));
    }
}
