//! Callable runtime objects: user functions and methods, classes, instances
//! and native functions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::Value;

/// Anything that can appear on the left of `(...)`.
pub trait Callable {
    fn arity(&self) -> usize;

    /// Invoke with already checked arguments. `site` is the closing paren of
    /// the call, used to locate errors raised by the callee itself.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        site: &Token,
    ) -> Result<Value>;
}

// ───────────────────────────── native functions ─────────────────────────────

pub type NativeFn = fn(&[Value]) -> std::result::Result<Value, String>;

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _: &mut Interpreter, arguments: Vec<Value>, site: &Token) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments).map_err(|message| LoxError::runtime(site, message))
    }
}

// ───────────────────────────── user functions ───────────────────────────────

/// A function or method value: the shared declaration plus the scope that was
/// active where it was defined.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// Method bound to `instance`: a new frame holding `this` sits between the
    /// method's closure and its call frames.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let env: EnvRef = Environment::child(&self.closure);
        env.borrow_mut().define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: env,
            is_initializer: self.is_initializer,
        }
    }
}

impl fmt::Debug for LoxFunction {
    // The closure is left out: it usually (transitively) contains this function.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}/{}>", self.name(), self.arity())
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _: &Token,
    ) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let frame: EnvRef = Environment::child(&self.closure);

        for (param, arg) in self.declaration.params.iter().zip(arguments) {
            frame.borrow_mut().define(&param.lexeme, arg);
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, frame)?;

        // `init` always hands back the instance, even through a bare `return;`.
        if self.is_initializer {
            return Ok(self.closure.borrow().lookup("this").unwrap_or(Value::Nil));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

// ───────────────────────────────── classes ──────────────────────────────────

#[derive(Debug)]
pub struct LoxClass {
    name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: &str,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        LoxClass {
            name: name.to_string(),
            superclass,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&Rc<LoxClass>> {
        self.superclass.as_ref()
    }

    /// Own methods first, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            Some(Rc::clone(method))
        } else if let Some(superclass) = &self.superclass {
            superclass.find_method(name)
        } else {
            None
        }
    }
}

impl Callable for Rc<LoxClass> {
    fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    /// Construct a new instance and run `init` on it if the class has one.
    /// The call yields the instance regardless of what `init` returns.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        site: &Token,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", self.name);

        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(self))));

        if let Some(init) = self.find_method("init") {
            init.bind(Rc::clone(&instance))
                .call(interpreter, arguments, site)?;
        }

        Ok(Value::Instance(instance))
    }
}

// ──────────────────────────────── instances ─────────────────────────────────

pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    /// Field first, then a method bound to this instance.
    pub fn get(instance: &Rc<RefCell<Self>>, name: &Token) -> Result<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let method: Option<Rc<LoxFunction>> = instance.borrow().class.find_method(&name.lexeme);

        match method {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Rc::clone(instance)),
            ))),
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    /// Writes a field, creating it if absent.
    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

impl fmt::Debug for LoxInstance {
    // Fields can point back at the instance, so only their names are shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&String> = self.fields.keys().collect();
        fields.sort();

        write!(f, "<{} instance {:?}>", self.class.name, fields)
    }
}
