//! Runtime values and the callable objects behind them.
//!
//! Functions, classes and instances are shared through `Rc`.  A bound
//! method is a fresh [`Function`] whose closure is a one-frame environment
//! holding `this`, so an instance never stores a reference back to its
//! own methods and no ownership cycle is created by method binding.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};

/// Name of the constructor method.
pub const INITIALIZER: &str = "init";

pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Callable),
    Instance(Rc<RefCell<Instance>>),
}

/// Anything that can appear in callee position.
#[derive(Debug, Clone)]
pub enum Callable {
    Function(Rc<Function>),
    Class(Rc<Class>),
    Native(Rc<NativeFunction>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(f) => f.arity(),
            Callable::Class(c) => c.arity(),
            Callable::Native(n) => n.arity,
        }
    }
}

/// A host-implemented function such as `clock`.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// A user function or method together with the scope it closes over.
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub closure: EnvRef,
    pub is_initializer: bool,
}

impl fmt::Debug for Function {
    // The closure may reach this function again; print the name only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.arity()
    }

    pub fn name(&self) -> Option<&str> {
        self.declaration.name.as_ref().map(|i| i.name.as_str())
    }

    /// A copy of this method whose closure binds `this` to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let mut env = Environment::with_enclosing(Rc::clone(&self.closure));
        env.define("this", Value::Instance(instance));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: env.shared(),
            is_initializer: self.is_initializer,
        }
    }
}

#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Rc<Function>>,
}

impl Class {
    /// Look `name` up on this class, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass.as_ref()?.find_method(name)
    }

    /// Arity of `init`, or 0 without one.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, |init| init.arity())
    }
}

#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }
}

impl Value {
    /// `nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl PartialEq for Value {
    /// Value equality for primitives, identity for callables and instances.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Callable(a), Value::Callable(b)) => match (a, b) {
                (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
                (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
                (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Callable(Callable::Function(func)) => match func.name() {
                Some(name) => write!(f, "<fn {}>", name),
                None => write!(f, "<fn>"),
            },

            Value::Callable(Callable::Native(native)) => write!(f, "<native fn {}>", native.name),

            Value::Callable(Callable::Class(class)) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class.name),
        }
    }
}
