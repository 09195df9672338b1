use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope frame.  Closures, the interpreter's current
/// scope and child frames may all hold one at the same time.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: bindings plus an optional enclosing frame.
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

    /// Wrap in a fresh shared handle.
    pub fn shared(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind `name` in this frame, shadowing or overwriting any previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this frame only.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Overwrite an existing binding in this frame.  Returns `false` if
    /// `name` is not bound here.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// Walk exactly `distance` enclosing links from `env`.
///
/// Returns `None` if the chain is shorter than `distance`, which means the
/// resolver and the interpreter disagree about scope structure.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current = Rc::clone(env);

    for _ in 0..distance {
        let next = current.borrow().enclosing()?;
        current = next;
    }

    Some(current)
}

/// Read `name` from the frame `distance` hops above `env`.
pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
    ancestor(env, distance)?.borrow().get(name)
}

/// Write `name` in the frame `distance` hops above `env`.
pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> bool {
    match ancestor(env, distance) {
        Some(frame) => frame.borrow_mut().assign(name, value),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hops_reach_the_declaring_frame() {
        let globals = Environment::new().shared();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let middle = Environment::with_enclosing(Rc::clone(&globals)).shared();
        middle.borrow_mut().define("a", Value::Number(2.0));

        let inner = Environment::with_enclosing(Rc::clone(&middle)).shared();

        assert_eq!(get_at(&inner, 1, "a"), Some(Value::Number(2.0)));
        assert_eq!(get_at(&inner, 2, "a"), Some(Value::Number(1.0)));
        assert_eq!(get_at(&inner, 0, "a"), None);
        assert!(ancestor(&inner, 3).is_none());
    }

    #[test]
    fn writes_are_visible_through_every_handle() {
        let shared = Environment::new().shared();
        shared.borrow_mut().define("x", Value::Nil);

        let a = Environment::with_enclosing(Rc::clone(&shared)).shared();
        let b = Environment::with_enclosing(Rc::clone(&shared)).shared();

        assert!(assign_at(&a, 1, "x", Value::Bool(true)));
        assert_eq!(get_at(&b, 1, "x"), Some(Value::Bool(true)));
        assert!(!assign_at(&a, 1, "y", Value::Nil));
    }
}
