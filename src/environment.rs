use crate::error::{LoxError, Result};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope: a name→value table plus an optional enclosing frame.
///
/// Frames form a singly linked chain rooted at the globals; closures keep
/// their captured frame alive for as long as the function value exists.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this frame unconditionally, shadowing any earlier
    /// binding of the same name here.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Assignment never creates a binding; the name must already exist
    /// somewhere on the chain.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// The frame exactly `distance` enclosing steps out; `0` is `env`
    /// itself.  `None` if the chain is shorter than `distance`.
    pub fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let enclosing = frame.borrow().enclosing.clone()?;
            frame = enclosing;
        }

        Some(frame)
    }

    /// Read `name` directly out of the frame `distance` steps out.  The
    /// resolver guarantees the slot exists; a miss is still reported as a
    /// runtime error rather than a panic.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Value> {
        match Self::ancestor(env, distance) {
            Some(frame) => {
                let frame = frame.borrow();
                match frame.values.get(name) {
                    Some(value) => Ok(value.clone()),
                    None => Err(LoxError::runtime(
                        line,
                        format!("Undefined variable '{}'.", name),
                    )),
                }
            }
            None => Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            )),
        }
    }

    /// Write `name` directly into the frame `distance` steps out.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        match Self::ancestor(env, distance) {
            Some(frame) => {
                let mut frame = frame.borrow_mut();
                if frame.values.contains_key(name) {
                    frame.values.insert(name.to_string(), value);
                    Ok(())
                } else {
                    Err(LoxError::runtime(
                        line,
                        format!("Undefined variable '{}'.", name),
                    ))
                }
            }
            None => Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_get() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        assert_eq!(env.get("a", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn get_walks_the_chain() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&outer));
        assert_eq!(inner.get("a", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn shadowing_does_not_touch_the_outer_binding() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Number(1.0));

        let mut inner = Environment::with_enclosing(Rc::clone(&outer));
        inner.define("a", Value::Number(2.0));

        assert_eq!(inner.get("a", 1).unwrap(), Value::Number(2.0));
        assert_eq!(outer.borrow().get("a", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_updates_the_defining_frame() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Number(1.0));

        let inner = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(&outer))));
        inner
            .borrow_mut()
            .assign("a", Value::Number(5.0), 1)
            .unwrap();

        assert_eq!(outer.borrow().get("a", 1).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn assign_to_undefined_fails() {
        let mut env = Environment::new();
        assert!(env.assign("ghost", Value::Nil, 3).is_err());
    }

    #[test]
    fn get_at_reads_the_exact_frame() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(1.0));

        let middle = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &global,
        ))));
        middle.borrow_mut().define("a", Value::Number(2.0));

        let inner = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &middle,
        ))));

        assert_eq!(
            Environment::get_at(&inner, 1, "a", 1).unwrap(),
            Value::Number(2.0)
        );
        assert_eq!(
            Environment::get_at(&inner, 2, "a", 1).unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn assign_at_writes_the_exact_frame() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Number(1.0));

        let inner = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(&outer))));
        Environment::assign_at(&inner, 1, "a", Value::Number(9.0), 1).unwrap();

        assert_eq!(outer.borrow().get("a", 1).unwrap(), Value::Number(9.0));
    }
}
