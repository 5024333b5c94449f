use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

struct Frame {
    values: HashMap<String, Value>,
    enclosing: Option<Environment>,
}

/// A shared handle to one scope frame and, through it, the chain of
/// enclosing frames. Cloning the handle shares the frame.
#[derive(Clone)]
pub struct Environment {
    frame: Rc<RefCell<Frame>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            frame: Rc::new(RefCell::new(Frame {
                values: HashMap::new(),
                enclosing: None,
            })),
        }
    }

    pub fn with_enclosing(enclosing: &Environment) -> Self {
        Self {
            frame: Rc::new(RefCell::new(Frame {
                values: HashMap::new(),
                enclosing: Some(enclosing.clone()),
            })),
        }
    }

    /// Looks `name` up from this frame outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        let frame = self.frame.borrow();
        if let Some(value) = frame.values.get(name) {
            Some(value.clone())
        } else if let Some(ref enclosing) = frame.enclosing {
            enclosing.get(name)
        } else {
            None
        }
    }

    /// Binds `name` in this frame, shadowing any outer binding.
    pub fn define(&self, name: &str, value: Value) {
        self.frame
            .borrow_mut()
            .values
            .insert(name.to_string(), value);
    }

    /// Rebinds `name` in the frame where it currently resolves. Returns false
    /// if no frame in the chain binds it.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut frame = self.frame.borrow_mut();
        if let Some(slot) = frame.values.get_mut(name) {
            *slot = value;
            true
        } else if let Some(ref enclosing) = frame.enclosing {
            enclosing.assign(name, value)
        } else {
            false
        }
    }

    /// Drops every binding in this frame. Function values hold their defining
    /// frame, so the global frame must be cleared to be freed.
    pub fn clear(&self) {
        self.frame.borrow_mut().values.clear();
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let frame = self.frame.borrow();
        let mut names: Vec<&String> = frame.values.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("enclosed", &frame.enclosing.is_some())
            .finish()
    }
}
