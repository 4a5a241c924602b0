// File: src/interpreter/environment.rs
//
// Lexical scoping environment for variable management in the mini interpreter.
// Scopes form a parent chain of shared, mutable frames: blocks and function
// calls push a child frame, and closures keep the frame they were created in
// alive for as long as the function value lives.

use super::value::Value;
use ahash::AHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct Scope {
    name: String,
    parent: Option<Environment>,
    bindings: AHashMap<String, Value>,
}

/// A handle to one scope frame and, through it, all enclosing frames
///
/// Cloning an `Environment` clones the handle, not the bindings. Lookups
/// walk from this frame outward; `set` always binds in this frame, so an
/// assignment inside a block or function shadows any outer binding of the
/// same name.
///
/// ```ignore
/// let global = Environment::new("global");
/// global.set("x", Value::Number(10.0));
///
/// let block = global.child("block");
/// block.set("x", Value::Number(20.0));            // shadows outer x
/// assert_eq!(block.get("x"), Some(Value::Number(20.0)));
/// assert_eq!(global.get("x"), Some(Value::Number(10.0)));
/// ```
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

/// Saved copy of one frame's bindings
pub struct Snapshot(AHashMap<String, Value>);

impl Environment {
    /// Create a root environment with no parent
    pub fn new(name: impl Into<String>) -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            name: name.into(),
            parent: None,
            bindings: AHashMap::new(),
        })))
    }

    /// Create a new frame whose parent is this one
    pub fn child(&self, name: impl Into<String>) -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            name: name.into(),
            parent: Some(self.clone()),
            bindings: AHashMap::new(),
        })))
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    /// Look a name up, searching from this frame outward
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let parent = {
                let scope = current.0.borrow();
                if let Some(value) = scope.bindings.get(name) {
                    return Some(value.clone());
                }
                scope.parent.clone()
            };
            current = parent?;
        }
    }

    /// Bind a name in this frame
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().bindings.insert(name.into(), value);
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// Bindings of this frame only, sorted by name
    pub fn local_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings: Vec<(String, Value)> = self
            .0
            .borrow()
            .bindings
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    /// Every name reachable from this frame
    pub fn visible_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = Some(self.clone());
        while let Some(env) = current {
            let scope = env.0.borrow();
            names.extend(scope.bindings.keys().cloned());
            current = scope.parent.clone();
        }
        names.sort();
        names.dedup();
        names
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.0.borrow().bindings.clone())
    }

    /// Replace this frame's bindings with a saved copy
    pub fn restore(&self, snapshot: Snapshot) {
        self.0.borrow_mut().bindings = snapshot.0;
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// Bindings are omitted: closures make the graph cyclic
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment({}", self.name())?;
        let mut scope = self.parent();
        while let Some(env) = scope {
            write!(f, " -> {}", env.name())?;
            scope = env.parent();
        }
        write!(f, ")")
    }
}
