// File: src/interpreter/value.rs
//
// Runtime value types for the mini language.
//
// Lists and maps are mutable reference types: cloning a `Value` clones the
// handle, so every binding that holds the same list or map observes the
// same mutations. Tuples and strings are immutable and shared cheaply.
// Functions carry an identity id handed out by the owning interpreter's
// `IdGenerator`; equality on functions compares those ids.

use super::environment::Environment;
use crate::ast::{format_number, quote_string, Node};
use crate::errors::MiniError;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Monotonic identity source owned by one interpreter session
#[derive(Clone, Debug, Default)]
pub struct IdGenerator(Rc<Cell<u64>>);

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> u64 {
        let id = self.0.get() + 1;
        self.0.set(id);
        id
    }
}

/// Map keys are strings or integers
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MapKey {
    Str(Rc<str>),
    Int(i64),
}

impl MapKey {
    pub fn str(s: &str) -> Self {
        MapKey::Str(Rc::from(s))
    }

    /// Key for an index value: strings, or numbers with no fractional part
    pub fn from_value(value: &Value) -> Result<Self, MiniError> {
        match value {
            Value::Str(s) => Ok(MapKey::Str(s.clone())),
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Ok(MapKey::Int(*n as i64)),
            other => Err(MiniError::type_error(format!(
                "Map keys must be strings or integers, got {} '{}'",
                other.type_name(),
                other
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Str(s) => Value::Str(s.clone()),
            MapKey::Int(n) => Value::Number(*n as f64),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MapKey::Str(s) if is_identifier(s) => write!(f, "{}", s),
            MapKey::Str(s) => write!(f, "{}", quote_string(s)),
            MapKey::Int(n) => write!(f, "{}", n),
        }
    }
}

/// Insertion-ordered map storage
#[derive(Clone, Debug, Default)]
pub struct MapData {
    entries: Vec<(MapKey, Value)>,
}

impl MapData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &MapKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.get(key).is_some()
    }

    /// Overwrites an existing key in place, otherwise appends
    pub fn insert(&mut self, key: MapKey, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &MapKey) -> Option<Value> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MapKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl FromIterator<(MapKey, Value)> for MapData {
    fn from_iter<I: IntoIterator<Item = (MapKey, Value)>>(iter: I) -> Self {
        let mut map = MapData::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Native callable backing a builtin function
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, MiniError>>;

/// A user-defined function: a lambda or a named declaration plus the
/// environment it closes over
pub struct Function {
    pub id: u64,
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Node>,
    pub env: Environment,
    pub doc: Option<String>,
}

impl Function {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<lambda>")
    }
}

pub struct BuiltinFunction {
    pub id: u64,
    pub name: String,
    pub func: NativeFn,
}

/// Runtime values in the mini interpreter
#[derive(Clone)]
pub enum Value {
    Unit,
    Number(f64),
    Str(Rc<str>),
    Bool(bool),
    /// Always two or more elements; see `Value::tuple`
    Tuple(Rc<[Value]>),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<MapData>>),
    Function(Rc<Function>),
    Builtin(Rc<BuiltinFunction>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    /// Builds a tuple, collapsing zero elements to Unit and one element to
    /// the element itself
    pub fn tuple(mut elements: Vec<Value>) -> Self {
        match elements.len() {
            0 => Value::Unit,
            1 => elements.remove(0),
            _ => Value::Tuple(Rc::from(elements)),
        }
    }

    pub fn list(elements: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    pub fn map(map: MapData) -> Self {
        Value::Map(Rc::new(RefCell::new(map)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Function(_) | Value::Builtin(_) => "function",
        }
    }

    /// Structural equality for data, identity for functions.
    /// Values of different types are never equal.
    pub fn equals(&self, other: &Value) -> bool {
        self.equals_in(other, &mut Vec::new())
    }

    // `pending` holds the container pairs currently being compared; a pair
    // reached again through a cycle counts as equal
    fn equals_in(&self, other: &Value, pending: &mut Vec<(*const (), *const ())>) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => elements_equal(a, b, pending),
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
                if pending.contains(&pair) {
                    return true;
                }
                pending.push(pair);
                let equal = elements_equal(&a.borrow(), &b.borrow(), pending);
                pending.pop();
                equal
            }
            (Value::Map(a), Value::Map(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
                if pending.contains(&pair) {
                    return true;
                }
                pending.push(pair);
                let (left, right) = (a.borrow(), b.borrow());
                let equal = left.len() == right.len()
                    && left
                        .iter()
                        .all(|(key, value)| right.get(key).map_or(false, |v| value.equals_in(v, pending)));
                pending.pop();
                equal
            }
            (Value::Function(a), Value::Function(b)) => a.id == b.id,
            (Value::Builtin(a), Value::Builtin(b)) => a.id == b.id,
            _ => false,
        }
    }

    /// True when both values are the same underlying object
    pub fn same_identity(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.id == b.id,
            (Value::Builtin(a), Value::Builtin(b)) => a.id == b.id,
            _ => false,
        }
    }

    /// Display form with strings quoted, as used inside containers
    pub fn repr(&self) -> String {
        Repr(self).to_string()
    }

    /// Writes the display form; `seen` holds the lists and maps already
    /// open on the way down, which render as `[...]` and `#{...}`
    fn write_to(&self, f: &mut fmt::Formatter, quoted: bool, seen: &mut Vec<*const ()>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) if quoted => write!(f, "{}", quote_string(s)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Tuple(elements) => {
                write!(f, "(")?;
                write_elements(f, elements.iter(), seen)?;
                write!(f, ")")
            }
            Value::List(elements) => {
                let ptr = Rc::as_ptr(elements) as *const ();
                if seen.contains(&ptr) {
                    return write!(f, "[...]");
                }
                seen.push(ptr);
                write!(f, "[")?;
                let result = write_elements(f, elements.borrow().iter(), seen);
                seen.pop();
                result?;
                write!(f, "]")
            }
            Value::Map(map) => {
                let ptr = Rc::as_ptr(map) as *const ();
                if seen.contains(&ptr) {
                    return write!(f, "#{{...}}");
                }
                seen.push(ptr);
                write!(f, "#{{")?;
                let result = map.borrow().iter().enumerate().try_for_each(|(i, (key, value))| {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    value.write_to(f, true, seen)
                });
                seen.pop();
                result?;
                write!(f, "}}")
            }
            Value::Function(func) => match &func.name {
                Some(name) => write!(f, "<function {}({})>", name, func.params.join(", ")),
                None => write!(f, "<lambda({})>", func.params.join(", ")),
            },
            Value::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
        }
    }
}

fn elements_equal(a: &[Value], b: &[Value], pending: &mut Vec<(*const (), *const ())>) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals_in(y, pending))
}

fn write_elements<'a>(
    f: &mut fmt::Formatter,
    values: impl Iterator<Item = &'a Value>,
    seen: &mut Vec<*const ()>,
) -> fmt::Result {
    for (i, value) in values.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        value.write_to(f, true, seen)?;
    }
    Ok(())
}

struct Repr<'a>(&'a Value);

impl fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.write_to(f, true, &mut Vec::new())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_to(f, false, &mut Vec::new())
    }
}

// Manual Debug: functions point at environments that may point back at them
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "Unit"),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Str(s) => write!(f, "Str({:?})", s.as_ref()),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Tuple(elements) => f.debug_tuple("Tuple").field(&elements.as_ref()).finish(),
            // Rendered through Display so self-references stay finite
            Value::List(_) => write!(f, "List({})", self),
            Value::Map(_) => write!(f, "Map({})", self),
            Value::Function(func) => write!(
                f,
                "Function(#{} {} {:?} in {:?})",
                func.id,
                func.display_name(),
                func.params,
                func.env
            ),
            Value::Builtin(builtin) => write!(f, "Builtin(#{} {})", builtin.id, builtin.name),
        }
    }
}
