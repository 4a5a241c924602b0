// File: src/interpreter/native_functions/mod.rs
//
// Standard library of native (built-in) functions, split by category.
// Each category exposes the names it implements and a `handle` function that
// returns `Some(result)` for names it recognizes. Registration wraps every
// name in a `BuiltinFunction` value that dispatches back through here.

pub mod collections;
pub mod io;
pub mod math;
pub mod type_ops;

use super::value::{MapData, Value};
use crate::errors::{ErrorKind, MiniError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;

/// Per-session state shared by the builtins that need it
pub struct NativeContext {
    pub output: io::OutputSink,
    pub rng: RefCell<StdRng>,
}

impl NativeContext {
    pub fn new(output: io::OutputSink) -> Self {
        Self { output, rng: RefCell::new(StdRng::from_entropy()) }
    }
}

/// Every builtin name, in registration order
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    io::NAMES
        .iter()
        .chain(math::NAMES)
        .chain(type_ops::NAMES)
        .chain(collections::NAMES)
        .copied()
}

/// Main dispatcher that routes native function calls to the category modules
pub fn call_native_function(
    ctx: &NativeContext,
    name: &str,
    args: &[Value],
) -> Result<Value, MiniError> {
    if let Some(result) = io::handle(ctx, name, args) {
        return result;
    }
    if let Some(result) = math::handle(ctx, name, args) {
        return result;
    }
    if let Some(result) = type_ops::handle(name, args) {
        return result;
    }
    if let Some(result) = collections::handle(name, args) {
        return result;
    }
    Err(MiniError::runtime(ErrorKind::RuntimeError, format!("Unknown builtin function '{}'", name)))
}

/// Installs the whole standard library into the interpreter's globals
pub fn register_all(interp: &super::Interpreter, ctx: Rc<NativeContext>) {
    for name in builtin_names() {
        let ctx = Rc::clone(&ctx);
        interp.register_builtin(name, move |args| call_native_function(&ctx, name, args));
    }
}

/// Checks the argument count against the accepted counts
pub(crate) fn expect_args(name: &str, args: &[Value], expected: &[usize]) -> Result<(), MiniError> {
    if expected.contains(&args.len()) {
        return Ok(());
    }
    let expected_str = match expected {
        [single] => single.to_string(),
        [init @ .., last] => format!(
            "{} or {}",
            init.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", "),
            last
        ),
        [] => "no".to_string(),
    };
    Err(MiniError::runtime(
        ErrorKind::ArityMismatch,
        format!("Function '{}' expected {} arguments but got {}", name, expected_str, args.len()),
    ))
}

fn wrong_type(name: &str, position: usize, expected: &str, actual: &Value) -> MiniError {
    MiniError::type_error(format!(
        "Function '{}' expected a {} as argument {} but got {}",
        name,
        expected,
        position + 1,
        actual.type_name()
    ))
}

pub(crate) fn number_arg(name: &str, args: &[Value], position: usize) -> Result<f64, MiniError> {
    match &args[position] {
        Value::Number(n) => Ok(*n),
        other => Err(wrong_type(name, position, "number", other)),
    }
}

pub(crate) fn integer_arg(name: &str, args: &[Value], position: usize) -> Result<i64, MiniError> {
    let n = number_arg(name, args, position)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(MiniError::type_error(format!(
            "Function '{}' expected an integer as argument {} but got {}",
            name,
            position + 1,
            n
        )));
    }
    Ok(n as i64)
}

pub(crate) fn string_arg(name: &str, args: &[Value], position: usize) -> Result<Rc<str>, MiniError> {
    match &args[position] {
        Value::Str(s) => Ok(s.clone()),
        other => Err(wrong_type(name, position, "string", other)),
    }
}

pub(crate) fn list_arg(
    name: &str,
    args: &[Value],
    position: usize,
) -> Result<Rc<RefCell<Vec<Value>>>, MiniError> {
    match &args[position] {
        Value::List(elements) => Ok(elements.clone()),
        other => Err(wrong_type(name, position, "list", other)),
    }
}

pub(crate) fn tuple_arg(name: &str, args: &[Value], position: usize) -> Result<Rc<[Value]>, MiniError> {
    match &args[position] {
        Value::Tuple(elements) => Ok(elements.clone()),
        other => Err(wrong_type(name, position, "tuple", other)),
    }
}

pub(crate) fn map_arg(
    name: &str,
    args: &[Value],
    position: usize,
) -> Result<Rc<RefCell<MapData>>, MiniError> {
    match &args[position] {
        Value::Map(map) => Ok(map.clone()),
        other => Err(wrong_type(name, position, "map", other)),
    }
}

/// Python-style slice bounds: negatives count from the end, then clamp
pub(crate) fn slice_bounds(start: i64, end: i64, len: usize) -> (usize, usize) {
    let clamp = |i: i64| -> usize {
        let i = if i < 0 { i + len as i64 } else { i };
        i.clamp(0, len as i64) as usize
    };
    let (start, end) = (clamp(start), clamp(end));
    (start, end.max(start))
}
