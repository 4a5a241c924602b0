// File: src/interpreter/native_functions/collections.rs
//
// Collection manipulation native functions (lists, tuples, maps).
// Lists and maps are shared handles, so the mutating functions change the
// caller's value in place and return Unit.

use super::{expect_args, integer_arg, list_arg, map_arg, slice_bounds, tuple_arg};
use crate::errors::{ErrorKind, MiniError};
use crate::interpreter::value::{MapKey, Value};
use std::cmp::Ordering;

pub const NAMES: &[&str] = &[
    "list_append",
    "list_insert",
    "list_remove",
    "list_pop",
    "list_size",
    "list_contains",
    "list_index_of",
    "list_slice",
    "list_reverse",
    "list_sort",
    "tuple_size",
    "tuple_contains",
    "tuple_slice",
    "map_size",
    "map_contains",
    "map_keys",
    "map_values",
    "map_items",
    "map_remove",
];

pub fn handle(name: &str, args: &[Value]) -> Option<Result<Value, MiniError>> {
    let result = match name {
        n if n.starts_with("list_") => list_function(name, args),
        n if n.starts_with("tuple_") => tuple_function(name, args),
        n if n.starts_with("map_") => map_function(name, args),
        _ => return None,
    };
    Some(result)
}

fn size(len: usize) -> Value {
    Value::Number(len as f64)
}

fn not_found(name: &str, value: &Value) -> MiniError {
    MiniError::runtime(ErrorKind::IndexError, format!("{}: value {} not found", name, value.repr()))
}

fn list_function(name: &str, args: &[Value]) -> Result<Value, MiniError> {
    match name {
        "list_append" => {
            expect_args(name, args, &[2])?;
            list_arg(name, args, 0)?.borrow_mut().push(args[1].clone());
            Ok(Value::Unit)
        }
        "list_insert" => {
            expect_args(name, args, &[3])?;
            let list = list_arg(name, args, 0)?;
            let index = integer_arg(name, args, 1)?;
            let mut elements = list.borrow_mut();
            let len = elements.len();
            let (position, _) = slice_bounds(index, index, len);
            elements.insert(position, args[2].clone());
            Ok(Value::Unit)
        }
        "list_remove" => {
            expect_args(name, args, &[2])?;
            let list = list_arg(name, args, 0)?;
            // The value may be the list itself, so search before borrowing mutably
            let position = list.borrow().iter().position(|e| e.equals(&args[1]));
            let position = position.ok_or_else(|| not_found(name, &args[1]))?;
            list.borrow_mut().remove(position);
            Ok(Value::Unit)
        }
        "list_pop" => {
            expect_args(name, args, &[1])?;
            list_arg(name, args, 0)?
                .borrow_mut()
                .pop()
                .ok_or_else(|| MiniError::runtime(ErrorKind::IndexError, "list_pop from an empty list"))
        }
        "list_size" => {
            expect_args(name, args, &[1])?;
            Ok(size(list_arg(name, args, 0)?.borrow().len()))
        }
        "list_contains" => {
            expect_args(name, args, &[2])?;
            let list = list_arg(name, args, 0)?;
            let found = list.borrow().iter().any(|e| e.equals(&args[1]));
            Ok(Value::Bool(found))
        }
        "list_index_of" => {
            expect_args(name, args, &[2])?;
            let list = list_arg(name, args, 0)?;
            let position = list.borrow().iter().position(|e| e.equals(&args[1]));
            position.map(size).ok_or_else(|| not_found(name, &args[1]))
        }
        "list_slice" => {
            expect_args(name, args, &[3])?;
            let list = list_arg(name, args, 0)?;
            let elements = list.borrow();
            let (start, end) =
                slice_bounds(integer_arg(name, args, 1)?, integer_arg(name, args, 2)?, elements.len());
            Ok(Value::list(elements[start..end].to_vec()))
        }
        "list_reverse" => {
            expect_args(name, args, &[1])?;
            list_arg(name, args, 0)?.borrow_mut().reverse();
            Ok(Value::Unit)
        }
        "list_sort" => {
            expect_args(name, args, &[1])?;
            let list = list_arg(name, args, 0)?;
            let mut elements = list.borrow_mut();
            let all_numbers = elements.iter().all(|e| matches!(e, Value::Number(_)));
            let all_strings = elements.iter().all(|e| matches!(e, Value::Str(_)));
            if !all_numbers && !all_strings {
                return Err(MiniError::type_error(
                    "list_sort requires a list of only numbers or only strings",
                ));
            }
            elements.sort_by(|a, b| match (a, b) {
                (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
                (Value::Str(x), Value::Str(y)) => x.cmp(y),
                _ => Ordering::Equal,
            });
            Ok(Value::Unit)
        }
        _ => Err(unknown(name)),
    }
}

fn tuple_function(name: &str, args: &[Value]) -> Result<Value, MiniError> {
    match name {
        // A tuple passed alone arrives unpacked, so the size is the
        // argument count unless a tuple value is handed over directly
        "tuple_size" => match args {
            [Value::Tuple(elements)] => Ok(size(elements.len())),
            [other] => Err(MiniError::type_error(format!(
                "Function '{}' expected a tuple but got {}",
                name,
                other.type_name()
            ))),
            spread => Ok(size(spread.len())),
        },
        "tuple_contains" => {
            expect_args(name, args, &[2])?;
            Ok(Value::Bool(tuple_arg(name, args, 0)?.iter().any(|e| e.equals(&args[1]))))
        }
        "tuple_slice" => {
            expect_args(name, args, &[3])?;
            let elements = tuple_arg(name, args, 0)?;
            let (start, end) =
                slice_bounds(integer_arg(name, args, 1)?, integer_arg(name, args, 2)?, elements.len());
            Ok(Value::tuple(elements[start..end].to_vec()))
        }
        _ => Err(unknown(name)),
    }
}

fn map_function(name: &str, args: &[Value]) -> Result<Value, MiniError> {
    match name {
        "map_size" => {
            expect_args(name, args, &[1])?;
            Ok(size(map_arg(name, args, 0)?.borrow().len()))
        }
        "map_contains" => {
            expect_args(name, args, &[2])?;
            let map = map_arg(name, args, 0)?;
            let key = MapKey::from_value(&args[1])?;
            let found = map.borrow().contains_key(&key);
            Ok(Value::Bool(found))
        }
        "map_keys" => {
            expect_args(name, args, &[1])?;
            let map = map_arg(name, args, 0)?;
            let keys = map.borrow().iter().map(|(k, _)| k.to_value()).collect();
            Ok(Value::list(keys))
        }
        "map_values" => {
            expect_args(name, args, &[1])?;
            let map = map_arg(name, args, 0)?;
            let values = map.borrow().iter().map(|(_, v)| v.clone()).collect();
            Ok(Value::list(values))
        }
        "map_items" => {
            expect_args(name, args, &[1])?;
            let map = map_arg(name, args, 0)?;
            let items =
                map.borrow().iter().map(|(k, v)| Value::tuple(vec![k.to_value(), v.clone()])).collect();
            Ok(Value::list(items))
        }
        "map_remove" => {
            expect_args(name, args, &[2])?;
            let map = map_arg(name, args, 0)?;
            let key = MapKey::from_value(&args[1])?;
            let removed = map.borrow_mut().remove(&key);
            removed.map(|_| Value::Unit).ok_or_else(|| {
                MiniError::runtime(ErrorKind::KeyError, format!("Key '{}' not found in map", key))
            })
        }
        _ => Err(unknown(name)),
    }
}

fn unknown(name: &str) -> MiniError {
    MiniError::runtime(ErrorKind::RuntimeError, format!("Unknown builtin function '{}'", name))
}
