// File: src/interpreter/native_functions/type_ops.rs
//
// Type introspection and conversion native functions

use super::{expect_args, string_arg};
use crate::errors::MiniError;
use crate::interpreter::Value;

pub const NAMES: &[&str] = &["typeof", "is_type", "str"];

/// Handle type-related function calls
/// Returns Some(result) if the function was handled, None if not recognized
pub fn handle(name: &str, args: &[Value]) -> Option<Result<Value, MiniError>> {
    let result = match name {
        "typeof" => expect_args(name, args, &[1]).map(|_| Value::str(args[0].type_name())),
        "is_type" => expect_args(name, args, &[2])
            .and_then(|_| string_arg(name, args, 1))
            .map(|expected| Value::Bool(args[0].type_name() == &*expected)),
        "str" => expect_args(name, args, &[1]).map(|_| Value::str(&args[0].to_string())),
        _ => return None,
    };
    Some(result)
}
