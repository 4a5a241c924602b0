// File: src/interpreter/operators.rs
//
// Value-level semantics of the unary, binary, index and member operators.
// The evaluator decides which operands to evaluate; everything here works
// on already-evaluated values.

use super::value::{MapKey, Value};
use crate::ast::{BinaryOp, UnaryOp};
use crate::errors::{ErrorKind, MiniError};

fn operand_error(op: &str, lhs: &Value, rhs: &Value) -> MiniError {
    MiniError::type_error(format!(
        "Unsupported operand types for '{}': {} and {}",
        op,
        lhs.type_name(),
        rhs.type_name()
    ))
}

pub fn unary(op: UnaryOp, operand: Value) -> Result<Value, MiniError> {
    match (op, operand) {
        (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Negate, other) => Err(MiniError::type_error(format!(
            "Cannot negate a value of type {}",
            other.type_name()
        ))),
        (UnaryOp::Not, other) => Err(MiniError::type_error(format!(
            "Logical not requires a bool, got {}",
            other.type_name()
        ))),
    }
}

/// Applies a non-assigning, non-postfix binary operator
pub fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, MiniError> {
    match op {
        BinaryOp::Plus => plus(lhs, rhs),
        BinaryOp::Minus
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::Modulo
        | BinaryOp::Power => arithmetic(op, lhs, rhs),
        BinaryOp::Equal => Ok(Value::Bool(lhs.equals(&rhs))),
        BinaryOp::NotEqual => Ok(Value::Bool(!lhs.equals(&rhs))),
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            compare(op, lhs, rhs)
        }
        BinaryOp::And | BinaryOp::Or => logical(op, lhs, rhs),
        other => Err(MiniError::runtime(
            ErrorKind::RuntimeError,
            format!("Operator '{}' cannot be applied to values directly", other),
        )),
    }
}

/// `+` is overloaded: numeric addition, string concatenation, list and
/// tuple concatenation, and in-place map merge
pub fn plus(lhs: Value, rhs: Value) -> Result<Value, MiniError> {
    match (&lhs, &rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::str(&format!("{}{}", lhs, rhs))),
        (Value::List(a), Value::List(b)) => {
            let mut elements = a.borrow().clone();
            elements.extend(b.borrow().iter().cloned());
            Ok(Value::list(elements))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            if a.len() != b.len() {
                return Err(MiniError::type_error(format!(
                    "Cannot add tuples of different lengths ({} and {})",
                    a.len(),
                    b.len()
                )));
            }
            let sums = a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| plus(x.clone(), y.clone()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::tuple(sums))
        }
        (Value::Map(a), Value::Map(b)) => {
            if !std::rc::Rc::ptr_eq(a, b) {
                let entries: Vec<(MapKey, Value)> =
                    b.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                let mut target = a.borrow_mut();
                for (key, value) in entries {
                    target.insert(key, value);
                }
            }
            Ok(lhs)
        }
        _ => Err(operand_error("+", &lhs, &rhs)),
    }
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, MiniError> {
    let (a, b) = match (&lhs, &rhs) {
        (Value::Number(a), Value::Number(b)) => (*a, *b),
        _ => return Err(operand_error(op.symbol(), &lhs, &rhs)),
    };
    let result = match op {
        BinaryOp::Minus => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide | BinaryOp::Modulo if b == 0.0 => {
            return Err(MiniError::runtime(
                ErrorKind::DivisionByZero,
                format!("{} by zero", if op == BinaryOp::Divide { "Division" } else { "Modulo" }),
            ));
        }
        BinaryOp::Divide => a / b,
        // Floored: the result takes the sign of the divisor
        BinaryOp::Modulo => a - b * (a / b).floor(),
        _ => a.powf(b),
    };
    Ok(Value::Number(result))
}

fn compare(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, MiniError> {
    let (a, b) = match (&lhs, &rhs) {
        (Value::Number(a), Value::Number(b)) => (*a, *b),
        _ => return Err(operand_error(op.symbol(), &lhs, &rhs)),
    };
    let result = match op {
        BinaryOp::Less => a < b,
        BinaryOp::LessEqual => a <= b,
        BinaryOp::Greater => a > b,
        _ => a >= b,
    };
    Ok(Value::Bool(result))
}

fn logical(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, MiniError> {
    match (&lhs, &rhs) {
        (Value::Bool(a), Value::Bool(b)) => {
            Ok(Value::Bool(if op == BinaryOp::And { *a && *b } else { *a || *b }))
        }
        _ => Err(operand_error(op.symbol(), &lhs, &rhs)),
    }
}

/// Resolves a possibly negative index against a sequence length
pub fn sequence_position(index: &Value, len: usize) -> Result<usize, MiniError> {
    let n = match index {
        Value::Number(n) if n.fract() == 0.0 && n.is_finite() => *n as i64,
        Value::Number(n) => {
            return Err(MiniError::type_error(format!("Index must be an integer, got {}", n)))
        }
        other => {
            return Err(MiniError::type_error(format!(
                "Index must be a number, got {}",
                other.type_name()
            )))
        }
    };
    let position = if n < 0 { n + len as i64 } else { n };
    if position < 0 || position >= len as i64 {
        return Err(MiniError::runtime(
            ErrorKind::IndexError,
            format!("Index {} out of range for length {}", n, len),
        ));
    }
    Ok(position as usize)
}

fn missing_key(key: &MapKey) -> MiniError {
    MiniError::runtime(ErrorKind::KeyError, format!("Key '{}' not found in map", key))
}

/// `target[index]`
pub fn index(target: &Value, index: &Value) -> Result<Value, MiniError> {
    match target {
        Value::List(elements) => {
            let elements = elements.borrow();
            let position = sequence_position(index, elements.len())?;
            Ok(elements[position].clone())
        }
        Value::Tuple(elements) => {
            let position = sequence_position(index, elements.len())?;
            Ok(elements[position].clone())
        }
        Value::Map(map) => {
            let key = MapKey::from_value(index)?;
            map.borrow().get(&key).cloned().ok_or_else(|| missing_key(&key))
        }
        other => Err(MiniError::type_error(format!(
            "Cannot index into a value of type {}",
            other.type_name()
        ))),
    }
}

/// `target.name`
pub fn member(target: &Value, name: &str) -> Result<Value, MiniError> {
    match target {
        Value::Map(map) => {
            let key = MapKey::str(name);
            map.borrow().get(&key).cloned().ok_or_else(|| missing_key(&key))
        }
        other => Err(MiniError::type_error(format!(
            "Cannot access member '{}' on a value of type {}",
            name,
            other.type_name()
        ))),
    }
}

/// `target[index] = value`, mutating the container in place
pub fn store_index(target: &Value, index: &Value, value: Value) -> Result<(), MiniError> {
    match target {
        Value::List(elements) => {
            let mut elements = elements.borrow_mut();
            let position = sequence_position(index, elements.len())?;
            elements[position] = value;
            Ok(())
        }
        Value::Map(map) => {
            let key = MapKey::from_value(index)?;
            map.borrow_mut().insert(key, value);
            Ok(())
        }
        Value::Tuple(_) => Err(MiniError::type_error("Tuples are immutable")),
        other => Err(MiniError::type_error(format!(
            "Cannot assign by index into a value of type {}",
            other.type_name()
        ))),
    }
}

/// `target.name = value`
pub fn store_member(target: &Value, name: &str, value: Value) -> Result<(), MiniError> {
    match target {
        Value::Map(map) => {
            map.borrow_mut().insert(MapKey::str(name), value);
            Ok(())
        }
        other => Err(MiniError::type_error(format!(
            "Cannot assign member '{}' on a value of type {}",
            name,
            other.type_name()
        ))),
    }
}
