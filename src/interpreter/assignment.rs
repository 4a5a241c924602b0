// File: src/interpreter/assignment.rs
//
// Assignment forms:
// - `name = value` binds in the current environment (shadowing outer scopes)
// - `name(a, b) = body` declares a named function
// - `base.key[i].other = value` writes into nested maps and lists in place
// - `name op= value` applies the arithmetic operator and rebinds `name`

use super::operators;
use super::{Interpreter, Value};
use crate::ast::{Atomic, BinaryOp, Node};
use crate::errors::{ErrorKind, MiniError};
use std::rc::Rc;

fn invalid_target(target: &Node) -> MiniError {
    MiniError::runtime(
        ErrorKind::InvalidAssignment,
        format!("Cannot assign to '{}'", target),
    )
}

pub(super) fn assign(
    interp: &Interpreter,
    target: &Node,
    value_node: &Node,
    doc: Option<&str>,
    env: &super::Environment,
) -> Result<Value, MiniError> {
    match target {
        Node::Atomic(Atomic::Identifier(name)) => {
            let value = match value_node {
                Node::Lambda { params, body } => interp.make_function(
                    Some(name.clone()),
                    params.clone(),
                    Rc::clone(body),
                    env,
                    doc.map(str::to_string),
                ),
                other => interp.evaluate(other, env)?,
            };
            env.set(name.as_str(), value.clone());
            Ok(value)
        }
        Node::Binary { op: BinaryOp::Call, left, right, .. } => {
            let (name, params) = function_signature(left, right).ok_or_else(|| {
                invalid_target(target).with_help(
                    "a function declaration looks like `name(a, b) = body` with plain parameter names",
                )
            })?;
            let function = interp.make_function(
                Some(name.to_string()),
                params,
                Rc::new(value_node.clone()),
                env,
                doc.map(str::to_string),
            );
            env.set(name, function.clone());
            Ok(function)
        }
        Node::Binary { op: BinaryOp::Dot | BinaryOp::Index, .. } => {
            assign_path(interp, target, value_node, env)
        }
        _ => Err(invalid_target(target)),
    }
}

/// `name(a, b)` where every argument is a bare identifier
fn function_signature<'a>(callee: &'a Node, args: &'a Node) -> Option<(&'a str, Vec<String>)> {
    let name = callee.as_identifier()?;
    let elements = match args {
        Node::Tuple(elements) => elements,
        _ => return None,
    };
    let params = elements
        .iter()
        .map(|e| e.as_identifier().map(str::to_string))
        .collect::<Option<Vec<_>>>()?;
    Some((name, params))
}

enum Step<'a> {
    Member(&'a str),
    Index(&'a Node),
}

/// Splits `base.a[i].b` into the base name and its steps, outermost first
fn flatten_path(target: &Node) -> Result<(&str, Vec<Step<'_>>), MiniError> {
    let mut steps = Vec::new();
    let mut node = target;
    let base = loop {
        match node {
            Node::Binary { op: BinaryOp::Dot, left, right, .. } => {
                let name = right.as_identifier().ok_or_else(|| invalid_target(target))?;
                steps.push(Step::Member(name));
                node = left;
            }
            Node::Binary { op: BinaryOp::Index, left, right, .. } => {
                steps.push(Step::Index(right));
                node = left;
            }
            Node::Atomic(Atomic::Identifier(name)) => break name.as_str(),
            _ => return Err(invalid_target(target)),
        }
    };
    steps.reverse();
    Ok((base, steps))
}

fn assign_path(
    interp: &Interpreter,
    target: &Node,
    value_node: &Node,
    env: &super::Environment,
) -> Result<Value, MiniError> {
    let (base, steps) = flatten_path(target)?;
    let value = interp.evaluate(value_node, env)?;
    let root = env.get(base).ok_or_else(|| MiniError::undefined_variable(base))?;

    let mut current = root.clone();
    for (i, step) in steps.iter().enumerate() {
        let last = i + 1 == steps.len();
        match step {
            Step::Member(name) => {
                if last {
                    operators::store_member(&current, name, value.clone())?;
                } else {
                    if !matches!(current, Value::Map(_)) {
                        return Err(MiniError::type_error(format!(
                            "Cannot access member '{}' on a value of type {}",
                            name,
                            current.type_name()
                        )));
                    }
                    current = operators::member(&current, name)?;
                }
            }
            Step::Index(index_node) => {
                let index = interp.evaluate(index_node, env)?;
                if last {
                    operators::store_index(&current, &index, value.clone())?;
                } else {
                    current = operators::index(&current, &index)?;
                }
            }
        }
    }

    // Containers were updated in place; rebinding keeps `base` in this scope
    env.set(base, root);
    Ok(value)
}

pub(super) fn compound_assign(
    interp: &Interpreter,
    op: BinaryOp,
    base: BinaryOp,
    target: &Node,
    value_node: &Node,
    env: &super::Environment,
) -> Result<Value, MiniError> {
    let name = target.as_identifier().ok_or_else(|| {
        MiniError::runtime(
            ErrorKind::InvalidAssignment,
            format!("Left side of '{}' must be an identifier, got '{}'", op.symbol(), target),
        )
    })?;
    let current = env.get(name).ok_or_else(|| MiniError::undefined_variable(name))?;
    let rhs = interp.evaluate(value_node, env)?;

    if base == BinaryOp::Plus
        && !matches!(
            (&current, &rhs),
            (Value::Number(_), Value::Number(_)) | (Value::Str(_), _) | (_, Value::Str(_))
        )
    {
        return Err(MiniError::type_error(format!(
            "'+=' requires string or number operands, got {} and {}",
            current.type_name(),
            rhs.type_name()
        )));
    }

    let result = operators::binary(base, current, rhs)?;
    env.set(name, result.clone());
    Ok(result)
}
