// File: src/interpreter/native_functions/math.rs
//
// Math-related native functions, plus the random number helpers which draw
// from the session's seeded generator.

use super::{expect_args, integer_arg, list_arg, number_arg, NativeContext};
use crate::errors::{ErrorKind, MiniError};
use crate::interpreter::Value;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const NAMES: &[&str] = &[
    "abs",
    "ceil",
    "floor",
    "round",
    "sqrt",
    "sin",
    "cos",
    "tan",
    "log",
    "exp",
    "pow",
    "min",
    "max",
    "atan2",
    "hypot",
    "is_nan",
    "is_integer",
    "random",
    "random_int",
    "random_range",
    "random_choice",
    "random_shuffle",
    "random_seed",
];

fn domain_error(name: &str, x: f64) -> MiniError {
    MiniError::runtime(ErrorKind::RuntimeError, format!("Math domain error: {}({})", name, x))
}

/// Handle math-related function calls
/// Returns Some(result) if the function was handled, None if not recognized
pub fn handle(ctx: &NativeContext, name: &str, args: &[Value]) -> Option<Result<Value, MiniError>> {
    let result = match name {
        // Single-argument functions
        "abs" | "ceil" | "floor" | "round" | "sqrt" | "sin" | "cos" | "tan" | "log" | "exp" => {
            unary(name, args)
        }

        // Two-argument functions
        "pow" | "min" | "max" | "atan2" | "hypot" => binary(name, args),

        "is_nan" | "is_integer" => expect_args(name, args, &[1]).map(|_| {
            let flag = match (&args[0], name) {
                (Value::Number(n), "is_nan") => n.is_nan(),
                (Value::Number(n), _) => n.is_finite() && n.fract() == 0.0,
                _ => false,
            };
            Value::Bool(flag)
        }),

        "random" | "random_int" | "random_range" | "random_choice" | "random_shuffle"
        | "random_seed" => random(ctx, name, args),

        _ => return None,
    };
    Some(result)
}

fn unary(name: &str, args: &[Value]) -> Result<Value, MiniError> {
    expect_args(name, args, &[1])?;
    let x = number_arg(name, args, 0)?;
    let result = match name {
        "abs" => x.abs(),
        "ceil" => x.ceil(),
        "floor" => x.floor(),
        "round" => x.round(),
        "sqrt" if x < 0.0 => return Err(domain_error(name, x)),
        "sqrt" => x.sqrt(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "log" if x <= 0.0 => return Err(domain_error(name, x)),
        "log" => x.ln(),
        _ => x.exp(),
    };
    Ok(Value::Number(result))
}

fn binary(name: &str, args: &[Value]) -> Result<Value, MiniError> {
    expect_args(name, args, &[2])?;
    let a = number_arg(name, args, 0)?;
    let b = number_arg(name, args, 1)?;
    let result = match name {
        "pow" => a.powf(b),
        "min" => a.min(b),
        "max" => a.max(b),
        "atan2" => a.atan2(b),
        _ => a.hypot(b),
    };
    Ok(Value::Number(result))
}

fn random(ctx: &NativeContext, name: &str, args: &[Value]) -> Result<Value, MiniError> {
    match name {
        "random" => {
            expect_args(name, args, &[0])?;
            Ok(Value::Number(ctx.rng.borrow_mut().gen::<f64>()))
        }
        "random_int" => {
            expect_args(name, args, &[2])?;
            let low = integer_arg(name, args, 0)?;
            let high = integer_arg(name, args, 1)?;
            if low > high {
                return Err(MiniError::runtime(
                    ErrorKind::RuntimeError,
                    format!("random_int: empty range {}..={}", low, high),
                ));
            }
            Ok(Value::Number(ctx.rng.borrow_mut().gen_range(low..=high) as f64))
        }
        "random_range" => {
            expect_args(name, args, &[2])?;
            let low = number_arg(name, args, 0)?;
            let high = number_arg(name, args, 1)?;
            if !(low < high) {
                return Err(MiniError::runtime(
                    ErrorKind::RuntimeError,
                    format!("random_range: empty range {}..{}", low, high),
                ));
            }
            Ok(Value::Number(ctx.rng.borrow_mut().gen_range(low..high)))
        }
        "random_choice" => {
            expect_args(name, args, &[1])?;
            let elements: Vec<Value> = match &args[0] {
                Value::List(elements) => elements.borrow().clone(),
                Value::Tuple(elements) => elements.to_vec(),
                other => {
                    return Err(MiniError::type_error(format!(
                        "random_choice expects a list or tuple, got {}",
                        other.type_name()
                    )))
                }
            };
            elements.choose(&mut *ctx.rng.borrow_mut()).cloned().ok_or_else(|| {
                MiniError::runtime(ErrorKind::IndexError, "random_choice from an empty sequence")
            })
        }
        "random_shuffle" => {
            expect_args(name, args, &[1])?;
            let list = list_arg(name, args, 0)?;
            list.borrow_mut().shuffle(&mut *ctx.rng.borrow_mut());
            Ok(Value::Unit)
        }
        _ => {
            expect_args(name, args, &[1])?;
            let seed = integer_arg(name, args, 0)?;
            *ctx.rng.borrow_mut() = StdRng::seed_from_u64(seed as u64);
            Ok(Value::Unit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::native_functions::io::OutputSink;

    fn call(ctx: &NativeContext, name: &str, args: &[Value]) -> Result<Value, MiniError> {
        handle(ctx, name, args).expect("math builtin")
    }

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_unary_functions() {
        let ctx = NativeContext::new(OutputSink::default());
        assert_eq!(call(&ctx, "abs", &[num(-3.0)]).unwrap(), num(3.0));
        assert_eq!(call(&ctx, "floor", &[num(2.7)]).unwrap(), num(2.0));
        assert_eq!(call(&ctx, "ceil", &[num(2.1)]).unwrap(), num(3.0));
        assert_eq!(call(&ctx, "sqrt", &[num(16.0)]).unwrap(), num(4.0));
        assert!(call(&ctx, "sqrt", &[num(-1.0)]).is_err());
        assert!(call(&ctx, "log", &[num(0.0)]).is_err());
    }

    #[test]
    fn test_binary_functions_check_types() {
        let ctx = NativeContext::new(OutputSink::default());
        assert_eq!(call(&ctx, "max", &[num(2.0), num(9.0)]).unwrap(), num(9.0));
        assert_eq!(call(&ctx, "hypot", &[num(3.0), num(4.0)]).unwrap(), num(5.0));
        let err = call(&ctx, "pow", &[Value::str("2"), num(2.0)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        let err = call(&ctx, "pow", &[num(2.0)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArityMismatch);
    }

    #[test]
    fn test_predicates() {
        let ctx = NativeContext::new(OutputSink::default());
        assert_eq!(call(&ctx, "is_integer", &[num(4.0)]).unwrap(), Value::Bool(true));
        assert_eq!(call(&ctx, "is_integer", &[num(4.5)]).unwrap(), Value::Bool(false));
        assert_eq!(call(&ctx, "is_nan", &[num(f64::NAN)]).unwrap(), Value::Bool(true));
        assert_eq!(call(&ctx, "is_nan", &[Value::str("x")]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let ctx = NativeContext::new(OutputSink::default());
        call(&ctx, "random_seed", &[num(42.0)]).unwrap();
        let first = call(&ctx, "random_int", &[num(1.0), num(1000.0)]).unwrap();
        call(&ctx, "random_seed", &[num(42.0)]).unwrap();
        let second = call(&ctx, "random_int", &[num(1.0), num(1000.0)]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_bounds() {
        let ctx = NativeContext::new(OutputSink::default());
        for _ in 0..50 {
            match call(&ctx, "random_range", &[num(2.0), num(3.0)]).unwrap() {
                Value::Number(n) => assert!((2.0..3.0).contains(&n)),
                other => panic!("expected number, got {:?}", other),
            }
        }
        assert!(call(&ctx, "random_int", &[num(5.0), num(1.0)]).is_err());
        assert!(call(&ctx, "random_choice", &[Value::list(vec![])]).is_err());
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let ctx = NativeContext::new(OutputSink::default());
        let list = Value::list((1..=10).map(|n| num(n as f64)).collect());
        call(&ctx, "random_shuffle", &[list.clone()]).unwrap();
        if let Value::List(elements) = &list {
            let mut sorted: Vec<f64> = elements
                .borrow()
                .iter()
                .map(|v| match v {
                    Value::Number(n) => *n,
                    _ => f64::NAN,
                })
                .collect();
            sorted.sort_by(|a, b| a.total_cmp(b));
            assert_eq!(sorted, (1..=10).map(|n| n as f64).collect::<Vec<_>>());
        }
    }
}
