// File: src/interpreter/native_functions/io.rs
//
// I/O-related native functions (print, input)

use super::{expect_args, NativeContext};
use crate::errors::{ErrorKind, MiniError};
use crate::interpreter::Value;
use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

pub const NAMES: &[&str] = &["print", "input"];

/// Where `print` writes: stdout unless a capture buffer has been installed
#[derive(Clone, Default)]
pub struct OutputSink(Rc<RefCell<Option<Arc<Mutex<Vec<u8>>>>>>);

impl OutputSink {
    pub fn redirect(&self, buffer: Arc<Mutex<Vec<u8>>>) {
        *self.0.borrow_mut() = Some(buffer);
    }

    fn write(&self, text: &str) -> Result<(), MiniError> {
        match &*self.0.borrow() {
            Some(buffer) => {
                let mut buffer = buffer.lock().map_err(|_| {
                    MiniError::runtime(ErrorKind::RuntimeError, "Output buffer is poisoned")
                })?;
                buffer.extend_from_slice(text.as_bytes());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(text.as_bytes())
                    .and_then(|_| stdout.flush())
                    .map_err(|e| MiniError::runtime(ErrorKind::RuntimeError, e.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Handle I/O-related function calls
/// Returns Some(result) if the function was handled, None if not recognized
pub fn handle(ctx: &NativeContext, name: &str, args: &[Value]) -> Option<Result<Value, MiniError>> {
    let result = match name {
        "print" => print(ctx, args),
        "input" => input(ctx, args),
        _ => return None,
    };
    Some(result)
}

fn print(ctx: &NativeContext, args: &[Value]) -> Result<Value, MiniError> {
    let parts: Vec<String> = args.iter().map(Value::to_string).collect();
    ctx.output.write(&format!("{}\n", parts.join(" ")))?;
    Ok(Value::Unit)
}

fn input(ctx: &NativeContext, args: &[Value]) -> Result<Value, MiniError> {
    expect_args("input", args, &[0, 1])?;
    if let Some(prompt) = args.first() {
        ctx.output.write(&prompt.to_string())?;
    }
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| MiniError::runtime(ErrorKind::RuntimeError, e.to_string()))?;
    let trimmed = line.trim_end_matches(['\n', '\r']);
    Ok(Value::str(trimmed))
}
