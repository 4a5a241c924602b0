// File: src/interpreter/mod.rs
//
// Tree-walking interpreter for the mini language.
// Evaluates programs by traversing the expression tree produced by the
// parser.
//
// The interpreter owns the global environment (with the standard library
// installed), the identity generator for function values, and the output
// sink used by `print`. Evaluation is a single recursive `match` over the
// closed `Node` enum; every failure is returned as a `MiniError`.
//
// Each top-level expression runs as a transaction: if it fails, the
// bindings of the environment it ran in are restored to what they were
// before it started.

mod assignment;
mod environment;
pub mod native_functions;
pub mod operators;
mod value;

pub use environment::{Environment, Snapshot};
pub use native_functions::io::OutputSink;
pub use value::{BuiltinFunction, Function, IdGenerator, MapData, MapKey, NativeFn, Value};

use crate::ast::{Atomic, BinaryOp, Node, Program};
use crate::errors::{find_closest_match, ErrorKind, MiniError};
use crate::{lexer, parser};
use native_functions::NativeContext;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Main interpreter that executes mini programs
pub struct Interpreter {
    globals: Environment,
    ids: IdGenerator,
    natives: Rc<NativeContext>,
    debug: bool,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new interpreter whose global environment holds the
    /// standard library
    pub fn new() -> Self {
        let interpreter = Self::without_stdlib();
        native_functions::register_all(&interpreter, Rc::clone(&interpreter.natives));
        interpreter
    }

    /// Creates an interpreter with an empty global environment
    pub fn without_stdlib() -> Self {
        Interpreter {
            globals: Environment::new("global"),
            ids: IdGenerator::new(),
            natives: Rc::new(NativeContext::new(OutputSink::default())),
            debug: false,
        }
    }

    /// Enables debug tracing of tokens, tree and results
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Sets the output sink for `print` (used for testing)
    pub fn set_output(&mut self, output: Arc<Mutex<Vec<u8>>>) {
        self.natives.output.redirect(output);
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Discards every global binding and reinstalls the standard library
    pub fn reset(&mut self) {
        self.globals = Environment::new("global");
        native_functions::register_all(self, Rc::clone(&self.natives));
    }

    /// Binds a native function in the global environment
    pub fn register_builtin<F>(&self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, MiniError> + 'static,
    {
        let builtin =
            BuiltinFunction { id: self.ids.next_id(), name: name.to_string(), func: Rc::new(func) };
        self.globals.set(name, Value::Builtin(Rc::new(builtin)));
    }

    /// Lexes, parses and evaluates `source` in the global environment
    pub fn run(&self, source: &str) -> Result<Value, MiniError> {
        self.evaluate_program(source, &self.globals).map(|(value, _)| value)
    }

    /// Lexes, parses and evaluates `source` in `env`, returning the value of
    /// the last top-level expression (Unit for an empty program) and the
    /// environment it ran in
    pub fn evaluate_program(
        &self,
        source: &str,
        env: &Environment,
    ) -> Result<(Value, Environment), MiniError> {
        if self.debug {
            let tokens = lexer::tokenize(source)?;
            let rendered: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
            debug!(count = tokens.len(), "tokens: {}", rendered.join(" "));
        }

        let program = parser::parse(source)?;
        if self.debug {
            debug!("ast:\n{}", program);
        }

        let value = self.evaluate_top_level(&program, env)?;
        if self.debug {
            debug!(type_name = value.type_name(), "result: {}", value.repr());
        }
        Ok((value, env.clone()))
    }

    fn evaluate_top_level(&self, program: &Program, env: &Environment) -> Result<Value, MiniError> {
        let mut result = Value::Unit;
        for expr in &program.exprs {
            let snapshot = env.snapshot();
            match self.evaluate(expr, env) {
                Ok(value) => result = value,
                Err(err) => {
                    env.restore(snapshot);
                    return Err(err);
                }
            }
        }
        Ok(result)
    }

    /// Evaluates one node in `env`
    pub fn evaluate(&self, node: &Node, env: &Environment) -> Result<Value, MiniError> {
        match node {
            Node::Atomic(atomic) => self.eval_atomic(atomic, env),
            Node::Tuple(elements) => {
                let values = self.eval_all(elements, env)?;
                Ok(Value::tuple(values))
            }
            Node::List(elements) => {
                let values = self.eval_all(elements, env)?;
                Ok(Value::list(values))
            }
            Node::Map(pairs) => {
                let mut map = MapData::new();
                for (key, value) in pairs {
                    let key = literal_key(key)?;
                    let value = self.evaluate(value, env)?;
                    map.insert(key, value);
                }
                Ok(Value::map(map))
            }
            Node::Block(exprs) => {
                let scope = env.child("block");
                let mut result = Value::Unit;
                for expr in exprs {
                    result = self.evaluate(expr, &scope)?;
                }
                Ok(result)
            }
            Node::Unary { op, operand } => {
                let value = self.evaluate(operand, env)?;
                operators::unary(*op, value)
            }
            Node::Binary { op, left, right, doc } => {
                self.eval_binary(*op, left, right, doc.as_deref(), env)
            }
            Node::Lambda { params, body } => {
                Ok(self.make_function(None, params.clone(), Rc::clone(body), env, None))
            }
            Node::If { condition, then_body, else_ifs, else_body } => {
                if self.eval_condition(condition, env)? {
                    return self.evaluate(then_body, env);
                }
                for (condition, body) in else_ifs {
                    if self.eval_condition(condition, env)? {
                        return self.evaluate(body, env);
                    }
                }
                match else_body {
                    Some(body) => self.evaluate(body, env),
                    None => Err(MiniError::runtime(
                        ErrorKind::RuntimeError,
                        "No branch of 'if' matched and there is no 'else'",
                    )
                    .with_help("add an 'else' branch to give the expression a value")),
                }
            }
        }
    }

    fn eval_all(&self, nodes: &[Node], env: &Environment) -> Result<Vec<Value>, MiniError> {
        nodes.iter().map(|node| self.evaluate(node, env)).collect()
    }

    fn eval_atomic(&self, atomic: &Atomic, env: &Environment) -> Result<Value, MiniError> {
        match atomic {
            Atomic::Number(n) => Ok(Value::Number(*n)),
            Atomic::Str(s) => Ok(Value::str(s)),
            Atomic::Bool(b) => Ok(Value::Bool(*b)),
            Atomic::Identifier(name) => env.get(name).ok_or_else(|| undefined(name, env)),
        }
    }

    fn eval_condition(&self, condition: &Node, env: &Environment) -> Result<bool, MiniError> {
        match self.evaluate(condition, env)? {
            Value::Bool(b) => Ok(b),
            other => Err(MiniError::type_error(format!(
                "Condition must be a bool, got {} '{}'",
                other.type_name(),
                other
            ))),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Node,
        right: &Node,
        doc: Option<&str>,
        env: &Environment,
    ) -> Result<Value, MiniError> {
        if op == BinaryOp::Assignment {
            return assignment::assign(self, left, right, doc, env);
        }
        if let Some(base) = op.compound_base() {
            return assignment::compound_assign(self, op, base, left, right, env);
        }
        if op == BinaryOp::Dot {
            let target = self.evaluate(left, env)?;
            let name = right.as_identifier().ok_or_else(|| {
                MiniError::runtime(
                    ErrorKind::RuntimeError,
                    format!("Member name must be an identifier, got '{}'", right),
                )
            })?;
            return operators::member(&target, name);
        }

        let lhs = self.evaluate(left, env)?;
        if op == BinaryOp::Call {
            return self.eval_call(lhs, left, right, env);
        }
        let rhs = self.evaluate(right, env)?;
        match op {
            BinaryOp::Index => operators::index(&lhs, &rhs),
            _ => operators::binary(op, lhs, rhs),
        }
    }

    /// The argument node is evaluated as one value: Unit means no
    /// arguments, a tuple is unpacked, anything else is a single argument
    fn eval_call(
        &self,
        callee: Value,
        callee_node: &Node,
        args_node: &Node,
        env: &Environment,
    ) -> Result<Value, MiniError> {
        let args = match self.evaluate(args_node, env)? {
            Value::Unit => Vec::new(),
            Value::Tuple(elements) => elements.to_vec(),
            single => vec![single],
        };
        let callable = matches!(callee, Value::Function(_) | Value::Builtin(_));
        match (self.call_function(&callee, args), callee_node.as_identifier()) {
            (Err(err), Some(name)) if !callable => {
                Err(err.with_note(format!("'{}' is bound to {}", name, callee.repr())))
            }
            (result, _) => result,
        }
    }

    /// Creates a function value closing over `env`
    pub fn make_function(
        &self,
        name: Option<String>,
        params: Vec<String>,
        body: Rc<Node>,
        env: &Environment,
        doc: Option<String>,
    ) -> Value {
        Value::Function(Rc::new(Function {
            id: self.ids.next_id(),
            name,
            params,
            body,
            env: env.clone(),
            doc,
        }))
    }

    /// Calls a function or builtin value with already-evaluated arguments
    pub fn call_function(&self, callee: &Value, args: Vec<Value>) -> Result<Value, MiniError> {
        match callee {
            Value::Function(func) => {
                let name = func.display_name();
                let _span = tracing::trace_span!("call", function = name, arity = args.len()).entered();
                if func.params.len() != args.len() {
                    return Err(MiniError::arity_mismatch(name, func.params.len(), args.len()));
                }
                let scope = func.env.child(format!("<function {}>", name));
                for (param, arg) in func.params.iter().zip(args) {
                    scope.set(param.as_str(), arg);
                }
                self.evaluate(&func.body, &scope).map_err(|err| err.with_frame(name))
            }
            Value::Builtin(builtin) => (builtin.func)(&args),
            other => Err(MiniError::runtime(
                ErrorKind::NotCallable,
                format!("Value of type {} is not callable", other.type_name()),
            )),
        }
    }
}

fn undefined(name: &str, env: &Environment) -> MiniError {
    let err = MiniError::undefined_variable(name);
    let candidates = env.visible_names();
    match find_closest_match(name, &candidates) {
        Some(suggestion) => err.with_suggestion(suggestion),
        None => err,
    }
}

/// Map literal keys are taken from the source text, not evaluated:
/// identifiers and strings become string keys, integral numbers become
/// integer keys
fn literal_key(node: &Node) -> Result<MapKey, MiniError> {
    match node {
        Node::Atomic(Atomic::Identifier(name)) | Node::Atomic(Atomic::Str(name)) => {
            Ok(MapKey::str(name))
        }
        Node::Atomic(Atomic::Number(n)) if n.fract() == 0.0 && n.is_finite() => {
            Ok(MapKey::Int(*n as i64))
        }
        other => Err(MiniError::type_error(format!(
            "Map key must be an identifier, string or integer, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Result<Value, MiniError> {
        Interpreter::without_stdlib().run(source)
    }

    #[test]
    fn test_empty_program_is_unit() {
        assert!(matches!(eval("").unwrap(), Value::Unit));
        assert!(matches!(eval("// only a comment").unwrap(), Value::Unit));
    }

    #[test]
    fn test_program_value_is_last_expression() {
        assert_eq!(eval("1\n2\n3").unwrap(), Value::Number(3.0));
        assert_eq!(eval("x = 4; x * 2").unwrap(), Value::Number(8.0));
    }

    #[test]
    fn test_failed_expression_rolls_back_bindings() {
        let interp = Interpreter::without_stdlib();
        interp.run("x = 1").unwrap();
        assert!(interp.run("x = 2\ny = missing").is_err());
        assert_eq!(interp.globals().get("x"), Some(Value::Number(2.0)));
        assert!(interp.run("x = (1 / 0)").is_err());
        assert_eq!(interp.globals().get("x"), Some(Value::Number(2.0)));
        assert!(interp.globals().get("y").is_none());
    }

    #[test]
    fn test_undefined_identifier_suggests_close_name() {
        let interp = Interpreter::without_stdlib();
        let err = interp.run("counter = 1\ncountr + 1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
        assert_eq!(err.suggestion.as_deref(), Some("counter"));
    }

    #[test]
    fn test_errors_record_function_frames() {
        let err = eval("inner(x) = x + missing\nouter(y) = inner(y)\nouter(1)").unwrap_err();
        assert_eq!(err.call_stack, vec!["inner".to_string(), "outer".to_string()]);
    }

    #[test]
    fn test_calling_a_non_function() {
        let err = eval("n = 3\nn(1)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotCallable);
        assert!(err.note.is_some());
    }

    #[test]
    fn test_map_literal_keys_are_not_evaluated() {
        let value = eval("a = 10\n#{a: a, \"b c\": 2, 3: 4}").unwrap();
        assert_eq!(value.to_string(), "#{a: 10, \"b c\": 2, 3: 4}");
    }

    #[test]
    fn test_builtins_are_registered_with_ids() {
        let interp = Interpreter::new();
        let print = interp.globals().get("print").expect("print is registered");
        let abs = interp.globals().get("abs").expect("abs is registered");
        assert!(matches!(print, Value::Builtin(_)));
        assert!(!print.equals(&abs));
        assert!(print.equals(&interp.globals().get("print").unwrap()));
    }

    #[test]
    fn test_reset_clears_user_bindings() {
        let mut interp = Interpreter::new();
        interp.run("x = 1").unwrap();
        interp.reset();
        assert!(interp.globals().get("x").is_none());
        assert!(interp.globals().get("print").is_some());
    }
}
