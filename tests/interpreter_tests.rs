// Integration tests for the mini interpreter
//
// These tests run complete mini programs through the public API and check
// the resulting values, bindings, output and errors. Tests cover:
// - Operator precedence and the overloaded `+`
// - Tuples, lists and maps, including aliasing and in-place updates
// - Functions, closures and scoping
// - Error kinds and rollback
// - Standard library functions
// - Pretty-print / re-parse round trips

use mini::ast::{Atomic, Node};
use mini::errors::{ErrorClass, ErrorKind, MiniError};
use mini::interpreter::{Interpreter, Value};
use mini::parser::parse;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

fn run_code(code: &str) -> Interpreter {
    let interp = Interpreter::new();
    if let Err(err) = interp.run(code) {
        panic!("program failed:\n{}\n{}", code, err);
    }
    interp
}

fn eval(code: &str) -> Value {
    Interpreter::new().run(code).unwrap_or_else(|err| panic!("program failed:\n{}\n{}", code, err))
}

fn eval_err(code: &str) -> MiniError {
    match Interpreter::new().run(code) {
        Ok(value) => panic!("expected an error from:\n{}\ngot {:?}", code, value),
        Err(err) => err,
    }
}

fn num(n: f64) -> Value {
    Value::Number(n)
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(eval("2 + 3 * 4"), num(14.0));
    assert_eq!(eval("(2 + 3) * 4"), num(20.0));
    assert_eq!(eval("2 ^ 3 * 2"), num(16.0));
    assert_eq!(eval("10 - 4 - 3"), num(3.0));
    assert_eq!(eval("1 + 2 == 3 && 2 < 3"), Value::Bool(true));
}

#[test]
fn test_prefix_operators() {
    assert_eq!(eval("-2 ^ 2"), num(4.0));
    assert_eq!(eval("not (1 == 2)"), Value::Bool(true));
    assert_eq!(eval("!true"), Value::Bool(false));
    assert_eq!(eval("m = #{a: 3}; -m.a"), num(-3.0));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("\"a\" + 1"), Value::str("a1"));
    assert_eq!(eval("1 + \"a\""), Value::str("1a"));
    assert_eq!(eval("\"list: \" + [1, \"x\"]"), Value::str("list: [1, \"x\"]"));
}

#[test]
fn test_tuple_collapse() {
    assert_eq!(eval("(5)"), num(5.0));
    assert!(matches!(eval("()"), Value::Unit));
    assert_eq!(eval("(1, 2)").to_string(), "(1, 2)");
    assert_eq!(eval("(1, 2) + (3, 4)").to_string(), "(4, 6)");
}

#[test]
fn test_closures_capture_by_reference() {
    assert_eq!(eval("f = (x) => () => x\ng = f(5)\ng()"), num(5.0));
    assert_eq!(eval("y = 1\nh = () => y\ny = 2\nh()"), num(2.0));
    assert_eq!(
        eval("make(n) = { step = 10; (x) => x + n + step }\nadd3 = make(3)\nadd3(1)"),
        num(14.0)
    );
}

#[test]
fn test_logical_operators_do_not_short_circuit() {
    let err = eval_err("false && crash()");
    assert_eq!(err.kind, ErrorKind::UndefinedVariable);
    let err = eval_err("true || crash()");
    assert_eq!(err.kind, ErrorKind::UndefinedVariable);
}

#[test]
fn test_map_union_mutates_left_operand() {
    let interp = run_code("a = #{x: 1}\nb = a + #{y: 2}");
    let a = interp.globals().get("a").unwrap();
    let b = interp.globals().get("b").unwrap();
    assert_eq!(a.to_string(), "#{x: 1, y: 2}");
    assert!(a.same_identity(&b));
}

#[test]
fn test_list_aliasing() {
    assert_eq!(eval("a = [1]\nb = a\nb[0] = 9\na").to_string(), "[9]");
    assert_eq!(eval("a = [1]\nb = a + [2]\na").to_string(), "[1]");
}

#[test]
fn test_named_function_sugar() {
    let interp = run_code("add(a, b) = a + b\nresult = add(2, 3)");
    assert_eq!(interp.globals().get("result"), Some(num(5.0)));
    match interp.globals().get("add") {
        Some(Value::Function(func)) => {
            assert_eq!(func.params, vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected a function, got {:?}", other),
    }
}

#[test]
fn test_recursion() {
    let code = "fact(n) = if n <= 1 { 1 } else { n * fact(n - 1) }\nfact(5)";
    assert_eq!(eval(code), num(120.0));
}

#[test]
fn test_call_argument_counts() {
    assert_eq!(eval("id(x) = x\nid(7)"), num(7.0));
    assert_eq!(eval("none() = 1\nnone()"), num(1.0));
    assert_eq!(eval("add(a, b) = a + b\nadd(1, 2)"), num(3.0));
}

#[test]
fn test_lone_tuple_argument_is_unpacked() {
    assert_eq!(eval("f(a, b) = a + b\nf((1, 2))"), num(3.0));
    assert_eq!(eval("f(a, b) = a * b\nt = (4, 5)\nf(t)"), num(20.0));
    assert_eq!(eval("g() = 1\ng(())"), num(1.0));
    assert_eq!(eval("t = (1, 2, 3)\ntuple_size(t)"), num(3.0));
    assert_eq!(eval("tuple_size(())"), num(0.0));
    assert_eq!(eval_err("first(t) = t[0]\nfirst((1, 2))").kind, ErrorKind::ArityMismatch);
    // A tuple inside a longer argument list stays whole
    assert_eq!(eval("t = (1, 2)\ntuple_contains(t, 2)"), Value::Bool(true));
    assert_eq!(eval("is_type((1, 2), \"tuple\")"), Value::Bool(true));
}

#[test]
fn test_member_and_index_assignment_paths() {
    assert_eq!(eval("m = #{a: #{b: 1}}\nm.a.b = 9\nm.a.b"), num(9.0));
    assert_eq!(eval("l = [1, [2, 3]]\nl[1][0] = 9\nl[1][0]"), num(9.0));
    assert_eq!(eval("m = #{a: 5} m.a = 6 m.a"), num(6.0));
    assert_eq!(eval("m = [1, 2, 3] m[1] = 6 m[1]"), num(6.0));
    assert_eq!(eval("m = #{}\nm[\"new key\"] = 1\nm[3] = 2\nm").to_string(), "#{\"new key\": 1, 3: 2}");
}

#[test]
fn test_indexing() {
    assert_eq!(eval("[1, 2, 3][0]"), num(1.0));
    assert_eq!(eval("[1, 2, 3][-1]"), num(3.0));
    assert_eq!(eval("[1, 2, 3][-3]"), num(1.0));
    assert_eq!(eval("(4, 5, 6)[-2]"), num(5.0));
    assert_eq!(eval("#{a: 5}['a']"), num(5.0));
    assert_eq!(eval("#{a: #{ b: 5}}['a']['b']"), num(5.0));
    assert_eq!(eval("#{a: #{ b: #{c: 6}}}.a.b.c"), num(6.0));
    assert_eq!(eval_err("[1, 2, 3][3]").kind, ErrorKind::IndexError);
    assert_eq!(eval_err("#{a: 1}.b").kind, ErrorKind::KeyError);
    assert_eq!(eval_err("[1][\"a\"]").kind, ErrorKind::TypeError);
}

#[test]
fn test_undefined_identifier() {
    let err = eval_err("missing");
    assert_eq!(err.kind, ErrorKind::UndefinedVariable);
    assert_eq!(err.class(), ErrorClass::Runtime);
    assert!(err.message.contains("missing"));

    let err = eval_err("prnt(1)");
    assert_eq!(err.suggestion.as_deref(), Some("print"));
}

#[test]
fn test_arity_mismatch() {
    let err = eval_err("add(a, b) = a + b\nadd(1)");
    assert_eq!(err.kind, ErrorKind::ArityMismatch);
    assert_eq!(err.message, "Function 'add' expects 2 arguments but got 1");
    let err = eval_err("add(a, b) = a + b\nadd(1, 2, 3)");
    assert_eq!(err.message, "Function 'add' expects 2 arguments but got 3");
}

#[test]
fn test_assignment_shadows_in_inner_scopes() {
    let interp = run_code("x = 1\ninner = { x = 2; x }");
    assert_eq!(interp.globals().get("x"), Some(num(1.0)));
    assert_eq!(interp.globals().get("inner"), Some(num(2.0)));

    assert_eq!(eval("x = 1\nf() = { x = 5; x }\nf()\nx"), num(1.0));
}

#[test]
fn test_compound_assignment() {
    assert_eq!(eval("x = 1\nx += 2\nx *= 5\nx"), num(15.0));
    assert_eq!(eval("s = \"n=\"\ns += 4\ns"), Value::str("n=4"));
    assert_eq!(eval_err("x = 1\nx /= 0").kind, ErrorKind::DivisionByZero);
    assert_eq!(eval_err("y += 1").kind, ErrorKind::UndefinedVariable);
}

#[test]
fn test_if_expressions() {
    assert_eq!(eval("x = 5\nif x > 3 { \"big\" } else { \"small\" }"), Value::str("big"));
    assert_eq!(
        eval("x = 2\nif x == 1 { \"one\" } else if x == 2 { \"two\" } else { \"many\" }"),
        Value::str("two")
    );
    let err = eval_err("if false { 1 }");
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert_eq!(eval_err("if 1 { 1 } else { 2 }").kind, ErrorKind::TypeError);
}

#[test]
fn test_equality() {
    assert_eq!(eval("#{a: 1, b: 2} == #{b: 2, a: 1}"), Value::Bool(true));
    assert_eq!(eval("#{a: 1} == #{a: 2}"), Value::Bool(false));
    assert_eq!(eval("[1, (2, 3)] == [1, (2, 3)]"), Value::Bool(true));
    assert_eq!(eval("1 == \"1\""), Value::Bool(false));
    assert_eq!(eval("f = () => 1\ng = f\nf == g"), Value::Bool(true));
    assert_eq!(eval("(() => 1) == (() => 1)"), Value::Bool(false));
}

#[test]
fn test_arithmetic_errors() {
    assert_eq!(eval_err("1 / 0").kind, ErrorKind::DivisionByZero);
    assert_eq!(eval_err("1 % 0").kind, ErrorKind::DivisionByZero);
    assert_eq!(eval_err("\"a\" < \"b\"").kind, ErrorKind::TypeError);
    assert_eq!(eval_err("true + 1").kind, ErrorKind::TypeError);
    assert_eq!(eval("-7 % 3"), num(2.0));
}

#[test]
fn test_error_classes() {
    assert_eq!(eval_err("a = $").class(), ErrorClass::Lexical);
    assert_eq!(eval_err("(1, 2").class(), ErrorClass::Syntax);
    assert_eq!(eval_err("1 = 2").kind, ErrorKind::InvalidAssignment);
    assert_eq!(eval_err("3(1)").kind, ErrorKind::NotCallable);
}

#[test]
fn test_failed_expression_leaves_environment_unchanged() {
    let interp = Interpreter::new();
    interp.run("x = 1").unwrap();
    assert!(interp.run("x = 2 + missing").is_err());
    assert_eq!(interp.globals().get("x"), Some(num(1.0)));
}

#[test]
fn test_print_output() {
    let mut interp = Interpreter::new();
    let buffer = Arc::new(Mutex::new(Vec::new()));
    interp.set_output(buffer.clone());
    interp.run("greet(name) = print(\"Hello,\", name)\ngreet(\"World\")\nprint([1, 2], 2.5)").unwrap();
    let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert_eq!(output, "Hello, World\n[1, 2] 2.5\n");
}

#[test]
fn test_standard_library() {
    assert_eq!(eval("l = [3, 1, 2]\nlist_sort(l)\nl").to_string(), "[1, 2, 3]");
    assert_eq!(eval("l = []\nlist_append(l, 1)\nlist_append(l, 2)\nlist_size(l)"), num(2.0));
    assert_eq!(eval("map_keys(#{a: 1, b: 2})").to_string(), "[\"a\", \"b\"]");
    assert_eq!(eval("typeof([1, 2])"), Value::str("list"));
    assert_eq!(eval("typeof(print)"), Value::str("function"));
    assert_eq!(eval("str(12) + str(true)"), Value::str("12true"));
    assert_eq!(eval("max(abs(-4), sqrt(9))"), num(4.0));
    assert_eq!(eval_err("abs(1, 2)").kind, ErrorKind::ArityMismatch);
}

#[test]
fn test_seeded_random_matches_across_sessions() {
    let code = "random_seed(7)\n[random_int(1, 100), random_int(1, 100), random()]";
    assert_eq!(eval(code), eval(code));
}

#[test]
fn test_semicolons_and_comments() {
    assert_eq!(eval("a = 1; b = 2; a + b"), num(3.0));
    assert_eq!(eval("/* block */ x = 4 // trailing\nx"), num(4.0));
}

// Literal, tuple and list trees that the pretty-printer can render
fn literal_tree() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        (0u32..100_000).prop_map(|n| Node::Atomic(Atomic::Number(n as f64 / 100.0))),
        "[ -~]{0,8}".prop_map(|s| Node::Atomic(Atomic::Str(s))),
        any::<bool>().prop_map(|b| Node::Atomic(Atomic::Bool(b))),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Node::Tuple),
            prop::collection::vec(inner, 0..4).prop_map(Node::List),
        ]
    })
}

proptest! {
    #[test]
    fn test_printed_tree_reparses_to_same_value(node in literal_tree()) {
        let interp = Interpreter::without_stdlib();
        let expected = interp.evaluate(&node, interp.globals()).unwrap();

        let source = node.to_string();
        let program = parse(&source).unwrap();
        prop_assert_eq!(program.exprs.len(), 1);
        let actual = interp.evaluate(&program.exprs[0], interp.globals()).unwrap();
        prop_assert!(expected.equals(&actual), "{} => {} vs {}", source, expected, actual);
    }
}

#[test]
fn test_map_literal_keys_must_be_atomic_integers_or_names() {
    assert_eq!(eval_err("#{1.5: 1}").kind, ErrorKind::TypeError);
    assert_eq!(eval_err("#{true: 1}").kind, ErrorKind::TypeError);
    assert_eq!(eval_err("#{(1 + 1): 2}").kind, ErrorKind::TypeError);

    let interp = run_code("x = 5\nm = #{2.0: x}");
    let m = interp.globals().get("m").expect("m is bound");
    assert_eq!(m.to_string(), "#{2: 5}");
    assert_eq!(interp.run("m[2]").unwrap(), num(5.0));
}

#[test]
fn test_list_remove_of_the_list_itself() {
    let err = eval_err("l = [[1]]\nlist_remove(l, l)");
    assert_eq!(err.kind, ErrorKind::IndexError);
    assert_eq!(eval("l = [1]\nl[0] = l\nlist_remove(l, l)\nl").to_string(), "[]");
}

#[test]
fn test_self_referencing_containers_print() {
    assert_eq!(eval("l = [1, 2]\nl[0] = l").to_string(), "[[...], 2]");
    assert_eq!(eval("m = #{a: 1}\nm.me = m\nstr(m)"), Value::str("#{a: 1, me: #{...}}"));
    assert_eq!(eval("a = [0]; a[0] = a; b = [0]; b[0] = b; a == b"), Value::Bool(true));

    let mut interp = Interpreter::new();
    let buffer = Arc::new(Mutex::new(Vec::new()));
    interp.set_output(buffer.clone());
    interp.run("l = [1]\nl[0] = l\nprint(l)").unwrap();
    let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert_eq!(output, "[[...]]\n");
}

#[test]
fn test_rollback_restores_bindings_but_not_container_contents() {
    let interp = run_code("m = #{a: 1}\nx = 1");
    assert!(interp.run("{ m.a = 2; missing }").is_err());
    assert_eq!(interp.run("m.a").unwrap(), num(2.0));

    // Only the failing top-level expression is undone
    assert!(interp.run("x = 2; m = #{b: missing}").is_err());
    assert_eq!(interp.run("x").unwrap(), num(2.0));
    assert_eq!(interp.run("m").unwrap().to_string(), "#{a: 2}");
}
