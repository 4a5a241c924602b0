// File: src/ast.rs
//
// Abstract Syntax Tree (AST) definitions for the mini language.
//
// Everything in mini is an expression, so the tree is a single closed `Node`
// enum. Calls, indexing, member access and (compound) assignment are all
// `Binary` nodes distinguished by their operator, which lets one precedence
// table and one evaluator handle them uniformly. Nodes are immutable once
// the parser has built them.
//
// `Display` renders a node back into source text that re-parses to an
// equivalent tree (binary operations are fully parenthesized).

use std::fmt;
use std::rc::Rc;

/// Leaf expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Atomic {
    Identifier(String),
    Str(String),
    Number(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Dot,
    Call,
    Index,
    Power,
    Multiply,
    Divide,
    Modulo,
    Plus,
    Minus,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    NotEqual,
    Equal,
    PlusEqual,
    MinusEqual,
    TimesEqual,
    DivEqual,
    ModEqual,
    PowEqual,
    And,
    Or,
    Assignment,
}

impl BinaryOp {
    /// Source spelling of the operator (empty for call and index, which
    /// are written with brackets)
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Dot => ".",
            BinaryOp::Call | BinaryOp::Index => "",
            BinaryOp::Power => "^",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Equal => "==",
            BinaryOp::PlusEqual => "+=",
            BinaryOp::MinusEqual => "-=",
            BinaryOp::TimesEqual => "*=",
            BinaryOp::DivEqual => "/=",
            BinaryOp::ModEqual => "%=",
            BinaryOp::PowEqual => "^=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Assignment => "=",
        }
    }

    /// For `x op= y`, the arithmetic operator applied to `x` and `y`
    pub fn compound_base(self) -> Option<BinaryOp> {
        match self {
            BinaryOp::PlusEqual => Some(BinaryOp::Plus),
            BinaryOp::MinusEqual => Some(BinaryOp::Minus),
            BinaryOp::TimesEqual => Some(BinaryOp::Multiply),
            BinaryOp::DivEqual => Some(BinaryOp::Divide),
            BinaryOp::ModEqual => Some(BinaryOp::Modulo),
            BinaryOp::PowEqual => Some(BinaryOp::Power),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BinaryOp::Call => write!(f, "call"),
            BinaryOp::Index => write!(f, "index"),
            op => write!(f, "{}", op.symbol()),
        }
    }
}

/// A node of the expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Atomic(Atomic),
    Tuple(Vec<Node>),
    List(Vec<Node>),
    /// Key/value pairs in source order
    Map(Vec<(Node, Node)>),
    Block(Vec<Node>),
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
        /// Doc comment attached to an assignment
        doc: Option<String>,
    },
    Lambda {
        params: Vec<String>,
        body: Rc<Node>,
    },
    If {
        condition: Box<Node>,
        then_body: Box<Node>,
        else_ifs: Vec<(Node, Node)>,
        else_body: Option<Box<Node>>,
    },
}

impl Node {
    pub fn identifier(name: impl Into<String>) -> Node {
        Node::Atomic(Atomic::Identifier(name.into()))
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Node {
        Node::Binary { op, left: Box::new(left), right: Box::new(right), doc: None }
    }

    /// The name if this node is a bare identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Node::Atomic(Atomic::Identifier(name)) => Some(name),
            _ => None,
        }
    }
}

/// A parsed source file: top-level expressions in order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub exprs: Vec<Node>,
}

/// Formats a number the way mini prints it: integral values without a
/// fractional part, everything else in shortest round-trip form
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

/// Double-quoted string literal with escapes the lexer understands
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn write_separated(f: &mut fmt::Formatter, nodes: &[Node], separator: &str) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", node)?;
    }
    Ok(())
}

impl fmt::Display for Atomic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Atomic::Identifier(name) => write!(f, "{}", name),
            Atomic::Str(s) => write!(f, "{}", quote_string(s)),
            Atomic::Number(n) => write!(f, "{}", format_number(*n)),
            Atomic::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::Atomic(atomic) => write!(f, "{}", atomic),
            Node::Tuple(elements) => {
                write!(f, "(")?;
                write_separated(f, elements, ", ")?;
                write!(f, ")")
            }
            Node::List(elements) => {
                write!(f, "[")?;
                write_separated(f, elements, ", ")?;
                write!(f, "]")
            }
            Node::Map(pairs) => {
                write!(f, "#{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Node::Block(exprs) => {
                write!(f, "{{")?;
                write_separated(f, exprs, "; ")?;
                write!(f, "}}")
            }
            Node::Unary { op, operand } => match op {
                UnaryOp::Negate => write!(f, "(-{})", operand),
                UnaryOp::Not => write!(f, "(!{})", operand),
            },
            Node::Binary { op, left, right, .. } => match op {
                BinaryOp::Dot => write!(f, "{}.{}", left, right),
                BinaryOp::Call => write!(f, "{}{}", left, right),
                BinaryOp::Index => write!(f, "{}[{}]", left, right),
                op => write!(f, "({} {} {})", left, op.symbol(), right),
            },
            Node::Lambda { params, body } => write!(f, "(({}) => {})", params.join(", "), body),
            Node::If { condition, then_body, else_ifs, else_body } => {
                write!(f, "(if {} {}", condition, then_body)?;
                for (cond, body) in else_ifs {
                    write!(f, " else if {} {}", cond, body)?;
                }
                if let Some(else_body) = else_body {
                    write!(f, " else {}", else_body)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for expr in &self.exprs {
            writeln!(f, "{}", expr)?;
        }
        Ok(())
    }
}
