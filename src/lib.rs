// File: src/lib.rs
//
// Library interface for the mini interpreter.
// Exposes the pipeline stages for the binary, integration tests and embedders.

pub mod ast;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod repl;
