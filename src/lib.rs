// NYAA-PL Interpreter Library
//
// Lexer, right-associative recursive-descent parser and tree-walking
// evaluator for NYAA-PL, a small kawaii-keyword scripting language.

// Public modules
pub mod ast;
pub mod config;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, ReplInput, Stmt};
pub use config::Config;
pub use environment::Environment;
pub use error::{ErrorKind, NyaaError, Position, RuntimeErrorKind, Span};
pub use evaluator::{Evaluator, Outcome};
pub use lexer::{tokenize, Lexer, Token, TokenType};
pub use parser::{parse_program, Parser};
pub use value::{Function, Value};

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{execute, run};
