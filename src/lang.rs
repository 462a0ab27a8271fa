//! The snippet language: a small, Python-flavoured statement language.
//!
//! Snippets are short programs a learner types at the prompt. The grammar is
//! deliberately narrow: assignments, `if`/`while`/`for`, functions, lists,
//! tuples and dicts. Import and scope-escape statements are parsed so the
//! vetter can reject them with a precise message instead of a syntax error.

pub mod ast;
mod lexer;
mod parser;

pub use ast::{
    BinOp, CmpOp, Expr, FunctionDef, Literal, LogicalOp, Param, Program, Stmt, StmtKind, Target,
    UnaryOp,
};

use std::fmt;

/// A lexing or parsing failure with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// What the parser expected or found.
    pub message: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub col: u32,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (line {}, column {})",
            self.message, self.line, self.col
        )
    }
}

impl std::error::Error for SyntaxError {}

/// Parse snippet source into a [`Program`].
///
/// # Errors
///
/// Returns a [`SyntaxError`] for the first lexical or grammatical problem.
pub fn parse(source: &str) -> Result<Program, SyntaxError> {
    let tokens = lexer::tokenize(source)?;
    parser::Parser::new(tokens).program()
}
