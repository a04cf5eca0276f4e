use std::io;

#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error("[line {line}] Error: {message}")]
    Lex { line: u32, message: &'static str },
    #[error("[line {line}] Error at '{found}': Expect {expected}.")]
    Syntax {
        line: u32,
        expected: String,
        found: String,
    },
    #[error("Error at end: Expect {expected}.")]
    UnexpectedEof { expected: String },
    #[error("[line {line}] Error at '{name}': Undefined symbol.")]
    UndefinedSymbol { line: u32, name: String },
    #[error("[line {line}] Error at '{name}': Symbol already defined in this scope.")]
    DuplicateSymbol { line: u32, name: String },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type CompileResult<T> = Result<T, CompileError>;
