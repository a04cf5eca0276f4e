use std::io::Write;

use crate::common::{CompileError, CompileResult};
use crate::engine::CompilationEngine;
use crate::lexer::Lexer;

/// Compiles the single class in `source` and returns its VM code.
pub fn compile(source: &str) -> CompileResult<String> {
    let out = compile_to(source, Vec::new())?;
    String::from_utf8(out).map_err(|e| {
        CompileError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Like `compile` but writes to `out`, which is handed back on success.
/// Instructions already written stay in `out` when compilation fails.
pub fn compile_to<W: Write>(source: &str, out: W) -> CompileResult<W> {
    let tokens = Lexer::new(source).collect::<Result<Vec<_>, _>>()?;
    let mut engine = CompilationEngine::new(tokens.into_iter(), out);
    engine.compile_class()?;
    Ok(engine.into_writer())
}
