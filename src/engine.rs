use std::io::Write;
use std::iter::Peekable;

use crate::common::{CompileError, CompileResult};
use crate::lexer::{Token, TokenType};
use crate::symbol_table::{Kind, SymbolError, SymbolTable};
use crate::vm_writer::{Command, Segment, VmWriter};

/// Single-token lookahead over the token stream.
pub struct Cursor<I: Iterator> {
    tokens: Peekable<I>,
}

impl<'a, I: Iterator<Item = Token<'a>>> Cursor<I> {
    pub fn new(tokens: I) -> Self {
        Self {
            tokens: tokens.peekable(),
        }
    }

    pub fn peek(&mut self) -> Option<Token<'a>> {
        self.tokens.peek().cloned()
    }

    pub fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.next();

        #[cfg(feature = "debug-logging")]
        {
            if let Some(t) = &token {
                eprintln!("{:>4} {:?} '{}'", t.line, t.tok_type, t.source);
            }
        }

        token
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum SubroutineType {
    Constructor,
    Function,
    Method,
}

enum BinaryOp {
    Command(Command),
    Call(&'static str),
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    if token.tok_type != TokenType::Symbol {
        return None;
    }
    let op = match token.source {
        "+" => BinaryOp::Command(Command::Add),
        "-" => BinaryOp::Command(Command::Sub),
        "&" => BinaryOp::Command(Command::And),
        "|" => BinaryOp::Command(Command::Or),
        "<" => BinaryOp::Command(Command::Lt),
        ">" => BinaryOp::Command(Command::Gt),
        "=" => BinaryOp::Command(Command::Eq),
        "*" => BinaryOp::Call("Math.multiply"),
        "/" => BinaryOp::Call("Math.divide"),
        _ => return None,
    };
    Some(op)
}

/// Recursive-descent compiler for one Jack class. Each production reads its
/// own tokens, resolves names through the symbol table and writes VM code as
/// it goes; nothing is buffered between productions.
pub struct CompilationEngine<'a, I: Iterator<Item = Token<'a>>, W: Write> {
    cursor: Cursor<I>,
    writer: VmWriter<W>,
    symbols: SymbolTable,
    class_name: &'a str,
    subroutine_name: String,
    label_count: usize,
}

impl<'a, I: Iterator<Item = Token<'a>>, W: Write> CompilationEngine<'a, I, W> {
    pub fn new(tokens: I, out: W) -> Self {
        Self {
            cursor: Cursor::new(tokens),
            writer: VmWriter::new(out),
            symbols: SymbolTable::new(),
            class_name: "",
            subroutine_name: String::new(),
            label_count: 0,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    // class: 'class' className '{' classVarDec* subroutineDec* '}'
    pub fn compile_class(&mut self) -> CompileResult<()> {
        self.consume_keyword("class")?;
        self.class_name = self.consume_identifier("class name")?.source;
        self.consume_symbol("{")?;

        while self.check_keyword("static") || self.check_keyword("field") {
            self.compile_class_var_dec()?;
        }
        while self.check_keyword("constructor")
            || self.check_keyword("function")
            || self.check_keyword("method")
        {
            self.compile_subroutine()?;
        }
        self.consume_symbol("}")?;

        match self.cursor.peek() {
            Some(token) => Err(syntax_error(&token, "end of input")),
            None => Ok(()),
        }
    }

    fn compile_class_var_dec(&mut self) -> CompileResult<()> {
        let kind = if self.match_keyword("static") {
            Kind::Static
        } else {
            self.consume_keyword("field")?;
            Kind::Field
        };
        self.compile_names(kind)
    }

    fn compile_var_dec(&mut self) -> CompileResult<()> {
        self.consume_keyword("var")?;
        self.compile_names(Kind::Var)
    }

    // type varName (',' varName)* ';'
    fn compile_names(&mut self, kind: Kind) -> CompileResult<()> {
        let type_name = self.compile_type(false)?;
        loop {
            let name = self.consume_identifier("variable name")?;
            self.define(&name, type_name, kind)?;
            if !self.match_symbol(",") {
                break;
            }
        }
        self.consume_symbol(";")
    }

    fn compile_type(&mut self, allow_void: bool) -> CompileResult<&'a str> {
        let expected = if allow_void { "return type" } else { "type" };
        let token = self.advance(expected)?;
        match token.tok_type {
            TokenType::Identifier => Ok(token.source),
            TokenType::Keyword => match token.source {
                "int" | "char" | "boolean" => Ok(token.source),
                "void" if allow_void => Ok(token.source),
                _ => Err(syntax_error(&token, expected)),
            },
            _ => Err(syntax_error(&token, expected)),
        }
    }

    fn compile_subroutine(&mut self) -> CompileResult<()> {
        let token = self.advance("subroutine declaration")?;
        let subroutine_type = match token.source {
            "constructor" => SubroutineType::Constructor,
            "function" => SubroutineType::Function,
            "method" => SubroutineType::Method,
            _ => return Err(syntax_error(&token, "subroutine declaration")),
        };

        self.symbols.start_subroutine();
        self.compile_type(true)?;
        let name = self.consume_identifier("subroutine name")?;
        self.subroutine_name = format!("{}.{}", self.class_name, name.source);

        if subroutine_type == SubroutineType::Method {
            let this = Token::new(TokenType::Keyword, "this", name.line);
            self.define(&this, self.class_name, Kind::Arg)?;
        }

        self.consume_symbol("(")?;
        self.compile_parameter_list()?;
        self.consume_symbol(")")?;
        self.compile_subroutine_body(subroutine_type)
    }

    fn compile_parameter_list(&mut self) -> CompileResult<()> {
        if self.check_symbol(")") {
            return Ok(());
        }
        loop {
            let type_name = self.compile_type(false)?;
            let name = self.consume_identifier("parameter name")?;
            self.define(&name, type_name, Kind::Arg)?;
            if !self.match_symbol(",") {
                return Ok(());
            }
        }
    }

    // '{' varDec* statements '}'
    //
    // Every varDec precedes the first statement, so the local count is final
    // by the time the function header has to be written.
    fn compile_subroutine_body(&mut self, subroutine_type: SubroutineType) -> CompileResult<()> {
        self.consume_symbol("{")?;
        while self.check_keyword("var") {
            self.compile_var_dec()?;
        }

        self.writer
            .write_function(&self.subroutine_name, self.symbols.var_count(Kind::Var))?;
        match subroutine_type {
            SubroutineType::Constructor => {
                self.writer
                    .write_push(Segment::Constant, self.symbols.var_count(Kind::Field))?;
                self.writer.write_call("Memory.alloc", 1)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineType::Method => {
                self.writer.write_push(Segment::Argument, 0)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineType::Function => (),
        }

        self.compile_statements()?;
        self.consume_symbol("}")
    }

    fn compile_statements(&mut self) -> CompileResult<()> {
        while let Some(token) = self.cursor.peek() {
            if token.tok_type != TokenType::Keyword {
                break;
            }
            match token.source {
                "let" => self.compile_let()?,
                "if" => self.compile_if()?,
                "while" => self.compile_while()?,
                "do" => self.compile_do()?,
                "return" => self.compile_return()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn compile_let(&mut self) -> CompileResult<()> {
        self.consume_keyword("let")?;
        let name = self.consume_identifier("variable name")?;
        let (segment, index) = self.resolve(&name)?;

        if self.match_symbol("[") {
            self.writer.write_push(segment, index)?;
            self.compile_expression()?;
            self.consume_symbol("]")?;
            self.writer.write_arithmetic(Command::Add)?;

            self.consume_symbol("=")?;
            self.compile_expression()?;
            self.consume_symbol(";")?;

            // the target address waits on the stack until the value is known
            self.writer.write_pop(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::That, 0)?;
        } else {
            self.consume_symbol("=")?;
            self.compile_expression()?;
            self.consume_symbol(";")?;
            self.writer.write_pop(segment, index)?;
        }
        Ok(())
    }

    fn compile_while(&mut self) -> CompileResult<()> {
        let n = self.next_label();
        let top = self.label("WHILE_EXP", n);
        let end = self.label("WHILE_END", n);

        self.consume_keyword("while")?;
        self.writer.write_label(&top)?;
        self.compile_condition()?;
        self.writer.write_if(&end)?;

        self.compile_block()?;
        self.writer.write_goto(&top)?;
        self.writer.write_label(&end)?;
        Ok(())
    }

    fn compile_if(&mut self) -> CompileResult<()> {
        let n = self.next_label();
        let else_label = self.label("IF_FALSE", n);

        self.consume_keyword("if")?;
        self.compile_condition()?;
        self.writer.write_if(&else_label)?;
        self.compile_block()?;

        if self.match_keyword("else") {
            let end = self.label("IF_END", n);
            self.writer.write_goto(&end)?;
            self.writer.write_label(&else_label)?;
            self.compile_block()?;
            self.writer.write_label(&end)?;
        } else {
            self.writer.write_label(&else_label)?;
        }
        Ok(())
    }

    // '(' expression ')' leaving the negated condition on the stack
    fn compile_condition(&mut self) -> CompileResult<()> {
        self.consume_symbol("(")?;
        self.compile_expression()?;
        self.consume_symbol(")")?;
        self.writer.write_arithmetic(Command::Not)?;
        Ok(())
    }

    fn compile_block(&mut self) -> CompileResult<()> {
        self.consume_symbol("{")?;
        self.compile_statements()?;
        self.consume_symbol("}")
    }

    fn compile_do(&mut self) -> CompileResult<()> {
        self.consume_keyword("do")?;
        let name = self.consume_identifier("subroutine name")?;
        self.compile_subroutine_call(&name)?;
        self.consume_symbol(";")?;
        // every call leaves a value, even void ones
        self.writer.write_pop(Segment::Temp, 0)?;
        Ok(())
    }

    fn compile_return(&mut self) -> CompileResult<()> {
        self.consume_keyword("return")?;
        if self.check_symbol(";") {
            self.writer.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.consume_symbol(";")?;
        self.writer.write_return()?;
        Ok(())
    }

    /// Operators have no precedence and apply strictly left to right.
    fn compile_expression(&mut self) -> CompileResult<()> {
        self.compile_term()?;
        while let Some(op) = self.cursor.peek().as_ref().and_then(binary_op) {
            self.cursor.advance();
            self.compile_term()?;
            match op {
                BinaryOp::Command(command) => self.writer.write_arithmetic(command)?,
                BinaryOp::Call(function) => self.writer.write_call(function, 2)?,
            }
        }
        Ok(())
    }

    fn compile_term(&mut self) -> CompileResult<()> {
        let token = self.advance("expression")?;
        match token.tok_type {
            TokenType::IntConst => {
                let value = token
                    .source
                    .parse::<usize>()
                    .map_err(|_| syntax_error(&token, "integer constant"))?;
                self.writer.write_push(Segment::Constant, value)?;
            }
            TokenType::StrConst => self.compile_string(token.source)?,
            TokenType::Keyword => match token.source {
                "true" => {
                    self.writer.write_push(Segment::Constant, 0)?;
                    self.writer.write_arithmetic(Command::Not)?;
                }
                "false" | "null" => self.writer.write_push(Segment::Constant, 0)?,
                "this" => self.writer.write_push(Segment::Pointer, 0)?,
                _ => return Err(syntax_error(&token, "expression")),
            },
            TokenType::Identifier => {
                if self.match_symbol("[") {
                    let (segment, index) = self.resolve(&token)?;
                    self.writer.write_push(segment, index)?;
                    self.compile_expression()?;
                    self.consume_symbol("]")?;
                    self.writer.write_arithmetic(Command::Add)?;
                    self.writer.write_pop(Segment::Pointer, 1)?;
                    self.writer.write_push(Segment::That, 0)?;
                } else if self.check_symbol("(") || self.check_symbol(".") {
                    self.compile_subroutine_call(&token)?;
                } else {
                    let (segment, index) = self.resolve(&token)?;
                    self.writer.write_push(segment, index)?;
                }
            }
            TokenType::Symbol => match token.source {
                "-" => {
                    self.compile_term()?;
                    self.writer.write_arithmetic(Command::Neg)?;
                }
                "~" => {
                    self.compile_term()?;
                    self.writer.write_arithmetic(Command::Not)?;
                }
                "(" => {
                    self.compile_expression()?;
                    self.consume_symbol(")")?;
                }
                _ => return Err(syntax_error(&token, "expression")),
            },
        }
        Ok(())
    }

    fn compile_string(&mut self, text: &str) -> CompileResult<()> {
        self.writer.write_push(Segment::Constant, text.chars().count())?;
        self.writer.write_call("String.new", 1)?;
        for c in text.chars() {
            self.writer.write_push(Segment::Constant, c as usize)?;
            self.writer.write_call("String.appendChar", 2)?;
        }
        Ok(())
    }

    // name '(' expressionList ')' | (className | varName) '.' name '(' expressionList ')'
    //
    // `name` has already been consumed.
    fn compile_subroutine_call(&mut self, name: &Token<'a>) -> CompileResult<()> {
        let (function, receivers) = if self.match_symbol(".") {
            let method = self.consume_identifier("subroutine name")?;
            let variable = self
                .symbols
                .lookup(name.source)
                .map(|s| (s.kind.segment(), s.index, s.type_name.clone()));
            match variable {
                Some((segment, index, type_name)) => {
                    self.writer.write_push(segment, index)?;
                    (format!("{}.{}", type_name, method.source), 1)
                }
                None => (format!("{}.{}", name.source, method.source), 0),
            }
        } else {
            self.writer.write_push(Segment::Pointer, 0)?;
            (format!("{}.{}", self.class_name, name.source), 1)
        };

        self.consume_symbol("(")?;
        let n_args = self.compile_expression_list()?;
        self.consume_symbol(")")?;
        self.writer.write_call(&function, n_args + receivers)?;
        Ok(())
    }

    fn compile_expression_list(&mut self) -> CompileResult<usize> {
        if self.check_symbol(")") {
            return Ok(0);
        }
        let mut count = 0;
        loop {
            self.compile_expression()?;
            count += 1;
            if !self.match_symbol(",") {
                return Ok(count);
            }
        }
    }

    fn define(&mut self, name: &Token, type_name: &str, kind: Kind) -> CompileResult<usize> {
        self.symbols
            .define(name.source, type_name, kind)
            .map_err(|e| symbol_error(e, name.line))
    }

    fn resolve(&self, name: &Token) -> CompileResult<(Segment, usize)> {
        self.symbols
            .lookup(name.source)
            .map(|s| (s.kind.segment(), s.index))
            .ok_or_else(|| symbol_error(SymbolError::Undefined(name.source.to_string()), name.line))
    }

    fn next_label(&mut self) -> usize {
        let n = self.label_count;
        self.label_count += 1;
        n
    }

    fn label(&self, tag: &str, n: usize) -> String {
        format!("{}${}{}", self.subroutine_name, tag, n)
    }

    fn advance(&mut self, expected: &str) -> CompileResult<Token<'a>> {
        self.cursor
            .advance()
            .ok_or_else(|| CompileError::UnexpectedEof {
                expected: expected.to_string(),
            })
    }

    fn check_symbol(&mut self, symbol: &str) -> bool {
        self.cursor.peek().map_or(false, |t| t.is_symbol(symbol))
    }

    fn check_keyword(&mut self, keyword: &str) -> bool {
        self.cursor.peek().map_or(false, |t| t.is_keyword(keyword))
    }

    fn match_symbol(&mut self, symbol: &str) -> bool {
        if self.check_symbol(symbol) {
            self.cursor.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.cursor.advance();
            true
        } else {
            false
        }
    }

    fn consume_symbol(&mut self, symbol: &str) -> CompileResult<()> {
        let expected = format!("'{}'", symbol);
        let token = self.advance(&expected)?;
        if token.is_symbol(symbol) {
            Ok(())
        } else {
            Err(syntax_error(&token, &expected))
        }
    }

    fn consume_keyword(&mut self, keyword: &str) -> CompileResult<()> {
        let expected = format!("'{}'", keyword);
        let token = self.advance(&expected)?;
        if token.is_keyword(keyword) {
            Ok(())
        } else {
            Err(syntax_error(&token, &expected))
        }
    }

    fn consume_identifier(&mut self, expected: &str) -> CompileResult<Token<'a>> {
        let token = self.advance(expected)?;
        if token.tok_type == TokenType::Identifier {
            Ok(token)
        } else {
            Err(syntax_error(&token, expected))
        }
    }
}

fn syntax_error(token: &Token, expected: &str) -> CompileError {
    CompileError::Syntax {
        line: token.line,
        expected: expected.to_string(),
        found: token.source.to_string(),
    }
}

fn symbol_error(error: SymbolError, line: u32) -> CompileError {
    match error {
        SymbolError::Undefined(name) => CompileError::UndefinedSymbol { line, name },
        SymbolError::Duplicate(name) => CompileError::DuplicateSymbol { line, name },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn compile(source: &str) -> Result<(String, SymbolTable), CompileError> {
        let tokens = Lexer::new(source).collect::<Result<Vec<_>, _>>()?;
        let mut engine = CompilationEngine::new(tokens.into_iter(), Vec::new());
        engine.compile_class()?;
        let CompilationEngine { symbols, writer, .. } = engine;
        Ok((String::from_utf8(writer.into_inner()).unwrap(), symbols))
    }

    fn vm(source: &str) -> Vec<String> {
        compile(source)
            .unwrap()
            .0
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    fn main_body(body: &str) -> String {
        format!("class Main {{ function void main() {{ {} }} }}", body)
    }

    #[test]
    fn class_vars_get_contiguous_indices() {
        let (_, symbols) =
            compile("class A { static int s, t; field int x; field Point p, q; static boolean u; }")
                .unwrap();
        assert_eq!(symbols.var_count(Kind::Static), 3);
        assert_eq!(symbols.var_count(Kind::Field), 3);
        assert_eq!(symbols.index_of("u"), Ok(2));
        assert_eq!(symbols.index_of("q"), Ok(2));
        assert_eq!(symbols.type_of("p"), Ok("Point"));
        assert_eq!(symbols.kind_of("t"), Some(Kind::Static));
    }

    #[test]
    fn method_receives_implicit_this() {
        let (out, symbols) = compile("class P { field int x; method int get() { return x; } }").unwrap();
        assert_eq!(symbols.var_count(Kind::Arg), 1);
        assert_eq!(symbols.kind_of("this"), Some(Kind::Arg));
        assert_eq!(symbols.index_of("this"), Ok(0));
        assert_eq!(symbols.type_of("this"), Ok("P"));
        assert_eq!(
            out,
            "function P.get 0\npush argument 0\npop pointer 0\npush this 0\nreturn\n"
        );
    }

    #[test]
    fn string_constant() {
        let out = vm(&main_body("do Output.printString(\"AB\"); return;"));
        assert_eq!(
            &out[1..7],
            &[
                "push constant 2",
                "call String.new 1",
                "push constant 65",
                "call String.appendChar 2",
                "push constant 66",
                "call String.appendChar 2",
            ]
        );
        assert_eq!(out[7], "call Output.printString 1");
        assert_eq!(out[8], "pop temp 0");
    }

    #[test]
    fn while_uses_two_labels() {
        let out = vm(&main_body(
            "var int i; let i = 0; while (i < 10) { let i = i + 1; } return;",
        ));
        assert_eq!(
            out,
            vec![
                "function Main.main 1",
                "push constant 0",
                "pop local 0",
                "label Main.main$WHILE_EXP0",
                "push local 0",
                "push constant 10",
                "lt",
                "not",
                "if-goto Main.main$WHILE_END0",
                "push local 0",
                "push constant 1",
                "add",
                "pop local 0",
                "goto Main.main$WHILE_EXP0",
                "label Main.main$WHILE_END0",
                "push constant 0",
                "return",
            ]
        );
        let labels: Vec<_> = out.iter().filter(|l| l.starts_with("label ")).collect();
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn if_else() {
        let out = vm(&main_body(
            "var boolean x; var int y; let x = true; \
             if (x) { let y = 1; } else { let y = 2; } return;",
        ));
        assert_eq!(
            out,
            vec![
                "function Main.main 2",
                "push constant 0",
                "not",
                "pop local 0",
                "push local 0",
                "not",
                "if-goto Main.main$IF_FALSE0",
                "push constant 1",
                "pop local 1",
                "goto Main.main$IF_END0",
                "label Main.main$IF_FALSE0",
                "push constant 2",
                "pop local 1",
                "label Main.main$IF_END0",
                "push constant 0",
                "return",
            ]
        );
    }

    #[test]
    fn if_without_else() {
        let out = vm(&main_body("var int y; if (false) { let y = 1; } return;"));
        assert_eq!(
            &out[1..7],
            &[
                "push constant 0",
                "not",
                "if-goto Main.main$IF_FALSE0",
                "push constant 1",
                "pop local 0",
                "label Main.main$IF_FALSE0",
            ]
        );
    }

    #[test]
    fn labels_are_unique_across_subroutines() {
        let out = vm("class Main { \
                 function void a() { while (true) { } return; } \
                 function void b() { if (true) { } while (false) { } return; } }");
        let labels: Vec<_> = out.iter().filter(|l| l.starts_with("label ")).collect();
        assert_eq!(
            labels,
            vec![
                "label Main.a$WHILE_EXP0",
                "label Main.a$WHILE_END0",
                "label Main.b$IF_FALSE1",
                "label Main.b$WHILE_EXP2",
                "label Main.b$WHILE_END2",
            ]
        );
    }

    #[test]
    fn array_write() {
        let out = vm(&main_body("var Array a; var int i; let a[i] = 5; return;"));
        assert_eq!(
            &out[1..9],
            &[
                "push local 0",
                "push local 1",
                "add",
                "push constant 5",
                "pop temp 0",
                "pop pointer 1",
                "push temp 0",
                "pop that 0",
            ]
        );
    }

    #[test]
    fn array_read() {
        let out = vm(&main_body("var Array a; var int x; let x = a[2]; return;"));
        assert_eq!(
            &out[1..7],
            &[
                "push local 0",
                "push constant 2",
                "add",
                "pop pointer 1",
                "push that 0",
                "pop local 1",
            ]
        );
    }

    #[test]
    fn operators_apply_left_to_right() {
        let out = vm(&main_body("return 1 + 2 * 3 - -4 / (5 & ~6);"));
        assert_eq!(
            out,
            vec![
                "function Main.main 0",
                "push constant 1",
                "push constant 2",
                "add",
                "push constant 3",
                "call Math.multiply 2",
                "push constant 4",
                "neg",
                "sub",
                "push constant 5",
                "push constant 6",
                "not",
                "and",
                "call Math.divide 2",
                "return",
            ]
        );
    }

    #[test]
    fn comparison_and_keyword_constants() {
        let out = vm(&main_body("return (null = false) | (1 > 2);"));
        assert_eq!(
            &out[1..],
            &[
                "push constant 0",
                "push constant 0",
                "eq",
                "push constant 1",
                "push constant 2",
                "gt",
                "or",
                "return",
            ]
        );
    }

    #[test]
    fn constructors_methods_and_calls() {
        let out = vm("class Point { \
                 field int x, y; static int count; \
                 constructor Point new(int ax, int ay) { \
                     let x = ax; let y = ay; let count = count + 1; return this; } \
                 method int getX() { return x; } \
                 method int sum() { return getX() + y; } \
                 function Point make() { var Point p; \
                     let p = Point.new(1, 2); do p.getX(); return p; } }");
        assert_eq!(
            out,
            vec![
                "function Point.new 0",
                "push constant 2",
                "call Memory.alloc 1",
                "pop pointer 0",
                "push argument 0",
                "pop this 0",
                "push argument 1",
                "pop this 1",
                "push static 0",
                "push constant 1",
                "add",
                "pop static 0",
                "push pointer 0",
                "return",
                "function Point.getX 0",
                "push argument 0",
                "pop pointer 0",
                "push this 0",
                "return",
                "function Point.sum 0",
                "push argument 0",
                "pop pointer 0",
                "push pointer 0",
                "call Point.getX 1",
                "push this 1",
                "add",
                "return",
                "function Point.make 1",
                "push constant 1",
                "push constant 2",
                "call Point.new 2",
                "pop local 0",
                "push local 0",
                "call Point.getX 1",
                "pop temp 0",
                "push local 0",
                "return",
            ]
        );
    }

    #[test]
    fn method_parameters_follow_this() {
        let (out, symbols) =
            compile("class P { method void set(int a, int b) { var int c; return; } }").unwrap();
        assert_eq!(symbols.index_of("a"), Ok(1));
        assert_eq!(symbols.index_of("b"), Ok(2));
        assert_eq!(symbols.index_of("c"), Ok(0));
        assert!(out.starts_with("function P.set 1\n"));
    }

    #[test]
    fn local_shadows_field() {
        let out = vm("class A { field int x; method void m() { var int x; let x = 1; return; } }");
        assert_eq!(out[3], "push constant 1");
        assert_eq!(out[4], "pop local 0");
    }

    #[test]
    fn recompiling_is_deterministic() {
        let source = "class Main { function void main() { var int i; \
                      while (i < 3) { do Output.printInt(i); let i = i + 1; } return; } }";
        assert_eq!(compile(source).unwrap().0, compile(source).unwrap().0);
    }

    #[test]
    fn undefined_symbol() {
        match compile(&main_body("let z = 1;")) {
            Err(CompileError::UndefinedSymbol { line: 1, name }) => assert_eq!(name, "z"),
            other => panic!("unexpected {:?}", other.map(|r| r.0)),
        }
    }

    #[test]
    fn duplicate_symbol() {
        match compile(&main_body("var int a, a; return;")) {
            Err(CompileError::DuplicateSymbol { name, .. }) => assert_eq!(name, "a"),
            other => panic!("unexpected {:?}", other.map(|r| r.0)),
        }
    }

    #[test]
    fn duplicate_class_symbol() {
        match compile("class A {\n field int x;\n static int x;\n}") {
            Err(CompileError::DuplicateSymbol { line, name }) => {
                assert_eq!(line, 3);
                assert_eq!(name, "x");
            }
            other => panic!("unexpected {:?}", other.map(|r| r.0)),
        }
    }

    #[test]
    fn string_constant_counts_characters() {
        let source = "class Main { function void main() { do Output.printString(\"?\"); return; } }";
        let tokens = Lexer::new(source)
            .map(|t| t.unwrap())
            .map(|t| match t.tok_type {
                TokenType::StrConst => Token::new(TokenType::StrConst, "\u{e9}", t.line),
                _ => t,
            })
            .collect::<Vec<_>>();
        let mut engine = CompilationEngine::new(tokens.into_iter(), Vec::new());
        engine.compile_class().unwrap();
        let out = String::from_utf8(engine.into_writer()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(
            &lines[1..5],
            &[
                "push constant 1",
                "call String.new 1",
                "push constant 233",
                "call String.appendChar 2",
            ]
        );
        assert_eq!(lines[5], "call Output.printString 1");
    }

    #[test]
    fn unexpected_token() {
        match compile(&main_body("let = 1;")) {
            Err(CompileError::Syntax {
                expected, found, ..
            }) => {
                assert_eq!(expected, "variable name");
                assert_eq!(found, "=");
            }
            other => panic!("unexpected {:?}", other.map(|r| r.0)),
        }
    }

    #[test]
    fn tokens_after_class() {
        match compile("class A { } class") {
            Err(CompileError::Syntax {
                expected, found, ..
            }) => {
                assert_eq!(expected, "end of input");
                assert_eq!(found, "class");
            }
            other => panic!("unexpected {:?}", other.map(|r| r.0)),
        }
    }

    #[test]
    fn unexpected_end() {
        match compile("class A {") {
            Err(CompileError::UnexpectedEof { expected }) => assert_eq!(expected, "'}'"),
            other => panic!("unexpected {:?}", other.map(|r| r.0)),
        }
    }
}
