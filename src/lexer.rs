use crate::common::CompileError;

pub const MAX_INT: u16 = 32767;

pub struct Lexer<'a> {
    source: &'a str,
    start: usize,
    current: usize,
    line: u32,
    failed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub tok_type: TokenType,
    /// Literal text; string constants exclude their quotes.
    pub source: &'a str,
    pub line: u32,
}

impl<'a> Token<'a> {
    pub fn new(tok_type: TokenType, source: &'a str, line: u32) -> Self {
        Self { tok_type, source, line }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.tok_type == TokenType::Keyword && self.source == keyword
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.tok_type == TokenType::Symbol && self.source == symbol
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenType {
    Keyword,
    Symbol,
    Identifier,
    IntConst,
    StrConst,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
            failed: false,
        }
    }

    fn scan(&mut self) -> Option<Result<Token<'a>, CompileError>> {
        if let Err(e) = self.skip_whitespace() {
            return Some(Err(e));
        }
        self.start = self.current;
        if self.is_at_end() {
            return None;
        }
        let token = match self.advance() {
            '{' | '}' | '(' | ')' | '[' | ']' | '.' | ',' | ';' | '+' | '-' | '*' | '/' | '&'
            | '|' | '<' | '>' | '=' | '~' => Ok(self.make_token(TokenType::Symbol)),
            '"' => self.string(),
            c => {
                if c.is_ascii_digit() {
                    self.number()
                } else if c.is_ascii_alphabetic() || c == '_' {
                    Ok(self.identifier())
                } else {
                    Err(self.error("Unexpected character."))
                }
            }
        };
        Some(token)
    }

    fn skip_whitespace(&mut self) -> Result<(), CompileError> {
        loop {
            match self.peek() {
                ' ' | '\r' | '\t' => self.current += 1,
                '\n' => {
                    self.current += 1;
                    self.line += 1;
                }
                '/' => match self.peek_2() {
                    '/' => {
                        // comment until the end of the line
                        while self.peek() != '\n' && !self.is_at_end() {
                            self.current += 1;
                        }
                    }
                    '*' => self.block_comment()?,
                    _ => break,
                },
                _ => break,
            }
        }
        Ok(())
    }

    fn block_comment(&mut self) -> Result<(), CompileError> {
        let line = self.line;
        self.current += 2;
        loop {
            if self.is_at_end() {
                return Err(CompileError::Lex {
                    line,
                    message: "Unterminated comment.",
                });
            }
            match self.advance() {
                '*' if self.peek() == '/' => {
                    self.current += 1;
                    return Ok(());
                }
                '\n' => self.line += 1,
                _ => (),
            }
        }
    }

    fn peek(&self) -> char {
        self.source
            .as_bytes()
            .get(self.current)
            .map(|b| char::from(*b))
            .unwrap_or('\0')
    }

    fn peek_2(&self) -> char {
        self.source
            .as_bytes()
            .get(self.current + 1)
            .map(|b| char::from(*b))
            .unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        self.current += 1;
        char::from(self.source.as_bytes()[self.current - 1])
    }

    fn make_token(&self, tok_type: TokenType) -> Token<'a> {
        Token::new(tok_type, &self.source[self.start..self.current], self.line)
    }

    fn error(&self, message: &'static str) -> CompileError {
        CompileError::Lex {
            line: self.line,
            message,
        }
    }

    fn string(&mut self) -> Result<Token<'a>, CompileError> {
        while self.peek() != '"' && self.peek() != '\n' && !self.is_at_end() {
            if !self.peek().is_ascii() {
                return Err(self.error("Non-ASCII character in string."));
            }
            self.current += 1;
        }

        if self.peek() != '"' {
            Err(self.error("Unterminated string."))
        } else {
            self.current += 1; // consume closing quote
            Ok(Token::new(
                TokenType::StrConst,
                &self.source[self.start + 1..self.current - 1],
                self.line,
            ))
        }
    }

    fn number(&mut self) -> Result<Token<'a>, CompileError> {
        while self.peek().is_ascii_digit() {
            self.current += 1;
        }
        let token = self.make_token(TokenType::IntConst);
        match token.source.parse::<u16>() {
            Ok(n) if n <= MAX_INT => Ok(token),
            _ => Err(self.error("Integer constant out of range.")),
        }
    }

    fn identifier(&mut self) -> Token<'a> {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.current += 1;
        }
        let text = &self.source[self.start..self.current];
        self.make_token(identifier_type(text))
    }
}

fn identifier_type(text: &str) -> TokenType {
    match text {
        "class" | "constructor" | "function" | "method" | "field" | "static" | "var" | "int"
        | "char" | "boolean" | "void" | "true" | "false" | "null" | "this" | "let" | "do"
        | "if" | "else" | "while" | "return" => TokenType::Keyword,
        _ => TokenType::Identifier,
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, CompileError>;

    /// Stops after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.scan();
        if let Some(Err(_)) = item {
            self.failed = true;
        }
        item
    }
}
