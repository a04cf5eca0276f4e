use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    pub fn name(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Add => "add",
            Command::Sub => "sub",
            Command::Neg => "neg",
            Command::Eq => "eq",
            Command::Gt => "gt",
            Command::Lt => "lt",
            Command::And => "and",
            Command::Or => "or",
            Command::Not => "not",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction<'a> {
    Push(Segment, usize),
    Pop(Segment, usize),
    Arithmetic(Command),
    Label(&'a str),
    Goto(&'a str),
    IfGoto(&'a str),
    Call(&'a str, usize),
    Function(&'a str, usize),
    Return,
}

impl<'a> fmt::Display for Instruction<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::Push(segment, index) => write!(f, "push {} {}", segment.name(), index),
            Instruction::Pop(segment, index) => write!(f, "pop {} {}", segment.name(), index),
            Instruction::Arithmetic(command) => write!(f, "{}", command.name()),
            Instruction::Label(label) => write!(f, "label {}", label),
            Instruction::Goto(label) => write!(f, "goto {}", label),
            Instruction::IfGoto(label) => write!(f, "if-goto {}", label),
            Instruction::Call(name, n_args) => write!(f, "call {} {}", name, n_args),
            Instruction::Function(name, n_locals) => write!(f, "function {} {}", name, n_locals),
            Instruction::Return => write!(f, "return"),
        }
    }
}

/// Writes one VM instruction per call to the underlying sink. Nothing is
/// buffered here and segment/index bounds are left to the caller.
pub struct VmWriter<W: Write> {
    out: W,
}

impl<W: Write> VmWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_push(&mut self, segment: Segment, index: usize) -> io::Result<()> {
        self.emit(Instruction::Push(segment, index))
    }

    pub fn write_pop(&mut self, segment: Segment, index: usize) -> io::Result<()> {
        self.emit(Instruction::Pop(segment, index))
    }

    pub fn write_arithmetic(&mut self, command: Command) -> io::Result<()> {
        self.emit(Instruction::Arithmetic(command))
    }

    pub fn write_label(&mut self, label: &str) -> io::Result<()> {
        self.emit(Instruction::Label(label))
    }

    pub fn write_goto(&mut self, label: &str) -> io::Result<()> {
        self.emit(Instruction::Goto(label))
    }

    /// Pops the top of the stack and jumps when it is non-zero.
    pub fn write_if(&mut self, label: &str) -> io::Result<()> {
        self.emit(Instruction::IfGoto(label))
    }

    pub fn write_call(&mut self, name: &str, n_args: usize) -> io::Result<()> {
        self.emit(Instruction::Call(name, n_args))
    }

    pub fn write_function(&mut self, name: &str, n_locals: usize) -> io::Result<()> {
        self.emit(Instruction::Function(name, n_locals))
    }

    pub fn write_return(&mut self) -> io::Result<()> {
        self.emit(Instruction::Return)
    }

    fn emit(&mut self, instruction: Instruction) -> io::Result<()> {
        #[cfg(feature = "debug-logging")]
        eprintln!("    {}", instruction);

        writeln!(self.out, "{}", instruction)
    }
}
