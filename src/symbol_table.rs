use fnv::FnvBuildHasher;
use indexmap::IndexMap;

use crate::vm_writer::Segment;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Kind {
    Static,
    Field,
    Arg,
    Var,
}

impl Kind {
    pub fn segment(self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Arg => Segment::Argument,
            Kind::Var => Segment::Local,
        }
    }

    fn is_class_scope(self) -> bool {
        match self {
            Kind::Static | Kind::Field => true,
            Kind::Arg | Kind::Var => false,
        }
    }

    fn slot(self) -> usize {
        match self {
            Kind::Static => 0,
            Kind::Field => 1,
            Kind::Arg => 2,
            Kind::Var => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub type_name: String,
    pub kind: Kind,
    pub index: usize,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SymbolError {
    #[error("undefined symbol '{0}'")]
    Undefined(String),
    #[error("symbol '{0}' already defined in this scope")]
    Duplicate(String),
}

type Scope = IndexMap<String, Symbol, FnvBuildHasher>;

/// Two nested scopes: the class scope holds statics and fields for the whole
/// class, the subroutine scope holds arguments and locals and is cleared by
/// `start_subroutine`. Lookups try the subroutine scope first.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: Scope,
    subroutine_scope: Scope,
    counts: [usize; 4],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_subroutine(&mut self) -> () {
        self.subroutine_scope.clear();
        self.counts[Kind::Arg.slot()] = 0;
        self.counts[Kind::Var.slot()] = 0;
    }

    /// Returns the running index assigned to the new symbol.
    pub fn define(&mut self, name: &str, type_name: &str, kind: Kind) -> Result<usize, SymbolError> {
        let index = self.counts[kind.slot()];
        let scope = if kind.is_class_scope() {
            &mut self.class_scope
        } else {
            &mut self.subroutine_scope
        };
        if scope.contains_key(name) {
            return Err(SymbolError::Duplicate(name.to_string()));
        }
        scope.insert(
            name.to_string(),
            Symbol {
                type_name: type_name.to_string(),
                kind,
                index,
            },
        );
        self.counts[kind.slot()] += 1;
        Ok(index)
    }

    pub fn var_count(&self, kind: Kind) -> usize {
        self.counts[kind.slot()]
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lookup(name).map(|s| s.kind)
    }

    pub fn type_of(&self, name: &str) -> Result<&str, SymbolError> {
        self.resolve(name).map(|s| s.type_name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Result<usize, SymbolError> {
        self.resolve(name).map(|s| s.index)
    }

    fn resolve(&self, name: &str) -> Result<&Symbol, SymbolError> {
        self.lookup(name)
            .ok_or_else(|| SymbolError::Undefined(name.to_string()))
    }
}
