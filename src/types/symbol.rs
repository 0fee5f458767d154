//! Symbol type implementation for Scheme
//!
//! This module implements the Symbol type that represents identifiers and
//! symbol values in Scheme. Symbols are like strings but represent identifiers.

use smol_str::SmolStr;

/// Symbol type for Scheme identifiers
///
/// Wraps SmolStr to enable efficient storage and sharing of symbol names.
/// Most symbols (≤23 bytes) are stack-allocated with O(1) clone operations.
/// Symbols are used for identifiers, variable names, and symbolic data in Scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(SmolStr);

impl Symbol {
    /// Create a new Symbol from a string slice
    pub fn new(s: &str) -> Self {
        Symbol(SmolStr::new(s))
    }

    /// Create a new Symbol from an owned String
    pub fn from_string(s: std::string::String) -> Self {
        Symbol(SmolStr::from(s))
    }

    /// Get a string slice view of the symbol name
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the length of the symbol name in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the symbol name is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if this symbol is heap-allocated
    /// Returns true for symbols longer than 23 bytes
    pub fn is_heap_allocated(&self) -> bool {
        self.0.is_heap_allocated()
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl From<std::string::String> for Symbol {
    fn from(s: std::string::String) -> Self {
        Symbol::from_string(s)
    }
}

impl From<SmolStr> for Symbol {
    fn from(s: SmolStr) -> Self {
        Symbol(s)
    }
}

impl From<Symbol> for SmolStr {
    fn from(s: Symbol) -> Self {
        s.0
    }
}
