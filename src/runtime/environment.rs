//! Lexical environments for variable bindings
//!
//! An `Environment` is a cheap, `Clone`-able handle onto a shared, mutable
//! scope: `Rc<RefCell<Scope>>`. Two environments that share the same `Rc`
//! observe each other's `define`s immediately. This is what makes capturing
//! a lambda's defining environment and later `define`-ing the lambda's own
//! name into that same scope (for `letrec`/recursive `define`) work without
//! any closure-patching step — the lambda's captured `env` and the scope it
//! was defined in are the same cell.
//!
//! Earlier revisions of this module tied `Environment` to a borrowed parent
//! chain (`parent: Option<&'a Environment<'a>>`). That shape cannot survive
//! being held across an `.await` point inside a boxed, recursively-evaluated
//! `Future` (see [`crate::runtime::eval`]), since fiber suspension means the
//! evaluator's call stack is itself a value that outlives any particular
//! stack frame's borrows. An owned, reference-counted scope sidesteps the
//! problem entirely and is the standard shape for a tree-walking
//! interpreter with closures in safe Rust.

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::types::{Symbol, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct Scope {
    bindings: HashMap<Symbol, Value>,
    parent: Option<Environment>,
    /// The engine this environment's fibers are scheduled on, if any.
    /// Only set at the root scope a script runs in; inner scopes find it
    /// by walking the parent chain like any other lookup.
    engine: Option<Engine>,
}

/// A lexical scope: a map of bindings plus an optional parent to search next.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    /// Create a new top-level environment with no parent.
    pub fn new() -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            bindings: HashMap::new(),
            parent: None,
            engine: None,
        })))
    }

    /// Create a new child scope nested inside `parent`.
    pub fn new_scope(parent: &Environment) -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            bindings: HashMap::new(),
            parent: Some(parent.clone()),
            engine: None,
        })))
    }

    /// Bind the engine that this environment's fibers should be spawned
    /// on. Typically called once, on the top-level environment a script
    /// is evaluated in.
    pub fn bind_engine(&self, engine: Engine) {
        self.0.borrow_mut().engine = Some(engine);
    }

    /// The engine visible from this scope: this scope's own binding if set,
    /// otherwise the nearest enclosing scope's.
    pub fn engine(&self) -> Option<Engine> {
        let scope = self.0.borrow();
        if let Some(engine) = &scope.engine {
            return Some(engine.clone());
        }
        match &scope.parent {
            Some(parent) => parent.engine(),
            None => None,
        }
    }

    /// Returns true if `self` and `other` refer to the very same scope.
    pub fn is_same_scope(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Bind `identifier` to `value` in this scope, shadowing any binding of
    /// the same name in an enclosing scope.
    pub fn define(&self, identifier: Symbol, value: Value) {
        self.0.borrow_mut().bindings.insert(identifier, value);
    }

    /// Convenience form of [`Environment::define`] taking a `&str` name.
    pub fn define_str(&self, identifier: &str, value: Value) {
        self.define(Symbol::new(identifier), value);
    }

    /// Look up `identifier`, searching this scope then enclosing scopes,
    /// falling back to built-in procedures if nothing user-defined shadows
    /// the name.
    pub fn lookup(&self, identifier: &Symbol) -> Result<Value> {
        if let Some(value) = self.lookup_local_chain(identifier) {
            return Ok(value);
        }
        if let Some(builtin) = crate::runtime::builtins::Builtin::from_name(identifier.as_str()) {
            return Ok(Value::procedure(crate::types::Procedure::Builtin(builtin)));
        }
        Err(self.unbound_identifier_error(identifier))
    }

    /// Convenience form of [`Environment::lookup`] taking a `&str` name.
    pub fn lookup_str(&self, identifier: &str) -> Result<Value> {
        self.lookup(&Symbol::new(identifier))
    }

    /// True if `identifier` is bound in this scope or an enclosing one
    /// (built-ins are not considered "contained").
    pub fn contains(&self, identifier: &Symbol) -> bool {
        self.lookup_local_chain(identifier).is_some()
    }

    pub fn contains_str(&self, identifier: &str) -> bool {
        self.contains(&Symbol::new(identifier))
    }

    /// Number of bindings directly in this scope (not counting parents).
    pub fn len(&self) -> usize {
        self.0.borrow().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().bindings.is_empty()
    }

    /// Names bound directly in this scope (not counting parents).
    pub fn keys(&self) -> Vec<Symbol> {
        self.0.borrow().bindings.keys().cloned().collect()
    }

    /// The enclosing scope, if any.
    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    fn lookup_local_chain(&self, identifier: &Symbol) -> Option<Value> {
        let scope = self.0.borrow();
        if let Some(value) = scope.bindings.get(identifier) {
            return Some(value.clone());
        }
        match &scope.parent {
            Some(parent) => parent.lookup_local_chain(identifier),
            None => None,
        }
    }

    fn unbound_identifier_error(&self, identifier: &Symbol) -> Error {
        let suggestion = self.find_similar_identifier(identifier.as_str());
        Error::unbound_identifier(identifier.as_str(), suggestion.as_deref())
    }

    /// Look for a binding (in this scope or an ancestor) whose name is a
    /// single-character edit away from `identifier`, to produce a
    /// "did you mean" hint on unbound-identifier errors.
    fn find_similar_identifier(&self, identifier: &str) -> Option<std::string::String> {
        let mut candidates = Vec::new();
        let mut scope = Some(self.clone());
        while let Some(env) = scope {
            for key in env.keys() {
                candidates.push(key.as_str().to_string());
            }
            scope = env.parent();
        }
        candidates
            .into_iter()
            .find(|candidate| is_similar_identifier(candidate, identifier))
            .map(|candidate| format!("did you mean '{candidate}'?"))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.keys())
            .field("has_parent", &self.parent().is_some())
            .finish()
    }
}

/// True if `a` and `b` are equal after a single character insertion,
/// deletion, or substitution (a cheap Levenshtein-distance-1 check).
fn is_similar_identifier(a: &str, b: &str) -> bool {
    if a == b {
        return false;
    }
    edit_distance_one(a, b)
}

fn edit_distance_one(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > 1 {
        return false;
    }
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    if shorter.len() == longer.len() {
        // substitution: differ in exactly one position
        shorter.iter().zip(longer.iter()).filter(|(x, y)| x != y).count() == 1
    } else {
        // insertion/deletion: longer has exactly one extra char
        let mut i = 0;
        let mut j = 0;
        let mut mismatches = 0;
        while i < shorter.len() && j < longer.len() {
            if shorter[i] == longer[j] {
                i += 1;
                j += 1;
            } else {
                mismatches += 1;
                if mismatches > 1 {
                    return false;
                }
                j += 1;
            }
        }
        true
    }
}
