//! Lexical scopes.
//!
//! A [`Context`] is a cheap, reference-counted handle. Cloning it shares the
//! scope, which is how function values capture their defining environment.

use crate::callable::Closure;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

struct Scope {
    symbols: RefCell<BTreeMap<String, Value>>,
    parent: RefCell<Option<Context>>,
}

/// A symbol table plus an optional parent link.
///
/// Lookups walk the local table, then the parent chain.
/// `define` always writes the local table.
/// `assign` replaces the binding in the nearest scope that has it.
#[derive(Clone)]
pub struct Context(Rc<Scope>);

impl Context {
    /// Create a parentless scope (the global scope, or a fresh call scope).
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Context>) -> Self {
        Context(Rc::new(Scope {
            symbols: RefCell::new(BTreeMap::new()),
            parent: RefCell::new(parent),
        }))
    }

    /// Create a nested scope whose parent is `self`.
    pub fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()))
    }

    pub fn parent(&self) -> Option<Context> {
        self.0.parent.borrow().clone()
    }

    /// Re-link this scope under `parent`. Used to attach a fresh call scope
    /// to a closure's captured environment.
    pub fn set_parent(&self, parent: &Context) {
        *self.0.parent.borrow_mut() = Some(parent.clone());
    }

    /// Bind `name` in this scope, replacing any local binding.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.symbols.borrow_mut().insert(name.into(), value);
    }

    /// Look up a binding, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self.clone());
        while let Some(ctx) = scope {
            let found = ctx.0.symbols.borrow().get(name).cloned();
            if found.is_some() {
                return found;
            }
            scope = ctx.parent();
        }
        None
    }

    /// Replace an existing binding in the nearest scope that defines it.
    /// Returns `false` if the name is bound nowhere in the chain.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut scope = Some(self.clone());
        while let Some(ctx) = scope {
            {
                let mut symbols = ctx.0.symbols.borrow_mut();
                if let Some(slot) = symbols.get_mut(name) {
                    *slot = value;
                    return true;
                }
            }
            scope = ctx.parent();
        }
        false
    }

    /// Whether `name` is bound in this scope itself.
    pub fn has_local(&self, name: &str) -> bool {
        self.0.symbols.borrow().contains_key(name)
    }

    /// Names bound locally, in key order.
    pub fn local_names(&self) -> Vec<String> {
        self.0.symbols.borrow().keys().cloned().collect()
    }

    pub fn ptr_eq(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Clear this scope's bindings when nothing outside it can reach it.
    ///
    /// A function bound in the scope it captures holds that scope alive.
    /// When every handle other than `self` belongs to such a function, and
    /// each of those functions is referenced only from this scope's table,
    /// the bindings are dropped so the cycle is released.
    pub(crate) fn reclaim(&self) {
        let handles = Rc::strong_count(&self.0);
        if handles == 1 {
            return;
        }
        let internal = {
            let Ok(symbols) = self.0.symbols.try_borrow() else {
                return;
            };
            let mut bound: Vec<(&Rc<Closure>, usize)> = Vec::new();
            for value in symbols.values() {
                let Value::Function(closure) = value else {
                    continue;
                };
                if !closure.env().ptr_eq(self) {
                    continue;
                }
                match bound.iter_mut().find(|(seen, _)| Rc::ptr_eq(seen, closure)) {
                    Some((_, uses)) => *uses += 1,
                    None => bound.push((closure, 1)),
                }
            }
            bound
                .iter()
                .filter(|(closure, uses)| Rc::strong_count(closure) == *uses)
                .count()
        };
        if handles == internal + 1 {
            let released = std::mem::take(&mut *self.0.symbols.borrow_mut());
            drop(released);
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("symbols", &self.local_names())
            .field("has_parent", &self.0.parent.borrow().is_some())
            .finish()
    }
}
