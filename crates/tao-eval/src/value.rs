//! Runtime values.
//!
//! Nil, Boolean, Number and String have value semantics. Object and Array
//! are shared mutable containers: cloning a `Value` that holds one aliases
//! the same container.

use crate::callable::{Builtin, Closure};
use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A tagged runtime value. Its kind never changes after construction.
#[derive(Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Number(i64),
    String(String),
    Object(Object),
    Array(Array),
    Function(Rc<Closure>),
    Builtin(Builtin),
    /// A deferred reference to a named binding.
    Variable(String),
}

impl Value {
    /// Create a String value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create a reference to the binding called `name`.
    pub fn variable(name: impl Into<String>) -> Self {
        Value::Variable(name.into())
    }

    /// Create a fresh Object holding `entries`.
    pub fn object(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Object(Object::from_entries(entries))
    }

    /// Create a fresh Array holding `items`.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Array::from_vec(items))
    }

    /// Boolean coercion used by conditionals, `!`, `&&` and `||`.
    pub fn truth(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0,
            Value::String(s) => !s.is_empty(),
            Value::Object(_)
            | Value::Array(_)
            | Value::Function(_)
            | Value::Builtin(_)
            | Value::Variable(_) => true,
        }
    }

    /// Kind name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
            Value::Variable(_) => "variable",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_))
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Resolve a `Variable` against `ctx`. Every other kind resolves to
    /// itself.
    pub fn resolve(&self, ctx: &Context) -> EvalResult<Value> {
        match self {
            Value::Variable(name) => ctx.lookup(name).ok_or_else(|| EvalError::undefined(name)),
            other => Ok(other.clone()),
        }
    }

    /// Convert to JSON for host output. Non-data kinds become their textual
    /// form. Containers nested deeper than [`MAX_RENDER_DEPTH`] become the
    /// string `...`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut seen = Vec::new();
        self.to_json_inner(&mut seen)
    }

    fn to_json_inner(&self, seen: &mut Vec<*const ()>) -> serde_json::Value {
        if matches!(self, Value::Object(_) | Value::Array(_)) && seen.len() >= MAX_RENDER_DEPTH {
            return serde_json::Value::String(ELIDED.into());
        }
        use serde_json::Value as Json;
        match self {
            Value::Nil => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Number(n) => Json::from(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Object(obj) => {
                let id = obj.id();
                if seen.contains(&id) {
                    return Json::String(CYCLE.into());
                }
                seen.push(id);
                let map = obj
                    .entries()
                    .into_iter()
                    .map(|(k, v)| (k, v.to_json_inner(seen)))
                    .collect();
                seen.pop();
                Json::Object(map)
            }
            Value::Array(arr) => {
                let id = arr.id();
                if seen.contains(&id) {
                    return Json::String(CYCLE.into());
                }
                seen.push(id);
                let items = arr.to_vec().iter().map(|v| v.to_json_inner(seen)).collect();
                seen.pop();
                Json::Array(items)
            }
            Value::Function(_) | Value::Builtin(_) | Value::Variable(_) => {
                Json::String(self.to_string())
            }
        }
    }

    /// `seen` holds the containers currently being printed; its length is
    /// the nesting depth.
    fn write_display(&self, f: &mut fmt::Formatter<'_>, seen: &mut Vec<*const ()>) -> fmt::Result {
        let nested = !seen.is_empty();
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) if nested => write!(f, "{s:?}"),
            Value::String(s) => f.write_str(s),
            Value::Object(_) | Value::Array(_) if seen.len() >= MAX_RENDER_DEPTH => {
                f.write_str(ELIDED)
            }
            Value::Object(obj) => {
                let id = obj.id();
                if seen.contains(&id) {
                    return f.write_str(CYCLE);
                }
                seen.push(id);
                f.write_str("{")?;
                for (i, (k, v)) in obj.entries().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: ")?;
                    v.write_display(f, seen)?;
                }
                seen.pop();
                f.write_str("}")
            }
            Value::Array(arr) => {
                let id = arr.id();
                if seen.contains(&id) {
                    return f.write_str(CYCLE);
                }
                seen.push(id);
                f.write_str("[")?;
                for (i, v) in arr.to_vec().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    v.write_display(f, seen)?;
                }
                seen.pop();
                f.write_str("]")
            }
            Value::Function(closure) => write!(f, "{closure}"),
            Value::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name()),
            Value::Variable(name) => write!(f, "<variable {name}>"),
        }
    }
}

/// Containers nested deeper than this print as `...`.
pub const MAX_RENDER_DEPTH: usize = 128;

const CYCLE: &str = "<cycle>";
const ELIDED: &str = "...";

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_display(f, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Nil => f.write_str("Nil"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            other => write!(f, "{}({other})", other.type_name()),
        }
    }
}

/// Identity equality: scalars by value, containers and callables by
/// reference. Distinct kinds are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.ptr_eq(b),
            (Value::Variable(a), Value::Variable(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Containers
// ══════════════════════════════════════════════════════════════════════════════

/// Shared, mutable string-keyed map.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<BTreeMap<String, Value>>>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Object(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    /// Value under `key`, nil when absent.
    pub fn get(&self, key: &str) -> Value {
        self.0.borrow().get(key).cloned().unwrap_or(Value::Nil)
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.0.borrow_mut().insert(key.into(), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of the entries in key order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn id(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

/// Shared, mutable, index-addressable sequence.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Array(Rc::new(RefCell::new(items)))
    }

    /// Element at `index`.
    pub fn get(&self, index: i64) -> EvalResult<Value> {
        let items = self.0.borrow();
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i).cloned())
            .ok_or_else(|| EvalError::out_of_range(index, items.len()))
    }

    /// Replace the element at `index`, which must already exist.
    pub fn set(&self, index: i64, value: Value) -> EvalResult<()> {
        let mut items = self.0.borrow_mut();
        let len = items.len();
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| items.get_mut(i))
            .ok_or_else(|| EvalError::out_of_range(index, len))?;
        *slot = value;
        Ok(())
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn id(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

// ── Release ──────────────────────────────────────────────────────────────────
//
// Dropping the last handle to a container moves its children onto a work
// list. Nested containers are released iteratively, never recursively.

impl Object {
    /// Move the entries out if this is the last handle.
    fn detach_children(&self, pending: &mut Vec<Value>) {
        if Rc::strong_count(&self.0) != 1 {
            return;
        }
        if let Ok(mut map) = self.0.try_borrow_mut() {
            pending.extend(std::mem::take(&mut *map).into_values());
        }
    }
}

impl Array {
    /// Move the elements out if this is the last handle.
    fn detach_children(&self, pending: &mut Vec<Value>) {
        if Rc::strong_count(&self.0) != 1 {
            return;
        }
        if let Ok(mut items) = self.0.try_borrow_mut() {
            pending.append(&mut items);
        }
    }
}

fn release(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match &value {
            Value::Object(obj) => obj.detach_children(&mut pending),
            Value::Array(arr) => arr.detach_children(&mut pending),
            _ => {}
        }
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        release(pending);
    }
}

impl Drop for Array {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        release(pending);
    }
}
