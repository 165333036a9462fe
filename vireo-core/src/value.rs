// vireo-core/src/value.rs
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::ValueError;
use crate::observe::{self, Notifier};

thread_local! {
    // Handles of the lists currently inside `List::join`.
    static JOINING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Signature of a native function stored on a controller: `(this, args)`.
pub type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, ValueError>;

/// Dynamic value flowing through controllers, templates and the evaluator.
///
/// Primitives compare by value; `Object`, `List`, `Map`, `Set` and `Function`
/// are shared handles and compare by identity.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Object(Object),
    List(List),
    Map(Map),
    Set(Set),
    Function(Function),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => {
                let t = s.trim();
                if t.is_empty() {
                    0.0
                } else {
                    t.parse().unwrap_or(f64::NAN)
                }
            }
            _ => f64::NAN,
        }
    }

    /// String form used by interpolation: `undefined` and `null` become empty.
    pub fn to_template_string(&self) -> String {
        match self {
            Value::Undefined | Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Strict equality (`===`): NaN is never equal to itself.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Set(a), Value::Set(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }

    /// SameValueZero, the equality used for set membership.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&Set> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Identity of the shared allocation behind a reference kind.
    pub(crate) fn handle_id(&self) -> Option<usize> {
        match self {
            Value::Object(o) => Some(o.id()),
            Value::List(l) => Some(l.id()),
            Value::Map(m) => Some(m.id()),
            Value::Set(s) => Some(s.id()),
            _ => None,
        }
    }

    /// Ordering used by the default list sort: numbers numerically when both
    /// sides are numbers, otherwise by string form. `undefined` sorts last.
    pub(crate) fn sort_cmp(a: &Value, b: &Value) -> Ordering {
        match (a, b) {
            (Value::Undefined, Value::Undefined) => Ordering::Equal,
            (Value::Undefined, _) => Ordering::Greater,
            (_, Value::Undefined) => Ordering::Less,
            (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
            _ => a.to_string().cmp(&b.to_string()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        // -0 prints as 0
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        exponent_form(n)
    } else {
        format!("{n}")
    }
}

// `1e21` prints as `1e+21`, `1.5e-7` as `1.5e-7`.
fn exponent_form(n: f64) -> String {
    let raw = format!("{n:e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => raw,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::Object(_) => f.write_str("[object Object]"),
            Value::List(l) => f.write_str(&l.join(",")),
            Value::Map(_) => f.write_str("[object Map]"),
            Value::Set(_) => f.write_str("[object Set]"),
            Value::Function(_) => f.write_str("function"),
        }
    }
}

// Shallow on purpose: state graphs may be cyclic.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Object(o) => write!(f, "Object{{{}}}", o.keys().join(", ")),
            Value::List(l) => write!(f, "List(len={})", l.len()),
            Value::Map(m) => write!(f, "Map(size={})", m.len()),
            Value::Set(s) => write!(f, "Set(size={})", s.len()),
            Value::Function(_) => f.write_str("Function"),
        }
    }
}

macro_rules! debug_via_value {
    ($($ty:ident),*) => {
        $(impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(&Value::from(self.clone()), f)
            }
        })*
    };
}

debug_via_value!(Object, List, Map, Set, Function);

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}
impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}
impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}
impl From<List> for Value {
    fn from(l: List) -> Self {
        Value::List(l)
    }
}
impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}
impl From<Set> for Value {
    fn from(s: Set) -> Self {
        Value::Set(s)
    }
}
impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}
impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(List::from(items))
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Undefined)
    }
}

/// A native callable. Never shadowed by observation.
#[derive(Clone)]
pub struct Function(Rc<NativeFn>);

impl Function {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ValueError> + 'static,
    {
        Function(Rc::new(f))
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, ValueError> {
        (self.0)(this, args)
    }
}

#[derive(Clone)]
pub(crate) enum Slot {
    Plain(Value),
    Shadowed(Value),
}

impl Slot {
    fn value(&self) -> &Value {
        match self {
            Slot::Plain(v) | Slot::Shadowed(v) => v,
        }
    }
}

struct ObjectInner {
    slots: RefCell<IndexMap<String, Slot>>,
    notifier: RefCell<Option<Notifier>>,
}

/// Plain data object. Once observed, eligible properties live in shadowed
/// slots and writes to them notify synchronously.
#[derive(Clone)]
pub struct Object(Rc<ObjectInner>);

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl Object {
    pub fn new() -> Self {
        Object(Rc::new(ObjectInner {
            slots: RefCell::new(IndexMap::new()),
            notifier: RefCell::new(None),
        }))
    }

    /// Builder-style insert for constructing state.
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Attach a native method. Function slots never notify.
    pub fn method<F>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ValueError> + 'static,
    {
        self.set(key, Function::new(f));
        self
    }

    pub fn get(&self, key: &str) -> Value {
        self.0
            .slots
            .borrow()
            .get(key)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.slots.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.slots.borrow().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.0.slots.borrow().values().map(|s| s.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_shadowed(&self, key: &str) -> bool {
        matches!(self.0.slots.borrow().get(key), Some(Slot::Shadowed(_)))
    }

    pub fn is_observed(&self) -> bool {
        self.0.notifier.borrow().is_some()
    }

    /// Store `value` under `key`. When the slot is shadowed the new value is
    /// observed with this object's notifier and the notifier fires before
    /// returning.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let shadowed = {
            let mut slots = self.0.slots.borrow_mut();
            match slots.get_mut(&key) {
                Some(Slot::Shadowed(current)) => {
                    *current = value.clone();
                    true
                }
                Some(slot) => {
                    *slot = Slot::Plain(value.clone());
                    false
                }
                None => {
                    slots.insert(key, Slot::Plain(value.clone()));
                    false
                }
            }
        };
        if shadowed {
            if let Some(notifier) = self.notifier() {
                observe::observe_with(&value, &notifier);
                notifier.notify();
            }
        }
    }

    /// Store without notifying. A shadowed slot stays shadowed.
    pub fn set_quiet(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let notifier = {
            let mut slots = self.0.slots.borrow_mut();
            match slots.get_mut(&key) {
                Some(Slot::Shadowed(current)) => {
                    *current = value.clone();
                    self.notifier()
                }
                Some(slot) => {
                    *slot = Slot::Plain(value.clone());
                    None
                }
                None => {
                    slots.insert(key, Slot::Plain(value.clone()));
                    None
                }
            }
        };
        if let Some(notifier) = notifier {
            observe::observe_with(&value, &notifier);
        }
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn notifier(&self) -> Option<Notifier> {
        self.0.notifier.borrow().clone()
    }

    /// Installs `notifier` unless one is already present.
    pub(crate) fn attach(&self, notifier: &Notifier) {
        let mut slot = self.0.notifier.borrow_mut();
        if slot.is_none() {
            *slot = Some(notifier.clone());
        }
    }

    /// Converts every plain, non-function slot into a shadowed one and returns
    /// all property values so the caller can keep walking.
    pub(crate) fn shadow_eligible(&self) -> Vec<Value> {
        let mut slots = self.0.slots.borrow_mut();
        let mut out = Vec::with_capacity(slots.len());
        for slot in slots.values_mut() {
            if let Slot::Plain(v) = slot {
                if !matches!(v, Value::Function(_)) {
                    *slot = Slot::Shadowed(v.clone());
                }
            }
            out.push(slot.value().clone());
        }
        out
    }
}

struct ContainerInner<T> {
    items: RefCell<T>,
    notifier: RefCell<Option<Notifier>>,
}

impl<T> ContainerInner<T> {
    fn new(items: T) -> Rc<Self> {
        Rc::new(ContainerInner {
            items: RefCell::new(items),
            notifier: RefCell::new(None),
        })
    }

    fn attach(&self, notifier: &Notifier) {
        let mut slot = self.notifier.borrow_mut();
        if slot.is_none() {
            *slot = Some(notifier.clone());
        }
    }
}

macro_rules! container_common {
    ($ty:ident) => {
        impl $ty {
            pub fn ptr_eq(&self, other: &$ty) -> bool {
                Rc::ptr_eq(&self.0, &other.0)
            }

            pub fn is_observed(&self) -> bool {
                self.0.notifier.borrow().is_some()
            }

            pub(crate) fn id(&self) -> usize {
                Rc::as_ptr(&self.0) as *const () as usize
            }

            pub(crate) fn attach(&self, notifier: &Notifier) {
                self.0.attach(notifier);
            }

            /// Notify, then re-observe contents so newly inserted values are
            /// tracked too.
            fn mutated(&self) {
                let notifier = self.0.notifier.borrow().clone();
                if let Some(notifier) = notifier {
                    notifier.notify();
                    observe::observe_with(&Value::from(self.clone()), &notifier);
                }
            }
        }
    };
}

/// Ordered sequence container.
#[derive(Clone)]
pub struct List(Rc<ContainerInner<Vec<Value>>>);

container_common!(List);

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Value>> for List {
    fn from(items: Vec<Value>) -> Self {
        List(ContainerInner::new(items))
    }
}

fn clamp_index(raw: f64, len: usize) -> usize {
    if raw.is_nan() {
        return 0;
    }
    let len_f = len as f64;
    let idx = if raw < 0.0 { (len_f + raw.trunc()).max(0.0) } else { raw.trunc().min(len_f) };
    idx as usize
}

impl List {
    pub fn new() -> Self {
        List::from(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Value {
        self.0.items.borrow().get(index).cloned().unwrap_or_default()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    /// String form of the items. A list already being joined further up the
    /// stack contributes `""`, so cyclic lists terminate.
    pub fn join(&self, sep: &str) -> String {
        let id = self.id();
        let entered = JOINING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&id) {
                false
            } else {
                stack.push(id);
                true
            }
        });
        if !entered {
            return String::new();
        }
        let out = self
            .to_vec()
            .iter()
            .map(Value::to_template_string)
            .collect::<Vec<_>>()
            .join(sep);
        JOINING.with(|stack| stack.borrow_mut().retain(|other| *other != id));
        out
    }

    pub fn index_of(&self, needle: &Value) -> Option<usize> {
        self.0.items.borrow().iter().position(|v| v.strict_equals(needle))
    }

    pub fn includes(&self, needle: &Value) -> bool {
        self.0.items.borrow().iter().any(|v| v.same_value_zero(needle))
    }

    /// Index write. `index == len` appends; anything further out is refused
    /// instead of growing the list with holes. Notifies when observed.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<(), ValueError> {
        {
            let mut items = self.0.items.borrow_mut();
            let len = items.len();
            if index > len {
                return Err(ValueError::IndexOutOfRange { index, len });
            }
            if index == len {
                items.push(value.into());
            } else {
                items[index] = value.into();
            }
        }
        self.mutated();
        Ok(())
    }

    pub fn push(&self, values: impl IntoIterator<Item = Value>) -> usize {
        let len = {
            let mut items = self.0.items.borrow_mut();
            items.extend(values);
            items.len()
        };
        self.mutated();
        len
    }

    pub fn pop(&self) -> Value {
        let out = self.0.items.borrow_mut().pop().unwrap_or_default();
        self.mutated();
        out
    }

    pub fn shift(&self) -> Value {
        let out = {
            let mut items = self.0.items.borrow_mut();
            if items.is_empty() { Value::Undefined } else { items.remove(0) }
        };
        self.mutated();
        out
    }

    pub fn unshift(&self, values: impl IntoIterator<Item = Value>) -> usize {
        let len = {
            let mut items = self.0.items.borrow_mut();
            let front: Vec<Value> = values.into_iter().collect();
            items.splice(0..0, front);
            items.len()
        };
        self.mutated();
        len
    }

    /// Removes `delete_count` items at `start` (negative counts from the end),
    /// inserts `insert` in their place and returns the removed items.
    pub fn splice(&self, start: f64, delete_count: Option<f64>, insert: Vec<Value>) -> List {
        let removed = {
            let mut items = self.0.items.borrow_mut();
            let len = items.len();
            let start = clamp_index(start, len);
            let count = match delete_count {
                Some(c) if c.is_nan() || c < 0.0 => 0,
                Some(c) => (c.trunc() as usize).min(len - start),
                None => len - start,
            };
            items.splice(start..start + count, insert).collect::<Vec<_>>()
        };
        self.mutated();
        List::from(removed)
    }

    pub fn reverse(&self) {
        self.0.items.borrow_mut().reverse();
        self.mutated();
    }

    pub fn sort(&self) {
        // Comparing may stringify this very list, so sort a copy.
        let mut items = self.to_vec();
        items.sort_by(Value::sort_cmp);
        *self.0.items.borrow_mut() = items;
        self.mutated();
    }

    pub fn fill(&self, value: Value, start: Option<f64>, end: Option<f64>) {
        {
            let mut items = self.0.items.borrow_mut();
            let len = items.len();
            let from = start.map_or(0, |s| clamp_index(s, len));
            let to = end.map_or(len, |e| clamp_index(e, len));
            for slot in items.iter_mut().take(to).skip(from) {
                *slot = value.clone();
            }
        }
        self.mutated();
    }

    /// Shallow-copies `start..end` to position `target` without changing the
    /// length.
    pub fn copy_within(&self, target: f64, start: f64, end: Option<f64>) {
        {
            let mut items = self.0.items.borrow_mut();
            let len = items.len();
            let to = clamp_index(target, len);
            let from = clamp_index(start, len);
            let until = end.map_or(len, |e| clamp_index(e, len));
            if from < until {
                let chunk: Vec<Value> = items[from..until].to_vec();
                for (offset, v) in chunk.into_iter().enumerate() {
                    if to + offset >= len {
                        break;
                    }
                    items[to + offset] = v;
                }
            }
        }
        self.mutated();
    }

    pub fn slice(&self, start: Option<f64>, end: Option<f64>) -> List {
        let items = self.0.items.borrow();
        let len = items.len();
        let from = start.map_or(0, |s| clamp_index(s, len));
        let to = end.map_or(len, |e| clamp_index(e, len));
        if from >= to {
            return List::new();
        }
        List::from(items[from..to].to_vec())
    }
}

/// Insertion-ordered, string-keyed map container.
#[derive(Clone)]
pub struct Map(Rc<ContainerInner<IndexMap<String, Value>>>);

container_common!(Map);

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}

impl Map {
    pub fn new() -> Self {
        Map(ContainerInner::new(IndexMap::new()))
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Value {
        self.0.items.borrow().get(key).cloned().unwrap_or_default()
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.items.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.items.borrow().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.0.items.borrow().values().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .items
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.items.borrow_mut().insert(key.into(), value.into());
        self.mutated();
    }

    pub fn delete(&self, key: &str) -> bool {
        let removed = self.0.items.borrow_mut().shift_remove(key).is_some();
        self.mutated();
        removed
    }

    pub fn clear(&self) {
        self.0.items.borrow_mut().clear();
        self.mutated();
    }
}

/// Insertion-ordered set with SameValueZero membership.
#[derive(Clone)]
pub struct Set(Rc<ContainerInner<Vec<Value>>>);

container_common!(Set);

impl Default for Set {
    fn default() -> Self {
        Self::new()
    }
}

impl Set {
    pub fn new() -> Self {
        Set(ContainerInner::new(Vec::new()))
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has(&self, value: &Value) -> bool {
        self.0.items.borrow().iter().any(|v| v.same_value_zero(value))
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    pub fn add(&self, value: impl Into<Value>) {
        let value = value.into();
        if !self.has(&value) {
            self.0.items.borrow_mut().push(value);
        }
        self.mutated();
    }

    pub fn delete(&self, value: &Value) -> bool {
        let removed = {
            let mut items = self.0.items.borrow_mut();
            match items.iter().position(|v| v.same_value_zero(value)) {
                Some(i) => {
                    items.remove(i);
                    true
                }
                None => false,
            }
        };
        self.mutated();
        removed
    }

    pub fn clear(&self) {
        self.0.items.borrow_mut().clear();
        self.mutated();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_print_like_integers_when_whole() {
        assert_eq!(Value::from(5).to_string(), "5");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn extreme_magnitudes_use_exponent_form() {
        assert_eq!(Value::from(1e21).to_string(), "1e+21");
        assert_eq!(Value::from(1.5e22).to_string(), "1.5e+22");
        assert_eq!(Value::from(1e-7).to_string(), "1e-7");
        assert_eq!(Value::from(-2.5e-8).to_string(), "-2.5e-8");
        assert_eq!(Value::from(1e20).to_string(), "100000000000000000000");
        assert_eq!(Value::from(0.000001).to_string(), "0.000001");
    }

    #[test]
    fn cyclic_lists_join_the_repeat_as_empty() {
        let l = List::from(vec![Value::from("a")]);
        l.push([Value::from(l.clone())]);
        assert_eq!(Value::from(l.clone()).to_string(), "a,");
        assert_eq!(l.join("-"), "a-");

        let outer = List::from(vec![Value::from(1)]);
        let inner = List::from(vec![Value::from(outer.clone()), Value::from(2)]);
        outer.push([Value::from(inner)]);
        assert_eq!(outer.join(","), "1,,2");
        // the guard is released afterwards
        assert_eq!(outer.join(","), "1,,2");
    }

    #[test]
    fn index_writes_append_but_never_leave_holes() {
        let l = List::from(vec![Value::from(1)]);
        l.set(0, 5).unwrap();
        l.set(1, 6).unwrap();
        assert_eq!(l.join(","), "5,6");
        assert_eq!(
            l.set(1_099_511_627_776, 2),
            Err(ValueError::IndexOutOfRange {
                index: 1_099_511_627_776,
                len: 2
            })
        );
        assert_eq!(l.len(), 2);
    }

    #[test]
    fn nullish_values_interpolate_as_empty() {
        assert_eq!(Value::Undefined.to_template_string(), "");
        assert_eq!(Value::Null.to_template_string(), "");
        assert_eq!(Value::from(vec![Value::from("a"), Value::Null]).to_string(), "a,");
    }

    #[test]
    fn reference_kinds_compare_by_identity() {
        let a = Object::new();
        let b = Object::new();
        assert_eq!(Value::from(a.clone()), Value::from(a));
        assert_ne!(Value::from(Object::new()), Value::from(b));
    }

    #[test]
    fn splice_removes_and_inserts() {
        let l = List::from(vec![Value::from(1), Value::from(2), Value::from(3)]);
        let removed = l.splice(1.0, Some(1.0), vec![Value::from(9), Value::from(8)]);
        assert_eq!(removed.to_vec(), vec![Value::from(2)]);
        assert_eq!(l.join(","), "1,9,8,3");
    }

    #[test]
    fn set_ignores_duplicates() {
        let s = Set::new();
        s.add("a");
        s.add("a");
        s.add(Value::Number(f64::NAN));
        s.add(Value::Number(f64::NAN));
        assert_eq!(s.len(), 2);
    }
}
