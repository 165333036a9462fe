// vireo-core/src/observe.rs

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::value::Value;

/// Change callback installed on observed objects and containers.
#[derive(Clone)]
pub struct Notifier(Rc<dyn Fn()>);

impl Notifier {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Notifier(Rc::new(f))
    }

    pub fn notify(&self) {
        (self.0)();
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Notifier")
    }
}

/// Container kinds whose mutating operations are wrapped. Besides the
/// methods listed here, index assignment (`List::set`, `Map::set`) notifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    List,
    Map,
    Set,
}

const LIST_MUTATORS: &[&str] = &[
    "copyWithin",
    "fill",
    "pop",
    "push",
    "reverse",
    "shift",
    "sort",
    "splice",
    "unshift",
];
const MAP_MUTATORS: &[&str] = &["clear", "delete", "set"];
const SET_MUTATORS: &[&str] = &["add", "clear", "delete"];

impl ContainerKind {
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::List(_) => Some(ContainerKind::List),
            Value::Map(_) => Some(ContainerKind::Map),
            Value::Set(_) => Some(ContainerKind::Set),
            _ => None,
        }
    }

    /// Operations that notify and re-observe after running.
    pub const fn mutators(self) -> &'static [&'static str] {
        match self {
            ContainerKind::List => LIST_MUTATORS,
            ContainerKind::Map => MAP_MUTATORS,
            ContainerKind::Set => SET_MUTATORS,
        }
    }

    pub fn is_mutator(self, method: &str) -> bool {
        self.mutators().contains(&method)
    }
}

/// Observe `state` and everything reachable from it, calling `on_change`
/// synchronously on every write to an observed property and after every
/// wrapped container mutation.
///
/// Functions are never shadowed. Objects and containers that already carry a
/// notifier keep it; their contents are still walked so values added since
/// the last walk get observed.
pub fn observe(state: &Value, on_change: Notifier) {
    observe_with(state, &on_change);
}

pub(crate) fn observe_with(value: &Value, notifier: &Notifier) {
    let mut seen: HashSet<usize> = HashSet::new();
    let mut stack = vec![value.clone()];
    let mut visited = 0usize;

    while let Some(next) = stack.pop() {
        let Some(id) = next.handle_id() else { continue };
        if !seen.insert(id) {
            continue;
        }
        visited += 1;
        match &next {
            Value::Object(o) => {
                o.attach(notifier);
                stack.extend(o.shadow_eligible());
            }
            Value::List(l) => {
                l.attach(notifier);
                stack.extend(l.to_vec());
            }
            Value::Map(m) => {
                m.attach(notifier);
                stack.extend(m.values());
            }
            Value::Set(s) => {
                s.attach(notifier);
                stack.extend(s.to_vec());
            }
            _ => {}
        }
    }

    trace!(visited, "observation walk finished");
}
