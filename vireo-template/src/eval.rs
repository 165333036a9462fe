//! Interpreter for parsed expressions.
//!
//! Identifiers resolve against loop locals first, then the controller's
//! properties, then the globals store for names the configuration allows.

use std::fmt;

use tracing::warn;
use vireo_core::methods::{builtin_property, call_builtin};
use vireo_core::{Config, List, Object, Value};

use crate::error::EvalError;
use crate::expr::{BinaryOp, Expr, Literal, Program, UnaryOp, parse_program};

/// Evaluation context for one component.
pub struct Scope<'a> {
    this: &'a Object,
    globals: Option<&'a Object>,
    config: &'a Config,
    locals: Vec<(String, Value)>,
}

impl<'a> Scope<'a> {
    pub fn new(this: &'a Object, config: &'a Config) -> Self {
        Self {
            this,
            globals: None,
            config,
            locals: Vec::new(),
        }
    }

    pub fn with_globals(mut self, globals: &'a Object) -> Self {
        self.globals = Some(globals);
        self
    }

    pub fn with_locals(mut self, locals: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.locals.extend(locals);
        self
    }

    pub fn this(&self) -> &Object {
        self.this
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn push_local(&mut self, name: impl Into<String>, value: Value) {
        self.locals.push((name.into(), value));
    }

    pub fn pop_local(&mut self) -> Option<(String, Value)> {
        self.locals.pop()
    }

    /// Innermost binding wins.
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn locals(&self) -> &[(String, Value)] {
        &self.locals
    }

    fn set_local(&mut self, name: &str, value: Value) -> bool {
        match self.locals.iter_mut().rev().find(|(n, _)| n == name) {
            Some(slot) => {
                slot.1 = value;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("this", &Value::from(self.this.clone()))
            .field("locals", &self.locals)
            .finish()
    }
}

/// Parse and evaluate `source`. Failures are logged and yield `undefined`.
pub fn evaluate(source: &str, scope: &mut Scope) -> Value {
    match parse_program(source) {
        Ok(program) => evaluate_program(&program, scope),
        Err(e) => {
            report(source, &EvalError::from(e), scope);
            Value::Undefined
        }
    }
}

/// Evaluate an already parsed program, logging and recovering on failure.
pub fn evaluate_program(program: &Program, scope: &mut Scope) -> Value {
    match try_evaluate(program, scope) {
        Ok(v) => v,
        Err(e) => {
            report(&program.source, &e, scope);
            Value::Undefined
        }
    }
}

pub(crate) fn report(expression: &str, error: &EvalError, scope: &Scope) {
    warn!(expression, %error, context = ?scope, "expression could not be evaluated");
}

pub fn try_evaluate(program: &Program, scope: &mut Scope) -> Result<Value, EvalError> {
    let mut last = Value::Undefined;
    for stmt in &program.statements {
        last = eval(stmt, scope)?;
    }
    Ok(last)
}

fn eval(expr: &Expr, scope: &mut Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(l) => Ok(match l {
            Literal::Undefined => Value::Undefined,
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::Str(s) => Value::Str(s.clone()),
        }),
        Expr::Array(items) => {
            let values = items
                .iter()
                .map(|e| eval(e, scope))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::from(List::from(values)))
        }
        Expr::This => Ok(Value::from(scope.this.clone())),
        Expr::Ident(name) => lookup(name, scope),
        Expr::Member(target, name) => {
            let target = eval(target, scope)?;
            get_property(&target, name)
        }
        Expr::Index(target, key) => {
            let target = eval(target, scope)?;
            let key = eval(key, scope)?;
            get_property(&target, &key.to_string())
        }
        Expr::Call(callee, args) => call(callee, args, scope),
        Expr::Unary(op, operand) => {
            let v = eval(operand, scope)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!v.is_truthy()),
                UnaryOp::Neg => Value::Number(-v.to_number()),
            })
        }
        Expr::Binary(BinaryOp::And, l, r) => {
            let l = eval(l, scope)?;
            if l.is_truthy() { eval(r, scope) } else { Ok(l) }
        }
        Expr::Binary(BinaryOp::Or, l, r) => {
            let l = eval(l, scope)?;
            if l.is_truthy() { Ok(l) } else { eval(r, scope) }
        }
        Expr::Binary(op, l, r) => {
            let l = eval(l, scope)?;
            let r = eval(r, scope)?;
            Ok(binary(*op, &l, &r))
        }
        Expr::Conditional(test, yes, no) => {
            if eval(test, scope)?.is_truthy() {
                eval(yes, scope)
            } else {
                eval(no, scope)
            }
        }
        Expr::Assign(target, value) => {
            let value = eval(value, scope)?;
            assign(target, value.clone(), scope)?;
            Ok(value)
        }
    }
}

fn lookup(name: &str, scope: &Scope) -> Result<Value, EvalError> {
    if let Some(v) = scope.local(name) {
        return Ok(v.clone());
    }
    if scope.this.has(name) {
        return Ok(scope.this.get(name));
    }
    if scope.config.is_global_allowed(name) {
        if let Some(globals) = scope.globals.filter(|g| g.has(name)) {
            return Ok(globals.get(name));
        }
    }
    Err(EvalError::Unresolved(name.to_string()))
}

fn get_property(target: &Value, name: &str) -> Result<Value, EvalError> {
    match target {
        Value::Undefined | Value::Null => Err(EvalError::NullishAccess {
            property: name.to_string(),
            target: target.type_name(),
        }),
        Value::Object(o) => Ok(o.get(name)),
        other => Ok(builtin_property(other, name).unwrap_or_default()),
    }
}

fn call(callee: &Expr, args: &[Expr], scope: &mut Scope) -> Result<Value, EvalError> {
    // Method calls keep their receiver as `this`.
    let (receiver, method) = match callee {
        Expr::Member(target, name) => (Some(eval(target, scope)?), name.clone()),
        Expr::Index(target, key) => {
            let target = eval(target, scope)?;
            (Some(target), eval(key, scope)?.to_string())
        }
        _ => (None, String::new()),
    };
    let args = args
        .iter()
        .map(|a| eval(a, scope))
        .collect::<Result<Vec<_>, _>>()?;

    match receiver {
        Some(recv @ (Value::Undefined | Value::Null)) => Err(EvalError::NullishAccess {
            property: method,
            target: recv.type_name(),
        }),
        Some(Value::Object(o)) => match o.get(&method) {
            Value::Function(f) => Ok(f.call(&Value::from(o.clone()), &args)?),
            _ => Err(EvalError::NotCallable(method)),
        },
        Some(recv) => Ok(call_builtin(&recv, &method, &args)?),
        None => {
            let (f, this) = match callee {
                // Controller methods called bare still see the controller.
                Expr::Ident(name) if scope.local(name).is_none() && scope.this.has(name) => {
                    (scope.this.get(name), Value::from(scope.this.clone()))
                }
                other => (eval(other, scope)?, Value::Undefined),
            };
            match f {
                Value::Function(f) => Ok(f.call(&this, &args)?),
                _ => Err(EvalError::NotCallable(describe(callee))),
            }
        }
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident(n) => n.clone(),
        Expr::Member(_, n) => n.clone(),
        Expr::This => "this".to_string(),
        _ => "expression".to_string(),
    }
}

fn assign(target: &Expr, value: Value, scope: &mut Scope) -> Result<(), EvalError> {
    match target {
        Expr::Ident(name) => {
            if !scope.set_local(name, value.clone()) {
                scope.this.set(name.as_str(), value);
            }
            Ok(())
        }
        Expr::Member(obj, name) => {
            let obj = eval(obj, scope)?;
            set_property(&obj, name, value)
        }
        Expr::Index(obj, key) => {
            let obj = eval(obj, scope)?;
            let key = eval(key, scope)?;
            set_property(&obj, &key.to_string(), value)
        }
        _ => Err(EvalError::InvalidTarget),
    }
}

fn set_property(target: &Value, name: &str, value: Value) -> Result<(), EvalError> {
    match target {
        Value::Undefined | Value::Null => Err(EvalError::NullishAccess {
            property: name.to_string(),
            target: target.type_name(),
        }),
        Value::Object(o) => {
            o.set(name, value);
            Ok(())
        }
        Value::List(l) => match name.parse::<usize>() {
            Ok(i) => Ok(l.set(i, value)?),
            Err(_) => Err(EvalError::InvalidTarget),
        },
        Value::Map(m) => {
            m.set(name, value);
            Ok(())
        }
        _ => Err(EvalError::InvalidTarget),
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
                Value::Str(format!("{l}{r}"))
            } else {
                Value::Number(l.to_number() + r.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
        BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
        BinaryOp::Div => Value::Number(l.to_number() / r.to_number()),
        BinaryOp::Rem => Value::Number(l.to_number() % r.to_number()),
        BinaryOp::StrictEq | BinaryOp::Eq => Value::Bool(l.strict_equals(r)),
        BinaryOp::StrictNe | BinaryOp::Ne => Value::Bool(!l.strict_equals(r)),
        BinaryOp::Lt => compare(l, r, |o| o.is_lt()),
        BinaryOp::Le => compare(l, r, |o| o.is_le()),
        BinaryOp::Gt => compare(l, r, |o| o.is_gt()),
        BinaryOp::Ge => compare(l, r, |o| o.is_ge()),
        // short-circuit forms are handled by the caller
        BinaryOp::And | BinaryOp::Or => Value::Undefined,
    }
}

fn compare(l: &Value, r: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    let ord = match (l, r) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => l.to_number().partial_cmp(&r.to_number()),
    };
    Value::Bool(ord.is_some_and(test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_core::ValueError;

    fn run(src: &str, state: &Object) -> Result<Value, EvalError> {
        let config = Config::default();
        let mut scope = Scope::new(state, &config);
        try_evaluate(&parse_program(src).unwrap(), &mut scope)
    }

    #[test]
    fn implicit_this() {
        let state = Object::new().with("count", 2);
        assert_eq!(run("count * 3", &state).unwrap(), Value::from(6));
        assert_eq!(run("this.count + 1", &state).unwrap(), Value::from(3));
    }

    #[test]
    fn unresolved_names_fail() {
        let state = Object::new();
        assert_eq!(
            run("window", &state),
            Err(EvalError::Unresolved("window".into()))
        );
    }

    #[test]
    fn nullish_access_fails_but_missing_property_is_undefined() {
        let state = Object::new().with("user", Object::new());
        assert_eq!(run("this.user.name", &state).unwrap(), Value::Undefined);
        assert!(matches!(
            run("this.user.name.first", &state),
            Err(EvalError::NullishAccess { .. })
        ));
    }

    #[test]
    fn far_out_index_writes_fail_without_growing_the_list() {
        let items = List::from(vec![Value::from(1)]);
        let state = Object::new().with("items", items.clone());
        assert_eq!(
            run("items[1099511627776] = 2", &state),
            Err(EvalError::Value(ValueError::IndexOutOfRange {
                index: 1_099_511_627_776,
                len: 1
            }))
        );
        run("items[1] = 2", &state).unwrap();
        assert_eq!(items.join(","), "1,2");
    }

    #[test]
    fn short_circuit_skips_the_right_side() {
        let state = Object::new().with("ok", false);
        assert_eq!(run("ok && missing", &state).unwrap(), Value::from(false));
        assert_eq!(run("!ok || missing", &state).unwrap(), Value::from(true));
    }

    #[test]
    fn string_concatenation_and_comparison() {
        let state = Object::new().with("name", "vireo").with("n", 3);
        assert_eq!(run("'hi ' + name", &state).unwrap(), Value::from("hi vireo"));
        assert_eq!(run("n + 1 + ''", &state).unwrap(), Value::from("4"));
        assert_eq!(run("'a' < 'b'", &state).unwrap(), Value::from(true));
        assert_eq!(run("n >= 3 ? 'big' : 'small'", &state).unwrap(), Value::from("big"));
    }

    #[test]
    fn methods_see_their_receiver() {
        let state = Object::new()
            .with("count", 1)
            .method("bump", |this, args| {
                let Some(o) = this.as_object() else {
                    return Ok(Value::Undefined);
                };
                let by = args.first().map(Value::to_number).unwrap_or(1.0);
                o.set("count", o.get("count").to_number() + by);
                Ok(Value::Undefined)
            });
        run("bump(2)", &state).unwrap();
        run("this.bump()", &state).unwrap();
        assert_eq!(state.get("count"), Value::from(4));
    }

    #[test]
    fn assignment_writes_through() {
        let state = Object::new()
            .with("todo", Object::new().with("done", false))
            .with("items", List::from(vec![Value::from(1)]));
        run("todo.done = !todo.done; items[0] = 9", &state).unwrap();
        assert_eq!(state.get("todo").as_object().unwrap().get("done"), Value::from(true));
        assert_eq!(state.get("items").as_list().unwrap().get(0), Value::from(9));
        assert_eq!(run("1 = 2", &state), Err(EvalError::InvalidTarget));
    }

    #[test]
    fn locals_shadow_controller_properties() {
        let state = Object::new().with("item", "outer");
        let config = Config::default();
        let mut scope = Scope::new(&state, &config);
        scope.push_local("item", Value::from("inner"));
        assert_eq!(evaluate("item", &mut scope), Value::from("inner"));
        scope.pop_local();
        assert_eq!(evaluate("item", &mut scope), Value::from("outer"));
    }

    #[test]
    fn globals_need_the_allow_list() {
        let state = Object::new();
        let globals = Object::new().with("Math", Object::new().with("PI", 3.0));
        let denied = Config::default();
        let mut scope = Scope::new(&state, &denied).with_globals(&globals);
        assert_eq!(evaluate("Math.PI", &mut scope), Value::Undefined);

        let allowed = Config {
            allowed_globals: vec!["Math".into()],
            ..Config::default()
        };
        let mut scope = Scope::new(&state, &allowed).with_globals(&globals);
        assert_eq!(evaluate("Math.PI", &mut scope), Value::from(3.0));
    }

    #[test]
    fn builtins_are_reachable() {
        let state = Object::new().with("items", List::from(vec![Value::from("a"), Value::from("b")]));
        assert_eq!(run("items.length", &state).unwrap(), Value::from(2));
        assert_eq!(run("items.join('-').toUpperCase()", &state).unwrap(), Value::from("A-B"));
        assert_eq!(run("items[1]", &state).unwrap(), Value::from("b"));
    }
}
