//! Built-in properties and methods of strings and containers, callable from
//! template expressions.

use crate::error::ValueError;
use crate::observe::ContainerKind;
use crate::value::{List, Map, Set, Value};

/// Built-in property lookup (`length`, `size`, numeric indices).
pub fn builtin_property(receiver: &Value, name: &str) -> Option<Value> {
    match (receiver, name) {
        (Value::Str(s), "length") => Some(Value::from(s.chars().count())),
        (Value::Str(s), idx) => idx
            .parse::<usize>()
            .ok()
            .map(|i| s.chars().nth(i).map(|c| c.to_string()).into()),
        (Value::List(l), "length") => Some(Value::from(l.len())),
        (Value::List(l), idx) => idx.parse::<usize>().ok().map(|i| l.get(i)),
        (Value::Map(m), "size") => Some(Value::from(m.len())),
        (Value::Set(s), "size") => Some(Value::from(s.len())),
        _ => None,
    }
}

/// Invoke a built-in method. Container mutators are looked up in the
/// [`ContainerKind`] table and notify the container's observer.
pub fn call_builtin(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, ValueError> {
    if let Value::Str(s) = receiver {
        return call_string(s, method, args);
    }
    let Some(kind) = ContainerKind::of(receiver) else {
        return Err(unknown(receiver, method));
    };
    let mutating = kind.is_mutator(method);
    match (receiver, mutating) {
        (Value::List(l), true) => list_mutator(l, method, args),
        (Value::List(l), false) => list_reader(l, method, args),
        (Value::Map(m), true) => map_mutator(m, method, args),
        (Value::Map(m), false) => map_reader(m, method, args),
        (Value::Set(s), true) => set_mutator(s, method, args),
        (Value::Set(s), false) => set_reader(s, method, args),
        _ => Err(unknown(receiver, method)),
    }
}

fn unknown(receiver: &Value, method: &str) -> ValueError {
    ValueError::UnknownMethod {
        method: method.to_string(),
        receiver: receiver.type_name(),
    }
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

fn opt_number(args: &[Value], i: usize) -> Option<f64> {
    args.get(i).filter(|v| !matches!(v, Value::Undefined)).map(Value::to_number)
}

fn list_mutator(l: &List, method: &str, args: &[Value]) -> Result<Value, ValueError> {
    let out = match method {
        "push" => Value::from(l.push(args.iter().cloned())),
        "pop" => l.pop(),
        "shift" => l.shift(),
        "unshift" => Value::from(l.unshift(args.iter().cloned())),
        "splice" => {
            let start = opt_number(args, 0).unwrap_or(0.0);
            let count = opt_number(args, 1);
            let insert = args.iter().skip(2).cloned().collect();
            Value::from(l.splice(start, count, insert))
        }
        "reverse" => {
            l.reverse();
            Value::from(l.clone())
        }
        "sort" => {
            l.sort();
            Value::from(l.clone())
        }
        "fill" => {
            l.fill(arg(args, 0), opt_number(args, 1), opt_number(args, 2));
            Value::from(l.clone())
        }
        "copyWithin" => {
            let target = opt_number(args, 0).unwrap_or(0.0);
            let start = opt_number(args, 1).unwrap_or(0.0);
            l.copy_within(target, start, opt_number(args, 2));
            Value::from(l.clone())
        }
        _ => return Err(unknown(&Value::from(l.clone()), method)),
    };
    Ok(out)
}

fn list_reader(l: &List, method: &str, args: &[Value]) -> Result<Value, ValueError> {
    let out = match method {
        "includes" => Value::from(l.includes(&arg(args, 0))),
        "indexOf" => Value::Number(l.index_of(&arg(args, 0)).map_or(-1.0, |i| i as f64)),
        "join" => {
            let sep = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(v) => v.to_string(),
            };
            Value::from(l.join(&sep))
        }
        "slice" => Value::from(l.slice(opt_number(args, 0), opt_number(args, 1))),
        "at" => {
            let raw = opt_number(args, 0).unwrap_or(0.0).trunc();
            let len = l.len() as f64;
            let idx = if raw < 0.0 { len + raw } else { raw };
            if idx < 0.0 || idx >= len { Value::Undefined } else { l.get(idx as usize) }
        }
        _ => return Err(unknown(&Value::from(l.clone()), method)),
    };
    Ok(out)
}

fn map_key(args: &[Value], method: &str) -> Result<String, ValueError> {
    match args.first() {
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
        _ => Err(ValueError::BadArgument {
            method: method.to_string(),
            expected: "a string, number or boolean key",
        }),
    }
}

fn map_mutator(m: &Map, method: &str, args: &[Value]) -> Result<Value, ValueError> {
    match method {
        "set" => {
            m.set(map_key(args, method)?, arg(args, 1));
            Ok(Value::from(m.clone()))
        }
        "delete" => Ok(Value::from(m.delete(&map_key(args, method)?))),
        "clear" => {
            m.clear();
            Ok(Value::Undefined)
        }
        _ => Err(unknown(&Value::from(m.clone()), method)),
    }
}

fn map_reader(m: &Map, method: &str, args: &[Value]) -> Result<Value, ValueError> {
    match method {
        "get" => Ok(m.get(&map_key(args, method)?)),
        "has" => Ok(Value::from(m.has(&map_key(args, method)?))),
        "keys" => Ok(Value::from(
            m.keys().into_iter().map(Value::from).collect::<Vec<_>>(),
        )),
        "values" => Ok(Value::from(m.values())),
        _ => Err(unknown(&Value::from(m.clone()), method)),
    }
}

fn set_mutator(s: &Set, method: &str, args: &[Value]) -> Result<Value, ValueError> {
    match method {
        "add" => {
            s.add(arg(args, 0));
            Ok(Value::from(s.clone()))
        }
        "delete" => Ok(Value::from(s.delete(&arg(args, 0)))),
        "clear" => {
            s.clear();
            Ok(Value::Undefined)
        }
        _ => Err(unknown(&Value::from(s.clone()), method)),
    }
}

fn set_reader(s: &Set, method: &str, args: &[Value]) -> Result<Value, ValueError> {
    match method {
        "has" => Ok(Value::from(s.has(&arg(args, 0)))),
        "values" => Ok(Value::from(s.to_vec())),
        _ => Err(unknown(&Value::from(s.clone()), method)),
    }
}

fn call_string(s: &str, method: &str, args: &[Value]) -> Result<Value, ValueError> {
    let needle = || arg(args, 0).to_string();
    let out = match method {
        "toUpperCase" => Value::from(s.to_uppercase()),
        "toLowerCase" => Value::from(s.to_lowercase()),
        "trim" => Value::from(s.trim()),
        "includes" => Value::from(s.contains(needle().as_str())),
        "startsWith" => Value::from(s.starts_with(needle().as_str())),
        "endsWith" => Value::from(s.ends_with(needle().as_str())),
        _ => {
            return Err(ValueError::UnknownMethod {
                method: method.to_string(),
                receiver: "string",
            });
        }
    };
    Ok(out)
}
