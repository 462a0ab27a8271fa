//! Methods on lists, tuples, strings and dicts.
//!
//! `list.sort` lives in the interpreter because its `key=` may call back into
//! snippet code.

use super::exception::{ErrorType, Exception, Raised};
use super::ops;
use crate::value::{Dict, Value};

const LIST_METHODS: &[&str] = &[
    "append", "extend", "insert", "pop", "remove", "index", "count", "reverse", "sort",
];
const TUPLE_METHODS: &[&str] = &["index", "count"];
const STR_METHODS: &[&str] = &[
    "upper",
    "lower",
    "strip",
    "split",
    "join",
    "replace",
    "startswith",
    "endswith",
    "count",
    "find",
];
const DICT_METHODS: &[&str] = &["keys", "values", "items", "get", "pop"];

fn methods_of(receiver: &Value) -> &'static [&'static str] {
    match receiver {
        Value::List(_) => LIST_METHODS,
        Value::Tuple(_) => TUPLE_METHODS,
        Value::Str(_) => STR_METHODS,
        Value::Dict(_) => DICT_METHODS,
        _ => &[],
    }
}

pub(super) fn no_attribute(receiver: &Value, name: &str) -> Exception {
    Exception::new(
        ErrorType::AttributeError,
        format!(
            "'{}' object has no attribute '{name}'",
            receiver.type_name()
        ),
    )
}

/// Error for `obj.name` used as a value rather than called.
pub(super) fn not_callable_here(receiver: &Value, name: &str) -> Exception {
    if methods_of(receiver).contains(&name) {
        Exception::type_error(format!(
            "method '{name}' of '{}' must be called directly, as in x.{name}(...)",
            receiver.type_name()
        ))
    } else {
        no_attribute(receiver, name)
    }
}

/// Call `receiver.name(*args)`, mutating the receiver in place.
pub(super) fn call(
    receiver: &mut Value,
    name: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
    max_len: usize,
) -> Raised<Value> {
    if !methods_of(receiver).contains(&name) {
        return Err(no_attribute(receiver, name));
    }
    if !kwargs.is_empty() {
        return Err(Exception::type_error(format!(
            "{}.{name}() takes no keyword arguments",
            receiver.type_name()
        )));
    }
    let invocation = Call {
        owner: receiver.type_name(),
        name,
        args,
    };
    match receiver {
        Value::List(items) => list_method(items, invocation, max_len),
        Value::Tuple(items) => sequence_query(items, invocation),
        Value::Str(text) => str_method(text, invocation, max_len),
        Value::Dict(dict) => dict_method(dict, invocation),
        other => Err(no_attribute(other, name)),
    }
}

struct Call<'a> {
    owner: &'static str,
    name: &'a str,
    args: Vec<Value>,
}

impl Call<'_> {
    fn arity(&self, min: usize, max: usize) -> Raised<()> {
        let given = self.args.len();
        if (min..=max).contains(&given) {
            return Ok(());
        }
        let expected = match (min, max) {
            (0, 0) => "no arguments".to_string(),
            (1, 1) => "exactly one argument".to_string(),
            (min, max) if min == max => format!("exactly {min} arguments"),
            (min, max) => format!("{min} to {max} arguments"),
        };
        Err(Exception::type_error(format!(
            "{}.{}() takes {expected} ({given} given)",
            self.owner, self.name
        )))
    }

    fn str_arg(&self, position: usize) -> Raised<&str> {
        match &self.args[position] {
            Value::Str(text) => Ok(text),
            other => Err(Exception::type_error(format!(
                "{}.{}() argument must be str, not {}",
                self.owner,
                self.name,
                other.type_name()
            ))),
        }
    }

    fn int_arg(&self, position: usize) -> Raised<i64> {
        ops::as_int(&self.args[position]).ok_or_else(|| {
            Exception::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                self.args[position].type_name()
            ))
        })
    }
}

fn list_method(items: &mut Vec<Value>, call: Call<'_>, max_len: usize) -> Raised<Value> {
    match call.name {
        "append" => {
            call.arity(1, 1)?;
            ops::check_store(items, &call.args[0], max_len)?;
            items.extend(call.args);
            Ok(Value::None)
        }
        "extend" => {
            call.arity(1, 1)?;
            let extra = ops::iterate(&call.args[0])?;
            let grown = if extra.iter().all(ops::is_scalar) {
                items.len().saturating_add(extra.len())
            } else {
                ops::held_len(items).saturating_add(ops::held_len(&extra))
            };
            ops::check_len(grown, max_len)?;
            items.extend(extra);
            Ok(Value::None)
        }
        "insert" => {
            call.arity(2, 2)?;
            ops::check_store(items, &call.args[1], max_len)?;
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let index = call.int_arg(0)?;
            let index = if index < 0 { index + len } else { index }.clamp(0, len);
            let index = usize::try_from(index).unwrap_or(items.len());
            let mut args = call.args;
            if let Some(value) = args.pop() {
                items.insert(index, value);
            }
            Ok(Value::None)
        }
        "pop" => {
            call.arity(0, 1)?;
            if items.is_empty() {
                return Err(Exception::new(ErrorType::IndexError, "pop from empty list"));
            }
            let index = if call.args.is_empty() { -1 } else { call.int_arg(0)? };
            let position = ops::normalize_index(index, items.len())
                .ok_or_else(|| Exception::new(ErrorType::IndexError, "pop index out of range"))?;
            Ok(items.remove(position))
        }
        "remove" => {
            call.arity(1, 1)?;
            let position = items
                .iter()
                .position(|item| *item == call.args[0])
                .ok_or_else(|| Exception::value_error("list.remove(x): x not in list"))?;
            items.remove(position);
            Ok(Value::None)
        }
        "reverse" => {
            call.arity(0, 0)?;
            items.reverse();
            Ok(Value::None)
        }
        _ => sequence_query(items, call),
    }
}

/// `index` and `count`, shared by lists and tuples.
fn sequence_query(items: &[Value], call: Call<'_>) -> Raised<Value> {
    call.arity(1, 1)?;
    let needle = &call.args[0];
    match call.name {
        "index" => items
            .iter()
            .position(|item| item == needle)
            .map(int)
            .ok_or_else(|| {
                Exception::value_error(format!("{} is not in {}", needle.repr(), call.owner))
            }),
        "count" => Ok(int(items.iter().filter(|item| *item == needle).count())),
        other => Err(no_attribute(&Value::List(Vec::new()), other)),
    }
}

fn str_method(text: &str, call: Call<'_>, max_len: usize) -> Raised<Value> {
    let result = match call.name {
        "upper" => {
            call.arity(0, 0)?;
            Value::Str(text.to_uppercase())
        }
        "lower" => {
            call.arity(0, 0)?;
            Value::Str(text.to_lowercase())
        }
        "strip" => {
            call.arity(0, 1)?;
            match call.args.first() {
                None | Some(Value::None) => Value::Str(text.trim().to_string()),
                Some(_) => {
                    let chars: Vec<char> = call.str_arg(0)?.chars().collect();
                    Value::Str(text.trim_matches(chars.as_slice()).to_string())
                }
            }
        }
        "split" => {
            call.arity(0, 1)?;
            let parts: Vec<Value> = match call.args.first() {
                None | Some(Value::None) => text
                    .split_whitespace()
                    .map(|part| Value::Str(part.to_string()))
                    .collect(),
                Some(_) => {
                    let separator = call.str_arg(0)?;
                    if separator.is_empty() {
                        return Err(Exception::value_error("empty separator"));
                    }
                    text.split(separator)
                        .map(|part| Value::Str(part.to_string()))
                        .collect()
                }
            };
            Value::List(parts)
        }
        "join" => {
            call.arity(1, 1)?;
            let items = ops::iterate(&call.args[0])?;
            let mut pieces = Vec::with_capacity(items.len());
            let mut total = 0usize;
            for (position, item) in items.iter().enumerate() {
                let Value::Str(piece) = item else {
                    return Err(Exception::type_error(format!(
                        "sequence item {position}: expected str instance, {} found",
                        item.type_name()
                    )));
                };
                total = total.saturating_add(piece.len()).saturating_add(text.len());
                if total > max_len {
                    return Err(ops::memory_error(max_len));
                }
                pieces.push(piece.as_str());
            }
            Value::Str(pieces.join(text))
        }
        "replace" => {
            call.arity(2, 2)?;
            let (old, new) = (call.str_arg(0)?, call.str_arg(1)?);
            let occurrences = if old.is_empty() {
                text.chars().count() + 1
            } else {
                text.matches(old).count()
            };
            let grown = occurrences.saturating_mul(new.len());
            if text.len().saturating_add(grown) > max_len {
                return Err(ops::memory_error(max_len));
            }
            Value::Str(text.replace(old, new))
        }
        "startswith" => {
            call.arity(1, 1)?;
            Value::Bool(text.starts_with(call.str_arg(0)?))
        }
        "endswith" => {
            call.arity(1, 1)?;
            Value::Bool(text.ends_with(call.str_arg(0)?))
        }
        "count" => {
            call.arity(1, 1)?;
            let needle = call.str_arg(0)?;
            if needle.is_empty() {
                int(text.chars().count() + 1)
            } else {
                int(text.matches(needle).count())
            }
        }
        "find" => {
            call.arity(1, 1)?;
            match text.find(call.str_arg(0)?) {
                Some(byte) => int(text[..byte].chars().count()),
                None => Value::Int(-1),
            }
        }
        other => return Err(no_attribute(&Value::Str(String::new()), other)),
    };
    Ok(result)
}

fn dict_method(dict: &mut Dict, call: Call<'_>) -> Raised<Value> {
    match call.name {
        "keys" => {
            call.arity(0, 0)?;
            Ok(Value::List(dict.keys().cloned().collect()))
        }
        "values" => {
            call.arity(0, 0)?;
            Ok(Value::List(dict.values().cloned().collect()))
        }
        "items" => {
            call.arity(0, 0)?;
            Ok(Value::List(
                dict.iter()
                    .map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()]))
                    .collect(),
            ))
        }
        "get" => {
            call.arity(1, 2)?;
            let mut args = call.args.into_iter();
            let key = args.next().unwrap_or(Value::None);
            ops::check_hashable(&key)?;
            Ok(dict
                .get(&key)
                .cloned()
                .unwrap_or_else(|| args.next().unwrap_or(Value::None)))
        }
        "pop" => {
            call.arity(1, 2)?;
            let mut args = call.args.into_iter();
            let key = args.next().unwrap_or(Value::None);
            ops::check_hashable(&key)?;
            match (dict.remove(&key), args.next()) {
                (Some(value), _) | (None, Some(value)) => Ok(value),
                (None, None) => Err(Exception::new(ErrorType::KeyError, key.repr())),
            }
        }
        other => Err(no_attribute(&Value::Dict(Dict::new()), other)),
    }
}

fn int(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use crate::sandbox::{ExecutionOutcome, Sandbox};
    use crate::value::{Bindings, Value};

    fn value(source: &str) -> Value {
        let execution = Sandbox::default().execute_source(source, &Bindings::new());
        match execution.outcome {
            ExecutionOutcome::Success(bindings) => bindings.get("x").cloned().unwrap(),
            ExecutionOutcome::Failure(fault) => panic!("{source:?} failed: {fault}"),
        }
    }

    fn error(source: &str) -> String {
        let execution = Sandbox::default().execute_source(source, &Bindings::new());
        execution.outcome.fault().unwrap().message.clone()
    }

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn test_list_methods() {
        assert_eq!(value("x = [1, 2]\nx.extend([3, 4])"), ints(&[1, 2, 3, 4]));
        assert_eq!(value("x = [1, 3]\nx.insert(1, 2)"), ints(&[1, 2, 3]));
        assert_eq!(value("x = [1, 3]\nx.insert(-100, 0)"), ints(&[0, 1, 3]));
        assert_eq!(value("L = [1, 2, 3]\nx = L.pop()"), Value::Int(3));
        assert_eq!(value("x = [1, 2, 3]\nx.pop(0)"), ints(&[2, 3]));
        assert_eq!(value("x = [1, 2, 1]\nx.remove(1)"), ints(&[2, 1]));
        assert_eq!(value("x = [5, 6, 7].index(7)"), Value::Int(2));
        assert_eq!(value("x = [1, 1, 2].count(1)"), Value::Int(2));
        assert_eq!(value("x = [1, 2, 3]\nx.reverse()"), ints(&[3, 2, 1]));
    }

    #[test]
    fn test_list_method_errors() {
        assert!(error("x = []\nx.pop()").contains("pop from empty list"));
        assert!(error("x = [1]\nx.remove(2)").contains("not in list"));
        assert!(error("x = [1]\nx.append()").contains("takes exactly one argument (0 given)"));
        assert!(error("x = [1]\nx.push(2)").starts_with("AttributeError"));
        assert!(error("x = [1]\nx.append(2, where=0)").contains("no keyword arguments"));
    }

    #[test]
    fn test_str_methods() {
        assert_eq!(value("x = 'Hi'.upper()"), s("HI"));
        assert_eq!(value("x = 'Hi'.lower()"), s("hi"));
        assert_eq!(value("x = '  pad  '.strip()"), s("pad"));
        assert_eq!(value("x = 'xxhixx'.strip('x')"), s("hi"));
        assert_eq!(
            value("x = 'a b  c'.split()"),
            Value::List(vec![s("a"), s("b"), s("c")])
        );
        assert_eq!(
            value("x = 'a,b,,c'.split(',')"),
            Value::List(vec![s("a"), s("b"), s(""), s("c")])
        );
        assert_eq!(value("x = '-'.join(['a', 'b'])"), s("a-b"));
        assert_eq!(value("x = 'aaa'.replace('a', 'bb')"), s("bbbbbb"));
        assert_eq!(value("x = 'hello'.startswith('he')"), Value::Bool(true));
        assert_eq!(value("x = 'hello'.endswith('lo')"), Value::Bool(true));
        assert_eq!(value("x = 'banana'.count('an')"), Value::Int(2));
        assert_eq!(value("x = 'héllo'.find('l')"), Value::Int(2));
        assert_eq!(value("x = 'hello'.find('z')"), Value::Int(-1));
    }

    #[test]
    fn test_str_method_errors() {
        assert!(error("x = ','.join([1, 2])").contains("sequence item 0"));
        assert!(error("x = 'a'.split('')").contains("empty separator"));
        assert!(error("x = 'a'.startswith(1)").contains("must be str"));
    }

    #[test]
    fn test_strings_are_not_mutated() {
        let execution = Sandbox::default().execute_source("x = 'hi'\ny = x.upper()", &Bindings::new());
        let bindings = execution.outcome.bindings().unwrap();
        assert_eq!(bindings.get("x"), Some(&s("hi")));
        assert_eq!(bindings.get("y"), Some(&s("HI")));
    }

    #[test]
    fn test_dict_methods() {
        let setup = "d = {'a': 1, 'b': 2}\n";
        assert_eq!(value(&format!("{setup}x = d.keys()")), Value::List(vec![s("a"), s("b")]));
        assert_eq!(value(&format!("{setup}x = d.values()")), ints(&[1, 2]));
        assert_eq!(
            value(&format!("{setup}x = d.items()")),
            Value::List(vec![
                Value::Tuple(vec![s("a"), Value::Int(1)]),
                Value::Tuple(vec![s("b"), Value::Int(2)]),
            ])
        );
        assert_eq!(value(&format!("{setup}x = d.get('z')")), Value::None);
        assert_eq!(value(&format!("{setup}x = d.get('z', 0)")), Value::Int(0));
        assert_eq!(value(&format!("{setup}x = d.pop('a')")), Value::Int(1));
        assert_eq!(value(&format!("{setup}x = d.pop('z', -1)")), Value::Int(-1));
        assert!(error(&format!("{setup}x = d.pop('z')")).starts_with("KeyError"));
        assert!(error(&format!("{setup}x = d.get([1])")).contains("unhashable"));
    }

    #[test]
    fn test_tuple_queries() {
        assert_eq!(value("x = (1, 2, 2).count(2)"), Value::Int(2));
        assert!(error("x = (1, 2).index(5)").contains("5 is not in tuple"));
    }
}
