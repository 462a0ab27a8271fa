//! The capability allow-list: the only globals a snippet can reach besides
//! its own bindings.

use super::exception::{ErrorType, Exception, Raised};
use super::interp::{take_keyword, Interpreter};
use super::ops;
use crate::lang::{BinOp, CmpOp};
use crate::value::Value;
use std::cmp::Ordering;

/// An allow-listed capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `print(*values, sep=' ', end='\n')`, captured into the transcript.
    Print,
    /// `range(stop)` / `range(start, stop[, step])`, as a list.
    Range,
    /// `len(x)`.
    Len,
    /// `sum(iterable[, start])`.
    Sum,
    /// `min(iterable)` / `min(a, b, ...)`, optional `key=` and `default=`.
    Min,
    /// `max(iterable)` / `max(a, b, ...)`, optional `key=` and `default=`.
    Max,
    /// `abs(x)`.
    Abs,
    /// `sorted(iterable, key=None, reverse=False)`, stable.
    Sorted,
}

impl Builtin {
    /// Every capability, in documentation order.
    pub const ALL: [Builtin; 8] = [
        Builtin::Print,
        Builtin::Range,
        Builtin::Len,
        Builtin::Sum,
        Builtin::Min,
        Builtin::Max,
        Builtin::Abs,
        Builtin::Sorted,
    ];

    /// Name the capability is bound to.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Range => "range",
            Builtin::Len => "len",
            Builtin::Sum => "sum",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Abs => "abs",
            Builtin::Sorted => "sorted",
        }
    }

    /// Resolve a global name to a capability.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }
}

impl Interpreter<'_> {
    pub(super) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        mut kwargs: Vec<(String, Value)>,
    ) -> Raised<Value> {
        let name = builtin.name();
        match builtin {
            Builtin::Print => {
                let sep = text_keyword(&mut kwargs, "sep", " ")?;
                let end = text_keyword(&mut kwargs, "end", "\n")?;
                no_more_keywords(name, &kwargs)?;
                let mut text = args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(&sep);
                text.push_str(&end);
                self.write_output(&text)?;
                Ok(Value::None)
            }
            Builtin::Range => {
                no_more_keywords(name, &kwargs)?;
                arity(name, args.len(), 1, 3)?;
                self.range(&args)
            }
            Builtin::Len => {
                no_more_keywords(name, &kwargs)?;
                arity(name, args.len(), 1, 1)?;
                let len = match &args[0] {
                    Value::Str(s) => s.chars().count(),
                    Value::List(items) | Value::Tuple(items) => items.len(),
                    Value::Dict(dict) => dict.len(),
                    other => {
                        return Err(Exception::type_error(format!(
                            "object of type '{}' has no len()",
                            other.type_name()
                        )));
                    }
                };
                Ok(Value::Int(i64::try_from(len).unwrap_or(i64::MAX)))
            }
            Builtin::Sum => {
                let start = take_keyword(&mut kwargs, "start");
                no_more_keywords(name, &kwargs)?;
                arity(name, args.len(), 1, 2)?;
                let mut args = args.into_iter();
                let items = args.next().map_or(Ok(Vec::new()), |v| ops::iterate(&v))?;
                let start = args.next().or(start).unwrap_or(Value::Int(0));
                if matches!(start, Value::Str(_)) {
                    return Err(Exception::type_error(
                        "sum() can't sum strings [use ''.join(seq) instead]",
                    ));
                }
                let max_len = self.max_len();
                items.iter().try_fold(start, |total, item| {
                    ops::binary(BinOp::Add, &total, item, max_len)
                })
            }
            Builtin::Min | Builtin::Max => {
                let key = take_keyword(&mut kwargs, "key");
                let default = take_keyword(&mut kwargs, "default");
                no_more_keywords(name, &kwargs)?;
                let wanted = if builtin == Builtin::Max {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
                self.extreme(name, args, key.as_ref(), default, wanted)
            }
            Builtin::Abs => {
                no_more_keywords(name, &kwargs)?;
                arity(name, args.len(), 1, 1)?;
                match &args[0] {
                    Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
                    Value::Int(i) => i.checked_abs().map(Value::Int).ok_or_else(Exception::overflow),
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    other => Err(Exception::type_error(format!(
                        "bad operand type for abs(): '{}'",
                        other.type_name()
                    ))),
                }
            }
            Builtin::Sorted => {
                let key = take_keyword(&mut kwargs, "key");
                let reverse = take_keyword(&mut kwargs, "reverse");
                no_more_keywords(name, &kwargs)?;
                arity(name, args.len(), 1, 1)?;
                let items = ops::iterate(&args[0])?;
                let reverse = reverse.as_ref().is_some_and(Value::is_truthy);
                Ok(Value::List(self.sort_values(items, key.as_ref(), reverse)?))
            }
        }
    }

    fn range(&mut self, args: &[Value]) -> Raised<Value> {
        let mut bounds = Vec::with_capacity(args.len());
        for arg in args {
            let bound = ops::as_int(arg).ok_or_else(|| {
                Exception::type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    arg.type_name()
                ))
            })?;
            bounds.push(bound);
        }
        let (start, stop, step) = match bounds[..] {
            [stop] => (0, stop, 1),
            [start, stop] => (start, stop, 1),
            [start, stop, step] => (start, stop, step),
            _ => return Err(Exception::type_error("range() takes 1 to 3 arguments")),
        };
        if step == 0 {
            return Err(Exception::value_error("range() arg 3 must not be zero"));
        }

        let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
        let count = if step > 0 && start < stop {
            (stop - start - 1) / step + 1
        } else if step < 0 && start > stop {
            (start - stop - 1) / -step + 1
        } else {
            0
        };
        let max_len = self.max_len();
        let count = usize::try_from(count).map_err(|_| ops::memory_error(max_len))?;
        if count > max_len {
            return Err(ops::memory_error(max_len));
        }
        self.burn(ops::element_cost(count))?;

        let mut items = Vec::with_capacity(count);
        let mut current = start;
        for _ in 0..count {
            items.push(Value::Int(i64::try_from(current).map_err(|_| Exception::overflow())?));
            current += step;
        }
        Ok(Value::List(items))
    }

    /// `min` / `max`: the first item whose key orders as `wanted` against
    /// every other.
    fn extreme(
        &mut self,
        name: &str,
        args: Vec<Value>,
        key: Option<&Value>,
        default: Option<Value>,
        wanted: Ordering,
    ) -> Raised<Value> {
        let items = match args.len() {
            0 => {
                return Err(Exception::type_error(format!(
                    "{name} expected at least 1 argument, got 0"
                )));
            }
            1 => ops::iterate(&args[0])?,
            _ => {
                if default.is_some() {
                    return Err(Exception::type_error(format!(
                        "Cannot specify a default for {name}() with multiple positional arguments"
                    )));
                }
                args
            }
        };

        let mut best: Option<(Value, Value)> = None;
        for item in items {
            let item_key = self.key_of(key, &item)?;
            let replace = match &best {
                None => true,
                Some((_, best_key)) => {
                    ops::ordering(CmpOp::Lt, &item_key, best_key)? == Some(wanted)
                }
            };
            if replace {
                best = Some((item, item_key));
            }
        }

        match (best, default) {
            (Some((item, _)), _) => Ok(item),
            (None, Some(default)) => Ok(default),
            (None, None) => Err(Exception::value_error(format!(
                "{name}() arg is an empty sequence"
            ))),
        }
    }

    fn key_of(&mut self, key: Option<&Value>, item: &Value) -> Raised<Value> {
        match key {
            None | Some(Value::None) => Ok(item.clone()),
            Some(function) => self.call_value(function, vec![item.clone()], Vec::new()),
        }
    }

    /// Stable sort by key. `reverse` flips comparisons, not the result, so
    /// equal items keep their order.
    pub(super) fn sort_values(
        &mut self,
        items: Vec<Value>,
        key: Option<&Value>,
        reverse: bool,
    ) -> Raised<Vec<Value>> {
        let mut keys = Vec::with_capacity(items.len());
        for item in &items {
            keys.push(self.key_of(key, item)?);
        }

        let mut order: Vec<usize> = (0..items.len()).collect();
        let mut failure = None;
        order.sort_by(|&a, &b| {
            match ops::ordering(CmpOp::Lt, &keys[a], &keys[b]) {
                Ok(Some(ordering)) if reverse => ordering.reverse(),
                Ok(Some(ordering)) => ordering,
                Ok(None) => Ordering::Equal,
                Err(exception) => {
                    failure.get_or_insert(exception);
                    Ordering::Equal
                }
            }
        });
        if let Some(exception) = failure {
            return Err(exception);
        }

        let mut slots: Vec<Option<Value>> = items.into_iter().map(Some).collect();
        Ok(order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect())
    }
}

fn arity(name: &str, given: usize, min: usize, max: usize) -> Raised<()> {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    if given < min {
        return Err(Exception::type_error(format!(
            "{name}() expected at least {min} argument{}, got {given}",
            plural(min)
        )));
    }
    if given > max {
        return Err(Exception::type_error(format!(
            "{name}() expected at most {max} argument{}, got {given}",
            plural(max)
        )));
    }
    Ok(())
}

fn no_more_keywords(name: &str, kwargs: &[(String, Value)]) -> Raised<()> {
    match kwargs.first() {
        Some((keyword, _)) => Err(Exception::type_error(format!(
            "'{keyword}' is an invalid keyword argument for {name}()"
        ))),
        None => Ok(()),
    }
}

/// A `str` keyword argument, where `None` selects the default.
fn text_keyword(
    kwargs: &mut Vec<(String, Value)>,
    name: &str,
    default: &str,
) -> Raised<String> {
    match take_keyword(kwargs, name) {
        None | Some(Value::None) => Ok(default.to_string()),
        Some(Value::Str(text)) => Ok(text),
        Some(other) => Err(Exception::new(
            ErrorType::TypeError,
            format!("{name} must be None or a string, not {}", other.type_name()),
        )),
    }
}
