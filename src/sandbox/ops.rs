//! Operators, comparisons, iteration and indexing over [`Value`]s.

// Index arithmetic converts between usize and i64 within checked bounds
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]

use super::exception::{ErrorType, Exception, Raised};
use crate::lang::{BinOp, CmpOp, UnaryOp};
use crate::value::{Value, compare_int_float};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

/// Numeric view of a value. Booleans take part in arithmetic as 0 and 1.
fn number(value: &Value) -> Option<Num> {
    match value {
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

/// Integer view of a value used as an index or count.
pub(super) fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Int(i) => Some(*i),
        _ => None,
    }
}

/// Resolve a possibly negative index against `len`.
pub(super) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { index + len } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

/// Elements copied or visited per unit of fuel.
const ELEMENTS_PER_FUEL: usize = 64;

/// Deepest nesting of containers a run may build.
pub(super) const MAX_VALUE_DEPTH: usize = 100;

/// Size and shape of a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct Extent {
    /// Items of every nested container plus the bytes of every string.
    pub(super) len: usize,
    /// Containers on the longest path from the root, the root included.
    pub(super) depth: usize,
}

pub(super) fn extent(value: &Value) -> Extent {
    let mut extent = Extent::default();
    let mut pending = vec![(value, 1usize)];
    while let Some((value, level)) = pending.pop() {
        match value {
            Value::Str(s) => extent.len = extent.len.saturating_add(s.len()),
            Value::List(items) | Value::Tuple(items) => {
                extent.len = extent.len.saturating_add(items.len());
                extent.depth = extent.depth.max(level);
                pending.extend(items.iter().map(|item| (item, level + 1)));
            }
            Value::Dict(dict) => {
                extent.len = extent.len.saturating_add(dict.len());
                extent.depth = extent.depth.max(level);
                pending.extend(dict.keys().map(|key| (key, level + 1)));
                pending.extend(dict.values().map(|item| (item, level + 1)));
            }
            _ => {}
        }
    }
    extent
}

/// Elements reachable from `value`: items of every nested container plus the
/// bytes of every string.
pub(super) fn nested_len(value: &Value) -> usize {
    extent(value).len
}

/// Whether `value` holds no elements of its own, so storing it adds exactly
/// one element and no depth.
pub(super) fn is_scalar(value: &Value) -> bool {
    !matches!(
        value,
        Value::Str(_) | Value::List(_) | Value::Tuple(_) | Value::Dict(_)
    )
}

/// Reject a value larger than `max_len` nested elements or nested deeper
/// than [`MAX_VALUE_DEPTH`].
pub(super) fn check_extent(extent: Extent, max_len: usize) -> Raised<()> {
    check_len(extent.len, max_len)?;
    if extent.depth > MAX_VALUE_DEPTH {
        return Err(Exception::new(
            ErrorType::RecursionError,
            format!("values may nest at most {MAX_VALUE_DEPTH} containers deep"),
        ));
    }
    Ok(())
}

/// Nested elements held by a list: the items plus everything inside them.
pub(super) fn held_len(items: &[Value]) -> usize {
    items
        .iter()
        .fold(items.len(), |total, item| total.saturating_add(nested_len(item)))
}

/// Reject adding `value` to a list whose current items are `items`. A scalar
/// is checked against the top level alone, which keeps appends constant-time.
pub(super) fn check_store(items: &[Value], value: &Value, max_len: usize) -> Raised<()> {
    if is_scalar(value) {
        return check_len(items.len().saturating_add(1), max_len);
    }
    let inner = extent(value);
    check_extent(
        Extent {
            len: held_len(items).saturating_add(1).saturating_add(inner.len),
            depth: inner.depth + 1,
        },
        max_len,
    )
}

/// Fuel charged for producing or visiting `len` elements.
pub(super) fn element_cost(len: usize) -> u64 {
    (len / ELEMENTS_PER_FUEL) as u64
}

/// Fuel charged for copying `value`.
pub(super) fn copy_cost(value: &Value) -> u64 {
    element_cost(nested_len(value))
}

/// Fuel charged for an operation that walks the top level of `value`.
pub(super) fn scan_cost(value: &Value) -> u64 {
    let len = match value {
        Value::Str(s) => s.len(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Dict(dict) => dict.len(),
        _ => 0,
    };
    element_cost(len)
}

pub(super) fn memory_error(len: usize) -> Exception {
    Exception::new(
        ErrorType::MemoryError,
        format!("result would hold more than {len} items"),
    )
}

/// Apply an arithmetic operator.
pub(super) fn binary(op: BinOp, left: &Value, right: &Value, max_len: usize) -> Raised<Value> {
    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => {
            check_len(a.len() + b.len(), max_len)?;
            Ok(Value::Str(format!("{a}{b}")))
        }
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            check_len(nested_len(left).saturating_add(nested_len(right)), max_len)?;
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            check_len(nested_len(left).saturating_add(nested_len(right)), max_len)?;
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (BinOp::Mul, Value::Str(s), n) | (BinOp::Mul, n, Value::Str(s)) if as_int(n).is_some() => {
            let count = repeat_count(n, s.chars().count(), max_len)?;
            Ok(Value::Str(s.repeat(count)))
        }
        (BinOp::Mul, seq @ Value::List(items), n) | (BinOp::Mul, n, seq @ Value::List(items))
            if as_int(n).is_some() =>
        {
            let count = repeat_count(n, nested_len(seq), max_len)?;
            Ok(Value::List(repeat(items, count)))
        }
        (BinOp::Mul, seq @ Value::Tuple(items), n) | (BinOp::Mul, n, seq @ Value::Tuple(items))
            if as_int(n).is_some() =>
        {
            let count = repeat_count(n, nested_len(seq), max_len)?;
            Ok(Value::Tuple(repeat(items, count)))
        }
        _ => numeric(op, left, right),
    }
}

pub(super) fn check_len(len: usize, max_len: usize) -> Raised<()> {
    if len > max_len {
        Err(memory_error(max_len))
    } else {
        Ok(())
    }
}

fn repeat_count(n: &Value, item_len: usize, max_len: usize) -> Raised<usize> {
    let count = as_int(n).unwrap_or(0).max(0);
    let count = usize::try_from(count).map_err(|_| memory_error(max_len))?;
    let total = item_len.checked_mul(count).ok_or_else(|| memory_error(max_len))?;
    check_len(total, max_len)?;
    Ok(count)
}

fn repeat(items: &[Value], count: usize) -> Vec<Value> {
    if items.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend_from_slice(items);
    }
    out
}

fn numeric(op: BinOp, left: &Value, right: &Value) -> Raised<Value> {
    let (Some(a), Some(b)) = (number(left), number(right)) else {
        return Err(Exception::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )));
    };
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => int_op(op, x, y),
        (x, y) => float_op(op, x.as_f64(), y.as_f64()),
    }
}

fn int_op(op: BinOp, x: i64, y: i64) -> Raised<Value> {
    let overflow = Exception::overflow;
    match op {
        BinOp::Add => x.checked_add(y).map(Value::Int).ok_or_else(overflow),
        BinOp::Sub => x.checked_sub(y).map(Value::Int).ok_or_else(overflow),
        BinOp::Mul => x.checked_mul(y).map(Value::Int).ok_or_else(overflow),
        BinOp::Div => {
            if y == 0 {
                return Err(Exception::zero_division("division by zero"));
            }
            Ok(Value::Float(x as f64 / y as f64))
        }
        BinOp::FloorDiv => {
            if y == 0 {
                return Err(Exception::zero_division("integer division or modulo by zero"));
            }
            let q = x.checked_div(y).ok_or_else(overflow)?;
            let adjust = x % y != 0 && ((x < 0) != (y < 0));
            Ok(Value::Int(if adjust { q - 1 } else { q }))
        }
        BinOp::Mod => {
            if y == 0 {
                return Err(Exception::zero_division("integer division or modulo by zero"));
            }
            let r = x.checked_rem(y).unwrap_or(0);
            let adjust = r != 0 && ((r < 0) != (y < 0));
            Ok(Value::Int(if adjust { r + y } else { r }))
        }
        BinOp::Pow => {
            if y >= 0 {
                let exp = u32::try_from(y).map_err(|_| overflow())?;
                x.checked_pow(exp).map(Value::Int).ok_or_else(overflow)
            } else {
                float_op(op, x as f64, y as f64)
            }
        }
    }
}

fn float_op(op: BinOp, x: f64, y: f64) -> Raised<Value> {
    let result = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div => {
            if y == 0.0 {
                return Err(Exception::zero_division("float division by zero"));
            }
            x / y
        }
        BinOp::FloorDiv => {
            if y == 0.0 {
                return Err(Exception::zero_division("float floor division by zero"));
            }
            (x / y).floor()
        }
        BinOp::Mod => {
            if y == 0.0 {
                return Err(Exception::zero_division("float modulo"));
            }
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
                r + y
            } else {
                r
            }
        }
        BinOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(Exception::zero_division(
                    "0.0 cannot be raised to a negative power",
                ));
            }
            if x < 0.0 && y.fract() != 0.0 {
                return Err(Exception::value_error(
                    "negative number cannot be raised to a fractional power",
                ));
            }
            x.powf(y)
        }
    };
    Ok(Value::Float(result))
}

/// Apply a prefix operator.
pub(super) fn unary(op: UnaryOp, operand: &Value) -> Raised<Value> {
    match (op, number(operand)) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!operand.is_truthy())),
        (UnaryOp::Neg, Some(Num::Int(i))) => {
            i.checked_neg().map(Value::Int).ok_or_else(Exception::overflow)
        }
        (UnaryOp::Neg, Some(Num::Float(f))) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Some(Num::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Num::Float(f))) => Ok(Value::Float(f)),
        (UnaryOp::Neg | UnaryOp::Pos, None) => {
            let symbol = if op == UnaryOp::Neg { "-" } else { "+" };
            Err(Exception::type_error(format!(
                "bad operand type for unary {symbol}: '{}'",
                operand.type_name()
            )))
        }
    }
}

/// Evaluate one comparison link.
pub(super) fn compare(op: CmpOp, left: &Value, right: &Value) -> Raised<bool> {
    match op {
        CmpOp::Eq => Ok(left == right),
        CmpOp::NotEq => Ok(left != right),
        CmpOp::Lt => Ok(ordering(op, left, right)? == Some(Ordering::Less)),
        CmpOp::LtE => Ok(matches!(
            ordering(op, left, right)?,
            Some(Ordering::Less | Ordering::Equal)
        )),
        CmpOp::Gt => Ok(ordering(op, left, right)? == Some(Ordering::Greater)),
        CmpOp::GtE => Ok(matches!(
            ordering(op, left, right)?,
            Some(Ordering::Greater | Ordering::Equal)
        )),
        CmpOp::In => contains(right, left),
        CmpOp::NotIn => contains(right, left).map(|found| !found),
        CmpOp::Is => Ok(identical(left, right)),
        CmpOp::IsNot => Ok(!identical(left, right)),
    }
}

fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Function(_), Value::Function(_)) | (Value::Builtin(_), Value::Builtin(_)) => {
            left == right
        }
        _ => false,
    }
}

/// Order two values; `None` when unordered (NaN).
///
/// `op` only feeds the error message.
pub(super) fn ordering(op: CmpOp, left: &Value, right: &Value) -> Raised<Option<Ordering>> {
    if let (Some(a), Some(b)) = (number(left), number(right)) {
        return Ok(match (a, b) {
            (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
            (Num::Int(x), Num::Float(y)) => compare_int_float(x, y),
            (Num::Float(x), Num::Int(y)) => compare_int_float(y, x).map(Ordering::reverse),
            (Num::Float(x), Num::Float(y)) => x.partial_cmp(&y),
        });
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b) {
                if x != y {
                    return ordering(op, x, y);
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => Err(Exception::type_error(format!(
            "'{}' not supported between instances of '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn contains(container: &Value, item: &Value) -> Raised<bool> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(Exception::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) | Value::Tuple(items) => Ok(items.contains(item)),
        Value::Dict(dict) => {
            check_hashable(item)?;
            Ok(dict.get(item).is_some())
        }
        other => Err(Exception::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

pub(super) fn check_hashable(key: &Value) -> Raised<()> {
    if key.is_hashable() {
        Ok(())
    } else {
        Err(Exception::type_error(format!(
            "unhashable type: '{}'",
            key.type_name()
        )))
    }
}

/// Materialize the items a `for` loop or capability iterates over.
pub(super) fn iterate(value: &Value) -> Raised<Vec<Value>> {
    match value {
        Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Dict(dict) => Ok(dict.keys().cloned().collect()),
        other => Err(Exception::type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

/// `object[index]`.
pub(super) fn index(object: &Value, index: &Value) -> Raised<Value> {
    match object {
        Value::List(items) | Value::Tuple(items) => {
            let position = sequence_position(object.type_name(), index, items.len())?;
            Ok(items[position].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let position = sequence_position("str", index, chars.len())?;
            Ok(Value::Str(chars[position].to_string()))
        }
        Value::Dict(dict) => {
            check_hashable(index)?;
            dict.get(index)
                .cloned()
                .ok_or_else(|| Exception::new(ErrorType::KeyError, index.repr()))
        }
        other => Err(Exception::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Resolve `index` into a position of a sequence of `len` items.
pub(super) fn sequence_position(kind: &str, index: &Value, len: usize) -> Raised<usize> {
    let Some(i) = as_int(index) else {
        return Err(Exception::type_error(format!(
            "{kind} indices must be integers, not {}",
            index.type_name()
        )));
    };
    let noun = if kind == "str" { "string" } else { kind };
    normalize_index(i, len)
        .ok_or_else(|| Exception::new(ErrorType::IndexError, format!("{noun} index out of range")))
}

/// `object[lower:upper:step]`.
pub(super) fn slice(
    object: &Value,
    lower: &Value,
    upper: &Value,
    step: &Value,
) -> Raised<Value> {
    let bound = |v: &Value| -> Raised<Option<i64>> {
        match v {
            Value::None => Ok(None),
            other => as_int(other).map(Some).ok_or_else(|| {
                Exception::type_error(
                    "slice indices must be integers or None".to_string(),
                )
            }),
        }
    };
    let step = bound(step)?.unwrap_or(1);
    if step == 0 {
        return Err(Exception::value_error("slice step cannot be zero"));
    }
    let (lower, upper) = (bound(lower)?, bound(upper)?);

    match object {
        Value::List(items) => Ok(Value::List(pick(items, lower, upper, step))),
        Value::Tuple(items) => Ok(Value::Tuple(pick(items, lower, upper, step))),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let picked: String = slice_positions(chars.len(), lower, upper, step)
                .into_iter()
                .map(|i| chars[i])
                .collect();
            Ok(Value::Str(picked))
        }
        other => Err(Exception::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn pick(items: &[Value], lower: Option<i64>, upper: Option<i64>, step: i64) -> Vec<Value> {
    slice_positions(items.len(), lower, upper, step)
        .into_iter()
        .map(|i| items[i].clone())
        .collect()
}

/// Positions selected by a slice, clamped the forgiving way slices are.
fn slice_positions(len: usize, lower: Option<i64>, upper: Option<i64>, step: i64) -> Vec<usize> {
    let len = len as i64;
    let resolve = |v: i64, lo: i64, hi: i64| {
        let v = if v < 0 { v + len } else { v };
        v.clamp(lo, hi)
    };
    let (start, stop) = if step > 0 {
        (
            lower.map_or(0, |v| resolve(v, 0, len)),
            upper.map_or(len, |v| resolve(v, 0, len)),
        )
    } else {
        (
            lower.map_or(len - 1, |v| resolve(v, -1, len - 1)),
            upper.map_or(-1, |v| resolve(v, -1, len - 1)),
        )
    };

    let mut positions = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        positions.push(i as usize);
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::Int(i)
    }

    fn bin(op: BinOp, a: Value, b: Value) -> Raised<Value> {
        binary(op, &a, &b, 1_000)
    }

    #[test]
    fn test_floor_division_and_modulo_follow_floor_semantics() {
        assert_eq!(bin(BinOp::FloorDiv, int(7), int(2)).unwrap(), int(3));
        assert_eq!(bin(BinOp::FloorDiv, int(-7), int(2)).unwrap(), int(-4));
        assert_eq!(bin(BinOp::Mod, int(-7), int(3)).unwrap(), int(2));
        assert_eq!(bin(BinOp::Mod, int(7), int(-3)).unwrap(), int(-2));
    }

    #[test]
    fn test_true_division_yields_float() {
        assert_eq!(bin(BinOp::Div, int(7), int(2)).unwrap(), Value::Float(3.5));
        assert!(matches!(
            bin(BinOp::Div, int(4), int(2)).unwrap(),
            Value::Float(_)
        ));
    }

    #[test]
    fn test_division_by_zero() {
        let err = bin(BinOp::Div, int(1), int(0)).unwrap_err();
        assert_eq!(err.kind, ErrorType::ZeroDivisionError);
        let err = bin(BinOp::Mod, int(1), int(0)).unwrap_err();
        assert_eq!(err.kind, ErrorType::ZeroDivisionError);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let err = bin(BinOp::Mul, int(i64::MAX), int(2)).unwrap_err();
        assert_eq!(err.kind, ErrorType::OverflowError);
        let err = bin(BinOp::Pow, int(10), int(40)).unwrap_err();
        assert_eq!(err.kind, ErrorType::OverflowError);
    }

    #[test]
    fn test_power() {
        assert_eq!(bin(BinOp::Pow, int(2), int(10)).unwrap(), int(1024));
        assert_eq!(bin(BinOp::Pow, int(2), int(-1)).unwrap(), Value::Float(0.5));
    }

    #[test]
    fn test_bool_arithmetic_counts_as_int() {
        assert_eq!(bin(BinOp::Add, Value::Bool(true), int(1)).unwrap(), int(2));
    }

    #[test]
    fn test_string_and_list_operators() {
        assert_eq!(
            bin(BinOp::Add, Value::Str("ab".into()), Value::Str("cd".into())).unwrap(),
            Value::Str("abcd".into())
        );
        assert_eq!(
            bin(BinOp::Mul, Value::Str("ab".into()), int(3)).unwrap(),
            Value::Str("ababab".into())
        );
        assert_eq!(
            bin(BinOp::Mul, int(2), Value::List(vec![int(0)])).unwrap(),
            Value::List(vec![int(0), int(0)])
        );
    }

    #[test]
    fn test_mixed_types_rejected() {
        let err = bin(BinOp::Add, int(1), Value::Str("a".into())).unwrap_err();
        assert_eq!(err.kind, ErrorType::TypeError);
        assert!(err.message.contains("'int' and 'str'"));
    }

    #[test]
    fn test_nested_len_counts_items_and_bytes() {
        let inner = Value::List(vec![int(1), Value::Str("abc".into())]);
        assert_eq!(nested_len(&inner), 5);
        let outer = Value::Tuple(vec![inner.clone(), inner]);
        assert_eq!(nested_len(&outer), 12);
        assert_eq!(copy_cost(&outer), 0);
        assert_eq!(scan_cost(&Value::Str("x".repeat(130))), 2);
    }

    #[test]
    fn test_extent_depth_and_store_checks() {
        assert_eq!(extent(&int(1)), Extent::default());
        let row = Value::List(vec![int(1), int(2)]);
        let grid = Value::List(vec![row.clone(), row.clone()]);
        assert_eq!(extent(&grid), Extent { len: 6, depth: 2 });

        let items = vec![int(0); 5];
        assert!(check_store(&items, &int(9), 6).is_ok());
        assert!(check_store(&items, &int(9), 5).is_err());
        assert!(check_store(&items, &row, 8).is_ok());
        let err = check_store(&items, &row, 7).unwrap_err();
        assert_eq!(err.kind, ErrorType::MemoryError);

        let mut deep = Value::List(Vec::new());
        for _ in 0..MAX_VALUE_DEPTH - 1 {
            deep = Value::List(vec![deep]);
        }
        assert_eq!(extent(&deep).depth, MAX_VALUE_DEPTH);
        let err = check_store(&[], &deep, usize::MAX).unwrap_err();
        assert_eq!(err.kind, ErrorType::RecursionError);
    }

    #[test]
    fn test_nested_repetition_is_bounded() {
        let row = Value::List(vec![int(0); 1_000]);
        let err = bin(BinOp::Mul, Value::List(vec![row]), int(1_000)).unwrap_err();
        assert_eq!(err.kind, ErrorType::MemoryError);
        let empty = bin(BinOp::Mul, Value::List(Vec::new()), int(i64::MAX)).unwrap();
        assert_eq!(empty, Value::List(Vec::new()));
    }

    #[test]
    fn test_repetition_is_bounded() {
        let err = bin(BinOp::Mul, Value::List(vec![int(1)]), int(1_000_000)).unwrap_err();
        assert_eq!(err.kind, ErrorType::MemoryError);
    }

    #[test]
    fn test_comparisons() {
        assert!(compare(CmpOp::Lt, &int(1), &Value::Float(1.5)).unwrap());
        let two_53 = Value::Float(9_007_199_254_740_992.0);
        assert!(compare(CmpOp::Gt, &int((1 << 53) + 1), &two_53).unwrap());
        assert!(compare(CmpOp::Lt, &two_53, &int((1 << 53) + 1)).unwrap());
        assert!(compare(CmpOp::In, &int(2), &Value::List(vec![int(1), int(2)])).unwrap());
        assert!(compare(CmpOp::In, &Value::Str("el".into()), &Value::Str("hello".into())).unwrap());
        assert!(compare(CmpOp::Is, &Value::None, &Value::None).unwrap());
        assert!(!compare(CmpOp::Eq, &Value::Bool(true), &int(1)).unwrap());
        assert!(compare(CmpOp::Lt, &int(1), &Value::Str("a".into())).is_err());
    }

    #[test]
    fn test_sequence_ordering_is_lexicographic() {
        let a = Value::List(vec![int(1), int(2)]);
        let b = Value::List(vec![int(1), int(3)]);
        assert!(compare(CmpOp::Lt, &a, &b).unwrap());
        let shorter = Value::List(vec![int(1)]);
        assert!(compare(CmpOp::Lt, &shorter, &a).unwrap());
    }

    #[test]
    fn test_indexing() {
        let list = Value::List(vec![int(10), int(20), int(30)]);
        assert_eq!(index(&list, &int(-1)).unwrap(), int(30));
        let err = index(&list, &int(3)).unwrap_err();
        assert_eq!(err.kind, ErrorType::IndexError);
        assert_eq!(err.message, "list index out of range");
        assert_eq!(
            index(&Value::Str("abc".into()), &int(1)).unwrap(),
            Value::Str("b".into())
        );
    }

    #[test]
    fn test_slices() {
        let list = Value::List((0..6).map(int).collect());
        let none = Value::None;
        assert_eq!(
            slice(&list, &int(1), &int(4), &none).unwrap(),
            Value::List(vec![int(1), int(2), int(3)])
        );
        assert_eq!(
            slice(&list, &none, &none, &int(-2)).unwrap(),
            Value::List(vec![int(5), int(3), int(1)])
        );
        assert_eq!(
            slice(&Value::Str("hello".into()), &none, &none, &int(-1)).unwrap(),
            Value::Str("olleh".into())
        );
        assert_eq!(
            slice(&list, &int(-2), &int(100), &none).unwrap(),
            Value::List(vec![int(4), int(5)])
        );
        assert!(slice(&list, &none, &none, &int(0)).is_err());
    }
}
