//! Builtin procedures
//!
//! Builtins are plain function pointers kept in a static registry, so the
//! table is shared by every environment (and every session) without cloning.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::runtime::errors::{LispError, LispResult};
use crate::runtime::value::{Rational, Value};

/// Signature of a builtin procedure
pub type BuiltinFn = fn(&[Value]) -> LispResult<Value>;

/// A named builtin procedure
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl Builtin {
    pub fn call(
        &self,
        args: &[Value],
    ) -> LispResult<Value> {
        (self.func)(args)
    }
}

static BUILTINS: Lazy<IndexMap<&'static str, BuiltinFn>> = Lazy::new(|| {
    let table: [(&'static str, BuiltinFn); 20] = [
        // Basic math
        ("+", add),
        ("-", sub),
        ("*", mul),
        ("/", div),
        // Comparisons
        ("=", num_eq),
        ("<", lt),
        (">", gt),
        ("<=", lte),
        (">=", gte),
        ("eq?", eq),
        ("not", not),
        // Lists
        ("list", list),
        ("cons", cons),
        ("car", car),
        ("cdr", cdr),
        // Type checking
        ("null?", is_null),
        ("number?", is_number),
        ("symbol?", is_symbol),
        ("boolean?", is_boolean),
        ("procedure?", is_procedure),
    ];
    table.into_iter().collect()
});

/// Every builtin, in registration order
pub fn all() -> impl Iterator<Item = Builtin> {
    BUILTINS
        .iter()
        .map(|(name, func)| Builtin { name: *name, func: *func })
}

/// Builtin names, in registration order
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.keys().copied()
}

fn check_arity(
    name: &str,
    args: &[Value],
    min: usize,
    max: Option<usize>,
) -> LispResult<()> {
    let got = args.len();
    if got >= min && max.map_or(true, |max| got <= max) {
        return Ok(());
    }
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    };
    Err(LispError::Arity {
        name: name.to_string(),
        expected,
        got,
    })
}

fn number(value: &Value) -> LispResult<Rational> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(LispError::type_error("a number", other)),
    }
}

fn numbers(args: &[Value]) -> LispResult<Vec<Rational>> {
    args.iter().map(number).collect()
}

/*
 *    Basic math
 */

fn add(args: &[Value]) -> LispResult<Value> {
    let mut result = Rational::ZERO;
    for n in numbers(args)? {
        result = result.checked_add(n).ok_or(LispError::Overflow)?;
    }
    Ok(Value::Number(result))
}

fn sub(args: &[Value]) -> LispResult<Value> {
    check_arity("-", args, 1, None)?;
    let nums = numbers(args)?;
    if nums.len() == 1 {
        return nums[0]
            .checked_neg()
            .map(Value::Number)
            .ok_or(LispError::Overflow);
    }
    let mut result = nums[0];
    for n in &nums[1..] {
        result = result.checked_sub(*n).ok_or(LispError::Overflow)?;
    }
    Ok(Value::Number(result))
}

fn mul(args: &[Value]) -> LispResult<Value> {
    let mut result = Rational::ONE;
    for n in numbers(args)? {
        result = result.checked_mul(n).ok_or(LispError::Overflow)?;
    }
    Ok(Value::Number(result))
}

fn div(args: &[Value]) -> LispResult<Value> {
    check_arity("/", args, 1, None)?;
    let nums = numbers(args)?;
    let (mut result, divisors) = if nums.len() == 1 {
        (Rational::ONE, &nums[..])
    } else {
        (nums[0], &nums[1..])
    };
    for d in divisors {
        if d.is_zero() {
            return Err(LispError::DivisionByZero);
        }
        result = result.checked_div(*d).ok_or(LispError::Overflow)?;
    }
    Ok(Value::Number(result))
}

/*
 *    Comparison
 */

fn compare_chain(
    name: &str,
    args: &[Value],
    holds: fn(&Rational, &Rational) -> bool,
) -> LispResult<Value> {
    check_arity(name, args, 1, None)?;
    let nums = numbers(args)?;
    Ok(Value::Bool(nums.windows(2).all(|w| holds(&w[0], &w[1]))))
}

fn num_eq(args: &[Value]) -> LispResult<Value> {
    compare_chain("=", args, |a, b| a == b)
}

fn lt(args: &[Value]) -> LispResult<Value> {
    compare_chain("<", args, |a, b| a < b)
}

fn gt(args: &[Value]) -> LispResult<Value> {
    compare_chain(">", args, |a, b| a > b)
}

fn lte(args: &[Value]) -> LispResult<Value> {
    compare_chain("<=", args, |a, b| a <= b)
}

fn gte(args: &[Value]) -> LispResult<Value> {
    compare_chain(">=", args, |a, b| a >= b)
}

fn eq(args: &[Value]) -> LispResult<Value> {
    check_arity("eq?", args, 2, Some(2))?;
    Ok(Value::Bool(args[0] == args[1]))
}

fn not(args: &[Value]) -> LispResult<Value> {
    check_arity("not", args, 1, Some(1))?;
    Ok(Value::Bool(!args[0].is_truthy()))
}

/*
 *    Lists
 */

fn list(args: &[Value]) -> LispResult<Value> {
    Ok(Value::List(args.to_vec()))
}

fn cons(args: &[Value]) -> LispResult<Value> {
    check_arity("cons", args, 2, Some(2))?;
    let head = args[0].clone();
    Ok(match &args[1] {
        Value::Nil => Value::List(vec![head]),
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len() + 1);
            out.push(head);
            out.extend(items.iter().cloned());
            Value::List(out)
        }
        Value::Dotted(items, tail) => {
            let mut out = vec![head];
            out.extend(items.iter().cloned());
            Value::Dotted(out, tail.clone())
        }
        other => Value::Dotted(vec![head], Box::new(other.clone())),
    })
}

fn car(args: &[Value]) -> LispResult<Value> {
    check_arity("car", args, 1, Some(1))?;
    match &args[0] {
        Value::List(items) => items.first().cloned().ok_or(LispError::EmptyList("car")),
        Value::Dotted(items, _) => items.first().cloned().ok_or(LispError::EmptyList("car")),
        Value::Nil => Err(LispError::EmptyList("car")),
        other => Err(LispError::type_error("a list", other)),
    }
}

fn cdr(args: &[Value]) -> LispResult<Value> {
    check_arity("cdr", args, 1, Some(1))?;
    match &args[0] {
        Value::List(items) if items.is_empty() => Err(LispError::EmptyList("cdr")),
        Value::List(items) => Ok(Value::List(items[1..].to_vec())),
        Value::Dotted(items, tail) if items.len() == 1 => Ok((**tail).clone()),
        Value::Dotted(items, tail) => Ok(Value::Dotted(items[1..].to_vec(), tail.clone())),
        Value::Nil => Err(LispError::EmptyList("cdr")),
        other => Err(LispError::type_error("a list", other)),
    }
}

/*
 *    Type checking
 */

fn is_null(args: &[Value]) -> LispResult<Value> {
    check_arity("null?", args, 1, Some(1))?;
    Ok(Value::Bool(match &args[0] {
        Value::Nil => true,
        Value::List(items) => items.is_empty(),
        _ => false,
    }))
}

fn is_number(args: &[Value]) -> LispResult<Value> {
    check_arity("number?", args, 1, Some(1))?;
    Ok(Value::Bool(matches!(args[0], Value::Number(_))))
}

fn is_symbol(args: &[Value]) -> LispResult<Value> {
    check_arity("symbol?", args, 1, Some(1))?;
    Ok(Value::Bool(matches!(args[0], Value::Symbol(_))))
}

fn is_boolean(args: &[Value]) -> LispResult<Value> {
    check_arity("boolean?", args, 1, Some(1))?;
    Ok(Value::Bool(matches!(args[0], Value::Bool(_))))
}

fn is_procedure(args: &[Value]) -> LispResult<Value> {
    check_arity("procedure?", args, 1, Some(1))?;
    Ok(Value::Bool(args[0].is_procedure()))
}
