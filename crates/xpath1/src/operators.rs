//! Binary and unary operator evaluation.
//!
//! Comparisons follow the existential node-set semantics: both sides are
//! atomized and the comparison holds if any pair of atomics satisfies it,
//! with untyped atomics coerced numerically against numeric operands.

use crate::paths;
use std::cmp::Ordering;
use xpress_datatypes::{AtomicValue, Duration};
use xpress_engine::{DynamicContext, EngineError, Role, Token, Value};

/// One evaluator for every registered operator symbol; a symbol whose
/// instance resolved to name-test role falls through to the name semantics.
pub fn eval_binary(token: &Token, context: &mut DynamicContext) -> Result<Value, EngineError> {
    if token.role == Role::Name {
        return paths::eval_as_name(token, context);
    }
    match token.symbol() {
        "or" => {
            let left = token.operands[0].evaluate(context)?.effective_boolean_value()?;
            if left {
                return Ok(Value::from_bool(true));
            }
            let right = token.operands[1].evaluate(context)?.effective_boolean_value()?;
            Ok(Value::from_bool(right))
        }
        "and" => {
            let left = token.operands[0].evaluate(context)?.effective_boolean_value()?;
            if !left {
                return Ok(Value::from_bool(false));
            }
            let right = token.operands[1].evaluate(context)?.effective_boolean_value()?;
            Ok(Value::from_bool(right))
        }
        "=" => eval_comparison(token, context, |ord| ord == Ordering::Equal),
        "!=" => eval_comparison(token, context, |ord| ord != Ordering::Equal),
        "<" => eval_comparison(token, context, |ord| ord == Ordering::Less),
        "<=" => eval_comparison(token, context, |ord| ord != Ordering::Greater),
        ">" => eval_comparison(token, context, |ord| ord == Ordering::Greater),
        ">=" => eval_comparison(token, context, |ord| ord != Ordering::Less),
        "+" | "-" | "*" | "div" | "mod" => eval_arithmetic(token, context),
        "|" => eval_union(token, context),
        other => Err(EngineError::type_error(format!(
            "'{}' is not supported as an operator",
            other
        ))),
    }
}

fn eval_comparison<F>(
    token: &Token,
    context: &mut DynamicContext,
    predicate: F,
) -> Result<Value, EngineError>
where
    F: Fn(Ordering) -> bool,
{
    let left = token.operands[0].evaluate(context)?;
    let right = token.operands[1].evaluate(context)?;
    let left_atoms = context.atomize(&left);
    let right_atoms = context.atomize(&right);

    for l in &left_atoms {
        for r in &right_atoms {
            if let Some(ord) = compare_atomics(l, r)
                && predicate(ord)
            {
                return Ok(Value::from_bool(true));
            }
        }
    }
    Ok(Value::from_bool(false))
}

fn compare_atomics(left: &AtomicValue, right: &AtomicValue) -> Option<Ordering> {
    match (left, right) {
        (AtomicValue::UntypedAtomic(u), other) if other.is_numeric() => {
            u.trim().parse::<f64>().ok()?.partial_cmp(&other.to_double())
        }
        (other, AtomicValue::UntypedAtomic(u)) if other.is_numeric() => {
            other.to_double().partial_cmp(&u.trim().parse::<f64>().ok()?)
        }
        (AtomicValue::Boolean(a), other) => a.partial_cmp(&other.to_boolean()),
        (other, AtomicValue::Boolean(b)) => other.to_boolean().partial_cmp(b),
        _ => left.partial_cmp(right),
    }
}

fn eval_arithmetic(token: &Token, context: &mut DynamicContext) -> Result<Value, EngineError> {
    // Unary minus shares the '-' symbol class with subtraction.
    if token.arity() == 1 {
        let value = token.operands[0].evaluate(context)?;
        let operand = first_atom(context, &value);
        return Ok(Value::from_double(-to_number(operand.as_ref())));
    }

    let left_value = token.operands[0].evaluate(context)?;
    let right_value = token.operands[1].evaluate(context)?;
    let left = first_atom(context, &left_value);
    let right = first_atom(context, &right_value);

    // Duration arithmetic closes under addition and subtraction.
    if let (Some(l), Some(r)) = (
        left.as_ref().and_then(AtomicValue::as_duration),
        right.as_ref().and_then(AtomicValue::as_duration),
    ) {
        return eval_duration_arithmetic(token.symbol(), l, r);
    }

    let l = to_number(left.as_ref());
    let r = to_number(right.as_ref());
    let result = match token.symbol() {
        "+" => l + r,
        "-" => l - r,
        "*" => l * r,
        // IEEE semantics give the XPath results for zero divisors:
        // 0 div 0 is NaN, x div 0 is signed infinity, x mod 0 is NaN.
        "div" => l / r,
        _ => l % r,
    };
    Ok(Value::from_double(result))
}

fn eval_duration_arithmetic(
    symbol: &str,
    left: Duration,
    right: Duration,
) -> Result<Value, EngineError> {
    let result = match symbol {
        "+" => left + right,
        "-" => left - right,
        other => {
            return Err(EngineError::type_error(format!(
                "'{}' is not defined for durations",
                other
            )));
        }
    };
    Ok(Value::from_atomic(AtomicValue::Duration(result)))
}

fn eval_union(token: &Token, context: &mut DynamicContext) -> Result<Value, EngineError> {
    let left = token.operands[0].evaluate(context)?;
    let right = token.operands[1].evaluate(context)?;
    let mut nodes = paths::require_nodes(left, "the left side of '|'")?;
    nodes.extend(paths::require_nodes(right, "the right side of '|'")?);
    Ok(Value::from_nodes(paths::document_order(nodes)))
}

fn first_atom(context: &DynamicContext, value: &Value) -> Option<AtomicValue> {
    context.atomize(value).into_iter().next()
}

fn to_number(atom: Option<&AtomicValue>) -> f64 {
    atom.map(AtomicValue::to_double).unwrap_or(f64::NAN)
}
