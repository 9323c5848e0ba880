//! The XPath 1.0 core function library.
//!
//! Every function symbol shares one dispatching evaluator; arity is checked
//! at call time, and a function name used without parentheses falls through
//! to name-test semantics like any other multi-role symbol.

use crate::paths;
use xpress_engine::{DynamicContext, EngineError, Item, Parser, Role, Token, Value};
use xpress_nodes::NodeId;

/// The names this grammar registers as function symbols.
pub const FUNCTION_NAMES: &[&str] = &[
    "position",
    "last",
    "count",
    "not",
    "true",
    "false",
    "boolean",
    "string",
    "string-length",
    "concat",
    "contains",
    "starts-with",
    "substring",
    "substring-before",
    "substring-after",
    "normalize-space",
    "translate",
    "number",
    "sum",
    "floor",
    "ceiling",
    "round",
    "name",
    "local-name",
];

/// A function name followed by `(` parses its comma-separated arguments;
/// without the parentheses it is an element name.
pub fn nud_function(parser: &mut Parser<'_>, mut token: Token) -> Result<Token, EngineError> {
    if !parser.lookahead_is("(") {
        return paths::into_name(token);
    }
    parser.advance_expected(&["("])?;
    token.role = Role::Function;
    if !parser.lookahead_is(")") {
        loop {
            token.operands.push(parser.expression(0)?);
            if parser.lookahead_is(",") {
                parser.advance_expected(&[","])?;
            } else {
                break;
            }
        }
    }
    parser.advance_expected(&[")"])?;
    Ok(token)
}

pub fn eval_function_call(token: &Token, context: &mut DynamicContext) -> Result<Value, EngineError> {
    if token.role == Role::Name {
        return paths::eval_as_name(token, context);
    }
    let name = token.symbol().to_string();
    let args: Vec<Value> = token
        .operands
        .iter()
        .map(|op| op.evaluate(context))
        .collect::<Result<_, _>>()?;

    match name.as_str() {
        "position" => {
            arity(&name, &args, 0, 0)?;
            Ok(Value::from_integer(context.position as i64))
        }
        "last" => {
            arity(&name, &args, 0, 0)?;
            Ok(Value::from_integer(context.size as i64))
        }
        "count" => {
            arity(&name, &args, 1, 1)?;
            Ok(Value::from_integer(args[0].len() as i64))
        }
        "true" => {
            arity(&name, &args, 0, 0)?;
            Ok(Value::from_bool(true))
        }
        "false" => {
            arity(&name, &args, 0, 0)?;
            Ok(Value::from_bool(false))
        }
        "not" => {
            arity(&name, &args, 1, 1)?;
            Ok(Value::from_bool(!args[0].effective_boolean_value()?))
        }
        "boolean" => {
            arity(&name, &args, 1, 1)?;
            Ok(Value::from_bool(args[0].effective_boolean_value()?))
        }
        "string" => {
            arity(&name, &args, 0, 1)?;
            Ok(Value::from_string(string_or_context(context, &args)))
        }
        "string-length" => {
            arity(&name, &args, 0, 1)?;
            let s = string_or_context(context, &args);
            Ok(Value::from_integer(s.chars().count() as i64))
        }
        "concat" => {
            arity(&name, &args, 2, usize::MAX)?;
            let joined: String = args.iter().map(|a| string_of(context, a)).collect();
            Ok(Value::from_string(joined))
        }
        "contains" => {
            arity(&name, &args, 2, 2)?;
            let haystack = string_of(context, &args[0]);
            let needle = string_of(context, &args[1]);
            Ok(Value::from_bool(haystack.contains(&needle)))
        }
        "starts-with" => {
            arity(&name, &args, 2, 2)?;
            let s = string_of(context, &args[0]);
            let prefix = string_of(context, &args[1]);
            Ok(Value::from_bool(s.starts_with(&prefix)))
        }
        "substring" => {
            arity(&name, &args, 2, 3)?;
            let s = string_of(context, &args[0]);
            let start = number_of(context, &args[1]);
            let length = args.get(2).map(|a| number_of(context, a));
            Ok(Value::from_string(substring(&s, start, length)))
        }
        "substring-before" => {
            arity(&name, &args, 2, 2)?;
            let s = string_of(context, &args[0]);
            let sep = string_of(context, &args[1]);
            let result = s.find(&sep).map(|i| &s[..i]).unwrap_or("");
            Ok(Value::from_string(result))
        }
        "substring-after" => {
            arity(&name, &args, 2, 2)?;
            let s = string_of(context, &args[0]);
            let sep = string_of(context, &args[1]);
            let result = s.find(&sep).map(|i| &s[i + sep.len()..]).unwrap_or("");
            Ok(Value::from_string(result))
        }
        "normalize-space" => {
            arity(&name, &args, 0, 1)?;
            let s = string_or_context(context, &args);
            Ok(Value::from_string(
                s.split_whitespace().collect::<Vec<_>>().join(" "),
            ))
        }
        "translate" => {
            arity(&name, &args, 3, 3)?;
            let s = string_of(context, &args[0]);
            let from: Vec<char> = string_of(context, &args[1]).chars().collect();
            let to: Vec<char> = string_of(context, &args[2]).chars().collect();
            let out: String = s
                .chars()
                .filter_map(|c| match from.iter().position(|&f| f == c) {
                    Some(i) => to.get(i).copied(),
                    None => Some(c),
                })
                .collect();
            Ok(Value::from_string(out))
        }
        "number" => {
            arity(&name, &args, 0, 1)?;
            let n = match args.first() {
                Some(v) => number_of(context, v),
                None => {
                    let item = context_item(context);
                    context.item_string(&item).trim().parse().unwrap_or(f64::NAN)
                }
            };
            Ok(Value::from_double(n))
        }
        "sum" => {
            arity(&name, &args, 1, 1)?;
            let total: f64 = context
                .atomize(&args[0])
                .iter()
                .map(|a| a.to_double())
                .sum();
            Ok(Value::from_double(total))
        }
        "floor" => {
            arity(&name, &args, 1, 1)?;
            Ok(Value::from_double(number_of(context, &args[0]).floor()))
        }
        "ceiling" => {
            arity(&name, &args, 1, 1)?;
            Ok(Value::from_double(number_of(context, &args[0]).ceil()))
        }
        "round" => {
            arity(&name, &args, 1, 1)?;
            Ok(Value::from_double(xpath_round(number_of(context, &args[0]))))
        }
        "name" => {
            arity(&name, &args, 0, 1)?;
            let node = optional_node_arg(context, &args, &name)?;
            let result = node
                .and_then(|id| context.document().name(id).map(|q| q.to_string()))
                .unwrap_or_default();
            Ok(Value::from_string(result))
        }
        "local-name" => {
            arity(&name, &args, 0, 1)?;
            let node = optional_node_arg(context, &args, &name)?;
            let result = node
                .and_then(|id| context.document().name(id).map(|q| q.local.clone()))
                .unwrap_or_default();
            Ok(Value::from_string(result))
        }
        other => Err(EngineError::name(format!("unknown function '{}'", other))),
    }
}

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), EngineError> {
    if args.len() < min || args.len() > max {
        return Err(EngineError::type_error(format!(
            "{}() called with {} argument(s)",
            name,
            args.len()
        )));
    }
    Ok(())
}

fn context_item(context: &DynamicContext) -> Item {
    context
        .item
        .clone()
        .unwrap_or(Item::Node(context.document().root()))
}

fn string_of(context: &DynamicContext, value: &Value) -> String {
    context
        .atomize(value)
        .first()
        .map(|a| a.to_string_value())
        .unwrap_or_default()
}

fn string_or_context(context: &DynamicContext, args: &[Value]) -> String {
    match args.first() {
        Some(v) => string_of(context, v),
        None => {
            let item = context_item(context);
            context.item_string(&item)
        }
    }
}

fn number_of(context: &DynamicContext, value: &Value) -> f64 {
    context
        .atomize(value)
        .first()
        .map(|a| a.to_double())
        .unwrap_or(f64::NAN)
}

/// The argument node of the node-name functions: the first node of the
/// argument sequence, or the context node when no argument is given.
fn optional_node_arg(
    context: &DynamicContext,
    args: &[Value],
    name: &str,
) -> Result<Option<NodeId>, EngineError> {
    match args.first() {
        None => Ok(Some(context.context_node()?)),
        Some(v) if v.is_node_sequence() => Ok(v.nodes().first().copied()),
        Some(_) => Err(EngineError::type_error(format!(
            "{}() requires a node-set argument",
            name
        ))),
    }
}

/// XPath rounding: half rounds toward positive infinity.
fn xpath_round(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// 1-based character selection with XPath's rounding-based semantics; NaN
/// bounds select nothing.
fn substring(s: &str, start: f64, length: Option<f64>) -> String {
    let start = xpath_round(start);
    let end = length.map(|l| start + xpath_round(l));
    s.chars()
        .enumerate()
        .filter(|(i, _)| {
            let position = (*i + 1) as f64;
            position >= start && end.is_none_or(|e| position < e)
        })
        .map(|(_, c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_rounding() {
        assert_eq!(substring("12345", 2.0, Some(3.0)), "234");
        assert_eq!(substring("12345", 1.5, Some(2.6)), "234");
        assert_eq!(substring("12345", 0.0, Some(3.0)), "12");
        assert_eq!(substring("12345", f64::NAN, None), "");
        assert_eq!(substring("12345", -42.0, Some(f64::INFINITY)), "12345");
        assert_eq!(substring("12345", 3.0, None), "345");
    }

    #[test]
    fn test_xpath_round_halves_go_up() {
        assert_eq!(xpath_round(2.5), 3.0);
        assert_eq!(xpath_round(-2.5), -2.0);
        assert_eq!(xpath_round(2.4), 2.0);
        assert!(xpath_round(f64::NAN).is_nan());
    }
}
