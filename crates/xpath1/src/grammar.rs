//! The registration sequence that builds the XPath 1.0 grammar, layer by
//! layer: literals, structural symbols, operators, paths, axes, kind tests
//! and the function library.

use crate::{functions, operators, paths};
use xpress_engine::parser::{led_infix, nud_literal};
use xpress_engine::{
    DECIMAL_LITERAL, DOUBLE_LITERAL, EngineError, Grammar, GrammarBuilder, INTEGER_LITERAL, NAME,
    Role, STRING_LITERAL,
};

/// The declared symbol set; [`build`] fails if any of these (or an axis or
/// function name) never receives a registry entry.
pub const SYMBOLS: &[&str] = &[
    STRING_LITERAL,
    INTEGER_LITERAL,
    DECIMAL_LITERAL,
    DOUBLE_LITERAL,
    NAME,
    "(",
    ")",
    "[",
    "]",
    ",",
    "::",
    ":",
    "$",
    "@",
    "or",
    "and",
    "=",
    "!=",
    "<",
    "<=",
    ">",
    ">=",
    "+",
    "-",
    "*",
    "div",
    "mod",
    "|",
    "/",
    "//",
    ".",
    "..",
    "node",
    "text",
    "comment",
    "processing-instruction",
];

pub const AXIS_NAMES: &[&str] = &[
    "ancestor-or-self",
    "ancestor",
    "attribute",
    "child",
    "descendant-or-self",
    "descendant",
    "following-sibling",
    "following",
    "namespace",
    "parent",
    "preceding-sibling",
    "preceding",
    "self",
];

pub fn build() -> Result<Grammar, EngineError> {
    let mut b = GrammarBuilder::new();
    b.declare(SYMBOLS);
    b.declare(AXIS_NAMES);
    b.declare(functions::FUNCTION_NAMES);

    b.literal(STRING_LITERAL);
    b.literal(INTEGER_LITERAL);
    b.literal(DECIMAL_LITERAL);
    b.literal(DOUBLE_LITERAL);

    let name = b.register(NAME, 0, 0, &[Role::Name]);
    name.nud = Some(paths::nud_name);
    name.select = Some(paths::select_name);

    b.register("(", 0, 0, &[Role::Symbol]).nud = Some(paths::nud_group);
    b.register(")", 0, 0, &[Role::Symbol]);
    b.register("]", 0, 0, &[Role::Symbol]);
    b.register(",", 0, 0, &[Role::Symbol]);
    b.register("::", 0, 0, &[Role::Symbol]);

    b.register(":", 95, 95, &[Role::Symbol]).led = Some(paths::led_colon);

    let variable = b.register("$", 0, 0, &[Role::Variable]);
    variable.nud = Some(paths::nud_variable);
    variable.evaluate = Some(paths::eval_variable);

    let attribute = b.register("@", 0, paths::STEP_BP, &[Role::Operator]);
    attribute.nud = Some(paths::nud_attribute);
    attribute.select = Some(paths::select_attribute_abbrev);

    // Word operators double as element names; the nud resolves the role.
    for (symbol, bp) in [("or", 20), ("and", 25), ("div", 45), ("mod", 45)] {
        let class = b.infix(symbol, bp, operators::eval_binary);
        class.nud = Some(paths::nud_operator_name);
        class.roles = vec![Role::Operator, Role::Name];
    }

    for symbol in ["=", "!=", "<", "<=", ">", ">="] {
        b.infix(symbol, 30, operators::eval_binary);
    }
    b.infix("+", 40, operators::eval_binary);
    b.infix("-", 40, operators::eval_binary);
    b.prefix("-", 70, operators::eval_binary);
    b.infix("|", 50, operators::eval_binary);

    // `*` is multiplication in led position, the wildcard name test in nud.
    let star = b.infix("*", 45, operators::eval_binary);
    star.nud = Some(paths::nud_wildcard);
    star.roles = vec![Role::Operator, Role::Name];

    let slash = b.register("/", 75, 75, &[Role::Operator]);
    slash.nud = Some(paths::nud_root);
    slash.led = Some(led_infix);
    slash.evaluate = Some(paths::eval_slash);

    let double_slash = b.register("//", 75, 75, &[Role::Operator]);
    double_slash.nud = Some(paths::nud_descendant_root);
    double_slash.led = Some(led_infix);
    double_slash.evaluate = Some(paths::eval_double_slash);

    let predicate = b.register("[", 80, 0, &[Role::Operator]);
    predicate.led = Some(paths::led_predicate);
    predicate.evaluate = Some(paths::eval_predicate);

    let dot = b.register(".", 0, 0, &[Role::Operator]);
    dot.nud = Some(nud_literal);
    dot.select = Some(paths::select_self);

    let dot_dot = b.register("..", 0, 0, &[Role::Operator]);
    dot_dot.nud = Some(nud_literal);
    dot_dot.select = Some(paths::select_parent);

    for axis in AXIS_NAMES {
        let class = b.register(axis, 0, paths::STEP_BP, &[Role::Axis, Role::Name]);
        class.nud = Some(paths::nud_axis);
        class.select = Some(paths::select_axis);
    }

    for kind in ["node", "text", "comment", "processing-instruction"] {
        let class = b.register(kind, 0, 0, &[Role::KindTest, Role::Name]);
        class.nud = Some(paths::nud_kind_test);
        class.select = Some(paths::select_kind_test);
    }

    for function in functions::FUNCTION_NAMES {
        let class = b.register(function, 0, 0, &[Role::Function, Role::Name]);
        class.nud = Some(functions::nud_function);
        class.evaluate = Some(functions::eval_function_call);
    }

    b.build()
}
