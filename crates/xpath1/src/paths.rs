//! Path machinery: name and kind tests, axis steps, the `/`, `//`, `[` and
//! `@` operators, context references and variables.
//!
//! Several symbols here are multi-role: an axis keyword, a kind-test name or
//! a word operator is also a perfectly good element name. The `nud` fixes the
//! concrete role from one token of lookahead; every behavior function then
//! dispatches on the fixed role.

use xpress_engine::{
    Axis, DynamicContext, EngineError, Item, ItemStream, Literal, Parser, Role, Token, Value,
};
use xpress_nodes::{Document, NodeId, NodeKind, QName};

pub(crate) const STEP_BP: u32 = 90;

// --- nud/led behaviors ---

/// A bare name: a child-axis name test, unless it turns out to be an
/// unregistered function call.
pub fn nud_name(parser: &mut Parser<'_>, token: Token) -> Result<Token, EngineError> {
    if parser.lookahead_is("(") {
        let name = token
            .value
            .as_ref()
            .map(Literal::lexeme)
            .unwrap_or_default();
        return Err(EngineError::name(format!("unknown function '{}'", name)));
    }
    Ok(token)
}

/// `prefix:local`: the `:` folds two name tokens into one qualified-name
/// leaf, the one-time rewrite that fixes a name's reference at parse time.
pub fn led_colon(parser: &mut Parser<'_>, token: Token, left: Token) -> Result<Token, EngineError> {
    let prefix = match &left.value {
        Some(Literal::Name(name)) => name.clone(),
        _ => return Err(parser.syntax_error(&token, "expected a name before ':'")),
    };
    let mut qualified = parser.expression(token.lbp())?;
    match qualified.value.take() {
        Some(Literal::Name(local)) => {
            qualified.value = Some(Literal::QualifiedName(QName::with_prefix(prefix, local)));
            qualified.role = Role::Name;
            Ok(qualified)
        }
        _ => Err(parser.syntax_error(&token, "expected a local name after ':'")),
    }
}

/// `*` at the start of an expression is the wildcard name test.
pub fn nud_wildcard(_parser: &mut Parser<'_>, mut token: Token) -> Result<Token, EngineError> {
    token.role = Role::Name;
    token.value = None;
    Ok(token)
}

/// An axis keyword: `axis::test` when followed by `::`, otherwise an element
/// name that happens to spell an axis.
pub fn nud_axis(parser: &mut Parser<'_>, mut token: Token) -> Result<Token, EngineError> {
    if parser.lookahead_is("::") {
        parser.advance_expected(&["::"])?;
        token.role = Role::Axis;
        let test = parser.expression(STEP_BP)?;
        token.operands.push(test);
        Ok(token)
    } else {
        into_name(token)
    }
}

/// A kind test: `text()`, `node()`, `comment()`,
/// `processing-instruction('target'?)`, or, without the parentheses, a
/// plain element name.
pub fn nud_kind_test(parser: &mut Parser<'_>, mut token: Token) -> Result<Token, EngineError> {
    if !parser.lookahead_is("(") {
        return into_name(token);
    }
    parser.advance_expected(&["("])?;
    token.role = Role::KindTest;
    if token.is("processing-instruction") && !parser.lookahead_is(")") {
        token.operands.push(parser.expression(0)?);
    }
    parser.advance_expected(&[")"])?;
    Ok(token)
}

/// Word operators (`and`, `or`, `div`, `mod`) in nud position are element
/// names.
pub fn nud_operator_name(_parser: &mut Parser<'_>, token: Token) -> Result<Token, EngineError> {
    into_name(token)
}

pub(crate) fn into_name(mut token: Token) -> Result<Token, EngineError> {
    token.value = Some(Literal::Name(token.symbol().to_string()));
    token.role = Role::Name;
    Ok(token)
}

/// Leading `/` or `//`: absolute paths. A bare `/` selects the document
/// itself.
pub fn nud_root(parser: &mut Parser<'_>, mut token: Token) -> Result<Token, EngineError> {
    let ahead = parser.lookahead();
    if !ahead.is(xpress_engine::END) && ahead.class().nud.is_some() {
        let bp = token.lbp();
        token.operands.push(parser.expression(bp)?);
    }
    Ok(token)
}

pub fn nud_descendant_root(
    parser: &mut Parser<'_>,
    mut token: Token,
) -> Result<Token, EngineError> {
    let bp = token.lbp();
    token.operands.push(parser.expression(bp)?);
    Ok(token)
}

/// `@test`, the attribute-axis abbreviation.
pub fn nud_attribute(parser: &mut Parser<'_>, mut token: Token) -> Result<Token, EngineError> {
    let test = parser.expression(token.rbp())?;
    token.operands.push(test);
    Ok(token)
}

/// `$name`, a variable reference.
pub fn nud_variable(parser: &mut Parser<'_>, mut token: Token) -> Result<Token, EngineError> {
    let name = parser.advance_expected(&[xpress_engine::NAME])?;
    token.role = Role::Variable;
    token.operands.push(name);
    Ok(token)
}

/// `( expr )`: grouping produces no tree node of its own.
pub fn nud_group(parser: &mut Parser<'_>, _token: Token) -> Result<Token, EngineError> {
    let inner = parser.expression(0)?;
    parser.advance_expected(&[")"])?;
    Ok(inner)
}

/// `left[predicate]`.
pub fn led_predicate(
    parser: &mut Parser<'_>,
    mut token: Token,
    left: Token,
) -> Result<Token, EngineError> {
    let predicate = parser.expression(0)?;
    parser.advance_expected(&["]"])?;
    token.role = Role::Operator;
    token.operands = vec![left, predicate];
    Ok(token)
}

// --- select/evaluate behaviors ---

/// The principal node kind of an axis: attributes for the attribute axis,
/// namespaces for the namespace axis, elements everywhere else.
fn principal_kind(axis: Axis) -> NodeKind {
    match axis {
        Axis::Attribute => NodeKind::Attribute,
        Axis::Namespace => NodeKind::Namespace,
        _ => NodeKind::Element,
    }
}

/// The shared shape of every node test: with an axis active, the context is
/// positioned on a single candidate to accept or reject; with no axis, the
/// test applies itself along the child axis.
fn select_matching<'a>(
    context: DynamicContext,
    matches: impl Fn(&Document, NodeId) -> bool + 'a,
) -> Result<ItemStream<'a>, EngineError> {
    match context.axis {
        Some(_) => {
            let id = context.context_node()?;
            let keep = matches(context.document(), id);
            Ok(Box::new(keep.then_some(Ok(Item::Node(id))).into_iter()))
        }
        None => {
            let iter = context.iter_axis(Axis::Child)?;
            Ok(Box::new(iter.filter_map(move |candidate| {
                let id = candidate.context_node().ok()?;
                matches(candidate.document(), id).then_some(Ok(Item::Node(id)))
            })))
        }
    }
}

/// Name and wildcard tests.
pub fn select_name<'a>(
    token: &'a Token,
    context: DynamicContext,
) -> Result<ItemStream<'a>, EngineError> {
    let name = match &token.value {
        None => None,
        Some(Literal::Name(local)) => Some(QName::new(local.clone())),
        Some(Literal::QualifiedName(q)) => Some(q.clone()),
        Some(other) => {
            return Err(EngineError::type_error(format!(
                "'{}' is not a name test",
                other.lexeme()
            )));
        }
    };
    let principal = principal_kind(context.axis.unwrap_or(Axis::Child));
    select_matching(context, move |doc, id| {
        doc.kind(id) == principal
            && match &name {
                None => true,
                Some(q) => doc.name(id) == Some(q),
            }
    })
}

/// Evaluation of a token standing in name-test position; shared by every
/// multi-role symbol whose instance resolved to [`Role::Name`].
pub fn eval_as_name(token: &Token, context: &mut DynamicContext) -> Result<Value, EngineError> {
    let items = select_name(token, context.clone())?.collect::<Result<Vec<_>, _>>()?;
    Ok(Value::from_items(items))
}

/// Kind tests.
pub fn select_kind_test<'a>(
    token: &'a Token,
    context: DynamicContext,
) -> Result<ItemStream<'a>, EngineError> {
    if token.role == Role::Name {
        return select_name(token, context);
    }
    let wanted = match token.symbol() {
        "node" => None,
        "text" => Some(NodeKind::Text),
        "comment" => Some(NodeKind::Comment),
        "processing-instruction" => Some(NodeKind::ProcessingInstruction),
        other => {
            return Err(EngineError::type_error(format!(
                "'{}' is not a kind test",
                other
            )));
        }
    };
    let target = token.operands.first().and_then(|t| match &t.value {
        Some(Literal::String(s)) => Some(s.clone()),
        _ => None,
    });
    select_matching(context, move |doc, id| {
        wanted.is_none_or(|kind| doc.kind(id) == kind)
            && target
                .as_ref()
                .is_none_or(|t| doc.name(id).is_some_and(|q| q.local == *t))
    })
}

/// An axis step: iterate the axis, then run the node test against each
/// positioned candidate.
pub fn select_axis<'a>(
    token: &'a Token,
    context: DynamicContext,
) -> Result<ItemStream<'a>, EngineError> {
    if token.role == Role::Name {
        return select_name(token, context);
    }
    let axis = Axis::from_name(token.symbol()).ok_or_else(|| {
        EngineError::type_error(format!("'{}' is not an axis", token.symbol()))
    })?;
    axis_stream(axis, &token.operands[0], &context)
}

pub fn select_attribute_abbrev<'a>(
    token: &'a Token,
    context: DynamicContext,
) -> Result<ItemStream<'a>, EngineError> {
    axis_stream(Axis::Attribute, &token.operands[0], &context)
}

fn axis_stream<'a>(
    axis: Axis,
    test: &'a Token,
    context: &DynamicContext,
) -> Result<ItemStream<'a>, EngineError> {
    let iter = context.iter_axis(axis)?;
    Ok(Box::new(iter.flat_map(move |candidate| {
        match test.select(&candidate) {
            Ok(stream) => stream,
            Err(e) => Box::new(std::iter::once(Err(e))) as ItemStream<'a>,
        }
    })))
}

/// `.`, the context item itself.
pub fn select_self<'a>(
    _token: &'a Token,
    context: DynamicContext,
) -> Result<ItemStream<'a>, EngineError> {
    let item = context
        .item
        .clone()
        .unwrap_or(Item::Node(context.document().root()));
    Ok(Box::new(std::iter::once(Ok(item))))
}

/// `..`, the parent of the context node.
pub fn select_parent<'a>(
    _token: &'a Token,
    context: DynamicContext,
) -> Result<ItemStream<'a>, EngineError> {
    let id = context.context_node()?;
    let parent = context.parent_of(id).map(|p| Ok(Item::Node(p)));
    Ok(Box::new(parent.into_iter()))
}

/// A variable reference; an unbound name is a name error.
pub fn eval_variable(token: &Token, context: &mut DynamicContext) -> Result<Value, EngineError> {
    let name = token
        .operands
        .first()
        .and_then(|t| t.value.as_ref())
        .map(Literal::lexeme)
        .unwrap_or_default();
    context
        .variable(&name)
        .cloned()
        .ok_or_else(|| EngineError::name(format!("unknown variable '${}'", name)))
}

/// `/`: the document root (arity 0), an absolute path (arity 1), or a path
/// step folding left nodes into right-hand selections (arity 2).
pub fn eval_slash(token: &Token, context: &mut DynamicContext) -> Result<Value, EngineError> {
    match token.arity() {
        0 => Ok(Value::from_node(context.document().root())),
        1 => {
            let mut root = context.at(Item::Node(context.document().root()), 1, 1);
            let value = token.operands[0].evaluate(&mut root)?;
            Ok(Value::from_nodes(document_order(require_nodes(
                value, "a path step",
            )?)))
        }
        _ => {
            let left = token.operands[0].evaluate(context)?;
            let bases = require_nodes(left, "the left side of '/'")?;
            step_over(context, bases, &token.operands[1])
        }
    }
}

/// `//`: like `/`, with a `descendant-or-self::node()` expansion between the
/// base nodes and the right-hand step.
pub fn eval_double_slash(token: &Token, context: &mut DynamicContext) -> Result<Value, EngineError> {
    let (bases, step) = match token.arity() {
        1 => (vec![context.document().root()], &token.operands[0]),
        _ => {
            let left = token.operands[0].evaluate(context)?;
            (
                require_nodes(left, "the left side of '//'")?,
                &token.operands[1],
            )
        }
    };
    let mut expanded = Vec::new();
    for base in bases {
        let positioned = context.at(Item::Node(base), 1, 1);
        for candidate in positioned.iter_axis(Axis::DescendantOrSelf)? {
            expanded.push(candidate.context_node()?);
        }
    }
    step_over(context, document_order(expanded), step)
}

/// Evaluates `step` once per base node with position/size bookkeeping, and
/// merges the results into document order.
fn step_over(
    context: &DynamicContext,
    bases: Vec<NodeId>,
    step: &Token,
) -> Result<Value, EngineError> {
    let size = bases.len();
    let mut out = Vec::new();
    for (i, base) in bases.into_iter().enumerate() {
        let mut sub = context.at(Item::Node(base), i + 1, size);
        let value = step.evaluate(&mut sub)?;
        out.extend(require_nodes(value, "a path step")?);
    }
    Ok(Value::from_nodes(document_order(out)))
}

/// `left[predicate]`; the position bookkeeping lives in
/// [`DynamicContext::filter_with_predicate`].
pub fn eval_predicate(token: &Token, context: &mut DynamicContext) -> Result<Value, EngineError> {
    let base = token.operands[0].evaluate(context)?;
    let kept = context.filter_with_predicate(base.into_items(), &token.operands[1])?;
    Ok(Value::from_items(kept))
}

pub(crate) fn require_nodes(value: Value, what: &str) -> Result<Vec<NodeId>, EngineError> {
    if value.is_node_sequence() {
        Ok(value.nodes())
    } else {
        Err(EngineError::type_error(format!(
            "{} must produce nodes, got an atomic value",
            what
        )))
    }
}

/// Deduplicated document order; node ids order by document position.
pub(crate) fn document_order(mut nodes: Vec<NodeId>) -> Vec<NodeId> {
    nodes.sort();
    nodes.dedup();
    nodes
}
