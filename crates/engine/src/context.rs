//! The dynamic evaluation context: where evaluation currently is in the
//! document, plus in-scope variables and the implicit timezone.
//!
//! Contexts are cheap, short-lived and freely copyable. A copy shares the
//! document and the lazily built parent index with its origin but deep-copies
//! the variable map, so a sub-evaluation can never corrupt the caller's
//! bindings. Axis navigation never mutates the context it starts from: the
//! iterators of [`crate::axes`] own their own positioned copies.

use crate::axes::Axis;
use crate::error::EngineError;
use crate::token::Token;
use crate::value::{Item, Value};
use rust_decimal::Decimal;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::rc::Rc;
use xpress_datatypes::{AtomicValue, Timezone};
use xpress_nodes::{Document, NodeId};

#[derive(Debug, Clone)]
pub struct DynamicContext {
    document: Rc<Document>,
    /// The current item; `None` means "positioned at the document root with
    /// no active proximity sequence".
    pub item: Option<Item>,
    /// 1-based ordinal of the current item within the active sequence.
    pub position: usize,
    /// Size of the active sequence.
    pub size: usize,
    /// The navigation axis currently producing items, if any.
    pub axis: Option<Axis>,
    variables: HashMap<String, Value>,
    pub timezone: Option<Timezone>,
    parents: Rc<OnceCell<Vec<Option<NodeId>>>>,
}

impl DynamicContext {
    pub fn new(document: Rc<Document>) -> Self {
        Self {
            document,
            item: None,
            position: 1,
            size: 1,
            axis: None,
            variables: HashMap::new(),
            timezone: None,
            parents: Rc::new(OnceCell::new()),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set_timezone(&mut self, timezone: Timezone) {
        self.timezone = Some(timezone);
    }

    /// A copy positioned at `item` with a fresh single-item sequence and no
    /// active axis; the shape every nested step or predicate starts from.
    pub fn at(&self, item: Item, position: usize, size: usize) -> Self {
        let mut sub = self.clone();
        sub.item = Some(item);
        sub.position = position;
        sub.size = size;
        sub.axis = None;
        sub
    }

    /// The node the context is positioned at. An unset item stands for the
    /// document root; an atomic item has no node and is a type error for
    /// axis-based operations.
    pub fn context_node(&self) -> Result<NodeId, EngineError> {
        match &self.item {
            None => Ok(self.document.root()),
            Some(Item::Node(id)) => Ok(*id),
            Some(Item::Atomic(a)) => Err(EngineError::type_error(format!(
                "the context item is an atomic value of type {}, not a node",
                a.type_name()
            ))),
        }
    }

    /// Parent lookup through the per-root index, built on first need and
    /// shared by every copy of this context.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        let index = self.parents.get_or_init(|| self.document.parent_index());
        index.get(id.index()).copied().flatten()
    }

    pub fn item_string(&self, item: &Item) -> String {
        match item {
            Item::Node(id) => self.document.string_value(*id),
            Item::Atomic(a) => a.to_string_value(),
        }
    }

    /// Atomization: nodes become untyped atomics carrying their string-value.
    pub fn atomize(&self, value: &Value) -> Vec<AtomicValue> {
        value
            .items()
            .iter()
            .map(|item| match item {
                Item::Atomic(a) => a.clone(),
                Item::Node(id) => AtomicValue::UntypedAtomic(self.document.string_value(*id)),
            })
            .collect()
    }

    /// Replaces the parent index wholesale; only tests need to fabricate a
    /// broken node model.
    #[cfg(test)]
    pub(crate) fn with_parent_index(mut self, index: Vec<Option<NodeId>>) -> Self {
        self.parents = Rc::new(index.into());
        self
    }

    /// Applies one predicate to a pre-filter sequence: each item is tested
    /// with `position`/`size` set to its 1-based ordinal and the sequence
    /// length. A single numeric result keeps the item at that position
    /// (rounded per the value type's rounding rule); any other result is
    /// taken as an effective boolean value.
    pub fn filter_with_predicate(
        &self,
        items: Vec<Item>,
        predicate: &Token,
    ) -> Result<Vec<Item>, EngineError> {
        let size = items.len();
        let mut kept = Vec::new();
        for (i, item) in items.into_iter().enumerate() {
            let mut sub = self.at(item.clone(), i + 1, size);
            let result = predicate.evaluate(&mut sub)?;
            let keep = match result.single().and_then(Item::as_atomic) {
                Some(atomic) if atomic.is_numeric() => positional_keep(atomic, i + 1),
                _ => result.effective_boolean_value()?,
            };
            if keep {
                kept.push(item);
            }
        }
        Ok(kept)
    }
}

fn positional_keep(atomic: &AtomicValue, position: usize) -> bool {
    match atomic {
        AtomicValue::Integer(i) => *i == position as i64,
        // rust_decimal rounds half to even, the decimal type's rule.
        AtomicValue::Decimal(d) => d.round() == Decimal::from(position as u64),
        AtomicValue::Double(d) => !d.is_nan() && d.round() == position as f64,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xpress_nodes::samples::sample_document;

    #[test]
    fn test_parent_index_is_shared_between_copies() {
        let ctx = DynamicContext::new(Rc::new(sample_document()));
        let copy = ctx.clone();
        let para = ctx.document().children(ctx.document().root())[0];
        let child = ctx.document().children(para)[0];

        assert_eq!(ctx.parent_of(child), Some(para));
        // The copy sees the index the original built.
        assert!(copy.parents.get().is_some());
        assert_eq!(copy.parent_of(para), Some(ctx.document().root()));
    }

    #[test]
    fn test_variable_copies_are_independent() {
        let mut ctx = DynamicContext::new(Rc::new(sample_document()));
        ctx.set_variable("x", Value::from_integer(1));
        let mut copy = ctx.clone();
        copy.set_variable("x", Value::from_integer(2));
        assert_eq!(ctx.variable("x"), Some(&Value::from_integer(1)));
        assert_eq!(copy.variable("x"), Some(&Value::from_integer(2)));
    }

    #[test]
    fn test_context_node_of_atomic_item_is_a_type_error() {
        let doc = Rc::new(sample_document());
        let ctx = DynamicContext::new(doc.clone());
        assert_eq!(ctx.context_node(), Ok(doc.root()));

        let positioned = ctx.at(Item::Atomic(AtomicValue::Integer(1)), 1, 1);
        assert!(matches!(
            positioned.context_node(),
            Err(EngineError::Type(_))
        ));
    }

    #[test]
    fn test_timezone_slot() {
        let mut ctx = DynamicContext::new(Rc::new(sample_document()));
        assert_eq!(ctx.timezone, None);
        ctx.set_timezone(Timezone::from_lexical("+05:30").unwrap());
        // Copies carry the implicit timezone along.
        assert_eq!(ctx.clone().timezone.map(|t| t.offset_minutes()), Some(330));
    }

    #[test]
    fn test_positional_rounding_rules() {
        assert!(positional_keep(&AtomicValue::Integer(2), 2));
        assert!(!positional_keep(&AtomicValue::Integer(2), 3));
        assert!(positional_keep(&AtomicValue::Double(2.5), 3));
        assert!(!positional_keep(&AtomicValue::Double(f64::NAN), 1));
        // Half-to-even: 2.5 rounds to 2 for decimals.
        assert!(positional_keep(&AtomicValue::Decimal(Decimal::new(25, 1)), 2));
    }
}
