//! Evaluation results: items and sequences.

use crate::error::EngineError;
use rust_decimal::Decimal;
use xpress_datatypes::AtomicValue;
use xpress_nodes::NodeId;

/// One item of a sequence: a node of the context document or an atomic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Node(NodeId),
    Atomic(AtomicValue),
}

impl Item {
    pub fn is_node(&self) -> bool {
        matches!(self, Item::Node(_))
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Item::Node(id) => Some(*id),
            Item::Atomic(_) => None,
        }
    }

    pub fn as_atomic(&self) -> Option<&AtomicValue> {
        match self {
            Item::Atomic(a) => Some(a),
            Item::Node(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Item::Node(_) => "node()",
            Item::Atomic(a) => a.type_name(),
        }
    }
}

/// The result of an evaluation: an ordered sequence of items. A single value
/// is a one-item sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Sequence(Vec<Item>),
}

impl Value {
    pub fn empty() -> Self {
        Self::Sequence(Vec::new())
    }

    pub fn from_item(item: Item) -> Self {
        Self::Sequence(vec![item])
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self::Sequence(items)
    }

    pub fn from_atomic(value: AtomicValue) -> Self {
        Self::from_item(Item::Atomic(value))
    }

    pub fn from_node(node: NodeId) -> Self {
        Self::from_item(Item::Node(node))
    }

    pub fn from_nodes(nodes: Vec<NodeId>) -> Self {
        Self::Sequence(nodes.into_iter().map(Item::Node).collect())
    }

    pub fn from_bool(b: bool) -> Self {
        Self::from_atomic(AtomicValue::Boolean(b))
    }

    pub fn from_integer(i: i64) -> Self {
        Self::from_atomic(AtomicValue::Integer(i))
    }

    pub fn from_decimal(d: Decimal) -> Self {
        Self::from_atomic(AtomicValue::Decimal(d))
    }

    pub fn from_double(d: f64) -> Self {
        Self::from_atomic(AtomicValue::Double(d))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self::from_atomic(AtomicValue::String(s.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn items(&self) -> &[Item] {
        match self {
            Value::Sequence(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<Item> {
        match self {
            Value::Sequence(items) => items,
        }
    }

    pub fn first(&self) -> Option<&Item> {
        self.items().first()
    }

    /// The sole item of a singleton sequence, `None` otherwise.
    pub fn single(&self) -> Option<&Item> {
        match self.items() {
            [item] => Some(item),
            _ => None,
        }
    }

    /// The effective boolean value: empty is false, a sequence starting with
    /// a node is true, a singleton atomic coerces, anything else is a type
    /// error.
    pub fn effective_boolean_value(&self) -> Result<bool, EngineError> {
        match self.items() {
            [] => Ok(false),
            [Item::Node(_), ..] => Ok(true),
            [Item::Atomic(a)] => Ok(a.to_boolean()),
            _ => Err(EngineError::type_error(
                "a sequence of more than one atomic value has no effective boolean value",
            )),
        }
    }

    /// All node items, in sequence order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.items().iter().filter_map(Item::as_node).collect()
    }

    /// True if every item is a node; vacuously true for the empty sequence.
    pub fn is_node_sequence(&self) -> bool {
        self.items().iter().all(Item::is_node)
    }
}

impl From<AtomicValue> for Value {
    fn from(v: AtomicValue) -> Self {
        Self::from_atomic(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::from_bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::from_integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::from_double(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_boolean_value() {
        assert!(!Value::empty().effective_boolean_value().unwrap());
        assert!(Value::from_bool(true).effective_boolean_value().unwrap());
        assert!(!Value::from_bool(false).effective_boolean_value().unwrap());
        assert!(!Value::from_string("").effective_boolean_value().unwrap());
        assert!(Value::from_string("x").effective_boolean_value().unwrap());
        assert!(!Value::from_integer(0).effective_boolean_value().unwrap());
        assert!(Value::from_double(f64::NAN).effective_boolean_value().is_ok_and(|b| !b));

        let two_atomics = Value::from_items(vec![
            Item::Atomic(AtomicValue::Integer(1)),
            Item::Atomic(AtomicValue::Integer(2)),
        ]);
        assert!(two_atomics.effective_boolean_value().is_err());
    }

    #[test]
    fn test_singleton_access() {
        let v = Value::from_integer(42);
        assert_eq!(v.single(), Some(&Item::Atomic(AtomicValue::Integer(42))));
        assert_eq!(Value::empty().single(), None);
    }
}
