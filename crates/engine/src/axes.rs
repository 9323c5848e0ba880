//! Axis navigation over the document node model.
//!
//! Each axis operation produces a restartable sequence of positioned context
//! snapshots: the iterator owns its own copy of `(item, position, size,
//! axis)`, so the context it was started from observes nothing, whether the
//! sequence is fully consumed or abandoned early.

use crate::context::DynamicContext;
use crate::error::EngineError;
use crate::value::Item;
use std::collections::HashSet;
use xpress_nodes::{NodeId, NodeKind};

/// A named direction of node-model traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    SelfAxis,
    Child,
    Descendant,
    DescendantOrSelf,
    Attribute,
    Namespace,
    FollowingSibling,
    Following,
    Parent,
    Ancestor,
    AncestorOrSelf,
    PrecedingSibling,
    Preceding,
}

impl Axis {
    pub const ALL: [Axis; 13] = [
        Axis::SelfAxis,
        Axis::Child,
        Axis::Descendant,
        Axis::DescendantOrSelf,
        Axis::Attribute,
        Axis::Namespace,
        Axis::FollowingSibling,
        Axis::Following,
        Axis::Parent,
        Axis::Ancestor,
        Axis::AncestorOrSelf,
        Axis::PrecedingSibling,
        Axis::Preceding,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Axis::SelfAxis => "self",
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::Attribute => "attribute",
            Axis::Namespace => "namespace",
            Axis::FollowingSibling => "following-sibling",
            Axis::Following => "following",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::Preceding => "preceding",
        }
    }

    pub fn from_name(name: &str) -> Option<Axis> {
        Axis::ALL.iter().copied().find(|a| a.name() == name)
    }

    /// Reverse axes produce candidates in reverse document order.
    pub fn is_reverse(&self) -> bool {
        matches!(
            self,
            Axis::Parent
                | Axis::Ancestor
                | Axis::AncestorOrSelf
                | Axis::PrecedingSibling
                | Axis::Preceding
        )
    }
}

impl DynamicContext {
    /// Starts an axis operation from the current item. The returned iterator
    /// yields one positioned context per candidate node, in the axis's
    /// defined order.
    pub fn iter_axis(&self, axis: Axis) -> Result<AxisIter, EngineError> {
        let candidates = self.axis_candidates(axis)?;
        Ok(AxisIter::new(self.clone(), axis, candidates))
    }

    fn axis_candidates(&self, axis: Axis) -> Result<Vec<NodeId>, EngineError> {
        let node = self.context_node()?;
        let doc = self.document();
        let candidates = match axis {
            Axis::SelfAxis => vec![node],
            Axis::Child => doc.children(node).to_vec(),
            Axis::Attribute => doc.attributes(node).to_vec(),
            Axis::Namespace => self.in_scope_namespaces(node)?,
            Axis::Descendant => {
                let mut out = Vec::new();
                for &child in doc.children(node) {
                    self.collect_subtree(child, &mut out);
                }
                out
            }
            Axis::DescendantOrSelf => {
                let mut out = Vec::new();
                self.collect_subtree(node, &mut out);
                out
            }
            Axis::FollowingSibling => {
                let mut out = Vec::new();
                if let Some(parent) = self.parent_of(node) {
                    let siblings = doc.children(parent);
                    if let Some(i) = siblings.iter().position(|&s| s == node) {
                        out.extend_from_slice(&siblings[i + 1..]);
                    }
                }
                out
            }
            Axis::Following => {
                let mut chain = vec![node];
                chain.extend(self.ancestors_of(node)?);
                let mut out = Vec::new();
                for pair in chain.windows(2) {
                    let (current, parent) = (pair[0], pair[1]);
                    let siblings = doc.children(parent);
                    let start = siblings
                        .iter()
                        .position(|&s| s == current)
                        .map(|i| i + 1)
                        .unwrap_or(0);
                    for &sibling in &siblings[start..] {
                        self.collect_subtree(sibling, &mut out);
                    }
                }
                out
            }
            Axis::Parent => self.parent_of(node).into_iter().collect(),
            Axis::Ancestor => self.ancestors_of(node)?,
            Axis::AncestorOrSelf => {
                // Consumed root-to-self.
                let mut out = self.ancestors_of(node)?;
                out.reverse();
                out.push(node);
                out
            }
            Axis::PrecedingSibling => {
                let mut out = Vec::new();
                if let Some(parent) = self.parent_of(node) {
                    let siblings = doc.children(parent);
                    if let Some(i) = siblings.iter().position(|&s| s == node) {
                        out.extend(siblings[..i].iter().rev());
                    }
                }
                out
            }
            Axis::Preceding => {
                let mut chain = vec![node];
                chain.extend(self.ancestors_of(node)?);
                let mut out = Vec::new();
                for pair in chain.windows(2) {
                    let (current, parent) = (pair[0], pair[1]);
                    let siblings = doc.children(parent);
                    let end = siblings.iter().position(|&s| s == current).unwrap_or(0);
                    for &sibling in siblings[..end].iter().rev() {
                        let mut subtree = Vec::new();
                        self.collect_subtree(sibling, &mut subtree);
                        subtree.reverse();
                        out.extend(subtree);
                    }
                }
                out
            }
        };
        Ok(candidates)
    }

    /// Depth-first preorder over the containment tree; attributes and
    /// namespaces are not descendants.
    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for &child in self.document().children(id) {
            self.collect_subtree(child, out);
        }
    }

    /// The ancestor chain, nearest first. A chain longer than the document
    /// means the parent index has a cycle.
    fn ancestors_of(&self, node: NodeId) -> Result<Vec<NodeId>, EngineError> {
        let mut out = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parent_of(current) {
            out.push(parent);
            current = parent;
            if out.len() > self.document().len() {
                return Err(EngineError::structure(
                    "ancestor walk did not terminate: the node model is not a tree",
                ));
            }
        }
        Ok(out)
    }

    /// In-scope namespace nodes: declarations on the element itself and its
    /// ancestors, nearest declaration winning per prefix.
    fn in_scope_namespaces(&self, node: NodeId) -> Result<Vec<NodeId>, EngineError> {
        let doc = self.document();
        if doc.kind(node) != NodeKind::Element {
            return Ok(Vec::new());
        }
        let mut chain = vec![node];
        chain.extend(self.ancestors_of(node)?);
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for element in chain {
            for &ns in doc.namespaces(element) {
                let prefix = doc.name(ns).map(|q| q.local.clone()).unwrap_or_default();
                if seen.insert(prefix) {
                    out.push(ns);
                }
            }
        }
        Ok(out)
    }
}

/// Iterator over one axis operation. Owns a private context copy with `axis`
/// set to the operation's name and yields a positioned snapshot per
/// candidate, so the originating context is never disturbed.
pub struct AxisIter {
    base: DynamicContext,
    candidates: std::vec::IntoIter<NodeId>,
    position: usize,
    size: usize,
}

impl AxisIter {
    fn new(mut base: DynamicContext, axis: Axis, candidates: Vec<NodeId>) -> Self {
        base.axis = Some(axis);
        let size = candidates.len();
        Self {
            base,
            candidates: candidates.into_iter(),
            position: 0,
            size,
        }
    }
}

impl Iterator for AxisIter {
    type Item = DynamicContext;

    fn next(&mut self) -> Option<DynamicContext> {
        let id = self.candidates.next()?;
        self.position += 1;
        let mut ctx = self.base.clone();
        ctx.item = Some(Item::Node(id));
        ctx.position = self.position;
        ctx.size = self.size;
        Some(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use xpress_nodes::samples::sample_document;
    use xpress_nodes::{QName, TreeBuilder};

    fn ctx() -> DynamicContext {
        DynamicContext::new(Rc::new(sample_document()))
    }

    fn names(ctx: &DynamicContext, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| {
                ctx.document()
                    .name(id)
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| format!("{:?}", ctx.document().kind(id)))
            })
            .collect()
    }

    fn collect_axis(ctx: &DynamicContext, axis: Axis) -> Vec<NodeId> {
        ctx.iter_axis(axis)
            .unwrap()
            .map(|c| c.context_node().unwrap())
            .collect()
    }

    #[test]
    fn test_child_axis_document_order() {
        let ctx = ctx();
        let root_elem = ctx.document().document_element().unwrap();
        let positioned = ctx.at(Item::Node(root_elem), 1, 1);
        let children = collect_axis(&positioned, Axis::Child);
        assert_eq!(children.len(), 5);
        assert_eq!(
            names(&ctx, &children),
            vec!["para", "Comment", "div", "pi-target", "para"]
        );
    }

    #[test]
    fn test_descendant_excludes_self_and_attributes() {
        let ctx = ctx();
        let descendants = collect_axis(&ctx, Axis::Descendant);
        // root element, para, text, comment, div, pi, para, text
        assert_eq!(descendants.len(), 8);
        assert!(!descendants.contains(&ctx.document().root()));
        assert!(
            descendants
                .iter()
                .all(|&d| ctx.document().kind(d) != NodeKind::Attribute)
        );
        // Preorder over the arena is document order.
        assert!(descendants.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_descendant_or_self_from_unset_item_starts_at_document() {
        let ctx = ctx();
        let all = collect_axis(&ctx, Axis::DescendantOrSelf);
        assert_eq!(all[0], ctx.document().root());
        assert_eq!(all.len(), 9);
    }

    #[test]
    fn test_ancestor_orders() {
        let ctx = ctx();
        let root_elem = ctx.document().document_element().unwrap();
        let para = ctx.document().children(root_elem)[0];
        let text = ctx.document().children(para)[0];
        let positioned = ctx.at(Item::Node(text), 1, 1);

        // Plain ancestor: nearest first.
        assert_eq!(
            collect_axis(&positioned, Axis::Ancestor),
            vec![para, root_elem, ctx.document().root()]
        );
        // ancestor-or-self: root-to-self.
        assert_eq!(
            collect_axis(&positioned, Axis::AncestorOrSelf),
            vec![ctx.document().root(), root_elem, para, text]
        );
    }

    #[test]
    fn test_sibling_axes() {
        let ctx = ctx();
        let root_elem = ctx.document().document_element().unwrap();
        let children = ctx.document().children(root_elem).to_vec();
        let div = children[2];
        let positioned = ctx.at(Item::Node(div), 1, 1);

        assert_eq!(
            collect_axis(&positioned, Axis::FollowingSibling),
            vec![children[3], children[4]]
        );
        // Reverse document order: nearest sibling first.
        assert_eq!(
            collect_axis(&positioned, Axis::PrecedingSibling),
            vec![children[1], children[0]]
        );
    }

    #[test]
    fn test_following_excludes_descendants_and_preceding_excludes_ancestors() {
        let ctx = ctx();
        let root_elem = ctx.document().document_element().unwrap();
        let para1 = ctx.document().children(root_elem)[0];
        let text1 = ctx.document().children(para1)[0];
        let positioned = ctx.at(Item::Node(text1), 1, 1);

        let following = collect_axis(&positioned, Axis::Following);
        // comment, div, pi, para2, text2 - all after text1, none its ancestor.
        assert_eq!(following.len(), 5);
        assert!(following.windows(2).all(|w| w[0] < w[1]));

        let div = ctx.document().children(root_elem)[2];
        let positioned = ctx.at(Item::Node(div), 1, 1);
        let preceding = collect_axis(&positioned, Axis::Preceding);
        // Reverse document order: comment, text1, para1; root element and
        // document are ancestors and excluded.
        assert_eq!(preceding.len(), 3);
        assert!(preceding.windows(2).all(|w| w[0] > w[1]));
        assert!(!preceding.contains(&root_elem));
    }

    #[test]
    fn test_attribute_axis() {
        let ctx = ctx();
        let root_elem = ctx.document().document_element().unwrap();
        let para = ctx.document().children(root_elem)[0];
        let positioned = ctx.at(Item::Node(para), 1, 1);

        let attrs = collect_axis(&positioned, Axis::Attribute);
        assert_eq!(names(&ctx, &attrs), vec!["id", "xml:lang"]);

        // Attributes have no siblings.
        let at_attr = ctx.at(Item::Node(attrs[0]), 1, 1);
        assert!(collect_axis(&at_attr, Axis::FollowingSibling).is_empty());
        // Their parent is the owning element.
        assert_eq!(collect_axis(&at_attr, Axis::Parent), vec![para]);
    }

    #[test]
    fn test_namespace_axis_nearest_declaration_wins() {
        let mut b = TreeBuilder::new();
        b.start_element(QName::new("outer"));
        b.namespace("a", "urn:outer-a").unwrap();
        b.namespace("b", "urn:b").unwrap();
        b.start_element(QName::new("inner"));
        b.namespace("a", "urn:inner-a").unwrap();
        b.end_element().unwrap();
        b.end_element().unwrap();
        let doc = Rc::new(b.finish().unwrap());

        let ctx = DynamicContext::new(doc.clone());
        let outer = doc.document_element().unwrap();
        let inner = doc.children(outer)[0];
        let positioned = ctx.at(Item::Node(inner), 1, 1);

        let ns = collect_axis(&positioned, Axis::Namespace);
        let values: Vec<&str> = ns.iter().map(|&id| doc.value(id)).collect();
        assert_eq!(values, vec!["urn:inner-a", "urn:b"]);
    }

    #[test]
    fn test_positions_are_one_based_over_the_full_sequence() {
        let ctx = ctx();
        let root_elem = ctx.document().document_element().unwrap();
        let positioned = ctx.at(Item::Node(root_elem), 1, 1);
        let snapshots: Vec<_> = positioned.iter_axis(Axis::Child).unwrap().collect();
        assert_eq!(snapshots.len(), 5);
        for (i, snap) in snapshots.iter().enumerate() {
            assert_eq!(snap.position, i + 1);
            assert_eq!(snap.size, 5);
            assert_eq!(snap.axis, Some(Axis::Child));
        }
    }

    #[test]
    fn test_originating_context_is_never_disturbed() {
        let ctx = ctx();
        let root_elem = ctx.document().document_element().unwrap();
        let positioned = ctx.at(Item::Node(root_elem), 3, 7);
        let before = (
            positioned.item.clone(),
            positioned.position,
            positioned.size,
            positioned.axis,
        );

        // Fully consumed.
        let _ = positioned.iter_axis(Axis::Descendant).unwrap().count();
        // Abandoned early.
        let mut iter = positioned.iter_axis(Axis::Child).unwrap();
        let _ = iter.next();
        drop(iter);

        let after = (
            positioned.item.clone(),
            positioned.position,
            positioned.size,
            positioned.axis,
        );
        assert_eq!(before, after);
    }

    #[test]
    fn test_ancestor_cycle_detection() {
        // A context whose parent index was poisoned into a two-node loop.
        let ctx = ctx();
        let root_elem = ctx.document().document_element().unwrap();
        let para = ctx.document().children(root_elem)[0];

        let mut index = vec![None; ctx.document().len()];
        index[root_elem.index()] = Some(para);
        index[para.index()] = Some(root_elem);
        let poisoned = ctx.at(Item::Node(para), 1, 1).with_parent_index(index);

        assert!(matches!(
            poisoned.iter_axis(Axis::Ancestor),
            Err(EngineError::Structure(_))
        ));
    }
}
