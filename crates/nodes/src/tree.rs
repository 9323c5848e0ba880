//! The document arena: one flat vector of nodes with stable ids.

use crate::name::QName;
use thiserror::Error;

/// Stable identifier of a node within its [`Document`] arena.
///
/// Ids are assigned in document order during construction, so the `Ord`
/// implementation orders nodes by document position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of a node, aligned with the XPath data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    /// Element/attribute name, processing-instruction target, or namespace
    /// prefix. `None` for document, text and comment nodes.
    name: Option<QName>,
    /// Attribute value, text content, comment text, processing-instruction
    /// data, or namespace URI. Empty for document and element nodes.
    value: String,
    children: Vec<NodeId>,
    attributes: Vec<NodeId>,
    namespaces: Vec<NodeId>,
}

impl NodeData {
    fn leaf(kind: NodeKind, name: Option<QName>, value: String) -> Self {
        Self {
            kind,
            name,
            value,
            children: Vec::new(),
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("no element is open at this point of construction")]
    NoOpenElement,

    #[error("{0} element(s) left open at the end of construction")]
    UnclosedElements(usize),
}

/// An immutable document tree. Node id 0 is always the document node.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Total number of nodes in the arena, attributes and namespaces included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind
    }

    pub fn name(&self, id: NodeId) -> Option<&QName> {
        self.nodes[id.index()].name.as_ref()
    }

    /// The raw value slot of a node; see [`Document::string_value`] for the
    /// XPath string-value of elements and documents.
    pub fn value(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].value
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].attributes
    }

    /// Namespace declarations attached directly to this element.
    pub fn namespaces(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].namespaces
    }

    /// The outermost element of the document, if any.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&c| self.kind(c) == NodeKind::Element)
    }

    /// The XPath string-value: for elements and the document node, the
    /// concatenation of all descendant text content in document order; for
    /// every other kind, the node's own value.
    pub fn string_value(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::Document | NodeKind::Element => {
                let mut out = String::new();
                self.collect_text(id, &mut out);
                out
            }
            _ => self.nodes[id.index()].value.clone(),
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            match self.kind(child) {
                NodeKind::Text => out.push_str(&self.nodes[child.index()].value),
                NodeKind::Element => self.collect_text(child, out),
                _ => {}
            }
        }
    }

    /// Builds the child-to-parent index in one arena scan. Attribute and
    /// namespace nodes map to their owning element.
    pub fn parent_index(&self) -> Vec<Option<NodeId>> {
        let mut parents = vec![None; self.nodes.len()];
        for (i, data) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            for &child in data
                .children
                .iter()
                .chain(&data.attributes)
                .chain(&data.namespaces)
            {
                parents[child.index()] = Some(id);
            }
        }
        parents
    }
}

/// Push/pop construction of a [`Document`] in document order.
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::leaf(NodeKind::Document, None, String::new())],
            open: vec![NodeId(0)],
        }
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }

    fn current(&self) -> NodeId {
        // The document node is pushed at construction and never popped.
        self.open.last().copied().unwrap_or(NodeId(0))
    }

    pub fn start_element(&mut self, name: QName) -> NodeId {
        let id = self.push_node(NodeData::leaf(NodeKind::Element, Some(name), String::new()));
        let parent = self.current();
        self.nodes[parent.index()].children.push(id);
        self.open.push(id);
        id
    }

    pub fn end_element(&mut self) -> Result<(), TreeError> {
        if self.open.len() <= 1 {
            return Err(TreeError::NoOpenElement);
        }
        self.open.pop();
        Ok(())
    }

    pub fn attribute(&mut self, name: QName, value: impl Into<String>) -> Result<NodeId, TreeError> {
        let owner = self.current();
        if self.nodes[owner.index()].kind != NodeKind::Element {
            return Err(TreeError::NoOpenElement);
        }
        let id = self.push_node(NodeData::leaf(NodeKind::Attribute, Some(name), value.into()));
        self.nodes[owner.index()].attributes.push(id);
        Ok(id)
    }

    pub fn namespace(&mut self, prefix: &str, uri: impl Into<String>) -> Result<NodeId, TreeError> {
        let owner = self.current();
        if self.nodes[owner.index()].kind != NodeKind::Element {
            return Err(TreeError::NoOpenElement);
        }
        let id = self.push_node(NodeData::leaf(
            NodeKind::Namespace,
            Some(QName::new(prefix)),
            uri.into(),
        ));
        self.nodes[owner.index()].namespaces.push(id);
        Ok(id)
    }

    pub fn text(&mut self, content: impl Into<String>) -> NodeId {
        let id = self.push_node(NodeData::leaf(NodeKind::Text, None, content.into()));
        let parent = self.current();
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn comment(&mut self, content: impl Into<String>) -> NodeId {
        let id = self.push_node(NodeData::leaf(NodeKind::Comment, None, content.into()));
        let parent = self.current();
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn processing_instruction(
        &mut self,
        target: impl Into<String>,
        data: impl Into<String>,
    ) -> NodeId {
        let id = self.push_node(NodeData::leaf(
            NodeKind::ProcessingInstruction,
            Some(QName::new(target)),
            data.into(),
        ));
        let parent = self.current();
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn finish(self) -> Result<Document, TreeError> {
        if self.open.len() > 1 {
            return Err(TreeError::UnclosedElements(self.open.len() - 1));
        }
        Ok(Document { nodes: self.nodes })
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_doc() -> Document {
        let mut b = TreeBuilder::new();
        b.start_element(QName::new("a"));
        b.start_element(QName::new("b"));
        b.text("Hello");
        b.end_element().unwrap();
        b.start_element(QName::new("c"));
        b.end_element().unwrap();
        b.end_element().unwrap();
        b.finish().unwrap()
    }

    #[test]
    fn test_document_order_ids() {
        let doc = small_doc();
        let a = doc.document_element().unwrap();
        let children = doc.children(a);
        assert_eq!(children.len(), 2);
        assert!(doc.root() < a);
        assert!(a < children[0]);
        assert!(children[0] < children[1]);
    }

    #[test]
    fn test_string_value() {
        let mut b = TreeBuilder::new();
        b.start_element(QName::new("root"));
        b.attribute(QName::new("id"), "r1").unwrap();
        b.text("Hello ");
        b.start_element(QName::new("em"));
        b.text("World");
        b.end_element().unwrap();
        b.comment("ignored");
        b.end_element().unwrap();
        let doc = b.finish().unwrap();

        let root = doc.document_element().unwrap();
        assert_eq!(doc.string_value(root), "Hello World");
        assert_eq!(doc.string_value(doc.root()), "Hello World");

        let attr = doc.attributes(root)[0];
        assert_eq!(doc.string_value(attr), "r1");
        assert_eq!(doc.kind(attr), NodeKind::Attribute);
    }

    #[test]
    fn test_parent_index() {
        let doc = small_doc();
        let parents = doc.parent_index();
        let a = doc.document_element().unwrap();
        let b = doc.children(a)[0];
        let hello = doc.children(b)[0];
        assert_eq!(parents[doc.root().index()], None);
        assert_eq!(parents[a.index()], Some(doc.root()));
        assert_eq!(parents[b.index()], Some(a));
        assert_eq!(parents[hello.index()], Some(b));
    }

    #[test]
    fn test_attributes_are_not_children() {
        let mut b = TreeBuilder::new();
        b.start_element(QName::new("e"));
        b.attribute(QName::new("x"), "1").unwrap();
        b.text("t");
        b.end_element().unwrap();
        let doc = b.finish().unwrap();
        let e = doc.document_element().unwrap();
        assert_eq!(doc.children(e).len(), 1);
        assert_eq!(doc.attributes(e).len(), 1);
        let parents = doc.parent_index();
        assert_eq!(parents[doc.attributes(e)[0].index()], Some(e));
    }

    #[test]
    fn test_unbalanced_construction() {
        let mut b = TreeBuilder::new();
        assert_eq!(b.end_element(), Err(TreeError::NoOpenElement));
        b.start_element(QName::new("open"));
        assert_eq!(b.finish().unwrap_err(), TreeError::UnclosedElements(1));
    }
}
