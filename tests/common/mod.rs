//! Shared helpers for the integration suites.

use xpress::nodes::{Document, QName, TreeBuilder};

/// Parses XML with roxmltree and rebuilds it as an xpress document.
pub fn document_from_xml(xml: &str) -> Document {
    let parsed = roxmltree::Document::parse(xml).expect("well-formed test XML");
    let mut builder = TreeBuilder::new();
    build_element(&mut builder, parsed.root_element());
    builder.finish().expect("balanced construction")
}

fn build_element(builder: &mut TreeBuilder, node: roxmltree::Node<'_, '_>) {
    builder.start_element(element_name(&node));

    for attr in node.attributes() {
        let name = match attr.namespace().and_then(|ns| node.lookup_prefix(ns)) {
            Some(prefix) if !prefix.is_empty() => QName::with_prefix(prefix, attr.name()),
            _ => QName::new(attr.name()),
        };
        builder.attribute(name, attr.value()).expect("open element");
    }

    for child in node.children() {
        if child.is_element() {
            build_element(builder, child);
        } else if child.is_text() {
            builder.text(child.text().unwrap_or_default());
        } else if child.is_comment() {
            builder.comment(child.text().unwrap_or_default());
        } else if child.is_pi() {
            if let Some(pi) = child.pi() {
                builder.processing_instruction(pi.target, pi.value.unwrap_or_default());
            }
        }
    }

    builder.end_element().expect("balanced element");
}

fn element_name(node: &roxmltree::Node<'_, '_>) -> QName {
    let tag = node.tag_name();
    match tag.namespace().and_then(|ns| node.lookup_prefix(ns)) {
        Some(prefix) if !prefix.is_empty() => QName::with_prefix(prefix, tag.name()),
        _ => QName::new(tag.name()),
    }
}
