//! Sample documents, publicly available for integration testing in
//! downstream crates.

use crate::name::QName;
use crate::tree::{Document, TreeBuilder};

/// Builds the standard sample tree used across the workspace's test suites:
///
/// ```xml
/// <root>
///   <para id="p1" xml:lang="en">Hello</para>
///   <!-- comment node -->
///   <div></div>
///   <?pi-target pi-value?>
///   <para>World</para>
/// </root>
/// ```
pub fn sample_document() -> Document {
    let mut b = TreeBuilder::new();
    b.start_element(QName::new("root"));

    b.start_element(QName::new("para"));
    b.attribute(QName::new("id"), "p1").unwrap();
    b.attribute(QName::with_prefix("xml", "lang"), "en").unwrap();
    b.text("Hello");
    b.end_element().unwrap();

    b.comment(" comment node ");

    b.start_element(QName::new("div"));
    b.end_element().unwrap();

    b.processing_instruction("pi-target", "pi-value");

    b.start_element(QName::new("para"));
    b.text("World");
    b.end_element().unwrap();

    b.end_element().unwrap();
    b.finish().unwrap()
}
