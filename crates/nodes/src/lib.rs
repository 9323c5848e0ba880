//! Arena-backed document node model.
//!
//! A [`Document`] owns every node of one tree in a flat arena; nodes are
//! addressed by [`NodeId`], which is assigned in document order. The
//! expression engine navigates this model exclusively through ids, so node
//! identity is stable and cheap to copy, and comparing two ids compares
//! document positions.
//!
//! Attribute and namespace nodes live in the arena alongside the containment
//! tree but are not children of their element; they are reachable only
//! through [`Document::attributes`] and [`Document::namespaces`].

pub mod name;
pub mod samples;
pub mod tree;

pub use name::QName;
pub use tree::{Document, NodeId, NodeKind, TreeBuilder, TreeError};
