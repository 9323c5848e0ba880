//! xpress: an extensible TDOP expression engine for XPath-style query
//! languages over tree documents.
//!
//! The workspace splits into four crates, re-exported here:
//!
//! - [`nodes`]: the arena document node model
//! - [`datatypes`]: XSD-style atomic values, durations and timezones
//! - [`engine`]: the symbol registry, tokenizer compiler, Pratt parser and
//!   dynamic evaluation context
//! - [`xpath1`]: the XPath 1.0-style grammar layer and selector API
//!
//! # Example
//!
//! ```ignore
//! use xpress::{TreeBuilder, QName, compile};
//!
//! let mut builder = TreeBuilder::new();
//! builder.start_element(QName::new("a"));
//! builder.start_element(QName::new("b"));
//! builder.end_element()?;
//! builder.end_element()?;
//! let document = std::rc::Rc::new(builder.finish()?);
//!
//! let nodes = compile("/a/b")?.select_nodes(&document)?;
//! ```

pub use xpress_datatypes as datatypes;
pub use xpress_engine as engine;
pub use xpress_nodes as nodes;
pub use xpress_xpath1 as xpath1;

pub use xpress_engine::{DynamicContext, EngineError, Grammar, GrammarBuilder, Token, Value};
pub use xpress_nodes::{Document, NodeId, QName, TreeBuilder};
pub use xpress_xpath1::{Selector, compile};
