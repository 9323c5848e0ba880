//! XPath 1.0-style expression grammar and selector API.
//!
//! The grammar is assembled once through the engine's registration helpers
//! and shared process-wide; [`compile`] turns an expression into a reusable
//! [`Selector`] that evaluates against any [`Document`].
//!
//! # Example
//!
//! ```ignore
//! let selector = xpress_xpath1::compile("/library/book[@lang = 'en']")?;
//! let nodes = selector.select_nodes(&document)?;
//! ```

pub mod functions;
pub mod grammar;
pub mod operators;
pub mod paths;

use std::rc::Rc;
use std::sync::OnceLock;
use xpress_engine::{DynamicContext, EngineError, Grammar, Token, Value};
use xpress_nodes::{Document, NodeId};

/// The process-wide XPath 1.0 grammar, built on first use.
pub fn grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        grammar::build().expect("the built-in XPath 1.0 symbol table is consistent")
    })
}

/// Compiles an expression against the shared grammar.
pub fn compile(expression: &str) -> Result<Selector, EngineError> {
    Ok(Selector {
        root: grammar().parse(expression)?,
    })
}

/// A compiled expression: the parse tree plus convenience entry points.
/// Reusable across documents, contexts and threads of evaluation.
#[derive(Debug, Clone)]
pub struct Selector {
    root: Token,
}

impl Selector {
    /// The root of the parse tree, for diagnostics and tooling.
    pub fn token(&self) -> &Token {
        &self.root
    }

    /// Evaluates with a fresh root context over `document`.
    pub fn evaluate(&self, document: &Rc<Document>) -> Result<Value, EngineError> {
        let mut context = DynamicContext::new(Rc::clone(document));
        self.evaluate_with(&mut context)
    }

    /// Evaluates against a caller-prepared context (variables, timezone, or a
    /// non-root starting item).
    pub fn evaluate_with(&self, context: &mut DynamicContext) -> Result<Value, EngineError> {
        self.root.evaluate(context)
    }

    /// Evaluates and keeps the node items, in sequence order.
    pub fn select_nodes(&self, document: &Rc<Document>) -> Result<Vec<NodeId>, EngineError> {
        Ok(self.evaluate(document)?.nodes())
    }
}
