//! The xpress engine core: an extensible precedence-driven (Pratt/TDOP)
//! parser and a dynamic evaluation context over the document node model.
//!
//! A grammar layer registers its symbols through [`GrammarBuilder`], each
//! entry carrying a tokenizer pattern, binding powers, a role set and the
//! `nud`/`led`/`evaluate`/`select` behaviors, then freezes the result into a
//! [`Grammar`]. Parsing turns source text into a [`Token`] tree; evaluation
//! walks that tree against a [`DynamicContext`], which implements the
//! navigation axes with strict isolation between nested evaluations.
//!
//! # Key Types
//!
//! - [`Grammar`] / [`GrammarBuilder`]: the closed symbol registry plus its
//!   compiled tokenizer
//! - [`Token`]: grammar-rule instance and parse-tree node in one
//! - [`DynamicContext`]: current item, position/size, active axis, variables
//! - [`Value`]: an evaluation result sequence
//!
//! # Example
//!
//! ```ignore
//! let mut builder = GrammarBuilder::new();
//! builder.literal(INTEGER_LITERAL);
//! builder.infix("+", 40, eval_add);
//! let grammar = builder.build()?;
//!
//! let root = grammar.parse("1 + 2")?;
//! let value = root.evaluate(&mut DynamicContext::new(document))?;
//! ```

pub mod axes;
pub mod context;
pub mod error;
pub mod parser;
pub mod symbol;
pub mod token;
pub mod tokenizer;
pub mod value;

pub use axes::{Axis, AxisIter};
pub use context::DynamicContext;
pub use error::EngineError;
pub use parser::{
    DECIMAL_LITERAL, DOUBLE_LITERAL, END, Grammar, GrammarBuilder, INTEGER_LITERAL, NAME, Parser,
    ParserState, STRING_LITERAL,
};
pub use symbol::{Assoc, EvalFn, ItemStream, LedFn, NudFn, Registry, Role, SelectFn, SymbolClass};
pub use token::{Literal, Token};
pub use tokenizer::{MatchKind, TokenMatch, Tokenizer};
pub use value::{Item, Value};
