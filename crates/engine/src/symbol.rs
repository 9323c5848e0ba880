//! The symbol registry: one entry per grammar symbol, carrying its tokenizer
//! pattern, binding powers, role set and behavior functions.
//!
//! Registration is incremental and merging: re-registering a symbol raises
//! binding powers monotonically and rebinds behaviors, but never creates a
//! second identity for the same symbol. The registry is closed and validated
//! by [`GrammarBuilder::build`](crate::parser::GrammarBuilder::build), after
//! which it is immutable and freely shareable.

use crate::context::DynamicContext;
use crate::error::EngineError;
use crate::parser::Parser;
use crate::token::Token;
use crate::value::{Item, Value};
use std::collections::HashMap;

/// Grammatical role of a symbol.
///
/// A symbol class may carry several roles (one lexeme serving different
/// grammatical purposes); each token instance fixes exactly one of them
/// during `nud`/`led` and keeps it for the rest of its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Symbol,
    Literal,
    Name,
    Variable,
    Operator,
    Function,
    Axis,
    KindTest,
    Constructor,
}

/// Associativity of an infix symbol; set to `Right` by the `infixr`
/// registration helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// How a token parses itself at the start of an expression.
pub type NudFn = fn(&mut Parser<'_>, Token) -> Result<Token, EngineError>;

/// How a token continues an expression given the already-parsed left operand.
pub type LedFn = fn(&mut Parser<'_>, Token, Token) -> Result<Token, EngineError>;

/// Computes the token's value against a dynamic context.
pub type EvalFn = fn(&Token, &mut DynamicContext) -> Result<Value, EngineError>;

/// A lazily produced sequence of items.
pub type ItemStream<'a> = Box<dyn Iterator<Item = Result<Item, EngineError>> + 'a>;

/// Streaming counterpart of [`EvalFn`]: the stream owns the context it was
/// given, so producing items never mutates the caller's context.
pub type SelectFn = for<'a> fn(&'a Token, DynamicContext) -> Result<ItemStream<'a>, EngineError>;

/// The synthesized class of one grammar symbol: shared by every token
/// instance of that symbol.
#[derive(Debug, Clone)]
pub struct SymbolClass {
    pub symbol: String,
    pub pattern: String,
    pub lbp: u32,
    pub rbp: u32,
    pub roles: Vec<Role>,
    pub assoc: Assoc,
    pub nud: Option<NudFn>,
    pub led: Option<LedFn>,
    pub evaluate: Option<EvalFn>,
    pub select: Option<SelectFn>,
}

impl SymbolClass {
    fn new(symbol: &str, pattern: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            pattern,
            lbp: 0,
            rbp: 0,
            roles: vec![Role::Symbol],
            assoc: Assoc::Left,
            nud: None,
            led: None,
            evaluate: None,
            select: None,
        }
    }

    /// The role a fresh token instance starts with, before `nud`/`led`
    /// resolve a multi-role symbol.
    pub fn default_role(&self) -> Role {
        self.roles.first().copied().unwrap_or(Role::Symbol)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Internal symbols (`(name)`, `(end)`, …) classify tokenizer matches and
    /// never appear as lexemes, so they contribute no tokenizer pattern.
    pub fn is_internal(&self) -> bool {
        self.symbol.len() > 1 && self.symbol.starts_with('(') && self.symbol.ends_with(')')
    }
}

/// Synthesizes the default pattern for a symbol: the escaped literal text,
/// word-boundary anchored for alphabetic symbols, and with whitespace-tolerant
/// joints between the characters of multi-character punctuation (`::`, `//`)
/// so that incidental inner whitespace still matches.
pub fn default_pattern(symbol: &str) -> String {
    if symbol.chars().all(|c| c.is_alphabetic() || c == '-') {
        format!(r"\b{}\b", regex::escape(symbol))
    } else if symbol.chars().count() > 1 {
        let parts: Vec<String> = symbol
            .chars()
            .map(|c| regex::escape(&c.to_string()))
            .collect();
        parts.join(r"\s*")
    } else {
        regex::escape(symbol)
    }
}

/// The mutable symbol table a grammar is built into.
#[derive(Debug, Default)]
pub struct Registry {
    classes: HashMap<String, SymbolClass>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolClass> {
        self.classes.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.classes.contains_key(symbol)
    }

    /// Registers a symbol or merges into its existing entry: binding powers
    /// are only ever raised, roles are replaced when non-empty, and the
    /// returned reference lets the caller rebind behavior functions.
    pub fn register(
        &mut self,
        symbol: &str,
        pattern: Option<&str>,
        lbp: u32,
        rbp: u32,
        roles: &[Role],
    ) -> &mut SymbolClass {
        let class = self.classes.entry(symbol.to_string()).or_insert_with(|| {
            let pattern = pattern
                .map(str::to_string)
                .unwrap_or_else(|| default_pattern(symbol));
            SymbolClass::new(symbol, pattern)
        });
        if let Some(p) = pattern {
            class.pattern = p.to_string();
        }
        class.lbp = class.lbp.max(lbp);
        class.rbp = class.rbp.max(rbp);
        if !roles.is_empty() {
            class.roles = roles.to_vec();
        }
        class
    }

    /// Removes a symbol's whole definition; used when a derived grammar must
    /// replace a symbol rather than extend it.
    pub fn unregister(&mut self, symbol: &str) -> Option<SymbolClass> {
        self.classes.remove(symbol)
    }

    pub fn classes(&self) -> impl Iterator<Item = &SymbolClass> {
        self.classes.values()
    }

    pub fn into_classes(self) -> HashMap<String, SymbolClass> {
        self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns() {
        assert_eq!(default_pattern("and"), r"\band\b");
        assert_eq!(default_pattern("following-sibling"), r"\bfollowing\-sibling\b");
        assert_eq!(default_pattern("::"), r":\s*:");
        assert_eq!(default_pattern("//"), r"/\s*/");
        assert_eq!(default_pattern("*"), r"\*");
        assert_eq!(default_pattern("["), r"\[");
    }

    #[test]
    fn test_register_merges_monotonically() {
        let mut reg = Registry::new();
        reg.register("+", None, 40, 40, &[Role::Operator]);
        reg.register("+", None, 10, 10, &[]);
        let class = reg.get("+").unwrap();
        assert_eq!(class.lbp, 40);
        assert_eq!(class.rbp, 40);
        assert_eq!(class.roles, vec![Role::Operator]);

        reg.register("+", None, 50, 0, &[]);
        assert_eq!(reg.get("+").unwrap().lbp, 50);
    }

    #[test]
    fn test_unregister_removes_identity() {
        let mut reg = Registry::new();
        reg.register("if", None, 0, 0, &[Role::Operator]);
        assert!(reg.contains("if"));
        reg.unregister("if");
        assert!(!reg.contains("if"));
    }

    #[test]
    fn test_internal_symbols() {
        let mut reg = Registry::new();
        reg.register("(name)", None, 0, 0, &[Role::Name]);
        reg.register("(", None, 0, 0, &[Role::Symbol]);
        assert!(reg.get("(name)").unwrap().is_internal());
        assert!(!reg.get("(").unwrap().is_internal());
    }
}
