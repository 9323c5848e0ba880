//! The parse-tree node: simultaneously a grammar-rule instance (precedence,
//! role) and an evaluable AST node (ordered operands, behavior dispatch).

use crate::context::DynamicContext;
use crate::error::EngineError;
use crate::symbol::{Assoc, ItemStream, Role, SymbolClass};
use crate::value::Value;
use rust_decimal::Decimal;
use std::sync::Arc;
use xpress_nodes::QName;

/// Literal payload of a leaf token.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Decimal(Decimal),
    Double(f64),
    Name(String),
    QualifiedName(QName),
}

impl Literal {
    /// The bare text of the payload, used by `tree()` renderings.
    pub fn lexeme(&self) -> String {
        match self {
            Literal::String(s) => s.clone(),
            Literal::Integer(i) => i.to_string(),
            Literal::Decimal(d) => d.to_string(),
            Literal::Double(d) => d.to_string(),
            Literal::Name(n) => n.clone(),
            Literal::QualifiedName(q) => q.to_string(),
        }
    }

    /// A re-parseable rendering: strings get their quotes and escapes back.
    pub fn to_source(&self) -> String {
        match self {
            Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
            other => other.lexeme(),
        }
    }
}

/// A node of the parse tree. Built once during parsing; immutable during
/// evaluation. The tree is owned top-down: operands belong exclusively to
/// their parent, the root to the caller.
#[derive(Debug, Clone)]
pub struct Token {
    class: Arc<SymbolClass>,
    /// The concrete role, fixed during `nud`/`led` for multi-role symbols.
    pub role: Role,
    pub value: Option<Literal>,
    pub operands: Vec<Token>,
    /// Byte offset of the originating match, for diagnostics.
    pub offset: usize,
}

impl Token {
    pub fn new(class: Arc<SymbolClass>, offset: usize) -> Self {
        let role = class.default_role();
        Self {
            class,
            role,
            value: None,
            operands: Vec::new(),
            offset,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.class.symbol
    }

    pub fn class(&self) -> &SymbolClass {
        &self.class
    }

    pub fn lbp(&self) -> u32 {
        self.class.lbp
    }

    pub fn rbp(&self) -> u32 {
        self.class.rbp
    }

    pub fn is(&self, symbol: &str) -> bool {
        self.class.symbol == symbol
    }

    /// Number of operands: 0 for leaves, 1 for unary, 2 for binary, N for
    /// variadic forms.
    pub fn arity(&self) -> usize {
        self.operands.len()
    }

    /// A fully parenthesized structural rendering, a pure function of the
    /// `(symbol, value, operands)` triple.
    pub fn tree(&self) -> String {
        if self.operands.is_empty() {
            match &self.value {
                Some(v) => format!("({})", v.lexeme()),
                None => format!("({})", self.symbol()),
            }
        } else {
            let operands: Vec<String> = self.operands.iter().map(Token::tree).collect();
            format!("({} {})", self.symbol(), operands.join(" "))
        }
    }

    /// Reconstructs a normalized textual form of the expression. Operand
    /// rendering is precedence-aware, so re-parsing the result yields a tree
    /// with the same `tree()` rendering.
    pub fn source(&self) -> String {
        match self.role {
            Role::Literal | Role::Name => match &self.value {
                Some(v) => v.to_source(),
                None => self.symbol().to_string(),
            },
            Role::Variable => match self.operands.first() {
                Some(name) => format!("${}", name.source()),
                None => format!("${}", self.value.as_ref().map(Literal::lexeme).unwrap_or_default()),
            },
            Role::Function | Role::KindTest | Role::Constructor => {
                let args: Vec<String> = self.operands.iter().map(Token::source).collect();
                format!("{}({})", self.symbol(), args.join(", "))
            }
            Role::Axis => match self.operands.first() {
                Some(test) => format!("{}::{}", self.symbol(), test.source()),
                None => self.symbol().to_string(),
            },
            Role::Operator | Role::Symbol => self.operator_source(),
        }
    }

    fn operator_source(&self) -> String {
        match (self.symbol(), self.arity()) {
            ("/", 0) => "/".to_string(),
            ("/", 1) => format!("/{}", self.operands[0].source()),
            ("/" | "//", 2) => format!(
                "{}{}{}",
                self.operand_source(0, Side::Left),
                self.symbol(),
                self.operands[1].source()
            ),
            ("//", 1) => format!("//{}", self.operands[0].source()),
            ("[", 2) => format!(
                "{}[{}]",
                self.operand_source(0, Side::Left),
                self.operands[1].source()
            ),
            ("@", 1) => format!("@{}", self.operands[0].source()),
            (sym, 0) => sym.to_string(),
            // A led-only unary symbol is a postfix operator.
            (sym, 1) if self.class.led.is_some() && self.class.nud.is_none() => {
                format!("{}{}", self.operand_source(0, Side::Left), sym)
            }
            (sym, 1) if sym.chars().all(char::is_alphabetic) => {
                format!("{} {}", sym, self.operand_source(0, Side::Right))
            }
            (sym, 1) => format!("{}{}", sym, self.operand_source(0, Side::Right)),
            (sym, 2) => format!(
                "{} {} {}",
                self.operand_source(0, Side::Left),
                sym,
                self.operand_source(1, Side::Right)
            ),
            (sym, _) => {
                let args: Vec<String> = self.operands.iter().map(Token::source).collect();
                format!("{}({})", sym, args.join(", "))
            }
        }
    }

    fn operand_source(&self, index: usize, side: Side) -> String {
        let child = &self.operands[index];
        let wrap = matches!(child.role, Role::Operator)
            && child.arity() > 0
            && (child.lbp() < self.lbp()
                || (child.lbp() == self.lbp() && side != self.binding_side()));
        if wrap {
            format!("({})", child.source())
        } else {
            child.source()
        }
    }

    /// The side on which an equal-precedence operand may stay unwrapped.
    fn binding_side(&self) -> Side {
        match self.class.assoc {
            Assoc::Left => Side::Left,
            Assoc::Right => Side::Right,
        }
    }

    /// In-order traversal: the first operand's subtree, this node, then the
    /// remaining operands' subtrees. Every node appears exactly once.
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        let mut nodes = Vec::new();
        self.collect_in_order(&mut nodes);
        nodes.into_iter()
    }

    fn collect_in_order<'a>(&'a self, out: &mut Vec<&'a Token>) {
        let mut operands = self.operands.iter();
        if let Some(first) = operands.next() {
            first.collect_in_order(out);
        }
        out.push(self);
        for operand in operands {
            operand.collect_in_order(out);
        }
    }

    /// Computes the token's value. Falls back to draining `select` when only
    /// the streaming behavior is attached.
    pub fn evaluate(&self, context: &mut DynamicContext) -> Result<Value, EngineError> {
        if let Some(evaluate) = self.class.evaluate {
            evaluate(self, context)
        } else if let Some(select) = self.class.select {
            let items = select(self, context.clone())?.collect::<Result<Vec<_>, _>>()?;
            Ok(Value::from_items(items))
        } else {
            Err(self.unsupported())
        }
    }

    /// Streaming counterpart of `evaluate`: items are produced on demand and
    /// the stream owns its own context copy, so the caller's context is never
    /// disturbed. Falls back to a fully evaluated sequence when only
    /// `evaluate` is attached.
    pub fn select(&self, context: &DynamicContext) -> Result<ItemStream<'_>, EngineError> {
        if let Some(select) = self.class.select {
            select(self, context.clone())
        } else if let Some(evaluate) = self.class.evaluate {
            let mut scratch = context.clone();
            let value = evaluate(self, &mut scratch)?;
            Ok(Box::new(value.into_items().into_iter().map(Ok)))
        } else {
            Err(self.unsupported())
        }
    }

    fn unsupported(&self) -> EngineError {
        EngineError::type_error(format!(
            "symbol '{}' is not supported in this position",
            self.symbol()
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}
