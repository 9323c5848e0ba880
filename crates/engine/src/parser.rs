//! Grammar building and Pratt/TDOP precedence parsing.
//!
//! A grammar is assembled through [`GrammarBuilder`]'s registration helpers
//! (`literal`, `prefix`, `infix`, `infixr`, `postfix`, or raw [`register`]
//! for bespoke symbols), then closed with [`GrammarBuilder::build`], which
//! runs the declared-symbol closure check and compiles the tokenizer. The
//! resulting [`Grammar`] is immutable and may be shared by any number of
//! parsers.
//!
//! [`register`]: GrammarBuilder::register

use crate::context::DynamicContext;
use crate::error::EngineError;
use crate::symbol::{Assoc, EvalFn, Registry, Role, SymbolClass};
use crate::token::{Literal, Token};
use crate::tokenizer::{MatchKind, TokenMatch, TokenStream, Tokenizer};
use crate::value::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Internal symbol signalling end of input.
pub const END: &str = "(end)";
/// Internal symbol classes the tokenizer's literal and name matches resolve
/// to. A grammar that wants a literal kind registers the matching class.
pub const STRING_LITERAL: &str = "(string)";
pub const INTEGER_LITERAL: &str = "(integer)";
pub const DECIMAL_LITERAL: &str = "(decimal)";
pub const DOUBLE_LITERAL: &str = "(double)";
pub const NAME: &str = "(name)";

/// A closed, validated grammar: the frozen symbol table plus its compiled
/// tokenizer. Shared, read-only, and reusable across concurrent parsers.
#[derive(Debug)]
pub struct Grammar {
    classes: HashMap<String, Arc<SymbolClass>>,
    tokenizer: Tokenizer,
}

impl Grammar {
    pub fn class(&self, symbol: &str) -> Option<&Arc<SymbolClass>> {
        self.classes.get(symbol)
    }

    /// Tokenizes and parses `source` into its root token in one pass.
    pub fn parse<'a>(&'a self, source: &'a str) -> Result<Token, EngineError> {
        let mut parser = Parser::new(self, source)?;
        let root = parser.expression(0)?;
        parser.expect_end()?;
        Ok(root)
    }
}

/// Incrementally builds a [`Grammar`]. Construction pre-registers the
/// `(end)` symbol; everything else comes from the grammar layer.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    registry: Registry,
    declared: Vec<String>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        let mut registry = Registry::new();
        registry.register(END, None, 0, 0, &[Role::Symbol]);
        Self {
            registry,
            declared: Vec::new(),
        }
    }

    /// Declares the symbol set this grammar requires. [`build`] fails with a
    /// name error if a declared symbol never received a registry entry.
    ///
    /// [`build`]: GrammarBuilder::build
    pub fn declare(&mut self, symbols: &[&str]) {
        self.declared.extend(symbols.iter().map(|s| s.to_string()));
    }

    /// Raw registration with the default synthesized pattern; see
    /// [`Registry::register`] for the merge semantics.
    pub fn register(&mut self, symbol: &str, lbp: u32, rbp: u32, roles: &[Role]) -> &mut SymbolClass {
        self.registry.register(symbol, None, lbp, rbp, roles)
    }

    pub fn register_with_pattern(
        &mut self,
        symbol: &str,
        pattern: &str,
        lbp: u32,
        rbp: u32,
        roles: &[Role],
    ) -> &mut SymbolClass {
        self.registry.register(symbol, Some(pattern), lbp, rbp, roles)
    }

    /// Removes a symbol's definition so a derived grammar can re-register it
    /// with a different role set.
    pub fn unregister(&mut self, symbol: &str) {
        self.registry.unregister(symbol);
    }

    /// Rebinds behaviors on an already registered symbol; a name error if the
    /// symbol is unknown.
    pub fn bind(&mut self, symbol: &str) -> Result<&mut SymbolClass, EngineError> {
        if !self.registry.contains(symbol) {
            return Err(EngineError::name(format!(
                "cannot bind behavior to unregistered symbol '{}'",
                symbol
            )));
        }
        Ok(self.registry.register(symbol, None, 0, 0, &[]))
    }

    /// A self-evaluating literal class: `nud` yields the token itself and
    /// `evaluate` its payload.
    pub fn literal(&mut self, symbol: &str) -> &mut SymbolClass {
        let class = self.registry.register(symbol, None, 0, 0, &[Role::Literal]);
        class.nud = Some(nud_literal);
        class.evaluate = Some(eval_literal);
        class
    }

    /// A prefix operator: `nud` parses one operand at binding power `bp`.
    pub fn prefix(&mut self, symbol: &str, bp: u32, evaluate: EvalFn) -> &mut SymbolClass {
        let class = self.registry.register(symbol, None, 0, bp, &[Role::Operator]);
        class.nud = Some(nud_prefix);
        class.evaluate = Some(evaluate);
        class
    }

    /// A left-associative infix operator: `led` parses the right operand at
    /// binding power `bp` and stores `[left, right]`.
    pub fn infix(&mut self, symbol: &str, bp: u32, evaluate: EvalFn) -> &mut SymbolClass {
        let class = self.registry.register(symbol, None, bp, bp, &[Role::Operator]);
        class.led = Some(led_infix);
        class.evaluate = Some(evaluate);
        class
    }

    /// A right-associative infix operator: the right operand recurses at
    /// `bp - 1`, so an equal-precedence sibling binds rightward.
    pub fn infixr(&mut self, symbol: &str, bp: u32, evaluate: EvalFn) -> &mut SymbolClass {
        let class = self.registry.register(symbol, None, bp, bp, &[Role::Operator]);
        class.assoc = Assoc::Right;
        class.led = Some(led_infixr);
        class.evaluate = Some(evaluate);
        class
    }

    /// A postfix operator: `led` stores the single left operand.
    pub fn postfix(&mut self, symbol: &str, bp: u32, evaluate: EvalFn) -> &mut SymbolClass {
        let class = self.registry.register(symbol, None, bp, bp, &[Role::Operator]);
        class.led = Some(led_postfix);
        class.evaluate = Some(evaluate);
        class
    }

    /// Closure check, tokenizer compilation, and freeze.
    pub fn build(self) -> Result<Grammar, EngineError> {
        for symbol in &self.declared {
            if !self.registry.contains(symbol) {
                return Err(EngineError::name(format!(
                    "declared symbol '{}' has no registry entry",
                    symbol
                )));
            }
        }
        let tokenizer = Tokenizer::compile(&self.registry)?;
        let classes = self
            .registry
            .into_classes()
            .into_iter()
            .map(|(symbol, class)| (symbol, Arc::new(class)))
            .collect();
        Ok(Grammar { classes, tokenizer })
    }
}

// Standard nud/led shapes installed by the registration helpers; public so
// grammar layers can reuse them in bespoke registrations.

pub fn nud_literal(_parser: &mut Parser<'_>, token: Token) -> Result<Token, EngineError> {
    Ok(token)
}

pub fn nud_prefix(parser: &mut Parser<'_>, mut token: Token) -> Result<Token, EngineError> {
    let operand = parser.expression(token.rbp())?;
    token.role = Role::Operator;
    token.operands.push(operand);
    Ok(token)
}

pub fn led_infix(parser: &mut Parser<'_>, mut token: Token, left: Token) -> Result<Token, EngineError> {
    let right = parser.expression(token.lbp())?;
    token.role = Role::Operator;
    token.operands = vec![left, right];
    Ok(token)
}

pub fn led_infixr(
    parser: &mut Parser<'_>,
    mut token: Token,
    left: Token,
) -> Result<Token, EngineError> {
    let right = parser.expression(token.lbp() - 1)?;
    token.role = Role::Operator;
    token.operands = vec![left, right];
    Ok(token)
}

pub fn led_postfix(
    _parser: &mut Parser<'_>,
    mut token: Token,
    left: Token,
) -> Result<Token, EngineError> {
    token.role = Role::Operator;
    token.operands = vec![left];
    Ok(token)
}

/// The literal payload as a one-item sequence.
pub fn eval_literal(token: &Token, _context: &mut DynamicContext) -> Result<Value, EngineError> {
    match &token.value {
        Some(Literal::String(s)) => Ok(Value::from_string(s.clone())),
        Some(Literal::Integer(i)) => Ok(Value::from_integer(*i)),
        Some(Literal::Decimal(d)) => Ok(Value::from_decimal(*d)),
        Some(Literal::Double(d)) => Ok(Value::from_double(*d)),
        _ => Err(EngineError::type_error(format!(
            "token '{}' has no literal payload to evaluate",
            token.symbol()
        ))),
    }
}

/// Parse progress over one `parse` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Ready,
    Parsing,
    Exhausted,
}

/// Transient, per-call parsing state: the match stream plus a one-token
/// lookahead window. Create one per source string; the grammar it borrows is
/// shared and immutable.
pub struct Parser<'a> {
    grammar: &'a Grammar,
    source: &'a str,
    stream: TokenStream<'a, 'a>,
    lookahead: Token,
    current_symbol: Option<String>,
    previous_symbol: Option<String>,
    state: ParserState,
}

impl<'a> Parser<'a> {
    pub fn new(grammar: &'a Grammar, source: &'a str) -> Result<Self, EngineError> {
        let mut stream = grammar.tokenizer.scan(source);
        let first = stream.next();
        let lookahead = classify(grammar, source, first)?;
        Ok(Self {
            grammar,
            source,
            stream,
            lookahead,
            current_symbol: None,
            previous_symbol: None,
            state: ParserState::Ready,
        })
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn lookahead(&self) -> &Token {
        &self.lookahead
    }

    pub fn lookahead_is(&self, symbol: &str) -> bool {
        self.lookahead.is(symbol)
    }

    /// Shifts the lookahead window by one and returns the consumed token.
    /// Advancing again after end of input is an error.
    pub fn advance(&mut self) -> Result<Token, EngineError> {
        if self.state == ParserState::Exhausted {
            return Err(self.error_at(self.source.len(), None, "input is already exhausted"));
        }
        self.state = if self.lookahead.is(END) {
            ParserState::Exhausted
        } else {
            ParserState::Parsing
        };
        let next = classify(self.grammar, self.source, self.stream.next())?;
        let consumed = std::mem::replace(&mut self.lookahead, next);
        self.previous_symbol = self.current_symbol.take();
        self.current_symbol = Some(consumed.symbol().to_string());
        Ok(consumed)
    }

    /// Like [`advance`], but requires the lookahead to be one of `expected`
    /// (a closing bracket, a keyword) before consuming it.
    ///
    /// [`advance`]: Parser::advance
    pub fn advance_expected(&mut self, expected: &[&str]) -> Result<Token, EngineError> {
        if expected.iter().any(|s| self.lookahead.is(s)) {
            self.advance()
        } else {
            let wanted = expected.join("' or '");
            Err(self.syntax_error(
                &self.lookahead.clone(),
                format!("expected '{}'", wanted),
            ))
        }
    }

    /// The core precedence-climbing loop: `nud` the next token into an
    /// initial left node, then fold in every following token whose
    /// left-binding power exceeds `rbp`.
    pub fn expression(&mut self, rbp: u32) -> Result<Token, EngineError> {
        let token = self.advance()?;
        let mut left = self.nud(token)?;
        while self.lookahead.lbp() > rbp {
            let token = self.advance()?;
            left = self.led(token, left)?;
        }
        Ok(left)
    }

    fn nud(&mut self, token: Token) -> Result<Token, EngineError> {
        match token.class().nud {
            Some(nud) => nud(self, token),
            None => Err(self.syntax_error(&token, "symbol cannot start an expression")),
        }
    }

    fn led(&mut self, token: Token, left: Token) -> Result<Token, EngineError> {
        match token.class().led {
            Some(led) => led(self, token, left),
            None => Err(self.syntax_error(&token, "symbol cannot continue an expression")),
        }
    }

    /// Requires that the whole source has been consumed, and consumes the
    /// end-of-input token.
    pub fn expect_end(&mut self) -> Result<(), EngineError> {
        if !self.lookahead.is(END) {
            let token = self.lookahead.clone();
            return Err(self.syntax_error(&token, "unexpected symbol after the expression"));
        }
        self.advance()?;
        Ok(())
    }

    /// A syntax error anchored at `token`, identifying the offending symbol,
    /// the previously accepted token, and the 1-based source position.
    pub fn syntax_error(&self, token: &Token, message: impl Into<String>) -> EngineError {
        // If the offending token was already consumed it sits in the current
        // slot; the accepted one before it is then the previous slot.
        let accepted = if self.current_symbol.as_deref() == Some(token.symbol()) {
            &self.previous_symbol
        } else {
            &self.current_symbol
        };
        let message = match accepted {
            Some(prev) => format!("'{}' {} (after '{}')", token.symbol(), message.into(), prev),
            None => format!("'{}' {}", token.symbol(), message.into()),
        };
        self.error_at(token.offset, Some(token.symbol().to_string()), message)
    }

    fn error_at(
        &self,
        offset: usize,
        symbol: Option<String>,
        message: impl Into<String>,
    ) -> EngineError {
        let (line, column) = position_of(self.source, offset);
        EngineError::Syntax {
            message: message.into(),
            symbol,
            line,
            column,
        }
    }
}

/// 1-based line and column of a byte offset, computed by scanning the source
/// up to the offset.
fn position_of(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let upto = &source[..offset];
    let line_start = upto.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (upto.matches('\n').count() + 1, offset - line_start + 1)
}

/// Instantiates the token class for one raw match; `None` is end of input.
fn classify(
    grammar: &Grammar,
    source: &str,
    m: Option<TokenMatch>,
) -> Result<Token, EngineError> {
    let class_for = |symbol: &str| {
        grammar.class(symbol).cloned().ok_or_else(|| {
            EngineError::name(format!("grammar has no entry for symbol '{}'", symbol))
        })
    };

    let Some(m) = m else {
        return Ok(Token::new(class_for(END)?, source.len()));
    };

    let bad_literal = |kind: &str| {
        EngineError::value(format!("'{}' is not a valid {} literal", m.text, kind))
    };
    let mut token;
    match m.kind {
        MatchKind::String => {
            token = Token::new(class_for(STRING_LITERAL)?, m.start);
            token.value = Some(Literal::String(unquote(&m.text)));
        }
        MatchKind::Integer => {
            token = Token::new(class_for(INTEGER_LITERAL)?, m.start);
            let i = m.text.parse::<i64>().map_err(|_| bad_literal("integer"))?;
            token.value = Some(Literal::Integer(i));
        }
        MatchKind::Decimal => {
            token = Token::new(class_for(DECIMAL_LITERAL)?, m.start);
            let d = rust_decimal::Decimal::from_str(&m.text).map_err(|_| bad_literal("decimal"))?;
            token.value = Some(Literal::Decimal(d));
        }
        MatchKind::Double => {
            token = Token::new(class_for(DOUBLE_LITERAL)?, m.start);
            let d = m.text.parse::<f64>().map_err(|_| bad_literal("double"))?;
            token.value = Some(Literal::Double(d));
        }
        MatchKind::Symbol => {
            token = Token::new(class_for(&m.text)?, m.start);
        }
        MatchKind::Name => {
            token = Token::new(class_for(NAME)?, m.start);
            token.value = Some(Literal::Name(m.text));
        }
        MatchKind::Unexpected => {
            let (line, column) = position_of(source, m.start);
            return Err(EngineError::Syntax {
                message: format!("unrecognized character '{}'", m.text),
                symbol: None,
                line,
                column,
            });
        }
    }
    Ok(token)
}

fn unquote(text: &str) -> String {
    let inner = &text[1..text.len().saturating_sub(1).max(1)];
    if text.starts_with('\'') {
        inner.replace("''", "'")
    } else {
        inner.replace("\"\"", "\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Item;
    use std::rc::Rc;
    use xpress_nodes::TreeBuilder;

    fn to_double(value: &Value) -> f64 {
        match value.single() {
            Some(Item::Atomic(a)) => a.to_double(),
            _ => f64::NAN,
        }
    }

    fn binary_doubles(token: &Token, ctx: &mut DynamicContext) -> Result<(f64, f64), EngineError> {
        let l = token.operands[0].evaluate(ctx)?;
        let r = token.operands[1].evaluate(ctx)?;
        Ok((to_double(&l), to_double(&r)))
    }

    fn eval_add(token: &Token, ctx: &mut DynamicContext) -> Result<Value, EngineError> {
        let (l, r) = binary_doubles(token, ctx)?;
        Ok(Value::from_double(l + r))
    }

    fn eval_mul(token: &Token, ctx: &mut DynamicContext) -> Result<Value, EngineError> {
        let (l, r) = binary_doubles(token, ctx)?;
        Ok(Value::from_double(l * r))
    }

    fn eval_pow(token: &Token, ctx: &mut DynamicContext) -> Result<Value, EngineError> {
        let (l, r) = binary_doubles(token, ctx)?;
        Ok(Value::from_double(l.powf(r)))
    }

    fn eval_minus(token: &Token, ctx: &mut DynamicContext) -> Result<Value, EngineError> {
        if token.arity() == 1 {
            let v = token.operands[0].evaluate(ctx)?;
            Ok(Value::from_double(-to_double(&v)))
        } else {
            let (l, r) = binary_doubles(token, ctx)?;
            Ok(Value::from_double(l - r))
        }
    }

    fn eval_fact(token: &Token, ctx: &mut DynamicContext) -> Result<Value, EngineError> {
        let v = to_double(&token.operands[0].evaluate(ctx)?) as i64;
        Ok(Value::from_double((1..=v).product::<i64>() as f64))
    }

    fn nud_paren(parser: &mut Parser<'_>, _token: Token) -> Result<Token, EngineError> {
        let inner = parser.expression(0)?;
        parser.advance_expected(&[")"])?;
        Ok(inner)
    }

    fn arithmetic() -> Grammar {
        let mut b = GrammarBuilder::new();
        b.declare(&["(integer)", "+", "*", "^", "-", "!", "(", ")"]);
        b.literal(INTEGER_LITERAL);
        b.infix("+", 40, eval_add);
        b.infix("*", 45, eval_mul);
        b.infixr("^", 60, eval_pow);
        b.infix("-", 40, eval_minus);
        b.prefix("-", 70, eval_minus);
        b.postfix("!", 80, eval_fact);
        b.register("(", 0, 0, &[Role::Symbol]).nud = Some(nud_paren);
        b.register(")", 0, 0, &[Role::Symbol]);
        b.build().unwrap()
    }

    fn empty_context() -> DynamicContext {
        DynamicContext::new(Rc::new(TreeBuilder::new().finish().unwrap()))
    }

    #[test]
    fn test_precedence_shapes() {
        let g = arithmetic();
        assert_eq!(g.parse("2 + 3 * 4").unwrap().tree(), "(+ (2) (* (3) (4)))");
        assert_eq!(g.parse("2 * 3 + 4").unwrap().tree(), "(+ (* (2) (3)) (4))");
    }

    #[test]
    fn test_right_associativity() {
        let g = arithmetic();
        assert_eq!(g.parse("2 ^ 3 ^ 4").unwrap().tree(), "(^ (2) (^ (3) (4)))");
        // Left-associative operators fold the other way.
        assert_eq!(g.parse("2 + 3 + 4").unwrap().tree(), "(+ (+ (2) (3)) (4))");
    }

    #[test]
    fn test_grouping_and_prefix() {
        let g = arithmetic();
        assert_eq!(g.parse("(2 + 3) * 4").unwrap().tree(), "(* (+ (2) (3)) (4))");
        assert_eq!(g.parse("-2 + 3").unwrap().tree(), "(+ (- (2)) (3))");
        assert_eq!(g.parse("3!").unwrap().tree(), "(! (3))");
    }

    #[test]
    fn test_evaluation() {
        let g = arithmetic();
        let mut ctx = empty_context();
        let root = g.parse("2 + 3 * 4").unwrap();
        assert_eq!(to_double(&root.evaluate(&mut ctx).unwrap()), 14.0);

        let root = g.parse("2 ^ 3 ^ 2").unwrap();
        assert_eq!(to_double(&root.evaluate(&mut ctx).unwrap()), 512.0);

        let root = g.parse("4! + 1").unwrap();
        assert_eq!(to_double(&root.evaluate(&mut ctx).unwrap()), 25.0);
    }

    #[test]
    fn test_source_round_trip() {
        let g = arithmetic();
        for expr in [
            "2 + 3 * 4",
            "(2 + 3) * 4",
            "2 ^ 3 ^ 4",
            "(2 ^ 3) ^ 4",
            "-(2 + 3)",
            "2 - (3 - 4)",
            "3! * 2",
        ] {
            let first = g.parse(expr).unwrap();
            let reparsed = g.parse(&first.source()).unwrap();
            assert_eq!(
                first.tree(),
                reparsed.tree(),
                "round trip diverged for '{}' via '{}'",
                expr,
                first.source()
            );
            // Normalization is idempotent.
            assert_eq!(first.source(), reparsed.source());
        }
    }

    #[test]
    fn test_in_order_iteration() {
        let g = arithmetic();
        let root = g.parse("2 + 3 * 4").unwrap();
        let symbols: Vec<&str> = root.iter().map(Token::symbol).collect();
        assert_eq!(
            symbols,
            vec!["(integer)", "+", "(integer)", "*", "(integer)"]
        );
        assert_eq!(root.iter().count(), 5);
    }

    #[test]
    fn test_syntax_error_position() {
        let g = arithmetic();
        let err = g.parse("2 +\n* 4").unwrap_err();
        match err {
            EngineError::Syntax {
                symbol,
                line,
                column,
                message,
            } => {
                assert_eq!(symbol.as_deref(), Some("*"));
                assert_eq!((line, column), (2, 1));
                assert!(message.contains("after '+'"));
            }
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_group() {
        let g = arithmetic();
        let err = g.parse("(2 + 3").unwrap_err();
        assert!(matches!(err, EngineError::Syntax { .. }));
        assert!(err.to_string().contains("expected ')'"));
    }

    #[test]
    fn test_unrecognized_character() {
        let g = arithmetic();
        let err = g.parse("2 # 3").unwrap_err();
        assert!(err.to_string().contains("unrecognized character '#'"));
    }

    #[test]
    fn test_trailing_input_rejected() {
        let g = arithmetic();
        assert!(matches!(
            g.parse("2 3").unwrap_err(),
            EngineError::Syntax { .. }
        ));
    }

    #[test]
    fn test_advance_past_end() {
        let g = arithmetic();
        let mut p = Parser::new(&g, "1").unwrap();
        assert_eq!(p.state(), ParserState::Ready);
        p.advance().unwrap(); // the literal
        p.advance().unwrap(); // (end)
        assert_eq!(p.state(), ParserState::Exhausted);
        assert!(p.advance().is_err());
    }

    #[test]
    fn test_bind_rebinds_behavior() {
        fn eval_always_one(_t: &Token, _c: &mut DynamicContext) -> Result<Value, EngineError> {
            Ok(Value::from_double(1.0))
        }

        let mut b = GrammarBuilder::new();
        b.literal(INTEGER_LITERAL);
        b.infix("+", 40, eval_add);
        // Re-registration rebinds behaviors without creating a new identity.
        b.bind("+").unwrap().evaluate = Some(eval_always_one);
        assert!(b.bind("nope").is_err());

        let g = b.build().unwrap();
        let root = g.parse("2 + 3").unwrap();
        let mut ctx = empty_context();
        assert_eq!(to_double(&root.evaluate(&mut ctx).unwrap()), 1.0);
    }

    #[test]
    fn test_closure_check() {
        let mut b = GrammarBuilder::new();
        b.declare(&["(integer)", "+", "missing"]);
        b.literal(INTEGER_LITERAL);
        b.infix("+", 40, eval_add);
        assert!(matches!(b.build(), Err(EngineError::Name(_))));
    }

    #[test]
    fn test_empty_source() {
        let g = arithmetic();
        assert!(matches!(g.parse(""), Err(EngineError::Syntax { .. })));
    }
}
