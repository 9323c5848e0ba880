//! The tokenizer compiler: folds the whole symbol registry into one combined
//! regular expression and exposes a lazy match stream over source text.
//!
//! Alternative order is fixed: quoted-string and numeric literals first, then
//! registered symbol patterns (longest symbol first, so `::` is never
//! shadowed by `:`), then single-character symbols as one character class,
//! then the generic name pattern, then a catch-all for unexpected characters.
//! Whitespace matches nothing and is skipped by the scan.

use crate::error::EngineError;
use crate::symbol::Registry;
use regex::Regex;

const STRING_PATTERN: &str = r#"'(?:[^']|'')*'|"(?:[^"]|"")*""#;
const NUMBER_PATTERN: &str = r"(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?";
const NAME_PATTERN: &str = r"[^\W\d][\w.\-]*";

/// Classification of one raw match, refined from the capture group that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    String,
    Integer,
    Decimal,
    Double,
    Symbol,
    Name,
    Unexpected,
}

/// One lexeme: its classification, normalized text and byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub kind: MatchKind,
    pub text: String,
    pub start: usize,
}

/// A compiled tokenizer; immutable and shared by every parse of its grammar.
#[derive(Debug)]
pub struct Tokenizer {
    regex: Regex,
}

impl Tokenizer {
    pub fn compile(registry: &Registry) -> Result<Self, EngineError> {
        let mut multi: Vec<&crate::symbol::SymbolClass> = Vec::new();
        let mut single_chars: Vec<String> = Vec::new();

        for class in registry.classes() {
            if class.is_internal() {
                continue;
            }
            if class.pattern.chars().any(char::is_whitespace) {
                return Err(EngineError::value(format!(
                    "pattern for symbol '{}' contains raw whitespace and cannot be tokenized",
                    class.symbol
                )));
            }
            let is_plain_char = class.symbol.chars().count() == 1
                && class.pattern == regex::escape(&class.symbol);
            if is_plain_char {
                single_chars.push(class.pattern.clone());
            } else {
                multi.push(class);
            }
        }

        // Longest symbol first, so a symbol that prefixes another never
        // shadows the longer match.
        multi.sort_by(|a, b| {
            b.symbol
                .len()
                .cmp(&a.symbol.len())
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        let mut symbol_parts: Vec<String> = multi.iter().map(|c| c.pattern.clone()).collect();
        if !single_chars.is_empty() {
            single_chars.sort();
            symbol_parts.push(format!("[{}]", single_chars.concat()));
        }

        let symbol_pattern = if symbol_parts.is_empty() {
            // A grammar of only internal symbols; keep the group unmatchable.
            r"[^\s\S]".to_string()
        } else {
            symbol_parts.join("|")
        };

        let pattern = format!(
            r"(?P<string>{STRING_PATTERN})|(?P<number>{NUMBER_PATTERN})|(?P<symbol>{symbol_pattern})|(?P<name>{NAME_PATTERN})|(?P<other>\S)",
        );
        let regex = Regex::new(&pattern).map_err(|e| {
            EngineError::value(format!("tokenizer pattern failed to compile: {}", e))
        })?;
        Ok(Self { regex })
    }

    /// A lazy stream of matches over `source`; whitespace between matches is
    /// discarded.
    pub fn scan<'t, 's>(&'t self, source: &'s str) -> TokenStream<'t, 's> {
        TokenStream {
            inner: self.regex.captures_iter(source),
        }
    }
}

pub struct TokenStream<'t, 's> {
    inner: regex::CaptureMatches<'t, 's>,
}

impl Iterator for TokenStream<'_, '_> {
    type Item = TokenMatch;

    fn next(&mut self) -> Option<TokenMatch> {
        let caps = self.inner.next()?;
        let (kind, m) = if let Some(m) = caps.name("string") {
            (MatchKind::String, m)
        } else if let Some(m) = caps.name("number") {
            (classify_number(m.as_str()), m)
        } else if let Some(m) = caps.name("symbol") {
            (MatchKind::Symbol, m)
        } else if let Some(m) = caps.name("name") {
            (MatchKind::Name, m)
        } else {
            (MatchKind::Unexpected, caps.name("other")?)
        };

        let text = if kind == MatchKind::Symbol {
            // Normalize whitespace-tolerant joints back to the symbol text.
            m.as_str().chars().filter(|c| !c.is_whitespace()).collect()
        } else {
            m.as_str().to_string()
        };
        Some(TokenMatch {
            kind,
            text,
            start: m.start(),
        })
    }
}

fn classify_number(text: &str) -> MatchKind {
    if text.contains(['e', 'E']) {
        MatchKind::Double
    } else if text.contains('.') {
        MatchKind::Decimal
    } else {
        MatchKind::Integer
    }
}
