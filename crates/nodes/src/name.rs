//! Qualified names for the document node model.

use std::fmt;

/// A qualified name: an optional namespace prefix plus a local part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    /// Parses `prefix:local` or a bare local name.
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((prefix, local)) => Self::with_prefix(prefix, local),
            None => Self::new(name),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{}:{}", p, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(QName::parse("para"), QName::new("para"));
        assert_eq!(QName::parse("xml:lang"), QName::with_prefix("xml", "lang"));
        assert_eq!(QName::with_prefix("fo", "block").to_string(), "fo:block");
        assert_eq!(QName::new("div").to_string(), "div");
    }
}
