//! The atomic value union consumed by the expression engine.

use crate::duration::{DayTimeDuration, Duration, YearMonthDuration};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub enum AtomicValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    Double(f64),
    Duration(Duration),
    YearMonthDuration(YearMonthDuration),
    DayTimeDuration(DayTimeDuration),
    QName {
        prefix: Option<String>,
        local: String,
    },
    UntypedAtomic(String),
}

impl AtomicValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AtomicValue::String(_) => "xs:string",
            AtomicValue::Boolean(_) => "xs:boolean",
            AtomicValue::Integer(_) => "xs:integer",
            AtomicValue::Decimal(_) => "xs:decimal",
            AtomicValue::Double(_) => "xs:double",
            AtomicValue::Duration(_) => "xs:duration",
            AtomicValue::YearMonthDuration(_) => "xs:yearMonthDuration",
            AtomicValue::DayTimeDuration(_) => "xs:dayTimeDuration",
            AtomicValue::QName { .. } => "xs:QName",
            AtomicValue::UntypedAtomic(_) => "xs:untypedAtomic",
        }
    }

    pub fn to_string_value(&self) -> String {
        match self {
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => s.clone(),
            AtomicValue::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            AtomicValue::Integer(i) => i.to_string(),
            AtomicValue::Decimal(d) => d.to_string(),
            AtomicValue::Double(d) => {
                if d.is_nan() {
                    "NaN".to_string()
                } else if d.is_infinite() {
                    if *d > 0.0 { "INF" } else { "-INF" }.to_string()
                } else {
                    d.to_string()
                }
            }
            AtomicValue::Duration(d) => d.to_string(),
            AtomicValue::YearMonthDuration(d) => d.to_string(),
            AtomicValue::DayTimeDuration(d) => d.to_string(),
            AtomicValue::QName { prefix, local } => match prefix {
                Some(p) => format!("{}:{}", p, local),
                None => local.clone(),
            },
        }
    }

    pub fn to_boolean(&self) -> bool {
        match self {
            AtomicValue::Boolean(b) => *b,
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => !s.is_empty(),
            AtomicValue::Integer(i) => *i != 0,
            AtomicValue::Decimal(d) => !d.is_zero(),
            AtomicValue::Double(d) => *d != 0.0 && !d.is_nan(),
            _ => true,
        }
    }

    pub fn to_double(&self) -> f64 {
        match self {
            AtomicValue::Double(d) => *d,
            AtomicValue::Integer(i) => *i as f64,
            AtomicValue::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => {
                s.trim().parse().unwrap_or(f64::NAN)
            }
            AtomicValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            _ => f64::NAN,
        }
    }

    pub fn to_integer(&self) -> Option<i64> {
        match self {
            AtomicValue::Integer(i) => Some(*i),
            AtomicValue::Double(d) => {
                if d.is_finite() {
                    Some(d.trunc() as i64)
                } else {
                    None
                }
            }
            AtomicValue::Decimal(d) => d.trunc().to_i64(),
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => s.trim().parse().ok(),
            AtomicValue::Boolean(b) => Some(if *b { 1 } else { 0 }),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AtomicValue::Integer(_) | AtomicValue::Decimal(_) | AtomicValue::Double(_)
        )
    }

    pub fn is_duration(&self) -> bool {
        matches!(
            self,
            AtomicValue::Duration(_)
                | AtomicValue::YearMonthDuration(_)
                | AtomicValue::DayTimeDuration(_)
        )
    }

    /// The general duration view of any duration-typed value.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            AtomicValue::Duration(d) => Some(*d),
            AtomicValue::YearMonthDuration(d) => Some((*d).into()),
            AtomicValue::DayTimeDuration(d) => Some((*d).into()),
            _ => None,
        }
    }
}

impl PartialEq for AtomicValue {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_duration(), other.as_duration()) {
            return a == b;
        }
        match (self, other) {
            (AtomicValue::String(a), AtomicValue::String(b)) => a == b,
            (AtomicValue::Boolean(a), AtomicValue::Boolean(b)) => a == b,
            (AtomicValue::Integer(a), AtomicValue::Integer(b)) => a == b,
            (AtomicValue::Integer(a), AtomicValue::Double(b))
            | (AtomicValue::Double(b), AtomicValue::Integer(a)) => (*a as f64) == *b,
            (AtomicValue::Integer(a), AtomicValue::Decimal(b))
            | (AtomicValue::Decimal(b), AtomicValue::Integer(a)) => Decimal::from(*a) == *b,
            (AtomicValue::Double(a), AtomicValue::Double(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            (AtomicValue::Decimal(a), AtomicValue::Decimal(b)) => a == b,
            (AtomicValue::Decimal(a), AtomicValue::Double(b))
            | (AtomicValue::Double(b), AtomicValue::Decimal(a)) => {
                a.to_f64().is_some_and(|a| a == *b)
            }
            (AtomicValue::UntypedAtomic(a), AtomicValue::UntypedAtomic(b)) => a == b,
            (AtomicValue::UntypedAtomic(a), AtomicValue::String(b))
            | (AtomicValue::String(b), AtomicValue::UntypedAtomic(a)) => a == b,
            (
                AtomicValue::QName { prefix, local },
                AtomicValue::QName {
                    prefix: p2,
                    local: l2,
                },
            ) => prefix == p2 && local == l2,
            _ => false,
        }
    }
}

impl Hash for AtomicValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => s.hash(state),
            AtomicValue::Boolean(b) => b.hash(state),
            AtomicValue::Integer(i) => i.hash(state),
            AtomicValue::Decimal(d) => d.hash(state),
            AtomicValue::Double(d) => d.to_bits().hash(state),
            AtomicValue::Duration(d) => d.hash(state),
            AtomicValue::YearMonthDuration(d) => d.hash(state),
            AtomicValue::DayTimeDuration(d) => d.hash(state),
            AtomicValue::QName { prefix, local } => {
                prefix.hash(state);
                local.hash(state);
            }
        }
    }
}

impl PartialOrd for AtomicValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_duration(), other.as_duration()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (AtomicValue::String(a), AtomicValue::String(b)) => a.partial_cmp(b),
            (AtomicValue::Integer(a), AtomicValue::Integer(b)) => a.partial_cmp(b),
            (AtomicValue::Double(a), AtomicValue::Double(b)) => a.partial_cmp(b),
            (AtomicValue::Decimal(a), AtomicValue::Decimal(b)) => a.partial_cmp(b),
            (AtomicValue::Integer(a), AtomicValue::Double(b)) => (*a as f64).partial_cmp(b),
            (AtomicValue::Double(a), AtomicValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (AtomicValue::Integer(a), AtomicValue::Decimal(b)) => Decimal::from(*a).partial_cmp(b),
            (AtomicValue::Decimal(a), AtomicValue::Integer(b)) => a.partial_cmp(&Decimal::from(*b)),
            (AtomicValue::Decimal(a), AtomicValue::Double(b)) => {
                a.to_f64().and_then(|a| a.partial_cmp(b))
            }
            (AtomicValue::Double(a), AtomicValue::Decimal(b)) => {
                b.to_f64().and_then(|b| a.partial_cmp(&b))
            }
            (AtomicValue::Boolean(a), AtomicValue::Boolean(b)) => a.partial_cmp(b),
            (AtomicValue::UntypedAtomic(a), AtomicValue::String(b)) => a.as_str().partial_cmp(b.as_str()),
            (AtomicValue::String(a), AtomicValue::UntypedAtomic(b)) => {
                a.partial_cmp(&b.to_string())
            }
            _ => None,
        }
    }
}

impl fmt::Display for AtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_value())
    }
}

impl From<String> for AtomicValue {
    fn from(s: String) -> Self {
        AtomicValue::String(s)
    }
}

impl From<&str> for AtomicValue {
    fn from(s: &str) -> Self {
        AtomicValue::String(s.to_string())
    }
}

impl From<bool> for AtomicValue {
    fn from(b: bool) -> Self {
        AtomicValue::Boolean(b)
    }
}

impl From<i64> for AtomicValue {
    fn from(i: i64) -> Self {
        AtomicValue::Integer(i)
    }
}

impl From<f64> for AtomicValue {
    fn from(d: f64) -> Self {
        AtomicValue::Double(d)
    }
}

impl From<Duration> for AtomicValue {
    fn from(d: Duration) -> Self {
        AtomicValue::Duration(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercions() {
        assert_eq!(AtomicValue::Integer(42).to_double(), 42.0);
        assert_eq!(AtomicValue::from("3.5").to_double(), 3.5);
        assert!(AtomicValue::from("abc").to_double().is_nan());
        assert!(AtomicValue::Boolean(true).to_boolean());
        assert!(!AtomicValue::from("").to_boolean());
        assert_eq!(AtomicValue::Double(3.9).to_integer(), Some(3));
    }

    #[test]
    fn test_mixed_numeric_equality() {
        assert_eq!(AtomicValue::Integer(5), AtomicValue::Double(5.0));
        assert_eq!(AtomicValue::Integer(5), AtomicValue::Decimal(Decimal::from(5)));
        assert_ne!(AtomicValue::Integer(5), AtomicValue::from("5"));
    }

    #[test]
    fn test_duration_values_compare_across_subtypes() {
        let ym = AtomicValue::YearMonthDuration(YearMonthDuration::from_lexical("P1Y").unwrap());
        let general = AtomicValue::Duration(Duration::from_lexical("P12M").unwrap());
        assert_eq!(ym, general);

        let dt = AtomicValue::DayTimeDuration(DayTimeDuration::from_lexical("P30D").unwrap());
        let month = AtomicValue::Duration(Duration::from_lexical("P1M").unwrap());
        assert_eq!(month.partial_cmp(&dt), None);
    }

    #[test]
    fn test_string_rendering() {
        assert_eq!(AtomicValue::Double(f64::INFINITY).to_string_value(), "INF");
        assert_eq!(AtomicValue::Double(f64::NAN).to_string_value(), "NaN");
        assert_eq!(
            AtomicValue::QName {
                prefix: Some("fo".into()),
                local: "block".into()
            }
            .to_string_value(),
            "fo:block"
        );
    }
}
