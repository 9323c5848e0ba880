//! XSD-style atomic values for the xpress expression engine.
//!
//! The engine treats these as opaque values supporting equality, ordering
//! where defined, and numeric coercion. Construction from lexical form and
//! string rendering live here; notably the duration types, whose order
//! relation is the W3C reference-instant method (a partial order), not a
//! numeric comparison of their components.

pub mod atomic;
pub mod duration;
pub mod timezone;

pub use atomic::AtomicValue;
pub use duration::{DayTimeDuration, Duration, YearMonthDuration};
pub use timezone::Timezone;

use thiserror::Error;

/// A well-formed token whose content is not a valid value of its type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatatypeError {
    #[error("invalid duration literal '{0}'")]
    InvalidDuration(String),

    #[error("'{0}' is not a {1} (component out of range for the subtype)")]
    WrongDurationSubtype(String, &'static str),

    #[error("invalid timezone literal '{0}'")]
    InvalidTimezone(String),
}
