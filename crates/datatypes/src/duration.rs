//! XSD duration types and the W3C order relation.
//!
//! A duration is a `(months, seconds)` pair. Months and days are not
//! interconvertible (month length is calendar-dependent), so the general
//! [`Duration`] type is only partially ordered: two durations compare by
//! adding each to four fixed reference dates and comparing all four
//! resulting instants. The [`YearMonthDuration`] and [`DayTimeDuration`]
//! subtypes restrict to one component each and are totally ordered.

use crate::DatatypeError;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::sync::LazyLock;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(-)?P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .unwrap()
});

/// The four reference dates of the W3C order relation, as `(year, month)`
/// with day-of-month 1 and timezone Z.
const REFERENCE_DATES: [(i64, i64); 4] = [(1696, 9), (1697, 2), (1903, 3), (1903, 7)];

const SECONDS_PER_DAY: i64 = 86_400;

/// Days since 1970-01-01 in the proleptic Gregorian calendar.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// An `xs:duration` value: whole months plus decimal seconds, both carrying
/// the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    months: i64,
    seconds: Decimal,
}

impl Duration {
    pub fn new(months: i64, seconds: Decimal) -> Self {
        Self { months, seconds }
    }

    pub fn months(&self) -> i64 {
        self.months
    }

    pub fn seconds(&self) -> Decimal {
        self.seconds
    }

    /// Parses the XSD lexical form `-?PnYnMnDTnHnMn.nS`.
    pub fn from_lexical(text: &str) -> Result<Self, DatatypeError> {
        let caps = DURATION_RE
            .captures(text.trim())
            .ok_or_else(|| DatatypeError::InvalidDuration(text.to_string()))?;

        // "P" alone and "PnDT" (a dangling T) are well-formed per the regex
        // but not valid durations: at least one component must be present,
        // and a T must introduce at least one time component.
        let has_date = caps.get(2).is_some() || caps.get(3).is_some() || caps.get(4).is_some();
        let has_time = caps.get(5).is_some() || caps.get(6).is_some() || caps.get(7).is_some();
        if !has_date && !has_time {
            return Err(DatatypeError::InvalidDuration(text.to_string()));
        }
        if text.contains('T') && !has_time {
            return Err(DatatypeError::InvalidDuration(text.to_string()));
        }

        let int = |i: usize| -> i64 {
            caps.get(i)
                .map(|m| m.as_str().parse().unwrap_or(0))
                .unwrap_or(0)
        };
        let months = int(2) * 12 + int(3);
        let mut seconds = Decimal::from(int(4) * SECONDS_PER_DAY + int(5) * 3600 + int(6) * 60);
        if let Some(s) = caps.get(7) {
            seconds += s
                .as_str()
                .parse::<Decimal>()
                .map_err(|_| DatatypeError::InvalidDuration(text.to_string()))?;
        }

        if caps.get(1).is_some() {
            Ok(Self::new(-months, -seconds))
        } else {
            Ok(Self::new(months, seconds))
        }
    }

    /// The instant (in seconds since the epoch, as a decimal) obtained by
    /// adding this duration to a reference `(year, month)` date.
    fn instant_at(&self, reference: (i64, i64)) -> Decimal {
        let (year, month) = reference;
        let total_months = year * 12 + (month - 1) + self.months;
        let y = total_months.div_euclid(12);
        let m = total_months.rem_euclid(12) + 1;
        Decimal::from(days_from_civil(y, m, 1) * SECONDS_PER_DAY) + self.seconds
    }
}

/// The W3C order relation: determinate only if all four reference-instant
/// comparisons agree.
impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let mut ordering = None;
        for reference in REFERENCE_DATES {
            let cmp = self.instant_at(reference).cmp(&other.instant_at(reference));
            match ordering {
                None => ordering = Some(cmp),
                Some(prev) if prev != cmp => return None,
                Some(_) => {}
            }
        }
        ordering
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration::new(self.months + rhs.months, self.seconds + rhs.seconds)
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        Duration::new(self.months - rhs.months, self.seconds - rhs.seconds)
    }
}

impl Neg for Duration {
    type Output = Duration;

    fn neg(self) -> Duration {
        Duration::new(-self.months, -self.seconds)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.months == 0 && self.seconds.is_zero() {
            return write!(f, "PT0S");
        }
        if self.months < 0 || self.seconds.is_sign_negative() && !self.seconds.is_zero() {
            write!(f, "-")?;
        }
        write!(f, "P")?;

        let months = self.months.abs();
        if months / 12 != 0 {
            write!(f, "{}Y", months / 12)?;
        }
        if months % 12 != 0 {
            write!(f, "{}M", months % 12)?;
        }

        let seconds = self.seconds.abs();
        if !seconds.is_zero() {
            let whole: i64 = seconds.trunc().to_i64().unwrap_or(i64::MAX);
            let frac = seconds.fract();
            let (days, rem) = (whole / SECONDS_PER_DAY, whole % SECONDS_PER_DAY);
            let (hours, rem) = (rem / 3600, rem % 3600);
            let (minutes, secs) = (rem / 60, rem % 60);
            if days != 0 {
                write!(f, "{}D", days)?;
            }
            if hours != 0 || minutes != 0 || secs != 0 || !frac.is_zero() {
                write!(f, "T")?;
                if hours != 0 {
                    write!(f, "{}H", hours)?;
                }
                if minutes != 0 {
                    write!(f, "{}M", minutes)?;
                }
                if secs != 0 || !frac.is_zero() {
                    write!(f, "{}S", Decimal::from(secs) + frac)?;
                }
            }
        }
        Ok(())
    }
}

/// An `xs:yearMonthDuration`: a month count with a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonthDuration {
    months: i64,
}

impl YearMonthDuration {
    pub fn from_months(months: i64) -> Self {
        Self { months }
    }

    pub fn months(&self) -> i64 {
        self.months
    }

    pub fn from_lexical(text: &str) -> Result<Self, DatatypeError> {
        let d = Duration::from_lexical(text)?;
        if !d.seconds.is_zero() {
            return Err(DatatypeError::WrongDurationSubtype(
                text.to_string(),
                "yearMonthDuration",
            ));
        }
        Ok(Self { months: d.months })
    }
}

impl From<YearMonthDuration> for Duration {
    fn from(d: YearMonthDuration) -> Duration {
        Duration::new(d.months, Decimal::ZERO)
    }
}

impl Add for YearMonthDuration {
    type Output = YearMonthDuration;

    fn add(self, rhs: Self) -> Self {
        Self::from_months(self.months + rhs.months)
    }
}

impl Sub for YearMonthDuration {
    type Output = YearMonthDuration;

    fn sub(self, rhs: Self) -> Self {
        Self::from_months(self.months - rhs.months)
    }
}

impl Neg for YearMonthDuration {
    type Output = YearMonthDuration;

    fn neg(self) -> Self {
        Self::from_months(-self.months)
    }
}

impl fmt::Display for YearMonthDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Duration::from(*self).fmt(f)
    }
}

/// An `xs:dayTimeDuration`: decimal seconds with a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayTimeDuration {
    seconds: Decimal,
}

impl DayTimeDuration {
    pub fn from_seconds(seconds: Decimal) -> Self {
        Self { seconds }
    }

    pub fn seconds(&self) -> Decimal {
        self.seconds
    }

    pub fn from_lexical(text: &str) -> Result<Self, DatatypeError> {
        let d = Duration::from_lexical(text)?;
        if d.months != 0 {
            return Err(DatatypeError::WrongDurationSubtype(
                text.to_string(),
                "dayTimeDuration",
            ));
        }
        Ok(Self { seconds: d.seconds })
    }
}

impl From<DayTimeDuration> for Duration {
    fn from(d: DayTimeDuration) -> Duration {
        Duration::new(0, d.seconds)
    }
}

impl Add for DayTimeDuration {
    type Output = DayTimeDuration;

    fn add(self, rhs: Self) -> Self {
        Self::from_seconds(self.seconds + rhs.seconds)
    }
}

impl Sub for DayTimeDuration {
    type Output = DayTimeDuration;

    fn sub(self, rhs: Self) -> Self {
        Self::from_seconds(self.seconds - rhs.seconds)
    }
}

impl Neg for DayTimeDuration {
    type Output = DayTimeDuration;

    fn neg(self) -> Self {
        Self::from_seconds(-self.seconds)
    }
}

impl fmt::Display for DayTimeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Duration::from(*self).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dur(text: &str) -> Duration {
        Duration::from_lexical(text).unwrap()
    }

    #[test]
    fn test_lexical_parsing() {
        assert_eq!(dur("P1Y2M"), Duration::new(14, Decimal::ZERO));
        assert_eq!(dur("P3D"), Duration::new(0, Decimal::from(3 * 86_400)));
        assert_eq!(
            dur("P1DT2H3M4.5S"),
            Duration::new(0, Decimal::from(93_784) + Decimal::new(5, 1))
        );
        assert_eq!(dur("-P1M"), Duration::new(-1, Decimal::ZERO));
        assert_eq!(dur("PT0S"), Duration::new(0, Decimal::ZERO));
    }

    #[test]
    fn test_malformed_lexical_forms() {
        for bad in ["P", "PT", "P1DT", "1Y", "P1S", "P-1Y", "P1.5Y", "bogus"] {
            assert!(
                Duration::from_lexical(bad).is_err(),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_canonical_display() {
        assert_eq!(dur("P14M").to_string(), "P1Y2M");
        assert_eq!(dur("PT86400S").to_string(), "P1D");
        assert_eq!(dur("P1DT2H3M4.5S").to_string(), "P1DT2H3M4.5S");
        assert_eq!(dur("-P1Y").to_string(), "-P1Y");
        assert_eq!(dur("PT0S").to_string(), "PT0S");
    }

    #[test]
    fn test_days_from_civil() {
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(days_from_civil(1970, 1, 2), 1);
        assert_eq!(days_from_civil(1969, 12, 31), -1);
        assert_eq!(days_from_civil(2000, 3, 1), 11_017);
        // Proleptic: negative (BCE) years are meaningful.
        assert!(days_from_civil(-1, 1, 1) < days_from_civil(0, 1, 1));
    }

    #[test]
    fn test_month_day_order_is_partial() {
        let one_month = dur("P1M");
        // The month lengths following the four reference dates are
        // 30, 28, 31 and 31 days, so P1M is incomparable with anything
        // in between.
        for days in ["P28D", "P29D", "P30D", "P31D"] {
            assert_eq!(
                one_month.partial_cmp(&dur(days)),
                None,
                "P1M vs {} must be indeterminate",
                days
            );
        }
        assert_eq!(one_month.partial_cmp(&dur("P27D")), Some(Ordering::Greater));
        assert_eq!(one_month.partial_cmp(&dur("P32D")), Some(Ordering::Less));
    }

    #[test]
    fn test_determinate_orderings() {
        assert!(dur("P1Y") > dur("P11M"));
        assert!(dur("PT1H") < dur("PT90M"));
        assert_eq!(dur("P1Y").partial_cmp(&dur("P12M")), Some(Ordering::Equal));
        assert!(dur("-P1D") < dur("P1D"));
    }

    #[test]
    fn test_subtype_totality() {
        let a = YearMonthDuration::from_lexical("P1Y").unwrap();
        let b = YearMonthDuration::from_lexical("P13M").unwrap();
        assert!(a < b);
        assert!(YearMonthDuration::from_lexical("P1D").is_err());

        let c = DayTimeDuration::from_lexical("P1DT1S").unwrap();
        let d = DayTimeDuration::from_lexical("P1D").unwrap();
        assert!(c > d);
        assert!(DayTimeDuration::from_lexical("P1M").is_err());
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(dur("P1Y") + dur("P2M"), dur("P1Y2M"));
        assert_eq!(dur("P2D") - dur("P1D"), dur("P1D"));
        assert_eq!(-dur("P1M"), dur("-P1M"));
    }
}
