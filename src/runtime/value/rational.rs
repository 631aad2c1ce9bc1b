//! Exact rational numbers
//!
//! All numbers in the language are exact. Integers are rationals with a
//! denominator of one; `(/ 1 3)` stays `1/3` rather than decaying to a float.

use std::cmp::Ordering;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Numeric literal grammar: integers, `n/d` fractions and plain decimals.
static NUMBER_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+/\d+|\d+(?:\.\d*)?|\.\d+)$").expect("numeric literal regex is valid")
});

/// Reduced fraction with a strictly positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i64,
    den: i64,
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    /// Build a reduced rational; `None` for a zero denominator or overflow.
    pub fn new(
        num: i64,
        den: i64,
    ) -> Option<Self> {
        Self::from_wide(num as i128, den as i128)
    }

    /// Integer value.
    pub fn integer(n: i64) -> Self {
        Self { num: n, den: 1 }
    }

    pub fn numer(&self) -> i64 {
        self.num
    }

    pub fn denom(&self) -> i64 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    /// Parse a numeric literal. Returns `None` if `text` is not a number.
    pub fn parse(text: &str) -> Option<Self> {
        if !NUMBER_LITERAL.is_match(text) {
            return None;
        }

        let (negative, digits) = match text.as_bytes()[0] {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };

        let value = if let Some((n, d)) = digits.split_once('/') {
            Self::new(n.parse().ok()?, d.parse().ok()?)?
        } else if let Some((whole, frac)) = digits.split_once('.') {
            let scale = 10i128.checked_pow(frac.len() as u32)?;
            let whole: i128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
            let frac: i128 = if frac.is_empty() { 0 } else { frac.parse().ok()? };
            Self::from_wide(whole.checked_mul(scale)?.checked_add(frac)?, scale)?
        } else {
            Self::integer(digits.parse().ok()?)
        };

        if negative {
            value.checked_neg()
        } else {
            Some(value)
        }
    }

    pub fn checked_neg(self) -> Option<Self> {
        Self::from_wide(-(self.num as i128), self.den as i128)
    }

    pub fn checked_add(
        self,
        other: Self,
    ) -> Option<Self> {
        let (a, b, c, d) = self.wide(other);
        Self::from_wide(a * d + c * b, b * d)
    }

    pub fn checked_sub(
        self,
        other: Self,
    ) -> Option<Self> {
        let (a, b, c, d) = self.wide(other);
        Self::from_wide(a * d - c * b, b * d)
    }

    pub fn checked_mul(
        self,
        other: Self,
    ) -> Option<Self> {
        let (a, b, c, d) = self.wide(other);
        Self::from_wide(a * c, b * d)
    }

    /// Division; `None` when dividing by zero or on overflow.
    pub fn checked_div(
        self,
        other: Self,
    ) -> Option<Self> {
        let (a, b, c, d) = self.wide(other);
        Self::from_wide(a * d, b * c)
    }

    fn wide(
        self,
        other: Self,
    ) -> (i128, i128, i128, i128) {
        (
            self.num as i128,
            self.den as i128,
            other.num as i128,
            other.den as i128,
        )
    }

    fn from_wide(
        num: i128,
        den: i128,
    ) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let sign = if den < 0 { -1 } else { 1 };
        let factor = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1) as i128;
        let num = sign * num / factor;
        let den = sign * den / factor;
        Some(Self {
            num: i64::try_from(num).ok()?,
            den: i64::try_from(den).ok()?,
        })
    }
}

fn gcd(
    mut a: u128,
    mut b: u128,
) -> u128 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

impl Ord for Rational {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        let (a, b, c, d) = self.wide(*other);
        (a * d).cmp(&(c * b))
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Self::integer(n)
    }
}

impl fmt::Display for Rational {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}
