//! Fixed-point units used throughout planning
//!
//! Lengths and weights are held as hundredths (two decimal places) so that
//! all geometry and limit comparisons are exact integer comparisons.
//! Money is held as integer cents.
//!
//! Arithmetic saturates at the `i64` bounds. A saturated value exceeds
//! every capacity and legal ceiling, so it is rejected downstream instead
//! of wrapping or panicking.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Round a decimal half-up (midpoint away from zero) to `dp` places and
/// return its integer mantissa at that scale.
pub fn round_half_up_scaled(value: Decimal, dp: u32) -> Option<i64> {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    i64::try_from(rounded.mantissa()).ok()
}

macro_rules! hundredths_unit {
    ($name:ident, $suffix:literal) => {
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            pub const ZERO: $name = $name(0);

            pub const fn from_hundredths(hundredths: i64) -> Self {
                $name(hundredths)
            }

            pub const fn from_whole(whole: i64) -> Self {
                $name(whole * 100)
            }

            pub const fn hundredths(self) -> i64 {
                self.0
            }

            /// Convert a decimal, rounding half-up to two places
            pub fn from_decimal(value: Decimal) -> Option<Self> {
                round_half_up_scaled(value, 2).map($name)
            }

            pub fn to_decimal(self) -> Decimal {
                Decimal::new(self.0, 2)
            }

            pub fn as_f64(self) -> f64 {
                self.0 as f64 / 100.0
            }

            pub fn is_positive(self) -> bool {
                self.0 > 0
            }

            /// Difference clamped at zero
            pub fn saturating_sub(self, other: Self) -> Self {
                $name(self.0.saturating_sub(other.0).max(0))
            }

            pub fn checked_add(self, other: Self) -> Option<Self> {
                self.0.checked_add(other.0).map($name)
            }

            pub fn checked_mul(self, rhs: i64) -> Option<Self> {
                self.0.checked_mul(rhs).map($name)
            }
        }

        impl Add for $name {
            type Output = $name;
            fn add(self, rhs: Self) -> Self {
                $name(self.0.saturating_add(rhs.0))
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 = self.0.saturating_add(rhs.0);
            }
        }

        impl Sub for $name {
            type Output = $name;
            fn sub(self, rhs: Self) -> Self {
                $name(self.0.saturating_sub(rhs.0))
            }
        }

        impl Mul<i64> for $name {
            type Output = $name;
            fn mul(self, rhs: i64) -> Self {
                $name(self.0.saturating_mul(rhs))
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold($name::ZERO, Add::add)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", self.to_decimal(), $suffix)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                Serialize::serialize(&self.to_decimal(), serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = <Decimal as Deserialize>::deserialize(deserializer)?;
                $name::from_decimal(value)
                    .ok_or_else(|| serde::de::Error::custom(concat!(stringify!($name), " out of range")))
            }
        }
    };
}

hundredths_unit!(Inches, "in");
hundredths_unit!(Pounds, "lb");

impl Inches {
    pub const fn from_feet(feet: i64) -> Self {
        Inches(feet * 1200)
    }

    pub fn as_feet(self) -> f64 {
        self.0 as f64 / 1200.0
    }

    /// Area of a `self` x `other` rectangle in square hundredths
    pub fn area(self, other: Inches) -> i128 {
        self.0 as i128 * other.0 as i128
    }
}

/// Money as integer cents
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub const fn new(cents: i64) -> Self {
        Cents(cents)
    }

    pub const fn from_dollars(dollars: i64) -> Self {
        Cents(dollars * 100)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Convert a dollar amount, rounding half-up to the cent
    pub fn from_decimal_dollars(dollars: Decimal) -> Option<Self> {
        round_half_up_scaled(dollars, 2).map(Cents)
    }

    /// Round a fractional cent amount half-up to whole cents
    pub fn from_decimal_cents(cents: Decimal) -> Option<Self> {
        round_half_up_scaled(cents, 0).map(Cents)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Cents)
    }
}

impl Add for Cents {
    type Output = Cents;
    fn add(self, rhs: Self) -> Self {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Mul<i64> for Cents {
    type Output = Cents;
    fn mul(self, rhs: i64) -> Self {
        Cents(self.0.saturating_mul(rhs))
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Cents::ZERO, Add::add)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_inches_round_half_up() {
        let v = Inches::from_decimal(Decimal::from_str("47.995").unwrap()).unwrap();
        assert_eq!(v.hundredths(), 4800);
        let v = Inches::from_decimal(Decimal::from_str("47.994").unwrap()).unwrap();
        assert_eq!(v.hundredths(), 4799);
    }

    #[test]
    fn test_feet_conversion() {
        assert_eq!(Inches::from_feet(48).hundredths(), 57_600);
        assert!((Inches::from_whole(162).as_feet() - 13.5).abs() < 1e-9);
    }

    #[test]
    fn test_cents_rounding() {
        let c = Cents::from_decimal_cents(Decimal::from_str("1234.5").unwrap()).unwrap();
        assert_eq!(c.get(), 1235);
        let c = Cents::from_decimal_cents(Decimal::from_str("1234.49").unwrap()).unwrap();
        assert_eq!(c.get(), 1234);
        let c = Cents::from_decimal_dollars(Decimal::from_str("10.005").unwrap()).unwrap();
        assert_eq!(c.get(), 1001);
    }

    #[test]
    fn test_cents_display() {
        assert_eq!(Cents::new(123_456).to_string(), "$1234.56");
        assert_eq!(Cents::new(-5).to_string(), "-$0.05");
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Pounds::from_hundredths(i64::MAX / 2);
        assert_eq!((huge * 3).hundredths(), i64::MAX);
        assert_eq!((huge + huge + huge).hundredths(), i64::MAX);
        assert!(huge.checked_mul(3).is_none());
        assert_eq!(huge.checked_mul(2), Some(Pounds::from_hundredths(i64::MAX / 2 * 2)));

        let mut total = Cents::new(i64::MAX - 1);
        total += Cents::new(10);
        assert_eq!(total.get(), i64::MAX);
        assert!(Cents::new(i64::MAX).checked_add(Cents::new(1)).is_none());

        assert_eq!(
            Inches::from_hundredths(i64::MIN + 1).saturating_sub(Inches::from_whole(10)),
            Inches::ZERO
        );
    }

    #[test]
    fn test_serde_as_decimal_text() {
        let json = serde_json::to_string(&Inches::from_whole(48)).unwrap();
        assert_eq!(json, "\"48.00\"");
        let back: Inches = serde_json::from_str("48.5").unwrap();
        assert_eq!(back.hundredths(), 4850);
        let back: Pounds = serde_json::from_str("\"2000\"").unwrap();
        assert_eq!(back, Pounds::from_whole(2000));
    }
}
