// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Credit Denomination
//
// Balances are kept in `Decimal` so repeated debits and credits never drift.
// Prices and risk math stay in f64 and cross over through the helpers below.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Credits are rounded to cents when converted from f64.
const CREDIT_DECIMALS: u32 = 2;

/// Convert f64 to Decimal (lossy but sufficient for simulation).
pub fn to_decimal(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO)
}

/// Convert Decimal to f64.
pub fn from_decimal(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Credits
// ---------------------------------------------------------------------------

/// Game currency backed by `rust_decimal::Decimal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Credits(pub Decimal);

impl Credits {
    pub const ZERO: Credits = Credits(Decimal::ZERO);

    /// Round an f64 amount to whole cents.
    pub fn from_f64(v: f64) -> Self {
        Self(to_decimal(v).round_dp(CREDIT_DECIMALS))
    }

    pub fn from_decimal(d: Decimal) -> Self {
        Self(d)
    }

    pub fn to_f64(&self) -> f64 {
        from_decimal(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl Add for Credits {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Credits {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Credits {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Credits {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Credits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Credits::ZERO, |acc, c| acc + c)
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}cr", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn from_f64_rounds_to_cents() {
        assert_eq!(Credits::from_f64(12.3456), Credits(dec!(12.35)));
        assert_eq!(Credits::from_f64(-0.004), Credits(dec!(0)));
    }

    #[test]
    fn non_finite_collapses_to_zero() {
        assert!(Credits::from_f64(f64::NAN).is_zero());
        assert!(Credits::from_f64(f64::INFINITY).is_zero());
    }

    #[test]
    fn arithmetic_is_exact() {
        let mut c = Credits(dec!(0.1));
        for _ in 0..9 {
            c += Credits(dec!(0.1));
        }
        assert_eq!(c, Credits(dec!(1.0)));
        assert_eq!(c - Credits(dec!(0.25)), Credits(dec!(0.75)));
    }

    #[test]
    fn negative_detection() {
        assert!(Credits(dec!(-1)).is_negative());
        assert!(!Credits::ZERO.is_negative());
    }

    #[test]
    fn sum_of_balances() {
        let total: Credits = [dec!(1.5), dec!(2.25)].into_iter().map(Credits).sum();
        assert_eq!(total, Credits(dec!(3.75)));
    }
}
