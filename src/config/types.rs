//! Typed numeric wrappers used throughout configuration and results.

use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// A fraction in `[0, 1]`, e.g. a stop-loss or trail percentage.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Pct(f64);

impl Pct {
    pub const fn new(val: f64) -> Self {
        let v = if val < 0.0 {
            0.0
        } else if val > 1.0 {
            1.0
        } else {
            val
        };
        Self(v)
    }
}

impl Deref for Pct {
    type Target = f64;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for Pct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}%", self.0 * 100.0)
    }
}

/// Basis points. Unlike [`Pct`] this is unclamped: drawdowns and adverse
/// excursion are always negative or zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Bps(f64);

impl Bps {
    pub const fn new(val: f64) -> Self {
        Self(val)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Deref for Bps {
    type Target = f64;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::Add for Bps {
    type Output = Bps;
    fn add(self, rhs: Bps) -> Bps {
        Bps(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Bps {
    type Output = Bps;
    fn sub(self, rhs: Bps) -> Bps {
        Bps(self.0 - rhs.0)
    }
}

impl std::fmt::Display for Bps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:+.1}bps", self.0)
    }
}

/// A price. Clamped to non-negative; [`Price::is_valid`] additionally
/// requires it to be finite and strictly positive (an anchor requirement).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(f64);

impl Price {
    pub const fn new(val: f64) -> Self {
        let v = if val < 0.0 { 0.0 } else { val };
        Self(v)
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Deref for Price {
    type Target = f64;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.8}", self.0)
    }
}

/// A duration expressed in whole milliseconds; never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DurationMs(i64);

impl DurationMs {
    pub const fn new(val: i64) -> Self {
        Self(if val < 0 { 0 } else { val })
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Deref for DurationMs {
    type Target = i64;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for DurationMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_clamps_to_unit_interval() {
        assert_eq!(*Pct::new(-0.5), 0.0);
        assert_eq!(*Pct::new(1.5), 1.0);
        assert_eq!(*Pct::new(0.3), 0.3);
    }

    #[test]
    fn price_rejects_negative_but_not_nan() {
        assert_eq!(*Price::new(-5.0), 0.0);
        assert!(!Price::new(f64::NAN).is_valid());
        assert!(Price::new(1.0).is_valid());
        assert!(!Price::new(0.0).is_valid());
    }

    #[test]
    fn duration_ms_floors_at_zero() {
        assert_eq!(DurationMs::new(-10).as_i64(), 0);
    }
}
