//! Fixed-point prices as reported by the oracle.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::error::PriceError;

/// Largest scale an oracle decimal may carry.
pub const MAX_SCALE: u32 = 28;

/// Decimal price `mantissa * 10^-scale`, the shape oracle feeds report.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Price {
    pub mantissa: i128,
    pub scale: u32,
}

impl Price {
    pub const fn new(mantissa: i128, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    /// A whole-unit price (scale 0).
    pub const fn whole(units: i64) -> Self {
        Self::new(units as i128, 0)
    }

    /// Strictly greater than a whole-unit `unlock_price`.
    ///
    /// Compares exactly in integer arithmetic by lifting `unlock_price`
    /// to this price's scale. A lifted threshold beyond `i128` is above
    /// every mantissa.
    pub fn exceeds(&self, unlock_price: u64) -> bool {
        let threshold = 10i128
            .checked_pow(self.scale)
            .and_then(|factor| i128::from(unlock_price).checked_mul(factor));
        match threshold {
            Some(threshold) => self.mantissa > threshold,
            None => unlock_price == 0 && self.mantissa > 0,
        }
    }
}

impl From<u64> for Price {
    fn from(units: u64) -> Self {
        Self::new(i128::from(units), 0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let digits = format!("{:0>width$}", digits, width = scale + 1);
        let (int, frac) = digits.split_at(digits.len() - scale);
        write!(f, "{sign}{int}.{frac}")
    }
}

impl FromStr for Price {
    type Err = PriceError;

    /// Parses `"25"`, `"25.30"` or `"-0.5"`; the scale is the number of
    /// fractional digits given.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }
        let (int, frac) = s.split_once('.').unwrap_or((s, ""));
        if frac.len() > MAX_SCALE as usize {
            return Err(PriceError::Scale(frac.len()));
        }
        let mantissa = format!("{int}{frac}").parse::<i128>()?;
        Ok(Self::new(mantissa, frac.len() as u32))
    }
}
