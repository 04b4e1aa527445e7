//! 18-decimal fixed point over `u128`
//!
//! Ratios, prices, and the yield rate are carried at the chain's
//! decimal scale (1e18). Amount arithmetic fuses one multiply and one
//! divide so each result is floored (or ceiled) exactly once.

use crate::NoteError;

/// Fixed-point scale, the chain's `DECIMAL_FRACTION`.
pub const DECIMAL_FRACTION: u128 = 1_000_000_000_000_000_000;

/// Non-negative fixed-point decimal, 18 fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Decimal(u128);

impl Decimal {
    pub const ZERO: Decimal = Decimal(0);
    pub const ONE: Decimal = Decimal(DECIMAL_FRACTION);

    /// Construct from a raw 1e18-scaled value.
    pub const fn raw(value: u128) -> Self {
        Decimal(value)
    }

    pub const fn into_raw(self) -> u128 {
        self.0
    }

    /// `numerator / denominator`, floored to the decimal scale.
    pub fn from_ratio(numerator: u128, denominator: u128) -> Result<Self, NoteError> {
        if denominator == 0 {
            return Err(NoteError::Arithmetic);
        }
        let raw = numerator
            .checked_mul(DECIMAL_FRACTION)
            .ok_or(NoteError::Arithmetic)?
            / denominator;
        Ok(Decimal(raw))
    }

    /// Parse a decimal string such as `"2"`, `"1.65"` or `"0.003"`.
    pub fn parse(input: &str) -> Result<Self, NoteError> {
        let mut parts = input.splitn(2, '.');
        let whole_str = parts.next().ok_or(NoteError::Precondition)?;
        if whole_str.is_empty() {
            return Err(NoteError::Precondition);
        }
        let whole: u128 = whole_str.parse().map_err(|_| NoteError::Precondition)?;
        let mut raw = whole
            .checked_mul(DECIMAL_FRACTION)
            .ok_or(NoteError::Arithmetic)?;

        if let Some(frac_str) = parts.next() {
            if frac_str.is_empty() || frac_str.len() > 18 {
                return Err(NoteError::Precondition);
            }
            let frac: u128 = frac_str.parse().map_err(|_| NoteError::Precondition)?;
            let scale = 10u128.pow(18 - frac_str.len() as u32);
            raw = raw
                .checked_add(frac * scale)
                .ok_or(NoteError::Arithmetic)?;
        }
        Ok(Decimal(raw))
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `floor(amount · self)`
    pub fn mul_floor(self, amount: u128) -> Result<u128, NoteError> {
        let num = amount.checked_mul(self.0).ok_or(NoteError::Arithmetic)?;
        Ok(num / DECIMAL_FRACTION)
    }

    /// `ceil(amount · self)`
    pub fn mul_ceil(self, amount: u128) -> Result<u128, NoteError> {
        let num = amount.checked_mul(self.0).ok_or(NoteError::Arithmetic)?;
        Ok(num.div_ceil(DECIMAL_FRACTION))
    }
}

/// `floor(amount · num / den)` computed as one exact rational.
pub fn mul_div_floor(amount: u128, num: Decimal, den: Decimal) -> Result<u128, NoteError> {
    if den.is_zero() {
        return Err(NoteError::Arithmetic);
    }
    let n = amount
        .checked_mul(num.into_raw())
        .ok_or(NoteError::Arithmetic)?;
    Ok(n / den.into_raw())
}

/// `ceil(amount · num / den)` computed as one exact rational.
pub fn mul_div_ceil(amount: u128, num: Decimal, den: Decimal) -> Result<u128, NoteError> {
    if den.is_zero() {
        return Err(NoteError::Arithmetic);
    }
    let n = amount
        .checked_mul(num.into_raw())
        .ok_or(NoteError::Arithmetic)?;
    Ok(n.div_ceil(den.into_raw()))
}

impl core::fmt::Display for Decimal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let whole = self.0 / DECIMAL_FRACTION;
        let frac = self.0 % DECIMAL_FRACTION;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let mut frac = frac;
        let mut digits = 18;
        while frac % 10 == 0 {
            frac /= 10;
            digits -= 1;
        }
        write!(f, "{}.{:0width$}", whole, frac, width = digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        assert_eq!(Decimal::parse("2").unwrap(), Decimal::from_ratio(2, 1).unwrap());
        assert_eq!(
            Decimal::parse("1.65").unwrap(),
            Decimal::from_ratio(165, 100).unwrap()
        );
        assert_eq!(
            Decimal::parse("0.003").unwrap(),
            Decimal::from_ratio(3, 1000).unwrap()
        );
        assert!(Decimal::parse("").is_err());
        assert!(Decimal::parse("1.").is_err());
        assert!(Decimal::parse("x").is_err());

        let mut buf = [0u8; 64];
        let mut w = Writer(&mut buf, 0);
        use core::fmt::Write;
        write!(w, "{}", Decimal::parse("1.65").unwrap()).unwrap();
        assert_eq!(w.as_str(), "1.65");
    }

    #[test]
    fn mul_rounding() {
        let half = Decimal::from_ratio(1, 2).unwrap();
        assert_eq!(half.mul_floor(5).unwrap(), 2);
        assert_eq!(half.mul_ceil(5).unwrap(), 3);
        assert_eq!(Decimal::ONE.mul_floor(7).unwrap(), 7);
    }

    #[test]
    fn fused_mul_div() {
        let two = Decimal::from_ratio(2, 1).unwrap();
        let one = Decimal::ONE;
        // floor(9,990,009 / 2) with price 1
        assert_eq!(mul_div_floor(9_990_009, one, two).unwrap(), 4_995_004);
        // ceil(4,995,004 * 1.65)
        let safe = Decimal::from_ratio(165, 100).unwrap();
        assert_eq!(mul_div_ceil(4_995_004, safe, one).unwrap(), 8_241_757);
        assert!(mul_div_floor(1, one, Decimal::ZERO).is_err());
    }

    struct Writer<'a>(&'a mut [u8], usize);

    impl<'a> Writer<'a> {
        fn as_str(&self) -> &str {
            core::str::from_utf8(&self.0[..self.1]).unwrap()
        }
    }

    impl core::fmt::Write for Writer<'_> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            self.0[self.1..self.1 + bytes.len()].copy_from_slice(bytes);
            self.1 += bytes.len();
            Ok(())
        }
    }
}
