//! Fixed-point arithmetic
//!
//! Every enchantment curve and multiplier in the simulation goes through
//! [`Fixed`], a signed 64-bit value scaled by 2^16. Nothing here touches
//! floating point, so results are identical on every platform.

use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Number of fractional bits
pub const FP_BASE: u32 = 16;

/// Raw value of 1.0
pub const FP_FACTOR: i64 = 1 << FP_BASE;

/// Signed fixed-point number with [`FP_BASE`] fractional bits
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed(i64);

/// Integer division rounding half away from zero
fn div_round(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if 2 * r.abs() >= d.abs() {
        if (n < 0) != (d < 0) { q - 1 } else { q + 1 }
    } else {
        q
    }
}

/// Leading-zero count used by the square-root estimate
fn leading_zeros(x: u64) -> i32 {
    x.leading_zeros() as i32
}

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(FP_FACTOR);
    pub const HALF: Fixed = Fixed(FP_FACTOR / 2);

    /// Wrap a raw scaled value
    pub const fn from_raw(raw: i64) -> Self {
        Fixed(raw)
    }

    /// Convert an integer
    pub const fn from_int(n: i64) -> Self {
        Fixed(n * FP_FACTOR)
    }

    /// Raw scaled value
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// `num / den`, truncated toward zero.
    ///
    /// Returns zero if `den` is zero.
    pub fn ratio(num: i64, den: i64) -> Self {
        if den == 0 {
            debug_assert!(den != 0, "fixed-point ratio with zero denominator");
            return Fixed::ZERO;
        }
        Fixed(num * FP_FACTOR / den)
    }

    /// Integer part, truncated toward zero
    pub const fn trunc(self) -> i64 {
        self.0 / FP_FACTOR
    }

    /// Nearest integer, halves rounded away from zero
    pub const fn round(self) -> i64 {
        let div = self.0 / FP_FACTOR;
        let rem = self.0 % FP_FACTOR;
        if rem >= FP_FACTOR / 2 {
            div + 1
        } else if rem <= -FP_FACTOR / 2 {
            div - 1
        } else {
            div
        }
    }

    pub const fn abs(self) -> Self {
        Fixed(self.0.abs())
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply the raw value by `num / den` with integer truncation.
    ///
    /// This is the `x * 3/4` style scaling the power tables apply before
    /// rounding, kept separate from the rounding `Mul<Fixed>`.
    pub fn scale(self, num: i64, den: i64) -> Self {
        if den == 0 {
            return Fixed::ZERO;
        }
        Fixed(((self.0 as i128) * (num as i128) / (den as i128)) as i64)
    }

    /// Round to the nearest multiple of `1/n`.
    pub fn quantize(self, n: i64) -> Self {
        if n <= 0 {
            return self;
        }
        let steps = div_round(self.0 as i128 * n as i128, FP_FACTOR as i128);
        Fixed((steps * FP_FACTOR as i128 / n as i128) as i64)
    }

    pub fn clamp(self, lo: Fixed, hi: Fixed) -> Self {
        Fixed(self.0.clamp(lo.0, hi.0))
    }

    pub fn min(self, other: Fixed) -> Self {
        Fixed(self.0.min(other.0))
    }

    pub fn max(self, other: Fixed) -> Self {
        Fixed(self.0.max(other.0))
    }

    /// Square root, rounded to the nearest representable value.
    ///
    /// A Babylonian pass seeded from the bit length gives the estimate; a
    /// bisection over 128-bit squares then pins down the exact floor root
    /// of `raw << FP_BASE`, which is rounded to nearest. Negative input
    /// yields zero.
    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Fixed::ZERO;
        }
        let val = self.0 as u64;

        // Babylonian estimate
        let bitpos = (64 - FP_BASE as i32) - leading_zeros(val) - (32 - FP_BASE as i32) - 16;
        let mut x: u128 = if bitpos > 0 {
            (1u128 << FP_BASE) << ((bitpos as u32) >> 1)
        } else if bitpos < 0 {
            (1u128 << FP_BASE) >> (((-bitpos) as u32) >> 1)
        } else {
            1u128 << FP_BASE
        };
        if x == 0 {
            x = 1;
        }
        let v = (val as u128) << (FP_BASE - 1);
        for _ in 0..4 {
            x = (x >> 1) + v / x;
            if x == 0 {
                x = 1;
            }
        }

        // Bisection refinement
        let target = (val as u128) << FP_BASE;
        let mut lo = x / 2;
        let mut hi = x.saturating_mul(2).max(2);
        while lo > 0 && lo * lo > target {
            lo /= 2;
        }
        while hi * hi <= target {
            hi *= 2;
        }
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if mid * mid <= target {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        // lo = floor(sqrt(target)); round to nearest
        if target - lo * lo > lo {
            lo += 1;
        }
        Fixed(lo as i64)
    }

    /// `1 / self`, with a power that underflowed to zero treated as the
    /// smallest positive value so the result stays ordered.
    fn recip_saturating(self) -> Self {
        if self.0 == 0 { Fixed::ONE / Fixed(1) } else { Fixed::ONE / self }
    }

    /// Integer power by repeated squaring.
    ///
    /// Negative exponents take the reciprocal of the positive power.
    pub fn ipow(self, exp: i64) -> Self {
        if exp < 0 {
            return self.ipow(-exp).recip_saturating();
        }
        let mut result = Fixed::ONE;
        let mut base = self;
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                result = result * base;
            }
            e >>= 1;
            if e > 0 {
                base = base * base;
            }
        }
        result
    }

    /// General power `self ^ exp`.
    ///
    /// The integer part of the exponent goes through [`Fixed::ipow`]; each
    /// set fractional bit multiplies in the matching repeated square root of
    /// the base (bit 15 is the square root, bit 14 the fourth root, ...).
    pub fn pow(self, exp: Fixed) -> Self {
        if exp.0 < 0 {
            return self.pow(Fixed(-exp.0)).recip_saturating();
        }
        let whole = exp.0 >> FP_BASE;
        let mut frac = exp.0 & (FP_FACTOR - 1);
        let mut result = self.ipow(whole);
        let mut root = self;
        let mut bit = FP_FACTOR >> 1;
        while frac != 0 && bit != 0 {
            root = root.sqrt();
            if frac & bit != 0 {
                result = result * root;
                frac &= !bit;
            }
            bit >>= 1;
        }
        result
    }

    /// Lossy conversion for display-only computations.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / FP_FACTOR as f64
    }
}

impl Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

/// Fixed × fixed, rounded to nearest
impl Mul for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(div_round(self.0 as i128 * rhs.0 as i128, FP_FACTOR as i128) as i64)
    }
}

/// Fixed × integer, exact
impl Mul<i64> for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: i64) -> Fixed {
        Fixed(self.0 * rhs)
    }
}

/// Fixed ÷ fixed, rounded to nearest; division by zero saturates
impl Div for Fixed {
    type Output = Fixed;
    fn div(self, rhs: Fixed) -> Fixed {
        if rhs.0 == 0 {
            debug_assert!(rhs.0 != 0, "fixed-point division by zero");
            return if self.0 < 0 { Fixed(i64::MIN) } else { Fixed(i64::MAX) };
        }
        Fixed(div_round(self.0 as i128 * FP_FACTOR as i128, rhs.0 as i128) as i64)
    }
}

/// Fixed ÷ integer, truncated toward zero
impl Div<i64> for Fixed {
    type Output = Fixed;
    fn div(self, rhs: i64) -> Fixed {
        if rhs == 0 {
            return Fixed::ZERO;
        }
        Fixed(self.0 / rhs)
    }
}

impl From<i16> for Fixed {
    fn from(n: i16) -> Self {
        Fixed::from_int(n as i64)
    }
}

impl From<i32> for Fixed {
    fn from(n: i32) -> Self {
        Fixed::from_int(n as i64)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs >> FP_BASE;
        let frac = ((abs & (FP_FACTOR as u64 - 1)) * 10_000 + (FP_FACTOR as u64 / 2)) >> FP_BASE;
        if frac >= 10_000 {
            write!(f, "{}{}.0000", sign, whole + 1)
        } else {
            write!(f, "{}{}.{:04}", sign, whole, frac)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(n: i64) -> Fixed {
        Fixed::from_int(n)
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(Fixed::ratio(1, 2).round(), 1);
        assert_eq!(Fixed::ratio(-1, 2).round(), -1);
        assert_eq!(Fixed::ratio(49, 100).round(), 0);
        assert_eq!(Fixed::ratio(-149, 100).round(), -1);
        assert_eq!(Fixed::ratio(251, 100).round(), 3);
    }

    #[test]
    fn test_trunc_toward_zero() {
        assert_eq!(Fixed::ratio(7, 2).trunc(), 3);
        assert_eq!(Fixed::ratio(-7, 2).trunc(), -3);
    }

    #[test]
    fn test_mul_rounds_to_nearest() {
        // 1/65536 * 1/2 rounds up to one ulp rather than truncating to zero
        let ulp = Fixed::from_raw(1);
        assert_eq!(ulp * Fixed::HALF, Fixed::from_raw(1));
        assert_eq!(fx(3) * fx(4), fx(12));
        assert_eq!(fx(-3) * Fixed::HALF, Fixed::ratio(-3, 2));
    }

    #[test]
    fn test_div_rounds_to_nearest() {
        assert_eq!(fx(1) / fx(3), Fixed::from_raw(21845));
        assert_eq!(fx(2) / fx(3), Fixed::from_raw(43691));
        assert_eq!(fx(-2) / fx(3), Fixed::from_raw(-43691));
    }

    #[test]
    fn test_quantize_quarters() {
        assert_eq!(Fixed::ratio(13, 10).quantize(4), Fixed::ratio(5, 4));
        assert_eq!(Fixed::ratio(14, 10).quantize(4), Fixed::ratio(3, 2));
        assert_eq!(Fixed::ratio(-13, 10).quantize(4), Fixed::ratio(-5, 4));
        assert_eq!(fx(2).quantize(4), fx(2));
    }

    #[test]
    fn test_sqrt_exact_squares() {
        for n in [0i64, 1, 4, 9, 16, 100, 10_000] {
            let root = (n as f64).sqrt() as i64;
            assert_eq!(fx(n).sqrt(), fx(root), "sqrt({})", n);
        }
    }

    #[test]
    fn test_sqrt_fractional_values() {
        // sqrt(0.25) = 0.5, sqrt(2) ~ 1.41421
        assert_eq!(Fixed::ratio(1, 4).sqrt(), Fixed::HALF);
        let root2 = fx(2).sqrt();
        assert!((root2.raw() - 92682).abs() <= 1, "{}", root2.raw());
        assert_eq!(fx(-4).sqrt(), Fixed::ZERO);
    }

    #[test]
    fn test_ipow() {
        assert_eq!(fx(2).ipow(10), fx(1024));
        assert_eq!(fx(5).ipow(0), Fixed::ONE);
        assert_eq!(fx(2).ipow(-2), Fixed::ratio(1, 4));
    }

    #[test]
    fn test_pow_integer_and_fractional_exponents() {
        assert_eq!(fx(3).pow(fx(2)), fx(9));
        assert_eq!(fx(4).pow(Fixed::HALF), fx(2));
        assert_eq!(fx(16).pow(Fixed::ratio(1, 4)), fx(2));
        assert_eq!(fx(4).pow(-Fixed::HALF), Fixed::HALF);
        // 1.065 ^ 10 ~ 1.8771
        let p = Fixed::ratio(1065, 1000).pow(fx(10));
        assert!((p.raw() - 123_018).abs() < 40, "{}", p.raw());
    }

    #[test]
    fn test_pow_is_monotonic_in_exponent() {
        let base = Fixed::ratio(1065, 1000);
        let mut prev = base.pow(fx(-20));
        for q in -79..=200 {
            let cur = base.pow(Fixed::ratio(q, 4));
            assert!(cur >= prev, "exponent {}/4", q);
            prev = cur;
        }
    }

    #[test]
    fn test_underflowing_power_saturates() {
        let base = Fixed::ratio(1, 4);
        assert_eq!(base.ipow(20), Fixed::ZERO);
        assert_eq!(base.ipow(-20), Fixed::ONE / Fixed::from_raw(1));
        assert!(base.pow(fx(-20)) >= base.pow(fx(-8)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Fixed::ratio(3, 2).to_string(), "1.5000");
        assert_eq!(Fixed::ratio(-1, 4).to_string(), "-0.2500");
    }

    #[test]
    fn test_scale_truncates_like_integer_math() {
        // (2.5 * 3) / 4 in raw units
        let x = Fixed::ratio(5, 2).scale(3, 4);
        assert_eq!(x.raw(), (5 * FP_FACTOR / 2) * 3 / 4);
    }
}
