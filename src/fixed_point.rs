//! Checked 256-bit Integers for Vault Accounting
//!
//! Vault and oracle contracts expose `uint256` / `int256` values. Every amount
//! computation in this crate goes through [`U256`], which refuses to hold a value
//! wider than 256 bits and reports overflow instead of wrapping. Floating point
//! only appears in display helpers.

use num_bigint::{BigInt, BigUint, Sign};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Price-per-share / high-water-mark scale (18 decimals).
pub const HWM_SCALE: u64 = 1_000_000_000_000_000_000;

/// Basis-point scale.
pub const BPS_SCALE: u64 = 10_000;

/// Largest valid performance fee (100%).
pub const MAX_FEE_BPS: u16 = 10_000;

const UINT_BITS: u64 = 256;
const INT_MAGNITUDE_BITS: u64 = 255;

// =============================================================================
// ERRORS
// =============================================================================

/// Failure of a checked integer operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixedPointError {
    /// Result does not fit in 256 bits.
    Overflow { op: &'static str },
    /// Unsigned subtraction went below zero.
    Underflow,
    DivisionByZero,
    /// A value handed to a constructor is wider than the target type.
    OutOfRange { bits: u64 },
    InvalidLiteral(String),
}

impl fmt::Display for FixedPointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow { op } => write!(f, "uint256 overflow in {}", op),
            Self::Underflow => write!(f, "uint256 underflow in sub"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::OutOfRange { bits } => {
                write!(f, "value needs {} bits, exceeds 256-bit range", bits)
            }
            Self::InvalidLiteral(s) => write!(f, "invalid integer literal '{}'", s),
        }
    }
}

impl std::error::Error for FixedPointError {}

// =============================================================================
// U256
// =============================================================================

/// Unsigned 256-bit integer with checked arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U256(BigUint);

impl U256 {
    pub fn zero() -> Self {
        Self(BigUint::default())
    }

    /// Wrap a `BigUint`, rejecting anything wider than 256 bits.
    pub fn try_from_biguint(value: BigUint) -> Result<Self, FixedPointError> {
        let bits = value.bits();
        if bits > UINT_BITS {
            return Err(FixedPointError::OutOfRange { bits });
        }
        Ok(Self(value))
    }

    /// Big-endian 32-byte word (always in range).
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }

    /// `10^exp`, failing when the power does not fit.
    pub fn pow10(exp: u32) -> Result<Self, FixedPointError> {
        Self::try_from_biguint(BigUint::from(10u32).pow(exp))
            .map_err(|_| FixedPointError::Overflow { op: "pow10" })
    }

    pub fn is_zero(&self) -> bool {
        self.0.bits() == 0
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn to_u64(&self) -> Option<u64> {
        let digits = self.0.to_u64_digits();
        match digits.len() {
            0 => Some(0),
            1 => Some(digits[0]),
            _ => None,
        }
    }

    pub fn checked_add(&self, rhs: &U256) -> Result<U256, FixedPointError> {
        Self::try_from_biguint(&self.0 + &rhs.0).map_err(|_| FixedPointError::Overflow { op: "add" })
    }

    pub fn checked_sub(&self, rhs: &U256) -> Result<U256, FixedPointError> {
        if rhs.0 > self.0 {
            return Err(FixedPointError::Underflow);
        }
        Ok(Self(&self.0 - &rhs.0))
    }

    pub fn checked_mul(&self, rhs: &U256) -> Result<U256, FixedPointError> {
        Self::try_from_biguint(&self.0 * &rhs.0).map_err(|_| FixedPointError::Overflow { op: "mul" })
    }

    /// Integer division truncating toward zero.
    pub fn checked_div(&self, rhs: &U256) -> Result<U256, FixedPointError> {
        if rhs.is_zero() {
            return Err(FixedPointError::DivisionByZero);
        }
        Ok(Self(&self.0 / &rhs.0))
    }

    /// `self * mul / div` truncating toward zero.
    ///
    /// The product is kept at full width (up to 512 bits); only the quotient
    /// must fit in 256 bits.
    pub fn mul_div(&self, mul: &U256, div: &U256) -> Result<U256, FixedPointError> {
        if div.is_zero() {
            return Err(FixedPointError::DivisionByZero);
        }
        Self::try_from_biguint(self.widening_mul(mul) / &div.0)
            .map_err(|_| FixedPointError::Overflow { op: "mul_div" })
    }

    /// Full-width product, never truncated.
    pub fn widening_mul(&self, rhs: &U256) -> BigUint {
        &self.0 * &rhs.0
    }
}

impl From<u8> for U256 {
    fn from(v: u8) -> Self {
        Self(BigUint::from(v))
    }
}

impl From<u16> for U256 {
    fn from(v: u16) -> Self {
        Self(BigUint::from(v))
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        Self(BigUint::from(v))
    }
}

impl From<u128> for U256 {
    fn from(v: u128) -> Self {
        Self(BigUint::from(v))
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts decimal (`"1000"`) or hex (`"0x3e8"`) literals.
impl FromStr for U256 {
    type Err = FixedPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            Some(hex) if hex.is_empty() => Some(BigUint::default()),
            Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16),
            None => BigUint::parse_bytes(trimmed.as_bytes(), 10),
        };
        let value = parsed.ok_or_else(|| FixedPointError::InvalidLiteral(s.to_string()))?;
        Self::try_from_biguint(value)
    }
}

impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// I256
// =============================================================================

/// Signed 256-bit integer (oracle answers).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct I256(BigInt);

impl I256 {
    pub fn try_from_bigint(value: BigInt) -> Result<Self, FixedPointError> {
        let bits = value.bits();
        let fits = bits <= INT_MAGNITUDE_BITS
            || (value.sign() == Sign::Minus
                && value.magnitude() == &(BigUint::from(1u8) << INT_MAGNITUDE_BITS as usize));
        if !fits {
            return Err(FixedPointError::OutOfRange { bits });
        }
        Ok(Self(value))
    }

    /// Two's-complement big-endian 32-byte word.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        Self(BigInt::from_signed_bytes_be(bytes))
    }

    /// Strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0.sign() == Sign::Plus
    }

    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }

    /// Lossy conversion for display.
    pub fn to_f64_lossy(&self) -> f64 {
        self.0.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl From<i64> for I256 {
    fn from(v: i64) -> Self {
        Self(BigInt::from(v))
    }
}

impl From<i128> for I256 {
    fn from(v: i128) -> Self {
        Self(BigInt::from(v))
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for I256 {
    type Err = FixedPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = BigInt::parse_bytes(s.trim().as_bytes(), 10)
            .ok_or_else(|| FixedPointError::InvalidLiteral(s.to_string()))?;
        Self::try_from_bigint(value)
    }
}

impl Serialize for I256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for I256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// DISPLAY
// =============================================================================

/// Render an integer amount with `decimals` implied decimal places.
///
/// Exact (no float), trailing fractional zeros trimmed: `1_500_000` at 6
/// decimals is `"1.5"`, zero is `"0"`.
pub fn format_units(value: &U256, decimals: u8) -> String {
    let digits = value.0.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');

    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}
