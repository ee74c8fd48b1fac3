//! ABI word decoding for `eth_call` results.
//!
//! Return data is a sequence of 32-byte big-endian words. Narrow types
//! (`address`, `uint8`, `uint80`) must have their unused high bytes zeroed.

use std::fmt;

use crate::fixed_point::{I256, U256};
use crate::models::Address;

pub const WORD_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    TooShort { needed: usize, got: usize },
    /// High bytes set on a narrow type.
    OutOfRange { ty: &'static str, index: usize },
    InvalidHex,
}

impl fmt::Display for AbiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { needed, got } => {
                write!(f, "return data too short: {} bytes, expected {}", got, needed)
            }
            Self::OutOfRange { ty, index } => {
                write!(f, "word {} does not fit in {}", index, ty)
            }
            Self::InvalidHex => write!(f, "return data is not valid hex"),
        }
    }
}

impl std::error::Error for AbiError {}

/// Decode a `0x`-prefixed hex result into raw bytes.
pub fn decode_hex_result(result: &str) -> Result<Vec<u8>, AbiError> {
    hex::decode(result.trim().trim_start_matches("0x")).map_err(|_| AbiError::InvalidHex)
}

/// The `index`-th 32-byte word.
pub fn word(data: &[u8], index: usize) -> Result<&[u8; WORD_SIZE], AbiError> {
    let start = index * WORD_SIZE;
    let end = start + WORD_SIZE;
    data.get(start..end)
        .and_then(|w| w.try_into().ok())
        .ok_or(AbiError::TooShort {
            needed: end,
            got: data.len(),
        })
}

fn check_high_bytes_zero(
    w: &[u8; WORD_SIZE],
    width: usize,
    ty: &'static str,
    index: usize,
) -> Result<(), AbiError> {
    if w[..WORD_SIZE - width].iter().any(|&b| b != 0) {
        return Err(AbiError::OutOfRange { ty, index });
    }
    Ok(())
}

pub fn decode_u256(data: &[u8], index: usize) -> Result<U256, AbiError> {
    Ok(U256::from_be_bytes(word(data, index)?))
}

pub fn decode_i256(data: &[u8], index: usize) -> Result<I256, AbiError> {
    Ok(I256::from_be_bytes(word(data, index)?))
}

pub fn decode_address(data: &[u8], index: usize) -> Result<Address, AbiError> {
    let w = word(data, index)?;
    check_high_bytes_zero(w, 20, "address", index)?;
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&w[12..]);
    Ok(Address::new(bytes))
}

pub fn decode_u8(data: &[u8], index: usize) -> Result<u8, AbiError> {
    let w = word(data, index)?;
    check_high_bytes_zero(w, 1, "uint8", index)?;
    Ok(w[31])
}

pub fn decode_u16(data: &[u8], index: usize) -> Result<u16, AbiError> {
    let w = word(data, index)?;
    check_high_bytes_zero(w, 2, "uint16", index)?;
    Ok(u16::from_be_bytes([w[30], w[31]]))
}

pub fn decode_u80(data: &[u8], index: usize) -> Result<u128, AbiError> {
    let w = word(data, index)?;
    check_high_bytes_zero(w, 10, "uint80", index)?;
    let mut bytes = [0u8; 16];
    bytes[6..].copy_from_slice(&w[22..]);
    Ok(u128::from_be_bytes(bytes))
}
