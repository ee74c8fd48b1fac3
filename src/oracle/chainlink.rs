//! Chainlink AggregatorV3 response decoding.
//!
//! `latestRoundData()` returns five words:
//! roundId (uint80), answer (int256), startedAt, updatedAt, answeredInRound (uint80).

use crate::abi::{self, AbiError};
use crate::models::PriceRound;

/// latestRoundData() selector
pub const LATEST_ROUND_DATA_SELECTOR: &str = "0xfeaf968c";
/// decimals() selector
pub const DECIMALS_SELECTOR: &str = "0x313ce567";

/// Decode `latestRoundData()` return data.
///
/// With `expose_started_at = false` the start time is dropped, so the
/// validity filter treats it as not checked.
pub fn decode_latest_round_data(
    data: &[u8],
    feed_decimals: u8,
    expose_started_at: bool,
) -> Result<PriceRound, AbiError> {
    let round_id = abi::decode_u80(data, 0)?;
    let answer = abi::decode_i256(data, 1)?;
    let started_at = abi::decode_u256(data, 2)?;
    let updated_at = abi::decode_u256(data, 3)?;
    let answered_in_round = abi::decode_u80(data, 4)?;

    Ok(PriceRound {
        round_id,
        answered_in_round,
        answer,
        started_at: expose_started_at.then_some(started_at),
        updated_at,
        feed_decimals,
    })
}
