//! Read-only view of a Switchboard v2 aggregator account.
//!
//! Only the fields the release gate needs are read, straight from the
//! packed account data:
//!
//! ```text
//!   [0..8]      [u8; 8]  account discriminator
//!   [236..240]  u32      min_oracle_results
//!   --- latest_confirmed_round (starts at 341) ---
//!   [341..345]  u32      num_success
//!   [358..366]  i64      round_open_timestamp
//!   [366..382]  i128     result.mantissa
//!   [382..386]  u32      result.scale
//! ```

use anchor_lang::prelude::*;

use crate::EscrowError;

/// Switchboard v2 oracle program; owner of every aggregator account.
pub const SWITCHBOARD_V2_PROGRAM_ID: Pubkey =
    anchor_lang::solana_program::pubkey!("SW1TCH7qEPTdLsDHRgPuMQjbQxKdH2aBStViMFnt64f");

/// Anchor discriminator of `AggregatorAccountData`.
pub const AGGREGATOR_DISCRIMINATOR: [u8; 8] = [217, 230, 65, 101, 201, 162, 27, 125];

const MIN_ORACLE_RESULTS_OFFSET: usize = 236;
const NUM_SUCCESS_OFFSET: usize = 341;
const ROUND_OPEN_TIMESTAMP_OFFSET: usize = 358;
const RESULT_MANTISSA_OFFSET: usize = 366;
const RESULT_SCALE_OFFSET: usize = 382;

/// Minimum data length covering every field read here.
pub const MIN_AGGREGATOR_LEN: usize = RESULT_SCALE_OFFSET + 4;

/// Confirmed result of the latest aggregator round: `mantissa * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedValue {
    pub mantissa: i128,
    pub scale: u32,
    pub round_open_timestamp: i64,
}

impl FeedValue {
    /// Strictly greater than the whole-unit `unlock_price`, compared exactly.
    /// A threshold that does not fit an `i128` is never exceeded.
    pub fn exceeds(&self, unlock_price: u64) -> bool {
        let threshold = 10i128
            .checked_pow(self.scale)
            .and_then(|factor| i128::from(unlock_price).checked_mul(factor));
        match threshold {
            Some(threshold) => self.mantissa > threshold,
            None => unlock_price == 0 && self.mantissa > 0,
        }
    }

    /// Fails if the round opened more than `max_staleness` seconds before `now`.
    pub fn check_staleness(&self, now: i64, max_staleness: i64) -> Result<()> {
        require!(
            self.round_open_timestamp >= now.saturating_sub(max_staleness),
            EscrowError::StalePrice
        );
        Ok(())
    }
}

/// Borrowed aggregator account data, validated for length and discriminator.
pub struct AggregatorFeed<'a> {
    data: &'a [u8],
}

impl<'a> AggregatorFeed<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        require!(
            data.len() >= MIN_AGGREGATOR_LEN && data[..8] == AGGREGATOR_DISCRIMINATOR,
            EscrowError::InvalidFeed
        );
        Ok(Self { data })
    }

    pub fn min_oracle_results(&self) -> u32 {
        self.read_u32(MIN_ORACLE_RESULTS_OFFSET)
    }

    /// Result of the latest confirmed round, or `None` if fewer oracles
    /// than required responded to it.
    pub fn fetch_latest_value(&self) -> Option<FeedValue> {
        let num_success = self.read_u32(NUM_SUCCESS_OFFSET);
        if num_success == 0 || num_success < self.min_oracle_results() {
            return None;
        }
        Some(FeedValue {
            mantissa: self.read_i128(RESULT_MANTISSA_OFFSET),
            scale: self.read_u32(RESULT_SCALE_OFFSET),
            round_open_timestamp: self.read_i64(ROUND_OPEN_TIMESTAMP_OFFSET),
        })
    }

    fn read_u32(&self, offset: usize) -> u32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.data[offset..offset + 4]);
        u32::from_le_bytes(buf)
    }

    fn read_i64(&self, offset: usize) -> i64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.data[offset..offset + 8]);
        i64::from_le_bytes(buf)
    }

    fn read_i128(&self, offset: usize) -> i128 {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&self.data[offset..offset + 16]);
        i128::from_le_bytes(buf)
    }
}

/// Reads the latest confirmed value from a live aggregator account.
pub fn latest_value(feed: &AccountInfo) -> Result<Option<FeedValue>> {
    require_keys_eq!(*feed.owner, SWITCHBOARD_V2_PROGRAM_ID, EscrowError::InvalidFeed);
    let data = feed.try_borrow_data()?;
    let aggregator = AggregatorFeed::new(&data)?;
    Ok(aggregator.fetch_latest_value())
}

/// A feed account its operator has closed: drained and emptied.
pub fn is_closed(feed: &AccountInfo) -> bool {
    feed.lamports() == 0 && feed.data_is_empty()
}
