//! Price oracle capability consumed by the release gate.
//!
//! The escrow never trusts a feed to be fresh: every reading carries the
//! timestamp of the round it was confirmed in and is checked against the
//! ledger clock before use.

#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::{EscrowError, Identity, Price, Result};

/// Latest confirmed value of a feed.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceReading {
    /// Confirmed price, as a decimal string in JSON.
    #[cfg_attr(feature = "json", serde(with = "crate::serde::price_serde"))]
    pub price: Price,
    /// Unix timestamp at which the confirmed round opened.
    pub published_at: i64,
}

impl PriceReading {
    pub fn new(price: Price, published_at: i64) -> Self {
        Self {
            price,
            published_at,
        }
    }

    /// Returns the price if it was published no more than `max_staleness` seconds before `now`.
    ///
    /// # Errors
    ///
    /// Returns `EscrowError::StalePrice` otherwise.
    pub fn fresh_price(&self, now: i64, max_staleness: u64) -> Result<Price> {
        let age = now.saturating_sub(self.published_at);
        if age > 0 && age as u64 > max_staleness {
            return Err(EscrowError::StalePrice {
                published_at: self.published_at,
                now,
                max_staleness,
            });
        }
        Ok(self.price)
    }
}

/// An external price feed, treated as an opaque collaborator.
pub trait PriceFeed {
    /// Account identity of the feed; checked against the configured feed.
    fn address(&self) -> Identity;

    /// Latest confirmed value, or `None` if the feed holds no confirmed round.
    fn fetch_latest_value(&self) -> Option<PriceReading>;

    /// Whether the feed account has been closed by its operator.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Deterministic in-memory feed for tests and simulations.
#[derive(Debug, Clone, Default)]
pub struct MockFeed {
    address: Identity,
    reading: Option<PriceReading>,
    closed: bool,
}

impl MockFeed {
    /// A feed at `address` with no confirmed value yet.
    pub fn new(address: Identity) -> Self {
        Self {
            address,
            reading: None,
            closed: false,
        }
    }

    /// Publishes `price` as confirmed at `published_at`.
    pub fn publish(&mut self, price: Price, published_at: i64) {
        self.reading = Some(PriceReading::new(price, published_at));
    }

    /// Drops the confirmed value, as after a failed round.
    pub fn clear(&mut self) {
        self.reading = None;
    }

    /// Closes the feed account.
    pub fn close(&mut self) {
        self.closed = true;
        self.reading = None;
    }
}

impl PriceFeed for MockFeed {
    fn address(&self) -> Identity {
        self.address
    }

    fn fetch_latest_value(&self) -> Option<PriceReading> {
        if self.closed {
            return None;
        }
        self.reading
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
