//! Escrow record and the price-gated release condition.

#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::oracle::PriceReading;
use crate::{EscrowError, Identity, Price, Result};

/// Lifecycle of an escrow address.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowState {
    /// No record has ever been created at the address.
    Uninitialized,
    /// Funds are locked, awaiting a passing price.
    Funded,
    /// Funds were returned to the owner and the record deleted.
    Closed,
}

/// Persisted state of one escrow.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowRecord {
    /// Depositor; the only party that can withdraw.
    pub owner: Identity,
    /// Price the oracle must strictly exceed, in whole quote units.
    pub unlock_price: u64,
    /// Escrowed amount, excluding the rent reserve.
    pub balance: u64,
    /// Canonical bump of the escrow address.
    pub bump: u8,
}

impl EscrowRecord {
    pub fn new(owner: Identity, unlock_price: u64, balance: u64, bump: u8) -> Self {
        Self {
            owner,
            unlock_price,
            balance,
            bump,
        }
    }

    /// Rejects anyone but the owner.
    pub fn check_owner(&self, caller: &Identity) -> Result<()> {
        if &self.owner != caller {
            return Err(EscrowError::AddressMismatch);
        }
        Ok(())
    }

    /// Evaluates the release condition against the oracle's latest reading.
    ///
    /// Passes only for a confirmed, fresh price strictly above `unlock_price`,
    /// and returns that price.
    ///
    /// # Errors
    ///
    /// - `EscrowError::NoOracleValue` if there is no confirmed reading
    /// - `EscrowError::StalePrice` if the reading is older than `max_staleness`
    /// - `EscrowError::ConditionNotMet` if the price is at or below `unlock_price`
    pub fn check_release(
        &self,
        reading: Option<PriceReading>,
        now: i64,
        max_staleness: u64,
    ) -> Result<Price> {
        let reading = reading.ok_or(EscrowError::NoOracleValue)?;
        let price = reading.fresh_price(now, max_staleness)?;
        if !price.exceeds(self.unlock_price) {
            return Err(EscrowError::ConditionNotMet);
        }
        Ok(price)
    }
}
