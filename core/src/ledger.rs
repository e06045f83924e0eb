//! In-memory host ledger running the escrow state machine.
//!
//! Every operation is one transaction: all checks run before the first
//! mutation, so a failed call leaves balances and records untouched.
//! Callers that share a ledger across threads wrap it in a lock, which
//! plays the role of the host's per-account write lock.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument};

use crate::escrow::{EscrowRecord, EscrowState};
use crate::interface::EscrowConfig;
use crate::oracle::PriceFeed;
use crate::pda::derive_escrow_address;
use crate::{EscrowError, Identity, Price, Result};

/// Outcome of a successful withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub escrow: Identity,
    pub owner: Identity,
    /// Escrowed balance returned to the owner.
    pub released: u64,
    /// Rent reserve returned to the owner on close.
    pub rent_refund: u64,
    /// Price that opened the gate; `None` for closed-feed withdrawals.
    pub price: Option<Price>,
}

impl Withdrawal {
    /// Total amount credited to the owner.
    pub fn total(&self) -> u64 {
        self.released.saturating_add(self.rent_refund)
    }
}

#[derive(Debug, Clone)]
struct EscrowAccount {
    record: EscrowRecord,
    rent_reserve: u64,
}

/// Native balances plus escrow accounts, with a unix clock for staleness checks.
#[derive(Debug, Clone)]
pub struct Ledger {
    config: EscrowConfig,
    clock: i64,
    balances: HashMap<Identity, u64>,
    escrows: HashMap<Identity, EscrowAccount>,
    /// Addresses whose escrow was closed and not re-funded since. Holds at
    /// most one entry per owner; only used to tell `Closed` apart from
    /// `Uninitialized`.
    closed: HashSet<Identity>,
}

impl Ledger {
    pub fn new(config: EscrowConfig) -> Self {
        Self {
            config,
            clock: 0,
            balances: HashMap::new(),
            escrows: HashMap::new(),
            closed: HashSet::new(),
        }
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    /// Current unix timestamp.
    pub fn clock(&self) -> i64 {
        self.clock
    }

    pub fn set_clock(&mut self, unix_timestamp: i64) {
        self.clock = unix_timestamp;
    }

    /// Native balance held by `account` outside any escrow.
    pub fn balance(&self, account: &Identity) -> u64 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Credits `lamports` to `account`, returning the new balance.
    pub fn fund(&mut self, account: Identity, lamports: u64) -> Result<u64> {
        let balance = self
            .balance(&account)
            .checked_add(lamports)
            .ok_or(EscrowError::Overflow)?;
        self.balances.insert(account, balance);
        Ok(balance)
    }

    /// Escrow address of `owner` under the configured seed and program.
    pub fn escrow_address(&self, owner: &Identity) -> Result<Identity> {
        derive_escrow_address(self.config.seed(), owner, &self.config.program_id)
            .map(|(address, _)| address)
    }

    /// The funded record at `address`, if any.
    pub fn escrow(&self, address: &Identity) -> Option<&EscrowRecord> {
        self.escrows.get(address).map(|account| &account.record)
    }

    /// Total lamports held by the escrow account (balance plus rent reserve).
    pub fn escrow_lamports(&self, address: &Identity) -> u64 {
        self.escrows
            .get(address)
            .map(|account| account.record.balance.saturating_add(account.rent_reserve))
            .unwrap_or_default()
    }

    pub fn state(&self, address: &Identity) -> EscrowState {
        if self.escrows.contains_key(address) {
            EscrowState::Funded
        } else if self.closed.contains(address) {
            EscrowState::Closed
        } else {
            EscrowState::Uninitialized
        }
    }

    /// Creates and funds `owner`'s escrow, locking `amount` until the oracle
    /// price rises above `unlock_price`. Returns the escrow address.
    ///
    /// # Errors
    ///
    /// - `EscrowError::ZeroAmount` if `amount` is zero
    /// - `EscrowError::AlreadyInitialized` if `owner` already has a funded escrow
    /// - `EscrowError::InsufficientFunds` if `owner` cannot cover `amount` plus the rent reserve
    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub fn deposit(&mut self, owner: Identity, amount: u64, unlock_price: u64) -> Result<Identity> {
        if amount == 0 {
            return Err(EscrowError::ZeroAmount);
        }

        let (address, bump) =
            derive_escrow_address(self.config.seed(), &owner, &self.config.program_id)?;
        debug!(escrow = %address, bump, "Derived escrow address");

        if self.escrows.contains_key(&address) {
            return Err(EscrowError::AlreadyInitialized);
        }

        let rent_reserve = self.config.rent_exempt_minimum;
        let required = amount
            .checked_add(rent_reserve)
            .ok_or(EscrowError::Overflow)?;
        let available = self.balance(&owner);
        if available < required {
            return Err(EscrowError::InsufficientFunds {
                required,
                available,
            });
        }

        self.balances.insert(owner, available - required);
        self.escrows.insert(
            address,
            EscrowAccount {
                record: EscrowRecord::new(owner, unlock_price, amount, bump),
                rent_reserve,
            },
        );
        self.closed.remove(&address);

        info!(escrow = %address, amount, unlock_price, "Escrow funded");
        Ok(address)
    }

    /// Releases `caller`'s escrow if the feed's latest fresh price is above
    /// the unlock price, returning everything the account holds to the owner
    /// and closing it.
    ///
    /// # Errors
    ///
    /// - `EscrowError::AddressMismatch` if `escrow` is not `caller`'s derived address
    /// - `EscrowError::EscrowNotFound` if no funded escrow lives there
    /// - `EscrowError::InvalidFeed` if `feed` is not the configured feed
    /// - `EscrowError::NoOracleValue`, `EscrowError::StalePrice` or
    ///   `EscrowError::ConditionNotMet` from the release gate
    #[instrument(skip(self, caller, escrow, feed), fields(caller = %caller, escrow = %escrow))]
    pub fn withdraw(
        &mut self,
        caller: Identity,
        escrow: Identity,
        feed: &dyn PriceFeed,
    ) -> Result<Withdrawal> {
        let account = self.authorize(&caller, &escrow, feed)?;
        let price = account.record.check_release(
            feed.fetch_latest_value(),
            self.clock,
            self.config.max_staleness_secs,
        )?;
        debug!(%price, unlock_price = account.record.unlock_price, "Release condition met");

        let mut withdrawal = self.close(&escrow)?;
        withdrawal.price = Some(price);
        Ok(withdrawal)
    }

    /// Releases `caller`'s escrow without a price check once the configured
    /// feed has been closed by its operator.
    ///
    /// # Errors
    ///
    /// As [`Ledger::withdraw`] for the account checks, and
    /// `EscrowError::FeedNotClosed` while the feed is still open.
    #[instrument(skip(self, caller, escrow, feed), fields(caller = %caller, escrow = %escrow))]
    pub fn withdraw_closed_feed(
        &mut self,
        caller: Identity,
        escrow: Identity,
        feed: &dyn PriceFeed,
    ) -> Result<Withdrawal> {
        self.authorize(&caller, &escrow, feed)?;
        if !feed.is_closed() {
            return Err(EscrowError::FeedNotClosed);
        }
        self.close(&escrow)
    }

    fn authorize(
        &self,
        caller: &Identity,
        escrow: &Identity,
        feed: &dyn PriceFeed,
    ) -> Result<&EscrowAccount> {
        if &self.escrow_address(caller)? != escrow {
            return Err(EscrowError::AddressMismatch);
        }
        let account = self
            .escrows
            .get(escrow)
            .ok_or(EscrowError::EscrowNotFound)?;
        account.record.check_owner(caller)?;

        if feed.address() != self.config.feed {
            return Err(EscrowError::InvalidFeed);
        }
        Ok(account)
    }

    fn close(&mut self, escrow: &Identity) -> Result<Withdrawal> {
        let account = self
            .escrows
            .get(escrow)
            .ok_or(EscrowError::EscrowNotFound)?;
        let owner = account.record.owner;
        let released = account.record.balance;
        let rent_refund = account.rent_reserve;

        let credited = self
            .balance(&owner)
            .checked_add(released)
            .and_then(|b| b.checked_add(rent_refund))
            .ok_or(EscrowError::Overflow)?;

        self.escrows.remove(escrow);
        self.closed.insert(*escrow);
        self.balances.insert(owner, credited);

        info!(escrow = %escrow, owner = %owner, released, rent_refund, "Escrow closed");
        Ok(Withdrawal {
            escrow: *escrow,
            owner,
            released,
            rent_refund,
            price: None,
        })
    }
}
