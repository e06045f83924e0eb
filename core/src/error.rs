use thiserror::Error;

/// Escrow-related errors.
#[derive(Debug, Error, PartialEq)]
pub enum EscrowError {
    /// An escrow already lives at the owner's derived address.
    #[error("escrow account already initialized")]
    AlreadyInitialized,

    /// Depositor cannot cover the amount plus the rent reserve.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("escrow amount must be non-zero")]
    ZeroAmount,

    /// No funded escrow at the given address (never created, or already closed).
    #[error("escrow account not found")]
    EscrowNotFound,

    /// Caller is not the owner the escrow address was derived from.
    #[error("escrow address does not match caller")]
    AddressMismatch,

    #[error("Current price is not above Escrow unlock price.")]
    ConditionNotMet,

    /// Latest confirmed price was published too long ago.
    #[error("stale price: published at {published_at}, now {now}, max staleness {max_staleness}s")]
    StalePrice {
        published_at: i64,
        now: i64,
        max_staleness: u64,
    },

    #[error("oracle holds no confirmed value")]
    NoOracleValue,

    /// Oracle handle is not the feed configured for this escrow program.
    #[error("invalid price feed")]
    InvalidFeed,

    #[error("price feed is still open")]
    FeedNotClosed,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("no viable bump seed for program address")]
    NoViableBump,

    #[error("seed exceeds {max} bytes: {len}")]
    MaxSeedLengthExceeded { len: usize, max: usize },

    #[error("identity error: {0}")]
    Identity(IdentityError),

    #[error("price parsing error: {0}")]
    Price(PriceError),
}

/// Errors that might occur while parsing into an `Identity`.
#[derive(Debug, Error, PartialEq)]
pub enum IdentityError {
    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("cannot parse identity from empty string")]
    EmptyIdentity,

    #[error("identity must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Errors when parsing a decimal `Price`.
#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    #[error("cannot parse price from empty string")]
    Empty,

    #[error("too many fractional digits: {0}")]
    Scale(usize),

    #[error("parse int error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
}

impl From<IdentityError> for EscrowError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<PriceError> for EscrowError {
    fn from(value: PriceError) -> Self {
        Self::Price(value)
    }
}
