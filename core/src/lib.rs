/// Escrow record and the price-gated release condition
pub mod escrow;
/// Account identities of owners, escrows, programs and feeds
pub mod identity;
/// Program configuration, constants and JSON helpers
pub mod interface;
/// In-memory ledger executing deposits and withdrawals atomically
pub mod ledger;
/// Oracle capability and a deterministic mock feed
pub mod oracle;
/// Deterministic escrow address derivation
pub mod pda;
/// Fixed-point oracle prices
pub mod price;

pub mod error;
mod serde;

pub use error::{EscrowError, IdentityError, PriceError};
pub use escrow::{EscrowRecord, EscrowState};
pub use identity::Identity;
pub use interface::EscrowConfig;
pub use ledger::{Ledger, Withdrawal};
pub use oracle::{MockFeed, PriceFeed, PriceReading};
pub use pda::derive_escrow_address;
pub use price::Price;

pub type Result<T> = std::result::Result<T, EscrowError>;
