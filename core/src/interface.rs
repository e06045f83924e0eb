//! Escrow program configuration and JSON (de)serialization helpers.

#[cfg(feature = "json")]
use std::fs::File;
#[cfg(feature = "json")]
use std::path::Path;

#[cfg(feature = "json")]
use anyhow::Context;
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::Identity;

/// Seed prefix of every escrow address.
pub const ESCROW_SEED: &[u8] = b"MICHAEL BURRY";

/// Deployed escrow program: `GhdEns4NgkpVd22VwH624rfxYW4Yg4oXrHDtCQ7451Ja`.
pub const PROGRAM_ID: Identity = Identity::new([
    233, 71, 130, 172, 0, 227, 186, 255, 79, 34, 3, 185, 136, 60, 151, 80, 34, 111, 109, 44, 196,
    198, 235, 17, 240, 58, 135, 143, 205, 74, 139, 203,
]);

/// Switchboard SOL/USD aggregator: `GvDMxPzN1sCj7L26YDK2HnMRXEQmQ2aemov8YBtPS7vR`.
pub const SOL_USD_FEED: Identity = Identity::new([
    236, 129, 16, 81, 18, 162, 87, 214, 29, 244, 207, 95, 19, 238, 10, 27, 1, 145, 151, 200, 197,
    52, 59, 79, 42, 126, 200, 132, 106, 226, 44, 26,
]);

/// Oldest confirmed round the gate accepts, in seconds.
pub const DEFAULT_MAX_STALENESS_SECS: u64 = 300;

/// Rent-exempt minimum of an escrow account
/// (57 data bytes + 128 bytes of account overhead, at 6960 lamports per byte).
pub const DEFAULT_RENT_EXEMPT_MINIMUM: u64 = 1_287_600;

/// Protocol-level settings shared by every escrow.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowConfig {
    /// Program under which escrow addresses are derived.
    pub program_id: Identity,

    /// Seed prefix of escrow addresses.
    pub escrow_seed: String,

    /// The only feed the release gate accepts.
    pub feed: Identity,

    /// Maximum age of a confirmed oracle round.
    #[cfg_attr(feature = "json", serde(default = "default_max_staleness"))]
    pub max_staleness_secs: u64,

    /// Reserve every escrow account must hold on top of its balance.
    #[cfg_attr(feature = "json", serde(default = "default_rent_exempt_minimum"))]
    pub rent_exempt_minimum: u64,
}

#[cfg(feature = "json")]
fn default_max_staleness() -> u64 {
    DEFAULT_MAX_STALENESS_SECS
}

#[cfg(feature = "json")]
fn default_rent_exempt_minimum() -> u64 {
    DEFAULT_RENT_EXEMPT_MINIMUM
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            program_id: PROGRAM_ID,
            escrow_seed: String::from_utf8_lossy(ESCROW_SEED).into_owned(),
            feed: SOL_USD_FEED,
            max_staleness_secs: DEFAULT_MAX_STALENESS_SECS,
            rent_exempt_minimum: DEFAULT_RENT_EXEMPT_MINIMUM,
        }
    }
}

impl EscrowConfig {
    pub fn seed(&self) -> &[u8] {
        self.escrow_seed.as_bytes()
    }
}

/// Reads a JSON-encoded file from the given `path` and deserializes into type `T`.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be opened, read, or parsed.
///
/// # Examples
///
/// ```no_run
/// # use burry_core::interface::{load_escrow_data, EscrowConfig};
/// let _config: EscrowConfig = load_escrow_data("./escrow_config.json").unwrap();
/// ```
#[cfg(feature = "json")]
pub fn load_escrow_data<P, T>(path: P) -> anyhow::Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("loading escrow data: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parsing JSON from {:?}", path))
}

/// Writes `data` (serializable) as pretty-printed JSON to the given `path`.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be created or data cannot be serialized.
#[cfg(feature = "json")]
pub fn save_escrow_data<P, T>(path: P, data: &T) -> anyhow::Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating file {:?}", path))?;
    serde_json::to_writer_pretty(file, data)
        .with_context(|| format!("serializing to JSON to {:?}", path))
}
