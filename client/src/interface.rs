use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use burry_core::interface::{PROGRAM_ID, SOL_USD_FEED};
use burry_core::Identity;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

use crate::error::{ClientError, Result};

/// Connection and wallet settings, passed explicitly to every command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Path to the depositor's keypair file (e.g., `~/.config/solana/id.json`).
    pub payer_keypair_path: String,
    /// On-chain escrow program ID.
    #[serde(default = "default_program_id")]
    pub program_id: Identity,
    /// Aggregator account the program gates on.
    #[serde(default = "default_feed")]
    pub feed: Identity,
    /// Commitment used for reads and confirmations.
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

fn default_program_id() -> Identity {
    PROGRAM_ID
}

fn default_feed() -> Identity {
    SOL_USD_FEED
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

impl ClientConfig {
    /// Checks the RPC URL and commitment level.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.rpc_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "unsupported RPC scheme: {}",
                url.scheme()
            )));
        }
        self.commitment_config()?;
        Ok(())
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig> {
        self.commitment
            .parse::<CommitmentConfig>()
            .map_err(|_| ClientError::Config(format!("unknown commitment: {}", self.commitment)))
    }

    pub fn program_id(&self) -> Pubkey {
        to_pubkey(&self.program_id)
    }

    pub fn feed(&self) -> Pubkey {
        to_pubkey(&self.feed)
    }
}

pub fn to_pubkey(id: &Identity) -> Pubkey {
    Pubkey::new_from_array(id.to_bytes())
}

pub fn to_identity(key: &Pubkey) -> Identity {
    Identity::new(key.to_bytes())
}

pub fn load_client_config<P>(path: P) -> anyhow::Result<ClientConfig>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            anyhow::bail!(
                "Config file {:?} not found. Create one or pass --config explicitly.",
                path
            );
        }
        Err(e) => return Err(e).context(format!("opening file {:?}", path)),
    };
    let config: ClientConfig =
        serde_json::from_reader(file).with_context(|| format!("parsing JSON from {:?}", path))?;
    config
        .validate()
        .with_context(|| format!("validating config {:?}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        serde_json::from_str(
            r#"{
                "rpc_url": "https://api.devnet.solana.com",
                "payer_keypair_path": "/tmp/id.json"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_point_at_deployment() {
        let config = config();
        assert_eq!(config.program_id(), burry_escrow::ID);
        assert_eq!(config.feed(), burry_escrow::SOL_USD_FEED);
        assert_eq!(config.commitment_config().unwrap(), CommitmentConfig::confirmed());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_settings() {
        let mut bad_url = config();
        bad_url.rpc_url = "not a url".into();
        assert!(matches!(bad_url.validate(), Err(ClientError::UrlParse(_))));

        let mut bad_scheme = config();
        bad_scheme.rpc_url = "ftp://example.com".into();
        assert!(matches!(bad_scheme.validate(), Err(ClientError::Config(_))));

        let mut bad_commitment = config();
        bad_commitment.commitment = "eventually".into();
        assert!(matches!(
            bad_commitment.validate(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn missing_file() {
        let err = load_client_config("/nonexistent/burry.json").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
