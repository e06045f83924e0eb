pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Keypair error: {0}")]
    Keypair(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("URL parse error")]
    UrlParse(#[from] url::ParseError),
    #[error("RPC client error")]
    SolanaRpcClient(#[from] solana_client::client_error::ClientError),
    #[error("Anchor error: {0}")]
    Anchor(#[from] anchor_lang::error::Error),
    #[error("Escrow error: {0}")]
    Escrow(#[from] burry_core::EscrowError),
}
