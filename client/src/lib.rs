pub use agent::EscrowAgent;
pub use error::{ClientError, Result};
pub use interface::{load_client_config, ClientConfig};

pub mod agent;
pub mod error;
pub mod interface;
