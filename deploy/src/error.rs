use ethers::{
    contract::{ContractError, EthError},
    providers::{JsonRpcError, Middleware, MiddlewareError, ProviderError},
    types::{Bytes, H256},
};
use thiserror::Error;

/// Revert reason emitted by the collection once every token is minted.
const REVERT_SUPPLY_CAP: &str = "Maximum supply reached";
/// Revert reason emitted while the owner keeps minting closed.
const REVERT_MINTING_DISABLED: &str = "Minting is currently disabled";

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("maximum supply reached")]
    SupplyCapReached,

    #[error("minting is disabled")]
    MintingDisabled,

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("transaction {0:?} was dropped before confirmation")]
    Dropped(H256),

    #[error("network error: {0}")]
    Network(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScriptError {
    /// Operator guidance printed next to the error.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ScriptError::InsufficientFunds(_) => {
                Some("Make sure the signer holds enough ETH for gas fees")
            }
            ScriptError::SupplyCapReached => Some("Every token of the collection has been minted"),
            ScriptError::MintingDisabled => {
                Some("Minting has been disabled by the contract owner")
            }
            ScriptError::Config(_) => Some("Check the network profile variables in your .env file"),
            _ => None,
        }
    }

    /// Maps a decoded `Error(string)` revert reason to its error kind.
    pub fn from_revert_reason(reason: &str) -> Self {
        if reason.contains(REVERT_SUPPLY_CAP) {
            ScriptError::SupplyCapReached
        } else if reason.contains(REVERT_MINTING_DISABLED) {
            ScriptError::MintingDisabled
        } else {
            ScriptError::Reverted(reason.to_string())
        }
    }

    /// Classifies a JSON-RPC error object returned by the node.
    pub fn from_rpc_error(err: &JsonRpcError) -> Self {
        if let Some(data) = err.as_revert_data() {
            return Self::from_revert_data(&data);
        }
        if is_insufficient_funds(err) {
            return ScriptError::InsufficientFunds(err.message.clone());
        }
        ScriptError::Network(err.to_string())
    }

    /// Classifies an error raised by any middleware layer, e.g. on `send_transaction`.
    pub fn from_middleware_error<E: MiddlewareError>(err: E) -> Self {
        match err.as_error_response() {
            Some(response) => Self::from_rpc_error(response),
            None => ScriptError::Network(err.to_string()),
        }
    }

    fn from_revert_data(data: &Bytes) -> Self {
        match String::decode_with_selector(data) {
            Some(reason) => Self::from_revert_reason(&reason),
            None if data.is_empty() => ScriptError::Reverted("no reason given".to_string()),
            None => ScriptError::Reverted(format!("custom error {data}")),
        }
    }
}

// Nodes report this as a generic -32000 server error, only the message tells it apart.
fn is_insufficient_funds(err: &JsonRpcError) -> bool {
    let message = err.message.to_lowercase();
    message.contains("insufficient funds") || message.contains("doesn't have enough funds")
}

impl<M: Middleware> From<ContractError<M>> for ScriptError {
    fn from(err: ContractError<M>) -> Self {
        if let Some(data) = err.as_revert() {
            return Self::from_revert_data(data);
        }
        match err {
            ContractError::MiddlewareError { e } => Self::from_middleware_error(e),
            ContractError::ProviderError { e } => Self::from_middleware_error(e),
            err => ScriptError::Network(err.to_string()),
        }
    }
}

impl From<ProviderError> for ScriptError {
    fn from(err: ProviderError) -> Self {
        Self::from_middleware_error(err)
    }
}
