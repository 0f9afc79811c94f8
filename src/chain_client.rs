use async_trait::async_trait;
use serde::Deserialize;
use std::{error, fmt};
use thiserror::Error;

use crate::{
    keys::PublicKey,
    name::Name,
    primitives::Checksum256,
    transaction::{PackedTransaction, Transaction},
};

/// nodeos HTTP client
pub mod nodeos_http_client;
/// Request and response bodies of the chain API
pub mod schemas;
/// In-memory chain for tests
pub mod test_chain_client;

pub use schemas::{
    AccountInfo, ChainInfo, Permission, PushedTransaction, TableRows, TableRowsRequest,
};

/// Interface to an EOSIO-family node. The abstraction lets the provisioner and
/// the action builders run against a live `nodeos` or an in-memory chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Head block, chain id and server version
    async fn get_info(&self) -> ChainClientResult<ChainInfo>;

    /// Subset of `available_keys` needed to authorize `transaction`
    async fn get_required_keys(
        &self,
        transaction: &Transaction,
        available_keys: &[PublicKey],
    ) -> ChainClientResult<Vec<PublicKey>>;

    /// Submit a signed transaction
    async fn push_transaction(
        &self,
        transaction: &PackedTransaction,
    ) -> ChainClientResult<PushedTransaction>;

    async fn get_account(&self, account: Name) -> ChainClientResult<AccountInfo>;

    /// sha256 of the deployed wasm, all zeroes when no code is set
    async fn get_code_hash(&self, account: Name) -> ChainClientResult<Checksum256>;

    async fn get_table_rows(&self, request: &TableRowsRequest) -> ChainClientResult<TableRows>;
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ChainClientError {
    #[error("Could not reach node: {0}")]
    Transport(Box<dyn error::Error + Send + Sync>),
    #[error("Unexpected response from node: {0}")]
    Malformed(Box<dyn error::Error + Send + Sync>),
    #[error("Chain rejected request: {0}")]
    Rejected(ChainRejection),
}

impl ChainClientError {
    /// The rejection, if the node answered with an error body
    pub fn rejection(&self) -> Option<&ChainRejection> {
        match self {
            ChainClientError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

#[allow(missing_docs)]
pub type ChainClientResult<T> = Result<T, ChainClientError>;

/// Error reported by the chain, e.g. a failed assertion inside a contract or
/// a missing account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRejection {
    pub code: i64,
    pub name: String,
    pub what: String,
    pub details: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Deserialize)]
struct ErrorInfo {
    code: i64,
    name: String,
    what: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl ChainRejection {
    pub fn new(code: i64, name: &str, what: &str, detail: impl Into<String>) -> Self {
        ChainRejection {
            code,
            name: name.to_string(),
            what: what.to_string(),
            details: vec![detail.into()],
        }
    }

    /// Parses a nodeos error body, falling back to the raw text when the body
    /// is not in the usual `{code, message, error: {..}}` shape.
    pub fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error }) => ChainRejection {
                code: error.code,
                name: error.name,
                what: error.what,
                details: error.details.into_iter().map(|d| d.message).collect(),
            },
            Err(_) => ChainRejection {
                code: i64::from(status),
                name: "http_error".to_string(),
                what: format!("HTTP status {status}"),
                details: vec![body.to_string()],
            },
        }
    }

    /// Whether the node rejected the request because an account it refers to
    /// does not exist.
    pub fn is_unknown_account(&self) -> bool {
        self.name == "account_query_exception"
            || self
                .details
                .iter()
                .any(|d| d.contains("does not exist") || d.contains("unknown key"))
    }
}

impl fmt::Display for ChainRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.code, self.what)?;
        for detail in &self.details {
            write!(f, "; {detail}")?;
        }
        Ok(())
    }
}
