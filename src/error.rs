use std::path::PathBuf;
use thiserror::Error;

use crate::{
    asset::AssetError,
    chain_client::{ChainClientError, ChainRejection},
    docgraph::ContentError,
    keys::KeyError,
    name::{Name, NameError},
    serialization::SerializationError,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Chain client error: {0}")]
    ChainClient(#[from] ChainClientError),
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
    #[error("Document error: {0}")]
    Content(#[from] ContentError),
    #[error("Invalid name: {0}")]
    Name(#[from] NameError),
    #[error("Invalid asset: {0}")]
    Asset(#[from] AssetError),
    #[error("Enrolled member mismatch: expected {expected}, last document names {found}")]
    MemberMismatch { expected: Name, found: Name },
    #[error("Account {0} has no key on its active permission")]
    NoActiveKey(Name),
    #[error("Could not read contract artifact {path:?}: {source}")]
    Artifact {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid ABI: {0}")]
    Abi(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Chain-side rejection behind this error, if any.
    pub fn rejection(&self) -> Option<&ChainRejection> {
        match self {
            Error::ChainClient(err) => err.rejection(),
            _ => None,
        }
    }
}
