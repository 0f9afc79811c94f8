//! Client for the accounting contract, plus the tooling to stand up a
//! development chain around it.

pub use crate::{
    action::{Action, PermissionLevel},
    api::Api,
    asset::{Asset, Symbol},
    docgraph::{Content, ContentGroup, ContentValue, Document},
    error::{Error, Result},
    name::Name,
    transaction::TxId,
};

pub mod error;

/// Wire types and codecs
pub mod abi;
pub mod action;
pub mod asset;
pub mod name;
pub mod primitives;
pub mod serialization;
pub mod transaction;

pub mod keys;

/// Chain access
pub mod chain_client;
pub mod api;
pub mod system;

pub mod accounting;
pub mod dao;
pub mod docgraph;

pub mod environment;
pub mod testnet;
