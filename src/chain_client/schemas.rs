use crate::{
    keys::PublicKey,
    name::Name,
    primitives::{Checksum256, TimePoint},
    system::Authority,
    transaction::{Transaction, TxId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    #[serde(default)]
    pub server_version: String,
    pub chain_id: Checksum256,
    pub head_block_num: u32,
    pub last_irreversible_block_num: u32,
    pub head_block_id: Checksum256,
    pub head_block_time: TimePoint,
    pub head_block_producer: Name,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequiredKeysRequest<'a> {
    pub transaction: &'a Transaction,
    pub available_keys: &'a [PublicKey],
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequiredKeys {
    pub required_keys: Vec<PublicKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushedTransaction {
    pub transaction_id: TxId,
    /// Action traces as returned by the node
    #[serde(default)]
    pub processed: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AccountRequest {
    pub account_name: Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub perm_name: Name,
    pub parent: Name,
    pub required_auth: Authority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_name: Name,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl AccountInfo {
    pub fn permission(&self, name: Name) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.perm_name == name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodeHash {
    pub account_name: Name,
    pub code_hash: Checksum256,
}

/// Body of `/v1/chain/get_table_rows`. Rows are always requested as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRowsRequest {
    pub code: Name,
    pub scope: String,
    pub table: Name,
    pub json: bool,
    pub limit: u32,
    pub reverse: bool,
}

impl TableRowsRequest {
    pub fn new(code: Name, scope: impl Into<String>, table: Name) -> Self {
        TableRowsRequest {
            code,
            scope: scope.into(),
            table,
            json: true,
            limit: 10,
            reverse: false,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRows {
    pub rows: Vec<serde_json::Value>,
    #[serde(default)]
    pub more: bool,
}
