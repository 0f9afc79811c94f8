//! Builders for the native `eosio` actions used to provision accounts and
//! deploy contracts.

use crate::{
    abi::AbiDef,
    action::{Action, PermissionLevel},
    keys::PublicKey,
    name::Name,
    serialization::{eos_struct_codec, EosSerialize},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWeight {
    pub key: PublicKey,
    pub weight: u16,
}

eos_struct_codec!(KeyWeight { key, weight });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevelWeight {
    pub permission: PermissionLevel,
    pub weight: u16,
}

eos_struct_codec!(PermissionLevelWeight { permission, weight });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitWeight {
    pub wait_sec: u32,
    pub weight: u16,
}

eos_struct_codec!(WaitWeight { wait_sec, weight });

/// Weighted set of keys, permissions and delays that satisfies a permission
/// once the summed weight reaches `threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub threshold: u32,
    pub keys: Vec<KeyWeight>,
    pub accounts: Vec<PermissionLevelWeight>,
    pub waits: Vec<WaitWeight>,
}

eos_struct_codec!(Authority {
    threshold,
    keys,
    accounts,
    waits
});

impl Authority {
    /// Threshold 1, single key of weight 1.
    pub fn single_key(key: PublicKey) -> Self {
        Authority {
            threshold: 1,
            keys: vec![KeyWeight { key, weight: 1 }],
            accounts: Vec::new(),
            waits: Vec::new(),
        }
    }

    /// Adds a weighted permission. The chain only accepts authorities whose
    /// keys and accounts are sorted, so both lists are kept ordered.
    pub fn with_account(mut self, permission: PermissionLevel, weight: u16) -> Self {
        self.accounts.push(PermissionLevelWeight { permission, weight });
        self.accounts.sort_by_key(|a| a.permission);
        self
    }

    pub fn with_key(mut self, key: PublicKey, weight: u16) -> Self {
        self.keys.push(KeyWeight { key, weight });
        self.keys.sort_by_key(|k| k.key);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub creator: Name,
    pub name: Name,
    pub owner: Authority,
    pub active: Authority,
}

eos_struct_codec!(NewAccount {
    creator,
    name,
    owner,
    active
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAuth {
    pub account: Name,
    pub permission: Name,
    pub parent: Name,
    pub auth: Authority,
}

eos_struct_codec!(UpdateAuth {
    account,
    permission,
    parent,
    auth
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCode {
    pub account: Name,
    pub vmtype: u8,
    pub vmversion: u8,
    pub code: Vec<u8>,
}

eos_struct_codec!(SetCode {
    account,
    vmtype,
    vmversion,
    code
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetAbi {
    pub account: Name,
    pub abi: Vec<u8>,
}

eos_struct_codec!(SetAbi { account, abi });

/// `eosio::newaccount` creating `name` with `key` as both owner and active
/// authority, paid for by `creator`.
pub fn new_account(creator: Name, name: Name, key: PublicKey) -> Action {
    let payload = NewAccount {
        creator,
        name,
        owner: Authority::single_key(key),
        active: Authority::single_key(key),
    };
    Action::new(
        Name::EOSIO,
        Name::constant("newaccount"),
        vec![PermissionLevel::active(creator)],
        &payload,
    )
}

/// `eosio::updateauth`, authorized by `account@using_permission`.
pub fn update_auth(
    account: Name,
    permission: Name,
    parent: Name,
    auth: Authority,
    using_permission: Name,
) -> Action {
    let payload = UpdateAuth {
        account,
        permission,
        parent,
        auth,
    };
    Action::new(
        Name::EOSIO,
        Name::constant("updateauth"),
        vec![PermissionLevel::new(account, using_permission)],
        &payload,
    )
}

pub fn set_code(account: Name, code: Vec<u8>) -> Action {
    let payload = SetCode {
        account,
        vmtype: 0,
        vmversion: 0,
        code,
    };
    Action::new(
        Name::EOSIO,
        Name::constant("setcode"),
        vec![PermissionLevel::active(account)],
        &payload,
    )
}

pub fn set_abi(account: Name, abi: &AbiDef) -> Action {
    let payload = SetAbi {
        account,
        abi: abi.pack(),
    };
    Action::new(
        Name::EOSIO,
        Name::constant("setabi"),
        vec![PermissionLevel::active(account)],
        &payload,
    )
}
