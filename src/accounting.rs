//! Actions of the accounting contract.
//!
//! Every action is authorized by the contract's own `active` permission,
//! whatever account is named as creator or issuer. The contract account acts
//! as an administrative relay and records the named account inside the
//! payload.

use crate::{
    action::{Action, PermissionLevel},
    api::Api,
    chain_client::ChainClient,
    docgraph::ContentGroup,
    error::Result,
    name::Name,
    serialization::eos_struct_codec,
    transaction::TxId,
};

const ADD_LEDGER: Name = Name::constant("addledger");
const CREATE: Name = Name::constant("create");
const TRANSACT: Name = Name::constant("transact");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLedger {
    pub creator: Name,
    pub ledger_info: Vec<ContentGroup>,
}

eos_struct_codec!(CreateLedger {
    creator,
    ledger_info
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccount {
    pub creator: Name,
    pub account_info: Vec<ContentGroup>,
}

eos_struct_codec!(CreateAccount {
    creator,
    account_info
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transact {
    pub issuer: Name,
    pub trx_info: Vec<ContentGroup>,
}

eos_struct_codec!(Transact { issuer, trx_info });

pub fn add_ledger_action(contract: Name, creator: Name, ledger_info: Vec<ContentGroup>) -> Action {
    Action::new(
        contract,
        ADD_LEDGER,
        vec![PermissionLevel::active(contract)],
        &CreateLedger {
            creator,
            ledger_info,
        },
    )
}

pub fn create_acct_action(
    contract: Name,
    creator: Name,
    account_info: Vec<ContentGroup>,
) -> Action {
    Action::new(
        contract,
        CREATE,
        vec![PermissionLevel::active(contract)],
        &CreateAccount {
            creator,
            account_info,
        },
    )
}

pub fn transact_action(contract: Name, issuer: Name, trx_info: Vec<ContentGroup>) -> Action {
    Action::new(
        contract,
        TRANSACT,
        vec![PermissionLevel::active(contract)],
        &Transact { issuer, trx_info },
    )
}

/// Submits `addledger`, registering a ledger described by `ledger_info`.
pub async fn add_ledger<C: ChainClient>(
    api: &Api<C>,
    contract: Name,
    creator: Name,
    ledger_info: Vec<ContentGroup>,
) -> Result<TxId> {
    api.push_actions(vec![add_ledger_action(contract, creator, ledger_info)])
        .await
}

/// Submits `create`, adding an account to a ledger.
pub async fn create_acct<C: ChainClient>(
    api: &Api<C>,
    contract: Name,
    creator: Name,
    account_info: Vec<ContentGroup>,
) -> Result<TxId> {
    api.push_actions(vec![create_acct_action(contract, creator, account_info)])
        .await
}

/// Submits `transact`, recording a transaction against ledger accounts.
pub async fn transact<C: ChainClient>(
    api: &Api<C>,
    contract: Name,
    issuer: Name,
    trx_info: Vec<ContentGroup>,
) -> Result<TxId> {
    api.push_actions(vec![transact_action(contract, issuer, trx_info)])
        .await
}
