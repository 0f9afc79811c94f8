//! Actions on the contracts surrounding the accounting contract: the token
//! contract, the Hypha DAO and Telos Decide.

use std::time::Duration;

use crate::{
    action::{Action, PermissionLevel},
    api::Api,
    asset::{Asset, Symbol},
    chain_client::ChainClient,
    docgraph::ContentValue,
    error::Result,
    name::Name,
    primitives::TimePoint,
    serialization::eos_struct_codec,
    transaction::TxId,
};

/// Version string passed to Telos Decide's `init`.
pub const TELOS_DECIDE_VERSION: &str = "v2.0.0";
/// Maximum supply of the HVOICE voting treasury.
pub const VOTING_MAX_SUPPLY: &str = "1000000000.00 HVOICE";

const PHASES: [&str; 4] = ["First Quarter", "Full Moon", "Last Quarter", "New Moon"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCreate {
    pub issuer: Name,
    pub maximum_supply: Asset,
}

eos_struct_codec!(TokenCreate {
    issuer,
    maximum_supply
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIssue {
    pub to: Name,
    pub quantity: Asset,
    pub memo: String,
}

eos_struct_codec!(TokenIssue { to, quantity, memo });

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub from: Name,
    pub to: Name,
    pub quantity: Asset,
    pub memo: String,
}

eos_struct_codec!(TokenTransfer {
    from,
    to,
    quantity,
    memo
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSetting {
    pub key: String,
    pub value: ContentValue,
}

eos_struct_codec!(SetSetting { key, value });

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPeriod {
    pub start_time: TimePoint,
    pub end_time: TimePoint,
    pub phase: String,
}

eos_struct_codec!(AddPeriod {
    start_time,
    end_time,
    phase
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Init {
    pub app_version: String,
}

eos_struct_codec!(Init { app_version });

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTreasury {
    pub manager: Name,
    pub max_supply: Asset,
    pub access: Name,
}

eos_struct_codec!(NewTreasury {
    manager,
    max_supply,
    access
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegVoter {
    pub voter: Name,
    pub treasury_symbol: Symbol,
    pub referrer: Option<Name>,
}

eos_struct_codec!(RegVoter {
    voter,
    treasury_symbol,
    referrer
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mint {
    pub to: Name,
    pub quantity: Asset,
    pub memo: String,
}

eos_struct_codec!(Mint { to, quantity, memo });

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apply {
    pub applicant: Name,
    pub content: String,
}

eos_struct_codec!(Apply { applicant, content });

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enroll {
    pub enroller: Name,
    pub applicant: Name,
    pub content: String,
}

eos_struct_codec!(Enroll {
    enroller,
    applicant,
    content
});

pub fn create_token_action(contract: Name, issuer: Name, maximum_supply: Asset) -> Action {
    Action::new(
        contract,
        Name::constant("create"),
        vec![PermissionLevel::active(contract)],
        &TokenCreate {
            issuer,
            maximum_supply,
        },
    )
}

/// Issues `quantity` to the issuer itself.
pub fn issue_action(contract: Name, issuer: Name, quantity: Asset) -> Action {
    Action::new(
        contract,
        Name::constant("issue"),
        vec![PermissionLevel::active(issuer)],
        &TokenIssue {
            to: issuer,
            quantity,
            memo: "original mint".to_string(),
        },
    )
}

pub fn transfer_action(
    contract: Name,
    from: Name,
    to: Name,
    quantity: Asset,
    memo: &str,
) -> Action {
    Action::new(
        contract,
        Name::constant("transfer"),
        vec![PermissionLevel::active(from)],
        &TokenTransfer {
            from,
            to,
            quantity,
            memo: memo.to_string(),
        },
    )
}

pub fn set_setting_action(contract: Name, key: &str, value: ContentValue) -> Action {
    Action::new(
        contract,
        Name::constant("setsetting"),
        vec![PermissionLevel::active(contract)],
        &SetSetting {
            key: key.to_string(),
            value,
        },
    )
}

pub fn add_period_action(
    contract: Name,
    start_time: TimePoint,
    end_time: TimePoint,
    phase: &str,
) -> Action {
    Action::new(
        contract,
        Name::constant("addperiod"),
        vec![PermissionLevel::active(contract)],
        &AddPeriod {
            start_time,
            end_time,
            phase: phase.to_string(),
        },
    )
}

pub fn init_td_action(telos_decide: Name) -> Action {
    Action::new(
        telos_decide,
        Name::constant("init"),
        vec![PermissionLevel::active(telos_decide)],
        &Init {
            app_version: TELOS_DECIDE_VERSION.to_string(),
        },
    )
}

pub fn new_treasury_action(telos_decide: Name, manager: Name) -> Result<Action> {
    Ok(Action::new(
        telos_decide,
        Name::constant("newtreasury"),
        vec![PermissionLevel::active(manager)],
        &NewTreasury {
            manager,
            max_supply: VOTING_MAX_SUPPLY.parse()?,
            access: Name::constant("public"),
        },
    ))
}

pub fn reg_voter_action(telos_decide: Name, voter: Name) -> Result<Action> {
    let voting_supply: Asset = VOTING_MAX_SUPPLY.parse()?;
    Ok(Action::new(
        telos_decide,
        Name::constant("regvoter"),
        vec![PermissionLevel::active(voter)],
        &RegVoter {
            voter,
            treasury_symbol: voting_supply.symbol(),
            referrer: None,
        },
    ))
}

/// Mints voting power, authorized by the treasury manager.
pub fn mint_action(telos_decide: Name, manager: Name, to: Name, quantity: Asset) -> Action {
    Action::new(
        telos_decide,
        Name::constant("mint"),
        vec![PermissionLevel::active(manager)],
        &Mint {
            to,
            quantity,
            memo: "original mint".to_string(),
        },
    )
}

pub fn apply_action(dao: Name, applicant: Name, content: &str) -> Action {
    Action::new(
        dao,
        Name::constant("apply"),
        vec![PermissionLevel::active(applicant)],
        &Apply {
            applicant,
            content: content.to_string(),
        },
    )
}

pub fn enroll_action(dao: Name, enroller: Name, applicant: Name) -> Action {
    Action::new(
        dao,
        Name::constant("enroll"),
        vec![PermissionLevel::active(enroller)],
        &Enroll {
            enroller,
            applicant,
            content: "enroll in dao".to_string(),
        },
    )
}

pub async fn create_token<C: ChainClient>(
    api: &Api<C>,
    contract: Name,
    issuer: Name,
    maximum_supply: Asset,
) -> Result<TxId> {
    api.push_actions(vec![create_token_action(contract, issuer, maximum_supply)])
        .await
}

pub async fn issue<C: ChainClient>(
    api: &Api<C>,
    contract: Name,
    issuer: Name,
    quantity: Asset,
) -> Result<TxId> {
    api.push_actions(vec![issue_action(contract, issuer, quantity)])
        .await
}

pub async fn transfer<C: ChainClient>(
    api: &Api<C>,
    contract: Name,
    from: Name,
    to: Name,
    quantity: Asset,
    memo: &str,
) -> Result<TxId> {
    api.push_actions(vec![transfer_action(contract, from, to, quantity, memo)])
        .await
}

pub async fn set_int_setting<C: ChainClient>(
    api: &Api<C>,
    contract: Name,
    key: &str,
    value: i64,
) -> Result<TxId> {
    api.push_actions(vec![set_setting_action(contract, key, value.into())])
        .await
}

pub async fn set_name_setting<C: ChainClient>(
    api: &Api<C>,
    contract: Name,
    key: &str,
    value: Name,
) -> Result<TxId> {
    api.push_actions(vec![set_setting_action(contract, key, value.into())])
        .await
}

/// Adds `count` consecutive periods of `duration`, the first starting at the
/// current head block time. One transaction per period.
pub async fn add_periods<C: ChainClient>(
    api: &Api<C>,
    contract: Name,
    count: usize,
    duration: Duration,
) -> Result<Vec<TxId>> {
    let mut start = api.client().get_info().await?.head_block_time;
    let mut ids = Vec::with_capacity(count);
    for index in 0..count {
        let end = start + duration;
        let action = add_period_action(contract, start, end, PHASES[index % PHASES.len()]);
        ids.push(api.push_actions(vec![action]).await?);
        start = end;
    }
    Ok(ids)
}

pub async fn init_td<C: ChainClient>(api: &Api<C>, telos_decide: Name) -> Result<TxId> {
    api.push_actions(vec![init_td_action(telos_decide)]).await
}

pub async fn new_treasury<C: ChainClient>(
    api: &Api<C>,
    telos_decide: Name,
    manager: Name,
) -> Result<TxId> {
    api.push_actions(vec![new_treasury_action(telos_decide, manager)?])
        .await
}

pub async fn reg_voter<C: ChainClient>(
    api: &Api<C>,
    telos_decide: Name,
    voter: Name,
) -> Result<TxId> {
    api.push_actions(vec![reg_voter_action(telos_decide, voter)?])
        .await
}

pub async fn mint<C: ChainClient>(
    api: &Api<C>,
    telos_decide: Name,
    manager: Name,
    to: Name,
    quantity: Asset,
) -> Result<TxId> {
    api.push_actions(vec![mint_action(telos_decide, manager, to, quantity)])
        .await
}

pub async fn apply<C: ChainClient>(
    api: &Api<C>,
    dao: Name,
    applicant: Name,
    content: &str,
) -> Result<TxId> {
    api.push_actions(vec![apply_action(dao, applicant, content)])
        .await
}

pub async fn enroll<C: ChainClient>(
    api: &Api<C>,
    dao: Name,
    enroller: Name,
    applicant: Name,
) -> Result<TxId> {
    api.push_actions(vec![enroll_action(dao, enroller, applicant)])
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::EosDeserialize;

    #[test]
    fn issue_goes_to_issuer_with_its_authority() {
        let seeds = Name::constant("token.seeds");
        let dao = Name::constant("dao.hypha");
        let supply: Asset = "1000000000.0000 SEEDS".parse().unwrap();
        let action = issue_action(seeds, dao, supply);
        assert_eq!(action.authorization, vec![PermissionLevel::active(dao)]);
        let payload = TokenIssue::unpack(&action.data).unwrap();
        assert_eq!(payload.to, dao);
        assert_eq!(payload.quantity, supply);
    }

    #[test]
    fn reg_voter_uses_voting_symbol_without_referrer() {
        let td = Name::constant("telos.decide");
        let voter = Name::constant("dao.hypha");
        let action = reg_voter_action(td, voter).unwrap();
        let payload = RegVoter::unpack(&action.data).unwrap();
        assert_eq!(payload.treasury_symbol.to_string(), "2,HVOICE");
        assert_eq!(payload.referrer, None);
        assert_eq!(*action.data.last().unwrap(), 0);
    }

    #[test]
    fn new_treasury_is_public_and_signed_by_manager() {
        let td = Name::constant("telos.decide");
        let dao = Name::constant("dao.hypha");
        let action = new_treasury_action(td, dao).unwrap();
        assert_eq!(action.authorization, vec![PermissionLevel::active(dao)]);
        let payload = NewTreasury::unpack(&action.data).unwrap();
        assert_eq!(payload.access, Name::constant("public"));
        assert_eq!(payload.max_supply.to_string(), VOTING_MAX_SUPPLY);
    }

    #[test]
    fn settings_carry_typed_values() {
        let dao = Name::constant("dao.hypha");
        let action = set_setting_action(dao, "voting_duration_sec", 2i64.into());
        let payload = SetSetting::unpack(&action.data).unwrap();
        assert_eq!(payload.value, ContentValue::Int64(2));
        assert_eq!(action.authorization, vec![PermissionLevel::active(dao)]);
    }

    #[test]
    fn enroll_is_authorized_by_enroller() {
        let dao = Name::constant("dao.hypha");
        let member = Name::constant("member1");
        let action = enroll_action(dao, dao, member);
        assert_eq!(action.authorization, vec![PermissionLevel::active(dao)]);
        let payload = Enroll::unpack(&action.data).unwrap();
        assert_eq!(payload.applicant, member);
    }
}
