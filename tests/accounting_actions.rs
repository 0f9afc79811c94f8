use accounting::{
    accounting::{
        add_ledger, add_ledger_action, create_acct, create_acct_action, transact,
        transact_action, CreateAccount,
    },
    chain_client::test_chain_client::TestChainClient,
    environment::{setup_environment, EnvironmentConfig},
    serialization::EosDeserialize,
    Api, ContentGroup, Name, PermissionLevel,
};
use proptest::prelude::*;

mod common;
use common::{dev_chain, fake_artifacts};

fn ledger_info() -> Vec<ContentGroup> {
    vec![ContentGroup::new()
        .with("content_group_label", "details")
        .with("ledger_name", "Hypha Ledger")]
}

async fn provisioned() -> (Api<TestChainClient>, Name) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EnvironmentConfig::new("http://localhost:8888", dir.path());
    config.artifacts = fake_artifacts(dir.path());
    let api = dev_chain();
    let env = setup_environment(&api, &config).await.unwrap();
    (api, env.accounting)
}

#[tokio::test]
async fn add_ledger_after_provisioning_returns_an_id() {
    let (api, contract) = provisioned().await;
    let creator = Name::constant("dao.hypha");

    let id = add_ledger(&api, contract, creator, ledger_info()).await.unwrap();

    assert!(!id.is_empty());
    let executed = api.client().executed_actions().unwrap();
    let last = executed.last().unwrap();
    assert_eq!(last.trx_id, id);
    assert_eq!(last.action.name, Name::constant("addledger"));
}

#[tokio::test]
async fn identical_creates_get_distinct_ids() {
    let (api, contract) = provisioned().await;
    let creator = Name::constant("dao.hypha");
    let info = vec![ContentGroup::new().with("account_name", "Cash")];

    let first = create_acct(&api, contract, creator, info.clone()).await.unwrap();
    let second = create_acct(&api, contract, creator, info.clone()).await.unwrap();

    assert_ne!(first, second);
    let executed = api.client().executed_actions().unwrap();
    let creates: Vec<_> = executed
        .iter()
        .filter(|a| a.action.name == Name::constant("create"))
        .collect();
    assert_eq!(creates.len(), 2);
    let payload = CreateAccount::unpack(&creates[1].action.data).unwrap();
    assert_eq!(payload.creator, creator);
    assert_eq!(payload.account_info, info);
}

#[tokio::test]
async fn transact_against_missing_contract_account_is_rejected() {
    let api = dev_chain();
    let err = transact(
        &api,
        Name::constant("accounting"),
        Name::constant("dao.hypha"),
        ledger_info(),
    )
    .await
    .unwrap_err();
    assert!(err.rejection().is_some());
}

fn name_strategy() -> impl Strategy<Value = Name> {
    "[a-z1-5]{1,12}".prop_map(|s| s.parse().unwrap())
}

proptest! {
    #[test]
    fn accounting_actions_are_authorized_by_the_contract(
        contract in name_strategy(),
        creator in name_strategy(),
    ) {
        let expected = vec![PermissionLevel::new(contract, Name::ACTIVE)];
        for action in [
            add_ledger_action(contract, creator, ledger_info()),
            create_acct_action(contract, creator, ledger_info()),
            transact_action(contract, creator, ledger_info()),
        ] {
            prop_assert_eq!(action.account, contract);
            prop_assert_eq!(&action.authorization, &expected);
        }
    }
}
