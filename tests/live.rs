//! Against a local nodeos with the contract builds under the dev home.
//! Run with `--ignored` on a fresh chain.

use accounting::{
    accounting::{add_ledger, create_acct},
    environment::{setup_environment, EnvironmentConfig},
    ContentGroup, Name,
};

#[ignore]
#[tokio::test]
async fn provision_and_add_ledger_on_local_node() {
    let config = EnvironmentConfig::from_env();
    let api = config.connect().unwrap();

    let env = setup_environment(&api, &config).await.unwrap();
    println!("{env}");

    let info = vec![ContentGroup::new()
        .with("content_group_label", "details")
        .with("ledger_name", "Live Ledger")];
    let id = add_ledger(&api, env.accounting, env.dao, info).await.unwrap();
    assert!(!id.is_empty());
}

#[ignore]
#[tokio::test]
async fn repeated_create_on_local_node_is_not_a_duplicate() {
    let config = EnvironmentConfig::from_env();
    let api = config.connect().unwrap();
    let info = vec![ContentGroup::new().with("account_name", "Cash")];
    let contract = config.accounts.accounting;

    let first = create_acct(&api, contract, Name::constant("dao.hypha"), info.clone())
        .await
        .unwrap();
    let second = create_acct(&api, contract, Name::constant("dao.hypha"), info)
        .await
        .unwrap();
    assert_ne!(first, second);
}
