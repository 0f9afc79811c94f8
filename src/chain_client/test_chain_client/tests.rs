use super::*;
use crate::{
    api::Api,
    keys::{KeyBag, PrivateKey, DEFAULT_KEY},
    system,
    transaction::DEFAULT_EXPIRATION,
};

fn dev_key() -> PrivateKey {
    DEFAULT_KEY.parse().unwrap()
}

fn api() -> Api<TestChainClient> {
    let key = dev_key();
    let chain = TestChainClient::new(key.public_key().unwrap());
    let signer = KeyBag::new();
    signer.add(key).unwrap();
    Api::with_signer(chain, signer)
}

async fn create(api: &Api<TestChainClient>, name: &str) -> Name {
    let account: Name = name.parse().unwrap();
    let key = dev_key().public_key().unwrap();
    api.push_actions(vec![system::new_account(Name::EOSIO, account, key)])
        .await
        .unwrap();
    account
}

struct Counter;

impl ContractBehavior for Counter {
    fn apply(
        &self,
        action: &Action,
        context: &mut ContractContext<'_>,
    ) -> Result<(), ChainRejection> {
        require_auth(action, context.receiver())?;
        if action.name == Name::constant("fail") {
            context
                .rows_mut("counter", Name::constant("counts"))
                .push(serde_json::json!({"n": -1}));
            return Err(assert_failure("told to fail"));
        }
        let next = context.rows("counter", Name::constant("counts")).len();
        context
            .rows_mut("counter", Name::constant("counts"))
            .push(serde_json::json!({ "n": next }));
        Ok(())
    }
}

fn call(account: Name, action: &str) -> Action {
    Action::new(
        account,
        action.parse().unwrap(),
        vec![PermissionLevel::active(account)],
        &account,
    )
}

#[tokio::test]
async fn genesis_has_eosio_with_dev_key() {
    let api = api();
    let info = api.client().get_info().await.unwrap();
    assert_eq!(info.head_block_num, 1);
    let eosio = api.account(Name::EOSIO).await.unwrap();
    let active = eosio.permission(Name::ACTIVE).unwrap();
    assert_eq!(active.parent, Name::OWNER);
    assert_eq!(
        active.required_auth.keys[0].key,
        dev_key().public_key().unwrap()
    );
}

#[tokio::test]
async fn each_transaction_produces_a_block() {
    let api = api();
    let before = api.client().get_info().await.unwrap();
    create(&api, "accounting").await;
    let after = api.client().get_info().await.unwrap();
    assert_eq!(after.head_block_num, before.head_block_num + 1);
    assert_eq!(
        after.head_block_time.micros() - before.head_block_time.micros(),
        500_000
    );
    assert_ne!(after.head_block_id, before.head_block_id);
}

#[tokio::test]
async fn unknown_account_query_is_recognizable() {
    let api = api();
    let err = api.account(Name::constant("bank.hypha")).await.unwrap_err();
    let rejection = err.rejection().unwrap();
    assert_eq!(rejection.name, "account_query_exception");
    assert!(rejection.is_unknown_account());
}

#[tokio::test]
async fn duplicate_account_is_rejected() {
    let api = api();
    create(&api, "dao.hypha").await;
    let err = api
        .push_actions(vec![system::new_account(
            Name::EOSIO,
            Name::constant("dao.hypha"),
            dev_key().public_key().unwrap(),
        )])
        .await
        .unwrap_err();
    assert_eq!(
        err.rejection().unwrap().name,
        "account_name_exists_exception"
    );
}

#[tokio::test]
async fn replayed_transaction_is_rejected() {
    let api = api();
    let chain = api.client();
    let info = chain.get_info().await.unwrap();
    let key = dev_key();
    let trx = Transaction::new(
        vec![system::new_account(
            Name::EOSIO,
            Name::constant("accounting"),
            key.public_key().unwrap(),
        )],
        &info.head_block_id,
        info.head_block_time,
        DEFAULT_EXPIRATION,
    );
    let signature = key.sign_digest(&trx.signing_digest(&info.chain_id)).unwrap();
    let packed = PackedTransaction::new(&trx, vec![signature]);
    chain.push_transaction(&packed).await.unwrap();
    let err = chain.push_transaction(&packed).await.unwrap_err();
    assert_eq!(err.rejection().unwrap().name, "tx_duplicate");
}

#[tokio::test]
async fn expired_and_foreign_transactions_are_rejected() {
    let api = api();
    let chain = api.client();
    let info = chain.get_info().await.unwrap();
    let key = dev_key();
    let sign = |trx: &Transaction| {
        let signature = key.sign_digest(&trx.signing_digest(&info.chain_id)).unwrap();
        PackedTransaction::new(trx, vec![signature])
    };
    let action = system::new_account(
        Name::EOSIO,
        Name::constant("accounting"),
        key.public_key().unwrap(),
    );

    let trx = Transaction::new(
        vec![action.clone()],
        &info.head_block_id,
        info.head_block_time,
        Duration::from_secs(5),
    );
    chain.advance_time(Duration::from_secs(10)).unwrap();
    let err = chain.push_transaction(&sign(&trx)).await.unwrap_err();
    assert_eq!(err.rejection().unwrap().name, "expired_tx_exception");

    let head = chain.get_info().await.unwrap();
    let mut trx = Transaction::new(
        vec![action],
        &head.head_block_id,
        head.head_block_time,
        DEFAULT_EXPIRATION,
    );
    trx.ref_block_prefix ^= 1;
    let err = chain.push_transaction(&sign(&trx)).await.unwrap_err();
    assert_eq!(err.rejection().unwrap().name, "invalid_ref_block_exception");
}

#[tokio::test]
async fn signature_from_wrong_key_is_rejected() {
    let api = api();
    let chain = api.client();
    let info = chain.get_info().await.unwrap();
    let trx = Transaction::new(
        vec![system::new_account(
            Name::EOSIO,
            Name::constant("accounting"),
            dev_key().public_key().unwrap(),
        )],
        &info.head_block_id,
        info.head_block_time,
        DEFAULT_EXPIRATION,
    );
    let stranger = PrivateKey::generate();
    let signature = stranger
        .sign_digest(&trx.signing_digest(&info.chain_id))
        .unwrap();
    let err = chain
        .push_transaction(&PackedTransaction::new(&trx, vec![signature]))
        .await
        .unwrap_err();
    assert_eq!(err.rejection().unwrap().name, "unsatisfied_authorization");
}

#[tokio::test]
async fn unknown_actor_names_the_missing_account() {
    let api = api();
    let err = api
        .push_actions(vec![call(Name::constant("ghost"), "ping")])
        .await
        .unwrap_err();
    let rejection = err.rejection().unwrap();
    assert_eq!(rejection.name, "transaction_exception");
    assert!(rejection.is_unknown_account());
}

#[tokio::test]
async fn update_auth_requires_referenced_accounts() {
    let api = api();
    let bank = create(&api, "bank.hypha").await;
    let auth = Authority::single_key(dev_key().public_key().unwrap())
        .with_account(PermissionLevel::new(Name::constant("dao.hypha"), Name::EOSIO_CODE), 1);
    let err = api
        .push_actions(vec![system::update_auth(
            bank,
            Name::ACTIVE,
            Name::OWNER,
            auth.clone(),
            Name::OWNER,
        )])
        .await
        .unwrap_err();
    assert!(err.rejection().unwrap().is_unknown_account());

    create(&api, "dao.hypha").await;
    api.push_actions(vec![system::update_auth(
        bank,
        Name::ACTIVE,
        Name::OWNER,
        auth.clone(),
        Name::OWNER,
    )])
    .await
    .unwrap();
    let account = api.account(bank).await.unwrap();
    assert_eq!(account.permission(Name::ACTIVE).unwrap().required_auth, auth);
}

#[tokio::test]
async fn set_code_changes_code_hash() {
    let api = api();
    let account = create(&api, "accounting").await;
    assert!(api.code_hash(account).await.unwrap().is_zero());
    let wasm = b"\0asm\x01\0\0\0".to_vec();
    api.push_actions(vec![system::set_code(account, wasm.clone())])
        .await
        .unwrap();
    assert_eq!(
        api.code_hash(account).await.unwrap(),
        Checksum256::hash(&wasm)
    );
    assert_eq!(api.client().code(account).unwrap(), wasm);
}

#[tokio::test]
async fn behavior_writes_are_atomic_per_transaction() {
    let api = api();
    let counter = create(&api, "counter").await;
    api.client().register_contract(counter, Counter).unwrap();

    api.push_actions(vec![call(counter, "bump"), call(counter, "bump")])
        .await
        .unwrap();
    let err = api
        .push_actions(vec![call(counter, "bump"), call(counter, "fail")])
        .await
        .unwrap_err();
    assert_eq!(
        err.rejection().unwrap().name,
        "eosio_assert_message_exception"
    );

    let request =
        TableRowsRequest::new(counter, "counter", Name::constant("counts")).reverse();
    let rows = api.table_rows(&request).await.unwrap().rows;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["n"], 1);
    // newaccount plus the two bumps of the successful transaction
    assert_eq!(api.client().executed_actions().unwrap().len(), 3);
}

#[tokio::test]
async fn table_rows_respect_limit() {
    let api = api();
    let counter = create(&api, "counter").await;
    api.client().register_contract(counter, Counter).unwrap();
    for _ in 0..3 {
        api.push_actions(vec![call(counter, "bump")]).await.unwrap();
    }
    let request = TableRowsRequest::new(counter, "counter", Name::constant("counts"))
        .reverse()
        .limit(1);
    let rows = api.table_rows(&request).await.unwrap();
    assert_eq!(rows.rows, vec![serde_json::json!({"n": 2})]);
    assert!(rows.more);
}
