//! Helpers for populating a development chain: accounts and contracts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    abi::AbiDef,
    api::Api,
    asset::Asset,
    chain_client::ChainClient,
    dao,
    error::{Error, Result},
    keys::{PrivateKey, PublicKey},
    name::Name,
    system,
    transaction::TxId,
};

/// Compiled contract: wasm plus ABI file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArtifacts {
    pub wasm: PathBuf,
    pub abi: PathBuf,
}

impl ContractArtifacts {
    /// `<dir>/<name>.wasm` and `<dir>/<name>.abi`
    pub fn in_dir(dir: impl AsRef<Path>, name: &str) -> Self {
        let dir = dir.as_ref();
        ContractArtifacts {
            wasm: dir.join(format!("{name}.wasm")),
            abi: dir.join(format!("{name}.abi")),
        }
    }
}

async fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|source| Error::Artifact {
        path: path.to_path_buf(),
        source,
    })
}

/// Creates `name` with `private_key` as owner and active key. The key is
/// imported into the signer so the account can act right away.
pub async fn create_account_from_string<C: ChainClient>(
    api: &Api<C>,
    name: &str,
    private_key: &str,
) -> Result<Name> {
    let account: Name = name.parse()?;
    let public_key = api.signer().import_private_key(private_key)?;
    api.push_actions(vec![system::new_account(Name::EOSIO, account, public_key)])
        .await?;
    Ok(account)
}

/// Creates `name` with a freshly generated key, kept only in the signer.
pub async fn create_account_with_random_key<C: ChainClient>(
    api: &Api<C>,
    name: &str,
) -> Result<(PublicKey, Name)> {
    let account: Name = name.parse()?;
    let public_key = api.signer().add(PrivateKey::generate())?;
    api.push_actions(vec![system::new_account(Name::EOSIO, account, public_key)])
        .await?;
    Ok((public_key, account))
}

/// Deploys code and ABI to `account` in a single transaction.
pub async fn set_contract<C: ChainClient>(
    api: &Api<C>,
    account: Name,
    artifacts: &ContractArtifacts,
) -> Result<TxId> {
    let code = read_artifact(&artifacts.wasm).await?;
    let abi_json = read_artifact(&artifacts.abi).await?;
    let abi: AbiDef = serde_json::from_slice(&abi_json)?;
    info!(%account, wasm = %artifacts.wasm.display(), "deploying contract");
    api.push_actions(vec![
        system::set_code(account, code),
        system::set_abi(account, &abi),
    ])
    .await
}

/// Deploys the token contract to `contract` and creates `max_supply` with
/// `issuer` as issuer.
pub async fn deploy_and_create_token<C: ChainClient>(
    api: &Api<C>,
    artifacts: &ContractArtifacts,
    contract: Name,
    issuer: Name,
    max_supply: Asset,
) -> Result<TxId> {
    set_contract(api, contract, artifacts).await?;
    dao::create_token(api, contract, issuer, max_supply).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chain_client::test_chain_client::TestChainClient,
        keys::{KeyBag, DEFAULT_KEY},
        primitives::Checksum256,
    };

    const ABI: &str = r#"{"version": "eosio::abi/1.1", "structs": [], "actions": []}"#;

    fn api() -> Api<TestChainClient> {
        let key: PrivateKey = DEFAULT_KEY.parse().unwrap();
        let chain = TestChainClient::new(key.public_key().unwrap());
        let signer = KeyBag::new();
        signer.add(key).unwrap();
        Api::with_signer(chain, signer)
    }

    #[tokio::test]
    async fn random_key_accounts_can_sign_for_themselves() {
        let api = api();
        let (key, account) = create_account_with_random_key(&api, "husd.hypha")
            .await
            .unwrap();
        assert!(api.signer().available_keys().unwrap().contains(&key));
        let info = api.account(account).await.unwrap();
        assert_eq!(
            info.permission(Name::ACTIVE).unwrap().required_auth.keys[0].key,
            key
        );
    }

    #[tokio::test]
    async fn invalid_account_name_is_rejected_locally() {
        let api = api();
        let err = create_account_from_string(&api, "Accounting", DEFAULT_KEY)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Name(_)));
    }

    #[tokio::test]
    async fn set_contract_deploys_code_and_abi_together() {
        let api = api();
        let account = create_account_from_string(&api, "accounting", DEFAULT_KEY)
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ContractArtifacts::in_dir(dir.path(), "accounting");
        std::fs::write(&artifacts.wasm, b"\0asm\x01\0\0\0").unwrap();
        std::fs::write(&artifacts.abi, ABI).unwrap();

        let id = set_contract(&api, account, &artifacts).await.unwrap();
        assert_eq!(
            api.code_hash(account).await.unwrap(),
            Checksum256::hash(b"\0asm\x01\0\0\0")
        );
        let executed = api.client().executed_actions().unwrap();
        let deploy: Vec<_> = executed.iter().filter(|a| a.trx_id == id).collect();
        assert_eq!(deploy.len(), 2);
        assert!(!api.client().abi(account).unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_artifact_names_the_path() {
        let api = api();
        let account = create_account_from_string(&api, "accounting", DEFAULT_KEY)
            .await
            .unwrap();
        let artifacts = ContractArtifacts::in_dir("/nonexistent/build", "accounting");
        let err = set_contract(&api, account, &artifacts).await.unwrap_err();
        match err {
            Error::Artifact { path, .. } => assert_eq!(path, artifacts.wasm),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
