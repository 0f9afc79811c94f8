#![allow(dead_code)]

use std::path::Path;

use accounting::{
    chain_client::{
        test_chain_client::{
            assert_failure, require_auth, ContractBehavior, ContractContext, TestChainClient,
        },
        ChainRejection,
    },
    dao::Enroll,
    environment::{ArtifactPaths, EnvironmentConfig},
    keys::{PrivateKey, DEFAULT_KEY},
    primitives::Checksum256,
    serialization::EosDeserialize,
    testnet::ContractArtifacts,
    Action, Api, ContentGroup, Document, Name,
};

pub const FAKE_WASM: &[u8] = b"\0asm\x01\0\0\0";
pub const FAKE_ABI: &str = r#"{
    "version": "eosio::abi/1.1",
    "structs": [{"name": "noop", "base": "", "fields": []}],
    "actions": [{"name": "noop", "type": "noop", "ricardian_contract": ""}]
}"#;

/// Chain whose `eosio` account is controlled by the development key, with
/// an Api signing as that key.
pub fn dev_chain() -> Api<TestChainClient> {
    let key: PrivateKey = DEFAULT_KEY.parse().unwrap();
    let chain = TestChainClient::new(key.public_key().unwrap());
    EnvironmentConfig::new("http://localhost:8888", "/src")
        .api_for(chain)
        .unwrap()
}

/// Writes one fake contract build to `dir` and points every artifact at it.
pub fn fake_artifacts(dir: &Path) -> ArtifactPaths {
    let contract = ContractArtifacts::in_dir(dir, "fake");
    std::fs::write(&contract.wasm, FAKE_WASM).unwrap();
    std::fs::write(&contract.abi, FAKE_ABI).unwrap();
    ArtifactPaths {
        accounting: contract.clone(),
        dao: contract.clone(),
        token: contract.clone(),
        telos_decide: contract.clone(),
        treasury: contract.clone(),
        monitor: contract.clone(),
        escrow: contract,
    }
}

/// DAO stand-in: `enroll` appends a member document naming the applicant,
/// or `impostor` when set. Other actions only check authorization.
pub struct FakeDao {
    pub impostor: Option<Name>,
}

impl ContractBehavior for FakeDao {
    fn apply(
        &self,
        action: &Action,
        context: &mut ContractContext<'_>,
    ) -> Result<(), ChainRejection> {
        if action.name != Name::constant("enroll") {
            return Ok(());
        }
        let enroll = Enroll::unpack(&action.data)
            .map_err(|e| assert_failure(&e.to_string()))?;
        require_auth(action, enroll.enroller)?;

        let dao = context.receiver();
        let member = self.impostor.unwrap_or(enroll.applicant);
        let scope = dao.to_string();
        let id = context.rows(&scope, Name::constant("documents")).len() as u64;
        let document = Document {
            id,
            hash: Checksum256::hash(member.to_string().as_bytes()),
            creator: dao,
            content_groups: vec![ContentGroup::new()
                .with("content_group_label", "details")
                .with("member", member)],
            certificates: Vec::new(),
            created_date: context.block_time(),
            contract: dao,
        };
        let row = serde_json::to_value(&document).map_err(|e| assert_failure(&e.to_string()))?;
        context
            .rows_mut(&scope, Name::constant("documents"))
            .push(row);
        Ok(())
    }
}
