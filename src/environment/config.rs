use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};

use crate::{
    api::Api,
    asset::Asset,
    chain_client::{
        nodeos_http_client::{NodeosHttpClient, LOCAL_ENDPOINT},
        ChainClient,
    },
    error::{Error, Result},
    keys::DEFAULT_KEY,
    name::Name,
    testnet::ContractArtifacts,
};

/// Directory the contract repositories are checked out under.
pub const DEV_HOME_VAR: &str = "ACCOUNTING_DEV_HOME";
/// Node endpoint override.
pub const ENDPOINT_VAR: &str = "ACCOUNTING_ENDPOINT";
pub const DEFAULT_DEV_HOME: &str = "/src";

/// Build outputs of every contract the environment deploys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub accounting: ContractArtifacts,
    pub dao: ContractArtifacts,
    pub token: ContractArtifacts,
    pub telos_decide: ContractArtifacts,
    pub treasury: ContractArtifacts,
    pub monitor: ContractArtifacts,
    pub escrow: ContractArtifacts,
}

impl ArtifactPaths {
    /// Standard checkout layout below `dev_home`.
    pub fn from_dev_home(dev_home: impl AsRef<Path>) -> Self {
        let home = dev_home.as_ref();
        ArtifactPaths {
            accounting: ContractArtifacts::in_dir(
                home.join("accounting-contracts/build/accounting"),
                "accounting",
            ),
            dao: ContractArtifacts::in_dir(
                home.join("develop/eosio-contracts/build/hyphadao"),
                "hyphadao",
            ),
            token: ContractArtifacts::in_dir(home.join("token/token"), "token"),
            telos_decide: ContractArtifacts::in_dir(
                home.join("telosnetwork/telos-decide/build/contracts/decide"),
                "decide",
            ),
            treasury: ContractArtifacts::in_dir(
                home.join("hypha/treasury-contracts/treasury"),
                "treasury",
            ),
            monitor: ContractArtifacts::in_dir(home.join("hypha/monitor/monitor"), "monitor"),
            escrow: ContractArtifacts::in_dir(
                home.join("hypha/seeds-contracts/artifacts"),
                "escrow",
            ),
        }
    }
}

/// Governance and period parameters written to the DAO.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub voting_duration_seconds: i64,
    pub hypha_deferral_factor: i64,
    pub seeds_deferral_factor: i64,
    pub num_periods: usize,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub period_duration: Duration,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            voting_duration_seconds: 2,
            hypha_deferral_factor: 25,
            seeds_deferral_factor: 100,
            num_periods: 10,
            period_duration: Duration::from_secs(6),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountNames {
    pub accounting: Name,
    pub dao: Name,
    pub bank: Name,
    pub husd_token: Name,
    pub hvoice_token: Name,
    pub hypha_token: Name,
    pub events: Name,
    pub seeds_token: Name,
    pub seeds_escrow: Name,
    pub seeds_exchange: Name,
    pub telos_decide: Name,
    pub tlos_token: Name,
}

impl Default for AccountNames {
    fn default() -> Self {
        AccountNames {
            accounting: Name::constant("accounting"),
            dao: Name::constant("dao.hypha"),
            bank: Name::constant("bank.hypha"),
            husd_token: Name::constant("husd.hypha"),
            hvoice_token: Name::constant("hvoice.hypha"),
            hypha_token: Name::constant("token.hypha"),
            events: Name::constant("publsh.hypha"),
            seeds_token: Name::constant("token.seeds"),
            seeds_escrow: Name::constant("escrow.seeds"),
            seeds_exchange: Name::constant("tlosto.seeds"),
            telos_decide: Name::constant("telos.decide"),
            tlos_token: Name::constant("eosio.token"),
        }
    }
}

/// Member to create and enrol once the DAO stack is up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub account: Name,
    pub voting_power: Asset,
}

/// Everything the provisioner needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentConfig {
    pub endpoint: String,
    /// Deploy the DAO, treasury, tokens and Telos Decide next to the
    /// accounting contract.
    pub deploy_full_dao_stack: bool,
    pub artifacts: ArtifactPaths,
    pub tuning: Tuning,
    pub accounts: AccountNames,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whale: Option<MemberSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    endpoint: Option<String>,
    dev_home: Option<PathBuf>,
    artifacts: Option<ArtifactPaths>,
    tuning: Tuning,
    accounts: AccountNames,
    deploy_full_dao_stack: bool,
    whale: Option<MemberSpec>,
    members: Vec<MemberSpec>,
}

impl EnvironmentConfig {
    /// Local node, artifacts under `dev_home`, accounting contract only.
    pub fn new(endpoint: &str, dev_home: impl AsRef<Path>) -> Self {
        EnvironmentConfig {
            endpoint: endpoint.to_string(),
            deploy_full_dao_stack: false,
            artifacts: ArtifactPaths::from_dev_home(dev_home),
            tuning: Tuning::default(),
            accounts: AccountNames::default(),
            whale: None,
            members: Vec::new(),
        }
    }

    /// Defaults, with endpoint and dev home taken from the environment.
    pub fn from_env() -> Self {
        let endpoint = env::var(ENDPOINT_VAR).unwrap_or_else(|_| LOCAL_ENDPOINT.to_string());
        let dev_home = env::var(DEV_HOME_VAR).unwrap_or_else(|_| DEFAULT_DEV_HOME.to_string());
        EnvironmentConfig::new(&endpoint, dev_home)
    }

    /// Parses a TOML config. Keys missing from the file fall back to
    /// [`EnvironmentConfig::from_env`]; `artifacts` wins over `dev_home`.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text)?;
        let defaults = EnvironmentConfig::from_env();
        let artifacts = match (file.artifacts, file.dev_home) {
            (Some(artifacts), _) => artifacts,
            (None, Some(dev_home)) => ArtifactPaths::from_dev_home(dev_home),
            (None, None) => defaults.artifacts,
        };
        Ok(EnvironmentConfig {
            endpoint: file.endpoint.unwrap_or(defaults.endpoint),
            deploy_full_dao_stack: file.deploy_full_dao_stack,
            artifacts,
            tuning: file.tuning,
            accounts: file.accounts,
            whale: file.whale,
            members: file.members,
        })
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        EnvironmentConfig::from_toml_str(&text)
    }

    /// Api over `client` with the well-known development key as signer.
    pub fn api_for<C: ChainClient>(&self, client: C) -> Result<Api<C>> {
        let api = Api::new(client);
        api.signer().import_private_key(DEFAULT_KEY)?;
        Ok(api)
    }

    /// Api bound to [`EnvironmentConfig::endpoint`].
    pub fn connect(&self) -> Result<Api<NodeosHttpClient>> {
        self.api_for(NodeosHttpClient::new(&self.endpoint)?)
    }
}
