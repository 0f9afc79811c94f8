use std::fmt;

use tracing::info;

use crate::{
    action::PermissionLevel,
    api::Api,
    asset::Asset,
    chain_client::ChainClient,
    dao,
    environment::{member::setup_member, Environment, EnvironmentConfig, ProvisionError},
    error::{Error, Result},
    keys::DEFAULT_KEY,
    name::Name,
    system::{self, Authority},
    testnet::{
        create_account_from_string, create_account_with_random_key, deploy_and_create_token,
        set_contract,
    },
};

const HUSD_MAX_SUPPLY: &str = "1000000000.00 HUSD";
const HYPHA_MAX_SUPPLY: &str = "1000000000.00 HYPHA";
const HVOICE_MAX_SUPPLY: &str = "1000000000.00 HVOICE";
const SEEDS_MAX_SUPPLY: &str = "1000000000.0000 SEEDS";
const TLOS_MAX_SUPPLY: &str = "1000000000.0000 TLOS";
const DAO_VOTING_POWER: &str = "1.00 HVOICE";

/// One unit of provisioning work. Steps depend on the ones before them and
/// are meant to run in [`ProvisionStep::plan`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisionStep {
    CreateAccounting,
    CreateDao,
    CreateBank,
    UpdateBankPermissions,
    CreateContractAccounts,
    DeployAccounting,
    DeployDao,
    DeployTreasury,
    DeployEscrow,
    DeployEvents,
    CreateTokens,
    IssueSeeds,
    ConfigureDao,
    AddPeriods,
    CreateTlosToken,
    IssueTlos,
    DeployTelosDecide,
    InitTelosDecide,
    FundTelosDecide,
    NewVotingTreasury,
    RegisterDaoVoter,
    MintDaoVotingTokens,
    SetupWhale,
    SetupMembers,
}

impl ProvisionStep {
    /// Ordered steps for `config`.
    pub fn plan(config: &EnvironmentConfig) -> Vec<ProvisionStep> {
        use ProvisionStep::*;

        let mut steps = vec![
            CreateAccounting,
            CreateDao,
            CreateBank,
            UpdateBankPermissions,
            CreateContractAccounts,
            DeployAccounting,
        ];
        if config.deploy_full_dao_stack {
            steps.extend([
                DeployDao,
                DeployTreasury,
                DeployEscrow,
                DeployEvents,
                CreateTokens,
                IssueSeeds,
                ConfigureDao,
                AddPeriods,
                CreateTlosToken,
                IssueTlos,
                DeployTelosDecide,
                InitTelosDecide,
                FundTelosDecide,
                NewVotingTreasury,
                RegisterDaoVoter,
                MintDaoVotingTokens,
            ]);
            if config.whale.is_some() {
                steps.push(SetupWhale);
            }
            if !config.members.is_empty() {
                steps.push(SetupMembers);
            }
        }
        steps
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProvisionStep::CreateAccounting => "create accounting account",
            ProvisionStep::CreateDao => "create DAO account",
            ProvisionStep::CreateBank => "create bank account",
            ProvisionStep::UpdateBankPermissions => "update bank permissions",
            ProvisionStep::CreateContractAccounts => "create contract accounts",
            ProvisionStep::DeployAccounting => "deploy accounting contract",
            ProvisionStep::DeployDao => "deploy DAO contract",
            ProvisionStep::DeployTreasury => "deploy treasury contract",
            ProvisionStep::DeployEscrow => "deploy escrow contract",
            ProvisionStep::DeployEvents => "deploy events contract",
            ProvisionStep::CreateTokens => "create tokens",
            ProvisionStep::IssueSeeds => "issue SEEDS",
            ProvisionStep::ConfigureDao => "configure DAO",
            ProvisionStep::AddPeriods => "add periods",
            ProvisionStep::CreateTlosToken => "create TLOS token",
            ProvisionStep::IssueTlos => "issue TLOS",
            ProvisionStep::DeployTelosDecide => "deploy Telos Decide",
            ProvisionStep::InitTelosDecide => "initialize Telos Decide",
            ProvisionStep::FundTelosDecide => "fund Telos Decide",
            ProvisionStep::NewVotingTreasury => "create voting treasury",
            ProvisionStep::RegisterDaoVoter => "register DAO as voter",
            ProvisionStep::MintDaoVotingTokens => "mint DAO voting tokens",
            ProvisionStep::SetupWhale => "set up whale",
            ProvisionStep::SetupMembers => "set up members",
        };
        f.write_str(text)
    }
}

/// Runs provisioning steps against one [`Api`], accumulating the
/// [`Environment`] snapshot.
pub struct Provisioner<'a, C> {
    api: &'a Api<C>,
    config: &'a EnvironmentConfig,
    env: Environment,
}

impl<'a, C: ChainClient> Provisioner<'a, C> {
    pub fn new(api: &'a Api<C>, config: &'a EnvironmentConfig) -> Self {
        Provisioner {
            api,
            config,
            env: Environment::planned(config),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Runs `steps` in order, stopping at the first failure.
    pub async fn run_steps(
        mut self,
        steps: &[ProvisionStep],
    ) -> Result<Environment, ProvisionError> {
        for (index, step) in steps.iter().enumerate() {
            info!(step = %step, "[{}/{}] provisioning", index + 1, steps.len());
            self.run_step(*step)
                .await
                .map_err(|source| ProvisionError {
                    step: *step,
                    source,
                })?;
        }
        Ok(self.env)
    }

    async fn run_step(&mut self, step: ProvisionStep) -> Result<()> {
        let api = self.api;
        let artifacts = &self.config.artifacts;
        let env = &self.env;
        match step {
            ProvisionStep::CreateAccounting => {
                create_account_from_string(api, &env.accounting.to_string(), DEFAULT_KEY).await?;
            }
            ProvisionStep::CreateDao => {
                create_account_from_string(api, &env.dao.to_string(), DEFAULT_KEY).await?;
            }
            ProvisionStep::CreateBank => {
                create_account_with_random_key(api, &env.bank.to_string()).await?;
            }
            ProvisionStep::UpdateBankPermissions => self.update_bank_permissions().await?,
            ProvisionStep::CreateContractAccounts => {
                for account in [
                    env.husd_token,
                    env.hvoice_token,
                    env.hypha_token,
                    env.events,
                    env.seeds_token,
                    env.seeds_escrow,
                    env.seeds_exchange,
                    env.telos_decide,
                ] {
                    create_account_with_random_key(api, &account.to_string()).await?;
                }
            }
            ProvisionStep::DeployAccounting => {
                set_contract(api, env.accounting, &artifacts.accounting).await?;
            }
            ProvisionStep::DeployDao => {
                set_contract(api, env.dao, &artifacts.dao).await?;
            }
            ProvisionStep::DeployTreasury => {
                set_contract(api, env.bank, &artifacts.treasury).await?;
            }
            ProvisionStep::DeployEscrow => {
                set_contract(api, env.seeds_escrow, &artifacts.escrow).await?;
            }
            ProvisionStep::DeployEvents => {
                set_contract(api, env.events, &artifacts.monitor).await?;
            }
            ProvisionStep::CreateTokens => {
                for (contract, issuer, supply) in [
                    (env.husd_token, env.bank, HUSD_MAX_SUPPLY),
                    (env.hypha_token, env.dao, HYPHA_MAX_SUPPLY),
                    (env.hvoice_token, env.dao, HVOICE_MAX_SUPPLY),
                    (env.seeds_token, env.dao, SEEDS_MAX_SUPPLY),
                ] {
                    let max_supply = supply.parse()?;
                    deploy_and_create_token(api, &artifacts.token, contract, issuer, max_supply)
                        .await?;
                }
            }
            ProvisionStep::IssueSeeds => {
                dao::issue(api, env.seeds_token, env.dao, SEEDS_MAX_SUPPLY.parse()?).await?;
            }
            ProvisionStep::ConfigureDao => self.configure_dao().await?,
            ProvisionStep::AddPeriods => {
                info!(
                    periods = env.num_periods,
                    duration_secs = env.period_duration.as_secs(),
                    "adding periods"
                );
                dao::add_periods(api, env.dao, env.num_periods, env.period_duration).await?;
            }
            ProvisionStep::CreateTlosToken => {
                create_account_with_random_key(api, &env.tlos_token.to_string()).await?;
                deploy_and_create_token(
                    api,
                    &artifacts.token,
                    env.tlos_token,
                    env.dao,
                    TLOS_MAX_SUPPLY.parse()?,
                )
                .await?;
            }
            ProvisionStep::IssueTlos => {
                dao::issue(api, env.tlos_token, env.dao, TLOS_MAX_SUPPLY.parse()?).await?;
            }
            ProvisionStep::DeployTelosDecide => {
                set_contract(api, env.telos_decide, &artifacts.telos_decide).await?;
            }
            ProvisionStep::InitTelosDecide => {
                dao::init_td(api, env.telos_decide).await?;
            }
            ProvisionStep::FundTelosDecide => {
                dao::transfer(
                    api,
                    env.tlos_token,
                    env.dao,
                    env.telos_decide,
                    TLOS_MAX_SUPPLY.parse()?,
                    "deposit",
                )
                .await?;
            }
            ProvisionStep::NewVotingTreasury => {
                dao::new_treasury(api, env.telos_decide, env.dao).await?;
            }
            ProvisionStep::RegisterDaoVoter => {
                dao::reg_voter(api, env.telos_decide, env.dao).await?;
            }
            ProvisionStep::MintDaoVotingTokens => {
                let tokens: Asset = DAO_VOTING_POWER.parse()?;
                dao::mint(api, env.telos_decide, env.dao, env.dao, tokens).await?;
            }
            ProvisionStep::SetupWhale => {
                if let Some(whale) = &self.config.whale {
                    let member = setup_member(
                        api,
                        env.dao,
                        env.telos_decide,
                        &whale.account.to_string(),
                        whale.voting_power,
                    )
                    .await?;
                    self.env.whale = Some(member);
                }
            }
            ProvisionStep::SetupMembers => {
                for planned in &self.config.members {
                    let member = setup_member(
                        api,
                        self.env.dao,
                        self.env.telos_decide,
                        &planned.account.to_string(),
                        planned.voting_power,
                    )
                    .await?;
                    self.env.members.push(member);
                }
            }
        }
        Ok(())
    }

    /// `bank@active` becomes: the bank's own key, plus the code permissions
    /// of the bank and the DAO so both contracts can move its funds.
    async fn update_bank_permissions(&self) -> Result<()> {
        let bank = self.env.bank;
        let account = self.api.account(bank).await?;
        let key = account
            .permission(Name::ACTIVE)
            .and_then(|permission| permission.required_auth.keys.first())
            .map(|key_weight| key_weight.key)
            .ok_or(Error::NoActiveKey(bank))?;
        let auth = Authority::single_key(key)
            .with_account(PermissionLevel::new(bank, Name::EOSIO_CODE), 1)
            .with_account(PermissionLevel::new(self.env.dao, Name::EOSIO_CODE), 1);
        self.api
            .push_actions(vec![system::update_auth(
                bank,
                Name::ACTIVE,
                Name::OWNER,
                auth,
                Name::OWNER,
            )])
            .await?;
        Ok(())
    }

    async fn configure_dao(&self) -> Result<()> {
        let env = &self.env;
        for (key, value) in [
            ("voting_duration_sec", env.voting_duration_seconds),
            ("seeds_deferral_factor_x100", env.seeds_deferral_factor),
            ("hypha_deferral_factor_x100", env.hypha_deferral_factor),
            ("paused", 0),
        ] {
            dao::set_int_setting(self.api, env.dao, key, value).await?;
        }
        for (key, value) in [
            ("hypha_token_contract", env.hypha_token),
            ("hvoice_token_contract", env.hvoice_token),
            ("husd_token_contract", env.husd_token),
            ("seeds_token_contract", env.seeds_token),
            ("seeds_escrow_contract", env.seeds_escrow),
            ("publisher_contract", env.events),
            ("treasury_contract", env.bank),
            ("telos_decide_contract", env.telos_decide),
        ] {
            dao::set_name_setting(self.api, env.dao, key, value).await?;
        }
        Ok(())
    }
}
