use super::*;
use std::path::PathBuf;

fn full_stack_config() -> EnvironmentConfig {
    let mut config = EnvironmentConfig::new("http://localhost:8888", "/src");
    config.deploy_full_dao_stack = true;
    config
}

#[test]
fn defaults_use_well_known_accounts_and_tuning() {
    let config = EnvironmentConfig::new("http://localhost:8888", "/src");
    assert!(!config.deploy_full_dao_stack);
    assert_eq!(config.accounts.accounting.to_string(), "accounting");
    assert_eq!(config.accounts.dao.to_string(), "dao.hypha");
    assert_eq!(config.accounts.bank.to_string(), "bank.hypha");
    assert_eq!(config.accounts.tlos_token.to_string(), "eosio.token");
    assert_eq!(config.tuning.voting_duration_seconds, 2);
    assert_eq!(config.tuning.num_periods, 10);
    assert_eq!(config.tuning.period_duration, Duration::from_secs(6));
}

#[test]
fn artifact_paths_follow_checkout_layout() {
    let paths = ArtifactPaths::from_dev_home("/home/dev");
    assert_eq!(
        paths.accounting.wasm,
        PathBuf::from("/home/dev/accounting-contracts/build/accounting/accounting.wasm")
    );
    assert_eq!(
        paths.accounting.abi,
        PathBuf::from("/home/dev/accounting-contracts/build/accounting/accounting.abi")
    );
    assert_eq!(
        paths.telos_decide.wasm,
        PathBuf::from("/home/dev/telosnetwork/telos-decide/build/contracts/decide/decide.wasm")
    );
}

#[test]
fn toml_overrides_tuning_and_dev_home() {
    let config = EnvironmentConfig::from_toml_str(
        r#"
        endpoint = "http://node:8888"
        dev_home = "/work"
        deploy_full_dao_stack = true

        [tuning]
        num_periods = 3
        period_duration = 60

        [whale]
        account = "whale"
        voting_power = "100.00 HVOICE"

        [[members]]
        account = "alice"
        voting_power = "1.00 HVOICE"
        "#,
    )
    .unwrap();

    assert_eq!(config.endpoint, "http://node:8888");
    assert!(config.deploy_full_dao_stack);
    assert_eq!(config.artifacts, ArtifactPaths::from_dev_home("/work"));
    assert_eq!(config.tuning.num_periods, 3);
    assert_eq!(config.tuning.period_duration, Duration::from_secs(60));
    assert_eq!(config.tuning.hypha_deferral_factor, 25);
    assert_eq!(config.whale.unwrap().voting_power.to_string(), "100.00 HVOICE");
    assert_eq!(config.members.len(), 1);
}

#[test]
fn unknown_toml_keys_are_rejected() {
    let err = EnvironmentConfig::from_toml_str("endpont = \"http://node:8888\"").unwrap_err();
    assert!(matches!(err, Error::Toml(_)));
}

#[test]
fn serialized_config_parses_back() {
    let mut config = full_stack_config();
    config.members.push(MemberSpec {
        account: "alice".parse().unwrap(),
        voting_power: "5.00 HVOICE".parse().unwrap(),
    });
    let text = toml::to_string(&config).unwrap();
    assert_eq!(EnvironmentConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn accounting_only_plan_stops_after_deploy() {
    let config = EnvironmentConfig::new("http://localhost:8888", "/src");
    assert_eq!(
        ProvisionStep::plan(&config),
        vec![
            ProvisionStep::CreateAccounting,
            ProvisionStep::CreateDao,
            ProvisionStep::CreateBank,
            ProvisionStep::UpdateBankPermissions,
            ProvisionStep::CreateContractAccounts,
            ProvisionStep::DeployAccounting,
        ]
    );
}

#[test]
fn full_stack_plan_orders_dependencies() {
    let config = full_stack_config();
    let plan = ProvisionStep::plan(&config);
    let position = |step: ProvisionStep| plan.iter().position(|s| *s == step).unwrap();

    assert!(position(ProvisionStep::CreateBank) < position(ProvisionStep::UpdateBankPermissions));
    assert!(position(ProvisionStep::DeployDao) < position(ProvisionStep::ConfigureDao));
    assert!(position(ProvisionStep::CreateTokens) < position(ProvisionStep::IssueSeeds));
    assert!(position(ProvisionStep::IssueTlos) < position(ProvisionStep::FundTelosDecide));
    assert!(
        position(ProvisionStep::NewVotingTreasury) < position(ProvisionStep::MintDaoVotingTokens)
    );
    assert!(!plan.contains(&ProvisionStep::SetupWhale));
    assert!(!plan.contains(&ProvisionStep::SetupMembers));
}

#[test]
fn member_steps_are_planned_when_configured() {
    let mut config = full_stack_config();
    config.whale = Some(MemberSpec {
        account: "whale".parse().unwrap(),
        voting_power: "100.00 HVOICE".parse().unwrap(),
    });
    config.members.push(MemberSpec {
        account: "alice".parse().unwrap(),
        voting_power: "1.00 HVOICE".parse().unwrap(),
    });
    let plan = ProvisionStep::plan(&config);
    assert_eq!(
        &plan[plan.len() - 2..],
        &[ProvisionStep::SetupWhale, ProvisionStep::SetupMembers]
    );
}

#[test]
fn environment_table_lists_accounts() {
    let env = Environment::planned(&full_stack_config());
    let table = env.to_string();
    let lines: Vec<_> = table.lines().collect();

    assert!(lines[1].contains("Variable"));
    assert!(lines[1].contains("Value"));
    assert!(table.contains("| Accounting "));
    assert!(table.contains(" dao.hypha |"));
    assert!(table.contains(" telos.decide |"));
    let width = lines[0].len();
    assert!(lines.iter().all(|line| line.len() == width));
}

#[test]
fn provision_error_names_the_step() {
    let err = ProvisionError {
        step: ProvisionStep::UpdateBankPermissions,
        source: Error::Config("boom".to_string()),
    };
    assert_eq!(
        err.to_string(),
        "Provisioning step update bank permissions failed: Config error: boom"
    );
}
