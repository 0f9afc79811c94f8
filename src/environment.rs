//! Provisioning of a complete test environment around the accounting
//! contract: accounts, permissions, contracts, tokens and voting power.

use std::{fmt, time::Duration};

use thiserror::Error;

use crate::{api::Api, chain_client::ChainClient, docgraph::Document, error::Error, name::Name};

pub mod config;
pub mod member;
pub mod steps;

#[cfg(test)]
mod tests;

pub use config::{AccountNames, ArtifactPaths, EnvironmentConfig, MemberSpec, Tuning};
pub use member::setup_member;
pub use steps::{ProvisionStep, Provisioner};

/// Enrolled DAO member and the document the DAO wrote for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub account: Name,
    pub document: Document,
}

/// Accounts and parameters of a provisioned environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub dao: Name,
    pub accounting: Name,
    pub husd_token: Name,
    pub hypha_token: Name,
    pub hvoice_token: Name,
    pub seeds_token: Name,
    pub bank: Name,
    pub seeds_escrow: Name,
    pub seeds_exchange: Name,
    pub events: Name,
    pub telos_decide: Name,
    pub tlos_token: Name,
    pub whale: Option<Member>,
    pub root: Option<Document>,

    pub voting_duration_seconds: i64,
    pub hypha_deferral_factor: i64,
    pub seeds_deferral_factor: i64,

    pub num_periods: usize,
    pub period_duration: Duration,

    pub members: Vec<Member>,
}

impl Environment {
    /// Snapshot of the names and tuning `config` will provision, before any
    /// member is set up.
    pub fn planned(config: &EnvironmentConfig) -> Self {
        let accounts = &config.accounts;
        let tuning = &config.tuning;
        Environment {
            dao: accounts.dao,
            accounting: accounts.accounting,
            husd_token: accounts.husd_token,
            hypha_token: accounts.hypha_token,
            hvoice_token: accounts.hvoice_token,
            seeds_token: accounts.seeds_token,
            bank: accounts.bank,
            seeds_escrow: accounts.seeds_escrow,
            seeds_exchange: accounts.seeds_exchange,
            events: accounts.events,
            telos_decide: accounts.telos_decide,
            tlos_token: accounts.tlos_token,
            whale: None,
            root: None,
            voting_duration_seconds: tuning.voting_duration_seconds,
            hypha_deferral_factor: tuning.hypha_deferral_factor,
            seeds_deferral_factor: tuning.seeds_deferral_factor,
            num_periods: tuning.num_periods,
            period_duration: tuning.period_duration,
            members: Vec::new(),
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("DAO", self.dao.to_string()),
            ("Accounting", self.accounting.to_string()),
            ("HUSD Token", self.husd_token.to_string()),
            ("HVOICE Token", self.hvoice_token.to_string()),
            ("HYPHA Token", self.hypha_token.to_string()),
            ("SEEDS Token", self.seeds_token.to_string()),
            ("TLOS Token", self.tlos_token.to_string()),
            ("Bank", self.bank.to_string()),
            ("Escrow", self.seeds_escrow.to_string()),
            ("Exchange", self.seeds_exchange.to_string()),
            ("Events", self.events.to_string()),
            ("Telos Decide", self.telos_decide.to_string()),
            (
                "Whale",
                self.whale
                    .as_ref()
                    .map(|whale| whale.account.to_string())
                    .unwrap_or_default(),
            ),
            ("Members", self.members.len().to_string()),
            (
                "Voting Duration (s)",
                self.voting_duration_seconds.to_string(),
            ),
            ("HYPHA deferral X", self.hypha_deferral_factor.to_string()),
            ("SEEDS deferral X", self.seeds_deferral_factor.to_string()),
            ("Periods", self.num_periods.to_string()),
            (
                "Period Duration (s)",
                self.period_duration.as_secs().to_string(),
            ),
        ]
    }
}

fn center(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.len());
    let left = pad / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(pad - left))
}

/// Two-column Variable/Value table.
impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.rows();
        let key_width = rows
            .iter()
            .map(|(key, _)| key.len())
            .chain(["Variable".len()])
            .max()
            .unwrap_or_default();
        let value_width = rows
            .iter()
            .map(|(_, value)| value.len())
            .chain(["Value".len()])
            .max()
            .unwrap_or_default();
        let border = format!(
            "+{}+{}+",
            "-".repeat(key_width + 2),
            "-".repeat(value_width + 2)
        );

        writeln!(f, "{border}")?;
        writeln!(
            f,
            "| {} | {} |",
            center("Variable", key_width),
            center("Value", value_width)
        )?;
        writeln!(f, "{border}")?;
        for (key, value) in &rows {
            writeln!(f, "| {key:<key_width$} | {value:>value_width$} |")?;
        }
        write!(f, "{border}")
    }
}

/// Provisioning step that failed, and why.
#[derive(Debug, Error)]
#[error("Provisioning step {step} failed: {source}")]
pub struct ProvisionError {
    pub step: ProvisionStep,
    pub source: Error,
}

/// Runs every step `config` calls for, in order, and returns the snapshot.
pub async fn setup_environment<C: ChainClient>(
    api: &Api<C>,
    config: &EnvironmentConfig,
) -> Result<Environment, ProvisionError> {
    Provisioner::new(api, config)
        .run_steps(&ProvisionStep::plan(config))
        .await
}
