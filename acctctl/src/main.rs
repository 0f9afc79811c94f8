use crate::{
    config::{env_impl, init_impl},
    documents::last_document_impl,
    ledger::{add_ledger_impl, create_account_impl, transact_impl},
    provision::provision_impl,
};
use accounting::Name;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod documents;
mod ledger;
mod provision;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Config file, defaults to ~/.acctctl/config.toml
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    action: ActionParams,
}

#[derive(clap::Subcommand, Debug)]
enum ActionParams {
    /// Print the resolved config and the accounts it provisions
    Env,
    /// Write a default config file
    Init,
    /// Create accounts, deploy contracts and enrol members
    Provision,
    /// Create a ledger from a JSON file of content groups
    AddLedger {
        creator: Name,
        info: PathBuf,
    },
    /// Create a ledger account from a JSON file of content groups
    CreateAccount {
        creator: Name,
        info: PathBuf,
    },
    /// Record a transaction from a JSON file of content groups
    Transact {
        issuer: Name,
        info: PathBuf,
    },
    /// Show the newest document of a contract
    LastDocument {
        /// Defaults to the accounting contract
        contract: Option<Name>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config;
    match args.action {
        ActionParams::Env => env_impl(config).await?,
        ActionParams::Init => init_impl(config).await?,
        ActionParams::Provision => provision_impl(config).await?,
        ActionParams::AddLedger { creator, info } => {
            add_ledger_impl(config, creator, info).await?
        }
        ActionParams::CreateAccount { creator, info } => {
            create_account_impl(config, creator, info).await?
        }
        ActionParams::Transact { issuer, info } => transact_impl(config, issuer, info).await?,
        ActionParams::LastDocument { contract } => last_document_impl(config, contract).await?,
    }
    Ok(())
}
