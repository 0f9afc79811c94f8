use crate::config::load_config;
use accounting::{
    accounting::{add_ledger, create_acct, transact},
    ContentGroup, Name,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

async fn read_content_groups(path: &Path) -> Result<Vec<ContentGroup>> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let groups = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a list of content groups", path.display()))?;
    Ok(groups)
}

pub(crate) async fn add_ledger_impl(
    path: Option<PathBuf>,
    creator: Name,
    info: PathBuf,
) -> Result<()> {
    let config = load_config(path).await?;
    let api = config.connect()?;
    let groups = read_content_groups(&info).await?;
    let id = add_ledger(&api, config.accounts.accounting, creator, groups).await?;
    println!("addledger: {id}");
    Ok(())
}

pub(crate) async fn create_account_impl(
    path: Option<PathBuf>,
    creator: Name,
    info: PathBuf,
) -> Result<()> {
    let config = load_config(path).await?;
    let api = config.connect()?;
    let groups = read_content_groups(&info).await?;
    let id = create_acct(&api, config.accounts.accounting, creator, groups).await?;
    println!("create: {id}");
    Ok(())
}

pub(crate) async fn transact_impl(
    path: Option<PathBuf>,
    issuer: Name,
    info: PathBuf,
) -> Result<()> {
    let config = load_config(path).await?;
    let api = config.connect()?;
    let groups = read_content_groups(&info).await?;
    let id = transact(&api, config.accounts.accounting, issuer, groups).await?;
    println!("transact: {id}");
    Ok(())
}
