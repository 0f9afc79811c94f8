use crate::config::load_config;
use accounting::{docgraph::get_last_document, Name};
use anyhow::Result;
use std::path::PathBuf;

pub(crate) async fn last_document_impl(
    path: Option<PathBuf>,
    contract: Option<Name>,
) -> Result<()> {
    let config = load_config(path).await?;
    let api = config.connect()?;
    let contract = contract.unwrap_or(config.accounts.accounting);
    let document = get_last_document(&api, contract).await?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
