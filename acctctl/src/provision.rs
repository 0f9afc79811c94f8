use crate::config::load_config;
use accounting::environment::setup_environment;
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

pub(crate) async fn provision_impl(path: Option<PathBuf>) -> Result<()> {
    let config = load_config(path).await?;
    let api = config.connect()?;
    info!(endpoint = %config.endpoint, "provisioning");
    let env = setup_environment(&api, &config).await?;
    println!("{env}");
    if let Some(whale) = &env.whale {
        println!("Whale document: {}", whale.document.id);
    }
    for member in &env.members {
        println!("Member {} document: {}", member.account, member.document.id);
    }
    Ok(())
}
