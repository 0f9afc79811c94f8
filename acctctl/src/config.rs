use accounting::environment::{Environment, EnvironmentConfig};
use anyhow::{anyhow, Result};
use dirs::home_dir;
use std::path::{Path, PathBuf};
use tokio::fs;

const CONFIG_FOLDER: &str = ".acctctl";
const CONFIG_FILE: &str = "config.toml";

pub fn path_to_config_file() -> Result<PathBuf> {
    let mut path = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    path.push(CONFIG_FOLDER);
    path.push(CONFIG_FILE);
    Ok(path)
}

/// Config at `path` (or the default location). A missing default file
/// means environment defaults; a missing explicit file is an error.
pub async fn load_config(path: Option<PathBuf>) -> Result<EnvironmentConfig> {
    let config = match path {
        Some(path) => EnvironmentConfig::load(path).await?,
        None => {
            let path = path_to_config_file()?;
            if fs::try_exists(&path).await? {
                EnvironmentConfig::load(path).await?
            } else {
                EnvironmentConfig::from_env()
            }
        }
    };
    Ok(config)
}

async fn write_config(path: &Path, config: &EnvironmentConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, toml::to_string(config)?).await?;
    Ok(())
}

pub(crate) async fn env_impl(path: Option<PathBuf>) -> Result<()> {
    let config = load_config(path).await?;
    println!("{}", toml::to_string(&config)?);
    println!("{}", Environment::planned(&config));
    Ok(())
}

pub(crate) async fn init_impl(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => path_to_config_file()?,
    };
    if fs::try_exists(&path).await? {
        return Err(anyhow!("{} already exists", path.display()));
    }
    write_config(&path, &EnvironmentConfig::from_env()).await?;
    println!("Wrote {}", path.display());
    Ok(())
}
