pub mod authors;
pub mod dev;

use anyhow::Result;

use quill_infra::Config;

/// Load the configuration and start logging, as every subcommand touching the store does.
pub fn load_config() -> Result<Config> {
    let config = Config::load()?;
    quill_observability::init_with(&config.logging);
    Ok(config)
}
