use anyhow::Result;
use std::path::Path;

use crate::config::Config;

pub fn show_config(path: Option<&Path>) -> Result<()> {
    let config_file = Config::resolve(path)?;
    let config = Config::load(path)?;
    let config_str = toml::to_string_pretty(&config)?;

    println!("Current Configuration ({})", config_file.display());
    println!("────────────────────────────────");
    println!();
    println!("{}", config_str);

    Ok(())
}

pub fn init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let config_file = Config::resolve(path)?;

    if config_file.exists() && !force {
        println!(
            "Configuration file already exists at: {}",
            config_file.display()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let written = Config::default().save(path)?;

    println!("✓ Configuration initialized at: {}", written.display());
    println!();
    println!("Tune thresholds under [engine.*] and check them with: tnua config show");

    Ok(())
}
