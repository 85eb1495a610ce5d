//! CLI command implementations.

mod render;

pub use render::{RenderOverrides, render};

use anyhow::Result;
use glpipe_core::Error;

pub fn expand(config_path: &str, set_name: &str) -> Result<()> {
    let text = std::fs::read_to_string(config_path)?;
    let config = glpipe_config::parse_document(&text).map_err(Error::from)?;

    let flavours = config.flavours.get(set_name)?.expand()?;
    println!("{}", serde_json::to_string_pretty(&flavours)?);
    Ok(())
}

pub fn validate(path: &str) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    match glpipe_config::parse_document(&text) {
        Ok(config) => {
            println!(
                "Configuration is valid: {} flavour set(s), {} credential spec(s)",
                config.flavours.len(),
                config.credentials.len()
            );
            Ok(())
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}
