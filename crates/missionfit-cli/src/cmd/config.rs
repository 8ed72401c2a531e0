use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use missionfit_core::config::{Config, WarnLevel};
use missionfit_core::paths;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration (defaults filled in)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let key_set = std::env::var(&config.completion.api_key_env).is_ok_and(|v| !v.trim().is_empty());

    if json {
        print_json(&serde_json::json!({
            "config": config,
            "tasksPath": config.tasks_path(root),
            "apiKeySet": key_set,
        }))?;
        return Ok(());
    }

    if !paths::config_path(root).exists() {
        println!("# {} not found; showing defaults", paths::CONFIG_FILE);
    }
    print!("{}", serde_yaml::to_string(&config)?);
    println!("# tasks file: {}", config.tasks_path(root).display());
    println!(
        "# {}: {}",
        config.completion.api_key_env,
        if key_set { "set" } else { "not set" }
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
