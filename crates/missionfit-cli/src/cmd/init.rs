use anyhow::Context;
use missionfit_core::config::{Config, StorageBackend};
use missionfit_core::{io, paths};
use std::path::Path;

use crate::output::print_json;

pub fn run(root: &Path, backend: Option<StorageBackend>, json: bool) -> anyhow::Result<()> {
    let dir = paths::missionfit_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    let mut config = Config::load(root).context("failed to load config")?;
    if let Some(backend) = backend {
        if config_path.exists() {
            tracing::warn!(
                backend = %backend,
                "config.yaml already exists, --backend ignored"
            );
        } else {
            config.storage.backend = backend;
        }
    }

    let data = serde_yaml::to_string(&config)?;
    let created =
        io::write_if_missing(&config_path, data.as_bytes()).context("failed to write config.yaml")?;

    if json {
        print_json(&serde_json::json!({
            "root": root,
            "config": paths::CONFIG_FILE,
            "created": created,
            "backend": config.storage.backend,
        }))?;
    } else {
        println!("Initializing MissionFit in: {}", root.display());
        let verb = if created { "created:" } else { "exists: " };
        println!("  {verb} {}", paths::CONFIG_FILE);
        println!(
            "  tasks:   {} ({})",
            config.tasks_path(root).display(),
            config.storage.backend
        );
    }
    Ok(())
}
