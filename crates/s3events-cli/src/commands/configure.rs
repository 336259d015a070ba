//! configure command - manage configuration profiles

use super::CommandContext;
use crate::aws::region_provider;
use crate::config::Config;
use crate::ConfigureAction;
use anyhow::Result;
use colored::Colorize;
use std::io::{self, Write};

pub async fn execute(ctx: &CommandContext, action: Option<ConfigureAction>) -> Result<()> {
    let profile = ctx.profile.as_deref();

    match action {
        Some(ConfigureAction::Set { key, value }) => set_config(profile, &key, &value),
        Some(ConfigureAction::Get { key }) => get_config(ctx, &key),
        Some(ConfigureAction::List) => list_config(ctx).await,
        Some(ConfigureAction::AddProfile { name }) => add_profile(&name),
        Some(ConfigureAction::RemoveProfile { name }) => remove_profile(&name),
        None => interactive_configure(profile),
    }
}

/// Writes go to the file only; environment overrides are not persisted
fn stored_profile(profile: Option<&str>) -> Result<Config> {
    Config::load_from(&Config::config_path()?, profile)
}

fn set_config(profile: Option<&str>, key: &str, value: &str) -> Result<()> {
    let mut config = stored_profile(profile)?;
    config.set_value(key, value)?;
    config.validate()?;
    config.save(profile)?;
    println!("Set {} = {}", key.cyan(), config.get_value(key).unwrap_or_default());
    Ok(())
}

fn get_config(ctx: &CommandContext, key: &str) -> Result<()> {
    if !Config::keys().contains(&key) {
        anyhow::bail!("Unknown config key: {}", key);
    }

    match ctx.config.get_value(key) {
        Some(value) => println!("{}", value),
        None => println!("(not set)"),
    }
    Ok(())
}

async fn list_config(ctx: &CommandContext) -> Result<()> {
    let profile = ctx.profile.as_deref().unwrap_or("default");

    if ctx.is_json() {
        let mut shown = ctx.config.clone();
        shown.secret_key = shown.secret_key.map(|_| "***".to_string());
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!("{} ({})", "Current configuration:".bold(), profile);
    println!();

    for key in Config::keys() {
        let value = ctx
            .config
            .get_value(key)
            .unwrap_or_else(|| "(not set)".to_string());
        println!("  {}: {}", key.cyan(), value);
    }
    let region = region_provider(ctx.config.region.as_deref()).region().await;
    println!(
        "  {}: {}",
        "resolved region".dimmed(),
        region.map(|r| r.to_string()).unwrap_or_else(|| "(not set)".to_string())
    );

    println!();
    println!("{}", "Available profiles:".bold());

    let profiles = Config::list_profiles()?;
    if profiles.is_empty() {
        println!("  (none)");
    } else {
        for profile in profiles {
            println!("  - {}", profile);
        }
    }

    println!();
    println!(
        "Config file: {}",
        Config::config_path()?.display().to_string().dimmed()
    );

    Ok(())
}

fn add_profile(name: &str) -> Result<()> {
    if Config::list_profiles()?.iter().any(|p| p == name) {
        anyhow::bail!("Profile already exists: {}", name);
    }

    Config::default().save(Some(name))?;
    println!("Created profile: {}", name.green());
    println!(
        "Use 's3events --profile {} configure set <key> <value>' to configure it.",
        name
    );
    Ok(())
}

fn remove_profile(name: &str) -> Result<()> {
    Config::delete_profile(name)?;
    println!("Removed profile: {}", name.red());
    Ok(())
}

fn interactive_configure(profile: Option<&str>) -> Result<()> {
    println!("{}", "s3events configuration".bold());
    println!("Press Enter to keep current value.\n");

    let mut config = stored_profile(profile)?;

    for (key, label) in [
        ("region", "Region"),
        ("endpoint", "Endpoint URL"),
        ("access_key", "Access Key"),
        ("secret_key", "Secret Key"),
        ("batch_size", "Batch size"),
    ] {
        let current = config.get_value(key).unwrap_or_default();
        print!("{} [{}]: ", label, current);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();
        if !input.is_empty() {
            config.set_value(key, input)?;
        }
    }

    config.validate()?;
    config.save(profile)?;

    println!();
    println!(
        "{} Configuration saved to {}",
        "✓".green(),
        Config::config_path()?.display()
    );

    Ok(())
}
