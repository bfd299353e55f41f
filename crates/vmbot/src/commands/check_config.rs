use super::ConfigPaths;
use colored::Colorize;

pub fn handle(paths: &ConfigPaths) -> anyhow::Result<()> {
    println!("{}", "Checking configuration...".blue());

    let loaded = super::load(paths)?;

    println!("{}", "✓ Configuration is valid".green().bold());
    println!();
    println!("Summary:");
    println!(
        "  Config file: {}",
        loaded.config_path.display().to_string().cyan()
    );
    println!(
        "  Key file: {}",
        loaded.key_path.display().to_string().cyan()
    );
    println!("  Allowed users: {}", loaded.config.whitelist.len());
    match loaded.config.notify_cid {
        Some(chat_id) => println!("  Broadcast chat: {}", chat_id.to_string().cyan()),
        None => println!("  Broadcast chat: {}", "(none)".dimmed()),
    }
    println!(
        "  Service account: {} (key {})",
        loaded.key.service_account_id.cyan(),
        loaded.key.id
    );
    Ok(())
}
