//! The `athena init` command.

use anyhow::Result;

use athena_client::config::STARTER_CONFIG;

pub fn execute() -> Result<()> {
    let path = std::path::Path::new("athena.toml");
    if path.exists() {
        println!("athena.toml already exists, skipping.");
        return Ok(());
    }
    std::fs::write(path, STARTER_CONFIG)?;
    println!("Created athena.toml");

    println!("\nNext steps:");
    println!("  1. Point backend_url or environment at your athena backend");
    println!("  2. Run: athena list");
    Ok(())
}
