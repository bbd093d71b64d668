//! The `athena scrape` command.

use std::path::PathBuf;

use anyhow::Result;

use athena_core::scrape::{start_scraping, ScrapeRequest};

use super::{read_input, Context};

pub async fn execute(
    config_path: Option<PathBuf>,
    title: String,
    input: Option<PathBuf>,
) -> Result<()> {
    let sources = read_input(input.as_deref())?;
    // validate before touching config or network
    let request = ScrapeRequest::new(&title, &sources)?;
    eprintln!("Scraping {} source(s) into \"{}\"...", request.urls.len(), request.title);

    let ctx = Context::load(config_path.as_deref())?;
    let response = start_scraping(ctx.backend.as_ref(), &title, &sources).await?;
    println!("Created quiz set {}", response.quiz_set_id);
    if !response.message.is_empty() {
        println!("{}", response.message);
    }
    Ok(())
}
