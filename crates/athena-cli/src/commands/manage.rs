//! Quiz set management: `rename`, `delete`, `lock`, `urls` and `download`.

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};

use athena_core::dashboard::Dashboard;
use athena_core::lock::LockState;

use super::Context;

fn dashboard(ctx: Context) -> Dashboard {
    Dashboard::new(ctx.backend, ctx.store, LockState::default())
}

fn on_off(locked: bool) -> &'static str {
    if locked {
        "locked"
    } else {
        "unlocked"
    }
}

pub async fn rename(config_path: Option<PathBuf>, quiz_set: String, title: String) -> Result<()> {
    let mut dashboard = dashboard(Context::load(config_path.as_deref())?);
    if !dashboard.rename(&quiz_set, &title).await? {
        bail!("backend rejected renaming {quiz_set}");
    }
    println!("Renamed {quiz_set} to \"{}\"", title.trim());
    Ok(())
}

pub async fn delete(config_path: Option<PathBuf>, quiz_set: String) -> Result<()> {
    let mut dashboard = dashboard(Context::load(config_path.as_deref())?);
    dashboard.load().await;
    if !dashboard.delete(&quiz_set).await {
        bail!("failed to delete {quiz_set}");
    }
    println!("Deleted {quiz_set}");
    Ok(())
}

pub async fn lock(
    config_path: Option<PathBuf>,
    quiz_set: Option<String>,
    global: bool,
) -> Result<()> {
    let mut dashboard = dashboard(Context::load(config_path.as_deref())?);

    if global {
        let Some(locked) = dashboard.toggle_global_lock().await else {
            bail!("failed to toggle the global lock");
        };
        println!("Grades are now {}", on_off(locked));
        return Ok(());
    }

    if let Some(id) = quiz_set {
        let Some(locked) = dashboard.toggle_lock(&id).await else {
            bail!("failed to toggle the lock of {id}");
        };
        println!("{id} is now {}", on_off(locked));
        return Ok(());
    }

    dashboard.load().await;
    println!("Grades: {}", on_off(dashboard.lock().is_locked().await));
    for set in dashboard.quiz_sets() {
        println!("  {} ({}): {}", set.id, set.title, on_off(set.lock_state));
    }
    Ok(())
}

pub async fn urls(config_path: Option<PathBuf>, quiz_set: String) -> Result<()> {
    let mut dashboard = dashboard(Context::load(config_path.as_deref())?);
    dashboard.load().await;
    if dashboard.quiz_set(&quiz_set).is_none() {
        bail!("quiz set {quiz_set} not found");
    }

    let ranges = dashboard.url_ranges(&quiz_set);
    if ranges.is_empty() {
        println!("No source URLs.");
    }
    for range in ranges {
        println!("{range}");
    }
    Ok(())
}

pub async fn download(
    config_path: Option<PathBuf>,
    quiz_set: String,
    output: PathBuf,
) -> Result<()> {
    let dashboard = dashboard(Context::load(config_path.as_deref())?);
    let Some(pdf) = dashboard.download_pdf(&quiz_set).await else {
        bail!("failed to download the PDF of {quiz_set}");
    };
    std::fs::write(&output, &pdf)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Saved {} ({} bytes)", output.display(), pdf.len());
    Ok(())
}
