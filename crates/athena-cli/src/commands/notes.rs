//! The `athena notes` command.

use std::path::PathBuf;

use anyhow::{bail, Result};

use athena_core::notes::NotesEditor;

use super::{read_input, Context};

pub async fn execute(config_path: Option<PathBuf>, save: Option<PathBuf>) -> Result<()> {
    let ctx = Context::load(config_path.as_deref())?;
    let mut editor = NotesEditor::new(ctx.store);

    if let Some(path) = save {
        let content = read_input(Some(&path))?;
        if !editor.save(&content, ctx.backend.as_ref()).await? {
            bail!("notes saved locally but the backend rejected them");
        }
        println!("Notes saved.");
        return Ok(());
    }

    let content = editor.load(ctx.backend.as_ref()).await?;
    if content.is_empty() {
        println!("No notes yet. Save some with `athena notes --save FILE`.");
    } else {
        println!("{content}");
    }
    Ok(())
}
