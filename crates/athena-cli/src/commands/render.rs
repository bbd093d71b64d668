//! The `athena render` command.

use std::path::PathBuf;

use anyhow::Result;

use athena_core::markdown::format_bot_response;
use athena_core::normalize::{render_explanation, render_question_text};

use super::read_input;
use crate::RenderMode;

pub fn execute(file: Option<PathBuf>, quiz_set: String, mode: RenderMode) -> Result<()> {
    let input = read_input(file.as_deref())?;
    let html = match mode {
        RenderMode::Question => render_question_text(&input, &quiz_set),
        RenderMode::Explanation => render_explanation(&input, &quiz_set),
        RenderMode::Bot => format_bot_response(&input),
    };
    println!("{html}");
    Ok(())
}
