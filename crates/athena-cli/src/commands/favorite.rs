//! The `athena favorite` and `athena answers` commands.

use std::path::PathBuf;

use anyhow::{bail, Result};

use super::open_session;

/// Toggle the favorite flag of question `number`.
pub async fn execute(config_path: Option<PathBuf>, quiz_set: String, number: usize) -> Result<()> {
    let mut session = open_session(config_path.as_deref(), &quiz_set, None).await?;
    let total = session.navigator().len();
    if number == 0 || number > total {
        bail!("question {number} out of range (1-{total})");
    }
    session.navigator_mut().go_to(number as i64 - 1);

    match session.toggle_favorite().await {
        Some(true) => println!("Question {number}: added to favorites"),
        Some(false) => println!("Question {number}: removed from favorites"),
        None => bail!("could not update favorites of question {number}"),
    }
    Ok(())
}

/// Show whether answers are revealed for a quiz set, or flip it.
pub async fn answers(config_path: Option<PathBuf>, quiz_set: String, toggle: bool) -> Result<()> {
    let mut session = open_session(config_path.as_deref(), &quiz_set, None).await?;
    let visible = if toggle {
        match session.toggle_answers_visible().await {
            Some(visible) => visible,
            None => bail!("could not save answer visibility of {quiz_set}"),
        }
    } else {
        session.answers_visible()
    };
    let state = if visible { "shown" } else { "hidden" };
    println!("Answers for {quiz_set}: {state}");
    Ok(())
}
