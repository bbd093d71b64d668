//! The `athena explain` and `athena comments` commands.

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};

use athena_core::comments::parse_comments;
use athena_core::search::strip_html;
use athena_core::session::QuizSession;

use super::Context;

pub async fn execute(
    config_path: Option<PathBuf>,
    quiz_set: String,
    question_id: i64,
    regenerate: bool,
) -> Result<()> {
    let ctx = Context::load(config_path.as_deref())?;
    let mut session = QuizSession::new(ctx.backend, quiz_set.as_str()).with_store(ctx.store);
    if !session.load().await {
        bail!("failed to load quiz set {quiz_set}");
    }
    if session.navigator().question(question_id).is_none() {
        bail!("question {question_id} is not in quiz set {quiz_set}");
    }

    match session.further_explanation(question_id, regenerate).await {
        Some(html) => println!("{html}"),
        None => bail!("no explanation available for question {question_id}"),
    }
    Ok(())
}

pub async fn comments(config_path: Option<PathBuf>, question_id: i64) -> Result<()> {
    let ctx = Context::load(config_path.as_deref())?;
    let raw = ctx
        .backend
        .get_discussion_comments(question_id)
        .await
        .with_context(|| format!("failed to fetch comments of question {question_id}"))?;

    let comments = raw.as_deref().map(parse_comments).unwrap_or_default();
    if comments.is_empty() {
        println!("No discussion for question {question_id}.");
        return Ok(());
    }
    for comment in comments {
        println!("{} ({})", comment.username, comment.when);
        println!("  {}", strip_html(&comment.text));
    }
    Ok(())
}
