//! Quiz-taking commands: `answer`, `submit`, `reset` and `shuffle`.

use std::path::PathBuf;

use anyhow::{bail, Result};

use athena_core::model::OptionLabel;
use athena_core::session::SubmitOutcome;

use super::open_session;

/// Select `option` for question `number`, or clear it. Choosing the option
/// that is already selected clears it too.
///
/// With `shuffle_seed` the letter refers to the shuffled order that
/// `review --shuffle-options` shows for the same seed.
pub async fn answer(
    config_path: Option<PathBuf>,
    quiz_set: String,
    number: usize,
    option: Option<char>,
    shuffle_seed: Option<u64>,
) -> Result<()> {
    let mut session = open_session(config_path.as_deref(), &quiz_set, shuffle_seed).await?;
    let total = session.navigator().len();
    if number == 0 || number > total {
        bail!("question {number} out of range (1-{total})");
    }
    session.navigator_mut().go_to(number as i64 - 1);

    let index = match option {
        Some(letter) => {
            let label: OptionLabel = format!("Option {}", letter.to_ascii_uppercase())
                .parse()
                .map_err(anyhow::Error::msg)?;
            Some(label.index())
        }
        None => None,
    };

    let Some(selection) = session.select_option(index).await else {
        bail!("could not select that option for question {number}");
    };
    match selection.current {
        Some(label) => println!("Question {number}: {label} selected"),
        None => println!("Question {number}: selection cleared"),
    }
    println!("Score: {}/{}", session.running_score(), total);
    Ok(())
}

pub async fn submit(config_path: Option<PathBuf>, quiz_set: String, force: bool) -> Result<()> {
    let mut session = open_session(config_path.as_deref(), &quiz_set, None).await?;
    match session.submit(force).await {
        SubmitOutcome::Unanswered(unanswered) => {
            let numbers: Vec<String> = unanswered.iter().map(|(n, _)| n.to_string()).collect();
            println!("Unanswered questions: {}", numbers.join(", "));
            println!("Answer them or run again with --force.");
        }
        SubmitOutcome::Summary(summary) => {
            println!("Score: {summary}");
            session.review_incorrect();
            let incorrect = session.navigator().len();
            if incorrect > 0 {
                println!(
                    "{incorrect} to review: athena review {quiz_set} --filter incorrect --answers"
                );
            }
        }
    }
    Ok(())
}

pub async fn reset(config_path: Option<PathBuf>, quiz_set: String) -> Result<()> {
    let mut session = open_session(config_path.as_deref(), &quiz_set, None).await?;
    if !session.reset().await {
        bail!("failed to reset quiz set {quiz_set}");
    }
    println!("Cleared all answers of {quiz_set}.");
    Ok(())
}

pub async fn shuffle(config_path: Option<PathBuf>, quiz_set: String) -> Result<()> {
    let mut session = open_session(config_path.as_deref(), &quiz_set, None).await?;
    if !session.shuffle_questions().await {
        bail!("failed to shuffle quiz set {quiz_set}");
    }
    let ids: Vec<String> = session
        .navigator()
        .questions()
        .iter()
        .map(|q| format!("#{}", q.id))
        .collect();
    println!("New order: {}", ids.join(" "));
    Ok(())
}
