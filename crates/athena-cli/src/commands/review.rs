//! The `athena review` command.

use std::path::PathBuf;

use anyhow::Result;

use athena_core::model::Question;
use athena_core::navigator::QuestionFilter;
use athena_core::normalize::render_question;
use athena_core::search::{search, strip_html};

use super::open_session;

pub async fn execute(
    config_path: Option<PathBuf>,
    quiz_set: String,
    filter: QuestionFilter,
    keyword: Option<String>,
    show_answers: bool,
    shuffle_seed: Option<u64>,
) -> Result<()> {
    let mut session = open_session(config_path.as_deref(), &quiz_set, shuffle_seed).await?;
    session.navigator_mut().set_filter(filter);
    let navigator = session.navigator();

    if let Some(keyword) = keyword {
        let hits = search(navigator, &keyword);
        if hits.is_empty() {
            println!("No {filter} questions match '{keyword}'.");
        }
        for hit in hits {
            let star = if hit.favorite { " *" } else { "" };
            println!("{:>3}. [#{}]{star} {}", hit.view_index + 1, hit.question_id, hit.text);
        }
        return Ok(());
    }

    if navigator.is_empty() {
        println!("No {filter} questions.");
        return Ok(());
    }

    let reveal = show_answers && session.answers_visible();
    for (index, question) in navigator.view().enumerate() {
        let favorite = navigator.is_favorite(question.id);
        print_question(index + 1, question, &quiz_set, favorite, reveal);
    }

    println!(
        "{} of {} questions shown, score {}/{}",
        navigator.len(),
        navigator.questions().len(),
        session.running_score(),
        navigator.questions().len()
    );
    Ok(())
}

fn print_question(
    number: usize,
    question: &Question,
    quiz_set: &str,
    favorite: bool,
    reveal: bool,
) {
    let rendered = render_question(question, quiz_set);
    let star = if favorite { " *" } else { "" };
    println!("{number:>3}. [#{}]{star} {}", question.id, strip_html(&rendered.text));

    for (label, text) in &rendered.options {
        let selected = question.user_selected_option == Some(*label);
        let correct = reveal && question.answer == *label;
        let marker = match (selected, correct) {
            (true, true) => "=>",
            (true, false) => "> ",
            (false, true) => " =",
            (false, false) => "  ",
        };
        println!("     {marker} {}. {}", label.letter(), strip_html(text));
    }

    if reveal && !question.explanation.is_empty() {
        println!("     Explanation: {}", strip_html(&rendered.explanation));
    }
    println!();
}
