//! Local option shuffling.
//!
//! Options are permuted by position, so the answer keeps pointing at the text
//! that was correct before the shuffle even when two options share a text.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::model::{OptionLabel, Question};

/// Permute one question's options and relabel its answer and selection to
/// follow their content.
///
/// Returns the permutation applied, where `order[new] = old`, or `None` when
/// the options were left as they were.
pub fn shuffle_options<R: Rng + ?Sized>(
    question: &mut Question,
    rng: &mut R,
) -> Option<Vec<usize>> {
    let len = question.options.len().min(OptionLabel::MAX_OPTIONS);
    if len < 2 {
        return None;
    }
    if question.answer.index() >= len {
        warn!(
            question_id = question.id,
            answer = %question.answer,
            "answer label has no matching option; leaving options unshuffled"
        );
        return None;
    }

    // order[new] = old
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);

    let relabel = |label: OptionLabel| {
        order
            .iter()
            .position(|&old| old == label.index())
            .and_then(OptionLabel::from_index)
    };

    let answer = relabel(question.answer);
    let selected = question.user_selected_option.and_then(relabel);

    let mut old: Vec<Option<String>> = question.options.drain(..len).map(Some).collect();
    let mut shuffled: Vec<String> = order.iter().filter_map(|&i| old[i].take()).collect();
    shuffled.append(&mut question.options);
    question.options = shuffled;

    if let Some(answer) = answer {
        question.answer = answer;
    }
    if question.user_selected_option.is_some() {
        question.user_selected_option = selected;
    }
    Some(order)
}

/// Map a label in shuffled order back to the label it had before the
/// shuffle described by `order`.
pub fn unshuffled_label(order: &[usize], label: OptionLabel) -> OptionLabel {
    order
        .get(label.index())
        .and_then(|&old| OptionLabel::from_index(old))
        .unwrap_or(label)
}
