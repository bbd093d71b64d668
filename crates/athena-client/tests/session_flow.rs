//! End-to-end flows of the quiz session and dashboard against the mock
//! backend.

use std::sync::Arc;

use athena_client::mock::{Call, MockBackend};
use athena_core::dashboard::{Dashboard, SelectAll};
use athena_core::lock::LockState;
use athena_core::model::{Grade, OptionLabel, Question, QuestionId, QuizSummary};
use athena_core::navigator::QuestionFilter;
use athena_core::notes::NotesEditor;
use athena_core::session::{QuizSession, SubmitOutcome};
use athena_core::storage::{JsonFileStore, KeyValueStore, MemoryStore, EDITOR_CONTENT_KEY};
use athena_core::traits::{QuizBackend, ScoreUpdate};

fn label(index: usize) -> OptionLabel {
    OptionLabel::from_index(index).unwrap()
}

fn question(id: QuestionId, answer: usize) -> Question {
    Question {
        id,
        order_index: id,
        text: format!("Question {id}"),
        options: vec![
            format!("{id}-a"),
            format!("{id}-b"),
            format!("{id}-c"),
            format!("{id}-d"),
        ],
        answer: label(answer),
        url: Some(format!("https://bank.example/quiz/{id}")),
        explanation: format!("Because of {id}"),
        discussion_link: None,
        user_selected_option: None,
        has_math_content: false,
    }
}

/// Q1 answer A, Q2 answer B, Q3 answer C.
fn three_question_backend() -> Arc<MockBackend> {
    Arc::new(MockBackend::new().with_quiz_set(
        "s1",
        "Circuits",
        vec![question(1, 0), question(2, 1), question(3, 2)],
    ))
}

async fn loaded_session(backend: &Arc<MockBackend>) -> QuizSession {
    let mut session = QuizSession::new(backend.clone(), "s1").with_rng_seed(7);
    assert!(session.load().await);
    session
}

#[tokio::test]
async fn submit_grades_and_incorrect_view_lists_wrong_and_unanswered() {
    let backend = three_question_backend();
    let mut session = loaded_session(&backend).await;

    session.select_option(Some(0)).await.unwrap(); // Q1 correct
    session.navigator_mut().go_to(1);
    session.select_option(Some(3)).await.unwrap(); // Q2 wrong

    let outcome = session.submit(false).await;
    assert_eq!(outcome, SubmitOutcome::Unanswered(vec![(3, 3)]));
    assert_eq!(backend.submitted("s1"), None);

    let outcome = session.submit(true).await;
    assert_eq!(outcome, SubmitOutcome::Summary(QuizSummary::new(1, 3)));
    assert_eq!(backend.submitted("s1"), Some((1, Grade::Failed)));

    session.review_incorrect();
    assert_eq!(session.navigator().filter(), QuestionFilter::Incorrect);
    assert_eq!(session.navigator().view_ids(), vec![2, 3]);
}

#[tokio::test]
async fn select_then_deselect_restores_score() {
    let backend = three_question_backend();
    let mut session = loaded_session(&backend).await;
    let before = session.running_score();

    let selected = session.select_option(Some(0)).await.unwrap();
    assert_eq!(selected.score_delta, 1);
    assert_eq!(session.running_score(), before + 1);

    // clicking the selected option again clears it
    let cleared = session.select_option(Some(0)).await.unwrap();
    assert_eq!(cleared.current, None);
    assert_eq!(cleared.score_delta, -1);
    assert_eq!(session.running_score(), before);
    assert_eq!(backend.running_score("s1"), 0);
    assert_eq!(backend.selection(1), None);
}

#[tokio::test]
async fn score_update_precedes_selection_and_only_on_change() {
    let backend = three_question_backend();
    let mut session = loaded_session(&backend).await;
    backend.clear_calls();

    // wrong answer on an unanswered question: no score change
    session.select_option(Some(2)).await.unwrap();
    assert_eq!(
        backend.calls(),
        vec![Call::UpdateUserSelection(1, Some(label(2)))]
    );

    backend.clear_calls();
    session.select_option(Some(0)).await.unwrap();
    assert_eq!(
        backend.calls(),
        vec![
            Call::UpdateScore(ScoreUpdate {
                question_id: 1,
                increment: true,
                quiz_set_id: "s1".into(),
            }),
            Call::UpdateUserSelection(1, Some(label(0))),
        ]
    );
}

#[tokio::test]
async fn saved_selections_are_restored_on_load() {
    let mut answered = question(2, 1);
    answered.user_selected_option = Some(label(1));
    let backend = Arc::new(MockBackend::new().with_quiz_set(
        "s1",
        "Circuits",
        vec![question(1, 0), answered],
    ));

    let session = loaded_session(&backend).await;
    assert_eq!(session.running_score(), 1);
    assert!(session.navigator().question(2).unwrap().is_correct());
    assert!(!session.navigator().question(1).unwrap().is_answered());
}

#[tokio::test]
async fn stale_snapshot_is_discarded_after_switch() {
    let backend = Arc::new(
        MockBackend::new()
            .with_quiz_set("a", "A", vec![question(1, 0)])
            .with_quiz_set("b", "B", vec![question(2, 0), question(3, 1)]),
    );
    let mut session = QuizSession::new(backend.clone(), "a");

    let stale = session.fetch_snapshot().await;
    session.switch_to("b");
    assert!(!session.apply_snapshot(stale));
    assert!(session.navigator().questions().is_empty());

    assert!(session.load().await);
    assert_eq!(session.navigator().view_ids(), vec![2, 3]);
}

#[tokio::test]
async fn shuffled_options_keep_correct_content() {
    let backend = three_question_backend();
    let mut session = loaded_session(&backend).await;
    let correct: Vec<(QuestionId, String)> = session
        .navigator()
        .questions()
        .iter()
        .map(|q| (q.id, q.correct_option().unwrap().to_string()))
        .collect();

    assert!(session.set_options_shuffled(true).await);
    assert!(session.shuffle_questions().await);

    let questions = session.navigator().questions();
    assert_eq!(
        questions.iter().map(|q| q.id).collect::<Vec<_>>(),
        vec![3, 2, 1]
    );
    for (id, text) in &correct {
        let q = session.navigator().question(*id).unwrap();
        assert_eq!(q.correct_option(), Some(text.as_str()));
    }
    assert_eq!(session.navigator().cursor(), 0);
    assert_eq!(session.running_score(), 0);

    // refetching while the toggle is on reshuffles again
    assert!(session.load().await);
    for (id, text) in &correct {
        let q = session.navigator().question(*id).unwrap();
        assert_eq!(q.correct_option(), Some(text.as_str()));
    }

    assert!(session.set_options_shuffled(false).await);
    let q1 = session.navigator().question(1).unwrap();
    assert_eq!(q1.options, vec!["1-a", "1-b", "1-c", "1-d"]);
}

#[tokio::test]
async fn shuffled_selection_is_saved_under_canonical_label() {
    for seed in 0..20 {
        let backend = three_question_backend();
        let mut session = QuizSession::new(backend.clone(), "s1").with_rng_seed(seed);
        assert!(session.load().await);
        assert!(session.set_options_shuffled(true).await);
        // a second shuffle on top of the first
        assert!(session.set_options_shuffled(true).await);

        for number in 0..3 {
            session.navigator_mut().go_to(number);
            let answer = session.current().unwrap().answer.index();
            let selection = session.select_option(Some(answer)).await.unwrap();
            assert_eq!(selection.score_delta, 1, "seed {seed}");
        }
        assert_eq!(backend.selection(1), Some(label(0)), "seed {seed}");
        assert_eq!(backend.selection(2), Some(label(1)), "seed {seed}");
        assert_eq!(backend.selection(3), Some(label(2)), "seed {seed}");

        assert!(session.load().await);
        assert!(
            session.navigator().questions().iter().all(|q| q.is_correct()),
            "seed {seed}"
        );
        assert_eq!(session.running_score(), 3);

        assert!(session.set_options_shuffled(false).await);
        assert!(
            session.navigator().questions().iter().all(|q| q.is_correct()),
            "seed {seed}"
        );
    }
}

#[tokio::test]
async fn options_shuffled_from_first_load() {
    let backend = three_question_backend();
    backend
        .update_user_selection(2, Some(label(3)))
        .await
        .unwrap();

    let mut session = QuizSession::new(backend.clone(), "s1")
        .with_rng_seed(3)
        .with_options_shuffled(true);
    assert!(session.load().await);
    assert!(session.options_shuffled());

    let q2 = session.navigator().question(2).unwrap();
    assert_eq!(q2.option(q2.user_selected_option.unwrap()), Some("2-d"));
    assert_eq!(q2.correct_option(), Some("2-b"));
}

#[tokio::test]
async fn reset_clears_everything_and_rewinds() {
    let backend = three_question_backend();
    let mut session = loaded_session(&backend).await;
    session.navigator_mut().go_to(2);
    session.select_option(Some(2)).await.unwrap();

    assert!(session.reset().await);
    assert_eq!(session.navigator().cursor(), 0);
    assert_eq!(session.running_score(), 0);
    assert!(session
        .navigator()
        .questions()
        .iter()
        .all(|q| !q.is_answered()));
    assert_eq!(backend.selection(3), None);
}

#[tokio::test]
async fn failed_selection_save_keeps_local_state() {
    let backend = three_question_backend();
    let mut session = loaded_session(&backend).await;
    backend.fail("update_user_selection");

    let selection = session.select_option(Some(0)).await.unwrap();
    assert_eq!(selection.current, Some(label(0)));
    assert!(session.current().unwrap().is_correct());
    assert_eq!(backend.selection(1), None);
}

#[tokio::test]
async fn favorites_and_answer_visibility() {
    let backend = Arc::new(
        MockBackend::new()
            .with_quiz_set("s1", "Circuits", vec![question(1, 0), question(2, 1)])
            .with_favorites(&[2]),
    );
    let mut session = loaded_session(&backend).await;

    session.navigator_mut().set_filter(QuestionFilter::Favorites);
    assert_eq!(session.navigator().view_ids(), vec![2]);

    session.navigator_mut().set_filter(QuestionFilter::All);
    assert_eq!(session.toggle_favorite().await, Some(true));
    assert!(session.navigator().is_favorite(1));

    backend.fail("toggle_favorite");
    assert_eq!(session.toggle_favorite().await, None);
    assert!(session.navigator().is_favorite(1));

    assert!(session.answers_visible());
    assert_eq!(session.toggle_answers_visible().await, Some(false));
    let reloaded = loaded_session(&backend).await;
    assert!(!reloaded.answers_visible());
}

#[tokio::test]
async fn further_explanation_prefers_saved_copy() {
    let backend = Arc::new(
        MockBackend::new()
            .with_quiz_set("s1", "Circuits", vec![question(1, 0), question(2, 1)])
            .with_saved_explanation(1, "Saved **answer**.")
            .with_generated_explanation("Fresh take."),
    );
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut session = QuizSession::new(backend.clone(), "s1").with_store(store.clone());
    assert!(session.load().await);

    let saved = session.further_explanation(1, false).await.unwrap();
    assert!(saved.contains("<strong>answer</strong>"));
    assert!(backend.calls_to("generate_further_explanation").is_empty());

    let generated = session.further_explanation(2, false).await.unwrap();
    assert!(generated.contains("Fresh take."));
    assert_eq!(backend.saved_explanation(2).as_deref(), Some("Fresh take."));

    let regenerated = session.further_explanation(1, true).await.unwrap();
    assert!(regenerated.contains("Fresh take."));
    assert_eq!(backend.calls_to("generate_further_explanation").len(), 2);

    // the loading flag is cleared once the call finishes
    assert!(store.get(&athena_core::storage::loading_key(1)).unwrap().is_none());
}

#[tokio::test]
async fn discussion_comments_are_parsed() {
    let backend = Arc::new(
        MockBackend::new()
            .with_quiz_set("s1", "Circuits", vec![question(1, 0)])
            .with_comments(
                1,
                "maria said: 3 days ago: Option A is right.\nnot a comment\n",
            ),
    );
    let session = loaded_session(&backend).await;

    let comments = session.discussion_comments(1).await;
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].username, "maria");
    assert_eq!(comments[0].text, "Option A is right.");
    assert!(session.discussion_comments(99).await.is_empty());
}

#[tokio::test]
async fn dashboard_skips_sets_that_fail_to_load() {
    let backend = Arc::new(
        MockBackend::new()
            .with_quiz_set("a", "Alpha", vec![question(1, 0)])
            .with_quiz_set("b", "Beta", vec![question(2, 0)]),
    );
    backend.fail("get_quiz_set_details:b");

    let mut dashboard = Dashboard::new(
        backend.clone(),
        Arc::new(MemoryStore::new()),
        LockState::default(),
    );
    let sets = dashboard.load().await;
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].title, "Alpha");
    assert_eq!(sets[0].urls, vec!["https://bank.example/quiz/1"]);
}

#[tokio::test]
async fn dashboard_lock_toggles_refresh_from_backend() {
    let backend = Arc::new(MockBackend::new().with_quiz_set("a", "Alpha", vec![question(1, 0)]));
    let lock = LockState::default();
    let mut dashboard = Dashboard::new(backend.clone(), Arc::new(MemoryStore::new()), lock.clone());
    dashboard.load().await;
    assert!(lock.is_locked().await);

    assert_eq!(dashboard.toggle_global_lock().await, Some(false));
    assert!(!lock.is_locked().await);

    assert_eq!(dashboard.toggle_lock("a").await, Some(true));
    assert!(dashboard.quiz_set("a").unwrap().lock_state);

    backend.fail("toggle_lock_state");
    assert_eq!(dashboard.toggle_global_lock().await, None);
    assert!(!lock.is_locked().await);
}

#[tokio::test]
async fn dashboard_rename_delete_and_checkboxes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let backend = Arc::new(
        MockBackend::new()
            .with_quiz_set("a", "Alpha", vec![question(1, 0)])
            .with_quiz_set("b", "Beta", vec![question(2, 0)]),
    );

    {
        let store = Arc::new(JsonFileStore::open(&path).unwrap());
        let mut dashboard = Dashboard::new(backend.clone(), store, LockState::default());
        dashboard.load().await;
        assert_eq!(dashboard.select_all_state(), SelectAll::None);
        dashboard.set_checked("a", true);
        assert_eq!(dashboard.select_all_state(), SelectAll::Some);

        assert!(dashboard.rename("b", "  Beta II ").await.unwrap());
        assert_eq!(dashboard.quiz_set("b").unwrap().title, "Beta II");
        assert!(dashboard.rename("b", "   ").await.is_err());
    }

    let store = Arc::new(JsonFileStore::open(&path).unwrap());
    let mut dashboard = Dashboard::new(backend.clone(), store, LockState::default());
    dashboard.load().await;
    assert!(dashboard.is_checked("a"));
    assert_eq!(dashboard.quiz_set("b").unwrap().title, "Beta II");

    assert!(dashboard.delete("a").await);
    assert!(!dashboard.is_checked("a"));
    assert_eq!(dashboard.quiz_sets().len(), 1);
    assert!(!dashboard.delete("missing").await);
}

#[tokio::test]
async fn notes_prefer_local_copy() {
    let backend = MockBackend::new().with_editor_content("remote notes");

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut editor = NotesEditor::new(store.clone());
    assert_eq!(editor.load(&backend).await.unwrap(), "remote notes");

    store.set(EDITOR_CONTENT_KEY, "local notes").unwrap();
    let mut editor = NotesEditor::new(store.clone());
    assert_eq!(editor.load(&backend).await.unwrap(), "local notes");

    assert!(editor.save("ohm's law", &backend).await.unwrap());
    assert_eq!(backend.editor_content().as_deref(), Some("ohm's law"));
    assert_eq!(
        store.get(EDITOR_CONTENT_KEY).unwrap().as_deref(),
        Some("ohm's law")
    );
}

#[tokio::test]
async fn scraping_validates_before_calling_backend() {
    use athena_core::error::{ScrapeError, ValidationError};
    use athena_core::scrape::start_scraping;

    let backend = MockBackend::new();
    let err = start_scraping(&backend, " ", "https://www.sanfoundry.com/a/")
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::Invalid(ValidationError::EmptyTitle)));
    assert!(backend.calls().is_empty());

    let response = start_scraping(
        &backend,
        "Circuits",
        "https://www.sanfoundry.com/a/\nhttps://www.examveda.com/b, start_page=1",
    )
    .await
    .unwrap();
    let calls = backend.calls();
    let Call::StartScraping(request) = &calls[0] else {
        panic!("expected a scrape call");
    };
    assert_eq!(request.urls.len(), 2);

    let mut dashboard = Dashboard::new(
        Arc::new(backend),
        Arc::new(MemoryStore::new()),
        LockState::default(),
    );
    dashboard.load().await;
    assert_eq!(
        dashboard.quiz_set(&response.quiz_set_id).unwrap().title,
        "Circuits"
    );
}
