use shelf_core::{
    update, AppState, DeckView, Effect, Flashcard, FlashcardsView, JobState, JobStatus, Msg,
    Payload, SessionId, Surface, TrackedJob,
};

fn init_logging() {
    shelf_logging::initialize_for_tests();
}

fn card(question: &str, answer: &str) -> Flashcard {
    Flashcard {
        question: question.to_string(),
        answer: answer.to_string(),
    }
}

/// Opens the flashcards surface and resolves the mount probe with `cards`.
fn open_with_deck(cards: Vec<Flashcard>) -> AppState {
    let (state, effects) = update(
        AppState::new(),
        Msg::SurfaceOpened {
            surface: Surface::Flashcards,
            document_id: "doc-7".to_string(),
        },
    );
    let probe: SessionId = effects[0].session();
    let (state, effects) = update(
        state,
        Msg::StatusFetched {
            session: probe,
            job: TrackedJob::flashcards("doc-7"),
            result: Ok(JobStatus::ready(Payload::Flashcards(cards))),
        },
    );
    assert!(effects.is_empty());
    state
}

fn deck(state: &AppState) -> DeckView {
    match state.view().flashcards {
        FlashcardsView::Content(deck) => deck,
        other => panic!("expected deck, got {other:?}"),
    }
}

#[test]
fn empty_deck_survives_navigation() {
    init_logging();
    let mut state = open_with_deck(Vec::new());

    for msg in [
        Msg::NextCardClicked,
        Msg::PrevCardClicked,
        Msg::FlipCardClicked,
        Msg::NextCardClicked,
    ] {
        let (next, effects) = update(state, msg);
        assert!(effects.is_empty());
        state = next;
    }

    let deck = deck(&state);
    assert_eq!(deck.card, None);
    assert_eq!(deck.position, 0);
    assert_eq!(deck.total, 0);
    assert!(!deck.has_prev);
    assert!(!deck.has_next);
}

#[test]
fn single_card_deck_disables_both_directions() {
    init_logging();
    let state = open_with_deck(vec![card("Q1", "A1")]);

    let view = deck(&state);
    assert_eq!(view.position, 1);
    assert_eq!(view.total, 1);
    assert!(!view.has_prev);
    assert!(!view.has_next);

    let (state, _) = update(state, Msg::NextCardClicked);
    let (state, _) = update(state, Msg::PrevCardClicked);
    assert_eq!(deck(&state).position, 1);
}

#[test]
fn navigation_is_bounded_and_hides_answer() {
    init_logging();
    let state = open_with_deck(vec![card("Q1", "A1"), card("Q2", "A2"), card("Q3", "A3")]);

    let (state, _) = update(state, Msg::FlipCardClicked);
    let view = deck(&state);
    assert!(view.card.as_ref().is_some_and(|c| c.showing_answer));
    assert!(!view.has_prev);
    assert!(view.has_next);

    let (state, _) = update(state, Msg::NextCardClicked);
    let view = deck(&state);
    let current = view.card.expect("card");
    assert_eq!(current.question, "Q2");
    assert!(!current.showing_answer);
    assert_eq!(view.position, 2);

    let (state, _) = update(state, Msg::NextCardClicked);
    let (mut state, _) = update(state, Msg::NextCardClicked);
    let view = deck(&state);
    assert_eq!(view.position, 3);
    assert!(view.has_prev);
    assert!(!view.has_next);
    assert!(state.consume_dirty());

    let (state, _) = update(state, Msg::PrevCardClicked);
    assert_eq!(deck(&state).card.map(|c| c.answer), Some("A2".to_string()));
}

#[test]
fn generate_resets_position_and_polls_at_two_seconds() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::SurfaceOpened {
            surface: Surface::Flashcards,
            document_id: "doc-7".to_string(),
        },
    );
    let probe = effects[0].session();
    let (state, _) = update(
        state,
        Msg::StatusFetched {
            session: probe,
            job: TrackedJob::flashcards("doc-7"),
            result: Ok(JobStatus::new(JobState::NotGenerated)),
        },
    );
    assert_eq!(state.view().flashcards, FlashcardsView::Empty);

    let (state, effects) = update(
        state,
        Msg::GenerateClicked {
            surface: Surface::Flashcards,
        },
    );
    let session = effects[0].session();
    let (state, _) = update(
        state,
        Msg::TriggerCompleted {
            session,
            job: TrackedJob::flashcards("doc-7"),
            result: Ok(JobStatus::new(JobState::Queued)),
        },
    );
    let (state, effects) = update(
        state,
        Msg::StatusFetched {
            session,
            job: TrackedJob::flashcards("doc-7"),
            result: Ok(JobStatus::new(JobState::Processing)),
        },
    );
    assert!(matches!(
        effects.as_slice(),
        [Effect::ArmTimer { interval, .. }] if interval.as_millis() == 2000
    ));
    assert!(matches!(
        state.view().flashcards,
        FlashcardsView::Loading {
            stage: Some(JobState::Processing)
        }
    ));
}

#[test]
fn timeout_message_is_specific_to_flashcards() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::SurfaceOpened {
            surface: Surface::Flashcards,
            document_id: "doc-7".to_string(),
        },
    );
    let session = effects[0].session();
    let job = TrackedJob::flashcards("doc-7");
    let (mut state, _) = update(
        state,
        Msg::StatusFetched {
            session,
            job: job.clone(),
            result: Ok(JobStatus::new(JobState::Queued)),
        },
    );

    while matches!(state.view().flashcards, FlashcardsView::Loading { .. }) {
        let (next, _) = update(
            state,
            Msg::TimerFired {
                session,
                job: job.clone(),
            },
        );
        let (next, _) = update(
            next,
            Msg::StatusFetched {
                session,
                job: job.clone(),
                result: Ok(JobStatus::new(JobState::Queued)),
            },
        );
        state = next;
    }

    match state.view().flashcards {
        FlashcardsView::Error(error) => {
            assert_eq!(error.message, "Flashcard generation timed out.");
            assert!(error.can_retry);
        }
        other => panic!("expected error view, got {other:?}"),
    }
}
