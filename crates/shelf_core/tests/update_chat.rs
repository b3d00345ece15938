use std::time::Duration;

use pretty_assertions::assert_eq;
use shelf_core::{
    update, AppState, ChatMessageView, Effect, JobState, JobStatus, Msg, Payload, Role,
    SessionId, Surface, TrackedJob, TransportError, TransportErrorKind, GREETING, NOT_FOUND_TEXT,
    QUICK_PROMPTS, TIMED_OUT_TEXT,
};

fn init_logging() {
    shelf_logging::initialize_for_tests();
}

fn open_chat() -> AppState {
    let (state, effects) = update(
        AppState::new(),
        Msg::SurfaceOpened {
            surface: Surface::Chat,
            document_id: "doc-1".to_string(),
        },
    );
    assert!(effects.is_empty());
    state
}

/// Submits `question` and resolves its trigger with `queued`. Returns the
/// session id now polling for the answer.
fn ask(state: AppState, question: &str) -> (AppState, SessionId) {
    let (state, effects) = update(state, Msg::QuestionSubmitted(question.to_string()));
    let session = match effects.as_slice() {
        [Effect::Trigger { session, job }] => {
            assert_eq!(job, &TrackedJob::answer("doc-1", question));
            *session
        }
        other => panic!("expected one trigger, got {other:?}"),
    };
    let (state, effects) = update(
        state,
        Msg::TriggerCompleted {
            session,
            job: TrackedJob::answer("doc-1", question),
            result: Ok(JobStatus::new(JobState::Queued)),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::FetchStatus {
            session,
            job: TrackedJob::answer("doc-1", question),
        }]
    );
    (state, session)
}

fn answer_with(
    state: AppState,
    session: SessionId,
    question: &str,
    result: Result<JobStatus, TransportError>,
) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusFetched {
            session,
            job: TrackedJob::answer("doc-1", question),
            result,
        },
    )
}

fn tick(state: AppState, session: SessionId, question: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::TimerFired {
            session,
            job: TrackedJob::answer("doc-1", question),
        },
    )
}

fn last_message(state: &AppState) -> ChatMessageView {
    state
        .view()
        .chat
        .messages
        .last()
        .cloned()
        .expect("at least one message")
}

#[test]
fn chat_opens_with_greeting_and_prompts() {
    init_logging();
    let state = open_chat();
    let view = state.view().chat;

    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].role, Role::Assistant);
    assert_eq!(view.messages[0].content, GREETING);
    assert_eq!(view.quick_prompts.len(), QUICK_PROMPTS.len());
    assert_eq!(view.pending_answers, 0);
}

#[test]
fn blank_question_is_ignored() {
    init_logging();
    let state = open_chat();
    let (state, effects) = update(state, Msg::QuestionSubmitted("   ".to_string()));

    assert!(effects.is_empty());
    assert_eq!(state.view().chat.messages.len(), 1);
}

#[test]
fn not_found_shows_fixed_text_not_an_error() {
    init_logging();
    let question = "What is X?";
    let (state, session) = ask(open_chat(), question);

    let (state, effects) =
        answer_with(state, session, question, Ok(JobStatus::new(JobState::Processing)));
    assert_eq!(
        effects,
        vec![Effect::ArmTimer {
            session,
            job: TrackedJob::answer("doc-1", question),
            interval: Duration::from_millis(1000),
        }]
    );
    assert!(last_message(&state).pending);

    let (state, _) = tick(state, session, question);
    let (state, _) = answer_with(state, session, question, Ok(JobStatus::new(JobState::Processing)));
    let (state, _) = tick(state, session, question);
    let (state, effects) =
        answer_with(state, session, question, Ok(JobStatus::new(JobState::NotFound)));

    assert_eq!(effects, vec![Effect::DisarmTimer { session }]);
    let message = last_message(&state);
    assert_eq!(message.content, NOT_FOUND_TEXT);
    assert!(!message.pending);
    assert!(!message.can_retry);
    assert_eq!(state.view().chat.pending_answers, 0);
}

#[test]
fn concurrent_questions_progress_independently() {
    init_logging();
    let (state, first) = ask(open_chat(), "What is X?");
    let (state, second) = ask(state, "What is Y?");
    assert_ne!(first, second);

    let (state, _) = answer_with(state, first, "What is X?", Ok(JobStatus::new(JobState::Queued)));
    let (state, _) = answer_with(state, second, "What is Y?", Ok(JobStatus::new(JobState::Queued)));

    let (state, _) = tick(state, first, "What is X?");
    let (state, _) = answer_with(state, first, "What is X?", Ok(JobStatus::new(JobState::Processing)));
    let (state, _) = tick(state, first, "What is X?");
    let (state, _) = tick(state, second, "What is Y?");
    assert_eq!(state.session_attempts(first), Some(2));
    assert_eq!(state.session_attempts(second), Some(1));

    let (state, effects) = answer_with(
        state,
        first,
        "What is X?",
        Ok(JobStatus::ready(Payload::Answer("X is a letter.".to_string()))),
    );
    assert_eq!(effects, vec![Effect::DisarmTimer { session: first }]);
    assert_eq!(state.session_attempts(first), None);
    assert_eq!(state.session_attempts(second), Some(1));
    assert_eq!(state.view().active_sessions, vec![second]);

    let messages = state.view().chat.messages;
    let answers: Vec<_> = messages
        .iter()
        .filter(|msg| msg.role == Role::Assistant)
        .map(|msg| (msg.content.as_str(), msg.pending))
        .collect();
    assert_eq!(
        answers,
        vec![(GREETING, false), ("X is a letter.", false), ("", true)]
    );
}

#[test]
fn question_text_identity_is_exact() {
    init_logging();
    let (state, first) = ask(open_chat(), "What is X?");

    let (state, effects) = update(state, Msg::QuestionSubmitted("What is X?".to_string()));
    assert!(effects.is_empty(), "identical pending question is not re-triggered");

    let (state, second) = ask(state, "What is X? ");
    assert_ne!(first, second);
    assert_eq!(state.view().chat.pending_answers, 2);
}

#[test]
fn timed_out_answer_can_be_retried() {
    init_logging();
    let question = "Quiz me on this";
    let (mut state, session) = ask(open_chat(), question);
    let (next, _) = answer_with(state, session, question, Ok(JobStatus::new(JobState::Queued)));
    state = next;

    while last_message(&state).pending {
        let (next, _) = tick(state, session, question);
        let (next, _) = answer_with(
            next,
            session,
            question,
            Err(TransportError::new(TransportErrorKind::Timeout, "slow")),
        );
        state = next;
    }

    let message = last_message(&state);
    assert_eq!(message.content, TIMED_OUT_TEXT);
    assert!(message.can_retry);

    let (state, effects) = update(
        state,
        Msg::RetryQuestionClicked {
            message_id: message.id,
        },
    );
    assert!(matches!(effects.as_slice(), [Effect::Trigger { job, .. }] if job.question.as_deref() == Some(question)));
    assert!(last_message(&state).pending);
}

#[test]
fn closing_chat_cancels_every_polling_session() {
    init_logging();
    let (state, first) = ask(open_chat(), "A?");
    let (state, second) = ask(state, "B?");
    let (state, _) = answer_with(state, first, "A?", Ok(JobStatus::new(JobState::Queued)));
    let (state, _) = answer_with(state, second, "B?", Ok(JobStatus::new(JobState::Queued)));

    let (state, effects) = update(
        state,
        Msg::SurfaceClosed {
            surface: Surface::Chat,
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::DisarmTimer { session: first },
            Effect::DisarmTimer { session: second },
        ]
    );

    let (state, effects) = tick(state, first, "A?");
    assert!(effects.is_empty());
    assert!(state.view().chat.messages.is_empty());
    assert!(state.view().active_sessions.is_empty());
}

#[test]
fn failed_trigger_reports_send_failure() {
    init_logging();
    let state = open_chat();
    let (state, effects) = update(state, Msg::QuestionSubmitted("Why?".to_string()));
    let session = effects[0].session();

    let (state, _) = update(
        state,
        Msg::TriggerCompleted {
            session,
            job: TrackedJob::answer("doc-1", "Why?"),
            result: Err(TransportError::new(
                TransportErrorKind::HttpStatus(502),
                "Bad Gateway",
            )),
        },
    );

    let message = last_message(&state);
    assert_eq!(message.content, shelf_core::SEND_FAILED_TEXT);
    assert!(message.can_retry);
}

#[test]
fn retry_is_ignored_while_the_same_question_is_asked_again() {
    init_logging();
    let question = "What is X?";
    let (state, first) = ask(open_chat(), question);
    let (state, _) = answer_with(state, first, question, Ok(JobStatus::new(JobState::Failed)));
    let failed = last_message(&state);
    assert!(failed.can_retry);

    let (state, second) = ask(state, question);
    let (state, effects) = update(
        state,
        Msg::RetryQuestionClicked {
            message_id: failed.id,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().active_sessions, vec![second]);

    let (state, _) = answer_with(
        state,
        second,
        question,
        Ok(JobStatus::ready(Payload::Answer("X is Y.".to_string()))),
    );
    let (_, effects) = update(
        state,
        Msg::RetryQuestionClicked {
            message_id: failed.id,
        },
    );
    assert!(matches!(effects.as_slice(), [Effect::Trigger { job, .. }] if job == &TrackedJob::answer("doc-1", question)));
}
