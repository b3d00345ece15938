use shelf_logging::shelf_debug;

use crate::{AppState, Effect, JobKind, Msg, Surface};

/// Pure update function: applies a message to state and returns any effects.
///
/// This is the only place poll state changes, so timer fires, backend
/// replies and user actions are applied strictly one after another.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let before = state.view();
    let effects = match msg {
        Msg::SurfaceOpened {
            surface,
            document_id,
        } => {
            let ids = &mut state.sessions;
            match surface {
                Surface::Summary => state.summary.mount(&document_id, ids),
                Surface::Flashcards => state.flashcards.mount(&document_id, ids),
                Surface::Chat => state.chat.mount(&document_id),
            }
        }
        Msg::SurfaceClosed { surface } => match surface {
            Surface::Summary => state.summary.unmount(),
            Surface::Flashcards => state.flashcards.unmount(),
            Surface::Chat => state.chat.unmount(),
        },
        Msg::GenerateClicked { surface } => match surface {
            Surface::Summary => state.summary.generate(&mut state.sessions),
            Surface::Flashcards => state.flashcards.generate(&mut state.sessions),
            Surface::Chat => Vec::new(),
        },
        Msg::RetryClicked { surface } => match surface {
            Surface::Summary => state.summary.retry(&mut state.sessions),
            Surface::Flashcards => state.flashcards.retry(&mut state.sessions),
            Surface::Chat => Vec::new(),
        },
        Msg::NextCardClicked => {
            state.flashcards.next_card();
            Vec::new()
        }
        Msg::PrevCardClicked => {
            state.flashcards.prev_card();
            Vec::new()
        }
        Msg::FlipCardClicked => {
            state.flashcards.flip_card();
            Vec::new()
        }
        Msg::QuestionSubmitted(question) => state.chat.submit(&question, &mut state.sessions),
        Msg::RetryQuestionClicked { message_id } => {
            state.chat.retry(message_id, &mut state.sessions)
        }
        Msg::TriggerCompleted {
            session,
            job,
            result,
        } => match job.kind {
            JobKind::Summary => state.summary.on_triggered(session, result),
            JobKind::Flashcards => state.flashcards.on_triggered(session, result),
            JobKind::Answer => state.chat.on_triggered(session, result),
        },
        Msg::StatusFetched {
            session,
            job,
            result,
        } => match job.kind {
            JobKind::Summary => state.summary.on_status(session, result),
            JobKind::Flashcards => state.flashcards.on_status(session, result),
            JobKind::Answer => state.chat.on_status(session, result),
        },
        Msg::TimerFired { session, job } => match job.kind {
            JobKind::Summary => state.summary.on_tick(session),
            JobKind::Flashcards => state.flashcards.on_tick(session),
            JobKind::Answer => state.chat.on_tick(session),
        },
        Msg::NoOp => Vec::new(),
    };

    let after = state.view();
    if after.summary != before.summary
        || after.flashcards != before.flashcards
        || after.chat != before.chat
    {
        state.mark_dirty();
    }
    if !effects.is_empty() {
        shelf_debug!("update produced {} effects", effects.len());
    }

    (state, effects)
}
