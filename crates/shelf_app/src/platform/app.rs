use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use shelf_core::{update, AppState, AppViewModel, FlashcardsView, Msg, Surface, SummaryView};
use shelf_logging::{shelf_debug, shelf_info};

use super::effects::EffectRunner;
use super::render;

const RECV_SLICE: Duration = Duration::from_millis(250);

/// Owns the core state for one command and feeds it engine events until
/// every surface has settled.
pub(crate) struct SurfaceDriver {
    state: AppState,
    runner: EffectRunner,
    /// Longest silence from the engine tolerated while a surface is loading.
    stall_limit: Duration,
    last_progress: Option<String>,
}

impl SurfaceDriver {
    pub(crate) fn new(runner: EffectRunner, stall_limit: Duration) -> Self {
        Self {
            state: AppState::new(),
            runner,
            stall_limit,
            last_progress: None,
        }
    }

    pub(crate) fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub(crate) fn send(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut next, effects) = update(state, msg);
        if !effects.is_empty() {
            self.runner.run(effects);
        }
        if next.consume_dirty() {
            self.report_progress(&next.view());
        }
        self.state = next;
    }

    /// Pumps engine events into `update` until no surface is loading.
    pub(crate) fn settle(&mut self) -> Result<()> {
        let mut last_event = Instant::now();
        while self.state.view().is_busy() {
            match self.runner.next_msg(RECV_SLICE) {
                Some(msg) => {
                    last_event = Instant::now();
                    self.send(msg);
                }
                None if last_event.elapsed() > self.stall_limit => {
                    bail!("no response from the backend for {:?}", self.stall_limit);
                }
                None => {}
            }
        }
        shelf_debug!("surfaces settled");
        Ok(())
    }

    fn report_progress(&mut self, view: &AppViewModel) {
        let line = match (&view.summary, &view.flashcards) {
            (SummaryView::Loading { stage }, _) => {
                Some(format!("summary: {}", render::stage_label(*stage)))
            }
            (_, FlashcardsView::Loading { stage }) => {
                Some(format!("flashcards: {}", render::stage_label(*stage)))
            }
            _ if view.chat.pending_answers > 0 => {
                Some(format!("waiting for {} answer(s)", view.chat.pending_answers))
            }
            _ => None,
        };
        if line.is_some() && line != self.last_progress {
            if let Some(text) = &line {
                eprintln!("{text}");
            }
        }
        self.last_progress = line;
    }
}

pub(crate) fn summary(
    driver: &mut SurfaceDriver,
    document_id: &str,
    generate: bool,
) -> Result<String> {
    open(driver, Surface::Summary, document_id)?;
    if generate {
        match driver.view().summary {
            SummaryView::Empty => driver.send(Msg::GenerateClicked {
                surface: Surface::Summary,
            }),
            SummaryView::Error(_) => driver.send(Msg::RetryClicked {
                surface: Surface::Summary,
            }),
            _ => {}
        }
        driver.settle()?;
    }
    let out = render::summary(&driver.view().summary);
    driver.send(Msg::SurfaceClosed {
        surface: Surface::Summary,
    });
    Ok(out)
}

/// Walks the whole deck with the card controls, printing each card flipped.
pub(crate) fn flashcards(
    driver: &mut SurfaceDriver,
    document_id: &str,
    generate: bool,
) -> Result<String> {
    open(driver, Surface::Flashcards, document_id)?;
    if generate {
        match driver.view().flashcards {
            FlashcardsView::Empty => driver.send(Msg::GenerateClicked {
                surface: Surface::Flashcards,
            }),
            FlashcardsView::Error(_) => driver.send(Msg::RetryClicked {
                surface: Surface::Flashcards,
            }),
            _ => {}
        }
        driver.settle()?;
    }

    let view = driver.view().flashcards;
    let out = match render::flashcards_status(&view) {
        Some(status) => status,
        None => {
            let mut out = String::new();
            loop {
                driver.send(Msg::FlipCardClicked);
                let FlashcardsView::Content(deck) = driver.view().flashcards else {
                    break;
                };
                out.push_str(&render::card(&deck));
                if !deck.has_next {
                    break;
                }
                driver.send(Msg::NextCardClicked);
            }
            out
        }
    };
    driver.send(Msg::SurfaceClosed {
        surface: Surface::Flashcards,
    });
    Ok(out)
}

/// Asks every question at once and prints the transcript when all have
/// been answered.
pub(crate) fn ask(
    driver: &mut SurfaceDriver,
    document_id: &str,
    questions: &[String],
) -> Result<String> {
    driver.send(Msg::SurfaceOpened {
        surface: Surface::Chat,
        document_id: document_id.to_string(),
    });
    for question in questions {
        driver.send(Msg::QuestionSubmitted(question.clone()));
    }
    shelf_info!("asked {} question(s) about {}", questions.len(), document_id);
    driver.settle()?;
    let out = render::chat(&driver.view().chat);
    driver.send(Msg::SurfaceClosed {
        surface: Surface::Chat,
    });
    Ok(out)
}

fn open(driver: &mut SurfaceDriver, surface: Surface, document_id: &str) -> Result<()> {
    driver.send(Msg::SurfaceOpened {
        surface,
        document_id: document_id.to_string(),
    });
    driver.settle()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;
    use shelf_client::JobClient;
    use shelf_core::{
        Flashcard, JobState, JobStatus, Payload, TrackedJob, TransportError, TransportErrorKind,
    };

    use super::*;

    /// Answers triggers and status reads from fixed queues.
    struct FakeBackend {
        triggers: Mutex<VecDeque<JobStatus>>,
        statuses: Mutex<VecDeque<JobStatus>>,
    }

    impl FakeBackend {
        fn new(triggers: Vec<JobStatus>, statuses: Vec<JobStatus>) -> Arc<Self> {
            Arc::new(Self {
                triggers: Mutex::new(triggers.into()),
                statuses: Mutex::new(statuses.into()),
            })
        }
    }

    fn exhausted() -> TransportError {
        TransportError::new(TransportErrorKind::Network, "no scripted response")
    }

    #[async_trait::async_trait]
    impl JobClient for FakeBackend {
        async fn trigger(&self, _job: &TrackedJob) -> Result<JobStatus, TransportError> {
            self.triggers.lock().unwrap().pop_front().ok_or_else(exhausted)
        }

        async fn fetch_status(&self, _job: &TrackedJob) -> Result<JobStatus, TransportError> {
            self.statuses.lock().unwrap().pop_front().ok_or_else(exhausted)
        }
    }

    fn driver(backend: Arc<FakeBackend>) -> SurfaceDriver {
        shelf_logging::initialize_for_tests();
        SurfaceDriver::new(EffectRunner::new(backend).unwrap(), Duration::from_secs(5))
    }

    #[test]
    fn summary_generate_runs_until_content() {
        let backend = FakeBackend::new(
            vec![JobStatus::new(JobState::Queued)],
            vec![
                JobStatus::new(JobState::NotGenerated),
                JobStatus::ready(Payload::Summary("Line1\nLine2".to_string())),
            ],
        );
        let mut driver = driver(backend);

        let out = summary(&mut driver, "doc-1", true).unwrap();

        assert_eq!(out, "Line1\nLine2\n");
        assert!(driver.view().active_sessions.is_empty());
    }

    #[test]
    fn summary_without_generate_reports_empty() {
        let backend = FakeBackend::new(Vec::new(), vec![JobStatus::new(JobState::NotGenerated)]);
        let mut driver = driver(backend);

        let out = summary(&mut driver, "doc-1", false).unwrap();

        assert_eq!(out, "No summary yet. Use --generate to create one.\n");
    }

    #[test]
    fn flashcards_walk_every_card() {
        let cards = vec![
            Flashcard {
                question: "Q1".to_string(),
                answer: "A1".to_string(),
            },
            Flashcard {
                question: "Q2".to_string(),
                answer: "A2".to_string(),
            },
        ];
        let backend =
            FakeBackend::new(Vec::new(), vec![JobStatus::ready(Payload::Flashcards(cards))]);
        let mut driver = driver(backend);

        let out = flashcards(&mut driver, "doc-1", false).unwrap();

        assert_eq!(
            out,
            "[1 / 2] Q: Q1\n        A: A1\n[2 / 2] Q: Q2\n        A: A2\n"
        );
    }

    #[test]
    fn ask_prints_transcript_after_answers_arrive() {
        let backend = FakeBackend::new(
            vec![JobStatus::ready(Payload::Answer("Because.".to_string()))],
            Vec::new(),
        );
        let mut driver = driver(backend);

        let out = ask(&mut driver, "doc-1", &["Why?".to_string()]).unwrap();

        assert!(out.ends_with("You: Why?\nAssistant: Because.\n"), "{out}");
    }
}
