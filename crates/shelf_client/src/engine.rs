use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use shelf_core::{SessionId, TrackedJob};
use shelf_logging::{shelf_debug, shelf_trace, shelf_warn};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::JobClient;
use crate::EngineEvent;

enum EngineCommand {
    Trigger {
        session: SessionId,
        job: TrackedJob,
    },
    FetchStatus {
        session: SessionId,
        job: TrackedJob,
    },
    ArmTimer {
        session: SessionId,
        job: TrackedJob,
        interval: Duration,
    },
    DisarmTimer {
        session: SessionId,
    },
}

/// Background thread owning a tokio runtime. Requests and timers run there;
/// their completions come back as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(client: Arc<dyn JobClient>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::Builder::new()
            .name("shelf-engine".to_string())
            .spawn(move || {
                let mut timers: HashMap<SessionId, CancellationToken> = HashMap::new();
                while let Ok(command) = cmd_rx.recv() {
                    handle_command(&runtime, &client, &mut timers, command, &event_tx);
                }
                for token in timers.values() {
                    token.cancel();
                }
                shelf_debug!("engine stopped");
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn trigger(&self, session: SessionId, job: TrackedJob) {
        self.send(EngineCommand::Trigger { session, job });
    }

    pub fn fetch_status(&self, session: SessionId, job: TrackedJob) {
        self.send(EngineCommand::FetchStatus { session, job });
    }

    /// Starts a repeating timer whose first fire is one `interval` from now.
    /// Re-arming a session replaces its previous timer.
    pub fn arm_timer(&self, session: SessionId, job: TrackedJob, interval: Duration) {
        self.send(EngineCommand::ArmTimer {
            session,
            job,
            interval,
        });
    }

    pub fn disarm_timer(&self, session: SessionId) {
        self.send(EngineCommand::DisarmTimer { session });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            shelf_warn!("engine thread is gone; command dropped");
        }
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    client: &Arc<dyn JobClient>,
    timers: &mut HashMap<SessionId, CancellationToken>,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Trigger { session, job } => {
            let client = client.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = client.trigger(&job).await;
                let _ = event_tx.send(EngineEvent::TriggerCompleted {
                    session,
                    job,
                    result,
                });
            });
        }
        EngineCommand::FetchStatus { session, job } => {
            let client = client.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = client.fetch_status(&job).await;
                let _ = event_tx.send(EngineEvent::StatusFetched {
                    session,
                    job,
                    result,
                });
            });
        }
        EngineCommand::ArmTimer {
            session,
            job,
            interval,
        } => {
            let token = CancellationToken::new();
            if let Some(previous) = timers.insert(session, token.clone()) {
                previous.cancel();
            }
            shelf_trace!("session {session}: timer armed every {interval:?}");
            runtime.spawn(run_timer(session, job, interval, token, event_tx.clone()));
        }
        EngineCommand::DisarmTimer { session } => {
            if let Some(token) = timers.remove(&session) {
                token.cancel();
                shelf_trace!("session {session}: timer disarmed");
            }
        }
    }
}

async fn run_timer(
    session: SessionId,
    job: TrackedJob,
    interval: Duration,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let fired = EngineEvent::TimerFired { session, job: job.clone() };
                if event_tx.send(fired).is_err() {
                    break;
                }
            }
        }
    }
}
