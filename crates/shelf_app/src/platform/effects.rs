use std::io;
use std::sync::Arc;
use std::time::Duration;

use shelf_client::{EngineEvent, EngineHandle, JobClient};
use shelf_core::{Effect, Msg};
use shelf_logging::{shelf_debug, shelf_warn};

/// Hands core effects to the engine and turns engine events back into
/// messages for `update`.
pub(crate) struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub(crate) fn new(client: Arc<dyn JobClient>) -> io::Result<Self> {
        Ok(Self {
            engine: EngineHandle::new(client)?,
        })
    }

    pub(crate) fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Trigger { session, job } => {
                    shelf_debug!("Trigger session={} job={}", session, job);
                    self.engine.trigger(session, job);
                }
                Effect::FetchStatus { session, job } => {
                    self.engine.fetch_status(session, job);
                }
                Effect::ArmTimer {
                    session,
                    job,
                    interval,
                } => {
                    shelf_debug!("ArmTimer session={} every {:?}", session, interval);
                    self.engine.arm_timer(session, job, interval);
                }
                Effect::DisarmTimer { session } => {
                    self.engine.disarm_timer(session);
                }
            }
        }
    }

    pub(crate) fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(event_to_msg)
    }
}

fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::TriggerCompleted {
            session,
            job,
            result,
        } => {
            if let Err(err) = &result {
                shelf_warn!("Trigger for {} failed: {}", job, err);
            }
            Msg::TriggerCompleted {
                session,
                job,
                result,
            }
        }
        EngineEvent::StatusFetched {
            session,
            job,
            result,
        } => {
            if let Err(err) = &result {
                shelf_warn!("Status for {} failed: {}", job, err);
            }
            Msg::StatusFetched {
                session,
                job,
                result,
            }
        }
        EngineEvent::TimerFired { session, job } => Msg::TimerFired { session, job },
    }
}
