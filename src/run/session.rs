use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{Form, TrainConfig};
use crate::nn::Backend;
use crate::{Error, Result};

use super::{Callbacks, History, Run, Status};

/// Holds at most one run and hands its epochs to `callbacks`.
///
/// Submitting a new configuration always tears the previous run down before
/// the next one is allocated. Dropping the session releases whatever run it
/// still holds.
pub struct Session<B: Backend, C: Callbacks> {
    backend: B,
    callbacks: C,
    run: Option<Run<B::Model>>,
    status: Status,
}

impl<B: Backend, C: Callbacks> Session<B, C> {
    pub fn new(backend: B, callbacks: C) -> Session<B, C> {
        Session {
            backend,
            callbacks,
            run: None,
            status: Status::Idle,
        }
    }

    /// Validates `form` and starts a run for it. A rejected form leaves the current run alone.
    pub fn submit(&mut self, form: &Form) -> Result<Uuid> {
        let config = form.submit().map_err(|e| {
            warn!("{}", e);
            e
        })?;
        self.start(config)
    }

    pub fn start(&mut self, config: TrainConfig) -> Result<Uuid> {
        self.teardown();

        let run = match Run::start(&mut self.backend, config) {
            Ok(run) => run,
            Err(e) => {
                error!("could not start run: {}", e);
                self.set_status(Status::Aborted {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        let id = run.id();
        self.callbacks.on_run_start(id);
        self.run = Some(run);
        Ok(id)
    }

    /// Trains the current run to the end. A failure aborts it and leaves the last frame in place.
    pub async fn train(&mut self) -> Result<History> {
        let run = self
            .run
            .as_mut()
            .ok_or_else(|| Error::InvalidConfig("submit a configuration first".to_string()))?;

        let id = run.id();
        self.status = Status::Training;
        self.callbacks.on_status(&self.status);

        let (status, result) = match run.train(&mut self.callbacks).await {
            Ok(history) => (
                Status::Settled {
                    final_loss: history.final_loss(),
                    final_accuracy: history.final_accuracy(),
                },
                Ok(history.clone()),
            ),
            Err(e) => {
                error!("run {} aborted: {}", id, e);
                (
                    Status::Aborted {
                        reason: e.to_string(),
                    },
                    Err(e),
                )
            }
        };
        self.set_status(status);
        result
    }

    /// Releases the current run, if any.
    pub fn unmount(&mut self) {
        if self.run.is_some() {
            info!("session unmounted");
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(mut run) = self.run.take() {
            run.teardown();
        }
        self.status = Status::Idle;
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
        self.callbacks.on_status(&self.status);
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn run(&self) -> Option<&Run<B::Model>> {
        self.run.as_ref()
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
