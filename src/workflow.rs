//! Workflow controller: sequences simulation then analysis for one keyword.
//!
//! The controller is the only owner of run-scoped state. Callers drive it
//! through `start` and `reset`; presentation observes immutable [`Snapshot`]s,
//! either on demand or through a `broadcast` subscription that receives one
//! snapshot per transition, in order.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::ModelCapability;
use crate::config::WorkflowConfig;
use crate::error::{OptimizerError, Result};
use crate::stages::{analyze, simulate};
use crate::types::{SimulationData, StrategyReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Simulating,
    Analyzing,
    Complete,
    Error,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Complete | Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Idle => "idle",
            Status::Simulating => "simulating",
            Status::Analyzing => "analyzing",
            Status::Complete => "complete",
            Status::Error => "error",
        };
        f.write_str(s)
    }
}

/// Full state of the controller, including data the owner may inspect but
/// presentation never sees (the simulation of a failed run).
#[derive(Debug, Clone)]
pub enum RunState {
    Idle,
    Simulating {
        run: Uuid,
        keyword: String,
    },
    Analyzing {
        run: Uuid,
        keyword: String,
        simulation: Arc<SimulationData>,
    },
    Complete {
        run: Uuid,
        keyword: String,
        simulation: Arc<SimulationData>,
        report: Arc<StrategyReport>,
    },
    Failed {
        run: Uuid,
        keyword: String,
        message: String,
        simulation: Option<Arc<SimulationData>>,
    },
}

impl RunState {
    pub fn status(&self) -> Status {
        match self {
            RunState::Idle => Status::Idle,
            RunState::Simulating { .. } => Status::Simulating,
            RunState::Analyzing { .. } => Status::Analyzing,
            RunState::Complete { .. } => Status::Complete,
            RunState::Failed { .. } => Status::Error,
        }
    }

    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            RunState::Idle => None,
            RunState::Simulating { run, .. }
            | RunState::Analyzing { run, .. }
            | RunState::Complete { run, .. }
            | RunState::Failed { run, .. } => Some(*run),
        }
    }

    pub fn keyword(&self) -> Option<&str> {
        match self {
            RunState::Idle => None,
            RunState::Simulating { keyword, .. }
            | RunState::Analyzing { keyword, .. }
            | RunState::Complete { keyword, .. }
            | RunState::Failed { keyword, .. } => Some(keyword),
        }
    }
}

/// Read-only view of the controller handed to presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub run_id: Option<Uuid>,
    pub status: Status,
    pub keyword: Option<String>,
    pub simulation: Option<Arc<SimulationData>>,
    pub report: Option<Arc<StrategyReport>>,
    pub error: Option<String>,
}

impl Snapshot {
    pub fn idle() -> Self {
        Snapshot::from(&RunState::Idle)
    }
}

impl From<&RunState> for Snapshot {
    fn from(state: &RunState) -> Self {
        let (simulation, report, error) = match state {
            RunState::Idle | RunState::Simulating { .. } => (None, None, None),
            RunState::Analyzing { simulation, .. } => (Some(Arc::clone(simulation)), None, None),
            RunState::Complete {
                simulation, report, ..
            } => (Some(Arc::clone(simulation)), Some(Arc::clone(report)), None),
            // A failed run exposes only its message.
            RunState::Failed { message, .. } => (None, None, Some(message.clone())),
        };
        Snapshot {
            run_id: state.run_id(),
            status: state.status(),
            keyword: state.keyword().map(str::to_string),
            simulation,
            report,
            error,
        }
    }
}

/// Snapshots buffered per subscriber. A run emits at most four.
pub const UPDATE_CAPACITY: usize = 16;

pub struct Workflow {
    model: Arc<dyn ModelCapability>,
    config: WorkflowConfig,
    state: RunState,
    updates: broadcast::Sender<Snapshot>,
}

impl Workflow {
    pub fn new(model: Arc<dyn ModelCapability>, config: WorkflowConfig) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            model,
            config,
            state: RunState::Idle,
            updates,
        }
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from(&self.state)
    }

    /// Receive a snapshot for every transition from now on.
    ///
    /// The receiver closes when the workflow is dropped. A subscriber that
    /// falls more than [`UPDATE_CAPACITY`] snapshots behind sees `Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    /// Run one keyword through simulation and analysis.
    ///
    /// An empty or whitespace-only keyword is a no-op and issues no model
    /// call. Otherwise the controller must be idle; it ends in `Complete` or
    /// `Error` and returns that status. The exclusive borrow held for the
    /// whole run means a second `start` cannot overlap a pending one.
    pub async fn start(&mut self, keyword: &str) -> Result<Status> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            debug!("Ignoring start with empty keyword");
            return Ok(self.status());
        }
        if !matches!(self.state, RunState::Idle) {
            return Err(OptimizerError::InvalidTransition {
                operation: "start",
                from: self.status(),
            });
        }

        self.begin_simulation(keyword);

        let simulated = simulate(self.model.as_ref(), keyword, &self.config).await;
        let simulation = match simulated {
            Ok(data) => self.simulation_succeeded(data),
            Err(err) => {
                self.run_failed(err);
                return Ok(self.status());
            }
        };

        let analyzed = analyze(self.model.as_ref(), &simulation, &self.config).await;
        match analyzed {
            Ok(report) => self.analysis_succeeded(report),
            Err(err) => self.run_failed(err),
        }
        Ok(self.status())
    }

    /// Discard the current run and return to `Idle`. Idempotent.
    pub fn reset(&mut self) {
        if matches!(self.state, RunState::Idle) {
            return;
        }
        self.transition(self.status(), RunState::Idle);
    }

    fn transition(&mut self, from: Status, next: RunState) {
        self.state = next;
        info!(
            run = ?self.state.run_id(),
            "Workflow transition {} -> {}",
            from,
            self.state.status()
        );
        // Err only means nobody is subscribed.
        let _ = self.updates.send(Snapshot::from(&self.state));
    }

    fn begin_simulation(&mut self, keyword: &str) {
        self.transition(self.status(), RunState::Simulating {
            run: Uuid::new_v4(),
            keyword: keyword.to_string(),
        });
    }

    fn simulation_succeeded(&mut self, data: SimulationData) -> Arc<SimulationData> {
        let simulation = Arc::new(data);
        match std::mem::replace(&mut self.state, RunState::Idle) {
            RunState::Simulating { run, keyword } => {
                self.transition(Status::Simulating, RunState::Analyzing {
                    run,
                    keyword,
                    simulation: Arc::clone(&simulation),
                });
            }
            other => {
                warn!("Simulation result arrived while {}", other.status());
                self.state = other;
            }
        }
        simulation
    }

    fn analysis_succeeded(&mut self, report: StrategyReport) {
        match std::mem::replace(&mut self.state, RunState::Idle) {
            RunState::Analyzing {
                run,
                keyword,
                simulation,
            } => {
                self.transition(Status::Analyzing, RunState::Complete {
                    run,
                    keyword,
                    simulation,
                    report: Arc::new(report),
                });
            }
            other => {
                warn!("Analysis result arrived while {}", other.status());
                self.state = other;
            }
        }
    }

    fn run_failed(&mut self, err: OptimizerError) {
        let message = err.user_message();
        let (from, next) = match std::mem::replace(&mut self.state, RunState::Idle) {
            RunState::Simulating { run, keyword } => (
                Status::Simulating,
                RunState::Failed {
                    run,
                    keyword,
                    message,
                    simulation: None,
                },
            ),
            RunState::Analyzing {
                run,
                keyword,
                simulation,
            } => (
                Status::Analyzing,
                RunState::Failed {
                    run,
                    keyword,
                    message,
                    simulation: Some(simulation),
                },
            ),
            other => {
                warn!("Stage failure '{}' arrived while {}", message, other.status());
                self.state = other;
                return;
            }
        };
        self.transition(from, next);
    }
}
