use std::io;
use std::time::Duration;

use thiserror::Error;

use super::StartMode;

/// A single entry that could not be started. Collected, never fatal.
#[derive(Debug, Error)]
#[error("failed to launch entry {} ({path}): {source}", index + 1)]
pub struct LaunchFailure {
    pub index: usize,
    pub path: String,
    #[source]
    pub source: io::Error,
}

#[derive(Debug)]
pub enum LaunchOutcome {
    Launched { index: usize, path: String },
    Failed(LaunchFailure),
}

impl LaunchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LaunchOutcome::Launched { .. })
    }

    pub fn index(&self) -> usize {
        match self {
            LaunchOutcome::Launched { index, .. } => *index,
            LaunchOutcome::Failed(f) => f.index,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            LaunchOutcome::Launched { path, .. } => path,
            LaunchOutcome::Failed(f) => &f.path,
        }
    }
}

/// Progress notifications emitted while a profile runs.
#[derive(Debug)]
pub enum LaunchEvent {
    Waiting {
        index: usize,
        remaining: Duration,
    },
    Starting {
        index: usize,
        total: usize,
        path: String,
        mode: StartMode,
    },
    Launched {
        index: usize,
    },
    Failed {
        index: usize,
        message: String,
    },
}

#[derive(Debug, Default)]
pub struct LaunchReport {
    pub outcomes: Vec<LaunchOutcome>,
    pub cancelled: bool,
}

impl LaunchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &LaunchFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            LaunchOutcome::Failed(f) => Some(f),
            LaunchOutcome::Launched { .. } => None,
        })
    }

    pub fn all_succeeded(&self) -> bool {
        !self.cancelled && self.outcomes.iter().all(LaunchOutcome::is_success)
    }
}
