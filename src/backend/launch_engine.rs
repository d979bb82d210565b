use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::backend::spawn::{OsSpawner, Spawner};
use crate::model::{
    Entry, LaunchEvent, LaunchFailure, LaunchOutcome, LaunchReport, Profile,
};

/// Upper bound on each sleep while waiting out a delay, so cancellation is
/// noticed promptly.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Cooperative cancellation flag shared between a launch and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Starts the entries of a profile one after another.
///
/// Blocks the calling thread for the configured delays; run it on a worker
/// (see `LaunchWorker`) when an interactive thread is involved.
pub struct LaunchEngine<S = OsSpawner> {
    spawner: S,
}

impl LaunchEngine<OsSpawner> {
    pub fn new() -> Self {
        Self {
            spawner: OsSpawner,
        }
    }
}

impl Default for LaunchEngine<OsSpawner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Spawner> LaunchEngine<S> {
    pub fn with_spawner(spawner: S) -> Self {
        Self { spawner }
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Launch every entry in order, one outcome per entry.
    pub fn launch(&self, profile: &Profile) -> Vec<LaunchOutcome> {
        self.launch_with(profile, &CancelToken::new(), |_| {}).outcomes
    }

    pub fn launch_with(
        &self,
        profile: &Profile,
        cancel: &CancelToken,
        mut on_event: impl FnMut(LaunchEvent),
    ) -> LaunchReport {
        let total = profile.entries.len();
        let mut report = LaunchReport::default();
        log::info!("Launching '{}': {} entries", profile.name, total);

        for (index, entry) in profile.entries.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let delay = delay_of(entry);
            if !delay.is_zero() && !wait(index, delay, cancel, &mut on_event) {
                report.cancelled = true;
                break;
            }

            let path = entry.normalized_path().to_string();
            on_event(LaunchEvent::Starting {
                index,
                total,
                path: path.clone(),
                mode: entry.start_mode,
            });
            log::info!(
                "Starting {}/{}: {} ({})",
                index + 1,
                total,
                path,
                entry.start_mode
            );

            let outcome = match self.spawner.spawn(&path, entry.start_mode) {
                Ok(()) => {
                    on_event(LaunchEvent::Launched { index });
                    LaunchOutcome::Launched { index, path }
                }
                Err(source) => {
                    let failure = LaunchFailure {
                        index,
                        path,
                        source,
                    };
                    log::error!("{}", failure);
                    on_event(LaunchEvent::Failed {
                        index,
                        message: failure.to_string(),
                    });
                    LaunchOutcome::Failed(failure)
                }
            };
            report.outcomes.push(outcome);
        }

        if report.cancelled {
            log::warn!(
                "Launch of '{}' cancelled after {} of {} entries",
                profile.name,
                report.outcomes.len(),
                total
            );
        } else {
            log::info!(
                "Launch of '{}' done: {}/{} started",
                profile.name,
                report.succeeded(),
                total
            );
        }
        report
    }
}

/// Delays that are not a representable point in the future count as zero.
fn delay_of(entry: &Entry) -> Duration {
    if entry.delay_seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(entry.delay_seconds)
        .ok()
        .filter(|delay| Instant::now().checked_add(*delay).is_some())
        .unwrap_or_else(|| {
            log::warn!(
                "Ignoring unusable delay {} for {}",
                entry.delay_seconds,
                entry.path
            );
            Duration::ZERO
        })
}

/// Sleep for `delay`, reporting the remaining time once per second.
/// Returns false if cancelled before the delay elapsed.
fn wait(
    index: usize,
    delay: Duration,
    cancel: &CancelToken,
    on_event: &mut impl FnMut(LaunchEvent),
) -> bool {
    let Some(deadline) = Instant::now().checked_add(delay) else {
        return true;
    };
    let mut last_second = None;

    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }

        let remaining = deadline - now;
        let second = remaining.as_secs_f64().ceil() as u64;
        if last_second != Some(second) {
            last_second = Some(second);
            on_event(LaunchEvent::Waiting { index, remaining });
        }
        thread::sleep(remaining.min(WAIT_SLICE));
    }
}
