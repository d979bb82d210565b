use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::backend::launch_engine::{CancelToken, LaunchEngine};
use crate::backend::spawn::Spawner;
use crate::model::{LaunchEvent, LaunchReport, Profile};

#[derive(Debug)]
pub enum WorkerEvent {
    Progress(LaunchEvent),
    /// Always the last message of a run.
    Done(LaunchReport),
}

/// Runs a launch sequence on its own thread.
pub struct LaunchWorker;

impl LaunchWorker {
    /// `profile` is a snapshot; later edits to the store do not affect the run.
    pub fn spawn<S>(engine: Arc<LaunchEngine<S>>, profile: Profile) -> io::Result<LaunchHandle>
    where
        S: Spawner + Send + Sync + 'static,
    {
        let (tx, rx) = flume::unbounded();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        let thread = thread::Builder::new()
            .name(thread_name(&profile.name))
            .spawn(move || {
                let report = engine.launch_with(&profile, &worker_cancel, |event| {
                    // Nobody listening is fine; the sequence still completes.
                    let _ = tx.send(WorkerEvent::Progress(event));
                });
                if tx.send(WorkerEvent::Done(report)).is_err() {
                    log::debug!("Launch of '{}' finished with no listener", profile.name);
                }
            })?;

        Ok(LaunchHandle {
            events: rx,
            cancel,
            thread: Some(thread),
        })
    }
}

/// `std` panics on interior NUL in a thread name, so control characters are dropped.
fn thread_name(profile: &str) -> String {
    let name: String = profile.chars().filter(|c| !c.is_control()).collect();
    format!("launch-{}", name)
}

pub struct LaunchHandle {
    events: flume::Receiver<WorkerEvent>,
    cancel: CancelToken,
    thread: Option<JoinHandle<()>>,
}

impl LaunchHandle {
    /// For polling from an event loop with `try_recv`.
    pub fn events(&self) -> &flume::Receiver<WorkerEvent> {
        &self.events
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Takes effect before the next entry or during the current delay.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the run finishes, passing progress to `on_progress`.
    /// `None` means the worker died before reporting.
    pub fn wait_with(mut self, mut on_progress: impl FnMut(&LaunchEvent)) -> Option<LaunchReport> {
        let mut report = None;
        for event in self.events.iter() {
            match event {
                WorkerEvent::Progress(ev) => on_progress(&ev),
                WorkerEvent::Done(r) => {
                    report = Some(r);
                    break;
                }
            }
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Launch worker panicked");
            }
        }
        report
    }

    pub fn wait(self) -> Option<LaunchReport> {
        self.wait_with(|_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::launch_engine::tests::Recorder;
    use crate::model::Entry;
    use std::time::{Duration, Instant};

    #[test]
    fn reports_progress_then_done() {
        let engine = Arc::new(LaunchEngine::with_spawner(Recorder::failing(&["b"])));
        let profile = Profile::new("P", vec![Entry::new("a"), Entry::new("b")]);

        let handle = LaunchWorker::spawn(engine.clone(), profile).unwrap();
        let mut progress = 0;
        let report = handle.wait_with(|_| progress += 1).unwrap();

        assert_eq!(progress, 4);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(engine.spawner().paths(), vec!["a", "b"]);
    }

    #[test]
    fn spawn_returns_before_delays_elapse() {
        let engine = Arc::new(LaunchEngine::with_spawner(Recorder::default()));
        let profile = Profile::new("Slow", vec![Entry::new("a").with_delay(0.5)]);

        let started = Instant::now();
        let handle = LaunchWorker::spawn(engine, profile).unwrap();
        assert!(started.elapsed() < Duration::from_millis(400));

        let report = handle.wait().unwrap();
        assert!(report.all_succeeded());
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[test]
    fn cancel_from_caller_stops_run() {
        let engine = Arc::new(LaunchEngine::with_spawner(Recorder::default()));
        let profile = Profile::new(
            "Long",
            vec![Entry::new("a"), Entry::new("b").with_delay(30.0)],
        );

        let handle = LaunchWorker::spawn(engine.clone(), profile).unwrap();
        let started = Instant::now();
        let token = handle.cancel_token();
        let report = handle
            .wait_with(|event| {
                if let LaunchEvent::Waiting { .. } = event {
                    token.cancel();
                }
            })
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(engine.spawner().paths(), vec!["a"]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn event_loop_can_poll_and_cancel() {
        let engine = Arc::new(LaunchEngine::with_spawner(Recorder::default()));
        let profile = Profile::new(
            "Polled",
            vec![Entry::new("a"), Entry::new("b").with_delay(30.0)],
        );

        let handle = LaunchWorker::spawn(engine.clone(), profile).unwrap();
        let mut seen = Vec::new();
        let report = loop {
            match handle.events().recv_timeout(Duration::from_secs(5)).unwrap() {
                WorkerEvent::Progress(event) => {
                    if let LaunchEvent::Waiting { index, .. } = event {
                        assert_eq!(index, 1);
                        handle.cancel();
                    }
                    seen.push(event);
                }
                WorkerEvent::Done(report) => break report,
            }
        };

        assert!(report.cancelled);
        assert_eq!(report.outcomes.len(), 1);
        assert!(matches!(seen[0], LaunchEvent::Starting { index: 0, .. }));
        assert!(handle.events().try_recv().is_err());
        assert_eq!(engine.spawner().paths(), vec!["a"]);
    }

    #[test]
    fn control_characters_in_profile_name_are_dropped() {
        assert_eq!(thread_name("Work"), "launch-Work");
        assert_eq!(thread_name("Wo\0rk\n"), "launch-Work");
    }

    #[test]
    fn profile_name_with_nul_still_launches() {
        let engine = Arc::new(LaunchEngine::with_spawner(Recorder::default()));
        let profiles: crate::model::ProfileCollection =
            serde_json::from_str(r#"[{"name":"Work\u0000","entries":[{"path":"a"}]}]"#).unwrap();
        let profile = profiles.get("Work\0").unwrap().clone();

        let report = LaunchWorker::spawn(engine.clone(), profile)
            .unwrap()
            .wait()
            .unwrap();

        assert!(report.all_succeeded());
        assert_eq!(engine.spawner().paths(), vec!["a"]);
    }

    #[test]
    fn dropped_handle_does_not_stop_launch() {
        let engine = Arc::new(LaunchEngine::with_spawner(Recorder::default()));
        let profile = Profile::new("Fire", vec![Entry::new("a"), Entry::new("b").with_delay(0.1)]);

        drop(LaunchWorker::spawn(engine.clone(), profile).unwrap());

        let deadline = Instant::now() + Duration::from_secs(5);
        while engine.spawner().paths().len() < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(engine.spawner().paths(), vec!["a", "b"]);
    }
}
