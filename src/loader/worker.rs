//! Background model loading.
//!
//! One worker thread owns the [`AssetLoader`]. Requests go in over an
//! `mpsc` channel and are coalesced to the newest; outcomes come back
//! through a triple buffer the main thread polls without blocking.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};

use super::{AssetLoader, LoadError};
use crate::scene::SceneNode;

/// A model load tagged with the controller generation that asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Controller generation at submission.
    pub generation: u64,
    /// Health state the model is for.
    pub healthy: bool,
    /// Resolved model URL.
    pub url: String,
}

/// Result of one [`LoadRequest`].
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Generation copied from the request.
    pub generation: u64,
    /// Health state copied from the request.
    pub healthy: bool,
    /// URL copied from the request.
    pub url: String,
    /// Loaded scene or the reason it failed.
    pub result: Result<SceneNode, LoadError>,
}

enum WorkerMessage {
    Load(LoadRequest),
    Shutdown,
}

/// Background thread running model loads.
pub struct LoadWorker {
    request_tx: mpsc::Sender<WorkerMessage>,
    outcome: triple_buffer::Output<Option<LoadOutcome>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl LoadWorker {
    /// Spawn the load thread.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if the background thread fails to spawn.
    pub fn new(loader: Arc<dyn AssetLoader>) -> Result<Self, std::io::Error> {
        let (request_tx, request_rx) = mpsc::channel::<WorkerMessage>();
        let (outcome_input, outcome_output) = triple_buffer::triple_buffer(&None);

        let thread = std::thread::Builder::new()
            .name("model-loader".into())
            .spawn(move || {
                Self::thread_loop(&*loader, request_rx, outcome_input);
            })?;

        Ok(Self {
            request_tx,
            outcome: outcome_output,
            thread: Some(thread),
        })
    }

    /// Queue a load (non-blocking send).
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::WorkerStopped`] if the load thread is gone; no
    /// outcome will ever arrive for the request.
    pub fn submit(&self, request: LoadRequest) -> Result<(), LoadError> {
        log::debug!(
            "queueing load of {} (generation {})",
            request.url,
            request.generation
        );
        self.request_tx
            .send(WorkerMessage::Load(request))
            .map_err(|_| LoadError::WorkerStopped)
    }

    /// Non-blocking check for a finished load.
    pub fn try_recv(&mut self) -> Option<LoadOutcome> {
        let _ = self.outcome.update();
        self.outcome.output_buffer_mut().take()
    }

    /// Shut down the background thread and wait for it to finish. Safe to
    /// call more than once.
    pub fn shutdown(&mut self) {
        let _ = self.request_tx.send(WorkerMessage::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    /// Whether the thread has been joined.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.thread.is_none()
    }

    #[allow(clippy::needless_pass_by_value)]
    fn thread_loop(
        loader: &dyn AssetLoader,
        request_rx: mpsc::Receiver<WorkerMessage>,
        mut outcome_input: triple_buffer::Input<Option<LoadOutcome>>,
    ) {
        while let Ok(message) = request_rx.recv() {
            let request = match drain_latest(message, &request_rx) {
                WorkerMessage::Shutdown => break,
                WorkerMessage::Load(request) => request,
            };
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| loader.load(&request.url)))
                    .unwrap_or_else(|payload| {
                        Err(LoadError::LoaderPanicked(panic_message(&*payload)))
                    });
            outcome_input.write(Some(LoadOutcome {
                generation: request.generation,
                healthy: request.healthy,
                url: request.url,
                result,
            }));
        }
    }
}

impl Drop for LoadWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

/// Skip ahead to the newest queued message. A shutdown anywhere in the
/// queue wins.
fn drain_latest(
    initial: WorkerMessage,
    rx: &mpsc::Receiver<WorkerMessage>,
) -> WorkerMessage {
    let mut latest = initial;
    while let Ok(newer) = rx.try_recv() {
        if matches!(latest, WorkerMessage::Shutdown) {
            continue;
        }
        latest = newer;
    }
    latest
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    struct EchoLoader;

    impl AssetLoader for EchoLoader {
        fn load(&self, url: &str) -> Result<SceneNode, LoadError> {
            if url.ends_with(".glb") {
                Ok(SceneNode::new(url))
            } else {
                Err(LoadError::NotFound(url.to_owned()))
            }
        }
    }

    struct PanickingLoader;

    impl AssetLoader for PanickingLoader {
        fn load(&self, url: &str) -> Result<SceneNode, LoadError> {
            if url.starts_with("human") {
                panic!("decoder exploded on {url}");
            }
            Ok(SceneNode::new(url))
        }
    }

    fn wait(worker: &mut LoadWorker) -> LoadOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = worker.try_recv() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "load worker timed out");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn outcome_carries_request_tags() {
        let mut worker = LoadWorker::new(Arc::new(EchoLoader)).unwrap();
        worker
            .submit(LoadRequest {
                generation: 4,
                healthy: false,
                url: "polycystic_kidney.glb".into(),
            })
            .unwrap();
        let outcome = wait(&mut worker);
        assert_eq!(outcome.generation, 4);
        assert!(!outcome.healthy);
        assert_eq!(outcome.result.unwrap().name, "polycystic_kidney.glb");
        assert!(worker.try_recv().is_none());
    }

    #[test]
    fn failures_are_reported_not_panicked() {
        let mut worker = LoadWorker::new(Arc::new(EchoLoader)).unwrap();
        worker
            .submit(LoadRequest {
                generation: 1,
                healthy: true,
                url: "human_kidney.obj".into(),
            })
            .unwrap();
        let outcome = wait(&mut worker);
        assert!(matches!(outcome.result, Err(LoadError::NotFound(_))));
    }

    #[test]
    fn drain_prefers_newest_load() {
        let (tx, rx) = mpsc::channel();
        let load = |generation| {
            WorkerMessage::Load(LoadRequest {
                generation,
                healthy: true,
                url: String::new(),
            })
        };
        tx.send(load(2)).unwrap();
        tx.send(load(3)).unwrap();
        match drain_latest(load(1), &rx) {
            WorkerMessage::Load(r) => assert_eq!(r.generation, 3),
            WorkerMessage::Shutdown => panic!("unexpected shutdown"),
        }

        tx.send(WorkerMessage::Shutdown).unwrap();
        tx.send(load(5)).unwrap();
        assert!(matches!(
            drain_latest(load(4), &rx),
            WorkerMessage::Shutdown
        ));
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut worker = LoadWorker::new(Arc::new(EchoLoader)).unwrap();
        worker.shutdown();
        assert!(worker.is_shut_down());
        worker.shutdown();
    }

    #[test]
    fn loader_panic_becomes_an_outcome_and_worker_survives() {
        let mut worker = LoadWorker::new(Arc::new(PanickingLoader)).unwrap();
        worker
            .submit(LoadRequest {
                generation: 1,
                healthy: true,
                url: "human_kidney.glb".into(),
            })
            .unwrap();
        let outcome = wait(&mut worker);
        match outcome.result {
            Err(LoadError::LoaderPanicked(msg)) => {
                assert!(msg.contains("decoder exploded"));
            }
            other => panic!("expected a panic outcome, got {other:?}"),
        }

        worker
            .submit(LoadRequest {
                generation: 2,
                healthy: false,
                url: "polycystic_kidney.glb".into(),
            })
            .unwrap();
        let outcome = wait(&mut worker);
        assert_eq!(outcome.generation, 2);
        assert!(outcome.result.is_ok());
    }

    #[test]
    fn submit_after_shutdown_reports_stopped_worker() {
        let mut worker = LoadWorker::new(Arc::new(EchoLoader)).unwrap();
        worker.shutdown();
        let err = worker
            .submit(LoadRequest {
                generation: 1,
                healthy: true,
                url: "human_kidney.glb".into(),
            })
            .unwrap_err();
        assert!(matches!(err, LoadError::WorkerStopped));
    }
}
