//! Cancellable background jobs with progress and completion callbacks.
//!
//! A [`JobHandle`] owns one unit of work running on its own thread.
//! Progress listeners observe a non-decreasing percent sequence, done
//! listeners fire exactly once each after the terminal outcome is
//! published, and cancelling a finished job is a no-op.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::error::{EngineError, EngineResult};

/// The kind of job a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Replica generation.
    Generate,
    /// Synchronization.
    Sync,
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// The job has not been started.
    NotStarted,
    /// The work is running.
    Running,
    /// The work returned a value.
    Succeeded,
    /// The work returned an error or was cancelled.
    Failed,
}

impl JobStatus {
    /// Returns true for `Succeeded` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

type Work<T> = Box<dyn FnOnce(&JobContext) -> EngineResult<T> + Send + 'static>;
type DoneListener<T> = Box<dyn FnOnce(EngineResult<T>) + Send + 'static>;
type ProgressListener = Box<dyn Fn(u8) + Send + 'static>;

/// Cancel flag and progress state shared with the worker thread.
struct Control {
    cancelled: AtomicBool,
    progress: AtomicU8,
    progress_listeners: Mutex<Vec<ProgressListener>>,
}

/// Capabilities a job body receives from its handle.
pub struct JobContext {
    control: Arc<Control>,
}

impl JobContext {
    /// Reports progress in percent, clamped to 100.
    ///
    /// Regressions are dropped so listeners observe a non-decreasing
    /// sequence, and nothing is delivered once the job is cancelled.
    pub fn set_progress(&self, percent: u8) {
        if self.is_cancelled() {
            return;
        }
        let percent = percent.min(100);
        let previous = self.control.progress.fetch_max(percent, Ordering::AcqRel);
        if percent > previous {
            let listeners = self.control.progress_listeners.lock();
            for listener in listeners.iter() {
                listener(percent);
            }
        }
    }

    /// Returns `Cancelled` if cancellation was requested.
    ///
    /// Job bodies call this between transfer pages so a cancel lands
    /// at a consistent point.
    pub fn check_cancelled(&self) -> EngineResult<()> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Returns true if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.control.cancelled.load(Ordering::Acquire)
    }
}

enum Outcome<T> {
    NotStarted,
    Running,
    Succeeded(T),
    Failed(EngineError),
}

impl<T> Outcome<T> {
    fn status(&self) -> JobStatus {
        match self {
            Outcome::NotStarted => JobStatus::NotStarted,
            Outcome::Running => JobStatus::Running,
            Outcome::Succeeded(_) => JobStatus::Succeeded,
            Outcome::Failed(_) => JobStatus::Failed,
        }
    }
}

struct Shared<T> {
    outcome: Outcome<T>,
    done_listeners: Vec<DoneListener<T>>,
}

/// Handle to one asynchronous, cancellable, progress-reporting job.
///
/// Created holding its work and started explicitly; a session starts
/// the handles it returns, so callers only ever see `Running` or a
/// terminal status.
pub struct JobHandle<T> {
    control: Arc<Control>,
    shared: Arc<Mutex<Shared<T>>>,
    work: Mutex<Option<Work<T>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Clone + Send + 'static> JobHandle<T> {
    /// Creates a handle holding `work`, not yet started.
    pub fn new<F>(work: F) -> Self
    where
        F: FnOnce(&JobContext) -> EngineResult<T> + Send + 'static,
    {
        Self {
            control: Arc::new(Control {
                cancelled: AtomicBool::new(false),
                progress: AtomicU8::new(0),
                progress_listeners: Mutex::new(Vec::new()),
            }),
            shared: Arc::new(Mutex::new(Shared {
                outcome: Outcome::NotStarted,
                done_listeners: Vec::new(),
            })),
            work: Mutex::new(Some(Box::new(work))),
            worker: Mutex::new(None),
        }
    }

    /// Spawns the worker thread running the job's work.
    ///
    /// Returns false if the job was already started.
    pub fn start(&self) -> bool {
        let Some(work) = self.work.lock().take() else {
            return false;
        };
        self.shared.lock().outcome = Outcome::Running;
        let control = Arc::clone(&self.control);
        let shared = Arc::clone(&self.shared);
        let worker = std::thread::spawn(move || {
            let context = JobContext { control };
            let result = work(&context);
            publish(&shared, result);
        });
        *self.worker.lock() = Some(worker);
        true
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.shared.lock().outcome.status()
    }

    /// Progress reported so far, 0 to 100.
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.control.progress.load(Ordering::Acquire)
    }

    /// Returns the terminal result.
    ///
    /// # Errors
    ///
    /// `NotReady` until the job reaches a terminal status; afterwards
    /// every caller receives a clone of the outcome.
    pub fn result(&self) -> EngineResult<T> {
        match &self.shared.lock().outcome {
            Outcome::Succeeded(value) => Ok(value.clone()),
            Outcome::Failed(err) => Err(err.clone()),
            Outcome::NotStarted | Outcome::Running => Err(EngineError::NotReady),
        }
    }

    /// Registers a progress listener.
    ///
    /// A listener attached late misses earlier deliveries; what it
    /// does see is still non-decreasing.
    pub fn on_progress<F>(&self, listener: F)
    where
        F: Fn(u8) + Send + 'static,
    {
        self.control.progress_listeners.lock().push(Box::new(listener));
    }

    /// Registers a completion listener.
    ///
    /// Fires exactly once with the job result, after the outcome is
    /// published and after every progress delivery for the job. A
    /// listener attached to a finished job fires immediately on the
    /// caller's thread.
    pub fn on_done<F>(&self, listener: F)
    where
        F: FnOnce(EngineResult<T>) + Send + 'static,
    {
        let terminal = {
            let mut shared = self.shared.lock();
            match &shared.outcome {
                Outcome::Succeeded(value) => Ok(value.clone()),
                Outcome::Failed(err) => Err(err.clone()),
                Outcome::NotStarted | Outcome::Running => {
                    shared.done_listeners.push(Box::new(listener));
                    return;
                }
            }
        };
        listener(terminal);
    }

    /// Requests cancellation.
    ///
    /// The running work observes the request at its next cancellation
    /// check; progress delivery stops immediately. Cancelling a job
    /// that already finished does nothing.
    pub fn cancel(&self) {
        let shared = self.shared.lock();
        if shared.outcome.status().is_terminal() {
            return;
        }
        self.control.cancelled.store(true, Ordering::Release);
    }

    /// Blocks until the worker thread exits.
    ///
    /// Returns immediately if the job never started or was already
    /// joined.
    pub fn join(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.join();
        }
    }
}

fn publish<T: Clone>(shared: &Mutex<Shared<T>>, result: EngineResult<T>) {
    let listeners = {
        let mut guard = shared.lock();
        guard.outcome = match &result {
            Ok(value) => Outcome::Succeeded(value.clone()),
            Err(err) => Outcome::Failed(err.clone()),
        };
        std::mem::take(&mut guard.done_listeners)
    };
    for listener in listeners {
        listener(result.clone());
    }
}

impl<T> std::fmt::Debug for JobHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("status", &self.shared.lock().outcome.status())
            .field("progress", &self.control.progress.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
