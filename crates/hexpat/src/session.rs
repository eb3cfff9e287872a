//! Background evaluation with latest-request-wins semantics.
//!
//! A [`Session`] owns one worker thread. Requests go through a single
//! pending slot: submitting replaces a request that has not started yet,
//! and a running evaluation stops early once a newer request exists. Only
//! the newest request's result is ever published.

use std::{
    collections::BTreeMap,
    sync::{
        Arc, Condvar, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
};

use log::{debug, info, warn};

use crate::{HexpatError, Pipeline, region::AnnotatedRegion};

/// Outcomes kept for [`Session::wait`]; older ones report as superseded.
const MAX_RETAINED_OUTCOMES: usize = 64;

/// How a submitted request ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The run succeeded and its regions are the current snapshot.
    Published(Arc<[AnnotatedRegion]>),
    /// The run failed; the previous snapshot was kept.
    Failed(Arc<HexpatError>),
    /// A newer request replaced or cancelled this one.
    Superseded,
}

struct Request {
    generation: u64,
    source: String,
}

#[derive(Default)]
struct State {
    pending: Option<Request>,
    regions: Option<Arc<[AnnotatedRegion]>>,
    last_error: Option<Arc<HexpatError>>,
    outcomes: BTreeMap<u64, RunOutcome>,
}

impl State {
    fn settle(&mut self, generation: u64, outcome: RunOutcome) {
        self.outcomes.insert(generation, outcome);
        while self.outcomes.len() > MAX_RETAINED_OUTCOMES {
            self.outcomes.pop_first();
        }
    }
}

struct Shared {
    state: Mutex<State>,
    /// Signalled on new requests, settled runs and shutdown.
    changed: Condvar,
    /// Generation of the newest submitted request.
    latest: AtomicU64,
    shutdown: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("session state lock poisoned")
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.latest.load(Ordering::Acquire) == generation
    }
}

/// Evaluates patterns on a background thread, publishing the newest result.
///
/// Type and member names are interned process-wide (see
/// [`crate::identifier`]) and outlive the session. A long-running
/// session that keeps seeing freshly generated names grows the interner
/// by each new name; resubmitting edits of the same pattern does not.
///
/// # Examples
///
/// ```
/// use hexpat::{Pipeline, RunOutcome, Session};
///
/// let session = Session::new(Pipeline::default()).expect("Failed to start session");
/// let generation = session.submit("u32 magic @ 0;");
///
/// assert!(matches!(session.wait(generation), RunOutcome::Published(_)));
/// assert_eq!(session.regions().len(), 1);
/// ```
pub struct Session {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`HexpatError::Io`] if the thread cannot be spawned.
    pub fn new(pipeline: Pipeline) -> Result<Self, HexpatError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            changed: Condvar::new(),
            latest: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        });

        let worker = thread::Builder::new()
            .name("hexpat-session".to_string())
            .spawn({
                let shared = Arc::clone(&shared);
                move || run_worker(&shared, &pipeline)
            })?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Queue `source` for evaluation and return its generation.
    ///
    /// A request still waiting in the queue is replaced and settles as
    /// [`RunOutcome::Superseded`].
    pub fn submit(&self, source: impl Into<String>) -> u64 {
        let mut state = self.shared.lock();
        let generation = self.shared.latest.fetch_add(1, Ordering::AcqRel) + 1;

        let request = Request {
            generation,
            source: source.into(),
        };
        if let Some(replaced) = state.pending.replace(request) {
            debug!(generation = replaced.generation; "Pending request replaced");
            state.settle(replaced.generation, RunOutcome::Superseded);
        }
        drop(state);

        self.shared.changed.notify_all();
        debug!(generation; "Request submitted");
        generation
    }

    /// The most recently published regions; empty before the first success.
    pub fn regions(&self) -> Arc<[AnnotatedRegion]> {
        self.shared
            .lock()
            .regions
            .clone()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Error of the newest run, if it failed.
    pub fn last_error(&self) -> Option<Arc<HexpatError>> {
        self.shared.lock().last_error.clone()
    }

    /// Block until `generation` has settled and return how it ended.
    ///
    /// Generations that were never submitted, or settled too long ago to be
    /// remembered, report [`RunOutcome::Superseded`].
    pub fn wait(&self, generation: u64) -> RunOutcome {
        let mut state = self.shared.lock();
        loop {
            if let Some(outcome) = state.outcomes.get(&generation) {
                return outcome.clone();
            }
            let forgotten = state
                .outcomes
                .first_key_value()
                .is_some_and(|(&oldest, _)| generation < oldest);
            let unknown = generation == 0 || generation > self.shared.latest.load(Ordering::Acquire);
            if forgotten || unknown {
                return RunOutcome::Superseded;
            }
            state = self
                .shared
                .changed
                .wait(state)
                .expect("session state lock poisoned");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        // Take the lock so the worker cannot miss the wakeup between its
        // shutdown check and its wait.
        drop(self.shared.lock());
        self.shared.changed.notify_all();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Session worker panicked");
            }
        }
    }
}

fn next_request(shared: &Shared) -> Option<Request> {
    let mut state = shared.lock();
    loop {
        if shared.shutdown.load(Ordering::Acquire) {
            return None;
        }
        if let Some(request) = state.pending.take() {
            return Some(request);
        }
        state = shared
            .changed
            .wait(state)
            .expect("session state lock poisoned");
    }
}

fn run_worker(shared: &Shared, pipeline: &Pipeline) {
    while let Some(Request { generation, source }) = next_request(shared) {
        let is_cancelled =
            || shared.shutdown.load(Ordering::Acquire) || !shared.is_latest(generation);
        let result = pipeline.run_with_cancel(&source, &is_cancelled);

        let mut state = shared.lock();
        let outcome = match result {
            Ok(evaluation) if shared.is_latest(generation) => {
                let regions = Arc::clone(evaluation.regions());
                info!(generation, regions = regions.len(); "Regions published");
                state.regions = Some(Arc::clone(&regions));
                state.last_error = None;
                RunOutcome::Published(regions)
            }
            Err(err) if !err.is_cancelled() && shared.is_latest(generation) => {
                warn!(generation, err:% = err; "Evaluation failed");
                let err = Arc::new(err);
                state.last_error = Some(Arc::clone(&err));
                RunOutcome::Failed(err)
            }
            Err(err) if !err.is_cancelled() => RunOutcome::Failed(Arc::new(err)),
            _ => {
                warn!(generation; "Run superseded");
                RunOutcome::Superseded
            }
        };
        state.settle(generation, outcome);
        drop(state);

        shared.changed.notify_all();
    }
    debug!("Session worker stopped");
}
