//! Debounced editor controller.
//!
//! Turns a stream of edits into at most one conversion per quiet period and
//! reconciles asynchronous gateway responses into a single current result.
//! State changes are published on a `watch` channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use logging::{EventLogger, StudioEvent};
use studio_core::{ConversionGateway, EditorSnapshot, StudioResult};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::debounce::Debouncer;
use crate::state::{Applied, EditorState, Ticket};

const EVENT_SOURCE: &str = "editor";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to one editor instance. Clones share the same editor.
///
/// Dropping the last handle tears the editor down: the pending conversion
/// is cancelled and any in-flight request is aborted.
#[derive(Clone)]
pub struct EditorController {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<EditorState>,
    gateway: Arc<dyn ConversionGateway>,
    debouncer: Mutex<Debouncer>,
    in_flight: Mutex<Option<AbortHandle>>,
    tx: watch::Sender<EditorSnapshot>,
    closed: AtomicBool,
}

impl EditorController {
    pub fn new(
        gateway: Arc<dyn ConversionGateway>,
        debounce: Duration,
        initial: impl Into<String>,
    ) -> Self {
        let state = EditorState::new(initial.into());
        let (tx, _rx) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                gateway,
                debouncer: Mutex::new(Debouncer::new(debounce)),
                in_flight: Mutex::new(None),
                tx,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Schedule the first conversion of the initial document, as if it had
    /// just been typed.
    pub fn mount(&self) {
        let text = lock(&self.inner.state).source().as_str().to_string();
        self.text_changed(text);
    }

    /// Replace the document and (re)start the quiet period.
    pub fn text_changed(&self, text: impl Into<String>) {
        if self.inner.closed.load(Ordering::SeqCst) {
            debug!("Edit ignored: editor is shut down");
            return;
        }

        let generation = {
            let mut state = lock(&self.inner.state);
            let generation = state.record_edit(text.into());
            self.inner.publish(&state);
            generation
        };

        let weak = Arc::downgrade(&self.inner);
        lock(&self.inner.debouncer).schedule(async move {
            if let Some(inner) = weak.upgrade() {
                inner.fire(generation);
            }
        });
    }

    /// Convert `text` right away, superseding every earlier request.
    pub fn convert(&self, text: &str) {
        let mut state = lock(&self.inner.state);
        if self.inner.closed.load(Ordering::SeqCst) {
            return;
        }
        let ticket = state.begin(text);
        self.inner.dispatch(state, ticket);
    }

    /// Convert the current document immediately, skipping the quiet period.
    pub fn convert_now(&self) {
        if self.inner.closed.load(Ordering::SeqCst) {
            return;
        }
        lock(&self.inner.debouncer).cancel();
        let mut state = lock(&self.inner.state);
        if self.inner.closed.load(Ordering::SeqCst) {
            return;
        }
        state.cancel_pending();
        let ticket = state.begin_current();
        self.inner.dispatch(state, ticket);
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        self.inner.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EditorSnapshot> {
        self.inner.tx.subscribe()
    }

    /// Wait until nothing is scheduled and nothing is in flight.
    pub async fn settled(&self) -> EditorSnapshot {
        let mut rx = self.subscribe();
        let snapshot = match rx.wait_for(EditorSnapshot::is_settled).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        snapshot
    }

    /// Tear the editor down. The pending conversion never fires and the
    /// in-flight request, if any, is aborted and ignored.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.teardown();
        info!("Editor shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl Inner {
    fn publish(&self, state: &EditorState) {
        self.tx.send_replace(state.snapshot());
    }

    /// Quiet period elapsed for edit `generation`.
    fn fire(self: Arc<Self>, generation: u64) {
        let mut state = lock(&self.state);
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        if !state.take_pending(generation) {
            debug!(generation, "Debounced conversion superseded before firing");
            return;
        }
        let ticket = state.begin_current();
        self.dispatch(state, ticket);
    }

    /// Publish the state that issued `ticket` and start its request,
    /// aborting the one it supersedes.
    ///
    /// The state guard is held until the in-flight slot is swapped, so the
    /// task left in flight always carries the latest sequence number. Lock
    /// order is `state` then `in_flight`.
    fn dispatch(self: &Arc<Self>, state: MutexGuard<'_, EditorState>, ticket: Option<Ticket>) {
        self.publish(&state);
        let mut in_flight = lock(&self.in_flight);
        if let Some(previous) = in_flight.take() {
            previous.abort();
        }
        let Some(ticket) = ticket else {
            debug!("Blank document; no conversion issued");
            return;
        };

        EventLogger::log_event(
            EVENT_SOURCE,
            StudioEvent::ConversionIssued {
                seq: ticket.seq,
                bytes: ticket.text.len(),
            },
        );

        let gateway = self.gateway.clone();
        let weak: Weak<Inner> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let outcome = gateway.convert(&ticket.text).await;
            if let Some(inner) = weak.upgrade() {
                inner.finish(ticket.seq, outcome, started.elapsed());
            }
        });
        *in_flight = Some(handle.abort_handle());
    }

    fn finish(&self, seq: u64, outcome: StudioResult<String>, elapsed: Duration) {
        let ok = outcome.is_ok();
        let mut state = lock(&self.state);
        match state.complete(seq, outcome) {
            Applied::Fresh => {
                self.publish(&state);
                drop(state);
                EventLogger::log_event(
                    EVENT_SOURCE,
                    StudioEvent::ConversionApplied {
                        seq,
                        ok,
                        latency_ms: elapsed.as_millis() as u64,
                    },
                );
            }
            Applied::Stale { latest } => {
                drop(state);
                EventLogger::log_event(
                    EVENT_SOURCE,
                    StudioEvent::ConversionDiscarded { seq, latest },
                );
            }
        }
    }

    fn teardown(&self) {
        lock(&self.debouncer).cancel();
        let mut state = lock(&self.state);
        state.abandon();
        self.publish(&state);
        if let Some(handle) = lock(&self.in_flight).take() {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.in_flight).take() {
            handle.abort();
        }
    }
}
