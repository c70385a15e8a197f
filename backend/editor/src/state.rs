//! Editor reconciliation state.
//!
//! Pure and synchronous: the controller drives it from timer and network
//! callbacks, and everything here can be exercised without a runtime.
//!
//! Two counters keep stale work out:
//! - `edits` identifies the debounce window; a scheduled fire whose
//!   generation is not the latest edit is dropped without running.
//! - `latest_seq` identifies the conversion request; a completion whose
//!   sequence number is not the latest issued is discarded.

use chrono::Utc;
use studio_core::{EditorSnapshot, RenderResult, SourceDocument, StudioResult};

/// A conversion that has been issued and awaits its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub text: String,
}

/// What `complete` did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Fresh,
    /// Superseded by a newer request; the result was left untouched.
    Stale { latest: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct EditorState {
    source: SourceDocument,
    result: RenderResult,
    loading: bool,
    pending: bool,
    edits: u64,
    latest_seq: u64,
}

impl EditorState {
    pub fn new(initial: impl Into<SourceDocument>) -> Self {
        Self {
            source: initial.into(),
            ..Default::default()
        }
    }

    pub fn source(&self) -> &SourceDocument {
        &self.source
    }

    pub fn result(&self) -> &RenderResult {
        &self.result
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Replace the document and open a new debounce window.
    ///
    /// Returns the window's generation, to be handed back to `take_pending`
    /// when the quiet period elapses.
    pub fn record_edit(&mut self, text: impl Into<SourceDocument>) -> u64 {
        self.source = text.into();
        self.edits += 1;
        self.pending = true;
        self.edits
    }

    /// Claim the scheduled conversion for `generation`.
    ///
    /// False when a later edit reopened the window or the schedule was
    /// cancelled in between.
    pub fn take_pending(&mut self, generation: u64) -> bool {
        if !self.pending || generation != self.edits {
            return false;
        }
        self.pending = false;
        true
    }

    /// Drop any scheduled conversion. Returns whether one was pending.
    pub fn cancel_pending(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }

    /// Issue a conversion of `text`.
    ///
    /// Every call supersedes all earlier requests. Blank text resolves to
    /// `Empty` on the spot and yields no ticket.
    pub fn begin(&mut self, text: &str) -> Option<Ticket> {
        self.latest_seq += 1;

        if text.trim().is_empty() {
            self.result = RenderResult::Empty;
            self.loading = false;
            return None;
        }

        self.loading = true;
        if matches!(self.result, RenderResult::Error { .. }) {
            self.result = RenderResult::Empty;
        }
        Some(Ticket {
            seq: self.latest_seq,
            text: text.to_string(),
        })
    }

    /// Issue a conversion of the current document.
    pub fn begin_current(&mut self) -> Option<Ticket> {
        let text = self.source.as_str().to_string();
        self.begin(&text)
    }

    /// Apply the response for request `seq`, unless a newer one exists.
    pub fn complete(&mut self, seq: u64, outcome: StudioResult<String>) -> Applied {
        if seq != self.latest_seq {
            return Applied::Stale {
                latest: self.latest_seq,
            };
        }

        self.result = match outcome {
            Ok(html) => RenderResult::Html { html },
            Err(err) => RenderResult::Error {
                message: err.user_message(),
            },
        };
        self.loading = false;
        Applied::Fresh
    }

    /// Stop tracking whatever is in flight (teardown).
    pub fn abandon(&mut self) {
        self.latest_seq += 1;
        self.loading = false;
        self.pending = false;
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            source: self.source.clone(),
            result: self.result.clone(),
            loading: self.loading,
            pending: self.pending,
            seq: self.latest_seq,
            updated_at: Utc::now(),
        }
    }
}
