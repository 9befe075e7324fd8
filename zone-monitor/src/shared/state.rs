//! Refresh state shared between the poller and the dashboard.
//!
//! Owns the only mutable piece of the system: the current [`Snapshot`], its
//! derived [`MonitorView`] and the loading/error status. Every poll outcome
//! is applied through [`MonitorState::apply_snapshot`] or
//! [`MonitorState::apply_error`], tagged with the sequence number handed out
//! by [`MonitorState::begin_request`], so a slow reply can never overwrite a
//! newer one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::shared::aggregation::{sort_records, MonitorView, PositionScale};
use crate::shared::error::MonitorError;
use crate::shared::types::{MonitorResponse, Snapshot};

/// Lifecycle of the dashboard data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshStatus {
    /// No poll has completed yet
    #[default]
    Loading,
    /// Latest poll succeeded
    Ready,
    /// Latest poll failed; any previous snapshot is retained but stale
    Error,
}

impl RefreshStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RefreshStatus::Loading => "LOADING",
            RefreshStatus::Ready => "LIVE",
            RefreshStatus::Error => "ERROR",
        }
    }
}

/// Read-only copy of the refresh state for renderers
#[derive(Clone, Debug, Default)]
pub struct MonitorSnapshot {
    pub status: RefreshStatus,
    pub snapshot: Option<Arc<Snapshot>>,
    pub view: Option<Arc<MonitorView>>,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
    pub polls_applied: u64,
}

impl MonitorSnapshot {
    pub fn is_loading(&self) -> bool {
        self.status == RefreshStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == RefreshStatus::Error
    }
}

/// Single owner of the dashboard state
#[derive(Debug)]
pub struct MonitorState {
    position_scale: PositionScale,
    status: RefreshStatus,
    snapshot: Option<Arc<Snapshot>>,
    view: Option<Arc<MonitorView>>,
    last_error: Option<String>,
    last_success: Option<DateTime<Utc>>,

    // Sequencing
    next_sequence: u64,
    latest_applied: Option<u64>,
    polls_applied: u64,

    closed: bool,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::with_position_scale(PositionScale::default())
    }

    pub fn with_position_scale(position_scale: PositionScale) -> Self {
        Self {
            position_scale,
            status: RefreshStatus::Loading,
            snapshot: None,
            view: None,
            last_error: None,
            last_success: None,
            next_sequence: 0,
            latest_applied: None,
            polls_applied: 0,
            closed: false,
        }
    }

    /// Hand out the sequence number for a new request
    pub fn begin_request(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    /// Whether an outcome for `sequence` may still change the state
    fn accepts(&self, sequence: u64) -> bool {
        if self.closed {
            return false;
        }
        match self.latest_applied {
            Some(latest) => sequence > latest,
            None => true,
        }
    }

    /// Replace the snapshot with a freshly parsed response.
    ///
    /// Returns `false` (and changes nothing) if the state is closed or a newer
    /// request has already been applied.
    pub fn apply_snapshot(&mut self, sequence: u64, response: MonitorResponse) -> bool {
        if !self.accepts(sequence) {
            debug!(sequence, latest = ?self.latest_applied, "discarding stale snapshot");
            return false;
        }

        let received_at = Utc::now();
        let snapshot = Snapshot {
            sequence,
            records: sort_records(response.trades),
            zone_counts: response.zone_distribution,
            generated_at: response.timestamp,
            received_at,
        };
        let view = MonitorView::from_snapshot(&snapshot, self.position_scale);

        self.snapshot = Some(Arc::new(snapshot));
        self.view = Some(Arc::new(view));
        self.status = RefreshStatus::Ready;
        self.last_error = None;
        self.last_success = Some(received_at);
        self.latest_applied = Some(sequence);
        self.polls_applied += 1;
        true
    }

    /// Flag the latest poll as failed, keeping any previous snapshot.
    ///
    /// Same staleness rules as [`MonitorState::apply_snapshot`].
    pub fn apply_error(&mut self, sequence: u64, error: &MonitorError) -> bool {
        if !self.accepts(sequence) {
            debug!(sequence, latest = ?self.latest_applied, "discarding stale error");
            return false;
        }

        self.status = RefreshStatus::Error;
        self.last_error = Some(error.to_string());
        self.latest_applied = Some(sequence);
        self.polls_applied += 1;
        true
    }

    /// Tear down: no further transitions are accepted
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn status(&self) -> RefreshStatus {
        self.status
    }

    pub fn current(&self) -> Option<&Arc<Snapshot>> {
        self.snapshot.as_ref()
    }

    /// Cheap copy of the current state for rendering
    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            status: self.status,
            snapshot: self.snapshot.clone(),
            view: self.view.clone(),
            last_error: self.last_error.clone(),
            last_success: self.last_success,
            polls_applied: self.polls_applied,
        }
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}
