//! Sticky error tracking
//!
//! Sensor dropout is expected during a streaming session and must degrade
//! gracefully: a modality that is missing from every packet would otherwise
//! produce one diagnostic line per packet at sensor rate. The tracker
//! guarantees at most one line per modality per session. It is an owned
//! component (constructed fresh per processor, trivially resettable in
//! tests), not a global.

use tracing::error;

/// One diagnostic already emitted for a failing modality
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub id: String,
    pub message: String,
}

/// Append-only record of modalities already reported this session.
///
/// Per id the state machine is UNREPORTED → REPORTED; REPORTED is terminal
/// until the tracker is dropped with the processor that owns it.
#[derive(Debug, Default)]
pub struct ErrorTracker {
    reported: Vec<ReportedError>,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit one diagnostic line for `id`, unless one was already emitted.
    ///
    /// The first call for an id logs `message` and records it; every later
    /// call for the same id is a no-op regardless of the message.
    pub fn report_once(&mut self, id: &str, message: &str) {
        if self.is_reported(id) {
            return;
        }
        error!(modality = id, "{message}");
        self.reported.push(ReportedError {
            id: id.to_string(),
            message: message.to_string(),
        });
    }

    /// Has `id` already been reported this session?
    pub fn is_reported(&self, id: &str) -> bool {
        self.reported.iter().any(|r| r.id == id)
    }

    /// Everything reported so far, in first-failure order
    pub fn reported(&self) -> &[ReportedError] {
        &self.reported
    }

    pub fn reported_count(&self) -> usize {
        self.reported.len()
    }
}
