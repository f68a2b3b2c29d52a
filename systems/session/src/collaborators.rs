//! Deterministic stand-ins for the collaborators a session talks to.
//!
//! Headless drivers and tests use these instead of an engine clock and a
//! scene loader.

use std::time::Duration;

use last_stand_core::{Destination, FrameClock, RecordSink, RunRecord, SceneTransition};
use time::OffsetDateTime;

/// Clock that only moves when told to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManualClock {
    now: Duration,
    epoch: Option<OffsetDateTime>,
}

impl ManualClock {
    /// Creates a clock at zero whose calendar time starts at `epoch`.
    #[must_use]
    pub const fn new(epoch: Option<OffsetDateTime>) -> Self {
        Self {
            now: Duration::ZERO,
            epoch,
        }
    }

    /// Moves the clock forward by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Some(OffsetDateTime::UNIX_EPOCH))
    }
}

impl FrameClock for ManualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn calendar_now(&self) -> Option<OffsetDateTime> {
        self.epoch.map(|epoch| epoch + self.now)
    }
}

/// Scene loader that remembers every requested destination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionLog {
    requests: Vec<Destination>,
}

impl TransitionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Destinations in request order.
    #[must_use]
    pub fn requests(&self) -> &[Destination] {
        &self.requests
    }

    /// Most recent destination, if any.
    #[must_use]
    pub fn last(&self) -> Option<Destination> {
        self.requests.last().copied()
    }
}

impl SceneTransition for TransitionLog {
    fn request_transition(&mut self, destination: Destination) {
        self.requests.push(destination);
    }
}

/// Volatile record sink holding appended records in memory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordLog {
    records: Vec<RunRecord>,
}

impl RecordLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in append order.
    #[must_use]
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }
}

impl RecordSink for RecordLog {
    fn append(&mut self, record: RunRecord) {
        self.records.push(record);
    }
}
