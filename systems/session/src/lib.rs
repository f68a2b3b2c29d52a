#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session coordinator that arbitrates victory and defeat.
//!
//! The coordinator aggregates kill notifications and frame deltas into a
//! single terminal decision. Two triggers race for termination within a
//! frame: the last kill (victory) and the countdown reaching zero (defeat).
//! Both go through the same [`TerminationLatch`], so each session persists
//! exactly one record and requests exactly one transition, or none at all
//! when it is abandoned first.

mod collaborators;
mod latch;

use std::time::Duration;

use last_stand_core::{
    Destination, Event, FrameClock, LevelNumber, Outcome, RecordSink, RunRecord, SceneTransition,
    SelectedLevel, SessionPhase, SessionSnapshot, DEFAULT_TIME_LIMIT,
};
use tracing::{debug, info};

pub use collaborators::{ManualClock, RecordLog, TransitionLog};
pub use latch::TerminationLatch;

/// Configuration parameters required to construct the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    default_time_limit: Duration,
}

impl Config {
    /// Creates a configuration. A zero fallback is replaced with the built-in default.
    #[must_use]
    pub const fn new(default_time_limit: Duration) -> Self {
        Self {
            default_time_limit: if default_time_limit.is_zero() {
                DEFAULT_TIME_LIMIT
            } else {
                default_time_limit
            },
        }
    }

    /// Time limit applied when a session begins without a positive one.
    #[must_use]
    pub const fn default_time_limit(&self) -> Duration {
        self.default_time_limit
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_LIMIT)
    }
}

/// Collaborators reached when a session terminates.
pub struct SessionContext<'a> {
    /// Source of the termination timestamp.
    pub clock: &'a dyn FrameClock,
    /// History that receives the terminal record.
    pub records: &'a mut dyn RecordSink,
    /// Scene loader asked to show the outcome screen.
    pub transitions: &'a mut dyn SceneTransition,
}

impl<'a> SessionContext<'a> {
    /// Bundles the collaborators for a frame.
    pub fn new(
        clock: &'a dyn FrameClock,
        records: &'a mut dyn RecordSink,
        transitions: &'a mut dyn SceneTransition,
    ) -> Self {
        Self {
            clock,
            records,
            transitions,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct SessionState {
    level: LevelNumber,
    remaining_entities: u32,
    total_entities: u32,
    time_remaining: Duration,
    timer_active: bool,
    started_at: Duration,
}

impl SessionState {
    const fn idle() -> Self {
        Self {
            level: LevelNumber::FIRST,
            remaining_entities: 0,
            total_entities: 0,
            time_remaining: Duration::ZERO,
            timer_active: false,
            started_at: Duration::ZERO,
        }
    }
}

/// Tracks kills and the countdown of one play session at a time.
#[derive(Debug)]
pub struct SessionCoordinator {
    config: Config,
    phase: SessionPhase,
    state: SessionState,
    latch: TerminationLatch,
}

impl SessionCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            phase: SessionPhase::Idle,
            state: SessionState::idle(),
            latch: TerminationLatch::new(),
        }
    }

    /// Starts a session on `level`, resetting any previous one.
    ///
    /// A zero `time_limit` falls back to the configured default.
    pub fn begin(
        &mut self,
        level: LevelNumber,
        total_entities: u32,
        time_limit: Duration,
        clock: &dyn FrameClock,
        out: &mut Vec<Event>,
    ) {
        let time_limit = if time_limit.is_zero() {
            self.config.default_time_limit()
        } else {
            time_limit
        };

        self.state = SessionState {
            level,
            remaining_entities: total_entities,
            total_entities,
            time_remaining: time_limit,
            timer_active: true,
            started_at: clock.now(),
        };
        self.latch = TerminationLatch::new();
        self.phase = SessionPhase::Running;

        info!(
            level = level.get(),
            total_entities,
            time_limit_secs = time_limit.as_secs_f32(),
            "session_started"
        );
        out.push(Event::SessionStarted {
            level,
            total_entities,
            time_limit,
        });
    }

    /// Starts a session using the parameters captured by the level menu.
    pub fn begin_selected(
        &mut self,
        selection: &SelectedLevel,
        clock: &dyn FrameClock,
        out: &mut Vec<Event>,
    ) {
        self.begin(
            selection.level,
            selection.entity_count,
            selection.time_limit,
            clock,
            out,
        );
    }

    /// Counts down the timer; defeats the session when it runs out.
    pub fn tick(
        &mut self,
        dt: Duration,
        ctx: &mut SessionContext<'_>,
        out: &mut Vec<Event>,
    ) -> Option<Outcome> {
        if !self.state.timer_active {
            return None;
        }

        self.state.time_remaining = self.state.time_remaining.saturating_sub(dt);
        out.push(Event::TimerUpdated {
            remaining: self.state.time_remaining,
        });

        if self.state.time_remaining.is_zero() {
            self.state.timer_active = false;
            return self.terminate(Outcome::Defeat, ctx, out);
        }
        None
    }

    /// Counts a kill; wins the session when the last entity falls in time.
    pub fn notify_kill(
        &mut self,
        ctx: &mut SessionContext<'_>,
        out: &mut Vec<Event>,
    ) -> Option<Outcome> {
        if self.phase != SessionPhase::Running || self.state.remaining_entities == 0 {
            return None;
        }

        self.state.remaining_entities -= 1;
        out.push(Event::KillRegistered {
            remaining: self.state.remaining_entities,
        });

        if self.state.remaining_entities == 0 && !self.state.time_remaining.is_zero() {
            return self.terminate(Outcome::Victory, ctx, out);
        }
        None
    }

    /// Loses the session because the player died.
    pub fn notify_player_death(
        &mut self,
        ctx: &mut SessionContext<'_>,
        out: &mut Vec<Event>,
    ) -> Option<Outcome> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        self.terminate(Outcome::Defeat, ctx, out)
    }

    /// Leaves a running session without recording an outcome and returns to
    /// the main menu. Returns `false` when no session was running.
    pub fn abandon(
        &mut self,
        transitions: &mut dyn SceneTransition,
        out: &mut Vec<Event>,
    ) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }

        self.state.timer_active = false;
        self.phase = SessionPhase::Abandoned;
        info!(
            level = self.state.level.get(),
            remaining_entities = self.state.remaining_entities,
            "session_abandoned"
        );
        out.push(Event::SessionAbandoned);
        transitions.request_transition(Destination::MainMenu);
        true
    }

    /// Consumes arena events in order, forwarding clock, kill and player death
    /// notifications. Returns the outcome if one of them ended the session.
    pub fn handle(
        &mut self,
        events: &[Event],
        ctx: &mut SessionContext<'_>,
        out: &mut Vec<Event>,
    ) -> Option<Outcome> {
        let mut outcome = None;
        for event in events {
            let ended = match event {
                Event::TimeAdvanced { dt } => self.tick(*dt, ctx, out),
                Event::EntityKilled { .. } => self.notify_kill(ctx, out),
                Event::PlayerDied => self.notify_player_death(ctx, out),
                _ => None,
            };
            outcome = outcome.or(ended);
        }
        outcome
    }

    /// Lifecycle stage of the current session.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Reports whether a terminal outcome was latched.
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        self.latch.is_claimed()
    }

    /// Entities still standing.
    #[must_use]
    pub const fn remaining_entities(&self) -> u32 {
        self.state.remaining_entities
    }

    /// Time left on the countdown.
    #[must_use]
    pub const fn time_remaining(&self) -> Duration {
        self.state.time_remaining
    }

    /// Captures the counters for presentation layers.
    #[must_use]
    pub const fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            level: self.state.level,
            remaining_entities: self.state.remaining_entities,
            total_entities: self.state.total_entities,
            time_remaining: self.state.time_remaining,
            timer_active: self.state.timer_active,
        }
    }

    fn terminate(
        &mut self,
        outcome: Outcome,
        ctx: &mut SessionContext<'_>,
        out: &mut Vec<Event>,
    ) -> Option<Outcome> {
        if !self.latch.claim() {
            debug!(?outcome, "termination_already_claimed");
            return None;
        }

        self.state.timer_active = false;
        self.phase = SessionPhase::Ended(outcome);

        let record = RunRecord {
            level: self.state.level,
            completed: outcome.completed(),
            time_taken_secs: ctx
                .clock
                .now()
                .saturating_sub(self.state.started_at)
                .as_secs_f32(),
            entities_killed: self
                .state
                .total_entities
                .saturating_sub(self.state.remaining_entities),
            recorded_at: ctx.clock.calendar_now(),
        };

        info!(
            ?outcome,
            level = record.level.get(),
            time_taken_secs = record.time_taken_secs,
            entities_killed = record.entities_killed,
            "session_ended"
        );
        ctx.records.append(record.clone());
        ctx.transitions.request_transition(outcome.destination());
        out.push(Event::SessionEnded { outcome, record });
        Some(outcome)
    }
}

impl Default for SessionCoordinator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_fallback_uses_built_in_default() {
        assert_eq!(
            Config::new(Duration::ZERO).default_time_limit(),
            DEFAULT_TIME_LIMIT
        );
    }

    #[test]
    fn idle_coordinator_ignores_everything() {
        let clock = ManualClock::default();
        let mut records = RecordLog::new();
        let mut transitions = TransitionLog::new();
        let mut ctx = SessionContext::new(&clock, &mut records, &mut transitions);
        let mut coordinator = SessionCoordinator::default();
        let mut events = Vec::new();

        assert_eq!(coordinator.tick(Duration::from_secs(500), &mut ctx, &mut events), None);
        assert_eq!(coordinator.notify_kill(&mut ctx, &mut events), None);
        assert_eq!(coordinator.notify_player_death(&mut ctx, &mut events), None);
        assert!(events.is_empty());
        assert_eq!(coordinator.phase(), SessionPhase::Idle);
        assert!(records.records().is_empty());
    }

    #[test]
    fn zero_time_limit_uses_configured_default() {
        let clock = ManualClock::default();
        let mut coordinator = SessionCoordinator::new(Config::new(Duration::from_secs(90)));
        let mut events = Vec::new();

        coordinator.begin(LevelNumber::FIRST, 3, Duration::ZERO, &clock, &mut events);

        assert_eq!(coordinator.time_remaining(), Duration::from_secs(90));
    }
}
