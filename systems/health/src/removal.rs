//! Deferred "wait, fade, remove" sequence applied to dead entities.

use std::time::Duration;

use last_stand_core::{EntityId, Event};

const DEFAULT_FADE_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_FADE_DURATION: Duration = Duration::from_secs(2);

/// Timing of the corpse fade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemovalTiming {
    delay: Duration,
    fade: Duration,
}

impl RemovalTiming {
    /// Creates a timing that waits `delay` and then fades over `fade`.
    #[must_use]
    pub const fn new(delay: Duration, fade: Duration) -> Self {
        Self { delay, fade }
    }

    /// Time a corpse stays fully visible.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Time taken to fade from opaque to invisible.
    #[must_use]
    pub const fn fade(&self) -> Duration {
        self.fade
    }

    fn total(&self) -> Duration {
        self.delay.saturating_add(self.fade)
    }
}

impl Default for RemovalTiming {
    fn default() -> Self {
        Self::new(DEFAULT_FADE_DELAY, DEFAULT_FADE_DURATION)
    }
}

#[derive(Clone, Copy, Debug)]
struct PendingRemoval {
    entity: EntityId,
    elapsed: Duration,
}

/// Fire-and-forget queue of corpses awaiting removal.
///
/// Tasks advance with the frame delta and never block the caller. There is
/// no cancellation: a scheduled corpse always ends with
/// [`Event::EntityRemoved`].
#[derive(Clone, Debug)]
pub struct RemovalSchedule {
    timing: RemovalTiming,
    pending: Vec<PendingRemoval>,
}

impl RemovalSchedule {
    /// Creates an empty schedule.
    #[must_use]
    pub fn new(timing: RemovalTiming) -> Self {
        Self {
            timing,
            pending: Vec::new(),
        }
    }

    /// Queues `entity` for removal. Entities already queued are ignored.
    pub fn schedule(&mut self, entity: EntityId) {
        if self.pending.iter().any(|pending| pending.entity == entity) {
            return;
        }
        self.pending.push(PendingRemoval {
            entity,
            elapsed: Duration::ZERO,
        });
    }

    /// Number of corpses still waiting to be removed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether nothing is waiting to be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every queued removal.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Advances every queued task, emitting fade progress and removals.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.pending.is_empty() {
            return;
        }

        let timing = self.timing;
        self.pending.retain_mut(|pending| {
            pending.elapsed = pending.elapsed.saturating_add(dt);
            if pending.elapsed >= timing.total() {
                out.push(Event::EntityRemoved {
                    entity: pending.entity,
                });
                return false;
            }

            if pending.elapsed > timing.delay() {
                let into_fade = pending.elapsed - timing.delay();
                let progress = into_fade.as_secs_f32() / timing.fade().as_secs_f32();
                out.push(Event::EntityFading {
                    entity: pending.entity,
                    opacity: (1.0 - progress).clamp(0.0, 1.0),
                });
            }
            true
        });
    }
}
