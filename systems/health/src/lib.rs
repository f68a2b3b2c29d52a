#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Hit-point state machines for hostile entities and the player, plus the
//! player's ammunition.
//!
//! Every hostile entity owns an [`EntityHealth`] counter that flips from
//! alive to dead exactly once. The [`Horde`] system owns the counters of all
//! entities in the arena, turns the death transition into a single
//! [`Event::EntityKilled`], parks the corpse (movement and AI disabled) and
//! hands it to the deferred [`RemovalSchedule`] for fading.

mod ammo;
mod player;
mod removal;

use std::collections::BTreeMap;
use std::time::Duration;

use last_stand_core::{EntityId, EntitySnapshot, Event, HordeView};

pub use ammo::{Ammo, FireOutcome, Reload, AMMO_PICKUP_AMOUNT};
pub use player::{PlayerDamage, PlayerHealth, DEFAULT_PLAYER_HEALTH};
pub use removal::{RemovalSchedule, RemovalTiming};

/// Hits absorbed by an entity when the spawner does not specify otherwise.
pub const DEFAULT_HITS_TO_DIE: u32 = 5;

/// Result of a single damage application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The hit was discarded: the target was already dead, unknown, or the
    /// amount was not a positive finite number.
    Ignored,
    /// The hit landed and the entity is still alive.
    Wounded {
        /// Hits absorbed so far.
        hits_taken: u32,
    },
    /// The hit killed the entity.
    Killed,
}

/// Hit counter owned by a single hostile entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityHealth {
    hits_taken: u32,
    hits_to_die: u32,
    alive: bool,
}

impl EntityHealth {
    /// Creates a living entity that dies after `hits_to_die` hits.
    ///
    /// A zero threshold is raised to one.
    #[must_use]
    pub const fn new(hits_to_die: u32) -> Self {
        Self {
            hits_taken: 0,
            hits_to_die: if hits_to_die == 0 { 1 } else { hits_to_die },
            alive: true,
        }
    }

    /// Applies a single hit. Each accepted application counts as one hit
    /// regardless of its magnitude.
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if !self.alive || !amount.is_finite() || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }

        self.hits_taken = self.hits_taken.saturating_add(1);
        if self.hits_taken >= self.hits_to_die {
            self.alive = false;
            return DamageOutcome::Killed;
        }

        DamageOutcome::Wounded {
            hits_taken: self.hits_taken,
        }
    }

    /// Reports whether the entity has died.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        !self.alive
    }

    /// Hits absorbed so far.
    #[must_use]
    pub const fn hits_taken(&self) -> u32 {
        self.hits_taken
    }

    /// Hits required to kill the entity.
    #[must_use]
    pub const fn hits_to_die(&self) -> u32 {
        self.hits_to_die
    }
}

/// Configuration parameters required to construct the horde system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    default_hits_to_die: u32,
    removal: RemovalTiming,
}

impl Config {
    /// Creates a new configuration.
    #[must_use]
    pub const fn new(default_hits_to_die: u32, removal: RemovalTiming) -> Self {
        Self {
            default_hits_to_die,
            removal,
        }
    }

    /// Hits used for entities spawned with a zero threshold.
    #[must_use]
    pub const fn default_hits_to_die(&self) -> u32 {
        self.default_hits_to_die
    }

    /// Timing of the fade applied to corpses.
    #[must_use]
    pub const fn removal(&self) -> RemovalTiming {
        self.removal
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_HITS_TO_DIE, RemovalTiming::default())
    }
}

#[derive(Clone, Copy, Debug)]
struct Hostile {
    health: EntityHealth,
    active: bool,
}

/// System owning the hit counters of every hostile entity in the arena.
#[derive(Debug)]
pub struct Horde {
    config: Config,
    entities: BTreeMap<EntityId, Hostile>,
    removals: RemovalSchedule,
    next_id: u32,
}

impl Horde {
    /// Creates an empty horde.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            removals: RemovalSchedule::new(config.removal()),
            config,
            entities: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Registers a newly spawned entity and returns its identifier.
    ///
    /// A zero `hits_to_die` falls back to the configured default.
    pub fn spawn(&mut self, hits_to_die: u32, out: &mut Vec<Event>) -> EntityId {
        let hits_to_die = if hits_to_die == 0 {
            self.config.default_hits_to_die()
        } else {
            hits_to_die
        };

        let entity = EntityId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let health = EntityHealth::new(hits_to_die);
        let _ = self.entities.insert(
            entity,
            Hostile {
                health,
                active: true,
            },
        );
        out.push(Event::EntitySpawned {
            entity,
            hits_to_die: health.hits_to_die(),
        });
        entity
    }

    /// Applies a hit to `entity`, running the death sequence on the killing blow.
    pub fn apply_damage(
        &mut self,
        entity: EntityId,
        amount: f32,
        out: &mut Vec<Event>,
    ) -> DamageOutcome {
        let Some(hostile) = self.entities.get_mut(&entity) else {
            return DamageOutcome::Ignored;
        };

        let outcome = hostile.health.apply_damage(amount);
        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Wounded { hits_taken } => {
                out.push(Event::EntityDamaged { entity, hits_taken });
            }
            DamageOutcome::Killed => {
                hostile.active = false;
                out.push(Event::EntityKilled { entity });
                self.removals.schedule(entity);
            }
        }
        outcome
    }

    /// Advances deferred corpse removal, dropping entities whose fade finished.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let start = out.len();
        self.removals.advance(dt, out);
        for event in &out[start..] {
            if let Event::EntityRemoved { entity } = event {
                let _ = self.entities.remove(entity);
            }
        }
    }

    /// Reports whether the entity has died. Unknown entities yield `None`.
    #[must_use]
    pub fn is_dead(&self, entity: EntityId) -> Option<bool> {
        self.entities
            .get(&entity)
            .map(|hostile| hostile.health.is_dead())
    }

    /// Reports whether movement and AI should keep driving the entity.
    #[must_use]
    pub fn is_active(&self, entity: EntityId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|hostile| hostile.active)
    }

    /// Number of entities still alive.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.entities
            .values()
            .filter(|hostile| !hostile.health.is_dead())
            .count()
    }

    /// Captures a read-only view of every tracked entity.
    #[must_use]
    pub fn view(&self) -> HordeView {
        let snapshots = self
            .entities
            .iter()
            .map(|(id, hostile)| EntitySnapshot {
                id: *id,
                hits_taken: hostile.health.hits_taken(),
                hits_to_die: hostile.health.hits_to_die(),
                alive: !hostile.health.is_dead(),
                active: hostile.active,
            })
            .collect();
        HordeView::from_snapshots(snapshots)
    }

    /// Forgets every entity and pending removal. Identifiers keep increasing.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.removals.clear();
    }
}

impl Default for Horde {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threshold_is_raised_to_one() {
        let mut health = EntityHealth::new(0);
        assert_eq!(health.hits_to_die(), 1);
        assert_eq!(health.apply_damage(1.0), DamageOutcome::Killed);
    }

    #[test]
    fn invalid_amounts_do_not_count_as_hits() {
        let mut health = EntityHealth::new(2);
        for amount in [0.0, -3.0, f32::NAN, f32::INFINITY] {
            assert_eq!(health.apply_damage(amount), DamageOutcome::Ignored);
        }
        assert_eq!(health.hits_taken(), 0);
    }

    #[test]
    fn hits_stop_counting_after_death() {
        let mut health = EntityHealth::new(2);
        assert_eq!(
            health.apply_damage(10.0),
            DamageOutcome::Wounded { hits_taken: 1 }
        );
        assert_eq!(health.apply_damage(10.0), DamageOutcome::Killed);
        assert_eq!(health.apply_damage(10.0), DamageOutcome::Ignored);
        assert_eq!(health.hits_taken(), 2);
        assert!(health.is_dead());
    }

    #[test]
    fn spawn_with_zero_hits_uses_configured_default() {
        let mut horde = Horde::new(Config::new(3, RemovalTiming::default()));
        let mut events = Vec::new();
        let entity = horde.spawn(0, &mut events);

        assert_eq!(
            events,
            vec![Event::EntitySpawned {
                entity,
                hits_to_die: 3
            }]
        );
    }

    #[test]
    fn unknown_entities_ignore_damage() {
        let mut horde = Horde::default();
        let mut events = Vec::new();
        let outcome = horde.apply_damage(EntityId::new(99), 1.0, &mut events);

        assert_eq!(outcome, DamageOutcome::Ignored);
        assert!(events.is_empty());
        assert_eq!(horde.is_dead(EntityId::new(99)), None);
        assert!(!horde.is_active(EntityId::new(99)));
    }
}
