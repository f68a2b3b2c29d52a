#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative arena state for a Last Stand play session.
//!
//! The arena owns the horde, the player's health pool and gun, and the
//! session coordinator. Adapters mutate it exclusively through [`apply`] and read it
//! through [`query`]; every observable change is broadcast as an [`Event`].

use std::time::Duration;

use last_stand_core::{Command, Event, Loadout};
use last_stand_system_health::{
    Ammo, DamageOutcome, FireOutcome, Horde, PlayerDamage, PlayerHealth,
};
use last_stand_system_session::{SessionContext, SessionCoordinator};
use tracing::debug;

const DEFAULT_RELOAD_TIME: Duration = Duration::from_secs(3);

/// Configuration parameters required to construct the arena.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    horde: last_stand_system_health::Config,
    session: last_stand_system_session::Config,
    player_max_health: f32,
    reload_time: Duration,
}

impl Config {
    /// Creates a new arena configuration.
    #[must_use]
    pub const fn new(
        horde: last_stand_system_health::Config,
        session: last_stand_system_session::Config,
        player_max_health: f32,
        reload_time: Duration,
    ) -> Self {
        Self {
            horde,
            session,
            player_max_health,
            reload_time,
        }
    }

    /// Configuration handed to the horde system.
    #[must_use]
    pub const fn horde(&self) -> last_stand_system_health::Config {
        self.horde
    }

    /// Configuration handed to the session coordinator.
    #[must_use]
    pub const fn session(&self) -> last_stand_system_session::Config {
        self.session
    }

    /// Health the player starts every session with.
    #[must_use]
    pub const fn player_max_health(&self) -> f32 {
        self.player_max_health
    }

    /// Time a reload takes to refill the magazine.
    #[must_use]
    pub const fn reload_time(&self) -> Duration {
        self.reload_time
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            last_stand_system_health::Config::default(),
            last_stand_system_session::Config::default(),
            last_stand_system_health::DEFAULT_PLAYER_HEALTH,
            DEFAULT_RELOAD_TIME,
        )
    }
}

/// Represents the authoritative state of one arena.
#[derive(Debug)]
pub struct Arena {
    config: Config,
    horde: Horde,
    player: PlayerHealth,
    ammo: Ammo,
    session: SessionCoordinator,
}

impl Arena {
    /// Creates an idle arena. No session runs until [`Command::BeginSession`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            horde: Horde::new(config.horde()),
            player: PlayerHealth::new(config.player_max_health()),
            ammo: Ammo::new(Loadout::DEFAULT, config.reload_time()),
            session: SessionCoordinator::new(config.session()),
            config,
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Applies the provided command to the arena, mutating state deterministically.
///
/// Session termination reaches the outside world through `ctx`: the record
/// sink receives the run record and the scene loader the destination.
pub fn apply(
    arena: &mut Arena,
    command: Command,
    ctx: &mut SessionContext<'_>,
    out_events: &mut Vec<Event>,
) {
    match command {
        Command::BeginSession { selection } => {
            arena.horde.clear();
            arena.player = PlayerHealth::new(arena.config.player_max_health());
            arena.ammo = Ammo::new(selection.loadout, arena.config.reload_time());
            arena
                .session
                .begin_selected(&selection, ctx.clock, out_events);
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            let _ = arena.session.tick(dt, ctx, out_events);
            arena.horde.advance(dt, out_events);
            if let Some(reload) = arena.ammo.advance(dt) {
                out_events.push(Event::Reloaded {
                    magazine: reload.magazine,
                    reserve: reload.reserve,
                });
            }
        }
        Command::SpawnEntity { hits_to_die } => {
            if !arena.session.phase().is_running() {
                debug!(phase = ?arena.session.phase(), "spawn_outside_session_ignored");
                return;
            }
            let _ = arena.horde.spawn(hits_to_die, out_events);
        }
        Command::DamageEntity { entity, amount } => {
            if arena.horde.apply_damage(entity, amount, out_events) == DamageOutcome::Killed {
                let _ = arena.session.notify_kill(ctx, out_events);
            }
        }
        Command::DamagePlayer { amount } => match arena.player.take_damage(amount) {
            PlayerDamage::Ignored => {}
            PlayerDamage::Hurt { health } => out_events.push(Event::PlayerDamaged { health }),
            PlayerDamage::Died => {
                out_events.push(Event::PlayerDamaged { health: 0.0 });
                out_events.push(Event::PlayerDied);
                let _ = arena.session.notify_player_death(ctx, out_events);
            }
        },
        Command::HealPlayer { amount } => {
            if arena.player.heal(amount) {
                out_events.push(Event::PlayerHealed {
                    health: arena.player.current(),
                });
            }
        }
        Command::Fire => match arena.ammo.fire() {
            FireOutcome::Fired { magazine } => out_events.push(Event::ShotFired { magazine }),
            FireOutcome::Empty => out_events.push(Event::DryFire),
            FireOutcome::Reloading => {}
        },
        Command::Reload => {
            if arena.ammo.reload() {
                out_events.push(Event::ReloadStarted);
            }
        }
        Command::PickupAmmo { amount } => {
            let reserve = arena.ammo.add_reserve(amount);
            out_events.push(Event::AmmoPickedUp { reserve });
        }
        Command::AbandonSession => {
            let _ = arena.session.abandon(&mut *ctx.transitions, out_events);
        }
    }
}

/// Query functions that provide read-only access to the arena state.
pub mod query {
    use super::Arena;
    use last_stand_core::{EntityId, HordeView, SessionSnapshot};
    use last_stand_system_health::Ammo;

    /// Captures the session counters for the HUD.
    #[must_use]
    pub fn session(arena: &Arena) -> SessionSnapshot {
        arena.session.snapshot()
    }

    /// Captures a read-only view of the hostile entities in the arena.
    #[must_use]
    pub fn horde_view(arena: &Arena) -> HordeView {
        arena.horde.view()
    }

    /// Reports whether movement and AI should keep driving `entity`.
    #[must_use]
    pub fn is_entity_active(arena: &Arena, entity: EntityId) -> bool {
        arena.horde.is_active(entity)
    }

    /// Health the player currently has left.
    #[must_use]
    pub fn player_health(arena: &Arena) -> f32 {
        arena.player.current()
    }

    /// Maximum health of the player.
    #[must_use]
    pub fn player_max_health(arena: &Arena) -> f32 {
        arena.player.max()
    }

    /// Reports whether the player died in the current session.
    #[must_use]
    pub fn is_player_dead(arena: &Arena) -> bool {
        arena.player.is_dead()
    }

    /// Provides read-only access to the player's gun ammunition.
    #[must_use]
    pub fn ammo(arena: &Arena) -> &Ammo {
        &arena.ammo
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use last_stand_core::{EntityId, SelectedLevel, SessionPhase};
    use last_stand_system_session::{ManualClock, RecordLog, TransitionLog};

    #[test]
    fn begin_session_resets_horde_and_player() {
        let clock = ManualClock::default();
        let mut records = RecordLog::new();
        let mut transitions = TransitionLog::new();
        let mut ctx = SessionContext::new(&clock, &mut records, &mut transitions);
        let mut arena = Arena::default();
        let mut events = Vec::new();

        apply(
            &mut arena,
            Command::BeginSession {
                selection: SelectedLevel::default(),
            },
            &mut ctx,
            &mut events,
        );
        apply(&mut arena, Command::SpawnEntity { hits_to_die: 0 }, &mut ctx, &mut events);
        apply(&mut arena, Command::DamagePlayer { amount: 40.0 }, &mut ctx, &mut events);
        assert_eq!(query::horde_view(&arena).into_vec().len(), 1);
        assert_eq!(query::player_health(&arena), 60.0);

        apply(
            &mut arena,
            Command::BeginSession {
                selection: SelectedLevel::default(),
            },
            &mut ctx,
            &mut events,
        );
        assert!(query::horde_view(&arena).into_vec().is_empty());
        assert_eq!(query::player_health(&arena), query::player_max_health(&arena));
        assert_eq!(query::session(&arena).phase, SessionPhase::Running);
    }

    #[test]
    fn tick_reports_time_before_the_countdown() {
        let clock = ManualClock::default();
        let mut records = RecordLog::new();
        let mut transitions = TransitionLog::new();
        let mut ctx = SessionContext::new(&clock, &mut records, &mut transitions);
        let mut arena = Arena::default();
        let mut events = Vec::new();

        apply(
            &mut arena,
            Command::BeginSession {
                selection: SelectedLevel::default(),
            },
            &mut ctx,
            &mut events,
        );
        events.clear();
        apply(
            &mut arena,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut ctx,
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::TimeAdvanced {
                    dt: Duration::from_secs(1)
                },
                Event::TimerUpdated {
                    remaining: Duration::from_secs(179)
                },
            ]
        );
    }

    #[test]
    fn damage_to_unknown_entities_is_silent() {
        let clock = ManualClock::default();
        let mut records = RecordLog::new();
        let mut transitions = TransitionLog::new();
        let mut ctx = SessionContext::new(&clock, &mut records, &mut transitions);
        let mut arena = Arena::default();
        let mut events = Vec::new();

        apply(
            &mut arena,
            Command::DamageEntity {
                entity: EntityId::new(7),
                amount: 10.0,
            },
            &mut ctx,
            &mut events,
        );

        assert!(events.is_empty());
        assert!(!query::is_entity_active(&arena, EntityId::new(7)));
    }
}
