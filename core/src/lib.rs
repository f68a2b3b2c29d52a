#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Last Stand session engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative arena, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the arena executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation layers to react to deterministically. Collaborators that live
//! outside the core (scene loading, persisted preferences, the frame clock)
//! are reached exclusively through the traits declared here.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Number of hostile entities used when no level was ever selected.
pub const DEFAULT_ENTITY_COUNT: u32 = 20;

/// Session duration used when no level was ever selected.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(180);

/// Commands that express all permissible arena mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts (or restarts) a play session using the provided level selection.
    BeginSession {
        /// Level parameters chosen by the menu flow.
        selection: SelectedLevel,
    },
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous frame.
        dt: Duration,
    },
    /// Registers a freshly spawned hostile entity with the arena.
    SpawnEntity {
        /// Number of hits the entity absorbs before dying.
        hits_to_die: u32,
    },
    /// Applies a single damage application to a hostile entity.
    DamageEntity {
        /// Identifier of the entity that was hit.
        entity: EntityId,
        /// Magnitude reported by the weapon that landed the hit.
        amount: f32,
    },
    /// Applies damage to the player.
    DamagePlayer {
        /// Health points removed from the player.
        amount: f32,
    },
    /// Restores health to the player.
    HealPlayer {
        /// Health points restored to the player.
        amount: f32,
    },
    /// Pulls the trigger, spending one round from the magazine.
    Fire,
    /// Starts refilling the magazine from the reserve.
    Reload,
    /// Adds rounds collected from an ammunition pickup to the reserve.
    PickupAmmo {
        /// Rounds added to the reserve.
        amount: u32,
    },
    /// Leaves the session without recording an outcome.
    AbandonSession,
}

/// Events broadcast by the arena after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a session began and its counters were initialised.
    SessionStarted {
        /// Level the session is played on.
        level: LevelNumber,
        /// Number of hostile entities that must be eliminated.
        total_entities: u32,
        /// Time budget granted to the player.
        time_limit: Duration,
    },
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the frame.
        dt: Duration,
    },
    /// Reports the countdown after a frame was applied to a running timer.
    TimerUpdated {
        /// Time left before the session is lost.
        remaining: Duration,
    },
    /// Confirms that a hostile entity joined the arena.
    EntitySpawned {
        /// Identifier allocated to the entity.
        entity: EntityId,
        /// Number of hits the entity absorbs before dying.
        hits_to_die: u32,
    },
    /// Reports that a hit landed on a living entity without killing it.
    EntityDamaged {
        /// Identifier of the entity that was hit.
        entity: EntityId,
        /// Hits absorbed so far.
        hits_taken: u32,
    },
    /// Announces the death of a hostile entity. Emitted at most once per entity.
    EntityKilled {
        /// Identifier of the entity that died.
        entity: EntityId,
    },
    /// Confirms that the coordinator accepted a kill.
    KillRegistered {
        /// Entities still standing after the kill was counted.
        remaining: u32,
    },
    /// Reports the fade progress of a dead entity awaiting removal.
    EntityFading {
        /// Identifier of the fading entity.
        entity: EntityId,
        /// Opacity in the range `0.0..=1.0`.
        opacity: f32,
    },
    /// Announces that a dead entity finished fading and left the arena.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
    },
    /// Reports that the player lost health.
    PlayerDamaged {
        /// Health remaining after the hit.
        health: f32,
    },
    /// Reports that the player regained health.
    PlayerHealed {
        /// Health after healing was applied.
        health: f32,
    },
    /// Announces the death of the player.
    PlayerDied,
    /// Confirms that a round left the magazine.
    ShotFired {
        /// Rounds left in the magazine.
        magazine: u32,
    },
    /// Reports a trigger pull on an empty magazine.
    DryFire,
    /// Announces that the magazine began refilling.
    ReloadStarted,
    /// Announces that a reload finished.
    Reloaded {
        /// Rounds in the magazine after the reload.
        magazine: u32,
        /// Spare rounds left in the reserve.
        reserve: u32,
    },
    /// Confirms that an ammunition pickup was collected.
    AmmoPickedUp {
        /// Spare rounds in the reserve after the pickup.
        reserve: u32,
    },
    /// Announces the terminal outcome of the session.
    SessionEnded {
        /// Whether the session was won or lost.
        outcome: Outcome,
        /// Record persisted for the session.
        record: RunRecord,
    },
    /// Announces that the session was left without an outcome.
    SessionAbandoned,
}

/// Unique identifier assigned to a hostile entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-based number identifying a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelNumber(u32);

impl LevelNumber {
    /// The first level; used whenever a selection is missing or invalid.
    pub const FIRST: Self = Self(1);

    /// Wraps the provided level number without validating it.
    ///
    /// Registries decide which numbers are valid; persisted records may carry
    /// a zero level when their fields went missing.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the level.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl Default for LevelNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Ammunition the player starts a level with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    magazine_size: u32,
    reserve: u32,
}

impl Loadout {
    /// Loadout of the first level, also used when a level declares none.
    pub const DEFAULT: Self = Self::new(20, 120);

    /// Creates a loadout with a full magazine of `magazine_size` rounds and
    /// `reserve` spare rounds.
    #[must_use]
    pub const fn new(magazine_size: u32, reserve: u32) -> Self {
        Self {
            magazine_size,
            reserve,
        }
    }

    /// Rounds held by a full magazine.
    #[must_use]
    pub const fn magazine_size(&self) -> u32 {
        self.magazine_size
    }

    /// Spare rounds carried outside the magazine.
    #[must_use]
    pub const fn reserve(&self) -> u32 {
        self.reserve
    }
}

impl Default for Loadout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Immutable parameters describing a single level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    level: LevelNumber,
    entity_count: u32,
    time_limit: Duration,
    loadout: Loadout,
}

impl LevelConfig {
    /// Creates a new level description carrying the default loadout.
    #[must_use]
    pub const fn new(level: LevelNumber, entity_count: u32, time_limit: Duration) -> Self {
        Self {
            level,
            entity_count,
            time_limit,
            loadout: Loadout::DEFAULT,
        }
    }

    /// Replaces the loadout granted at the start of the level.
    #[must_use]
    pub const fn with_loadout(self, loadout: Loadout) -> Self {
        Self { loadout, ..self }
    }

    /// Number identifying the level.
    #[must_use]
    pub const fn level(&self) -> LevelNumber {
        self.level
    }

    /// Number of hostile entities spawned for the level.
    #[must_use]
    pub const fn entity_count(&self) -> u32 {
        self.entity_count
    }

    /// Time budget granted to clear the level.
    #[must_use]
    pub const fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Ammunition granted at the start of the level.
    #[must_use]
    pub const fn loadout(&self) -> Loadout {
        self.loadout
    }
}

/// Level parameters chosen by the menu flow and read by session setup.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectedLevel {
    /// Level that was started.
    pub level: LevelNumber,
    /// Number of hostile entities to spawn.
    pub entity_count: u32,
    /// Time budget for the session.
    pub time_limit: Duration,
    /// Ammunition the player starts with.
    pub loadout: Loadout,
}

impl SelectedLevel {
    /// Captures the selection described by a level configuration.
    #[must_use]
    pub const fn from_config(config: &LevelConfig) -> Self {
        Self {
            level: config.level(),
            entity_count: config.entity_count(),
            time_limit: config.time_limit(),
            loadout: config.loadout(),
        }
    }
}

impl Default for SelectedLevel {
    fn default() -> Self {
        Self {
            level: LevelNumber::FIRST,
            entity_count: DEFAULT_ENTITY_COUNT,
            time_limit: DEFAULT_TIME_LIMIT,
            loadout: Loadout::DEFAULT,
        }
    }
}

/// Terminal result of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every hostile entity was eliminated before the timer expired.
    Victory,
    /// The timer expired or the player died.
    Defeat,
}

impl Outcome {
    /// Reports whether the outcome counts as a completed level.
    #[must_use]
    pub const fn completed(self) -> bool {
        matches!(self, Self::Victory)
    }

    /// Screen the presentation layer should show for the outcome.
    #[must_use]
    pub const fn destination(self) -> Destination {
        match self {
            Self::Victory => Destination::Victory,
            Self::Defeat => Destination::Defeat,
        }
    }
}

/// Screens the core may ask the presentation layer to transition to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    /// Screen shown after a won session.
    Victory,
    /// Screen shown after a lost session.
    Defeat,
    /// Title screen.
    MainMenu,
}

/// Lifecycle stage of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// No session has been started.
    Idle,
    /// Counters are live and the timer is running.
    Running,
    /// The session reached a terminal outcome.
    Ended(Outcome),
    /// The session was left before reaching an outcome.
    Abandoned,
}

impl SessionPhase {
    /// Reports whether kills and the timer still count.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Terminal outcome, if one was reached.
    #[must_use]
    pub const fn outcome(self) -> Option<Outcome> {
        match self {
            Self::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Persisted summary of one completed or failed session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Level the session was played on.
    pub level: LevelNumber,
    /// Whether the level was cleared.
    pub completed: bool,
    /// Seconds elapsed between session start and termination.
    pub time_taken_secs: f32,
    /// Number of hostile entities eliminated.
    pub entities_killed: u32,
    /// Calendar time at which the session ended, when known.
    #[serde(with = "rfc3339_opt")]
    pub recorded_at: Option<OffsetDateTime>,
}

impl RunRecord {
    /// Seconds elapsed, converted into a duration. Negative or invalid values map to zero.
    #[must_use]
    pub fn time_taken(&self) -> Duration {
        Duration::try_from_secs_f32(self.time_taken_secs).unwrap_or(Duration::ZERO)
    }
}

/// Immutable representation of the coordinator's counters used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Lifecycle stage of the session.
    pub phase: SessionPhase,
    /// Level the session is played on.
    pub level: LevelNumber,
    /// Entities still standing.
    pub remaining_entities: u32,
    /// Entities that had to be eliminated when the session began.
    pub total_entities: u32,
    /// Time left on the countdown.
    pub time_remaining: Duration,
    /// Whether the countdown is still ticking.
    pub timer_active: bool,
}

impl SessionSnapshot {
    /// Number of entities eliminated so far.
    #[must_use]
    pub const fn entities_killed(&self) -> u32 {
        self.total_entities.saturating_sub(self.remaining_entities)
    }
}

/// Immutable representation of a single hostile entity used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntitySnapshot {
    /// Identifier allocated to the entity.
    pub id: EntityId,
    /// Hits absorbed so far.
    pub hits_taken: u32,
    /// Hits required to kill the entity.
    pub hits_to_die: u32,
    /// Whether the entity is still alive.
    pub alive: bool,
    /// Whether movement and AI should keep driving the entity.
    pub active: bool,
}

/// Read-only snapshot describing every hostile entity in the arena.
#[derive(Clone, Debug, Default)]
pub struct HordeView {
    snapshots: Vec<EntitySnapshot>,
}

impl HordeView {
    /// Creates a new view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Number of entities that are still alive.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.snapshots.iter().filter(|snapshot| snapshot.alive).count()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}

/// Persisted key-value substrate backing level selection and run records.
///
/// Reads never fail: a missing key or a value stored with another type
/// yields `None`. Writes are buffered until [`KeyValueStore::save`].
pub trait KeyValueStore {
    /// Error reported when buffered writes cannot be made durable.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads an integer value.
    fn get_int(&self, key: &str) -> Option<i32>;

    /// Stores an integer value.
    fn set_int(&mut self, key: &str, value: i32);

    /// Reads a floating point value.
    fn get_float(&self, key: &str) -> Option<f32>;

    /// Stores a floating point value.
    fn set_float(&mut self, key: &str, value: f32);

    /// Reads a string value.
    fn get_string(&self, key: &str) -> Option<String>;

    /// Stores a string value.
    fn set_string(&mut self, key: &str, value: &str);

    /// Removes a key regardless of its type. Missing keys are ignored.
    fn delete_key(&mut self, key: &str);

    /// Reports whether any value is stored under the key.
    fn has_key(&self, key: &str) -> bool;

    /// Makes every buffered write durable.
    fn save(&mut self) -> Result<(), Self::Error>;
}

/// Presentation collaborator that loads the next screen.
pub trait SceneTransition {
    /// Requests a transition. Fire-and-forget: the core never awaits it.
    fn request_transition(&mut self, destination: Destination);
}

/// Frame clock collaborator used to time sessions.
pub trait FrameClock {
    /// Monotonic time since an arbitrary origin.
    fn now(&self) -> Duration;

    /// Wall-clock time used to stamp run records.
    fn calendar_now(&self) -> Option<OffsetDateTime>;
}

/// Destination for terminal session records.
pub trait RecordSink {
    /// Appends a record to the persisted history.
    fn append(&mut self, record: RunRecord);
}

/// Formats a duration as a zero-padded `MM:SS` countdown.
#[must_use]
pub fn format_clock(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

mod rfc3339_opt {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::{format_description::well_known::Rfc3339, OffsetDateTime};

    pub(super) fn serialize<S>(
        value: &Option<OffsetDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timestamp) => {
                let formatted = timestamp
                    .format(&Rfc3339)
                    .map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&formatted)
            }
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|text| OffsetDateTime::parse(&text, &Rfc3339).map_err(D::Error::custom))
            .transpose()
    }
}
