//! Headless session driver that plays a level with seeded kill timings.

use std::time::Duration;

use last_stand_core::{Command, EntityId, Event, Outcome, RecordSink, SceneTransition, SelectedLevel};
use last_stand_system_session::{ManualClock, SessionContext};
use last_stand_world::{apply, query, Arena};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use time::OffsetDateTime;
use tracing::debug;

const FRAME: Duration = Duration::from_millis(100);

/// Parameters of a simulated run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Plan {
    pub(crate) selection: SelectedLevel,
    pub(crate) kills: u32,
    pub(crate) seconds: u32,
    pub(crate) seed: u64,
}

/// What happened during a simulated run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    pub(crate) outcome: Option<Outcome>,
    pub(crate) kills: u32,
    pub(crate) elapsed: Duration,
    pub(crate) time_remaining: Duration,
}

/// Plays `plan` against a fresh arena, persisting the outcome through `records`.
///
/// Kills land at seeded random instants within the simulated window. A run
/// still going when the window closes is abandoned and leaves no record.
pub(crate) fn run(
    arena_config: last_stand_world::Config,
    plan: Plan,
    records: &mut dyn RecordSink,
    transitions: &mut dyn SceneTransition,
) -> Summary {
    let mut rng = ChaCha8Rng::seed_from_u64(plan.seed);
    let window = Duration::from_secs(u64::from(plan.seconds));
    let horizon = window.min(plan.selection.time_limit);
    let mut kill_times: Vec<Duration> = (0..plan.kills.min(plan.selection.entity_count))
        .map(|_| horizon.mul_f64(rng.gen_range(0.0..1.0)))
        .collect();
    kill_times.sort();

    let mut clock = ManualClock::new(Some(OffsetDateTime::now_utc()));
    let mut arena = Arena::new(arena_config);
    let mut events = Vec::new();

    let horde: Vec<EntityId> = {
        let mut ctx = SessionContext::new(&clock, &mut *records, &mut *transitions);
        apply(
            &mut arena,
            Command::BeginSession {
                selection: plan.selection,
            },
            &mut ctx,
            &mut events,
        );
        for _ in 0..plan.selection.entity_count {
            apply(
                &mut arena,
                Command::SpawnEntity { hits_to_die: 0 },
                &mut ctx,
                &mut events,
            );
        }
        spawned(&events).collect()
    };

    let mut elapsed = Duration::ZERO;
    let mut pending = kill_times.into_iter().peekable();
    let mut targets = horde.into_iter();
    let mut kills = 0;

    while elapsed < window && query::session(&arena).phase.is_running() {
        events.clear();
        let frame_end = elapsed + FRAME;

        // Kills landing inside the frame resolve before its countdown.
        {
            let mut ctx = SessionContext::new(&clock, &mut *records, &mut *transitions);
            while pending.next_if(|at| *at < frame_end).is_some() {
                let Some(target) = targets.next() else {
                    break;
                };
                kill(&mut arena, target, &mut ctx, &mut events);
                kills += 1;
                debug!(
                    entity = target.get(),
                    elapsed_secs = elapsed.as_secs_f32(),
                    "simulated_kill"
                );
            }
        }

        clock.advance(FRAME);
        elapsed = frame_end;
        let mut ctx = SessionContext::new(&clock, &mut *records, &mut *transitions);
        apply(&mut arena, Command::Tick { dt: FRAME }, &mut ctx, &mut events);
    }

    if query::session(&arena).phase.is_running() {
        let mut ctx = SessionContext::new(&clock, &mut *records, &mut *transitions);
        apply(&mut arena, Command::AbandonSession, &mut ctx, &mut events);
    }

    let snapshot = query::session(&arena);
    Summary {
        outcome: snapshot.phase.outcome(),
        kills,
        elapsed,
        time_remaining: snapshot.time_remaining,
    }
}

fn kill(arena: &mut Arena, entity: EntityId, ctx: &mut SessionContext<'_>, out: &mut Vec<Event>) {
    while query::horde_view(arena)
        .iter()
        .any(|snapshot| snapshot.id == entity && snapshot.alive)
    {
        apply(
            arena,
            Command::DamageEntity {
                entity,
                amount: 1.0,
            },
            ctx,
            out,
        );
    }
}

fn spawned(events: &[Event]) -> impl Iterator<Item = EntityId> + '_ {
    events.iter().filter_map(|event| match event {
        Event::EntitySpawned { entity, .. } => Some(*entity),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use last_stand_core::{Destination, LevelNumber};
    use last_stand_system_session::{RecordLog, TransitionLog};

    fn plan(kills: u32, seconds: u32) -> Plan {
        Plan {
            selection: SelectedLevel {
                level: LevelNumber::FIRST,
                entity_count: 4,
                time_limit: Duration::from_secs(30),
                ..SelectedLevel::default()
            },
            kills,
            seconds,
            seed: 7,
        }
    }

    #[test]
    fn full_clear_wins() {
        let mut records = RecordLog::new();
        let mut transitions = TransitionLog::new();
        let summary = run(
            last_stand_world::Config::default(),
            plan(4, 20),
            &mut records,
            &mut transitions,
        );

        assert_eq!(summary.outcome, Some(Outcome::Victory));
        assert_eq!(summary.kills, 4);
        assert_eq!(records.records().len(), 1);
        assert_eq!(transitions.last(), Some(Destination::Victory));
    }

    #[test]
    fn partial_clear_times_out() {
        let mut records = RecordLog::new();
        let mut transitions = TransitionLog::new();
        let summary = run(
            last_stand_world::Config::default(),
            plan(2, 60),
            &mut records,
            &mut transitions,
        );

        assert_eq!(summary.outcome, Some(Outcome::Defeat));
        assert_eq!(records.records()[0].entities_killed, 2);
        assert_eq!(summary.time_remaining, Duration::ZERO);
    }

    #[test]
    fn short_window_abandons_without_a_record() {
        let mut records = RecordLog::new();
        let mut transitions = TransitionLog::new();
        let summary = run(
            last_stand_world::Config::default(),
            plan(0, 5),
            &mut records,
            &mut transitions,
        );

        assert_eq!(summary.outcome, None);
        assert!(records.records().is_empty());
        assert_eq!(transitions.last(), Some(Destination::MainMenu));
    }

    #[test]
    fn same_seed_replays_identically() {
        let replay = || {
            let mut records = RecordLog::new();
            let mut transitions = TransitionLog::new();
            run(
                last_stand_world::Config::default(),
                plan(3, 60),
                &mut records,
                &mut transitions,
            )
        };
        assert_eq!(replay(), replay());
    }
}
