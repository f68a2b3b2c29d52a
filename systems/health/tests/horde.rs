use std::time::Duration;

use last_stand_core::{EntityId, Event};
use last_stand_system_health::{Config, DamageOutcome, Horde, RemovalTiming};

fn kills(events: &[Event]) -> Vec<EntityId> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::EntityKilled { entity } => Some(*entity),
            _ => None,
        })
        .collect()
}

#[test]
fn fifth_hit_kills_and_sixth_is_ignored() {
    let mut horde = Horde::default();
    let mut events = Vec::new();
    let entity = horde.spawn(5, &mut events);
    events.clear();

    for hit in 1..=4 {
        assert_eq!(
            horde.apply_damage(entity, 1.0, &mut events),
            DamageOutcome::Wounded { hits_taken: hit }
        );
    }
    assert_eq!(horde.is_dead(entity), Some(false));

    assert_eq!(
        horde.apply_damage(entity, 1.0, &mut events),
        DamageOutcome::Killed
    );
    assert_eq!(
        horde.apply_damage(entity, 1.0, &mut events),
        DamageOutcome::Ignored
    );

    assert_eq!(horde.is_dead(entity), Some(true));
    assert_eq!(kills(&events), vec![entity]);
}

#[test]
fn kill_notification_fires_once_under_repeated_damage() {
    let mut horde = Horde::default();
    let mut events = Vec::new();
    let entity = horde.spawn(1, &mut events);

    for _ in 0..50 {
        let _ = horde.apply_damage(entity, 25.0, &mut events);
    }

    assert_eq!(kills(&events), vec![entity]);
}

#[test]
fn death_disables_movement_and_schedules_removal() {
    let timing = RemovalTiming::new(Duration::from_secs(2), Duration::from_secs(2));
    let mut horde = Horde::new(Config::new(5, timing));
    let mut events = Vec::new();
    let doomed = horde.spawn(1, &mut events);
    let survivor = horde.spawn(3, &mut events);

    assert!(horde.is_active(doomed));
    let _ = horde.apply_damage(doomed, 1.0, &mut events);
    assert!(!horde.is_active(doomed), "AI must stop on death");
    assert!(horde.is_active(survivor));
    assert_eq!(horde.alive_count(), 1);

    events.clear();
    horde.advance(Duration::from_secs(3), &mut events);
    assert!(matches!(
        events.as_slice(),
        [Event::EntityFading { entity, .. }] if *entity == doomed
    ));

    events.clear();
    horde.advance(Duration::from_secs(1), &mut events);
    assert_eq!(events, vec![Event::EntityRemoved { entity: doomed }]);
    assert_eq!(horde.is_dead(doomed), None, "removed corpses are forgotten");
    assert_eq!(horde.view().iter().count(), 1);
}

#[test]
fn view_lists_entities_in_identifier_order() {
    let mut horde = Horde::default();
    let mut events = Vec::new();
    let first = horde.spawn(2, &mut events);
    let second = horde.spawn(4, &mut events);
    let _ = horde.apply_damage(second, 1.0, &mut events);

    let snapshots = horde.view().into_vec();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].id, first);
    assert_eq!(snapshots[1].id, second);
    assert_eq!(snapshots[1].hits_taken, 1);
    assert!(snapshots.iter().all(|snapshot| snapshot.alive));
}
