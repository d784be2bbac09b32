use std::collections::BTreeSet;

use glam::Vec2;
use rampart_core::{AttackerId, DefenderId, EntityRef, Rect};
use rampart_spatial::{SpatialEntry, SpatialIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_entries(rng: &mut ChaCha8Rng, count: u32, size: f32) -> Vec<SpatialEntry> {
    (0..count)
        .map(|id| {
            let entity = if id % 3 == 0 {
                EntityRef::Defender(DefenderId::new(id))
            } else {
                EntityRef::Attacker(AttackerId::new(id))
            };
            SpatialEntry {
                entity,
                position: Vec2::new(rng.gen_range(0.0..size), rng.gen_range(0.0..size)),
            }
        })
        .collect()
}

#[test]
fn circle_queries_match_a_linear_scan() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x00c0_ffee);
    let size = 40.0;
    let entries = random_entries(&mut rng, 200, size);

    let mut index = SpatialIndex::new(
        Rect::from_corners(Vec2::ZERO, Vec2::splat(size)),
        8,
        8,
    );
    assert!(index.rebuild_if_dirty(entries.iter().copied()));

    let mut found = Vec::new();
    for _ in 0..50 {
        let center = Vec2::new(rng.gen_range(-5.0..size + 5.0), rng.gen_range(-5.0..size + 5.0));
        let radius = rng.gen_range(0.0..12.0);

        found.clear();
        index.query_circle(center, radius, &mut found);
        let indexed: BTreeSet<EntityRef> = found.iter().map(|entry| entry.entity).collect();

        let expected: BTreeSet<EntityRef> = entries
            .iter()
            .filter(|entry| entry.position.distance_squared(center) <= radius * radius)
            .map(|entry| entry.entity)
            .collect();

        assert_eq!(found.len(), indexed.len(), "duplicate results");
        assert_eq!(indexed, expected);
    }
}

#[test]
fn rect_queries_match_a_linear_scan() {
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let size = 25.0;
    let entries = random_entries(&mut rng, 150, size);

    let mut index = SpatialIndex::new(Rect::from_corners(Vec2::ZERO, Vec2::splat(size)), 2, 10);
    let _ = index.rebuild_if_dirty(entries.iter().copied());

    let mut found = Vec::new();
    for _ in 0..30 {
        let a = Vec2::new(rng.gen_range(0.0..size), rng.gen_range(0.0..size));
        let b = Vec2::new(rng.gen_range(0.0..size), rng.gen_range(0.0..size));
        let rect = Rect::from_corners(a, b);

        found.clear();
        index.query_rect(&rect, &mut found);
        let indexed: BTreeSet<EntityRef> = found.iter().map(|entry| entry.entity).collect();
        let expected: BTreeSet<EntityRef> = entries
            .iter()
            .filter(|entry| rect.contains(entry.position))
            .map(|entry| entry.entity)
            .collect();

        assert_eq!(indexed, expected);
    }
}
