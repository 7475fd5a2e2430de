use std::collections::BTreeSet;

use worldgen::{BiomeId, GenerationWarning, Pos, SpawnSource, TileState, WorldConfig, generate_world};

#[test]
fn test_two_by_two_sections_with_four_biomes() {
    let config = WorldConfig {
        section_width: 50,
        section_height: 50,
        sections_x: 2,
        sections_y: 2,
        biome_count: 4,
        seed: Some(42),
        ..WorldConfig::default()
    };
    let world = generate_world(&config).expect("generation should succeed");

    assert_eq!((world.width(), world.height()), (100, 100));
    assert_eq!(world.centers.len(), 4);
    assert_eq!(world.mst_edges.len(), 3, "spanning tree over 4 centers has 3 edges");

    let hall_biomes: BTreeSet<BiomeId> = world.halls.iter().map(|hall| hall.biome).collect();
    let biomes: BTreeSet<BiomeId> = world.centers.iter().map(|center| center.biome_id).collect();
    assert_eq!(hall_biomes, biomes, "every biome gets a hall");

    assert!(
        !world.spawn.corner_candidates.is_empty(),
        "at least one corner zone should offer a valid spawn"
    );
    assert!(matches!(world.spawn.source, SpawnSource::Corner(_)));
    let label = world.components.label_at(world.spawn_position());
    assert!(world.components.size_of(label) > 1);
    assert!(world.warnings.is_empty(), "unexpected warnings: {:?}", world.warnings);
}

#[test]
fn test_zero_open_target_still_terminates_with_filled_grid() {
    let mut config = WorldConfig { seed: Some(3), ..WorldConfig::default() };
    config.cave.open_target = 0.0;
    let world = generate_world(&config).expect("generation should succeed");

    assert!(!world.cave.corrected, "nothing is below a zero target");
    for pos in (0..world.height() as i32).flat_map(|y| (0..world.width() as i32).map(move |x| Pos::new(x, y))) {
        let tile = world.tile_at(pos);
        assert!(
            tile != TileState::Background || world.grid.is_water(pos),
            "{pos:?} was left unfilled"
        );
    }
}

#[test]
fn test_fully_closed_caves_still_yield_a_spawn() {
    let mut config = WorldConfig { seed: Some(8), ..WorldConfig::default() };
    config.cave.initial_fill = 0.0;
    config.cave.open_target = 0.0;
    config.rivers.count = 0;
    let world = generate_world(&config).expect("generation should succeed");

    let label = world.components.label_at(world.spawn_position());
    assert_eq!(world.components.center_label(), Some(label));
    assert!(world.tile_at(world.spawn_position()).is_open());
    let forced = world
        .warnings
        .iter()
        .any(|warning| matches!(warning, GenerationWarning::ForcedSpawnClearing { .. }));
    assert_eq!(forced, world.spawn.source == SpawnSource::ForcedClearing);
}

#[test]
fn test_forced_spawn_clearing_is_reported_as_a_warning() {
    let config = WorldConfig { biome_count: 3, seed: Some(50), ..WorldConfig::default() };
    let world = generate_world(&config).expect("generation should succeed");

    assert_eq!(world.spawn.source, SpawnSource::ForcedClearing);
    assert!(
        world.warnings.contains(&GenerationWarning::ForcedSpawnClearing {
            position: world.spawn_position(),
            size: config.spawn.clearing_size,
        }),
        "warnings were {:?}",
        world.warnings
    );
    let label = world.components.label_at(world.spawn_position());
    assert_eq!(world.components.center_label(), Some(label));
}

#[test]
fn test_unreachable_open_target_is_reported_as_a_warning() {
    let mut config = WorldConfig { seed: Some(21), ..WorldConfig::default() };
    config.cave.initial_fill = 0.1;
    config.cave.open_target = 0.9;
    let world = generate_world(&config).expect("generation should succeed");

    assert!(world.cave.corrected, "corrective pass should have run");
    assert!(world.cave.open_ratio < 0.9);
    assert!(
        world.warnings.iter().any(|warning| matches!(
            warning,
            GenerationWarning::OpenRatioBelowTarget { target, .. } if *target == 0.9
        )),
        "warnings were {:?}",
        world.warnings
    );
}

#[test]
fn test_single_biome_world() {
    let config = WorldConfig { biome_count: 1, seed: Some(11), ..WorldConfig::default() };
    let world = generate_world(&config).expect("generation should succeed");

    assert!(world.mst_edges.is_empty());
    assert!(world.grid.biomes().iter().all(|&biome| biome == BiomeId(0)));
    assert_eq!(world.halls.len(), 1);
    assert_eq!(world.halls[0].biome, BiomeId(0));
    assert!(!world.rooms.is_empty(), "rooms are still placed around the only hall");
    assert!(world.rooms.iter().all(|room| room.biome == BiomeId(0)));
}

#[test]
fn test_open_ratio_reaches_target_after_cave_pass() {
    for seed in [1_u64, 2, 3] {
        let world = generate_world(&WorldConfig { seed: Some(seed), ..WorldConfig::default() })
            .expect("generation should succeed");
        assert!(
            world.cave.open_ratio >= world.config.cave.open_target - 0.03,
            "seed={seed} reached only {:.3}",
            world.cave.open_ratio
        );
    }
}
