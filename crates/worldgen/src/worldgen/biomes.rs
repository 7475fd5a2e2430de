//! Biome center sampling and the L1 Voronoi partition of the grid.

use serde::{Deserialize, Serialize};

use crate::types::{BiomeId, Pos, TileId};

use super::grid::WorldGrid;
use super::seed::StageRng;

const FAILURES_BEFORE_RELAX: usize = 30;
const SPACING_RELAX_FACTOR: f32 = 0.9;
const SAMPLE_MARGIN: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BiomeKind {
    Meadow,
    Forest,
    Desert,
    Tundra,
    Swamp,
    Volcanic,
}

impl BiomeKind {
    pub const ALL: [Self; 6] =
        [Self::Meadow, Self::Forest, Self::Desert, Self::Tundra, Self::Swamp, Self::Volcanic];

    pub fn name(self) -> &'static str {
        match self {
            Self::Meadow => "meadow",
            Self::Forest => "forest",
            Self::Desert => "desert",
            Self::Tundra => "tundra",
            Self::Swamp => "swamp",
            Self::Volcanic => "volcanic",
        }
    }

    pub fn floor_tile(self) -> TileId {
        match self {
            Self::Meadow => TileId(10),
            Self::Forest => TileId(11),
            Self::Desert => TileId(12),
            Self::Tundra => TileId(13),
            Self::Swamp => TileId(14),
            Self::Volcanic => TileId(15),
        }
    }

    pub fn wall_tile(self) -> TileId {
        match self {
            Self::Meadow => TileId(20),
            Self::Forest => TileId(21),
            Self::Desert => TileId(22),
            Self::Tundra => TileId(23),
            Self::Swamp => TileId(24),
            Self::Volcanic => TileId(25),
        }
    }

    /// Single-character glyph for text dumps.
    pub fn glyph(self) -> char {
        match self {
            Self::Meadow => 'm',
            Self::Forest => 'f',
            Self::Desert => 'd',
            Self::Tundra => 't',
            Self::Swamp => 's',
            Self::Volcanic => 'v',
        }
    }
}

pub const WATER_TILE: TileId = TileId(1);
pub const BRIDGE_TILE: TileId = TileId(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomeCenter {
    pub position: Pos,
    pub biome_id: BiomeId,
    pub kind: BiomeKind,
}

/// Sampled centers plus the per-biome cell counts of the resulting partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BiomeField {
    pub(crate) centers: Vec<BiomeCenter>,
    pub(crate) areas: Vec<usize>,
}

impl BiomeField {
    pub(crate) fn len(&self) -> usize {
        self.centers.len()
    }
}

pub(crate) fn build_biome_field(
    grid: &mut WorldGrid,
    biome_count: usize,
    spacing: f32,
    rng: &mut StageRng,
) -> BiomeField {
    let positions = sample_centers(grid.width(), grid.height(), biome_count, spacing, rng);
    let centers: Vec<BiomeCenter> = positions
        .into_iter()
        .enumerate()
        .map(|(index, position)| BiomeCenter {
            position,
            biome_id: BiomeId(index as u16),
            kind: BiomeKind::ALL[rng.range_usize(0, BiomeKind::ALL.len() - 1)],
        })
        .collect();

    let areas = assign_biomes(grid, &centers);
    BiomeField { centers, areas }
}

/// Rejection-samples up to `count` interior points with pairwise spacing above `spacing`.
///
/// Spacing shrinks after repeated failures, so the loop always ends. An empty result is
/// replaced by the grid's geometric center.
pub(crate) fn sample_centers(
    width: usize,
    height: usize,
    count: usize,
    spacing: f32,
    rng: &mut StageRng,
) -> Vec<Pos> {
    let geometric_center = Pos { y: (height / 2) as i32, x: (width / 2) as i32 };
    let max_x = width as i32 - 1 - SAMPLE_MARGIN;
    let max_y = height as i32 - 1 - SAMPLE_MARGIN;
    if max_x < SAMPLE_MARGIN || max_y < SAMPLE_MARGIN {
        return vec![geometric_center];
    }

    let interior_cells = ((max_x - SAMPLE_MARGIN + 1) * (max_y - SAMPLE_MARGIN + 1)) as usize;
    let target = count.min(interior_cells);
    let attempt_budget = target.saturating_mul(1_000).max(1_000);

    let mut centers: Vec<Pos> = Vec::with_capacity(target);
    // No two interior cells are farther apart than the interior diagonal.
    let span_x = (max_x - SAMPLE_MARGIN) as f32;
    let span_y = (max_y - SAMPLE_MARGIN) as f32;
    let mut spacing = spacing.max(0.0).min((span_x * span_x + span_y * span_y).sqrt());
    let mut consecutive_failures = 0_usize;
    for _ in 0..attempt_budget {
        if centers.len() >= target {
            break;
        }
        let candidate = Pos {
            y: rng.range_i32(SAMPLE_MARGIN, max_y),
            x: rng.range_i32(SAMPLE_MARGIN, max_x),
        };
        let spacing_squared = (spacing * spacing) as u64;
        let clear = centers.iter().all(|center| {
            center.distance_squared(candidate) > spacing_squared && *center != candidate
        });
        if clear {
            centers.push(candidate);
            consecutive_failures = 0;
            continue;
        }

        consecutive_failures += 1;
        if consecutive_failures >= FAILURES_BEFORE_RELAX {
            spacing *= SPACING_RELAX_FACTOR;
            consecutive_failures = 0;
        }
    }

    if centers.is_empty() {
        log::warn!("no biome center could be sampled; using the grid center");
        centers.push(geometric_center);
    }
    centers
}

/// Writes the L1-nearest center id into every cell and returns per-biome areas.
pub(crate) fn assign_biomes(grid: &mut WorldGrid, centers: &[BiomeCenter]) -> Vec<usize> {
    let mut areas = vec![0_usize; centers.len()];
    let positions: Vec<Pos> = grid.positions().collect();
    let biomes = grid.biomes_mut();
    for (index, pos) in positions.into_iter().enumerate() {
        let nearest = nearest_center(centers, pos);
        biomes[index] = BiomeId(nearest as u16);
        areas[nearest] += 1;
    }
    areas
}

/// Index of the L1-nearest center; the earliest center wins ties.
pub(crate) fn nearest_center(centers: &[BiomeCenter], pos: Pos) -> usize {
    let mut best_index = 0;
    let mut best_distance = u32::MAX;
    for (index, center) in centers.iter().enumerate() {
        let distance = center.position.manhattan(pos);
        if distance < best_distance {
            best_distance = distance;
            best_index = index;
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;
    use crate::worldgen::seed::Stage;

    fn center(x: i32, y: i32, id: u16) -> BiomeCenter {
        BiomeCenter { position: Pos::new(x, y), biome_id: BiomeId(id), kind: BiomeKind::Meadow }
    }

    #[test]
    fn sampled_centers_respect_spacing_when_room_allows() {
        let mut rng = StageRng::new(3, Stage::Biomes);
        let centers = sample_centers(100, 100, 4, 20.0, &mut rng);
        assert_eq!(centers.len(), 4);
        for (index, a) in centers.iter().enumerate() {
            for b in &centers[index + 1..] {
                assert!(a.distance_squared(*b) > 400, "{a:?} and {b:?} are too close");
            }
        }
    }

    #[test]
    fn impossible_spacing_relaxes_instead_of_looping() {
        let mut rng = StageRng::new(11, Stage::Biomes);
        let centers = sample_centers(12, 12, 20, 50.0, &mut rng);
        assert_eq!(centers.len(), 20);
    }

    #[test]
    fn oversized_spacing_still_yields_every_center() {
        let mut rng = StageRng::new(7, Stage::Biomes);
        let centers = sample_centers(100, 100, 4, 1e30, &mut rng);
        assert_eq!(centers.len(), 4);
        let distinct: BTreeSet<Pos> = centers.iter().copied().collect();
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn tiny_grid_falls_back_to_geometric_center() {
        let mut rng = StageRng::new(1, Stage::Biomes);
        assert_eq!(sample_centers(3, 3, 4, 1.0, &mut rng), vec![Pos::new(1, 1)]);
    }

    #[test]
    fn ties_go_to_the_earliest_center() {
        let centers = [center(2, 5, 0), center(8, 5, 1)];
        assert_eq!(nearest_center(&centers, Pos::new(5, 5)), 0);
        assert_eq!(nearest_center(&centers, Pos::new(6, 5)), 1);
    }

    #[test]
    fn single_center_claims_every_cell() {
        let mut grid = WorldGrid::new(20, 10);
        let areas = assign_biomes(&mut grid, &[center(4, 4, 0)]);
        assert_eq!(areas, vec![200]);
        assert!(grid.biomes().iter().all(|&biome| biome == BiomeId(0)));
    }

    proptest! {
        #[test]
        fn every_cell_maps_to_its_l1_nearest_center(
            seed in any::<u64>(),
            count in 1_usize..7,
        ) {
            let mut grid = WorldGrid::new(40, 30);
            let mut rng = StageRng::new(seed, Stage::Biomes);
            let field = build_biome_field(&mut grid, count, 6.0, &mut rng);

            prop_assert_eq!(field.areas.iter().sum::<usize>(), grid.cell_count());
            for pos in grid.positions() {
                let assigned = grid.biome(pos).expect("in bounds");
                let assigned_distance = field.centers[assigned.index()].position.manhattan(pos);
                for candidate in &field.centers {
                    prop_assert!(assigned_distance <= candidate.position.manhattan(pos));
                }
            }
        }
    }
}
