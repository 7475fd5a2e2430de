//! Cellular-automaton cave carving, confined to each cell's own biome.

use serde::{Deserialize, Serialize};

use crate::config::CaveConfig;
use crate::types::{Pos, TileState};

use super::grid::{EIGHT_NEIGHBORHOOD, WorldGrid};
use super::seed::StageRng;

/// Open ratio after smoothing and whether the corrective pass ran.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaveReport {
    pub open_ratio: f32,
    pub corrected: bool,
}

pub(crate) fn carve_caves(grid: &mut WorldGrid, config: &CaveConfig, rng: &mut StageRng) -> CaveReport {
    seed_cells(grid, config.initial_fill, rng);
    for _ in 0..config.smooth_steps {
        relax(grid, config.birth_limit, config.death_limit);
    }

    let mut open_ratio = grid.open_ratio();
    let corrected = open_ratio < config.open_target;
    if corrected {
        relax(
            grid,
            config.birth_limit.saturating_add(config.correction_shift).min(8),
            config.death_limit.saturating_add(config.correction_shift).min(8),
        );
        let corrected_ratio = grid.open_ratio();
        log::debug!(
            "cave open ratio {open_ratio:.3} below target {:.3}; corrective pass reached {corrected_ratio:.3}",
            config.open_target
        );
        open_ratio = corrected_ratio;
    }

    CaveReport { open_ratio, corrected }
}

fn seed_cells(grid: &mut WorldGrid, initial_fill: f32, rng: &mut StageRng) {
    for tile in grid.tiles_mut() {
        *tile = if rng.chance(initial_fill) { TileState::Open } else { TileState::Background };
    }
}

/// One synchronous smoothing pass.
///
/// A closed cell opens when its wall count is at most `birth_limit`; an open cell closes
/// when its wall count exceeds `death_limit`.
fn relax(grid: &mut WorldGrid, birth_limit: u8, death_limit: u8) {
    let next: Vec<TileState> = grid
        .positions()
        .map(|pos| {
            let walls = wall_neighbors(grid, pos);
            if grid.is_open(pos) {
                if walls > death_limit { TileState::Background } else { TileState::Open }
            } else if walls <= birth_limit {
                TileState::Open
            } else {
                TileState::Background
            }
        })
        .collect();
    grid.tiles_mut().copy_from_slice(&next);
}

/// Non-open neighbors, counting out-of-grid and foreign-biome neighbors as walls.
fn wall_neighbors(grid: &WorldGrid, pos: Pos) -> u8 {
    let own_biome = grid.biome(pos);
    let mut walls = 0;
    for (dx, dy) in EIGHT_NEIGHBORHOOD {
        let neighbor = pos.offset(dx, dy);
        if grid.biome(neighbor) != own_biome || !grid.is_open(neighbor) {
            walls += 1;
        }
    }
    walls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BiomeId;
    use crate::worldgen::seed::Stage;

    fn split_grid(width: usize, height: usize) -> WorldGrid {
        let mut grid = WorldGrid::new(width, height);
        let positions: Vec<Pos> = grid.positions().collect();
        for pos in positions {
            let index = grid.index(pos);
            grid.biomes_mut()[index] = BiomeId(u16::from(pos.x as usize >= width / 2));
        }
        grid
    }

    #[test]
    fn foreign_biome_and_out_of_grid_neighbors_count_as_walls() {
        let mut grid = split_grid(6, 3);
        grid.tiles_mut().fill(TileState::Open);
        assert_eq!(wall_neighbors(&grid, Pos::new(1, 1)), 0);
        assert_eq!(wall_neighbors(&grid, Pos::new(2, 1)), 3);
        assert_eq!(wall_neighbors(&grid, Pos::new(0, 0)), 5);
    }

    #[test]
    fn open_foreign_biome_does_not_open_a_closed_border_column() {
        let mut grid = split_grid(8, 5);
        let positions: Vec<Pos> = grid.positions().collect();
        for pos in positions {
            let tile = if pos.x < 4 { TileState::Open } else { TileState::Background };
            grid.set_tile(pos, tile);
        }

        // With a generous birth limit, counting the open left biome would open x = 4.
        relax(&mut grid, 5, 8);
        for y in 0..5 {
            assert!(!grid.is_open(Pos::new(4, y)), "row {y} leaked across the border");
            assert!(grid.is_open(Pos::new(3, y)));
        }
    }

    #[test]
    fn zero_fill_and_zero_target_terminate_without_correction() {
        let mut grid = WorldGrid::new(20, 20);
        let config = CaveConfig { initial_fill: 0.0, open_target: 0.0, ..CaveConfig::default() };
        let mut rng = StageRng::new(1, Stage::Caves);
        let report = carve_caves(&mut grid, &config, &mut rng);
        assert!(!report.corrected);
        assert_eq!(report.open_ratio, grid.open_ratio());
    }

    #[test]
    fn open_ratio_reaches_target_within_tolerance() {
        for seed in [1_u64, 7, 42, 1_234] {
            let mut grid = split_grid(100, 100);
            let config = CaveConfig::default();
            let mut rng = StageRng::new(seed, Stage::Caves);
            let report = carve_caves(&mut grid, &config, &mut rng);
            assert!(
                report.open_ratio >= config.open_target - 0.03,
                "seed {seed}: open ratio {} below target",
                report.open_ratio
            );
        }
    }

    #[test]
    fn corrective_pass_runs_when_target_is_out_of_reach() {
        let mut grid = split_grid(30, 30);
        let config = CaveConfig { initial_fill: 0.2, open_target: 0.9, ..CaveConfig::default() };
        let mut rng = StageRng::new(4, Stage::Caves);
        let report = carve_caves(&mut grid, &config, &mut rng);
        assert!(report.corrected);
    }
}
