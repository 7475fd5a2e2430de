//! Final terrain pass: walls, rivers with bridges, and the closed border ring.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::config::RiverConfig;
use crate::types::{Pos, TileState};

use super::grid::WorldGrid;
use super::noise::ValueNoise;
use super::seed::StageRng;

const RIVER_NOISE_SHARE: f32 = 0.35;
const RIVER_NOISE_OFFSET: f32 = 523.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiverAxis {
    /// Flows left to right; its centerline is a function of x.
    Horizontal,
    Vertical,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct WallReport {
    pub(crate) rivers: Vec<RiverAxis>,
    pub(crate) water_cells: usize,
    pub(crate) bridge_cells: Vec<Pos>,
}

pub(crate) fn fill_walls(grid: &mut WorldGrid) {
    for tile in grid.tiles_mut() {
        if !tile.is_open() {
            *tile = TileState::Wall;
        }
    }
}

/// Runs the whole pass: walls, rivers, bridges along `main_centerlines`, border.
pub(crate) fn finish_terrain(
    grid: &mut WorldGrid,
    config: &RiverConfig,
    main_centerlines: &[Vec<Pos>],
    bridge_half_width: i32,
    noise: ValueNoise,
    rng: &mut StageRng,
) -> WallReport {
    fill_walls(grid);
    let mut report = WallReport::default();
    for river_index in 0..config.count {
        report.rivers.push(carve_river(grid, config, river_index, noise, rng));
    }
    report.bridge_cells = build_bridges(grid, main_centerlines, bridge_half_width);
    close_border(grid);
    report.water_cells = grid.water().iter().filter(|&&water| water).count();
    report
}

fn carve_river(
    grid: &mut WorldGrid,
    config: &RiverConfig,
    river_index: usize,
    noise: ValueNoise,
    rng: &mut StageRng,
) -> RiverAxis {
    let axis = if rng.chance(0.5) { RiverAxis::Horizontal } else { RiverAxis::Vertical };
    let (length, span) = match axis {
        RiverAxis::Horizontal => (grid.width(), grid.height()),
        RiverAxis::Vertical => (grid.height(), grid.width()),
    };
    let base = rng.range_f32(0.25, 0.75) * span as f32;
    let phase = rng.range_f32(0.0, TAU);
    let half_width = config.width as f32 * 0.5;
    let lane = river_index as f32 * RIVER_NOISE_OFFSET;

    for along in 0..length {
        let t = along as f32;
        let wave = (t * config.frequency * TAU + phase).sin();
        let drift = noise.fractal(t, lane, config.frequency);
        let center = base + config.amplitude * ((1.0 - RIVER_NOISE_SHARE) * wave + RIVER_NOISE_SHARE * drift);
        let low = (center - half_width).ceil() as i32;
        let high = (center + half_width).floor() as i32;
        for across in low..=high {
            let pos = match axis {
                RiverAxis::Horizontal => Pos { y: across, x: along as i32 },
                RiverAxis::Vertical => Pos { y: along as i32, x: across },
            };
            if grid.in_bounds(pos) {
                grid.set_tile(pos, TileState::Background);
                grid.set_water(pos, true);
            }
        }
    }
    log::debug!("river {river_index} runs {axis:?} around {base:.1}");
    axis
}

/// Reopens a crossing wherever a main corridor centerline meets water.
///
/// The span runs across the river (along its shorter water run) and is `half_width` cells
/// wide on either side of the centerline point.
fn build_bridges(grid: &mut WorldGrid, main_centerlines: &[Vec<Pos>], half_width: i32) -> Vec<Pos> {
    let mut bridged = Vec::new();
    for centerline in main_centerlines {
        for &point in centerline {
            let Some(water) = touching_water(grid, point) else {
                continue;
            };
            let horizontal_run = water_run(grid, water, 1, 0);
            let vertical_run = water_run(grid, water, 0, 1);
            let (across, along) =
                if horizontal_run >= vertical_run { ((0, 1), (1, 0)) } else { ((1, 0), (0, 1)) };
            let reach = horizontal_run.min(vertical_run) as i32 + 1;
            for step in -reach..=reach {
                for side in -half_width..=half_width {
                    let pos = point
                        .offset(across.0 * step + along.0 * side, across.1 * step + along.1 * side);
                    if grid.is_interior(pos) && grid.is_water(pos) {
                        grid.set_water(pos, false);
                        grid.set_tile(pos, TileState::Open);
                        bridged.push(pos);
                    }
                }
            }
        }
    }
    bridged.sort();
    bridged
}

fn touching_water(grid: &WorldGrid, point: Pos) -> Option<Pos> {
    if grid.is_water(point) {
        return Some(point);
    }
    point.cardinal_neighbors().into_iter().find(|&next| grid.is_water(next))
}

/// Length of the contiguous water run through `pos` along `(dx, dy)`.
fn water_run(grid: &WorldGrid, pos: Pos, dx: i32, dy: i32) -> u32 {
    let mut run = 1;
    for sign in [-1, 1] {
        let mut cursor = pos.offset(dx * sign, dy * sign);
        while grid.is_water(cursor) {
            run += 1;
            cursor = cursor.offset(dx * sign, dy * sign);
        }
    }
    run
}

fn close_border(grid: &mut WorldGrid) {
    let ring: Vec<Pos> = grid.positions().filter(|&pos| !grid.is_interior(pos)).collect();
    for pos in ring {
        grid.set_tile(pos, TileState::Wall);
        grid.set_water(pos, false);
    }
}
