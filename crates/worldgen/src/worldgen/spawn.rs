//! Spawn selection: scored corner zones, a spiral fallback and a forced clearing.

use serde::{Deserialize, Serialize};

use crate::config::SpawnConfig;
use crate::types::{Pos, TileState};

use super::connectivity::ComponentMap;
use super::grid::WorldGrid;
use super::seed::StageRng;

const BASE_SCORE: u32 = 10;
const NEIGHBOR_SCORE: u32 = 2;
const BLOCK_SCORE: u32 = 1;
const CENTER_COMPONENT_SCORE: u32 = 50;
const EDGE_SCORE: u32 = 3;
const PROBE_SCORE: u32 = 15;
const MIN_OPEN_IN_BLOCK: u32 = 5;
const SPIRAL_MIN_OPEN_IN_BLOCK: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Self; 4] = [Self::TopLeft, Self::TopRight, Self::BottomLeft, Self::BottomRight];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnSource {
    Corner(Corner),
    Spiral,
    ForcedClearing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnCandidate {
    pub position: Pos,
    pub score: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnOutcome {
    pub position: Pos,
    pub source: SpawnSource,
    /// Best candidate of every corner zone that qualified, in [`Corner::ALL`] order.
    pub corner_candidates: Vec<(Corner, SpawnCandidate)>,
}

/// Square corner zone, inclusive bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Zone {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl Zone {
    fn for_corner(grid: &WorldGrid, corner: Corner, inset: i32) -> Option<Self> {
        let width = grid.width() as i32;
        let height = grid.height() as i32;
        let side = (width.min(height) / 4).max(1);
        let left = match corner {
            Corner::TopLeft | Corner::BottomLeft => inset,
            Corner::TopRight | Corner::BottomRight => width - inset - side,
        };
        let top = match corner {
            Corner::TopLeft | Corner::TopRight => inset,
            Corner::BottomLeft | Corner::BottomRight => height - inset - side,
        };
        let zone = Self {
            left: left.max(0),
            top: top.max(0),
            right: (left + side - 1).min(width - 1),
            bottom: (top + side - 1).min(height - 1),
        };
        (zone.left <= zone.right && zone.top <= zone.bottom).then_some(zone)
    }

    /// Distance of `pos` from the nearest zone edge; 0 on the edge itself.
    fn band_of(self, pos: Pos) -> i32 {
        (pos.x - self.left).min(self.right - pos.x).min(pos.y - self.top).min(self.bottom - pos.y)
    }

    /// Cells ordered band by band from the zone edges inward, row-major inside a band.
    fn banded_cells(self) -> Vec<Pos> {
        let mut cells: Vec<Pos> = (self.top..=self.bottom)
            .flat_map(|y| (self.left..=self.right).map(move |x| Pos { y, x }))
            .collect();
        cells.sort_by_key(|&pos| (self.band_of(pos), pos));
        cells
    }
}

struct Scorer<'a> {
    grid: &'a WorldGrid,
    components: &'a ComponentMap,
    center_label: u32,
    probes: [Pos; 4],
}

impl<'a> Scorer<'a> {
    fn new(grid: &'a WorldGrid, components: &'a ComponentMap, center_label: u32) -> Self {
        let (width, height) = (grid.width() as i32, grid.height() as i32);
        let probes = [
            Pos { y: height / 4, x: width / 4 },
            Pos { y: height / 4, x: width * 3 / 4 },
            Pos { y: height * 3 / 4, x: width / 4 },
            Pos { y: height * 3 / 4, x: width * 3 / 4 },
        ];
        Self { grid, components, center_label, probes }
    }

    /// Zero means disqualified.
    fn score(&self, pos: Pos) -> u32 {
        if !self.grid.is_open(pos) {
            return 0;
        }
        let open_near = self.grid.open_in_block(pos, 1);
        if open_near < MIN_OPEN_IN_BLOCK {
            return 0;
        }
        if self.components.label_at(pos) != self.center_label {
            return 0;
        }

        let probes = self
            .probes
            .iter()
            .filter(|&&probe| {
                self.grid.is_open(probe) && self.components.label_at(probe) == self.center_label
            })
            .count() as u32;
        BASE_SCORE
            + NEIGHBOR_SCORE * (open_near - 1)
            + BLOCK_SCORE * self.grid.open_in_block(pos, 2)
            + CENTER_COMPONENT_SCORE
            + EDGE_SCORE * self.grid.edge_distance(pos)
            + PROBE_SCORE * probes
    }

    fn best_in(&self, zone: Zone) -> Option<SpawnCandidate> {
        let mut best: Option<SpawnCandidate> = None;
        for position in zone.banded_cells() {
            let score = self.score(position);
            if score > 0 && best.is_none_or(|current| score > current.score) {
                best = Some(SpawnCandidate { position, score });
            }
        }
        best
    }
}

/// Picks the spawn and, as a last resort, clears the map center and relabels `components`.
pub(crate) fn choose_spawn(
    grid: &mut WorldGrid,
    components: &mut ComponentMap,
    config: &SpawnConfig,
    rng: &mut StageRng,
) -> SpawnOutcome {
    if let Some(center_label) = components.center_label() {
        let scorer = Scorer::new(grid, components, center_label);
        let inset = (config.border_thickness + config.safety_margin) as i32;
        let corner_candidates: Vec<(Corner, SpawnCandidate)> = Corner::ALL
            .into_iter()
            .filter_map(|corner| {
                let zone = Zone::for_corner(grid, corner, inset)?;
                scorer.best_in(zone).map(|candidate| (corner, candidate))
            })
            .collect();

        if !corner_candidates.is_empty() {
            let (corner, candidate) =
                corner_candidates[rng.range_usize(0, corner_candidates.len() - 1)];
            log::debug!(
                "{} corner zones qualified; spawning in {corner:?} at {:?} (score {})",
                corner_candidates.len(),
                candidate.position,
                candidate.score
            );
            return SpawnOutcome {
                position: candidate.position,
                source: SpawnSource::Corner(corner),
                corner_candidates,
            };
        }

        if let Some(position) = spiral_search(grid, components, center_label) {
            log::warn!("no corner zone qualified; spiral search chose {position:?}");
            return SpawnOutcome { position, source: SpawnSource::Spiral, corner_candidates };
        }
    }

    let position = force_clearing(grid, config.clearing_size);
    *components = ComponentMap::label(grid);
    log::error!(
        "no safe spawn found; cleared a {size}x{size} area at {position:?}",
        size = config.clearing_size
    );
    SpawnOutcome { position, source: SpawnSource::ForcedClearing, corner_candidates: Vec::new() }
}

/// First cell, ring by ring from the map center, that is open, in the center component
/// and has at least three open cells in its 3x3 block.
fn spiral_search(grid: &WorldGrid, components: &ComponentMap, center_label: u32) -> Option<Pos> {
    let center = grid.center();
    let max_ring = grid.width().max(grid.height()) as i32;
    for ring in 0..=max_ring {
        for dy in -ring..=ring {
            for dx in -ring..=ring {
                if dx.abs() != ring && dy.abs() != ring {
                    continue;
                }
                let pos = center.offset(dx, dy);
                if grid.is_open(pos)
                    && components.label_at(pos) == center_label
                    && grid.open_in_block(pos, 1) >= SPIRAL_MIN_OPEN_IN_BLOCK
                {
                    return Some(pos);
                }
            }
        }
    }
    None
}

fn force_clearing(grid: &mut WorldGrid, size: usize) -> Pos {
    let center = grid.center();
    let low = -((size as i32 - 1) / 2);
    let high = low + size as i32 - 1;
    for dy in low..=high {
        for dx in low..=high {
            let pos = center.offset(dx, dy);
            if grid.is_interior(pos) {
                grid.set_tile(pos, TileState::Open);
                grid.set_water(pos, false);
            }
        }
    }
    center
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::seed::Stage;
    use crate::worldgen::walls::fill_walls;

    fn open_interior(width: usize, height: usize) -> WorldGrid {
        let mut grid = WorldGrid::new(width, height);
        let interior: Vec<Pos> = grid.positions().filter(|&pos| grid.is_interior(pos)).collect();
        for pos in interior {
            grid.carve(pos, None);
        }
        fill_walls(&mut grid);
        grid
    }

    fn walled(width: usize, height: usize) -> WorldGrid {
        let mut grid = WorldGrid::new(width, height);
        fill_walls(&mut grid);
        grid
    }

    #[test]
    fn zones_are_inset_from_every_corner() {
        let grid = walled(100, 80);
        let zone = Zone::for_corner(&grid, Corner::BottomRight, 4).expect("fits");
        assert_eq!(zone, Zone { left: 76, top: 56, right: 95, bottom: 75 });
        let zone = Zone::for_corner(&grid, Corner::TopLeft, 4).expect("fits");
        assert_eq!((zone.left, zone.top), (4, 4));
        let cells = zone.banded_cells();
        assert_eq!(cells[0], Pos::new(4, 4));
        assert_eq!(zone.band_of(*cells.last().expect("non-empty")), 9);
    }

    #[test]
    fn open_map_spawns_in_a_corner_of_the_center_component() {
        let mut grid = open_interior(64, 64);
        let mut components = ComponentMap::label(&grid);
        let outcome = choose_spawn(
            &mut grid,
            &mut components,
            &SpawnConfig::default(),
            &mut StageRng::new(1, Stage::Spawn),
        );

        assert!(matches!(outcome.source, SpawnSource::Corner(_)));
        assert_eq!(outcome.corner_candidates.len(), 4);
        assert_eq!(components.label_at(outcome.position), components.center_label().expect("open"));
        // Deepest band scores highest on an open map.
        let (_, top_left) = outcome.corner_candidates[0];
        assert_eq!(top_left.position, Pos::new(19, 19));
    }

    #[test]
    fn disconnected_corners_fall_back_to_the_spiral() {
        let mut grid = walled(40, 40);
        for y in 16..24 {
            for x in 16..24 {
                grid.set_tile(Pos::new(x, y), TileState::Open);
            }
        }
        // Open pocket in a corner zone that is cut off from the center.
        for y in 5..9 {
            for x in 5..9 {
                grid.set_tile(Pos::new(x, y), TileState::Open);
            }
        }
        let mut components = ComponentMap::label(&grid);
        let outcome = choose_spawn(
            &mut grid,
            &mut components,
            &SpawnConfig::default(),
            &mut StageRng::new(2, Stage::Spawn),
        );

        assert_eq!(outcome.source, SpawnSource::Spiral);
        assert_eq!(outcome.position, grid.center());
        assert!(outcome.corner_candidates.is_empty());
    }

    #[test]
    fn sealed_map_forces_a_clearing_and_relabels() {
        let mut grid = walled(30, 30);
        let mut components = ComponentMap::label(&grid);
        let outcome = choose_spawn(
            &mut grid,
            &mut components,
            &SpawnConfig::default(),
            &mut StageRng::new(3, Stage::Spawn),
        );

        assert_eq!(outcome.source, SpawnSource::ForcedClearing);
        assert_eq!(grid.open_count(), 25);
        assert_eq!(components.center_label(), Some(components.label_at(outcome.position)));
        assert_eq!(components.size_of(components.label_at(outcome.position)), 25);
    }

    #[test]
    fn sparse_or_foreign_cells_are_disqualified() {
        let mut grid = walled(20, 20);
        for x in 2..18 {
            grid.set_tile(Pos::new(x, 10), TileState::Open);
        }
        grid.set_tile(Pos::new(3, 3), TileState::Open);
        let components = ComponentMap::label(&grid);
        let scorer = Scorer::new(&grid, &components, components.center_label().expect("open"));

        // A one-wide corridor only has three open cells in any 3x3 block.
        assert_eq!(scorer.score(Pos::new(8, 10)), 0);
        assert_eq!(scorer.score(Pos::new(3, 3)), 0);
        assert_eq!(scorer.score(Pos::new(0, 0)), 0);
    }
}
