//! Public data models for generated worlds and their summaries.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;
use crate::types::{BiomeId, Pos, TileState};

use super::biomes::{BRIDGE_TILE, BiomeCenter, BiomeKind, WATER_TILE};
use super::caves::CaveReport;
use super::connectivity::ComponentMap;
use super::graph::MstEdge;
use super::grid::WorldGrid;
use super::halls::Hall;
use super::rooms::Room;
use super::spawn::{SpawnOutcome, SpawnSource};
use super::walls::RiverAxis;
use super::writer::TileWriter;

/// Something degraded during generation that the caller may want to act on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GenerationWarning {
    /// No spawn qualified anywhere, so a square at the map center was opened.
    ForcedSpawnClearing { position: Pos, size: usize },
    /// The cave pass stayed below its open target even after correcting.
    OpenRatioBelowTarget { achieved: f32, target: f32 },
}

/// Physical-space centers of the four corner tiles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapCorners {
    pub top_left: (f32, f32),
    pub top_right: (f32, f32),
    pub bottom_left: (f32, f32),
    pub bottom_right: (f32, f32),
}

impl MapCorners {
    pub fn new(width: usize, height: usize, tile_size: f32) -> Self {
        let center = |x: usize, y: usize| ((x as f32 + 0.5) * tile_size, (y as f32 + 0.5) * tile_size);
        let right = width.saturating_sub(1);
        let bottom = height.saturating_sub(1);
        Self {
            top_left: center(0, 0),
            top_right: center(right, 0),
            bottom_left: center(0, bottom),
            bottom_right: center(right, bottom),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedWorld {
    pub seed: u64,
    /// Config after randomization, i.e. the values this world was built with.
    pub config: WorldConfig,
    pub grid: WorldGrid,
    pub centers: Vec<BiomeCenter>,
    pub mst_edges: Vec<MstEdge>,
    pub halls: Vec<Hall>,
    pub rooms: Vec<Room>,
    pub rivers: Vec<RiverAxis>,
    pub bridge_cells: Vec<Pos>,
    pub cave: CaveReport,
    pub components: ComponentMap,
    pub spawn: SpawnOutcome,
    pub corners: MapCorners,
    pub warnings: Vec<GenerationWarning>,
}

impl GeneratedWorld {
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn spawn_position(&self) -> Pos {
        self.spawn.position
    }

    pub fn tile_at(&self, pos: Pos) -> TileState {
        self.grid.tile(pos)
    }

    pub fn biome_kind(&self, biome: BiomeId) -> BiomeKind {
        self.centers.get(biome.index()).map_or(BiomeKind::Meadow, |center| center.kind)
    }

    /// Stable byte layout of everything the determinism guarantee covers.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(16 + self.grid.cell_count() * 4);
        bytes.extend((self.width() as u32).to_le_bytes());
        bytes.extend((self.height() as u32).to_le_bytes());
        for tile in self.grid.tiles() {
            bytes.push(match tile {
                TileState::Background => 0,
                TileState::Open => 1,
                TileState::Wall => 2,
            });
        }
        for biome in self.grid.biomes() {
            bytes.extend(biome.0.to_le_bytes());
        }
        for &water in self.grid.water() {
            bytes.push(u8::from(water));
        }
        bytes.extend(self.spawn.position.y.to_le_bytes());
        bytes.extend(self.spawn.position.x.to_le_bytes());
        bytes
    }

    /// Hands every cell to `writer` using the biome palette.
    ///
    /// Water cells get their wall erased before the water floor goes down; bridge cells
    /// get the bridge tile instead of the biome floor.
    pub fn stamp(&self, writer: &mut impl TileWriter) {
        let mut bridges = vec![false; self.grid.cell_count()];
        for &pos in &self.bridge_cells {
            if self.grid.in_bounds(pos) {
                bridges[self.grid.index(pos)] = true;
            }
        }

        for pos in self.grid.positions() {
            let index = self.grid.index(pos);
            let kind = self.biome_kind(self.grid.biomes()[index]);
            match self.grid.tiles()[index] {
                TileState::Open if bridges[index] => writer.write_floor(pos, BRIDGE_TILE),
                TileState::Open => writer.write_floor(pos, kind.floor_tile()),
                TileState::Wall => writer.write_wall(pos, kind.wall_tile()),
                TileState::Background => {
                    writer.erase_wall(pos);
                    if self.grid.water()[index] {
                        writer.write_floor(pos, WATER_TILE);
                    }
                }
            }
        }
    }

    /// One line per row: `#` wall, `~` water, `=` bridge, `@` spawn, biome glyph for floor.
    pub fn ascii_map(&self) -> String {
        let mut out = String::with_capacity((self.width() + 1) * self.height());
        let bridges: BTreeSet<Pos> = self.bridge_cells.iter().copied().collect();
        for pos in self.grid.positions() {
            let glyph = if pos == self.spawn.position {
                '@'
            } else {
                match self.grid.tile(pos) {
                    TileState::Wall => '#',
                    TileState::Background if self.grid.is_water(pos) => '~',
                    TileState::Background => ' ',
                    TileState::Open if bridges.contains(&pos) => '=',
                    TileState::Open => {
                        self.grid.biome(pos).map_or('.', |biome| self.biome_kind(biome).glyph())
                    }
                }
            };
            out.push(glyph);
            if pos.x as usize + 1 == self.width() {
                out.push('\n');
            }
        }
        out
    }

    pub fn summary(&self) -> WorldSummary {
        let spawn_label = self.components.label_at(self.spawn.position);
        WorldSummary {
            seed: self.seed,
            width: self.width(),
            height: self.height(),
            biomes: self.centers.iter().map(|center| center.kind).collect(),
            mst_edges: self.mst_edges.len(),
            halls: self.halls.len(),
            rooms: self.rooms.len(),
            open_cells: self.grid.open_count(),
            open_ratio: self.grid.open_ratio(),
            cave_open_ratio: self.cave.open_ratio,
            water_cells: self.grid.water().iter().filter(|&&water| water).count(),
            bridge_cells: self.bridge_cells.len(),
            components: self.components.component_count(),
            largest_component: self.components.sizes().iter().copied().max().unwrap_or(0),
            spawn: self.spawn.position,
            spawn_source: self.spawn.source,
            spawn_component_size: self.components.size_of(spawn_label),
            corners: self.corners,
            warnings: self.warnings.clone(),
        }
    }
}

/// Compact, serializable digest of a [`GeneratedWorld`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSummary {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub biomes: Vec<BiomeKind>,
    pub mst_edges: usize,
    pub halls: usize,
    pub rooms: usize,
    pub open_cells: usize,
    pub open_ratio: f32,
    pub cave_open_ratio: f32,
    pub water_cells: usize,
    pub bridge_cells: usize,
    pub components: usize,
    pub largest_component: usize,
    pub spawn: Pos,
    pub spawn_source: SpawnSource,
    pub spawn_component_size: usize,
    pub corners: MapCorners,
    pub warnings: Vec<GenerationWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_tile_centers_in_physical_units() {
        let corners = MapCorners::new(100, 50, 16.0);
        assert_eq!(corners.top_left, (8.0, 8.0));
        assert_eq!(corners.top_right, (99.5 * 16.0, 8.0));
        assert_eq!(corners.bottom_left, (8.0, 49.5 * 16.0));
        assert_eq!(corners.bottom_right, (1_592.0, 792.0));
    }
}
