//! Shared cell storage mutated stage by stage, plus tile-space helpers.

use crate::types::{BiomeId, Pos, TileState};

pub(crate) const EIGHT_NEIGHBORHOOD: [(i32, i32); 8] =
    [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

/// Tile state, biome assignment and water mask for every cell, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldGrid {
    width: usize,
    height: usize,
    tiles: Vec<TileState>,
    biomes: Vec<BiomeId>,
    water: Vec<bool>,
}

impl WorldGrid {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        let cells = width * height;
        Self {
            width,
            height,
            tiles: vec![TileState::Background; cells],
            biomes: vec![BiomeId::default(); cells],
            water: vec![false; cells],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn tiles(&self) -> &[TileState] {
        &self.tiles
    }

    pub fn biomes(&self) -> &[BiomeId] {
        &self.biomes
    }

    pub fn water(&self) -> &[bool] {
        &self.water
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// In bounds and off the outer border ring.
    pub fn is_interior(&self, pos: Pos) -> bool {
        pos.x >= 1
            && pos.y >= 1
            && (pos.x as usize) + 1 < self.width
            && (pos.y as usize) + 1 < self.height
    }

    pub fn index(&self, pos: Pos) -> usize {
        (pos.y as usize) * self.width + (pos.x as usize)
    }

    pub fn pos_of(&self, index: usize) -> Pos {
        Pos { y: (index / self.width) as i32, x: (index % self.width) as i32 }
    }

    pub fn center(&self) -> Pos {
        Pos { y: (self.height / 2) as i32, x: (self.width / 2) as i32 }
    }

    /// Out-of-bounds cells read as `Wall`.
    pub fn tile(&self, pos: Pos) -> TileState {
        if !self.in_bounds(pos) {
            return TileState::Wall;
        }
        self.tiles[self.index(pos)]
    }

    pub fn is_open(&self, pos: Pos) -> bool {
        self.tile(pos).is_open()
    }

    pub fn biome(&self, pos: Pos) -> Option<BiomeId> {
        self.in_bounds(pos).then(|| self.biomes[self.index(pos)])
    }

    pub fn is_water(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.water[self.index(pos)]
    }

    pub fn open_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_open()).count()
    }

    pub fn open_ratio(&self) -> f32 {
        if self.tiles.is_empty() {
            return 0.0;
        }
        self.open_count() as f32 / self.tiles.len() as f32
    }

    pub(crate) fn set_tile(&mut self, pos: Pos, tile: TileState) {
        if !self.in_bounds(pos) {
            return;
        }
        let index = self.index(pos);
        self.tiles[index] = tile;
    }

    pub(crate) fn set_water(&mut self, pos: Pos, water: bool) {
        if !self.in_bounds(pos) {
            return;
        }
        let index = self.index(pos);
        self.water[index] = water;
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [TileState] {
        &mut self.tiles
    }

    pub(crate) fn biomes_mut(&mut self) -> &mut [BiomeId] {
        &mut self.biomes
    }

    /// Opens `pos` if it is interior and, when `biome` is given, belongs to that biome.
    pub(crate) fn carve(&mut self, pos: Pos, biome: Option<BiomeId>) -> bool {
        if !self.is_interior(pos) {
            return false;
        }
        let index = self.index(pos);
        if biome.is_some_and(|biome| self.biomes[index] != biome) {
            return false;
        }
        self.tiles[index] = TileState::Open;
        true
    }

    pub(crate) fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let width = self.width as i32;
        let height = self.height as i32;
        (0..height).flat_map(move |y| (0..width).map(move |x| Pos { y, x }))
    }

    /// Open cells inside the `(2r+1)²` block around `pos`, `pos` included.
    pub(crate) fn open_in_block(&self, pos: Pos, radius: i32) -> u32 {
        let mut count = 0;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if self.is_open(pos.offset(dx, dy)) {
                    count += 1;
                }
            }
        }
        count
    }

    pub(crate) fn edge_distance(&self, pos: Pos) -> u32 {
        let right = self.width as i32 - 1 - pos.x;
        let bottom = self.height as i32 - 1 - pos.y;
        pos.x.min(pos.y).min(right).min(bottom).max(0) as u32
    }
}
