//! Budgeted room placement around each biome's hall.

use serde::{Deserialize, Serialize};

use crate::config::RoomConfig;
use crate::types::{BiomeId, Pos};

use super::biomes::BiomeField;
use super::corridor::{CorridorCarver, CorridorStyle};
use super::graph::{EdgeMetric, minimum_spanning_tree};
use super::grid::WorldGrid;
use super::halls::Hall;
use super::noise::ValueNoise;
use super::seed::StageRng;

const ROOM_SPACING: usize = 2;
const SHAPE_NOISE_SCALE: f32 = 2.5;

/// Axis-aligned room footprint; the carved floor is a noisy ellipse inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub biome: BiomeId,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Room {
    pub fn right(self) -> usize {
        self.x + self.width - 1
    }

    pub fn bottom(self) -> usize {
        self.y + self.height - 1
    }

    pub fn center(self) -> Pos {
        Pos { y: (self.y + (self.height / 2)) as i32, x: (self.x + (self.width / 2)) as i32 }
    }

    pub fn area(self) -> usize {
        self.width * self.height
    }

    pub(crate) fn expanded(self, margin: usize) -> Self {
        let expanded_x = self.x.saturating_sub(margin);
        let expanded_y = self.y.saturating_sub(margin);
        let expanded_right = self.right().saturating_add(margin);
        let expanded_bottom = self.bottom().saturating_add(margin);
        Self {
            biome: self.biome,
            x: expanded_x,
            y: expanded_y,
            width: expanded_right - expanded_x + 1,
            height: expanded_bottom - expanded_y + 1,
        }
    }

    pub fn intersects(self, other: &Self) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    pub fn contains(self, pos: Pos) -> bool {
        if pos.x < 0 || pos.y < 0 {
            return false;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    pub fn cells(self) -> impl Iterator<Item = Pos> {
        (self.y..=self.bottom()).flat_map(move |y| {
            (self.x..=self.right()).map(move |x| Pos { y: y as i32, x: x as i32 })
        })
    }
}

pub(crate) struct RoomContext<'a> {
    pub(crate) field: &'a BiomeField,
    pub(crate) config: &'a RoomConfig,
    pub(crate) local_style: CorridorStyle,
    pub(crate) noise: ValueNoise,
}

/// Places rooms for every hall, carves them and links each back to its hall.
pub(crate) fn place_rooms(
    grid: &mut WorldGrid,
    halls: &[Hall],
    context: &RoomContext<'_>,
    rng: &mut StageRng,
) -> Vec<Room> {
    let mut rooms = Vec::new();
    for hall in halls {
        let placed = place_biome_rooms(grid, hall, context, rng);
        log::debug!("biome {} received {} rooms", hall.biome.0, placed.len());
        rooms.extend(placed);
    }
    rooms
}

fn place_biome_rooms(
    grid: &mut WorldGrid,
    hall: &Hall,
    context: &RoomContext<'_>,
    rng: &mut StageRng,
) -> Vec<Room> {
    let config = context.config;
    let biome_area = context.field.areas.get(hall.biome.index()).copied().unwrap_or(0) as f32;
    let budget = ((1.0 - config.wall_fraction) * biome_area - hall.area()).max(0.0);
    let extent = ((config.search_radii * hall.radius as f32).ceil() as i32).max(config.max_size as i32);
    let style = context.local_style.within(hall.biome);
    let budget_cells = grid.cell_count();

    let mut rooms: Vec<Room> = Vec::new();
    let mut opened = 0.0_f32;
    let mut attempts = 0;
    while attempts < config.max_attempts && rooms.len() < config.max_count {
        if opened >= budget && rooms.len() >= config.min_count {
            break;
        }
        attempts += 1;

        let width = rng.range_usize(config.min_size, config.max_size);
        let height = rng.range_usize(config.min_size, config.max_size);
        let center_x = hall.center.x + rng.range_i32(-extent, extent);
        let center_y = hall.center.y + rng.range_i32(-extent, extent);
        let left = center_x - (width / 2) as i32;
        let top = center_y - (height / 2) as i32;
        if left < 1 || top < 1 {
            continue;
        }
        let room = Room { biome: hall.biome, x: left as usize, y: top as usize, width, height };
        if !fits_biome(grid, room)
            || rooms.iter().any(|placed| placed.expanded(ROOM_SPACING).intersects(&room))
        {
            continue;
        }

        opened += carve_room(grid, room, config.jitter, context.noise, style.noise_frequency) as f32;
        CorridorCarver::new(grid, context.noise).carve_organic_link(
            room.center(),
            hall.center,
            style,
            budget_cells,
            rng,
        );
        rooms.push(room);
    }

    if rooms.len() < config.min_count {
        log::debug!(
            "biome {} fit only {} of {} minimum rooms after {attempts} attempts",
            hall.biome.0,
            rooms.len(),
            config.min_count
        );
    }
    if config.link_rooms {
        link_rooms(grid, &rooms, style, context.noise, rng);
    }
    rooms
}

fn fits_biome(grid: &WorldGrid, room: Room) -> bool {
    room.cells().all(|pos| grid.is_interior(pos) && grid.biome(pos) == Some(room.biome))
}

/// Noise-perturbed ellipse inscribed in the room; returns how many cells were carved.
fn carve_room(grid: &mut WorldGrid, room: Room, jitter: f32, noise: ValueNoise, frequency: f32) -> usize {
    let center_x = room.x as f32 + (room.width as f32 - 1.0) * 0.5;
    let center_y = room.y as f32 + (room.height as f32 - 1.0) * 0.5;
    let radius_x = room.width as f32 * 0.5;
    let radius_y = room.height as f32 * 0.5;

    let mut carved = 0;
    for pos in room.cells() {
        let nx = (pos.x as f32 - center_x) / radius_x;
        let ny = (pos.y as f32 - center_y) / radius_y;
        let wobble = noise.fractal(pos.x as f32, pos.y as f32, frequency * SHAPE_NOISE_SCALE);
        if nx * nx + ny * ny <= 1.0 + jitter * wobble && grid.carve(pos, Some(room.biome)) {
            carved += 1;
        }
    }
    if grid.carve(room.center(), Some(room.biome)) {
        carved += 1;
    }
    carved
}

/// Joins rooms of one biome along a squared-Euclidean spanning tree of their centers.
fn link_rooms(
    grid: &mut WorldGrid,
    rooms: &[Room],
    style: CorridorStyle,
    noise: ValueNoise,
    rng: &mut StageRng,
) {
    let centers: Vec<Pos> = rooms.iter().map(|room| room.center()).collect();
    let budget = grid.cell_count();
    let mut carver = CorridorCarver::new(grid, noise);
    for edge in minimum_spanning_tree(&centers, EdgeMetric::SquaredEuclidean) {
        carver.carve_organic_link(centers[edge.a], centers[edge.b], style, budget, rng);
    }
}
