//! One irregular hall per biome, kept clear of neighboring biomes and wired to the main network.

use std::cmp::Reverse;
use std::collections::VecDeque;
use std::f32::consts::{PI, SQRT_2};

use serde::{Deserialize, Serialize};

use crate::config::CorridorConfig;
use crate::types::{BiomeId, Pos};

use super::biomes::BiomeField;
use super::connector::MainNetwork;
use super::corridor::{CorridorCarver, CorridorStyle};
use super::distance::BoundaryDistance;
use super::grid::WorldGrid;
use super::noise::ValueNoise;
use super::seed::StageRng;

const SEARCH_STEP: usize = 3;
const SHRINK_FACTOR: f32 = 0.75;
const SHRINK_ROUNDS: usize = 3;
const SPACING_WEIGHT: f32 = 0.6;
const EDGE_WEIGHT: f32 = 0.4;
const SEED_WEIGHT: f32 = 1.0;
const SHAPE_NOISE_SCALE: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hall {
    pub biome: BiomeId,
    pub center: Pos,
    pub radius: u32,
}

impl Hall {
    pub fn area(&self) -> f32 {
        PI * (self.radius as f32) * (self.radius as f32)
    }
}

pub(crate) struct HallContext<'a> {
    pub(crate) field: &'a BiomeField,
    pub(crate) network: &'a MainNetwork,
    pub(crate) config: &'a CorridorConfig,
    pub(crate) local_style: CorridorStyle,
    pub(crate) noise: ValueNoise,
}

/// Places, carves and connects one hall per biome; returns them ordered by biome id.
pub(crate) fn place_halls(
    grid: &mut WorldGrid,
    context: &HallContext<'_>,
    rng: &mut StageRng,
) -> Vec<Hall> {
    let distances = BoundaryDistance::compute(grid);
    let cells_by_biome = cells_by_biome(grid, context.field.len());

    let mut order: Vec<usize> = (0..context.field.len()).collect();
    order.sort_by_key(|&biome| (Reverse(context.field.areas[biome]), biome));

    let mut halls: Vec<Hall> = Vec::with_capacity(order.len());
    for biome_index in order {
        let biome = BiomeId(biome_index as u16);
        let cells = &cells_by_biome[biome_index];
        if cells.is_empty() {
            continue;
        }

        let fraction = rng.range_f32(context.config.hall_area_min, context.config.hall_area_max);
        let target_area = context.field.areas[biome_index] as f32 * fraction;
        let radius =
            ((target_area / PI).sqrt().floor() as u32).max(context.config.min_hall_radius as u32);

        let seed_point = context.field.centers[biome_index].position;
        let search = HallSearch {
            grid: &*grid,
            distances: &distances,
            cells,
            biome,
            seed_point,
            placed: &halls,
            config: context.config,
        };
        let hall = search.find_site(radius);
        carve_hall(grid, &hall, context.config.hall_jitter, context.noise, context.config.noise_frequency, rng);
        connect_hall(grid, &hall, context, rng);
        log::debug!("hall for biome {} at {:?} radius {}", biome.0, hall.center, hall.radius);
        halls.push(hall);
    }

    halls.sort_by_key(|hall| hall.biome);
    halls
}

pub(crate) fn cells_by_biome(grid: &WorldGrid, biome_count: usize) -> Vec<Vec<Pos>> {
    let mut cells = vec![Vec::new(); biome_count];
    for pos in grid.positions() {
        if let Some(biome) = grid.biome(pos)
            && let Some(list) = cells.get_mut(biome.index())
        {
            list.push(pos);
        }
    }
    cells
}

/// Site search for one biome's hall against the halls already placed.
struct HallSearch<'a> {
    grid: &'a WorldGrid,
    distances: &'a BoundaryDistance,
    cells: &'a [Pos],
    biome: BiomeId,
    seed_point: Pos,
    placed: &'a [Hall],
    config: &'a CorridorConfig,
}

impl HallSearch<'_> {
    fn find_site(&self, radius: u32) -> Hall {
        let biome = self.biome;
        let mut trial_radius = radius;
        for round in 0..=SHRINK_ROUNDS {
            if let Some(center) = self.best_candidate(trial_radius) {
                if round > 0 {
                    log::debug!(
                        "biome {} hall shrank from radius {radius} to {trial_radius}",
                        biome.0
                    );
                }
                return Hall { biome, center, radius: trial_radius };
            }
            let shrunk = ((trial_radius as f32) * SHRINK_FACTOR).floor() as u32;
            if shrunk < 2 || shrunk == trial_radius {
                break;
            }
            trial_radius = shrunk;
        }

        // Deepest cell of the biome; the radius is whatever clearance allows there.
        let mut center = self.cells[0];
        let mut clearance = self.distances.at(center);
        for &pos in self.cells {
            let distance = self.distances.at(pos);
            if distance > clearance {
                center = pos;
                clearance = distance;
            }
        }
        let margin = self.config.hall_margin as u32;
        let disc_fit = (clearance.saturating_sub(1) as f32 / SQRT_2).floor() as u32;
        let radius = disc_fit.max(2).min(clearance.saturating_sub(margin));
        log::warn!(
            "biome {} has no hall site for radius {trial_radius}; using clearance fallback at {center:?} radius {radius}",
            biome.0
        );
        Hall { biome, center, radius }
    }

    fn best_candidate(&self, radius: u32) -> Option<Pos> {
        let grid = self.grid;
        let required_clearance = radius + self.config.hall_margin as u32;
        let max_edge = (grid.width().min(grid.height()) / 2) as f32;

        let mut best: Option<(f32, Pos)> = None;
        for &pos in self.cells {
            if pos.x as usize % SEARCH_STEP != 0 || pos.y as usize % SEARCH_STEP != 0 {
                continue;
            }
            if self.distances.at(pos) < required_clearance {
                continue;
            }
            if self.placed.iter().any(|hall| hall.center.distance(pos) < self.config.hall_spacing) {
                continue;
            }
            if !disc_inside_biome(grid, pos, radius, self.biome) {
                continue;
            }

            let spacing: f32 = self.placed.iter().map(|hall| hall.center.distance(pos)).sum();
            let edge_proximity = max_edge - grid.edge_distance(pos) as f32;
            let seed_distance = self.seed_point.distance(pos);
            let score = SPACING_WEIGHT * spacing + EDGE_WEIGHT * edge_proximity
                - SEED_WEIGHT * seed_distance;
            if best.is_none_or(|(best_score, _)| score > best_score) {
                best = Some((score, pos));
            }
        }
        best.map(|(_, pos)| pos)
    }
}

pub(crate) fn disc_inside_biome(grid: &WorldGrid, center: Pos, radius: u32, biome: BiomeId) -> bool {
    let reach = radius as i32;
    let limit = u64::from(radius) * u64::from(radius);
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let pos = center.offset(dx, dy);
            if center.distance_squared(pos) > limit {
                continue;
            }
            if !grid.is_interior(pos) || grid.biome(pos) != Some(biome) {
                return false;
            }
        }
    }
    true
}

/// Anisotropic disc whose edge radius wobbles with noise: `r * (1 + jitter * noise)`.
fn carve_hall(
    grid: &mut WorldGrid,
    hall: &Hall,
    jitter: f32,
    noise: ValueNoise,
    frequency: f32,
    rng: &mut StageRng,
) {
    let stretch_x = rng.range_f32(0.85, 1.15);
    let stretch_y = 1.0 / stretch_x;
    let radius = hall.radius as f32;
    let reach = (radius * (1.0 + jitter) * 1.2).ceil() as i32 + 1;

    grid.carve(hall.center, Some(hall.biome));
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let pos = hall.center.offset(dx, dy);
            let nx = dx as f32 / stretch_x;
            let ny = dy as f32 / stretch_y;
            let distance = (nx * nx + ny * ny).sqrt();
            let wobble = noise.fractal(pos.x as f32, pos.y as f32, frequency * SHAPE_NOISE_SCALE);
            if distance <= radius * (1.0 + jitter * wobble) {
                grid.carve(pos, Some(hall.biome));
            }
        }
    }
}

fn connect_hall(grid: &mut WorldGrid, hall: &Hall, context: &HallContext<'_>, rng: &mut StageRng) {
    let budget = grid.cell_count();
    let Some(target) = nearest_network_cell(grid, context.network, hall.center, hall.biome, budget)
    else {
        if !context.network.edges.is_empty() {
            log::debug!("hall of biome {} found no main corridor to join", hall.biome.0);
        }
        return;
    };
    if target == hall.center {
        return;
    }
    CorridorCarver::new(grid, context.noise).carve_organic_link(
        hall.center,
        target,
        context.local_style.within(hall.biome),
        budget,
        rng,
    );
}

/// Breadth-first search through `biome` for the closest main-network cell.
pub(crate) fn nearest_network_cell(
    grid: &WorldGrid,
    network: &MainNetwork,
    start: Pos,
    biome: BiomeId,
    budget: usize,
) -> Option<Pos> {
    let mut seen = vec![false; grid.cell_count()];
    let mut queue = VecDeque::from([start]);
    seen[grid.index(start)] = true;
    let mut visited = 0_usize;

    while let Some(pos) = queue.pop_front() {
        if network.contains(grid, pos) {
            return Some(pos);
        }
        visited += 1;
        if visited >= budget {
            return None;
        }
        for next in pos.cardinal_neighbors() {
            if !grid.in_bounds(next) || grid.biome(next) != Some(biome) {
                continue;
            }
            let index = grid.index(next);
            if !seen[index] {
                seen[index] = true;
                queue.push_back(next);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::biomes::{BiomeCenter, BiomeKind, assign_biomes};
    use crate::worldgen::path::astar;
    use crate::worldgen::seed::Stage;

    fn field_for(grid: &mut WorldGrid, positions: &[Pos]) -> BiomeField {
        let centers: Vec<BiomeCenter> = positions
            .iter()
            .enumerate()
            .map(|(index, &position)| BiomeCenter {
                position,
                biome_id: BiomeId(index as u16),
                kind: BiomeKind::Forest,
            })
            .collect();
        let areas = assign_biomes(grid, &centers);
        BiomeField { centers, areas }
    }

    fn empty_network(grid: &WorldGrid) -> MainNetwork {
        MainNetwork { edges: Vec::new(), centerlines: Vec::new(), mask: vec![false; grid.cell_count()] }
    }

    #[test]
    fn halls_respect_boundary_clearance() {
        let mut grid = WorldGrid::new(90, 60);
        let field = field_for(&mut grid, &[Pos::new(20, 20), Pos::new(70, 15), Pos::new(45, 45)]);
        let network = empty_network(&grid);
        let config = CorridorConfig::default();
        let context = HallContext {
            field: &field,
            network: &network,
            config: &config,
            local_style: CorridorStyle::local(&config),
            noise: ValueNoise::new(5),
        };
        let distances = BoundaryDistance::compute(&grid);

        let halls = place_halls(&mut grid, &context, &mut StageRng::new(5, Stage::Halls));
        assert_eq!(halls.len(), 3);
        for hall in &halls {
            assert_eq!(grid.biome(hall.center), Some(hall.biome));
            assert!(
                hall.radius + config.hall_margin as u32 <= distances.at(hall.center),
                "{hall:?} exceeds clearance {}",
                distances.at(hall.center)
            );
            assert!(grid.is_open(hall.center));
        }
    }

    #[test]
    fn carved_hall_stays_in_its_biome() {
        let mut grid = WorldGrid::new(60, 40);
        let field = field_for(&mut grid, &[Pos::new(15, 20), Pos::new(45, 20)]);
        let network = empty_network(&grid);
        let config = CorridorConfig { hall_area_min: 0.4, hall_area_max: 0.4, ..CorridorConfig::default() };
        let context = HallContext {
            field: &field,
            network: &network,
            config: &config,
            local_style: CorridorStyle::local(&config),
            noise: ValueNoise::new(2),
        };
        let halls = place_halls(&mut grid, &context, &mut StageRng::new(2, Stage::Halls));

        assert_eq!(halls.len(), 2);
        for pos in grid.positions().filter(|&pos| grid.is_open(pos)) {
            let owner = grid.biome(pos).expect("in bounds");
            let hall = halls.iter().find(|hall| hall.biome == owner).expect("hall per biome");
            let reach = hall.radius as f32 * (1.0 + config.hall_jitter) * 1.2 + 1.5;
            assert!(pos.distance(hall.center) <= reach, "{pos:?} opened outside its own hall");
        }
    }

    #[test]
    fn tiny_biome_falls_back_to_clearance_radius() {
        let mut grid = WorldGrid::new(12, 12);
        let field = field_for(&mut grid, &[Pos::new(6, 6)]);
        let config = CorridorConfig { min_hall_radius: 20, ..CorridorConfig::default() };
        let distances = BoundaryDistance::compute(&grid);
        let cells = cells_by_biome(&grid, 1);

        let search = HallSearch {
            grid: &grid,
            distances: &distances,
            cells: &cells[0],
            biome: BiomeId(0),
            seed_point: Pos::new(6, 6),
            placed: &[],
            config: &config,
        };
        let hall = search.find_site(20);
        assert!(hall.radius >= 1);
        assert!(hall.radius + config.hall_margin as u32 <= distances.at(hall.center));
        assert!(field.areas[0] == 144);
    }

    #[test]
    fn candidates_keep_their_distance_from_placed_halls() {
        let mut grid = WorldGrid::new(60, 60);
        field_for(&mut grid, &[Pos::new(30, 30)]);
        let config = CorridorConfig::default();
        let distances = BoundaryDistance::compute(&grid);
        let cells = cells_by_biome(&grid, 1);
        let placed = [Hall { biome: BiomeId(0), center: Pos::new(30, 30), radius: 4 }];
        let search = HallSearch {
            grid: &grid,
            distances: &distances,
            cells: &cells[0],
            biome: BiomeId(0),
            seed_point: Pos::new(30, 30),
            placed: &placed,
            config: &config,
        };

        let center = search.best_candidate(3).expect("open biome has room for a second hall");
        assert!(center.distance(placed[0].center) >= config.hall_spacing, "{center:?} crowds the placed hall");
        assert!(distances.at(center) >= 3 + config.hall_margin as u32);
    }

    #[test]
    fn nearest_network_cell_stays_inside_the_biome() {
        let mut grid = WorldGrid::new(30, 10);
        field_for(&mut grid, &[Pos::new(5, 5), Pos::new(25, 5)]);
        let mut network = empty_network(&grid);
        // Only a cell in the foreign biome is on the network.
        let foreign = Pos::new(27, 5);
        network.mask[grid.index(foreign)] = true;
        assert_eq!(nearest_network_cell(&grid, &network, Pos::new(5, 5), BiomeId(0), 1_000), None);

        let local = Pos::new(9, 2);
        network.mask[grid.index(local)] = true;
        assert_eq!(nearest_network_cell(&grid, &network, Pos::new(5, 5), BiomeId(0), 1_000), Some(local));
        assert_eq!(nearest_network_cell(&grid, &network, Pos::new(5, 5), BiomeId(0), 3), None);
    }

    #[test]
    fn hall_joins_the_main_network() {
        let mut grid = WorldGrid::new(60, 40);
        let field = field_for(&mut grid, &[Pos::new(30, 20)]);
        let mut network = empty_network(&grid);
        for x in 5..55 {
            let pos = Pos::new(x, 5);
            grid.carve(pos, None);
            network.mask[grid.index(pos)] = true;
        }
        let config = CorridorConfig::default();
        let context = HallContext {
            field: &field,
            network: &network,
            config: &config,
            local_style: CorridorStyle::local(&config),
            noise: ValueNoise::new(8),
        };
        let halls = place_halls(&mut grid, &context, &mut StageRng::new(8, Stage::Halls));

        let route = astar(
            halls[0].center,
            Pos::new(30, 5),
            grid.cell_count(),
            1,
            |pos| grid.is_open(pos),
            |_| 1,
        );
        assert!(route.is_some(), "hall should be linked to the corridor row");
    }
}
