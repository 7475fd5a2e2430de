//! Rasterizes polylines into breathing, wobbling corridors and roughens their edges.

use crate::config::CorridorConfig;
use crate::types::{BiomeId, Pos, TileState};

use super::grid::WorldGrid;
use super::noise::ValueNoise;
use super::path::{Point, astar, chaikin, jittered_polyline, resample, to_pos};
use super::seed::StageRng;

const WIDTH_NOISE_OFFSET: f32 = 311.7;
const MAX_FUZZ_LENGTH: i32 = 5;
const CHAIKIN_ITERATIONS: usize = 2;
const WAYPOINT_STRIDE: usize = 6;
const BASE_STEP_COST: u32 = 10;
const NOISE_STEP_COST: f32 = 16.0;

/// Shape parameters for one corridor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CorridorStyle {
    pub(crate) width: f32,
    pub(crate) width_variation: f32,
    pub(crate) wobble: f32,
    pub(crate) noise_frequency: f32,
    pub(crate) fuzz_chance: f32,
    pub(crate) path_jitter: f32,
    /// Confines carving to one biome; `None` for the biome-agnostic main network.
    pub(crate) biome: Option<BiomeId>,
}

impl CorridorStyle {
    /// Wide, biome-agnostic corridor for the spanning tree between biome centers.
    pub(crate) fn main(config: &CorridorConfig) -> Self {
        Self {
            width: config.main_width,
            width_variation: config.width_variation,
            wobble: config.wobble,
            noise_frequency: config.noise_frequency,
            fuzz_chance: config.fuzz_chance,
            path_jitter: config.path_jitter,
            biome: None,
        }
    }

    /// Narrow corridor for hall and room links; pair with [`Self::within`].
    pub(crate) fn local(config: &CorridorConfig) -> Self {
        Self { width: config.local_width, ..Self::main(config) }
    }

    pub(crate) fn within(self, biome: BiomeId) -> Self {
        Self { biome: Some(biome), ..self }
    }
}

/// Cells a corridor covered and the rounded centerline it followed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct CarvedCorridor {
    pub(crate) cells: Vec<Pos>,
    pub(crate) centerline: Vec<Pos>,
}

pub(crate) struct CorridorCarver<'a> {
    grid: &'a mut WorldGrid,
    noise: ValueNoise,
    touched: Vec<bool>,
}

impl<'a> CorridorCarver<'a> {
    pub(crate) fn new(grid: &'a mut WorldGrid, noise: ValueNoise) -> Self {
        let touched = vec![false; grid.cell_count()];
        Self { grid, noise, touched }
    }

    /// Straight-ish corridor: jittered 4-point polyline, smoothed and rasterized.
    pub(crate) fn carve_between(
        &mut self,
        start: Pos,
        end: Pos,
        style: CorridorStyle,
        rng: &mut StageRng,
    ) -> CarvedCorridor {
        let polyline = jittered_polyline(start, end, style.path_jitter, rng);
        let smoothed = chaikin(&polyline, CHAIKIN_ITERATIONS);
        self.carve_polyline(&smoothed, style, rng)
    }

    /// A*-guided corridor that stays inside `style.biome` and wanders along cheap noise.
    ///
    /// Falls back to [`Self::carve_between`] when no route is found within `budget`.
    pub(crate) fn carve_organic_link(
        &mut self,
        start: Pos,
        end: Pos,
        style: CorridorStyle,
        budget: usize,
        rng: &mut StageRng,
    ) -> CarvedCorridor {
        let grid = &*self.grid;
        let noise = self.noise;
        let frequency = style.noise_frequency;
        let route = astar(
            start,
            end,
            budget,
            BASE_STEP_COST,
            |pos| grid.is_interior(pos) && style.biome.is_none_or(|biome| grid.biome(pos) == Some(biome)),
            |pos| {
                let field = noise.fractal(pos.x as f32, pos.y as f32, frequency);
                BASE_STEP_COST + ((field + 1.0) * 0.5 * NOISE_STEP_COST) as u32
            },
        );

        match route {
            Some(cells) => {
                let waypoints = resample(&cells, WAYPOINT_STRIDE);
                let smoothed = chaikin(&waypoints, CHAIKIN_ITERATIONS);
                let mut carved = self.carve_polyline(&smoothed, style, rng);
                // Smoothing may cut a corner out of a narrow biome; the raw route keeps it whole.
                for pos in cells {
                    self.stamp(pos, style.biome, &mut carved.cells);
                }
                carved
            }
            None => {
                log::debug!("no organic route from {start:?} to {end:?}; carving a direct link");
                self.carve_between(start, end, style, rng)
            }
        }
    }

    /// Samples `points` at unit arc length, displaces each sample sideways by noise and
    /// stamps a disc whose radius breathes along the way, then fuzzes the edges.
    pub(crate) fn carve_polyline(
        &mut self,
        points: &[Point],
        style: CorridorStyle,
        rng: &mut StageRng,
    ) -> CarvedCorridor {
        let mut carved = CarvedCorridor::default();
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return carved;
        };
        let first_cell = to_pos(first);
        self.stamp(first_cell, style.biome, &mut carved.cells);
        carved.centerline.push(first_cell);
        let mut carry = 0.0_f32;
        for segment in points.windows(2) {
            let (from, to) = (segment[0], segment[1]);
            let (dx, dy) = (to.0 - from.0, to.1 - from.1);
            let length = (dx * dx + dy * dy).sqrt();
            if length <= f32::EPSILON {
                continue;
            }
            let direction = (dx / length, dy / length);
            let mut travelled = carry;
            while travelled <= length {
                let t = travelled / length;
                let sample = (from.0 + dx * t, from.1 + dy * t);
                self.stamp_sample(sample, direction, style, &mut carved);
                travelled += 1.0;
            }
            carry = travelled - length;
        }
        let direction =
            points.len().checked_sub(2).map_or((1.0, 0.0), |index| unit(points[index], last));
        self.stamp_sample(last, direction, style, &mut carved);
        if let Some(&previous) = carved.centerline.last() {
            self.join_centerline(previous, to_pos(last), style.biome, &mut carved);
        }

        self.fuzz_edges(&mut carved, style, rng);
        carved
    }

    fn stamp_sample(
        &mut self,
        sample: Point,
        direction: Point,
        style: CorridorStyle,
        carved: &mut CarvedCorridor,
    ) {
        let frequency = style.noise_frequency;
        let sideways = self.noise.fractal(sample.0, sample.1, frequency) * style.wobble;
        let normal = (-direction.1, direction.0);
        let center = (sample.0 + normal.0 * sideways, sample.1 + normal.1 * sideways);

        let breathing = self.noise.fractal(
            sample.0 + WIDTH_NOISE_OFFSET,
            sample.1 - WIDTH_NOISE_OFFSET,
            frequency,
        );
        let half_width = (style.width * 0.5 * (1.0 + style.width_variation * breathing)).max(0.5);

        let center_cell = to_pos(center);
        match carved.centerline.last().copied() {
            Some(previous) if previous == center_cell => {}
            Some(previous) => self.join_centerline(previous, center_cell, style.biome, carved),
            None => carved.centerline.push(center_cell),
        }

        let reach = half_width.ceil() as i32;
        let limit = half_width * half_width;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let cell = center_cell.offset(dx, dy);
                let ox = cell.x as f32 - center.0;
                let oy = cell.y as f32 - center.1;
                if ox * ox + oy * oy <= limit {
                    self.stamp(cell, style.biome, &mut carved.cells);
                }
            }
        }
        self.stamp(center_cell, style.biome, &mut carved.cells);
    }

    /// Walks x then y from `previous` to `next` so the centerline stays 4-connected even when
    /// wobble shifts consecutive samples diagonally.
    fn join_centerline(
        &mut self,
        previous: Pos,
        next: Pos,
        biome: Option<BiomeId>,
        carved: &mut CarvedCorridor,
    ) {
        let mut cursor = previous;
        while cursor != next {
            if cursor.x != next.x {
                cursor.x += (next.x - cursor.x).signum();
            } else {
                cursor.y += (next.y - cursor.y).signum();
            }
            self.stamp(cursor, biome, &mut carved.cells);
            carved.centerline.push(cursor);
        }
    }

    fn stamp(&mut self, pos: Pos, biome: Option<BiomeId>, cells: &mut Vec<Pos>) {
        if !self.grid.carve(pos, biome) {
            return;
        }
        let index = self.grid.index(pos);
        if !self.touched[index] {
            self.touched[index] = true;
            cells.push(pos);
        }
    }

    /// Pushes short spurs out of boundary cells so edges read as ragged rock.
    fn fuzz_edges(&mut self, carved: &mut CarvedCorridor, style: CorridorStyle, rng: &mut StageRng) {
        if style.fuzz_chance <= 0.0 {
            return;
        }
        let boundary: Vec<Pos> = carved
            .cells
            .iter()
            .copied()
            .filter(|&pos| pos.cardinal_neighbors().iter().any(|&next| !self.grid.is_open(next)))
            .collect();

        let mut spurs = Vec::new();
        for pos in boundary {
            for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
                if self.grid.is_open(pos.offset(dx, dy)) || !rng.chance(style.fuzz_chance) {
                    continue;
                }
                let length = rng.range_i32(1, MAX_FUZZ_LENGTH);
                for step in 1..=length {
                    let cell = pos.offset(dx * step, dy * step);
                    if !self.grid.is_interior(cell)
                        || style.biome.is_some_and(|biome| self.grid.biome(cell) != Some(biome))
                    {
                        break;
                    }
                    if self.grid.tile(cell) != TileState::Open {
                        spurs.push(cell);
                    }
                    self.grid.set_tile(cell, TileState::Open);
                }
            }
        }
        for cell in spurs {
            let index = self.grid.index(cell);
            if !self.touched[index] {
                self.touched[index] = true;
                carved.cells.push(cell);
            }
        }
    }
}

fn unit(from: Point, to: Point) -> Point {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = (dx * dx + dy * dy).sqrt();
    if length <= f32::EPSILON { (1.0, 0.0) } else { (dx / length, dy / length) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::seed::Stage;

    fn style(width: f32) -> CorridorStyle {
        CorridorStyle {
            width,
            width_variation: 0.3,
            wobble: 1.0,
            noise_frequency: 0.1,
            fuzz_chance: 0.0,
            path_jitter: 0.1,
            biome: None,
        }
    }

    fn two_biome_grid() -> WorldGrid {
        let mut grid = WorldGrid::new(40, 20);
        let positions: Vec<Pos> = grid.positions().collect();
        for pos in positions {
            let index = grid.index(pos);
            grid.biomes_mut()[index] = BiomeId(u16::from(pos.y >= 10));
        }
        grid
    }

    #[test]
    fn carved_corridor_connects_its_endpoints() {
        let mut grid = WorldGrid::new(60, 30);
        let mut rng = StageRng::new(8, Stage::Corridors);
        let start = Pos::new(5, 5);
        let end = Pos::new(52, 24);
        let carved = CorridorCarver::new(&mut grid, ValueNoise::new(3))
            .carve_between(start, end, style(3.0), &mut rng);

        assert!(!carved.cells.is_empty());
        assert!(grid.is_open(start) && grid.is_open(end));
        assert!(reachable(&grid, start, end), "corridor must be one 4-connected strip");
    }

    #[test]
    fn biome_confined_corridor_never_leaves_its_biome() {
        let mut grid = two_biome_grid();
        let mut rng = StageRng::new(2, Stage::Corridors);
        let confined = CorridorStyle { fuzz_chance: 0.5, ..style(4.0) }.within(BiomeId(0));
        let carved = CorridorCarver::new(&mut grid, ValueNoise::new(1)).carve_organic_link(
            Pos::new(3, 5),
            Pos::new(35, 5),
            confined,
            10_000,
            &mut rng,
        );

        assert!(!carved.cells.is_empty());
        for pos in grid.positions().filter(|&pos| grid.is_open(pos)) {
            assert_eq!(grid.biome(pos), Some(BiomeId(0)), "{pos:?} leaked into biome 1");
        }
        assert!(reachable(&grid, Pos::new(3, 5), Pos::new(35, 5)));
    }

    #[test]
    fn exhausted_route_search_falls_back_to_a_direct_link() {
        let confined = CorridorStyle { fuzz_chance: 0.5, ..style(3.0) }.within(BiomeId(0));
        let (start, end) = (Pos::new(3, 5), Pos::new(35, 5));

        let mut grid = two_biome_grid();
        let mut rng = StageRng::new(12, Stage::Corridors);
        let carved = CorridorCarver::new(&mut grid, ValueNoise::new(5))
            .carve_organic_link(start, end, confined, 1, &mut rng);

        assert!(!carved.cells.is_empty());
        assert!(grid.is_open(start) && grid.is_open(end));
        for pos in grid.positions().filter(|&pos| grid.is_open(pos)) {
            assert_eq!(grid.biome(pos), Some(BiomeId(0)), "{pos:?} leaked into biome 1");
        }

        let mut direct = two_biome_grid();
        let mut rng = StageRng::new(12, Stage::Corridors);
        let expected = CorridorCarver::new(&mut direct, ValueNoise::new(5))
            .carve_between(start, end, confined, &mut rng);
        assert_eq!(carved, expected, "budget exhaustion should carve the jittered straight link");
    }

    #[test]
    fn corridors_stay_off_the_border_ring() {
        let mut grid = WorldGrid::new(30, 30);
        let mut rng = StageRng::new(4, Stage::Corridors);
        CorridorCarver::new(&mut grid, ValueNoise::new(4)).carve_between(
            Pos::new(1, 1),
            Pos::new(28, 28),
            CorridorStyle { fuzz_chance: 1.0, ..style(5.0) },
            &mut rng,
        );
        for pos in grid.positions().filter(|&pos| !grid.is_interior(pos)) {
            assert!(!grid.is_open(pos), "border cell {pos:?} was opened");
        }
    }

    #[test]
    fn edge_fuzzing_only_adds_cells() {
        let mut smooth = WorldGrid::new(50, 20);
        let mut fuzzy = smooth.clone();
        let polyline = [(3.0, 10.0), (46.0, 10.0)];

        let mut rng = StageRng::new(6, Stage::Corridors);
        CorridorCarver::new(&mut smooth, ValueNoise::new(9)).carve_polyline(&polyline, style(3.0), &mut rng);
        let mut rng = StageRng::new(6, Stage::Corridors);
        CorridorCarver::new(&mut fuzzy, ValueNoise::new(9)).carve_polyline(
            &polyline,
            CorridorStyle { fuzz_chance: 0.4, ..style(3.0) },
            &mut rng,
        );

        assert!(fuzzy.open_count() > smooth.open_count());
        for pos in smooth.positions().filter(|&pos| smooth.is_open(pos)) {
            assert!(fuzzy.is_open(pos));
        }
    }

    fn reachable(grid: &WorldGrid, start: Pos, goal: Pos) -> bool {
        astar(start, goal, grid.cell_count(), 1, |pos| grid.is_open(pos), |_| 1).is_some()
    }
}
