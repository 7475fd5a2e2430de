//! Boundary distance transform: how far each cell sits from a foreign biome.

use std::collections::VecDeque;

use crate::types::Pos;

use super::grid::WorldGrid;

/// Per-cell 4-connected step distance to the nearest cell of another biome.
///
/// The space outside the grid counts as foreign, so edge cells and cells touching another
/// biome both get distance 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BoundaryDistance {
    width: usize,
    distances: Vec<u32>,
}

impl BoundaryDistance {
    pub(crate) fn compute(grid: &WorldGrid) -> Self {
        let mut distances = vec![u32::MAX; grid.cell_count()];
        let mut queue = VecDeque::new();
        for pos in grid.positions() {
            let own = grid.biome(pos);
            let touches_foreign =
                pos.cardinal_neighbors().iter().any(|&next| grid.biome(next) != own);
            if touches_foreign {
                distances[grid.index(pos)] = 1;
                queue.push_back(pos);
            }
        }

        while let Some(pos) = queue.pop_front() {
            let next_distance = distances[grid.index(pos)] + 1;
            let own = grid.biome(pos);
            for next in pos.cardinal_neighbors() {
                if grid.biome(next) != own {
                    continue;
                }
                let index = grid.index(next);
                if distances[index] > next_distance {
                    distances[index] = next_distance;
                    queue.push_back(next);
                }
            }
        }

        Self { width: grid.width(), distances }
    }

    pub(crate) fn at(&self, pos: Pos) -> u32 {
        if pos.x < 0 || pos.y < 0 || pos.x as usize >= self.width {
            return 0;
        }
        self.distances.get((pos.y as usize) * self.width + pos.x as usize).copied().unwrap_or(0)
    }
}
