//! Main corridor network: spanning tree over biome centers carved as organic corridors.

use crate::types::Pos;

use super::biomes::BiomeField;
use super::corridor::{CorridorCarver, CorridorStyle};
use super::graph::{EdgeMetric, MstEdge, minimum_spanning_tree};
use super::grid::WorldGrid;
use super::noise::ValueNoise;
use super::seed::StageRng;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MainNetwork {
    pub(crate) edges: Vec<MstEdge>,
    /// Rounded corridor centerline per edge, in edge order.
    pub(crate) centerlines: Vec<Vec<Pos>>,
    /// Cells carved by the network, indexed like the grid.
    pub(crate) mask: Vec<bool>,
}

impl MainNetwork {
    pub(crate) fn contains(&self, grid: &WorldGrid, pos: Pos) -> bool {
        grid.in_bounds(pos) && self.mask[grid.index(pos)]
    }
}

pub(crate) fn connect_biomes(
    grid: &mut WorldGrid,
    field: &BiomeField,
    style: CorridorStyle,
    noise: ValueNoise,
    rng: &mut StageRng,
) -> MainNetwork {
    let points: Vec<Pos> = field.centers.iter().map(|center| center.position).collect();
    let edges = minimum_spanning_tree(&points, EdgeMetric::Manhattan);

    let width = grid.width();
    let mut mask = vec![false; grid.cell_count()];
    let mut centerlines = Vec::with_capacity(edges.len());
    let mut carver = CorridorCarver::new(grid, noise);
    for edge in &edges {
        let carved = carver.carve_between(points[edge.a], points[edge.b], style, rng);
        for &pos in &carved.cells {
            mask[(pos.y as usize) * width + pos.x as usize] = true;
        }
        centerlines.push(carved.centerline);
    }

    MainNetwork { edges, centerlines, mask }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorridorConfig;
    use crate::worldgen::biomes::build_biome_field;
    use crate::worldgen::seed::Stage;

    #[test]
    fn network_links_every_biome_center() {
        let mut grid = WorldGrid::new(100, 100);
        let field = build_biome_field(&mut grid, 5, 20.0, &mut StageRng::new(42, Stage::Biomes));
        let network = connect_biomes(
            &mut grid,
            &field,
            CorridorStyle::main(&CorridorConfig::default()),
            ValueNoise::new(42),
            &mut StageRng::new(42, Stage::Corridors),
        );

        assert_eq!(network.edges.len(), field.len() - 1);
        assert_eq!(network.centerlines.len(), network.edges.len());
        for center in &field.centers {
            assert!(grid.is_open(center.position));
            assert!(network.contains(&grid, center.position));
        }
    }

    #[test]
    fn single_biome_has_no_network() {
        let mut grid = WorldGrid::new(40, 40);
        let field = build_biome_field(&mut grid, 1, 10.0, &mut StageRng::new(1, Stage::Biomes));
        let network = connect_biomes(
            &mut grid,
            &field,
            CorridorStyle::main(&CorridorConfig::default()),
            ValueNoise::new(1),
            &mut StageRng::new(1, Stage::Corridors),
        );
        assert!(network.edges.is_empty());
        assert!(!network.mask.contains(&true));
    }
}
