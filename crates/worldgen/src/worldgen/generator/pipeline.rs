//! World-construction pipeline that runs every stage in order over one grid.

use crate::config::WorldConfig;
use crate::error::GenerationError;

use super::super::biomes::build_biome_field;
use super::super::caves::carve_caves;
use super::super::connectivity::ComponentMap;
use super::super::connector::connect_biomes;
use super::super::corridor::CorridorStyle;
use super::super::grid::WorldGrid;
use super::super::halls::{HallContext, place_halls};
use super::super::model::{GeneratedWorld, GenerationWarning, MapCorners};
use super::super::noise::ValueNoise;
use super::super::rooms::{RoomContext, place_rooms};
use super::super::seed::{Stage, StageRng, derive_stage_seed};
use super::super::spawn::{SpawnSource, choose_spawn};
use super::super::walls::finish_terrain;

/// Smallest grid side the corner zones and halls still fit into.
pub const MIN_GRID_SIDE: usize = 16;

pub(super) fn build_world(config: &WorldConfig, seed: u64) -> Result<GeneratedWorld, GenerationError> {
    config.validate()?;
    let (width, height) = (config.width(), config.height());
    if width < MIN_GRID_SIDE || height < MIN_GRID_SIDE {
        return Err(GenerationError::GridTooSmall { width, height, min: MIN_GRID_SIDE });
    }

    let config = config.randomized(seed);
    let mut warnings = Vec::new();
    let mut grid = WorldGrid::new(width, height);
    let noise = ValueNoise::new(derive_stage_seed(seed, Stage::Noise));

    let field = build_biome_field(
        &mut grid,
        config.biome_count,
        config.biome_spacing,
        &mut StageRng::new(seed, Stage::Biomes),
    );
    log::info!("biomes: {} centers over {width}x{height}", field.len());

    let cave = carve_caves(&mut grid, &config.cave, &mut StageRng::new(seed, Stage::Caves));
    log::info!("caves: open ratio {:.3} (corrected: {})", cave.open_ratio, cave.corrected);
    if cave.open_ratio < config.cave.open_target {
        log::warn!(
            "cave open ratio {:.3} stayed below target {:.3}",
            cave.open_ratio,
            config.cave.open_target
        );
        warnings.push(GenerationWarning::OpenRatioBelowTarget {
            achieved: cave.open_ratio,
            target: config.cave.open_target,
        });
    }

    let network = connect_biomes(
        &mut grid,
        &field,
        CorridorStyle::main(&config.corridor),
        noise,
        &mut StageRng::new(seed, Stage::Corridors),
    );
    if network.edges.len() + 1 != field.len() {
        return Err(GenerationError::Invariant(format!(
            "spanning tree over {} centers has {} edges",
            field.len(),
            network.edges.len()
        )));
    }
    log::info!("corridors: {} main edges", network.edges.len());

    let local_style = CorridorStyle::local(&config.corridor);
    let halls = place_halls(
        &mut grid,
        &HallContext { field: &field, network: &network, config: &config.corridor, local_style, noise },
        &mut StageRng::new(seed, Stage::Halls),
    );
    log::info!("halls: {} placed", halls.len());

    let rooms = place_rooms(
        &mut grid,
        &halls,
        &RoomContext { field: &field, config: &config.rooms, local_style, noise },
        &mut StageRng::new(seed, Stage::Rooms),
    );
    log::info!("rooms: {} placed", rooms.len());

    let bridge_half_width = (config.corridor.main_width * 0.5).ceil() as i32 + 1;
    let terrain = finish_terrain(
        &mut grid,
        &config.rivers,
        &network.centerlines,
        bridge_half_width,
        noise,
        &mut StageRng::new(seed, Stage::Rivers),
    );
    log::info!(
        "walls: {} rivers, {} water cells, {} bridge cells",
        terrain.rivers.len(),
        terrain.water_cells,
        terrain.bridge_cells.len()
    );

    let mut components = ComponentMap::label(&grid);
    let spawn =
        choose_spawn(&mut grid, &mut components, &config.spawn, &mut StageRng::new(seed, Stage::Spawn));
    if spawn.source == SpawnSource::ForcedClearing {
        warnings.push(GenerationWarning::ForcedSpawnClearing {
            position: spawn.position,
            size: config.spawn.clearing_size,
        });
    }
    let spawn_label = components.label_at(spawn.position);
    if spawn_label == 0 || components.center_label() != Some(spawn_label) {
        return Err(GenerationError::Invariant(format!(
            "spawn {:?} is not in the center component",
            spawn.position
        )));
    }
    log::info!(
        "spawn: {:?} via {:?}, component of {} cells",
        spawn.position,
        spawn.source,
        components.size_of(spawn_label)
    );

    Ok(GeneratedWorld {
        seed,
        corners: MapCorners::new(width, height, config.tile_size),
        centers: field.centers,
        mst_edges: network.edges,
        halls,
        rooms,
        rivers: terrain.rivers,
        bridge_cells: terrain.bridge_cells,
        cave,
        components,
        spawn,
        warnings,
        grid,
        config,
    })
}
