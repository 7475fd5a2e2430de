//! Biome world generation split into one submodule per pipeline stage.

pub mod model;
pub mod writer;

mod biomes;
mod caves;
mod connectivity;
mod connector;
mod corridor;
mod distance;
mod generator;
mod graph;
mod grid;
mod halls;
mod noise;
mod path;
mod rooms;
pub(crate) mod seed;
mod spawn;
mod walls;

pub use biomes::{BRIDGE_TILE, BiomeCenter, BiomeKind, WATER_TILE};
pub use caves::CaveReport;
pub use connectivity::ComponentMap;
pub use generator::{MIN_GRID_SIDE, WorldGenerator};
pub use graph::MstEdge;
pub use grid::WorldGrid;
pub use halls::Hall;
pub use model::{GeneratedWorld, GenerationWarning, MapCorners, WorldSummary};
pub use rooms::Room;
pub use seed::generate_runtime_seed;
pub use spawn::{Corner, SpawnCandidate, SpawnOutcome, SpawnSource};
pub use walls::RiverAxis;
pub use writer::{RecordingWriter, TileWriter};
