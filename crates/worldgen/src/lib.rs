pub mod config;
pub mod error;
pub mod types;
pub mod worldgen;

pub use config::{CaveConfig, CorridorConfig, RiverConfig, RoomConfig, SpawnConfig, WorldConfig};
pub use error::{ConfigError, GenerationError};
pub use types::*;
pub use worldgen::*;

/// Phase one: builds the world without touching any output surface.
pub fn generate_world(config: &WorldConfig) -> Result<GeneratedWorld, GenerationError> {
    WorldGenerator::new(config.clone()).generate()
}

/// Both phases: builds the world, then stamps it through `writer`.
pub fn generate(
    config: &WorldConfig,
    writer: &mut impl TileWriter,
) -> Result<GeneratedWorld, GenerationError> {
    WorldGenerator::new(config.clone()).generate_into(writer)
}
