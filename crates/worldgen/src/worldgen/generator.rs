//! High-level world generation entry point wrapping the stage pipeline.

mod pipeline;

use crate::config::WorldConfig;
use crate::error::GenerationError;

use super::model::GeneratedWorld;
use super::seed::generate_runtime_seed;
use super::writer::TileWriter;

pub use pipeline::MIN_GRID_SIDE;

pub struct WorldGenerator {
    config: WorldConfig,
}

impl WorldGenerator {
    pub fn new(config: WorldConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Runs the pipeline with the configured seed, or a fresh runtime seed when none is set.
    pub fn generate(&self) -> Result<GeneratedWorld, GenerationError> {
        let seed = self.config.seed.unwrap_or_else(generate_runtime_seed);
        self.generate_with_seed(seed)
    }

    pub fn generate_with_seed(&self, seed: u64) -> Result<GeneratedWorld, GenerationError> {
        log::info!("generating world with seed {seed}");
        pipeline::build_world(&self.config, seed)
    }

    /// Generates and immediately stamps the result through `writer`.
    pub fn generate_into(&self, writer: &mut impl TileWriter) -> Result<GeneratedWorld, GenerationError> {
        let world = self.generate()?;
        world.stamp(writer);
        Ok(world)
    }
}
