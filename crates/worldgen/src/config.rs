//! Generation parameters, loaded from TOML or built in code.
//!
//! Every table is `#[serde(default)]`, so a config file only needs the keys it changes:
//!
//! ```toml
//! sections_x = 3
//! biome_count = 6
//! seed = 42
//!
//! [cave]
//! initial_fill = 0.48
//!
//! [rivers]
//! count = 2
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::worldgen::seed::{Stage, StageRng};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub section_width: usize,
    pub section_height: usize,
    pub sections_x: usize,
    pub sections_y: usize,
    pub biome_count: usize,
    /// Minimum distance between sampled biome centers before relaxation kicks in.
    pub biome_spacing: f32,
    pub seed: Option<u64>,
    /// Lightly jitter tuning values per run, derived from the run seed.
    pub randomize: bool,
    /// Physical size of one cell, used only for [`MapCorners`](crate::MapCorners).
    pub tile_size: f32,
    pub cave: CaveConfig,
    pub corridor: CorridorConfig,
    pub rooms: RoomConfig,
    pub rivers: RiverConfig,
    pub spawn: SpawnConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveConfig {
    pub initial_fill: f32,
    pub smooth_steps: usize,
    pub birth_limit: u8,
    pub death_limit: u8,
    pub open_target: f32,
    /// Amount both limits move up by during the corrective pass.
    pub correction_shift: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorConfig {
    pub main_width: f32,
    pub local_width: f32,
    /// Fraction by which corridor width breathes along its length.
    pub width_variation: f32,
    /// Maximum sideways displacement of the corridor centerline, in cells.
    pub wobble: f32,
    pub noise_frequency: f32,
    /// Maximum perpendicular offset of the 1/3 and 2/3 polyline points, as a fraction of edge length.
    pub path_jitter: f32,
    pub fuzz_chance: f32,
    pub min_hall_radius: usize,
    pub hall_area_min: f32,
    pub hall_area_max: f32,
    pub hall_spacing: f32,
    pub hall_margin: usize,
    pub hall_jitter: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub min_size: usize,
    pub max_size: usize,
    pub min_count: usize,
    pub max_count: usize,
    /// Share of each biome that should stay closed once halls and rooms are placed.
    pub wall_fraction: f32,
    pub max_attempts: usize,
    /// Half-extent of the room search box, in hall radii.
    pub search_radii: f32,
    pub jitter: f32,
    pub link_rooms: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverConfig {
    pub count: usize,
    pub width: usize,
    pub frequency: f32,
    pub amplitude: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub border_thickness: usize,
    pub safety_margin: usize,
    /// Side of the square cleared at the map center when no spawn qualifies anywhere.
    pub clearing_size: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            section_width: 50,
            section_height: 50,
            sections_x: 2,
            sections_y: 2,
            biome_count: 4,
            biome_spacing: 20.0,
            seed: None,
            randomize: false,
            tile_size: 16.0,
            cave: CaveConfig::default(),
            corridor: CorridorConfig::default(),
            rooms: RoomConfig::default(),
            rivers: RiverConfig::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            initial_fill: 0.52,
            smooth_steps: 4,
            birth_limit: 3,
            death_limit: 4,
            open_target: 0.35,
            correction_shift: 2,
        }
    }
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            main_width: 4.0,
            local_width: 2.0,
            width_variation: 0.35,
            wobble: 1.5,
            noise_frequency: 0.08,
            path_jitter: 0.15,
            fuzz_chance: 0.12,
            min_hall_radius: 3,
            hall_area_min: 0.05,
            hall_area_max: 0.18,
            hall_spacing: 12.0,
            hall_margin: 1,
            hall_jitter: 0.2,
        }
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_size: 3,
            max_size: 7,
            min_count: 2,
            max_count: 8,
            wall_fraction: 0.8,
            max_attempts: 300,
            search_radii: 4.0,
            jitter: 0.2,
            link_rooms: true,
        }
    }
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self { count: 1, width: 3, frequency: 0.04, amplitude: 5.0 }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self { border_thickness: 1, safety_margin: 3, clearing_size: 5 }
    }
}

impl WorldConfig {
    pub fn width(&self) -> usize {
        self.section_width * self.sections_x
    }

    pub fn height(&self) -> usize {
        self.section_height * self.sections_y
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.section_width == 0 || self.section_height == 0 {
            return Err(ConfigError::invalid("section_width", "section dimensions must be non-zero"));
        }
        if self.sections_x == 0 || self.sections_y == 0 {
            return Err(ConfigError::invalid("sections_x", "section counts must be non-zero"));
        }
        if self.biome_count == 0 || self.biome_count > usize::from(u16::MAX) {
            return Err(ConfigError::invalid(
                "biome_count",
                format!("must be in 1..={}, got {}", u16::MAX, self.biome_count),
            ));
        }
        require_non_negative("biome_spacing", self.biome_spacing)?;
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(ConfigError::invalid("tile_size", "must be a positive number"));
        }

        let cave = &self.cave;
        require_unit("cave.initial_fill", cave.initial_fill)?;
        require_unit("cave.open_target", cave.open_target)?;
        if cave.birth_limit > 8 || cave.death_limit > 8 {
            return Err(ConfigError::invalid("cave.birth_limit", "neighbor limits must be <= 8"));
        }

        let corridor = &self.corridor;
        if !(corridor.main_width >= 1.0 && corridor.local_width >= 1.0) {
            return Err(ConfigError::invalid("corridor.main_width", "widths must be >= 1"));
        }
        require_unit("corridor.width_variation", corridor.width_variation)?;
        require_unit("corridor.fuzz_chance", corridor.fuzz_chance)?;
        require_unit("corridor.hall_jitter", corridor.hall_jitter)?;
        require_non_negative("corridor.wobble", corridor.wobble)?;
        require_non_negative("corridor.noise_frequency", corridor.noise_frequency)?;
        require_non_negative("corridor.path_jitter", corridor.path_jitter)?;
        require_non_negative("corridor.hall_spacing", corridor.hall_spacing)?;
        require_unit("corridor.hall_area_min", corridor.hall_area_min)?;
        require_unit("corridor.hall_area_max", corridor.hall_area_max)?;
        if corridor.hall_area_min > corridor.hall_area_max {
            return Err(ConfigError::invalid(
                "corridor.hall_area_min",
                "must not exceed corridor.hall_area_max",
            ));
        }
        if corridor.min_hall_radius == 0 {
            return Err(ConfigError::invalid("corridor.min_hall_radius", "must be >= 1"));
        }

        let rooms = &self.rooms;
        if rooms.min_size == 0 || rooms.min_size > rooms.max_size {
            return Err(ConfigError::invalid("rooms.min_size", "must be in 1..=rooms.max_size"));
        }
        if rooms.min_count > rooms.max_count {
            return Err(ConfigError::invalid("rooms.min_count", "must not exceed rooms.max_count"));
        }
        require_unit("rooms.wall_fraction", rooms.wall_fraction)?;
        require_unit("rooms.jitter", rooms.jitter)?;
        require_non_negative("rooms.search_radii", rooms.search_radii)?;

        if self.rivers.count > 0 && self.rivers.width == 0 {
            return Err(ConfigError::invalid("rivers.width", "must be >= 1 when rivers are enabled"));
        }
        require_non_negative("rivers.frequency", self.rivers.frequency)?;
        require_non_negative("rivers.amplitude", self.rivers.amplitude)?;

        if self.spawn.clearing_size == 0 {
            return Err(ConfigError::invalid("spawn.clearing_size", "must be >= 1"));
        }
        Ok(())
    }

    /// Copy of this config with tuning values nudged by a stream derived from `run_seed`.
    ///
    /// Returns an identical copy when `randomize` is off.
    pub fn randomized(&self, run_seed: u64) -> Self {
        let mut tuned = self.clone();
        if !self.randomize {
            return tuned;
        }

        let mut rng = StageRng::new(run_seed, Stage::Tuning);
        tuned.cave.initial_fill =
            (self.cave.initial_fill + rng.range_f32(-0.03, 0.03)).clamp(0.0, 1.0);
        tuned.cave.smooth_steps =
            (self.cave.smooth_steps as i32 + rng.range_i32(-1, 1)).max(1) as usize;

        let hall_shift = rng.range_f32(-0.01, 0.01);
        tuned.corridor.hall_area_min = (self.corridor.hall_area_min + hall_shift).clamp(0.0, 1.0);
        tuned.corridor.hall_area_max = (self.corridor.hall_area_max + hall_shift)
            .clamp(tuned.corridor.hall_area_min, 1.0);
        tuned.corridor.wobble = (self.corridor.wobble * rng.range_f32(0.8, 1.2)).max(0.0);
        tuned.rivers.amplitude = (self.rivers.amplitude * rng.range_f32(0.75, 1.25)).max(0.0);
        tuned
    }
}

fn require_unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be within [0, 1], got {value}")))
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be a finite non-negative number, got {value}")))
    }
}
