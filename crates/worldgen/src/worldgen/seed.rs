//! Deterministic seed mixing and per-stage random streams for world generation.

use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

/// Independent random stream identifiers, one per pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stage {
    Tuning,
    Biomes,
    Caves,
    Corridors,
    Halls,
    Rooms,
    Rivers,
    Spawn,
    Noise,
}

impl Stage {
    fn code(self) -> u64 {
        match self {
            Self::Tuning => 1,
            Self::Biomes => 2,
            Self::Caves => 3,
            Self::Corridors => 4,
            Self::Halls => 5,
            Self::Rooms => 6,
            Self::Rivers => 7,
            Self::Spawn => 8,
            Self::Noise => 9,
        }
    }
}

pub(crate) fn mix_seed_stream(seed: u64, stream: u64) -> u64 {
    let mut mixed = seed ^ stream.wrapping_mul(0xD6E8_FD9A_5B89_7A4D);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    mixed ^ (mixed >> 33)
}

pub(crate) fn derive_stage_seed(run_seed: u64, stage: Stage) -> u64 {
    let mut mixed = run_seed ^ 0x9E37_79B9_7F4A_7C15;
    mixed ^= stage.code().wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 30;
    mixed = mixed.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 27;
    mixed = mixed.wrapping_mul(0x94D0_49BB_1331_11EB);
    mixed ^ (mixed >> 31)
}

pub(crate) struct StageRng {
    rng: ChaCha8Rng,
}

impl StageRng {
    pub(crate) fn new(run_seed: u64, stage: Stage) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(derive_stage_seed(run_seed, stage)) }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    /// Uniform value in `[0, 1)`.
    pub(crate) fn unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1_u64 << 24) as f32
    }

    pub(crate) fn chance(&mut self, probability: f32) -> bool {
        self.unit() < probability
    }

    pub(crate) fn range_usize(&mut self, min_value: usize, max_value: usize) -> usize {
        debug_assert!(min_value <= max_value);
        let range_size = (max_value - min_value) as u64 + 1;
        min_value + (self.next_u64() % range_size) as usize
    }

    pub(crate) fn range_i32(&mut self, min_value: i32, max_value: i32) -> i32 {
        debug_assert!(min_value <= max_value);
        let range_size = (i64::from(max_value) - i64::from(min_value)) as u64 + 1;
        (i64::from(min_value) + (self.next_u64() % range_size) as i64) as i32
    }

    pub(crate) fn range_f32(&mut self, min_value: f32, max_value: f32) -> f32 {
        min_value + (max_value - min_value) * self.unit()
    }
}

static GENERATED_SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Seed for runs that do not pin one in their config.
pub fn generate_runtime_seed() -> u64 {
    let now_nanos =
        SystemTime::now().duration_since(UNIX_EPOCH).map_or(0_u128, |duration| duration.as_nanos());
    let pid = u64::from(process::id());
    let counter = GENERATED_SEED_COUNTER.fetch_add(1, Ordering::Relaxed);

    let entropy = (now_nanos as u64)
        ^ ((now_nanos >> 64) as u64)
        ^ pid.rotate_left(17)
        ^ counter.rotate_left(7);

    mix_seed_stream(entropy, 0)
}
