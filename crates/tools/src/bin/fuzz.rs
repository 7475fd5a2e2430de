use anyhow::{Result, bail};
use clap::Parser;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use worldgen::{GeneratedWorld, WorldConfig, generate_world};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 200)]
    runs: u32,
    /// Also jitter tuning values per run
    #[arg(long)]
    randomize: bool,
}

fn check(config: &WorldConfig, world: &GeneratedWorld) -> Result<()> {
    if world.mst_edges.len() + 1 != world.centers.len() {
        bail!("{} edges for {} biome centers", world.mst_edges.len(), world.centers.len());
    }

    let label = world.components.label_at(world.spawn_position());
    if label == 0 || world.components.center_label() != Some(label) {
        bail!("spawn {:?} is outside the center component", world.spawn_position());
    }

    for room in &world.rooms {
        if room.cells().any(|pos| world.grid.biome(pos) != Some(room.biome)) {
            bail!("room {room:?} leaks out of biome {}", room.biome.0);
        }
    }

    let replay = generate_world(config)?;
    if replay.canonical_bytes() != world.canonical_bytes() {
        bail!("seed {} did not reproduce the same world", world.seed);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("Starting worldgen fuzz on seed {} for {} runs...", args.seed, args.runs);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    for run in 0..args.runs {
        let seed = rng.next_u64();
        let biome_count = 1 + (rng.next_u32() % 8) as usize;
        let config = WorldConfig {
            seed: Some(seed),
            biome_count,
            randomize: args.randomize,
            ..WorldConfig::default()
        };
        let world = generate_world(&config)?;
        if let Err(error) = check(&config, &world) {
            bail!("run {run} (seed {seed}, {biome_count} biomes) failed: {error}");
        }
        log::debug!("run {run}: seed {seed} ok, {} rooms", world.rooms.len());
    }

    println!("Fuzzing completed successfully.");
    Ok(())
}
