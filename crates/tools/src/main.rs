use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use worldgen::{WorldConfig, WorldGenerator};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML world config; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed override, taking precedence over the config file
    #[arg(short, long)]
    seed: Option<u64>,
    /// Print the JSON summary instead of the ASCII map
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => WorldConfig::load(path)
            .with_context(|| format!("Failed to load world config: {}", path.display()))?,
        None => WorldConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let world = WorldGenerator::new(config).generate().context("World generation failed")?;
    for warning in &world.warnings {
        log::warn!("{warning:?}");
    }

    if args.json {
        let summary = serde_json::to_string_pretty(&world.summary())
            .context("Failed to serialize world summary")?;
        println!("{summary}");
    } else {
        print!("{}", world.ascii_map());
        println!("Seed: {}", world.seed);
        println!("Spawn: {:?} via {:?}", world.spawn_position(), world.spawn.source);
        println!("Open ratio: {:.3}", world.grid.open_ratio());
    }

    Ok(())
}
