use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use farm_rotations::binder::RotationPeriodBinder;
use farm_rotations::calendars::PeriodTaxonomy;
use farm_rotations::config::ModelConfig;
use farm_rotations::json::JSON;
use farm_rotations::logging;
use farm_rotations::rotations::{RotationCache, RotationGenerator};
use farm_rotations::seasons::SeasonBranchModel;

#[derive(Parser)]
#[command(name = "farm-rotations")]
#[command(about = "Rotation phases, season branching and period coefficients of a farm model")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the rotation phases and their history relation
    Generate {
        /// Model configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Reuse or write the generated rotations at this path
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Regenerate even if the cache is fresh
        #[arg(short, long)]
        force: bool,

        /// Write the rotation period coefficients as JSON
        #[arg(long)]
        coefficients: Option<PathBuf>,
    },
    /// Print the season parents and identification periods
    Seasons {
        /// Model configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn print_identification(model: &SeasonBranchModel, taxonomy: &PeriodTaxonomy) {
    println!("\nidentification over `{}`", taxonomy.name());
    print!("{:>8}", "");
    for key in taxonomy.keys() {
        print!("{:>6}", key);
    }
    println!();
    let identified = model.identification(taxonomy);
    for (z, name) in model.seasons().keys().iter().enumerate() {
        print!("{:>8}", name);
        for p in 0..taxonomy.len() {
            print!("{:>6}", if identified[[p, z]] { "x" } else { "." });
        }
        println!();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    match cli.command {
        Commands::Generate {
            config,
            cache,
            force,
            coefficients,
        } => {
            let model = ModelConfig::from_path(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            let rotations = match cache {
                Some(path) => RotationCache::new(path).load_or_generate(
                    &model.rotation,
                    Some(config.as_path()),
                    force,
                )?,
                None => RotationGenerator::try_new(&model.rotation)?.generate()?,
            };
            println!(
                "{} phases, {} histories, {} requires, {} provides",
                rotations.phases.len(),
                rotations.histories.len(),
                rotations.relation.requires().len(),
                rotations.relation.provides().len()
            );
            if let Some(path) = coefficients {
                let seasons = model.season_model()?;
                let binder = RotationPeriodBinder::try_new(
                    &model.rotation,
                    &rotations,
                    &seasons,
                    &model.calendar.phase,
                )?;
                fs::write(&path, binder.coefficients().to_json()?)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("coefficients written to {}", path.display());
            }
        }
        Commands::Seasons { config } => {
            let model = ModelConfig::from_path(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            let seasons = model.season_model()?;
            println!("{:>8}{:>12}{:>8}{:>8}", "season", "initiation", "prob", "parent");
            for (z, name) in seasons.seasons().keys().iter().enumerate() {
                println!(
                    "{:>8}{:>12}{:>8.3}{:>8}",
                    name,
                    seasons.seasons().initiation()[z].to_string(),
                    seasons.seasons().probabilities()[z],
                    seasons.seasons().keys()[seasons.parent(z)]
                );
            }
            print_identification(&seasons, &model.calendar.season);
            print_identification(&seasons, &model.calendar.phase);
        }
    }

    Ok(())
}
