//! Point d'entrée CLI pour confini-geojson

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use confini_geojson::{RunStatus, Settings};

mod cli;

use cli::Commands;

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Convertir les limites administratives ISTAT en GeoJSON
#[derive(Parser)]
#[command(name = "confini-geojson")]
#[command(author, version)]
#[command(about = "Convertir les shapefiles ISTAT en un fichier GeoJSON par feature")]
#[command(long_about = "Décode les shapefiles des limites administratives ISTAT, reprojette en WGS84 et écrit chaque feature sous <sortie>/<niveau>/<code>.geojson.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Sauvegarder le rapport d'exécution en JSON
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let settings = Settings::from_env();
    let started = Instant::now();

    let mut report = match &cli.command {
        Commands::Convert(args) => {
            info!(shape = %args.shape.display(), output = %args.output.display(), "Conversion");
            cli::cmd_convert(args, &settings)?
        }
        Commands::Scan(args) => {
            info!(base = %args.base.display(), label = %args.label, "Scan");
            cli::cmd_scan(args, &settings)?
        }
        Commands::Sources(args) => {
            info!(config = %args.config.display(), "Sources");
            cli::cmd_sources(args, &settings)?
        }
    };

    report.set_duration(started.elapsed());
    report.finalize();

    if !cli.quiet {
        report.display();
    }
    if let Some(path) = &cli.report {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Rapport sauvegardé");
    }

    if report.status != RunStatus::Success {
        anyhow::bail!("{} of {} shapefiles failed", report.files_failed, report.files_processed);
    }
    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
