//! Définition et implémentation des commandes CLI
//!
//! - `convert`: un shapefile → GeoJSON
//! - `scan`: tous les shapefiles d'un millésime sous un dossier
//! - `sources`: archives distantes décrites dans un document YAML

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use confini_geojson::batch::{self, BatchOptions, SourceLayout, SCAN_DEPTH};
use confini_geojson::{AxisOrder, Converter, RunReport, Settings, SmartReprojector, SourceList};

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a single shapefile
    Convert(ConvertArgs),

    /// Convert every shapefile matching a vintage label under a directory
    Scan(ScanArgs),

    /// Download, extract and convert the sources listed in a YAML document
    Sources(SourcesArgs),
}

/// Options de reprojection communes à toutes les commandes
#[derive(Args, Debug)]
pub struct ProjectionArgs {
    /// Keep the source coordinates (already geographic data)
    #[arg(long)]
    pub no_reproject: bool,

    /// Source EPSG code (défaut : env CONFINI_SOURCE_EPSG / 32632)
    #[arg(long)]
    pub source_epsg: Option<u32>,

    /// Target EPSG code (défaut : env CONFINI_TARGET_EPSG / 4326)
    #[arg(long)]
    pub target_epsg: Option<u32>,

    /// Output axis order: lonlat (GeoJSON) or latlon (EPSG authority)
    #[arg(long)]
    pub axis_order: Option<AxisOrder>,
}

/// Options d'exécution par lot
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Number of shapefiles converted concurrently (défaut : env CONFINI_JOBS / 1)
    #[arg(long, alias = "threads")]
    pub jobs: Option<usize>,

    /// Log failing shapefiles and continue with the next one
    #[arg(long)]
    pub keep_going: bool,

    /// Also write one FeatureCollection per shapefile in this directory
    #[arg(long)]
    pub collection_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Path to the .shp file (the .dbf must sit next to it)
    #[arg(short, long)]
    pub shape: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub output: PathBuf,

    /// Sub-directory of the output receiving the features (ex: 2020)
    #[arg(long)]
    pub root: Option<String>,

    /// Also write all features in a single FeatureCollection file
    #[arg(long)]
    pub collection: Option<PathBuf>,

    #[command(flatten)]
    pub projection: ProjectionArgs,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory holding one sub-directory per shapefile
    #[arg(short, long)]
    pub base: PathBuf,

    /// Vintage label contained in the file names (ex: 01012020)
    #[arg(short, long)]
    pub label: String,

    /// Output directory
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of directory levels between the base and the shapefiles
    #[arg(long, default_value_t = SCAN_DEPTH)]
    pub depth: usize,

    #[command(flatten)]
    pub batch: BatchArgs,

    #[command(flatten)]
    pub projection: ProjectionArgs,
}

#[derive(Args, Debug)]
pub struct SourcesArgs {
    /// YAML document listing the sources
    #[arg(short, long, default_value = "sources.yaml")]
    pub config: PathBuf,

    /// Output directory (one sub-directory per source)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Extraction directory
    #[arg(long, default_value = "tmp")]
    pub scratch: PathBuf,

    /// Download directory (archives already present are reused)
    #[arg(long, default_value = "downloads")]
    pub downloads: PathBuf,

    #[command(flatten)]
    pub batch: BatchArgs,

    #[command(flatten)]
    pub projection: ProjectionArgs,
}

/// Construit le reprojector unique de l'exécution
fn build_reprojector(
    args: &ProjectionArgs,
    settings: &Settings,
) -> Result<Option<SmartReprojector>> {
    if args.no_reproject {
        info!("Reprojection désactivée");
        return Ok(None);
    }

    let source = args.source_epsg.unwrap_or(settings.source_epsg);
    let target = args.target_epsg.unwrap_or(settings.target_epsg);
    let axis_order = args.axis_order.unwrap_or(settings.axis_order);

    let reprojector = SmartReprojector::new(source, target, axis_order)
        .with_context(|| format!("Cannot reproject EPSG:{} → EPSG:{}", source, target))?;
    info!(
        backend = reprojector.description(),
        source = source,
        target = target,
        axis_order = ?axis_order,
        "Reprojector initialisé"
    );
    Ok(Some(reprojector))
}

fn build_converter<'a>(output: &Path, reprojector: Option<&'a SmartReprojector>) -> Converter<'a> {
    let converter = Converter::new(output);
    match reprojector {
        Some(r) => converter.with_reprojector(r),
        None => converter,
    }
}

fn batch_options(args: &BatchArgs, settings: &Settings) -> BatchOptions {
    BatchOptions {
        jobs: args.jobs.unwrap_or(settings.jobs).max(1),
        keep_going: args.keep_going,
    }
}

/// Exécute la commande convert
pub fn cmd_convert(args: &ConvertArgs, settings: &Settings) -> Result<RunReport> {
    let reprojector = build_reprojector(&args.projection, settings)?;

    let output = match args.root.as_deref() {
        Some(root) => args.output.join(root),
        None => args.output.clone(),
    };
    let mut converter = build_converter(&output, reprojector.as_ref());
    if let Some(collection) = &args.collection {
        converter = converter.with_collection_file(collection);
    }

    let mut report = RunReport::new(converter.reprojection());
    let summary = converter
        .convert_shapefile(&args.shape)
        .with_context(|| format!("Failed to convert {}", args.shape.display()))?;

    println!(
        "Converted {} features from {} to {}",
        summary.features,
        args.shape.display(),
        output.display()
    );
    report.record_success(summary);
    Ok(report)
}

/// Exécute la commande scan
pub fn cmd_scan(args: &ScanArgs, settings: &Settings) -> Result<RunReport> {
    let files = batch::discover_shapefiles(&args.base, &args.label, args.depth)?;
    if files.is_empty() {
        anyhow::bail!(
            "No shapefile matching '{}' found in {}",
            args.label,
            args.base.display()
        );
    }

    let reprojector = build_reprojector(&args.projection, settings)?;
    let mut converter = build_converter(&args.output, reprojector.as_ref());
    if let Some(dir) = &args.batch.collection_dir {
        converter = converter.with_collection_dir(dir);
    }
    let options = batch_options(&args.batch, settings);

    println!("=== Scan {} ===", args.label);
    println!("Base: {}", args.base.display());
    println!("Shapefiles: {}", files.len());
    println!("Jobs: {}", options.jobs);

    Ok(batch::run_files(&converter, &files, &options)?)
}

/// Exécute la commande sources
pub fn cmd_sources(args: &SourcesArgs, settings: &Settings) -> Result<RunReport> {
    let list = SourceList::load(&args.config)?;
    if list.sources.is_empty() {
        anyhow::bail!("No source listed in {}", args.config.display());
    }

    let reprojector = build_reprojector(&args.projection, settings)?;
    let mut converter = build_converter(&args.output, reprojector.as_ref());
    if let Some(dir) = &args.batch.collection_dir {
        converter = converter.with_collection_dir(dir);
    }
    let options = batch_options(&args.batch, settings);
    let layout = SourceLayout {
        downloads: args.downloads.clone(),
        scratch: args.scratch.clone(),
    };

    println!("=== Sources {} ===", args.config.display());
    println!("Sources: {}", list.sources.len());
    println!("Jobs: {}", options.jobs);

    let mut report = RunReport::new(converter.reprojection());
    for source in &list.sources {
        let source_report = batch::process_source(source, &layout, &converter, &options)
            .with_context(|| format!("Failed to process source {}", source.url))?;
        println!("{}: {}", source.directory, source_report.summary());
        report.merge(source_report);
    }
    Ok(report)
}
