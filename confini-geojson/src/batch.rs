//! Traitement par lot : découverte, téléchargement et extraction des sources
//!
//! L'unité de parallélisme est le shapefile : les chemins de sortie de deux
//! fichiers sont disjoints et le reprojector est partagé en lecture seule.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use glob::Pattern;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::Source;
use crate::error::{ConvertError, Result};
use crate::pipeline::{Converter, FileSummary};
use crate::report::RunReport;

/// Profondeur de recherche dans un dossier déjà organisé (`<base>/*/*.shp`)
pub const SCAN_DEPTH: usize = 1;

/// Les archives ISTAT ajoutent un dossier racine (`Limiti01012020/Com01012020/`)
pub const ARCHIVE_DEPTH: usize = 2;

/// Options d'exécution d'un lot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Nombre de shapefiles convertis en parallèle
    pub jobs: usize,
    /// Continuer après l'échec d'un fichier
    pub keep_going: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            keep_going: false,
        }
    }
}

/// Dossiers de travail pour le traitement des sources distantes
#[derive(Debug, Clone)]
pub struct SourceLayout {
    /// Archives téléchargées (conservées entre deux exécutions)
    pub downloads: PathBuf,
    /// Extraction des archives
    pub scratch: PathBuf,
}

/// Recherche les shapefiles `<base>/*/.../*<label>*.shp`, triés par chemin
pub fn discover_shapefiles(base: &Path, label: &str, depth: usize) -> Result<Vec<PathBuf>> {
    let mut pattern = Pattern::escape(&base.to_string_lossy());
    for _ in 0..depth {
        pattern.push_str("/*");
    }
    pattern.push_str(&format!("/*{}*.shp", Pattern::escape(label)));

    let entries = glob::glob(&pattern).map_err(|e| ConvertError::Discovery {
        pattern: pattern.clone(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => {
                let path = e.path().to_path_buf();
                return Err(ConvertError::io(path, e.into_error()));
            }
        }
    }
    files.sort();

    info!(pattern = %pattern, found = files.len(), "Shapefiles découverts");
    Ok(files)
}

/// Télécharge `url` vers `dest` (écriture dans un fichier temporaire puis renommage)
///
/// Une archive déjà présente n'est pas re-téléchargée.
#[cfg(feature = "fetch")]
pub fn fetch_archive(url: &str, dest: &Path) -> Result<()> {
    if dest.is_file() {
        info!(path = %dest.display(), "Archive déjà présente, téléchargement ignoré");
        return Ok(());
    }

    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;

    info!(url = url, path = %dest.display(), "Téléchargement de l'archive");

    let fetch_error = |reason: String| ConvertError::Fetch {
        url: url.to_string(),
        reason,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| fetch_error(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| ConvertError::io(parent, e))?;
    let bytes = std::io::copy(&mut response, &mut tmp).map_err(|e| fetch_error(e.to_string()))?;
    tmp.persist(dest)
        .map_err(|e| ConvertError::io(dest, e.error))?;

    info!(path = %dest.display(), bytes = bytes, "Archive téléchargée");
    Ok(())
}

/// Sans le feature `fetch`, seules les archives déjà présentes sont utilisables
#[cfg(not(feature = "fetch"))]
pub fn fetch_archive(url: &str, dest: &Path) -> Result<()> {
    if dest.is_file() {
        return Ok(());
    }
    Err(ConvertError::Fetch {
        url: url.to_string(),
        reason: format!(
            "built without the `fetch` feature and {} does not exist",
            dest.display()
        ),
    })
}

/// Extrait une archive zip dans `dest`
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let archive_error = |reason: String| ConvertError::Archive {
        path: archive.to_path_buf(),
        reason,
    };

    let file = fs::File::open(archive).map_err(|e| ConvertError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| archive_error(e.to_string()))?;

    fs::create_dir_all(dest).map_err(|e| ConvertError::io(dest, e))?;
    zip.extract(dest).map_err(|e| archive_error(e.to_string()))?;

    info!(
        archive = %archive.display(),
        dest = %dest.display(),
        entries = zip.len(),
        "Archive extraite"
    );
    Ok(())
}

/// Convertit une liste de shapefiles
///
/// Sans `keep_going`, la première erreur (dans l'ordre des fichiers) est
/// renvoyée et les fichiers pas encore commencés sont ignorés.
pub fn run_files(
    converter: &Converter<'_>,
    files: &[PathBuf],
    options: &BatchOptions,
) -> Result<RunReport> {
    let stop = AtomicBool::new(false);
    let convert = |path: &PathBuf| convert_one(converter, path, &stop, options.keep_going);

    let outcomes: Vec<Option<Result<FileSummary>>> = if options.jobs <= 1 {
        files.iter().map(convert).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
            .map_err(|e| ConvertError::Worker(e.to_string()))?;
        pool.install(|| files.par_iter().map(convert).collect())
    };

    let mut report = RunReport::new(converter.reprojection());
    for (path, outcome) in files.iter().zip(outcomes) {
        match outcome {
            None => {}
            Some(Ok(summary)) => report.record_success(summary),
            Some(Err(e)) if options.keep_going => report.record_failure(path, &e),
            Some(Err(e)) => return Err(e),
        }
    }
    Ok(report)
}

fn convert_one(
    converter: &Converter<'_>,
    path: &Path,
    stop: &AtomicBool,
    keep_going: bool,
) -> Option<Result<FileSummary>> {
    if stop.load(Ordering::Relaxed) {
        return None;
    }

    let result = converter.convert_shapefile(path);
    if let Err(e) = &result {
        if keep_going {
            warn!(path = %path.display(), error = %e, "Échec de conversion, shapefile ignoré");
        } else {
            stop.store(true, Ordering::Relaxed);
        }
    }
    Some(result)
}

/// Télécharge, extrait et convertit une source vers `<sortie>/<directory>/`
pub fn process_source(
    source: &Source,
    layout: &SourceLayout,
    converter: &Converter<'_>,
    options: &BatchOptions,
) -> Result<RunReport> {
    info!(
        url = %source.url,
        label = %source.label,
        directory = %source.directory,
        "Traitement de la source"
    );

    let archive = layout.downloads.join(source.archive_name());
    fetch_archive(&source.url, &archive)?;

    let scratch = layout.scratch.join(&source.directory);
    extract_archive(&archive, &scratch)?;

    let files = discover_shapefiles(&scratch, &source.label, ARCHIVE_DEPTH)?;
    if files.is_empty() {
        warn!(
            label = %source.label,
            scratch = %scratch.display(),
            "Aucun shapefile trouvé pour ce millésime"
        );
    }

    let converter = converter.rooted_at(converter.output_root().join(&source.directory));
    run_files(&converter, &files, options)
}
