//! Rapport d'exécution
//!
//! Collecte les résultats par shapefile pour un affichage console et une
//! sauvegarde JSON optionnelle.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::classify::AdministrativeLevel;
use crate::error::{ConvertError, Result};
use crate::export::geojson::write_file_to_path;
use crate::pipeline::FileSummary;

/// Statut global de l'exécution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Tous les fichiers convertis
    Success,
    /// Certains fichiers en erreur
    PartialSuccess,
    /// Aucun fichier converti
    Failed,
}

/// Résultat d'un shapefile
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub features: usize,
    pub by_level: BTreeMap<AdministrativeLevel, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<FileSummary> for FileReport {
    fn from(summary: FileSummary) -> Self {
        Self {
            path: summary.path,
            features: summary.features,
            by_level: summary.by_level,
            collection: summary.collection,
            error: None,
        }
    }
}

/// Rapport complet d'une exécution
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub duration_secs: f64,
    /// Description de l'étape de reprojection
    pub reprojection: String,
    pub files_processed: usize,
    pub files_failed: usize,
    pub features_written: usize,
    pub by_level: BTreeMap<AdministrativeLevel, usize>,
    pub files: Vec<FileReport>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            status: RunStatus::Success,
            duration_secs: 0.0,
            reprojection: "none".to_string(),
            files_processed: 0,
            files_failed: 0,
            features_written: 0,
            by_level: BTreeMap::new(),
            files: Vec::new(),
        }
    }
}

impl RunReport {
    pub fn new(reprojection: impl Into<String>) -> Self {
        Self {
            reprojection: reprojection.into(),
            ..Default::default()
        }
    }

    /// Enregistre un fichier converti
    pub fn record_success(&mut self, summary: FileSummary) {
        self.files_processed += 1;
        self.features_written += summary.features;
        for (level, count) in &summary.by_level {
            *self.by_level.entry(*level).or_default() += count;
        }
        self.files.push(summary.into());
    }

    /// Enregistre un fichier en échec
    pub fn record_failure(&mut self, path: &Path, error: &ConvertError) {
        self.files_processed += 1;
        self.files_failed += 1;
        self.files.push(FileReport {
            path: path.to_path_buf(),
            features: 0,
            by_level: BTreeMap::new(),
            collection: None,
            error: Some(error.to_string()),
        });
    }

    /// Fusionne le rapport d'une source dans celui de l'exécution
    pub fn merge(&mut self, other: RunReport) {
        self.files_processed += other.files_processed;
        self.files_failed += other.files_failed;
        self.features_written += other.features_written;
        for (level, count) in other.by_level {
            *self.by_level.entry(level).or_default() += count;
        }
        self.files.extend(other.files);
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        let converted = self.files_processed - self.files_failed;
        self.status = if self.files_failed == 0 {
            RunStatus::Success
        } else if converted > 0 {
            RunStatus::PartialSuccess
        } else {
            RunStatus::Failed
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("CONVERSION REPORT");
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);
        println!("Reprojection: {}", self.reprojection);

        println!("\n--- SUMMARY ---");
        println!(
            "Shapefiles: {} processed, {} failed",
            self.files_processed, self.files_failed
        );
        println!("Features: {} written", self.features_written);

        if !self.by_level.is_empty() {
            println!("\n--- BY LEVEL ---");
            for (level, count) in &self.by_level {
                println!("  {}: {}", level, count);
            }
        }

        let failures: Vec<_> = self.files.iter().filter(|f| f.error.is_some()).collect();
        if !failures.is_empty() {
            println!("\n--- ERRORS ({}) ---", failures.len());
            for file in failures.iter().take(20) {
                println!(
                    "  [{}] {}",
                    file.path.display(),
                    file.error.as_deref().unwrap_or_default()
                );
            }
            if failures.len() > 20 {
                println!("  ... and {} more", failures.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        write_file_to_path(path, &json)
    }

    /// Résumé sur une ligne
    pub fn summary(&self) -> String {
        format!(
            "{} shapefiles, {} features, {} errors",
            self.files_processed, self.features_written, self.files_failed
        )
    }
}
