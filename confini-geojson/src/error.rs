//! Erreurs du pipeline de conversion

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Erreurs pouvant survenir pendant la conversion d'un shapefile
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Shapefile absent, tronqué ou de type non supporté
    #[error(transparent)]
    Decode(#[from] shpdecode::DecodeError),

    /// Reprojection demandée sur un type autre que Polygon/MultiPolygon
    #[error("Unsupported geometry type for reprojection: {kind}")]
    UnsupportedGeometry { kind: &'static str },

    /// Feature GeoJSON sans géométrie
    #[error("Feature has no geometry")]
    MissingGeometry,

    /// Aucun code administratif exploitable dans les propriétés
    #[error("Unclassifiable feature: {reason}")]
    UnclassifiableFeature { reason: String },

    /// Construction du transformateur ou transformation impossible
    #[error("Projection error: {0}")]
    Projection(String),

    /// Erreur d'écriture ou de lecture sur disque
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Sérialisation JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document GeoJSON invalide
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Téléchargement de l'archive distante
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Archive zip illisible
    #[error("Invalid archive {}: {reason}", path.display())]
    Archive { path: PathBuf, reason: String },

    /// Document de sources invalide
    #[error("Invalid sources document {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// Motif de recherche des shapefiles invalide
    #[error("Invalid discovery pattern {pattern}: {reason}")]
    Discovery { pattern: String, reason: String },

    /// Création du pool de workers impossible
    #[error("Worker pool error: {0}")]
    Worker(String),
}

impl ConvertError {
    /// Crée une erreur d'I/O avec le chemin en contexte
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Crée une erreur de classification
    pub fn unclassifiable(reason: impl Into<String>) -> Self {
        Self::UnclassifiableFeature {
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
