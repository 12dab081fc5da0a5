//! Types d'erreurs pour le crate shpdecode

use std::path::PathBuf;

use thiserror::Error;

/// Erreurs pouvant survenir lors du décodage d'un shapefile
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Erreur d'I/O lors de la lecture des fichiers
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fichier .shp ou sidecar .dbf absent
    #[error("Missing required file: {}", .0.display())]
    MissingFile(PathBuf),

    /// Fichier tronqué ou corrompu (remonté par le crate shapefile)
    #[error("Malformed shapefile {}: {source}", path.display())]
    Shapefile {
        path: PathBuf,
        #[source]
        source: shapefile::Error,
    },

    /// Type de shape déclaré dans l'en-tête non supporté
    #[error("Unsupported shape type {shape_type} declared by {}", path.display())]
    UnsupportedShapeType { path: PathBuf, shape_type: String },

    /// Record contenant une shape autre qu'un polygone
    #[error("Record {record} holds an unsupported {shape_type} shape")]
    UnsupportedShape { record: usize, shape_type: String },

    /// Record sans géométrie (null shape ou polygone sans ring)
    #[error("Record {record} has no geometry")]
    EmptyShape { record: usize },
}

impl DecodeError {
    /// Crée une erreur shapefile avec le chemin en contexte
    pub fn shapefile(path: impl Into<PathBuf>, source: shapefile::Error) -> Self {
        Self::Shapefile {
            path: path.into(),
            source,
        }
    }
}
