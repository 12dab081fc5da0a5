//! # shpdecode
//!
//! Décodeur pour les shapefiles polygonaux (limites administratives ISTAT).
//!
//! ## Features
//!
//! - Lecture paresseuse record par record (mémoire bornée)
//! - Schéma dBase lu une seule fois, ordre des champs conservé
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shpdecode::decode;
//! use std::path::Path;
//!
//! let mut decoder = decode(Path::new("Com01012020_WGS84.shp"))?;
//! println!("Champs: {:?}", decoder.field_names());
//!
//! for record in decoder.records() {
//!     let record = record?;
//!     println!("{}: {:?}", record.index, record.attributes.get("PRO_COM_T"));
//! }
//! ```

pub mod error;
mod geometry;
pub mod reader;
pub mod types;

pub use error::DecodeError;
pub use reader::ShapeDecoder;
pub use types::{AttributeRow, DecodedRecord, Value};

use std::path::Path;

/// Ouvre un shapefile en lecture et retourne son décodeur
///
/// # Errors
///
/// Retourne `DecodeError` si le .shp ou le .dbf est absent, illisible, ou si
/// l'en-tête déclare un type autre que Polygon/PolygonM/PolygonZ.
pub fn decode(path: &Path) -> Result<ShapeDecoder, DecodeError> {
    ShapeDecoder::open(path)
}

/// Extrait le millésime (8 chiffres, JJMMAAAA) depuis un nom de fichier ISTAT
/// Format attendu: Com01012020_WGS84.shp, ProvCM01012020_g_WGS84.shp, ...
pub fn extract_label(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let bytes = stem.as_bytes();

    // Première séquence d'exactement 8 chiffres
    let mut start = None;
    for (i, b) in bytes.iter().enumerate() {
        match (b.is_ascii_digit(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s == 8 {
                    return Some(stem[s..i].to_string());
                }
                start = None;
            }
            _ => {}
        }
    }

    match start {
        Some(s) if bytes.len() - s == 8 => Some(stem[s..].to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_label() {
        assert_eq!(
            extract_label(Path::new("Com01012020_WGS84.shp")),
            Some("01012020".to_string())
        );
        assert_eq!(
            extract_label(Path::new("Limiti01012020/ProvCM01012020/ProvCM01012020_g_WGS84.shp")),
            Some("01012020".to_string())
        );
        assert_eq!(
            extract_label(Path::new("Reg01012021.shp")),
            Some("01012021".to_string())
        );
        assert_eq!(extract_label(Path::new("Reg2020_WGS84.shp")), None);
        assert_eq!(extract_label(Path::new("fichier-invalide.txt")), None);
    }
}
