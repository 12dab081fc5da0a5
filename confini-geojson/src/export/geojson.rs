//! Écriture des documents GeoJSON sur disque

use std::fs;
use std::path::Path;

use geojson::FeatureCollection;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::feature::Feature;

/// Écrit `text` dans `path`, en créant les dossiers intermédiaires
///
/// Un fichier existant est écrasé. L'écriture n'est pas atomique : relancer
/// la conversion suffit à réparer un fichier partiel.
pub fn write_file_to_path(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;
    }
    fs::write(path, text).map_err(|e| ConvertError::io(path, e))?;
    debug!(path = %path.display(), bytes = text.len(), "Fichier écrit");
    Ok(())
}

/// Sérialise une feature en JSON indenté, terminé par un saut de ligne
pub fn feature_to_string(feature: &Feature) -> Result<String> {
    let mut text = serde_json::to_string_pretty(&feature.to_geojson())?;
    text.push('\n');
    Ok(text)
}

/// Sérialise une FeatureCollection en JSON indenté
pub fn collection_to_string(features: Vec<geojson::Feature>) -> Result<String> {
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let mut text = serde_json::to_string_pretty(&collection)?;
    text.push('\n');
    Ok(text)
}

/// Écrit une feature dans son propre fichier
pub fn write_feature(path: &Path, feature: &Feature) -> Result<()> {
    write_file_to_path(path, &feature_to_string(feature)?)
}

/// Écrit une collection de features dans un seul fichier
pub fn write_collection(path: &Path, features: Vec<geojson::Feature>) -> Result<()> {
    write_file_to_path(path, &collection_to_string(features)?)
}

/// Relit un document Feature écrit par [`write_feature`]
pub fn read_feature(path: &Path) -> Result<Feature> {
    let text = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    let feature: geojson::Feature = text.parse()?;
    Feature::from_geojson(feature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, LineString, MultiPolygon, Polygon};
    use serde_json::{json, Value};

    fn feature() -> Feature {
        let ring = LineString::from(vec![
            (8.669959531865064, 44.44871511679767),
            (8.671, 44.4487),
            (8.671, 44.4497),
            (8.669959531865064, 44.44871511679767),
        ]);
        Feature {
            geometry: Geometry::MultiPolygon(MultiPolygon::new(vec![
                Polygon::new(ring.clone(), vec![]),
                Polygon::new(ring, vec![]),
            ])),
            properties: json!({
                "COD_RIP": 1,
                "COD_REG": 7,
                "PRO_COM_T": "010025",
                "COMUNE": "Genova",
                "COMUNE_A": null
            })
            .as_object()
            .cloned()
            .unwrap(),
        }
    }

    #[test]
    fn test_feature_to_string() {
        let text = feature_to_string(&feature()).unwrap();

        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n  \"type\": \"Feature\""));

        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["geometry"]["type"], "MultiPolygon");
        assert_eq!(json["properties"]["PRO_COM_T"], "010025");
        assert_eq!(json["geometry"]["coordinates"][0][0][0][0], 8.669959531865064);
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/comune/010025.geojson");

        write_feature(&path, &feature()).unwrap();
        assert_eq!(read_feature(&path).unwrap(), feature());
    }

    #[test]
    fn test_overwrite_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regione/7.geojson");

        write_file_to_path(&path, "ancien contenu bien plus long que le nouveau").unwrap();
        write_file_to_path(&path, "{}\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn test_write_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Com01012020.geojson");

        let features = vec![feature().to_geojson(), feature().to_geojson()];
        write_collection(&path, features).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));
        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"].as_array().unwrap().len(), 2);
        assert_eq!(json["features"][1]["properties"]["COMUNE"], "Genova");
    }

    #[test]
    fn test_write_into_file_parent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("comune");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = write_file_to_path(&blocker.join("001077.geojson"), "{}").unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
    }
}
