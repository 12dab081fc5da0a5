//! Configuration du système

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};
use crate::reproject_lite::AxisOrder;

/// WGS84 / UTM zone 32N, SRS des limites ISTAT
pub const DEFAULT_SOURCE_EPSG: u32 = 32632;

/// WGS84 géographique
pub const DEFAULT_TARGET_EPSG: u32 = 4326;

/// Paramètres d'exécution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source_epsg: u32,
    pub target_epsg: u32,
    pub axis_order: AxisOrder,
    /// Nombre de shapefiles traités en parallèle
    pub jobs: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_epsg: DEFAULT_SOURCE_EPSG,
            target_epsg: DEFAULT_TARGET_EPSG,
            axis_order: AxisOrder::LonLat,
            jobs: 1,
        }
    }
}

impl Settings {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            source_epsg: lookup("CONFINI_SOURCE_EPSG")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.source_epsg),
            target_epsg: lookup("CONFINI_TARGET_EPSG")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.target_epsg),
            axis_order: lookup("CONFINI_AXIS_ORDER")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.axis_order),
            jobs: lookup("CONFINI_JOBS")
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.jobs),
        }
    }
}

/// Liste déclarative des sources à convertir
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceList {
    #[serde(rename = "sorgenti", alias = "sources")]
    pub sources: Vec<Source>,
}

/// Une archive distante et sa destination
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    /// URL de l'archive zip
    pub url: String,

    /// Millésime utilisé pour filtrer les shapefiles (ex: "01012020")
    pub label: String,

    /// Sous-dossier de destination
    pub directory: String,
}

impl Source {
    /// Nom de fichier de l'archive (dernier segment de l'URL)
    pub fn archive_name(&self) -> &str {
        let path = self.url.split(['?', '#']).next().unwrap_or(&self.url);
        path.rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("archive.zip")
    }
}

impl SourceList {
    /// Charge la liste depuis un fichier YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        Self::parse(&content).map_err(|reason| ConvertError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        let list: Self = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        for source in &list.sources {
            if source.label.trim().is_empty() {
                return Err(format!("empty label for {}", source.url));
            }
            if !is_relative_subdir(&source.directory) {
                return Err(format!("invalid directory {:?}", source.directory));
            }
        }
        Ok(list)
    }
}

/// Vrai si `directory` reste sous la racine de sortie une fois joint
fn is_relative_subdir(directory: &str) -> bool {
    let path = Path::new(directory);
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SOURCES: &str = r#"
sorgenti:
  - url: https://www.istat.it/storage/cartografia/confini_amministrativi/non_generalizzati/Limiti01012020.zip
    label: "01012020"
    directory: "2020"
  - url: https://example.org/data/Limiti01012021_g.zip?download=1
    label: "01012021"
    directory: "2021-generalizzati"
"#;

    #[test]
    fn test_parse_sources() {
        let list = SourceList::parse(SOURCES).unwrap();
        assert_eq!(list.sources.len(), 2);
        assert_eq!(list.sources[0].label, "01012020");
        assert_eq!(list.sources[0].directory, "2020");
        assert_eq!(list.sources[0].archive_name(), "Limiti01012020.zip");
        assert_eq!(list.sources[1].archive_name(), "Limiti01012021_g.zip");
    }

    #[test]
    fn test_english_alias() {
        let list =
            SourceList::parse("sources:\n  - {url: a/b.zip, label: '2019', directory: x}\n")
                .unwrap();
        assert_eq!(list.sources[0].archive_name(), "b.zip");
    }

    #[test]
    fn test_invalid_sources() {
        assert!(SourceList::parse("sorgenti: 3").is_err());
        assert!(SourceList::parse(
            "sorgenti:\n  - {url: a.zip, label: ' ', directory: x}\n"
        )
        .is_err());
        assert!(SourceList::parse(
            "sorgenti:\n  - {url: a.zip, label: '2020', directory: ../x}\n"
        )
        .is_err());
    }

    #[test]
    fn test_directory_must_stay_relative() {
        for directory in ["/etc/x", "/", "''", ".", "./2020", "2020/../.."] {
            let yaml = format!(
                "sorgenti:\n  - {{url: a.zip, label: '2020', directory: {}}}\n",
                directory
            );
            assert!(SourceList::parse(&yaml).is_err(), "{} accepted", directory);
        }

        let list = SourceList::parse(
            "sorgenti:\n  - {url: a.zip, label: '2020', directory: 2020/comuni}\n",
        )
        .unwrap();
        assert_eq!(list.sources[0].directory, "2020/comuni");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            SourceList::load(Path::new("does/not/exist.yaml")),
            Err(ConvertError::Io { .. })
        ));
    }

    #[test]
    fn test_settings_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("CONFINI_SOURCE_EPSG", "32633"),
            ("CONFINI_AXIS_ORDER", "latlon"),
            ("CONFINI_JOBS", "0"),
        ]
        .into_iter()
        .collect();

        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.source_epsg, 32633);
        assert_eq!(settings.target_epsg, DEFAULT_TARGET_EPSG);
        assert_eq!(settings.axis_order, AxisOrder::LatLon);
        assert_eq!(settings.jobs, 1);
    }

    #[test]
    fn test_settings_defaults() {
        assert_eq!(Settings::from_lookup(|_| None), Settings::default());
    }
}
