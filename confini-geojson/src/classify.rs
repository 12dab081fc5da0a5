//! Classification des features par niveau administratif
//!
//! Les règles sont évaluées dans l'ordre : une commune porte aussi les codes
//! de province, région et répartition, donc les niveaux les plus fins
//! passent en premier.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{ConvertError, Result};
use crate::feature::Feature;

/// Niveau administratif ISTAT
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdministrativeLevel {
    Comune,
    /// Città metropolitane, province, liberi consorzi (UTS)
    UnitaTerritorialeSovracomunale,
    Provincia,
    Regione,
    Ripartizione,
}

impl AdministrativeLevel {
    /// Nom du dossier de sortie
    pub fn folder(self) -> &'static str {
        match self {
            Self::Comune => "comune",
            Self::UnitaTerritorialeSovracomunale => "unita-territoriale-sovracomunale",
            Self::Provincia => "provincia",
            Self::Regione => "regione",
            Self::Ripartizione => "ripartizione",
        }
    }
}

impl fmt::Display for AdministrativeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

/// Règle : si `detect` est présent, le fichier est nommé d'après `code`
struct Rule {
    detect: &'static str,
    code: &'static str,
    level: AdministrativeLevel,
}

/// Ordre de priorité (la première règle qui s'applique gagne)
const RULES: &[Rule] = &[
    Rule {
        detect: "PRO_COM_T",
        code: "PRO_COM_T",
        level: AdministrativeLevel::Comune,
    },
    // COD_CM n'existe que sur les lignes città metropolitana, mais le nom de
    // fichier utilise COD_UTS, commun aux province et città metropolitane
    Rule {
        detect: "COD_CM",
        code: "COD_UTS",
        level: AdministrativeLevel::UnitaTerritorialeSovracomunale,
    },
    Rule {
        detect: "COD_PROV",
        code: "COD_PROV",
        level: AdministrativeLevel::Provincia,
    },
    Rule {
        detect: "COD_REG",
        code: "COD_REG",
        level: AdministrativeLevel::Regione,
    },
    Rule {
        detect: "COD_RIP",
        code: "COD_RIP",
        level: AdministrativeLevel::Ripartizione,
    },
];

/// Résultat de la classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub level: AdministrativeLevel,
    pub code: String,
}

impl Classification {
    /// Chemin relatif `<niveau>/<code>.geojson`
    pub fn relative_path(&self) -> PathBuf {
        Path::new(self.level.folder()).join(format!("{}.geojson", self.code))
    }
}

/// Classe une feature d'après ses propriétés
pub fn classify(feature: &Feature) -> Result<Classification> {
    let properties = &feature.properties;

    let rule = RULES
        .iter()
        .find(|rule| properties.contains_key(rule.detect))
        .ok_or_else(|| {
            ConvertError::unclassifiable(format!(
                "none of {} present in properties",
                RULES
                    .iter()
                    .map(|r| r.detect)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

    let value = properties.get(rule.code).ok_or_else(|| {
        ConvertError::unclassifiable(format!(
            "{} present but {} is missing",
            rule.detect, rule.code
        ))
    })?;

    Ok(Classification {
        level: rule.level,
        code: render_code(rule.code, value)?,
    })
}

/// Chemin de sortie d'une feature sous `root` ("" ou "." : chemin relatif nu)
pub fn feature_to_path(feature: &Feature, root: impl AsRef<Path>) -> Result<PathBuf> {
    let root = root.as_ref();
    let relative = classify(feature)?.relative_path();
    if root.as_os_str().is_empty() || root == Path::new(".") {
        Ok(relative)
    } else {
        Ok(root.join(relative))
    }
}

/// Rend un code administratif utilisable comme nom de fichier
fn render_code(key: &str, value: &JsonValue) -> Result<String> {
    let code = match value {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => {
            return Err(ConvertError::unclassifiable(format!(
                "{} has no usable code ({})",
                key, other
            )))
        }
    };

    if code.is_empty()
        || code == "."
        || code == ".."
        || code.contains(['/', '\\'])
    {
        return Err(ConvertError::unclassifiable(format!(
            "{} has an invalid code {:?}",
            key, code
        )));
    }

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, LineString, Polygon};
    use serde_json::json;

    fn feature(properties: JsonValue) -> Feature {
        Feature {
            geometry: Geometry::Polygon(Polygon::new(LineString::new(vec![]), vec![])),
            properties: properties.as_object().cloned().unwrap(),
        }
    }

    fn path(properties: JsonValue) -> PathBuf {
        feature_to_path(&feature(properties), ".").unwrap()
    }

    #[test]
    fn test_comune() {
        let p = path(json!({
            "COD_RIP": 1,
            "COD_REG": 1,
            "COD_PROV": 1,
            "COD_CM": 201,
            "COD_UTS": 201,
            "PRO_COM": 1077,
            "PRO_COM_T": "001077",
            "COMUNE": "Chiaverano",
            "COMUNE_A": "",
            "CC_UTS": 0
        }));
        assert_eq!(p, PathBuf::from("comune/001077.geojson"));
    }

    #[test]
    fn test_citta_metropolitana_uses_cod_uts() {
        let p = path(json!({
            "COD_RIP": 1,
            "COD_REG": 1,
            "COD_PROV": 1,
            "COD_CM": 201,
            "COD_UTS": 201,
            "DEN_PROV": "-",
            "DEN_CM": "Torino",
            "DEN_UTS": "Torino",
            "SIGLA": "TO",
            "TIPO_UTS": "Citta metropolitana"
        }));
        assert_eq!(p, PathBuf::from("unita-territoriale-sovracomunale/201.geojson"));
    }

    #[test]
    fn test_cod_cm_detects_but_cod_uts_names() {
        let p = path(json!({"COD_CM": 0, "COD_UTS": 96, "COD_PROV": 96}));
        assert_eq!(p, PathBuf::from("unita-territoriale-sovracomunale/96.geojson"));
    }

    #[test]
    fn test_provincia() {
        let p = path(json!({"COD_RIP": 1, "COD_REG": 1, "COD_PROV": 2, "COD_UTS": 2}));
        assert_eq!(p, PathBuf::from("provincia/2.geojson"));
    }

    #[test]
    fn test_regione() {
        let p = path(json!({"COD_RIP": 1, "COD_REG": 1, "DEN_REG": "Piemonte"}));
        assert_eq!(p, PathBuf::from("regione/1.geojson"));
    }

    #[test]
    fn test_ripartizione() {
        let p = path(json!({"COD_RIP": 1, "DEN_RIP": "Nord-Ovest"}));
        assert_eq!(p, PathBuf::from("ripartizione/1.geojson"));
    }

    #[test]
    fn test_priority_comune_over_regione() {
        let f = feature(json!({"COD_REG": 5, "PRO_COM_T": "024116"}));
        let c = classify(&f).unwrap();
        assert_eq!(c.level, AdministrativeLevel::Comune);
        assert_eq!(c.code, "024116");
    }

    #[test]
    fn test_classification_is_pure() {
        let f = feature(json!({"COD_RIP": 4, "COD_REG": 15}));
        assert_eq!(
            feature_to_path(&f, "2020").unwrap(),
            feature_to_path(&f, "2020").unwrap()
        );
    }

    #[test]
    fn test_root_prefix() {
        let f = feature(json!({"PRO_COM_T": "001077"}));
        assert_eq!(
            feature_to_path(&f, "build/2020").unwrap(),
            PathBuf::from("build/2020/comune/001077.geojson")
        );
        assert_eq!(
            feature_to_path(&f, "").unwrap(),
            PathBuf::from("comune/001077.geojson")
        );
    }

    #[test]
    fn test_unclassifiable() {
        let f = feature(json!({"DEN_REG": "Piemonte", "SHAPE_AREA": 1.0}));
        assert!(matches!(
            feature_to_path(&f, "."),
            Err(ConvertError::UnclassifiableFeature { .. })
        ));
    }

    #[test]
    fn test_missing_sibling_code() {
        let f = feature(json!({"COD_CM": 201, "COD_PROV": 1}));
        assert!(matches!(
            classify(&f),
            Err(ConvertError::UnclassifiableFeature { .. })
        ));
    }

    #[test]
    fn test_unusable_codes() {
        for value in [json!(null), json!(true), json!(""), json!("../x"), json!("a/b")] {
            let f = feature(json!({ "COD_REG": value }));
            assert!(
                matches!(classify(&f), Err(ConvertError::UnclassifiableFeature { .. })),
                "value {:?} should be rejected",
                f.properties["COD_REG"]
            );
        }
    }
}
