//! Types de données pour le crate shpdecode

use std::fmt;

use geo::Geometry;

/// Valeur d'un attribut dBase, normalisée
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Numérique sans partie décimale
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
    /// Champ non texte vide ou attribut absent
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => f.write_str("null"),
        }
    }
}

/// Ligne d'attributs dans l'ordre du schéma dBase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeRow {
    values: Vec<(String, Value)>,
}

impl AttributeRow {
    pub fn new(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }

    /// Récupère une valeur par nom de champ
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Itère sur les paires (champ, valeur) dans l'ordre du schéma
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl IntoIterator for AttributeRow {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Un record décodé : géométrie native du fichier + attributs
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    /// Position du record dans le fichier (0-based)
    pub index: usize,

    /// Polygon ou MultiPolygon, dans le SRS du fichier source
    pub geometry: Geometry,

    pub attributes: AttributeRow,
}
