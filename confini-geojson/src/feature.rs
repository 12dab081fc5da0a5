//! Assemblage des features GeoJSON à partir des records décodés

use geo::Geometry;
use geojson::JsonObject;
use serde_json::{Number, Value as JsonValue};
use shpdecode::{AttributeRow, DecodedRecord, Value};

use crate::error::{ConvertError, Result};

/// Une feature : géométrie + propriétés dans l'ordre du schéma
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: JsonObject,
}

impl Feature {
    /// Assemble une feature sans reprojection (géométrie native du fichier)
    pub fn assemble(geometry: Geometry, attributes: AttributeRow) -> Self {
        let properties = attributes
            .into_iter()
            .map(|(name, value)| (name, to_json(value)))
            .collect();
        Self {
            geometry,
            properties,
        }
    }

    /// Conversion vers le type du crate geojson (pour la sérialisation)
    pub fn to_geojson(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.geometry))),
            id: None,
            properties: Some(self.properties.clone()),
            foreign_members: None,
        }
    }

    /// Relit une feature GeoJSON
    pub fn from_geojson(feature: geojson::Feature) -> Result<Self> {
        let geometry = feature.geometry.ok_or(ConvertError::MissingGeometry)?;
        let geometry = Geometry::try_from(geometry)?;
        Ok(Self {
            geometry,
            properties: feature.properties.unwrap_or_default(),
        })
    }
}

impl From<DecodedRecord> for Feature {
    fn from(record: DecodedRecord) -> Self {
        Self::assemble(record.geometry, record.attributes)
    }
}

fn to_json(value: Value) -> JsonValue {
    match value {
        Value::Integer(i) => JsonValue::Number(i.into()),
        Value::Float(x) => Number::from_f64(x).map_or(JsonValue::Null, JsonValue::Number),
        Value::String(s) => JsonValue::String(s),
        Value::Bool(b) => JsonValue::Bool(b),
        Value::Null => JsonValue::Null,
    }
}

/// Nom du type de géométrie (pour les messages d'erreur)
pub fn geometry_kind(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
