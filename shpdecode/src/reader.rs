//! Lecture paresseuse d'un shapefile et de son sidecar dBase

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use shapefile::dbase::{self, FieldValue, Record};
use shapefile::{Shape, ShapeReader, ShapeType};
use tracing::debug;

use crate::geometry::rings_to_geometry;
use crate::types::{AttributeRow, DecodedRecord, Value};
use crate::DecodeError;

type FileReader = shapefile::Reader<BufReader<File>, BufReader<File>>;

/// Nom du champ interne de suppression exposé par certains lecteurs dBase
const DELETION_FLAG: &str = "DeletionFlag";

/// Décodeur ouvert sur un shapefile
///
/// Le schéma des champs est lu une seule fois à l'ouverture. Les records sont
/// produits un par un par [`ShapeDecoder::records`]; pour relire le fichier il
/// faut rouvrir un décodeur.
pub struct ShapeDecoder {
    path: PathBuf,
    shape_type: ShapeType,
    field_names: Vec<String>,
    reader: FileReader,
}

impl ShapeDecoder {
    /// Ouvre `path` (.shp) et le .dbf de même nom
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        if !path.is_file() {
            return Err(DecodeError::MissingFile(path.to_path_buf()));
        }
        let dbf_path = sidecar_path(path)?;

        let shape_reader =
            ShapeReader::from_path(path).map_err(|e| DecodeError::shapefile(path, e))?;
        let shape_type = shape_reader.header().shape_type;
        if !is_polygon_type(shape_type) {
            return Err(DecodeError::UnsupportedShapeType {
                path: path.to_path_buf(),
                shape_type: format!("{:?}", shape_type),
            });
        }

        let dbase_reader = dbase::Reader::from_path(&dbf_path)
            .map_err(|e| DecodeError::shapefile(&dbf_path, e.into()))?;
        let field_names: Vec<String> = dbase_reader
            .fields()
            .iter()
            .map(|field| field.name().to_string())
            .filter(|name| name != DELETION_FLAG)
            .collect();

        debug!(
            path = %path.display(),
            shape_type = ?shape_type,
            fields = field_names.len(),
            "Shapefile ouvert"
        );

        Ok(Self {
            path: path.to_path_buf(),
            shape_type,
            field_names,
            reader: shapefile::Reader::new(shape_reader, dbase_reader),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Type de shape déclaré dans l'en-tête
    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    /// Noms des champs dans l'ordre du schéma (sans le drapeau de suppression)
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Itère sur les records dans l'ordre du fichier, un à la fois
    pub fn records(&mut self) -> impl Iterator<Item = Result<DecodedRecord, DecodeError>> + '_ {
        let path = &self.path;
        let field_names = &self.field_names;

        self.reader
            .iter_shapes_and_records()
            .enumerate()
            .map(move |(index, item)| {
                let (shape, record) = item.map_err(|e| DecodeError::shapefile(path, e))?;
                Ok(DecodedRecord {
                    index,
                    geometry: shape_to_geometry(shape, index)?,
                    attributes: record_to_row(&record, field_names),
                })
            })
    }
}

/// Localise le sidecar .dbf (extension en minuscules ou majuscules)
fn sidecar_path(path: &Path) -> Result<PathBuf, DecodeError> {
    let lower = path.with_extension("dbf");
    if lower.is_file() {
        return Ok(lower);
    }
    let upper = path.with_extension("DBF");
    if upper.is_file() {
        return Ok(upper);
    }
    Err(DecodeError::MissingFile(lower))
}

fn is_polygon_type(shape_type: ShapeType) -> bool {
    matches!(
        shape_type,
        ShapeType::Polygon | ShapeType::PolygonM | ShapeType::PolygonZ
    )
}

fn shape_to_geometry(shape: Shape, record: usize) -> Result<geo::Geometry, DecodeError> {
    match shape {
        Shape::Polygon(p) => rings_to_geometry(p.rings(), record),
        Shape::PolygonM(p) => rings_to_geometry(p.rings(), record),
        Shape::PolygonZ(p) => rings_to_geometry(p.rings(), record),
        Shape::NullShape => Err(DecodeError::EmptyShape { record }),
        other => Err(DecodeError::UnsupportedShape {
            record,
            shape_type: format!("{:?}", other.shapetype()),
        }),
    }
}

/// Construit la ligne d'attributs dans l'ordre du schéma
fn record_to_row(record: &Record, field_names: &[String]) -> AttributeRow {
    AttributeRow::new(
        field_names
            .iter()
            .map(|name| {
                let value = record.get(name).map(convert_value).unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect(),
    )
}

/// Normalise une valeur dBase
pub(crate) fn convert_value(value: &FieldValue) -> Value {
    match value {
        // dBase lit un champ texte blanc comme None : il reste une chaîne vide (COMUNE_A...)
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => Value::String(s.trim().to_string()),
        FieldValue::Character(None) => Value::String(String::new()),
        FieldValue::Numeric(Some(n)) => numeric(*n),
        FieldValue::Numeric(None) => Value::Null,
        FieldValue::Float(Some(x)) => Value::Float(f64::from(*x)),
        FieldValue::Float(None) => Value::Null,
        FieldValue::Integer(i) => Value::Integer(i64::from(*i)),
        FieldValue::Double(x) | FieldValue::Currency(x) => Value::Float(*x),
        FieldValue::Logical(Some(b)) => Value::Bool(*b),
        FieldValue::Logical(None) => Value::Null,
        FieldValue::Date(Some(d)) => {
            Value::String(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
        }
        FieldValue::Date(None) => Value::Null,
        #[allow(unreachable_patterns)]
        other => Value::String(format!("{:?}", other)),
    }
}

/// Les codes ISTAT sont stockés en numérique sans décimales
fn numeric(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::Integer(n as i64)
    } else {
        Value::Float(n)
    }
}
