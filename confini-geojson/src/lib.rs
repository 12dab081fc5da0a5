//! # confini-geojson
//!
//! Conversion des limites administratives ISTAT (shapefiles UTM 32N) en un
//! document GeoJSON par feature.
//!
//! ## Pipeline
//!
//! décodage → assemblage → reprojection (optionnelle) → classification → écriture
//!
//! Chaque feature est écrite sous `<racine>/<niveau>/<code>.geojson`, où le
//! niveau (comune, provincia, regione...) est déduit des codes présents dans
//! ses propriétés.
//!
//! ## Usage CLI
//!
//! ```bash
//! # Un seul shapefile
//! confini-geojson convert --shape Com01012020_WGS84.shp --output ./build
//!
//! # Tous les shapefiles d'un millésime déjà extraits
//! confini-geojson scan --base ./Limiti01012020 --label 01012020 --output ./build
//!
//! # Sources distantes décrites en YAML
//! confini-geojson sources --config sources.yaml --output ./build
//! ```

pub mod batch;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod feature;
pub mod pipeline;
pub mod report;
pub mod reproject_lite;

pub use classify::{classify, feature_to_path, AdministrativeLevel, Classification};
pub use config::{Settings, Source, SourceList};
pub use error::{ConvertError, Result};
pub use feature::Feature;
pub use pipeline::{Converter, FileSummary};
pub use report::{RunReport, RunStatus};
pub use reproject_lite::{AxisOrder, SmartReprojector};
