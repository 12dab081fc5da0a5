//! Modules d'export (GeoJSON, PROJ)

pub mod geojson;
#[cfg(feature = "reproject")]
pub mod reproject;

#[cfg(feature = "reproject")]
pub use reproject::Reprojector;
