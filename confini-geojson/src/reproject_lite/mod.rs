//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Supporte les projections des limites administratives :
//! - UTM WGS84, toutes zones (EPSG:32601-32660, EPSG:32701-32760)
//!
//! Cible supportée :
//! - WGS84 (EPSG:4326)

mod ellipsoid;
mod smart;
mod utm;

pub use smart::{AxisOrder, SmartReprojector};
pub use utm::UtmZone;

use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};

use crate::error::{ConvertError, Result};
use crate::feature::geometry_kind;

/// EPSG de la cible géographique
pub const WGS84_EPSG: u32 = 4326;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés (lon, lat)
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }
}

/// Transformation d'une coordonnée, appliquée sommet par sommet
pub trait CoordTransform {
    fn transform_coord(&self, coord: Coord) -> Result<Coord>;

    /// Transforme un ring complet
    fn transform_ring(&self, ring: &LineString) -> Result<LineString> {
        let coords: Result<Vec<Coord>> = ring.coords().map(|c| self.transform_coord(*c)).collect();
        Ok(LineString::new(coords?))
    }
}

/// Transforme une géométrie en conservant exactement l'imbrication
///
/// Seuls Polygon et MultiPolygon sont acceptés.
pub fn transform_geometry<T>(transform: &T, geom: &Geometry) -> Result<Geometry>
where
    T: CoordTransform + ?Sized,
{
    match geom {
        Geometry::Polygon(p) => Ok(Geometry::Polygon(transform_polygon(transform, p)?)),
        Geometry::MultiPolygon(mp) => {
            let polys: Result<Vec<Polygon>> =
                mp.iter().map(|p| transform_polygon(transform, p)).collect();
            Ok(Geometry::MultiPolygon(MultiPolygon::new(polys?)))
        }
        other => Err(ConvertError::UnsupportedGeometry {
            kind: geometry_kind(other),
        }),
    }
}

fn transform_polygon<T>(transform: &T, p: &Polygon) -> Result<Polygon>
where
    T: CoordTransform + ?Sized,
{
    let exterior = transform.transform_ring(p.exterior())?;
    let interiors: Result<Vec<LineString>> = p
        .interiors()
        .iter()
        .map(|ring| transform.transform_ring(ring))
        .collect();
    Ok(Polygon::new(exterior, interiors?))
}

/// Reprojection légère UTM → WGS84
///
/// Produit toujours l'ordre (lon, lat).
#[derive(Debug, Clone, Copy)]
pub struct ReprojectorLite {
    zone: UtmZone,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let zone = UtmZone::from_epsg(source_epsg).ok_or_else(|| {
            ConvertError::Projection(format!(
                "EPSG:{} non supporté. Sources supportées: 32601-32660, 32701-32760",
                source_epsg
            ))
        })?;
        if target_epsg != WGS84_EPSG {
            return Err(ConvertError::Projection(format!(
                "EPSG:{} non supporté. Cible supportée: 4326",
                target_epsg
            )));
        }
        Ok(Self { zone })
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: u32, target: u32) -> bool {
        UtmZone::from_epsg(source).is_some() && target == WGS84_EPSG
    }

    /// Transforme un point (x, y) UTM en (lon, lat) en degrés
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        self.zone.to_geographic(x, y).to_degrees()
    }
}

impl CoordTransform for ReprojectorLite {
    fn transform_coord(&self, coord: Coord) -> Result<Coord> {
        let (x, y) = self.transform_point(coord.x, coord.y);
        Ok(Coord { x, y })
    }
}
