//! Reprojection intelligente : reproject_lite en priorité, fallback sur proj
//!
//! Utilise automatiquement la meilleure option disponible.

use std::str::FromStr;

use geo::{Coord, Geometry};

use super::{CoordTransform, ReprojectorLite};
use crate::error::{ConvertError, Result};
use crate::feature::Feature;

/// Ordre des axes des coordonnées produites
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AxisOrder {
    /// x = longitude, y = latitude (GeoJSON)
    #[default]
    LonLat,
    /// Ordre officiel EPSG:4326 (latitude d'abord)
    LatLon,
}

impl FromStr for AxisOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ','], "").as_str() {
            "lonlat" | "xy" | "traditional" => Ok(AxisOrder::LonLat),
            "latlon" | "yx" | "authority" => Ok(AxisOrder::LatLon),
            _ => Err(format!("Invalid axis order: {}. Use: lonlat, latlon", s)),
        }
    }
}

#[derive(Debug)]
enum Backend {
    /// Reprojection légère (pure Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(crate::export::reproject::Reprojector),
    /// Pas de reprojection (source == cible)
    Identity,
}

/// Reprojection intelligente
///
/// Construite une seule fois par exécution puis partagée par référence entre
/// toutes les features (et tous les workers).
#[derive(Debug)]
pub struct SmartReprojector {
    backend: Backend,
    source_epsg: u32,
    target_epsg: u32,
    axis_order: AxisOrder,
}

impl SmartReprojector {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32, axis_order: AxisOrder) -> Result<Self> {
        let backend = Self::select_backend(source_epsg, target_epsg)?;
        Ok(Self {
            backend,
            source_epsg,
            target_epsg,
            axis_order,
        })
    }

    fn select_backend(source_epsg: u32, target_epsg: u32) -> Result<Backend> {
        // Pas de reprojection nécessaire
        if source_epsg == target_epsg {
            return Ok(Backend::Identity);
        }

        // Essayer reproject_lite d'abord
        if ReprojectorLite::is_supported(source_epsg, target_epsg) {
            return Ok(Backend::Lite(ReprojectorLite::new(source_epsg, target_epsg)?));
        }

        // Fallback sur proj si disponible
        #[cfg(feature = "reproject")]
        {
            let proj = crate::export::reproject::Reprojector::new(source_epsg, target_epsg)?;
            return Ok(Backend::Proj(proj));
        }

        // Aucune option disponible
        #[cfg(not(feature = "reproject"))]
        return Err(ConvertError::Projection(format!(
            "Reprojection EPSG:{} → EPSG:{} non supportée.\n\
             Projections supportées (reproject_lite) :\n\
             - Sources: 32601-32660, 32701-32760 (UTM WGS84)\n\
             - Cible: 4326 (WGS84)\n\
             Pour d'autres projections, compilez avec: cargo build --features reproject",
            source_epsg, target_epsg
        )));
    }

    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    pub fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }

    /// Transforme une géométrie (Polygon ou MultiPolygon)
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        super::transform_geometry(self, geom)
    }

    /// Remplace la géométrie de la feature par sa version reprojetée
    pub fn reproject_feature(&self, feature: &mut Feature) -> Result<()> {
        feature.geometry = self.transform_geometry(&feature.geometry)?;
        Ok(())
    }

    /// Retourne une description du reprojector utilisé
    pub fn description(&self) -> &'static str {
        match self.backend {
            Backend::Identity => "identity (pas de reprojection)",
            Backend::Lite(_) => "reproject_lite (pure Rust)",
            #[cfg(feature = "reproject")]
            Backend::Proj(_) => "proj (PROJ library)",
        }
    }

    fn orient(&self, (lon, lat): (f64, f64)) -> Result<Coord> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(ConvertError::Projection(format!(
                "non-finite coordinate ({}, {}) from EPSG:{} to EPSG:{}",
                lon, lat, self.source_epsg, self.target_epsg
            )));
        }
        Ok(match self.axis_order {
            AxisOrder::LonLat => Coord { x: lon, y: lat },
            AxisOrder::LatLon => Coord { x: lat, y: lon },
        })
    }
}

impl CoordTransform for SmartReprojector {
    fn transform_coord(&self, coord: Coord) -> Result<Coord> {
        match &self.backend {
            Backend::Identity => Ok(coord),
            Backend::Lite(lite) => self.orient(lite.transform_point(coord.x, coord.y)),
            #[cfg(feature = "reproject")]
            Backend::Proj(proj) => self.orient(proj.transform_point(coord.x, coord.y)?),
        }
    }

    fn transform_ring(&self, ring: &geo::LineString) -> Result<geo::LineString> {
        match &self.backend {
            Backend::Identity => Ok(ring.clone()),
            Backend::Lite(_) => {
                let coords: Result<Vec<Coord>> =
                    ring.coords().map(|c| self.transform_coord(*c)).collect();
                Ok(geo::LineString::new(coords?))
            }
            // Conversion batch, beaucoup plus rapide que point par point
            #[cfg(feature = "reproject")]
            Backend::Proj(proj) => {
                let converted = proj.transform_points(ring.coords().map(|c| (c.x, c.y)).collect())?;
                let coords: Result<Vec<Coord>> =
                    converted.into_iter().map(|p| self.orient(p)).collect();
                Ok(geo::LineString::new(coords?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point, Polygon};
    use serde_json::Map;

    fn feature() -> Feature {
        Feature {
            geometry: Geometry::Polygon(Polygon::new(
                LineString::from(vec![
                    (473739.533, 4921765.570),
                    (473839.533, 4921765.570),
                    (473839.533, 4921865.570),
                    (473739.533, 4921765.570),
                ]),
                vec![],
            )),
            properties: Map::new(),
        }
    }

    #[test]
    fn test_identity() {
        let r = SmartReprojector::new(4326, 4326, AxisOrder::default()).unwrap();
        assert!(matches!(r.backend, Backend::Identity));

        let mut f = feature();
        r.reproject_feature(&mut f).unwrap();
        assert_eq!(f, feature());
    }

    #[test]
    fn test_lite() {
        let r = SmartReprojector::new(32632, 4326, AxisOrder::LonLat).unwrap();
        assert!(matches!(r.backend, Backend::Lite(_)));
        assert_eq!(r.description(), "reproject_lite (pure Rust)");
    }

    #[test]
    fn test_reproject_feature_in_place_lon_lat() {
        let r = SmartReprojector::new(32632, 4326, AxisOrder::LonLat).unwrap();
        let mut f = feature();
        r.reproject_feature(&mut f).unwrap();

        match &f.geometry {
            Geometry::Polygon(p) => {
                assert_eq!(p.exterior().0.len(), 4);
                let first = p.exterior().0[0];
                assert!((first.x - 8.669959531865064).abs() < 1e-7, "x={}", first.x);
                assert!((first.y - 44.44871511679767).abs() < 1e-7, "y={}", first.y);
            }
            other => panic!("Expected Polygon geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_authority_axis_order() {
        let r = SmartReprojector::new(32632, 4326, AxisOrder::LatLon).unwrap();
        let mut f = feature();
        r.reproject_feature(&mut f).unwrap();

        match &f.geometry {
            Geometry::Polygon(p) => {
                let first = p.exterior().0[0];
                assert!((first.x - 44.44871511679767).abs() < 1e-7, "x={}", first.x);
                assert!((first.y - 8.669959531865064).abs() < 1e-7, "y={}", first.y);
            }
            other => panic!("Expected Polygon geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_geometry_even_for_identity() {
        let r = SmartReprojector::new(4326, 4326, AxisOrder::default()).unwrap();
        let point = Geometry::Point(Point::new(1.0, 2.0));
        assert!(matches!(
            r.transform_geometry(&point),
            Err(ConvertError::UnsupportedGeometry { .. })
        ));
    }

    #[cfg(not(feature = "reproject"))]
    #[test]
    fn test_unsupported_pair_without_proj() {
        assert!(SmartReprojector::new(2154, 4326, AxisOrder::default()).is_err());
    }

    #[test]
    fn test_axis_order_from_str() {
        assert_eq!("lonlat".parse::<AxisOrder>().unwrap(), AxisOrder::LonLat);
        assert_eq!("lat-lon".parse::<AxisOrder>().unwrap(), AxisOrder::LatLon);
        assert_eq!("Authority".parse::<AxisOrder>().unwrap(), AxisOrder::LatLon);
        assert!("north-up".parse::<AxisOrder>().is_err());
    }

    #[test]
    fn test_shared_across_threads() {
        fn assert_sync<T: Sync + Send>() {}
        assert_sync::<SmartReprojector>();
    }
}
