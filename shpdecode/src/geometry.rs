//! Conversion des polygones shapefile vers les types `geo`

use geo::orient::{Direction, Orient};
use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use shapefile::{Point, PointM, PointZ, PolygonRing};

use crate::DecodeError;

/// Point shapefile projeté sur le plan (x, y)
pub(crate) trait PlanarPoint {
    fn coord(&self) -> Coord;
}

impl PlanarPoint for Point {
    fn coord(&self) -> Coord {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

impl PlanarPoint for PointM {
    fn coord(&self) -> Coord {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

impl PlanarPoint for PointZ {
    fn coord(&self) -> Coord {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

/// Regroupe les rings d'un record en polygones
///
/// Chaque ring extérieur ouvre un nouveau polygone, les rings intérieurs qui
/// le suivent deviennent ses trous. Un seul polygone donne `Polygon`,
/// plusieurs donnent `MultiPolygon`.
///
/// Les shapefiles stockent les extérieurs en sens horaire : ils sont remis
/// dans le sens RFC 7946 (extérieur anti-horaire, trous horaires).
pub(crate) fn rings_to_geometry<P: PlanarPoint>(
    rings: &[PolygonRing<P>],
    record: usize,
) -> Result<Geometry, DecodeError> {
    let mut polygons: Vec<Polygon> = Vec::new();
    let mut exterior: Option<LineString> = None;
    let mut holes: Vec<LineString> = Vec::new();

    for ring in rings {
        let line: LineString = ring.points().iter().map(PlanarPoint::coord).collect();
        match ring {
            PolygonRing::Outer(_) => {
                if let Some(ext) = exterior.take() {
                    polygons.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
                exterior = Some(line);
            }
            // Trou orphelin (avant tout ring extérieur) : promu en extérieur
            PolygonRing::Inner(_) if exterior.is_none() => exterior = Some(line),
            PolygonRing::Inner(_) => holes.push(line),
        }
    }

    if let Some(ext) = exterior {
        polygons.push(Polygon::new(ext, holes));
    }
    let mut polygons: Vec<Polygon> = polygons
        .iter()
        .map(|p| p.orient(Direction::Default))
        .collect();

    match polygons.len() {
        0 => Err(DecodeError::EmptyShape { record }),
        1 => Ok(Geometry::Polygon(polygons.remove(0))),
        _ => Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point> {
        // Extérieur en sens horaire (convention shapefile)
        vec![
            Point::new(x0, y0),
            Point::new(x0, y0 + size),
            Point::new(x0 + size, y0 + size),
            Point::new(x0 + size, y0),
            Point::new(x0, y0),
        ]
    }

    #[test]
    fn test_single_outer_ring_is_polygon() {
        let rings = vec![PolygonRing::Outer(square(0.0, 0.0, 10.0))];
        let geom = rings_to_geometry(&rings, 0).unwrap();

        match geom {
            Geometry::Polygon(p) => {
                assert_eq!(p.exterior().0.len(), 5);
                assert!(p.interiors().is_empty());
            }
            other => panic!("Expected Polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_holes_attach_to_preceding_outer() {
        let mut hole = square(2.0, 2.0, 2.0);
        hole.reverse();
        let rings = vec![
            PolygonRing::Outer(square(0.0, 0.0, 10.0)),
            PolygonRing::Inner(hole),
            PolygonRing::Outer(square(20.0, 0.0, 5.0)),
        ];

        match rings_to_geometry(&rings, 3).unwrap() {
            Geometry::MultiPolygon(mp) => {
                assert_eq!(mp.0.len(), 2);
                assert_eq!(mp.0[0].interiors().len(), 1);
                assert!(mp.0[1].interiors().is_empty());
                assert_eq!(mp.0[1].exterior().0[0], Coord { x: 20.0, y: 0.0 });
            }
            other => panic!("Expected MultiPolygon, got {:?}", other),
        }
    }

    #[test]
    fn test_orphan_inner_ring_becomes_exterior() {
        let rings = vec![PolygonRing::Inner(square(0.0, 0.0, 1.0))];
        assert!(matches!(
            rings_to_geometry(&rings, 0).unwrap(),
            Geometry::Polygon(_)
        ));
    }

    #[test]
    fn test_no_rings_is_empty_shape() {
        let rings: Vec<PolygonRing<Point>> = Vec::new();
        assert!(matches!(
            rings_to_geometry(&rings, 7),
            Err(DecodeError::EmptyShape { record: 7 })
        ));
    }

    #[test]
    fn test_polygon_z_is_flattened() {
        let rings = vec![PolygonRing::Outer(vec![
            PointZ::new(0.0, 0.0, 5.0, 0.0),
            PointZ::new(0.0, 1.0, 5.0, 0.0),
            PointZ::new(1.0, 1.0, 5.0, 0.0),
            PointZ::new(0.0, 0.0, 5.0, 0.0),
        ])];

        match rings_to_geometry(&rings, 0).unwrap() {
            Geometry::Polygon(p) => {
                assert_eq!(p.exterior().0.len(), 4);
                assert!(p.exterior().0.contains(&Coord { x: 0.0, y: 1.0 }));
            }
            other => panic!("Expected Polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_rings_follow_rfc7946_winding() {
        use geo::Winding;

        let mut hole = square(2.0, 2.0, 2.0);
        hole.reverse();
        let rings = vec![
            PolygonRing::Outer(square(0.0, 0.0, 10.0)),
            PolygonRing::Inner(hole),
        ];

        match rings_to_geometry(&rings, 0).unwrap() {
            Geometry::Polygon(p) => {
                assert!(p.exterior().is_ccw());
                assert!(p.interiors()[0].is_cw());
                // le premier sommet est conservé
                assert_eq!(p.exterior().0[0], Coord { x: 0.0, y: 0.0 });
                assert_eq!(
                    p.exterior().0[1..4],
                    [
                        Coord { x: 10.0, y: 0.0 },
                        Coord { x: 10.0, y: 10.0 },
                        Coord { x: 0.0, y: 10.0 },
                    ]
                );
            }
            other => panic!("Expected Polygon, got {:?}", other),
        }
    }
}
