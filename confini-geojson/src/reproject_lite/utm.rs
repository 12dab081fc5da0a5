//! Projection UTM (Universal Transverse Mercator) sur l'ellipsoïde WGS84
//!
//! Zones 1 à 60, hémisphère nord (EPSG:326zz) et sud (EPSG:327zz).
//! Les limites ISTAT sont publiées en zone 32N (EPSG:32632).

use super::ellipsoid::WGS84;
use super::Geographic;

/// Zone UTM WGS84
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub zone: u8,
    pub south: bool,
}

impl UtmZone {
    /// Décode un code EPSG WGS84 / UTM
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        let (south, zone) = match epsg {
            32601..=32660 => (false, epsg - 32600),
            32701..=32760 => (true, epsg - 32700),
            _ => return None,
        };
        Some(Self {
            zone: zone as u8,
            south,
        })
    }

    /// Longitude du méridien central (radians)
    fn central_meridian(self) -> f64 {
        ((f64::from(self.zone) - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
    }

    /// Convertit (easting, northing) vers coordonnées géographiques WGS84
    pub fn to_geographic(self, x: f64, y: f64) -> Geographic {
        let a = WGS84::A;
        let e2 = WGS84::E2;
        let ep2 = WGS84::EP2;

        // Paramètres UTM
        let k0 = 0.9996; // Facteur d'échelle
        let x0 = 500000.0; // False easting
        let y0 = if self.south { 10000000.0 } else { 0.0 }; // False northing

        let lon0 = self.central_meridian();

        // Coordonnées réduites
        let x = x - x0;
        let y = y - y0;

        // Calcul du footprint latitude
        let m = y / k0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
        let t1 = tan_phi1.powi(2);
        let c1 = ep2 * cos_phi1.powi(2);
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
        let d = x / (n1 * k0);

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                        - 252.0 * ep2
                        - 3.0 * c1.powi(2))
                        * d.powi(6)
                        / 720.0);

        let lon = lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        Geographic::new(lon, lat)
    }
}
