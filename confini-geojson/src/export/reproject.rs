//! Reprojection de coordonnées avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.

use std::fmt;
use std::sync::Mutex;

use proj::Proj;

use crate::error::{ConvertError, Result};

/// Transformation PROJ entre deux systèmes de coordonnées
///
/// Le contexte PROJ n'est pas partageable entre threads : il est protégé par
/// un mutex pour que le reprojector reste `Sync`.
pub struct Reprojector {
    proj: Mutex<Proj>,
    source_epsg: u32,
    target_epsg: u32,
}

impl fmt::Debug for Reprojector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reprojector")
            .field("source_epsg", &self.source_epsg)
            .field("target_epsg", &self.target_epsg)
            .finish()
    }
}

impl Reprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    ///
    /// PROJ normalise l'ordre des axes : la sortie est toujours (lon, lat)
    /// pour une cible géographique.
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        let proj = Proj::new_known_crs(&source, &target, None).map_err(|e| {
            ConvertError::Projection(format!(
                "Failed to create projection from {} to {}: {}",
                source, target, e
            ))
        })?;

        Ok(Self {
            proj: Mutex::new(proj),
            source_epsg,
            target_epsg,
        })
    }

    /// Transforme une coordonnée unique
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let proj = self.lock()?;
        proj.convert((x, y)).map_err(|e| {
            ConvertError::Projection(format!("Coordinate transformation failed: {}", e))
        })
    }

    /// Transforme une série de coordonnées en une seule passe
    pub fn transform_points(&self, mut coords: Vec<(f64, f64)>) -> Result<Vec<(f64, f64)>> {
        let proj = self.lock()?;
        proj.convert_array(&mut coords).map_err(|e| {
            ConvertError::Projection(format!("Batch coordinate transformation failed: {}", e))
        })?;
        Ok(coords)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Proj>> {
        self.proj.lock().map_err(|_| {
            ConvertError::Projection(format!(
                "PROJ context poisoned (EPSG:{} → EPSG:{})",
                self.source_epsg, self.target_epsg
            ))
        })
    }
}
