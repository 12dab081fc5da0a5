//! Conversion d'un shapefile : décodage → reprojection → classification → écriture
//!
//! Chaque record est entièrement écrit avant la lecture du suivant.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::classify::{classify, AdministrativeLevel, Classification};
use crate::error::Result;
use crate::export::geojson::{write_collection, write_feature};
use crate::feature::Feature;
use crate::reproject_lite::SmartReprojector;

/// Résumé de la conversion d'un fichier
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileSummary {
    pub path: PathBuf,
    pub features: usize,
    pub by_level: BTreeMap<AdministrativeLevel, usize>,
    /// Collection agrégée écrite pour ce fichier
    pub collection: Option<PathBuf>,
}

/// Destination de la FeatureCollection agrégée
#[derive(Debug, Clone, PartialEq, Eq)]
enum CollectionTarget {
    /// `<dossier>/<nom du shapefile>.geojson`
    Directory(PathBuf),
    /// Fichier unique (conversion d'un seul shapefile)
    File(PathBuf),
}

impl CollectionTarget {
    fn path_for(&self, shapefile: &Path) -> PathBuf {
        match self {
            Self::Directory(dir) => dir.join(collection_file_name(shapefile)),
            Self::File(path) => path.clone(),
        }
    }
}

/// Convertisseur partagé par tous les fichiers d'une exécution
#[derive(Debug, Clone)]
pub struct Converter<'a> {
    reprojector: Option<&'a SmartReprojector>,
    output_root: PathBuf,
    collection: Option<CollectionTarget>,
}

impl<'a> Converter<'a> {
    /// Convertisseur sans reprojection, écrivant sous `output_root`
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            reprojector: None,
            output_root: output_root.into(),
            collection: None,
        }
    }

    /// Active l'étape de reprojection
    pub fn with_reprojector(mut self, reprojector: &'a SmartReprojector) -> Self {
        self.reprojector = Some(reprojector);
        self
    }

    /// Écrit aussi une FeatureCollection par fichier source dans `dir`
    pub fn with_collection_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.collection = Some(CollectionTarget::Directory(dir.into()));
        self
    }

    /// Écrit la FeatureCollection dans un fichier donné
    ///
    /// Réservé à la conversion d'un seul shapefile : chaque fichier converti
    /// écraserait la collection du précédent.
    pub fn with_collection_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.collection = Some(CollectionTarget::File(path.into()));
        self
    }

    /// Même configuration, sous un autre dossier de sortie
    pub fn rooted_at(&self, output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..self.clone()
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Description de l'étape de reprojection pour le rapport
    pub fn reprojection(&self) -> String {
        match self.reprojector {
            Some(r) => format!(
                "{} EPSG:{} → EPSG:{} ({:?})",
                r.description(),
                r.source_epsg(),
                r.target_epsg(),
                r.axis_order()
            ),
            None => "none".to_string(),
        }
    }

    /// Convertit tous les records d'un shapefile
    ///
    /// La première erreur interrompt le fichier.
    pub fn convert_shapefile(&self, path: &Path) -> Result<FileSummary> {
        let mut decoder = shpdecode::decode(path)?;
        let mut summary = FileSummary {
            path: path.to_path_buf(),
            ..Default::default()
        };
        let mut collected: Vec<geojson::Feature> = Vec::new();

        info!(
            path = %path.display(),
            label = ?shpdecode::extract_label(path),
            fields = decoder.field_names().len(),
            "Conversion du shapefile"
        );

        for record in decoder.records() {
            let feature = Feature::from(record?);
            let (classification, written) = self.convert_feature(feature, &mut collected)?;

            debug!(
                level = %classification.level,
                code = %classification.code,
                path = %written.display(),
                "Feature écrite"
            );
            summary.features += 1;
            *summary.by_level.entry(classification.level).or_default() += 1;
        }

        if let Some(collection) = &self.collection {
            let target = collection.path_for(path);
            write_collection(&target, collected)?;
            summary.collection = Some(target);
        }

        info!(
            path = %path.display(),
            features = summary.features,
            "Shapefile converti"
        );
        Ok(summary)
    }

    /// Reprojette, classe et écrit une feature
    fn convert_feature(
        &self,
        mut feature: Feature,
        collected: &mut Vec<geojson::Feature>,
    ) -> Result<(Classification, PathBuf)> {
        if let Some(reprojector) = self.reprojector {
            reprojector.reproject_feature(&mut feature)?;
        }

        let classification = classify(&feature)?;
        let target = self.output_root.join(classification.relative_path());
        write_feature(&target, &feature)?;

        if self.collection.is_some() {
            collected.push(feature.to_geojson());
        }
        Ok((classification, target))
    }
}

/// `<dossier>/Com01012020_WGS84.shp` → `Com01012020_WGS84.geojson`
fn collection_file_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("collection");
    format!("{}.geojson", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_file_name() {
        assert_eq!(
            collection_file_name(Path::new("tmp/Com01012020/Com01012020_WGS84.shp")),
            "Com01012020_WGS84.geojson"
        );
        assert_eq!(collection_file_name(Path::new("")), "collection.geojson");
    }

    #[test]
    fn test_collection_targets() {
        let shape = Path::new("Limiti01012020/Reg01012020/Reg01012020_WGS84.shp");
        assert_eq!(
            CollectionTarget::Directory(PathBuf::from("out")).path_for(shape),
            PathBuf::from("out/Reg01012020_WGS84.geojson")
        );
        assert_eq!(
            CollectionTarget::File(PathBuf::from("regioni.geojson")).path_for(shape),
            PathBuf::from("regioni.geojson")
        );
    }

    #[test]
    fn test_rooted_at_keeps_configuration() {
        let base = Converter::new("build").with_collection_dir("collections");
        let rooted = base.rooted_at("build/2020");

        assert_eq!(rooted.output_root(), Path::new("build/2020"));
        assert_eq!(
            rooted.collection,
            Some(CollectionTarget::Directory(PathBuf::from("collections")))
        );
    }

    #[test]
    fn test_missing_shapefile_aborts() {
        let converter = Converter::new("build");
        assert!(matches!(
            converter.convert_shapefile(Path::new("does/not/exist.shp")),
            Err(crate::error::ConvertError::Decode(_))
        ));
    }
}
