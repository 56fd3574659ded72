//! Per-feature clipping against an area of interest.
//!
//! Areal geometries are replaced by their intersection with the AOI. Lines
//! and collections are filtered but never trimmed. Points are kept when they
//! touch the AOI, boundary included. Every feature yields a [`ClipOutcome`];
//! a feature that cannot be processed is skipped without affecting the rest.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use geo::{Area, BooleanOps, Intersects};
use geo_types::{Geometry, MultiPoint, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection};
use metrics::counter;
use tracing::debug;
use wfs_common::AreaOfInterest;

/// Why a feature was left out of the clipped output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoGeometry,
    /// Geometry could not be converted for geometric processing
    Unconvertible(String),
    /// Geometry does not touch the AOI
    Outside,
    /// Intersection was computed but has no area
    EmptyIntersection,
    /// The boolean operation panicked
    OperationFailed,
}

impl SkipReason {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::NoGeometry => "no_geometry",
            SkipReason::Unconvertible(_) => "unconvertible",
            SkipReason::Outside => "outside",
            SkipReason::EmptyIntersection => "empty_intersection",
            SkipReason::OperationFailed => "operation_failed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unconvertible(msg) => write!(f, "unconvertible geometry: {}", msg),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Result of clipping one feature.
#[derive(Debug, Clone)]
pub enum ClipOutcome {
    Keep(Feature),
    Skip(SkipReason),
}

/// Tally of a clipping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipReport {
    pub input: usize,
    pub kept: usize,
    /// Kept features whose geometry was replaced
    pub modified: usize,
    pub no_geometry: usize,
    pub unconvertible: usize,
    pub outside: usize,
    pub empty_intersection: usize,
    pub operation_failed: usize,
}

impl ClipReport {
    pub fn skipped(&self) -> usize {
        self.input - self.kept
    }

    fn record_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::NoGeometry => self.no_geometry += 1,
            SkipReason::Unconvertible(_) => self.unconvertible += 1,
            SkipReason::Outside => self.outside += 1,
            SkipReason::EmptyIntersection => self.empty_intersection += 1,
            SkipReason::OperationFailed => self.operation_failed += 1,
        }
    }
}

/// Clips features to an AOI. Holds the AOI in the forms the geometric
/// predicates need.
#[derive(Debug, Clone)]
pub struct Clipper {
    area: MultiPolygon<f64>,
    area_geometry: Geometry<f64>,
}

impl Clipper {
    pub fn new(aoi: &AreaOfInterest) -> Self {
        let area = aoi.multi_polygon().clone();
        Self {
            area_geometry: Geometry::MultiPolygon(area.clone()),
            area,
        }
    }

    /// Clip a collection, preserving feature order and the collection's
    /// foreign members. The collection bbox is dropped since it may no
    /// longer hold.
    pub fn clip_collection(&self, fc: FeatureCollection) -> (FeatureCollection, ClipReport) {
        let mut report = ClipReport {
            input: fc.features.len(),
            ..Default::default()
        };

        let mut features = Vec::with_capacity(fc.features.len());
        for feature in fc.features {
            let id = feature.id.clone();
            match self.apply(feature) {
                Ok((kept, modified)) => {
                    report.kept += 1;
                    if modified {
                        report.modified += 1;
                    }
                    features.push(kept);
                }
                Err(reason) => {
                    debug!(feature_id = ?id, reason = %reason, "Feature skipped during clipping");
                    counter!("wfs_clip_skips_total", "reason" => reason.label()).increment(1);
                    report.record_skip(&reason);
                }
            }
        }

        (
            FeatureCollection {
                bbox: None,
                features,
                foreign_members: fc.foreign_members,
            },
            report,
        )
    }

    /// Clip a single feature.
    pub fn clip_feature(&self, feature: Feature) -> ClipOutcome {
        match self.apply(feature) {
            Ok((kept, _)) => ClipOutcome::Keep(kept),
            Err(reason) => ClipOutcome::Skip(reason),
        }
    }

    /// The kept feature and whether its geometry was replaced.
    fn apply(&self, mut feature: Feature) -> Result<(Feature, bool), SkipReason> {
        let geojson_geometry = feature.geometry.as_ref().ok_or(SkipReason::NoGeometry)?;

        let geometry = Geometry::<f64>::try_from(geojson_geometry.value.clone())
            .map_err(|e| SkipReason::Unconvertible(e.to_string()))?;

        match self.clip_geometry(geometry)? {
            None => Ok((feature, false)),
            Some(clipped) => {
                let mut replacement = geojson::Geometry::new(geojson::Value::from(&clipped));
                replacement.foreign_members =
                    feature.geometry.take().and_then(|g| g.foreign_members);
                feature.geometry = Some(replacement);
                feature.bbox = None;
                Ok((feature, true))
            }
        }
    }

    /// `Ok(None)` keeps the geometry as is, `Ok(Some(_))` replaces it.
    fn clip_geometry(
        &self,
        geometry: Geometry<f64>,
    ) -> Result<Option<Geometry<f64>>, SkipReason> {
        match geometry {
            Geometry::Polygon(polygon) => {
                self.intersect(MultiPolygon::new(vec![polygon])).map(Some)
            }
            Geometry::MultiPolygon(polygons) => self.intersect(polygons).map(Some),
            Geometry::MultiPoint(points) => {
                let total = points.0.len();
                let inside: Vec<_> = points
                    .into_iter()
                    .filter(|p| Geometry::Point(*p).intersects(&self.area_geometry))
                    .collect();
                if inside.is_empty() {
                    Err(SkipReason::Outside)
                } else if inside.len() == total {
                    Ok(None)
                } else {
                    Ok(Some(Geometry::MultiPoint(MultiPoint::new(inside))))
                }
            }
            other => {
                if other.intersects(&self.area_geometry) {
                    Ok(None)
                } else {
                    Err(SkipReason::Outside)
                }
            }
        }
    }

    fn intersect(&self, subject: MultiPolygon<f64>) -> Result<Geometry<f64>, SkipReason> {
        if !Geometry::MultiPolygon(subject.clone()).intersects(&self.area_geometry) {
            return Err(SkipReason::Outside);
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| subject.intersection(&self.area)))
            .map_err(|_| SkipReason::OperationFailed)?;

        let mut parts: Vec<Polygon<f64>> = result
            .into_iter()
            .filter(|p| p.unsigned_area() > 0.0)
            .collect();

        match parts.len() {
            0 => Err(SkipReason::EmptyIntersection),
            1 => Ok(Geometry::Polygon(parts.remove(0))),
            _ => Ok(Geometry::MultiPolygon(MultiPolygon::new(parts))),
        }
    }
}

/// Clip a collection to `aoi`.
pub fn clip_collection(
    fc: FeatureCollection,
    aoi: &AreaOfInterest,
) -> (FeatureCollection, ClipReport) {
    Clipper::new(aoi).clip_collection(fc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{bare_feature, collection, point_feature, unit_aoi};

    #[test]
    fn test_skip_labels() {
        assert_eq!(SkipReason::NoGeometry.label(), "no_geometry");
        assert_eq!(
            SkipReason::Unconvertible("bad ring".into()).to_string(),
            "unconvertible geometry: bad ring"
        );
    }

    #[test]
    fn test_report_counts() {
        let fc = collection(vec![
            point_feature("in", 0.5, 0.5),
            point_feature("out", 5.0, 5.0),
            bare_feature("none"),
        ]);
        let (out, report) = clip_collection(fc, &unit_aoi());
        assert_eq!(out.features.len(), 1);
        assert_eq!(report.input, 3);
        assert_eq!(report.kept, 1);
        assert_eq!(report.outside, 1);
        assert_eq!(report.no_geometry, 1);
        assert_eq!(report.skipped(), 2);
    }
}
