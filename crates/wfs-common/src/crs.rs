//! Coordinate Reference System codes used by the feature service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CRS codes the feature service can be asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    #[serde(rename = "EPSG:4326")]
    Epsg4326,
    /// Spherical ("web") Mercator in meters, requested under its legacy code
    #[serde(rename = "EPSG:900913")]
    Epsg900913,
}

impl CrsCode {
    /// Parse a CRS string as used in SRSNAME parameters.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:4326"
    /// - "CRS:84" (equivalent to EPSG:4326)
    /// - "EPSG:3857" (same projection as EPSG:900913)
    pub fn from_srs_name(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:900913" | "EPSG:3857" => Ok(CrsCode::Epsg900913),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    /// The SRSNAME value sent to the service.
    pub fn srs_name(&self) -> &'static str {
        match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg900913 => "EPSG:900913",
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.srs_name())
    }
}

impl FromStr for CrsCode {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_srs_name(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
