//! Coordinate reprojection
//!
//! Converts between the spherical Web Mercator system used by the GIS map
//! services (meters, EPSG:3857 / ESRI:102113) and geographic WGS84
//! longitude/latitude (degrees). The transforms go through `proj4rs`, the
//! Rust port of the PROJ.4 engine, so results match what GIS services
//! produce; nothing here is hand-rolled trigonometry.
//!
//! Callers always work in meters on the projected side and degrees on the
//! geographic side. The radian convention of the underlying engine is an
//! internal detail.

use proj4rs::proj::Proj;
use thiserror::Error;

/// Spherical Web Mercator, as published by the map services (WKID 102113).
pub const WEB_MERCATOR: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 \
     +lon_0=0.0 +x_0=0.0 +y_0=0.0 +k=1.0 +units=m +no_defs";

/// Geographic WGS84 longitude/latitude.
pub const WGS84: &str = "+proj=longlat +ellps=WGS84 +no_defs";

/// Errors from coordinate reprojection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// A CRS definition string failed to parse.
    #[error("invalid projection definition: {0}")]
    Definition(String),

    /// The transform itself failed (e.g. coordinate outside the valid domain).
    #[error("coordinate transform failed: {0}")]
    Transform(String),
}

/// Reprojector between the two reference systems the subsystem uses.
///
/// Construct once and share; the parsed CRS definitions are immutable.
pub struct Projector {
    web_mercator: Proj,
    wgs84: Proj,
}

impl Projector {
    /// Parses the two CRS definitions.
    pub fn new() -> Result<Self, ProjectionError> {
        let web_mercator = Proj::from_proj_string(WEB_MERCATOR)
            .map_err(|e| ProjectionError::Definition(e.to_string()))?;
        let wgs84 = Proj::from_proj_string(WGS84)
            .map_err(|e| ProjectionError::Definition(e.to_string()))?;
        Ok(Self { web_mercator, wgs84 })
    }

    /// Converts a projected Web Mercator point (meters) to geographic
    /// `(longitude, latitude)` in degrees.
    pub fn to_wgs84(&self, (x, y): (f64, f64)) -> Result<(f64, f64), ProjectionError> {
        let mut point = (x, y, 0.0);
        proj4rs::transform::transform(&self.web_mercator, &self.wgs84, &mut point)
            .map_err(|e| ProjectionError::Transform(e.to_string()))?;
        // Geographic output is in radians.
        Ok((point.0.to_degrees(), point.1.to_degrees()))
    }

    /// Converts geographic `(longitude, latitude)` degrees to projected
    /// Web Mercator meters.
    pub fn to_web_mercator(&self, (lon, lat): (f64, f64)) -> Result<(f64, f64), ProjectionError> {
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        proj4rs::transform::transform(&self.wgs84, &self.web_mercator, &mut point)
            .map_err(|e| ProjectionError::Transform(e.to_string()))?;
        Ok((point.0, point.1))
    }
}
