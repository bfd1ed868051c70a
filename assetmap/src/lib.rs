//! AssetMap - Maintenance-asset location resolution
//!
//! This library resolves opaque asset-management location codes into
//! human-readable names and geographic coordinates by querying GIS map
//! services, falling back to the asset system's location hierarchy when a
//! code has no direct geographic feature.
//!
//! # Architecture
//!
//! - [`geometry`] - pure polygon math (signed area, centroid)
//! - [`projection`] - Web Mercator ↔ WGS84 reprojection
//! - [`http`] - async HTTP client abstraction shared by all network clients
//! - [`gis`] - map-service layer catalog matching and feature queries
//! - [`assets`] - asset-management API client (asset queries, location hierarchy)
//! - [`resolver`] - the resolution algorithm, cache, and batch pipeline
//! - [`config`] - settings with defaults and INI file loading

pub mod assets;
pub mod config;
pub mod geometry;
pub mod gis;
pub mod http;
pub mod projection;
pub mod resolver;
