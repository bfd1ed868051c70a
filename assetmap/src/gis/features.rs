//! Feature queries against a matched layer
//!
//! Issues an attribute-equality query for a location code against one
//! [`LayerDescriptor`], requesting projected Web Mercator output, and
//! reduces the first matching feature to a named geographic point.
//!
//! Geometry extraction policy, in priority order:
//! 1. a point geometry is used directly;
//! 2. a polygon's first ring is reduced to its area-weighted centroid;
//! 3. anything else has no usable geometry and counts as no match.

use serde::Deserialize;
use tracing::debug;

use crate::geometry;
use crate::gis::types::{GisError, LayerDescriptor};
use crate::http::AsyncHttpClient;
use crate::projection::Projector;
use crate::resolver::ResolvedLocation;

/// Spatial reference requested from the feature query (spherical Web
/// Mercator, the legacy ESRI WKID).
pub const WEB_MERCATOR_WKID: &str = "102113";

#[derive(Debug, Deserialize)]
struct FeatureSet {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

/// Feature geometry as the services emit it. Point features carry `x`/`y`
/// (some services emit a GeoJSON-style `coordinates` pair instead);
/// polygons carry `rings`. Ring vertices may carry extra ordinates, only
/// the first two are used.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Geometry {
    x: Option<f64>,
    y: Option<f64>,
    coordinates: Option<Vec<f64>>,
    rings: Option<Vec<Vec<Vec<f64>>>>,
}

/// Queries `layer` for the feature matching `code` and reduces it to a
/// resolved location in geographic degrees.
///
/// Only the first matching feature is considered. `Ok(None)` means no
/// match or no usable geometry; errors are recoverable by trying the next
/// candidate layer.
pub async fn query_location<C: AsyncHttpClient>(
    client: &C,
    projector: &Projector,
    layer: &LayerDescriptor,
    code: &str,
    name_field: &str,
) -> Result<Option<ResolvedLocation>, GisError> {
    let where_clause = format!("{}='{}'", layer.match_field, escape_code(code));
    let query_base = format!("{}/{}/query", layer.service_base_url, layer.layer_id);
    let url = reqwest::Url::parse_with_params(
        &query_base,
        &[
            ("where", where_clause.as_str()),
            ("f", "json"),
            ("outSR", WEB_MERCATOR_WKID),
        ],
    )
    .map_err(|e| GisError::InvalidUrl(e.to_string()))?;

    let body = client
        .get(url.as_str())
        .await
        .map_err(|e| GisError::Http(e.to_string()))?;
    let set: FeatureSet =
        serde_json::from_slice(&body).map_err(|e| GisError::InvalidResponse(e.to_string()))?;

    let Some(feature) = set.features.into_iter().next() else {
        return Ok(None);
    };

    let name = display_name(&feature.attributes, name_field, code);
    let Some(projected) = extract_point(feature.geometry.as_ref()) else {
        debug!(code, layer_id = layer.layer_id, "feature has no usable geometry");
        return Ok(None);
    };

    let coordinate = projector
        .to_wgs84(projected)
        .map_err(|e| GisError::InvalidResponse(e.to_string()))?;

    Ok(Some(ResolvedLocation { name, coordinate }))
}

/// Doubles single quotes so a code cannot break out of the attribute
/// equality expression.
fn escape_code(code: &str) -> String {
    code.replace('\'', "''")
}

/// Display name from the configured attribute, with a synthesized fallback
/// when the attribute is absent, null, or empty.
fn display_name(
    attributes: &serde_json::Map<String, serde_json::Value>,
    name_field: &str,
    code: &str,
) -> String {
    attributes
        .get(name_field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown Location {}", code))
}

/// Reduces raw feature geometry to a single projected point.
fn extract_point(geometry: Option<&Geometry>) -> Option<(f64, f64)> {
    let geometry = geometry?;

    if let (Some(x), Some(y)) = (geometry.x, geometry.y) {
        return Some((x, y));
    }

    if let Some(pos) = &geometry.coordinates {
        if pos.len() >= 2 {
            return Some((pos[0], pos[1]));
        }
    }

    if let Some(rings) = &geometry.rings {
        let first = rings.first()?;
        let ring: Vec<(f64, f64)> = first
            .iter()
            .filter(|p| p.len() >= 2)
            .map(|p| (p[0], p[1]))
            .collect();
        return geometry::centroid(&ring).ok();
    }

    None
}
