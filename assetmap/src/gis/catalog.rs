//! Layer schema matching
//!
//! A map service exposes an unknown set of layers, each with its own
//! attribute schema. This module fetches the service's layer catalog and
//! selects the layers whose schema includes the well-known code attribute,
//! in catalog order. Results are derived fresh per lookup; caching happens
//! at the resolution layer, not here.

use serde::Deserialize;
use tracing::debug;

use crate::gis::types::{GisError, LayerDescriptor};
use crate::http::AsyncHttpClient;

#[derive(Debug, Deserialize)]
struct LayerCatalog {
    #[serde(default)]
    layers: Vec<LayerEntry>,
}

#[derive(Debug, Deserialize)]
struct LayerEntry {
    id: u32,
    #[serde(default)]
    name: String,
    /// Absent for group layers, which have no attribute schema.
    #[serde(default)]
    fields: Option<Vec<FieldEntry>>,
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    #[serde(default)]
    name: String,
}

/// Fetches a service's layer catalog and returns descriptors for every
/// layer whose schema includes `code_field`, preserving catalog order.
///
/// One network read per call. Network and parse failures propagate; the
/// caller treats them as "no candidates from this service".
pub async fn matching_layers<C: AsyncHttpClient>(
    client: &C,
    service_base_url: &str,
    code_field: &str,
) -> Result<Vec<LayerDescriptor>, GisError> {
    let url = format!("{}/layers?f=json", service_base_url.trim_end_matches('/'));
    let body = client
        .get(&url)
        .await
        .map_err(|e| GisError::Http(e.to_string()))?;

    let catalog: LayerCatalog =
        serde_json::from_slice(&body).map_err(|e| GisError::InvalidResponse(e.to_string()))?;

    let descriptors: Vec<LayerDescriptor> = catalog
        .layers
        .into_iter()
        .filter(|layer| {
            layer
                .fields
                .as_ref()
                .is_some_and(|fields| fields.iter().any(|f| f.name == code_field))
        })
        .map(|layer| {
            debug!(
                service = service_base_url,
                layer_id = layer.id,
                layer_name = %layer.name,
                "layer exposes code attribute"
            );
            LayerDescriptor {
                service_base_url: service_base_url.trim_end_matches('/').to_string(),
                layer_id: layer.id,
                match_field: code_field.to_string(),
            }
        })
        .collect();

    Ok(descriptors)
}
