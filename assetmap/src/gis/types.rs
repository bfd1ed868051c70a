//! GIS client types

use thiserror::Error;

/// Errors from GIS map-service operations.
///
/// None of these are fatal to a resolution: the resolver treats a failing
/// service or layer as "no candidates from this path" and continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GisError {
    /// HTTP request failed or the server answered with an error status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body was not the expected JSON shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A query URL could not be constructed.
    #[error("invalid query URL: {0}")]
    InvalidUrl(String),
}

/// A map layer believed to expose the code-matching attribute.
///
/// Derived per-lookup from a layer catalog query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDescriptor {
    /// Base URL of the map service (`.../MapServer`).
    pub service_base_url: String,
    /// Layer id within the service.
    pub layer_id: u32,
    /// Attribute name to match location codes against.
    pub match_field: String,
}
