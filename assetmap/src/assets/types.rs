//! Asset API types

use serde::Deserialize;
use thiserror::Error;

/// Errors from the asset-management API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetApiError {
    /// The API rejected the credential. Unlike transient failures this is
    /// actionable: the caller should re-authenticate, not retry.
    #[error("asset API rejected the credential (HTTP {status})")]
    Unauthorized { status: u16 },

    /// Request failed or the server answered with a non-auth error status.
    #[error("asset API request failed: {0}")]
    Http(String),

    /// Response body was not the expected JSON shape.
    #[error("asset API returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// One asset record, projected down to the fields the map needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssetRecord {
    /// Asset identifier.
    #[serde(rename = "assetnum", default)]
    pub asset_num: String,
    /// Location code the asset is installed at, if any.
    #[serde(default)]
    pub location: Option<String>,
}
