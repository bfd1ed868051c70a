//! Asset-management API client
//!
//! Queries the asset system's REST layer with an API key credential passed
//! as a request parameter. Responses use the lean JSON shape (`member`
//! collections, lowercase attribute names).

use serde::Deserialize;

use crate::assets::types::{AssetApiError, AssetRecord};
use crate::http::{AsyncHttpClient, HttpError};

#[derive(Debug, Deserialize)]
struct AssetCollection {
    #[serde(default)]
    member: Vec<AssetRecord>,
}

/// Client for the asset-management API.
///
/// Covers the two endpoints this subsystem consumes: the asset collection
/// query (filter expression plus field projection) and the
/// location-hierarchy parent lookup (see `hierarchy.rs`).
pub struct AssetApiClient<C: AsyncHttpClient> {
    http: C,
    base_url: String,
    api_key: String,
}

impl<C: AsyncHttpClient> AssetApiClient<C> {
    pub fn new(http: C, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub(crate) fn http(&self) -> &C {
        &self.http
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Fetches assets matching `where_clause`, projected to asset number
    /// and location code.
    ///
    /// Credential rejection surfaces as [`AssetApiError::Unauthorized`];
    /// it must never be mistaken for an empty result.
    pub async fn fetch_assets(
        &self,
        where_clause: &str,
    ) -> Result<Vec<AssetRecord>, AssetApiError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/os/mxapiasset", self.base_url),
            &[
                ("lean", "1"),
                ("oslc.where", where_clause),
                ("oslc.select", "assetnum,location"),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| AssetApiError::Http(e.to_string()))?;

        let body = self.http.get(url.as_str()).await.map_err(classify)?;
        let collection: AssetCollection = serde_json::from_slice(&body)
            .map_err(|e| AssetApiError::InvalidResponse(e.to_string()))?;

        Ok(collection.member)
    }
}

/// Maps transport errors, keeping credential rejection distinct.
pub(crate) fn classify(err: HttpError) -> AssetApiError {
    if err.is_unauthorized() {
        AssetApiError::Unauthorized {
            // is_unauthorized guarantees a status is present
            status: err.status().unwrap_or(401),
        }
    } else {
        AssetApiError::Http(err.to_string())
    }
}
