//! Location hierarchy lookup
//!
//! Each location code may have a broader parent location in the asset
//! system's topology. The resolver walks that chain when a code has no
//! direct geographic feature.
//!
//! Failure policy is deliberate: transient network and parse errors are
//! logged and degrade to "no parent", so one flaky lookup turns into a
//! `NotFound` for that code instead of failing a whole batch. Credential
//! rejection is the one exception and propagates.

use serde::Deserialize;
use tracing::warn;

use crate::assets::client::{classify, AssetApiClient};
use crate::assets::types::AssetApiError;
use crate::http::AsyncHttpClient;
use crate::resolver::{LocationCode, ParentLookup, ResolveError};

#[derive(Debug, Deserialize)]
struct LocationResponse {
    #[serde(default)]
    lochierarchy: Vec<HierarchyEntry>,
}

#[derive(Debug, Deserialize)]
struct HierarchyEntry {
    #[serde(default)]
    parent: Option<String>,
}

impl<C: AsyncHttpClient> AssetApiClient<C> {
    /// Returns the immediate parent of `code`, or `None` when the location
    /// has no parent or the lookup failed transiently.
    pub async fn parent_of(&self, code: &str) -> Result<Option<LocationCode>, AssetApiError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/os/mxllocation/{}", self.base_url(), code),
            &[("lean", "1"), ("apikey", self.api_key())],
        )
        .map_err(|e| AssetApiError::Http(e.to_string()))?;

        let body = match self.http().get(url.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                let classified = classify(e);
                if let AssetApiError::Unauthorized { .. } = classified {
                    return Err(classified);
                }
                warn!(code, error = %classified, "hierarchy lookup failed, treating as no parent");
                return Ok(None);
            }
        };

        let response: LocationResponse = match serde_json::from_slice(&body) {
            Ok(response) => response,
            Err(e) => {
                warn!(code, error = %e, "hierarchy response unparseable, treating as no parent");
                return Ok(None);
            }
        };

        Ok(response
            .lochierarchy
            .into_iter()
            .next()
            .and_then(|entry| entry.parent)
            .filter(|parent| !parent.is_empty()))
    }
}

impl<C: AsyncHttpClient> ParentLookup for AssetApiClient<C> {
    async fn parent_of(&self, code: &str) -> Result<Option<LocationCode>, ResolveError> {
        match AssetApiClient::parent_of(self, code).await {
            Ok(parent) => Ok(parent),
            Err(AssetApiError::Unauthorized { status }) => {
                Err(ResolveError::Unauthorized { status })
            }
            // parent_of absorbs everything else already
            Err(other) => {
                warn!(code, error = %other, "unexpected hierarchy error, treating as no parent");
                Ok(None)
            }
        }
    }
}
