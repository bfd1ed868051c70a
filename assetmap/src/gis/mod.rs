//! GIS map-service clients
//!
//! This module talks to ArcGIS-shaped map services: [`catalog`] discovers
//! which layers of a service expose the code-matching attribute, and
//! [`features`] queries a matched layer for a code's geographic feature.
//! [`GisLocator`] composes the two across an ordered list of services and
//! is the resolver's direct-lookup path.

mod catalog;
mod features;
mod types;

pub use catalog::matching_layers;
pub use features::{query_location, WEB_MERCATOR_WKID};
pub use types::{GisError, LayerDescriptor};

use tracing::{debug, warn};

use crate::config::{DEFAULT_CODE_FIELD, DEFAULT_NAME_FIELD};
use crate::http::AsyncHttpClient;
use crate::projection::{ProjectionError, Projector};
use crate::resolver::{FeatureLookup, ResolvedLocation};

/// Direct feature lookup across an ordered list of map services.
///
/// Services are searched in the configured order; within a service,
/// candidate layers are tried in catalog order. The first feature with
/// usable geometry wins. A failing service or layer is logged and skipped,
/// never fatal.
pub struct GisLocator<C: AsyncHttpClient> {
    http: C,
    projector: Projector,
    services: Vec<String>,
    code_field: String,
    name_field: String,
}

impl<C: AsyncHttpClient> GisLocator<C> {
    /// Creates a locator over the given services, in priority order.
    pub fn new(http: C, services: Vec<String>) -> Result<Self, ProjectionError> {
        Ok(Self {
            http,
            projector: Projector::new()?,
            services,
            code_field: DEFAULT_CODE_FIELD.to_string(),
            name_field: DEFAULT_NAME_FIELD.to_string(),
        })
    }

    /// Overrides the attribute name used to match location codes.
    pub fn with_code_field(mut self, field: impl Into<String>) -> Self {
        self.code_field = field.into();
        self
    }

    /// Overrides the attribute name used for display names.
    pub fn with_name_field(mut self, field: impl Into<String>) -> Self {
        self.name_field = field.into();
        self
    }
}

impl<C: AsyncHttpClient> FeatureLookup for GisLocator<C> {
    async fn find(&self, code: &str) -> Option<ResolvedLocation> {
        for service in &self.services {
            let layers = match matching_layers(&self.http, service, &self.code_field).await {
                Ok(layers) => layers,
                Err(e) => {
                    warn!(service = %service, error = %e, "layer catalog unavailable, skipping service");
                    continue;
                }
            };

            for layer in &layers {
                match query_location(&self.http, &self.projector, layer, code, &self.name_field)
                    .await
                {
                    Ok(Some(location)) => {
                        debug!(
                            code,
                            service = %service,
                            layer_id = layer.layer_id,
                            name = %location.name,
                            "direct feature match"
                        );
                        return Some(location);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(
                            code,
                            service = %service,
                            layer_id = layer.layer_id,
                            error = %e,
                            "feature query failed, trying next layer"
                        );
                    }
                }
            }
        }

        None
    }
}
