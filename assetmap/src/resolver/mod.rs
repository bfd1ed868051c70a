//! Location resolution
//!
//! The resolver turns an opaque location code into a name and geographic
//! coordinate: first by direct feature lookup across the configured map
//! services, then by walking the asset system's location hierarchy upward
//! and retrying each ancestor, with cycle protection. The walk is an
//! explicit loop carrying a visited set, so a deep or malformed hierarchy
//! costs one network round-trip per ancestor but never stack depth.
//!
//! [`cache`] adds the session-scoped resolution cache and the concurrent
//! batch pipeline on top of [`Resolver`].

mod cache;
mod types;

pub use cache::{BatchResolver, ResolutionCache, DEFAULT_MAX_CONCURRENT_RESOLUTIONS};
pub use types::{LocationCode, ResolutionResult, ResolveError, ResolvedLocation};

use std::collections::HashSet;
use std::future::Future;

use tracing::debug;

use crate::assets::AssetApiClient;
use crate::config::Settings;
use crate::gis::GisLocator;
use crate::http::{AsyncReqwestClient, HttpError};
use crate::projection::ProjectionError;

/// Direct lookup of a code's geographic feature.
///
/// Implementations absorb their own transient failures: `None` means "this
/// path yielded nothing", whatever the reason.
pub trait FeatureLookup: Send + Sync {
    /// Finds the feature for `code`, if any service has one.
    fn find(&self, code: &str) -> impl Future<Output = Option<ResolvedLocation>> + Send;
}

/// Lookup of a code's immediate hierarchy parent.
///
/// Transient failures degrade to `Ok(None)`; only credential rejection is
/// an error, since retrying other codes would fail identically.
pub trait ParentLookup: Send + Sync {
    /// Returns the immediate parent code, or `None` at the hierarchy root.
    fn parent_of(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<LocationCode>, ResolveError>> + Send;
}

/// Resolves location codes via direct lookup plus hierarchy fallback.
pub struct Resolver<F, P> {
    features: F,
    parents: P,
}

impl<F: FeatureLookup, P: ParentLookup> Resolver<F, P> {
    pub fn new(features: F, parents: P) -> Self {
        Self { features, parents }
    }

    /// Resolves one code to its terminal result.
    ///
    /// When the code itself has no feature, the nearest resolvable
    /// ancestor's name and coordinate are returned; the result then
    /// describes the ancestor, not the original code. A parent already
    /// attempted in this call terminates the walk as a cycle.
    pub async fn resolve(&self, code: &str) -> Result<ResolutionResult, ResolveError> {
        if let Some(location) = self.features.find(code).await {
            return Ok(ResolutionResult::Found(location));
        }

        let mut visited: HashSet<LocationCode> = HashSet::new();
        visited.insert(code.to_string());

        let mut next = self.parents.parent_of(code).await?;
        while let Some(parent) = next {
            if !visited.insert(parent.clone()) {
                debug!(code, parent = %parent, "hierarchy cycle detected, giving up");
                return Ok(ResolutionResult::NotFound);
            }

            if let Some(location) = self.features.find(&parent).await {
                debug!(code, ancestor = %parent, "resolved via ancestor");
                return Ok(ResolutionResult::Found(location));
            }

            next = self.parents.parent_of(&parent).await?;
        }

        debug!(code, "hierarchy exhausted without a match");
        Ok(ResolutionResult::NotFound)
    }
}

/// The resolver stack wired to real network clients.
pub type SessionResolver =
    BatchResolver<GisLocator<AsyncReqwestClient>, AssetApiClient<AsyncReqwestClient>>;

/// Errors assembling a resolver session from settings.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] HttpError),
    #[error("projection setup failed: {0}")]
    Projection(#[from] ProjectionError),
}

/// Builds a ready-to-use [`BatchResolver`] from settings.
///
/// The returned session owns its cache; drop it (or call
/// [`BatchResolver::shutdown`]) to cancel in-flight lookups.
pub fn session_from_settings(settings: &Settings) -> Result<SessionResolver, SetupError> {
    let gis = GisLocator::new(
        AsyncReqwestClient::with_timeout(settings.resolver.timeout_secs)?,
        settings.gis.services.clone(),
    )?
    .with_code_field(&settings.gis.code_field)
    .with_name_field(&settings.gis.name_field);

    let assets = AssetApiClient::new(
        AsyncReqwestClient::with_timeout(settings.resolver.timeout_secs)?,
        &settings.assets.base_url,
        &settings.assets.api_key,
    );

    Ok(
        BatchResolver::new(Resolver::new(gis, assets), ResolutionCache::new().into())
            .with_max_concurrent(settings.resolver.max_concurrent),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Feature lookup over a fixed code → location table, with call
    /// counting and optional per-call delay.
    pub struct TableLookup {
        table: HashMap<String, ResolvedLocation>,
        pub calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl TableLookup {
        pub fn new(entries: &[(&str, &str, (f64, f64))]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(code, name, coord)| {
                        (
                            code.to_string(),
                            ResolvedLocation {
                                name: name.to_string(),
                                coordinate: *coord,
                            },
                        )
                    })
                    .collect(),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        pub fn empty() -> Self {
            Self::new(&[])
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FeatureLookup for TableLookup {
        async fn find(&self, code: &str) -> Option<ResolvedLocation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.table.get(code).cloned()
        }
    }

    /// Parent lookup over a fixed child → parent table.
    pub struct TableHierarchy {
        table: HashMap<String, String>,
        auth_failure: Option<u16>,
    }

    impl TableHierarchy {
        pub fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(child, parent)| (child.to_string(), parent.to_string()))
                    .collect(),
                auth_failure: None,
            }
        }

        pub fn empty() -> Self {
            Self::new(&[])
        }

        pub fn rejecting(status: u16) -> Self {
            Self {
                table: HashMap::new(),
                auth_failure: Some(status),
            }
        }
    }

    impl ParentLookup for TableHierarchy {
        async fn parent_of(&self, code: &str) -> Result<Option<LocationCode>, ResolveError> {
            if let Some(status) = self.auth_failure {
                return Err(ResolveError::Unauthorized { status });
            }
            Ok(self.table.get(code).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{TableHierarchy, TableLookup};
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_direct_match_short_circuits_hierarchy() {
        let resolver = Resolver::new(
            TableLookup::new(&[("STA1", "Union Station", (-77.0, 38.9))]),
            TableHierarchy::rejecting(401), // would error if consulted
        );

        let result = resolver.resolve("STA1").await.unwrap();
        assert_eq!(result.location().unwrap().name, "Union Station");
    }

    #[tokio::test]
    async fn test_no_feature_no_parent_is_not_found() {
        let resolver = Resolver::new(TableLookup::empty(), TableHierarchy::empty());
        assert_eq!(resolver.resolve("GHOST").await.unwrap(), ResolutionResult::NotFound);
    }

    #[tokio::test]
    async fn test_resolves_via_nearest_ancestor() {
        let resolver = Resolver::new(
            TableLookup::new(&[("REGION", "Service Region", (-77.1, 38.8))]),
            TableHierarchy::new(&[("ROOM", "FLOOR"), ("FLOOR", "REGION")]),
        );

        let result = resolver.resolve("ROOM").await.unwrap();
        // The ancestor's identity is returned, not the original code's.
        assert_eq!(result.location().unwrap().name, "Service Region");
    }

    #[tokio::test]
    async fn test_hierarchy_cycle_terminates_not_found() {
        let resolver = Resolver::new(
            TableLookup::empty(),
            TableHierarchy::new(&[("A", "B"), ("B", "A")]),
        );

        // Bounded: a cycle must terminate well within the timeout.
        let result = tokio::time::timeout(Duration::from_secs(5), resolver.resolve("A"))
            .await
            .expect("cycle resolution must terminate")
            .unwrap();
        assert_eq!(result, ResolutionResult::NotFound);
    }

    #[tokio::test]
    async fn test_self_parent_terminates() {
        let resolver = Resolver::new(TableLookup::empty(), TableHierarchy::new(&[("A", "A")]));
        let result = tokio::time::timeout(Duration::from_secs(5), resolver.resolve("A"))
            .await
            .expect("self-parent resolution must terminate")
            .unwrap();
        assert_eq!(result, ResolutionResult::NotFound);
    }

    #[tokio::test]
    async fn test_auth_failure_propagates() {
        let resolver = Resolver::new(TableLookup::empty(), TableHierarchy::rejecting(403));
        let err = resolver.resolve("ANY").await.unwrap_err();
        assert_eq!(err, ResolveError::Unauthorized { status: 403 });
    }

    #[tokio::test]
    async fn test_long_acyclic_chain_resolves_at_top() {
        // A → B → ... → J, only J has geography. One round-trip per
        // ancestor is accepted, not optimized.
        let chain: Vec<(String, String)> = (b'A'..b'J')
            .map(|c| ((c as char).to_string(), ((c + 1) as char).to_string()))
            .collect();
        let pairs: Vec<(&str, &str)> = chain
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();

        let resolver = Resolver::new(
            TableLookup::new(&[("J", "Terminal", (0.0, 0.0))]),
            TableHierarchy::new(&pairs),
        );

        let result = resolver.resolve("A").await.unwrap();
        assert_eq!(result.location().unwrap().name, "Terminal");
    }
}
