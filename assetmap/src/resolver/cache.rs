//! Session-scoped resolution cache and concurrent batch pipeline
//!
//! The cache maps location codes to terminal resolution results and is
//! write-once per key: once a code resolves (including to `NotFound`) it is
//! never re-queried for the cache's lifetime. A lookup in flight is held in
//! the cache as a shared future, so concurrent callers for the same code
//! attach to one network resolution instead of duplicating it.
//!
//! The batch pipeline bounds concurrent outstanding resolutions with a
//! semaphore rather than fire-and-forget chunk dispatch, so the ceiling is
//! a hard guarantee. Results stream out as each code completes; observers
//! see the cache grow before a batch finishes.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{LocationCode, ResolutionResult, ResolveError, ResolvedLocation};
use super::{FeatureLookup, ParentLookup, Resolver};

/// Ceiling on concurrent outstanding resolutions per session.
pub const DEFAULT_MAX_CONCURRENT_RESOLUTIONS: usize = 25;

/// A resolution in flight, shareable between waiters.
type SharedOutcome = Shared<BoxFuture<'static, Result<ResolutionResult, ResolveError>>>;

enum CacheEntry {
    /// Resolution in flight; waiters attach to the same outcome.
    Pending(SharedOutcome),
    /// Terminal result; write-once, never replaced by a different value.
    Done(ResolutionResult),
}

/// Session-scoped mapping of location codes to resolution results.
///
/// Owned by the resolver's caller with explicit lifecycle: created per
/// session or view, discarded on teardown. Never a process-wide singleton,
/// and nothing persists across restarts.
#[derive(Default)]
pub struct ResolutionCache {
    entries: DashMap<LocationCode, CacheEntry>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminal result for `code`, if resolution has completed.
    pub fn get(&self, code: &str) -> Option<ResolutionResult> {
        match self.entries.get(code).as_deref() {
            Some(CacheEntry::Done(result)) => Some(result.clone()),
            _ => None,
        }
    }

    /// Whether `code` is already resolved or in flight.
    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Whether `code` has a resolution in flight.
    pub fn is_pending(&self, code: &str) -> bool {
        matches!(self.entries.get(code).as_deref(), Some(CacheEntry::Pending(_)))
    }

    /// Number of codes with a terminal result.
    pub fn resolved_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.value(), CacheEntry::Done(_)))
            .count()
    }

    /// Snapshot of every code that resolved to a location.
    ///
    /// This is what a density view consumes: codes that resolved to
    /// `NotFound` simply never appear.
    pub fn found(&self) -> Vec<(LocationCode, ResolvedLocation)> {
        self.entries
            .iter()
            .filter_map(|e| match e.value() {
                CacheEntry::Done(ResolutionResult::Found(location)) => {
                    Some((e.key().clone(), location.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Publishes a terminal result, completing the pending entry.
    fn complete(&self, code: &str, result: ResolutionResult) {
        self.entries
            .insert(code.to_string(), CacheEntry::Done(result));
    }

    /// Drops a pending entry whose resolution failed, so a later session
    /// action (e.g. re-authentication) can retry the code.
    fn forget(&self, code: &str) {
        self.entries.remove(code);
    }
}

/// How a caller obtains a code's outcome.
enum OutcomeHandle {
    /// Already resolved; no network work.
    Ready(ResolutionResult),
    /// In flight (joined or newly started).
    Join(SharedOutcome),
}

/// Concurrent batch resolution over a shared [`ResolutionCache`].
///
/// Deduplicates codes, coalesces concurrent identical requests, bounds
/// outstanding network resolutions, and streams results as they complete.
/// Dropping the batch resolver cancels in-flight lookups best-effort.
pub struct BatchResolver<F, P> {
    resolver: Arc<Resolver<F, P>>,
    cache: Arc<ResolutionCache>,
    limiter: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    cancel: CancellationToken,
}

impl<F, P> BatchResolver<F, P>
where
    F: FeatureLookup + 'static,
    P: ParentLookup + 'static,
{
    /// Creates a batch resolver over an injected cache with the default
    /// concurrency ceiling.
    pub fn new(resolver: Resolver<F, P>, cache: Arc<ResolutionCache>) -> Self {
        Self {
            resolver: Arc::new(resolver),
            cache,
            limiter: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_RESOLUTIONS)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            cancel: CancellationToken::new(),
        }
    }

    /// Overrides the ceiling on concurrent outstanding resolutions.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.limiter = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    /// The shared cache this resolver populates.
    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// True from the moment a non-empty batch starts until every one of
    /// its codes has completed; false immediately for an empty batch.
    pub fn is_resolving(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Cancels in-flight lookups. Codes without a terminal result are left
    /// uncached and may be retried by a future session.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Resolves one code, consulting the cache first.
    ///
    /// A second call for an already-cached code issues no network work and
    /// returns the identical stored result. Concurrent calls for the same
    /// uncached code share one resolution.
    pub async fn resolve(&self, code: &str) -> Result<ResolutionResult, ResolveError> {
        match self.outcome(code) {
            OutcomeHandle::Ready(result) => Ok(result),
            OutcomeHandle::Join(shared) => shared.await,
        }
    }

    /// Resolves every distinct, not-yet-seen code in `codes`, streaming
    /// `(code, outcome)` pairs as each completes.
    ///
    /// Codes already resolved or in flight are skipped entirely, matching
    /// the cache's write-once discipline. The channel closes when the
    /// batch is done; an empty batch yields a closed channel immediately.
    pub fn resolve_all<I>(
        &self,
        codes: I,
    ) -> mpsc::Receiver<(LocationCode, Result<ResolutionResult, ResolveError>)>
    where
        I: IntoIterator<Item = LocationCode>,
    {
        let mut seen = HashSet::new();
        let new_codes: Vec<LocationCode> = codes
            .into_iter()
            .filter(|code| !code.is_empty())
            .filter(|code| seen.insert(code.clone()) && !self.cache.contains(code))
            .collect();

        let (tx, rx) = mpsc::channel(new_codes.len().max(1));
        if new_codes.is_empty() {
            return rx;
        }

        debug!(count = new_codes.len(), "starting batch resolution");
        self.in_flight.fetch_add(new_codes.len(), Ordering::SeqCst);

        for code in new_codes {
            let handle = self.outcome(&code);
            let tx = tx.clone();
            let in_flight = Arc::clone(&self.in_flight);
            tokio::spawn(async move {
                let outcome = match handle {
                    OutcomeHandle::Ready(result) => Ok(result),
                    OutcomeHandle::Join(shared) => shared.await,
                };
                // Receiver may be gone; the cache is still populated.
                let _ = tx.send((code, outcome)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            });
        }

        rx
    }

    /// Looks up or starts the resolution for `code`.
    fn outcome(&self, code: &str) -> OutcomeHandle {
        match self.cache.entries.entry(code.to_string()) {
            Entry::Occupied(occupied) => match occupied.get() {
                CacheEntry::Done(result) => OutcomeHandle::Ready(result.clone()),
                CacheEntry::Pending(shared) => OutcomeHandle::Join(shared.clone()),
            },
            Entry::Vacant(vacant) => {
                let shared = self.start(code.to_string());
                vacant.insert(CacheEntry::Pending(shared.clone()));
                OutcomeHandle::Join(shared)
            }
        }
    }

    /// Spawns the bounded, cancellable resolution for one code and returns
    /// its shareable outcome.
    fn start(&self, code: LocationCode) -> SharedOutcome {
        let resolver = Arc::clone(&self.resolver);
        let cache = Arc::clone(&self.cache);
        let limiter = Arc::clone(&self.limiter);
        let cancel = self.cancel.clone();

        let shared = async move {
            // The permit bounds actual outstanding resolutions; waiting for
            // one does not count against the ceiling.
            let _permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
                permit = limiter.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return Err(ResolveError::Cancelled),
                },
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ResolveError::Cancelled),
                result = resolver.resolve(&code) => result,
            };

            match &outcome {
                Ok(result) => cache.complete(&code, result.clone()),
                Err(e) => {
                    if *e != ResolveError::Cancelled {
                        warn!(code = %code, error = %e, "resolution failed, leaving code uncached");
                    }
                    cache.forget(&code);
                }
            }

            outcome
        }
        .boxed()
        .shared();

        // Drive to completion even if every waiter drops its handle, so
        // batch results always land in the cache.
        tokio::spawn(shared.clone());

        shared
    }
}

impl<F, P> Drop for BatchResolver<F, P> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::test_support::{TableHierarchy, TableLookup};
    use std::sync::atomic::AtomicIsize;
    use std::time::Duration;

    fn batch(
        features: TableLookup,
        parents: TableHierarchy,
    ) -> BatchResolver<TableLookup, TableHierarchy> {
        BatchResolver::new(
            Resolver::new(features, parents),
            Arc::new(ResolutionCache::new()),
        )
    }

    #[tokio::test]
    async fn test_cached_code_issues_no_second_lookup() {
        let resolver = batch(
            TableLookup::new(&[("STA1", "Union Station", (-77.0, 38.9))]),
            TableHierarchy::empty(),
        );

        let first = resolver.resolve("STA1").await.unwrap();
        let second = resolver.resolve("STA1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            resolver.resolver.features.call_count(),
            1,
            "second resolve must be served from the cache"
        );
    }

    #[tokio::test]
    async fn test_not_found_is_cached_too() {
        let resolver = batch(TableLookup::empty(), TableHierarchy::empty());

        assert_eq!(resolver.resolve("GHOST").await.unwrap(), ResolutionResult::NotFound);
        assert_eq!(resolver.resolve("GHOST").await.unwrap(), ResolutionResult::NotFound);
        assert_eq!(resolver.resolver.features.call_count(), 1);
        assert_eq!(resolver.cache().get("GHOST"), Some(ResolutionResult::NotFound));
    }

    #[tokio::test]
    async fn test_concurrent_identical_requests_coalesce() {
        let resolver = Arc::new(batch(
            TableLookup::new(&[("STA1", "Union Station", (-77.0, 38.9))])
                .with_delay(Duration::from_millis(50)),
            TableHierarchy::empty(),
        ));

        let a = {
            let r = Arc::clone(&resolver);
            tokio::spawn(async move { r.resolve("STA1").await })
        };
        let b = {
            let r = Arc::clone(&resolver);
            tokio::spawn(async move { r.resolve("STA1").await })
        };

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        assert_eq!(a, b);
        assert_eq!(
            resolver.resolver.features.call_count(),
            1,
            "concurrent callers must share one resolution"
        );
    }

    #[tokio::test]
    async fn test_batch_respects_concurrency_ceiling() {
        /// Feature lookup that tracks the high-water mark of concurrent
        /// calls.
        struct GaugedLookup {
            active: AtomicIsize,
            high_water: AtomicIsize,
        }

        impl FeatureLookup for GaugedLookup {
            async fn find(&self, _code: &str) -> Option<ResolvedLocation> {
                let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.high_water.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.active.fetch_sub(1, Ordering::SeqCst);
                Some(ResolvedLocation {
                    name: "Somewhere".into(),
                    coordinate: (0.0, 0.0),
                })
            }
        }

        let gauged = GaugedLookup {
            active: AtomicIsize::new(0),
            high_water: AtomicIsize::new(0),
        };
        let resolver = BatchResolver::new(
            Resolver::new(gauged, TableHierarchy::empty()),
            Arc::new(ResolutionCache::new()),
        );

        let codes: Vec<String> = (0..60).map(|i| format!("CODE{:02}", i)).collect();
        let mut rx = resolver.resolve_all(codes);

        let mut completed = 0;
        while let Some((_code, outcome)) = rx.recv().await {
            assert!(outcome.unwrap().is_found());
            completed += 1;
        }

        assert_eq!(completed, 60);
        assert_eq!(resolver.cache().resolved_count(), 60);
        let high_water = resolver.resolver.features.high_water.load(Ordering::SeqCst);
        assert!(
            high_water <= DEFAULT_MAX_CONCURRENT_RESOLUTIONS as isize,
            "observed {} concurrent lookups, ceiling is {}",
            high_water,
            DEFAULT_MAX_CONCURRENT_RESOLUTIONS
        );
        assert!(!resolver.is_resolving());
    }

    #[tokio::test]
    async fn test_batch_deduplicates_and_skips_cached() {
        let resolver = batch(
            TableLookup::new(&[("A", "Alpha", (1.0, 1.0)), ("B", "Beta", (2.0, 2.0))]),
            TableHierarchy::empty(),
        );

        // Pre-resolve A; the batch must skip it.
        resolver.resolve("A").await.unwrap();

        let mut rx = resolver.resolve_all(vec![
            "A".to_string(),
            "B".to_string(),
            "B".to_string(),
            String::new(),
        ]);

        let mut received = Vec::new();
        while let Some((code, _)) = rx.recv().await {
            received.push(code);
        }

        assert_eq!(received, vec!["B".to_string()]);
        assert_eq!(resolver.resolver.features.call_count(), 2); // A once, B once
    }

    #[tokio::test]
    async fn test_empty_batch_is_immediately_done() {
        let resolver = batch(TableLookup::empty(), TableHierarchy::empty());
        let mut rx = resolver.resolve_all(Vec::new());
        assert!(rx.recv().await.is_none(), "empty batch closes at once");
        assert!(!resolver.is_resolving());
    }

    #[tokio::test]
    async fn test_resolving_flag_clears_after_batch() {
        let resolver = batch(
            TableLookup::new(&[("A", "Alpha", (1.0, 1.0))]).with_delay(Duration::from_millis(30)),
            TableHierarchy::empty(),
        );

        let mut rx = resolver.resolve_all(vec!["A".to_string()]);
        assert!(resolver.is_resolving());

        while rx.recv().await.is_some() {}
        // The flag drops with the last completion; allow the final
        // decrement to land.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!resolver.is_resolving());
    }

    #[tokio::test]
    async fn test_auth_failure_surfaces_and_leaves_code_uncached() {
        let resolver = batch(TableLookup::empty(), TableHierarchy::rejecting(401));

        let err = resolver.resolve("ANY").await.unwrap_err();
        assert_eq!(err, ResolveError::Unauthorized { status: 401 });
        assert!(
            !resolver.cache().contains("ANY"),
            "auth failures must not be cached as NotFound"
        );
    }

    #[tokio::test]
    async fn test_shutdown_cancels_in_flight() {
        let resolver = batch(
            TableLookup::new(&[("SLOW", "Slow", (0.0, 0.0))]).with_delay(Duration::from_secs(10)),
            TableHierarchy::empty(),
        );

        let mut rx = resolver.resolve_all(vec!["SLOW".to_string()]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        resolver.shutdown();

        let (_code, outcome) = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("cancellation must not hang")
            .expect("cancelled batch still reports its codes");
        assert_eq!(outcome.unwrap_err(), ResolveError::Cancelled);
        assert!(!resolver.cache().contains("SLOW"));
    }

    #[tokio::test]
    async fn test_found_snapshot_for_density_view() {
        let resolver = batch(
            TableLookup::new(&[("A", "Alpha", (1.0, 1.0))]),
            TableHierarchy::empty(),
        );

        resolver.resolve("A").await.unwrap();
        resolver.resolve("MISSING").await.unwrap();

        let found = resolver.cache().found();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "A");
        assert_eq!(found[0].1.name, "Alpha");
    }
}
