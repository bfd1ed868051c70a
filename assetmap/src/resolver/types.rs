//! Resolution data model

use thiserror::Error;

/// Opaque identifier for a physical place in the asset-management system.
pub type LocationCode = String;

/// A location code resolved to a name and a geographic coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Human-readable display name.
    pub name: String,
    /// `(longitude, latitude)` in WGS84 degrees - never projected units.
    pub coordinate: (f64, f64),
}

/// Terminal outcome of resolving one location code.
///
/// `NotFound` is a legitimate value, not a failure: absence of geography is
/// a representable outcome and is cached like any other result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionResult {
    /// The code (or its nearest resolvable ancestor) has geography.
    Found(ResolvedLocation),
    /// No direct feature, no resolvable ancestor, or a hierarchy cycle.
    NotFound,
}

impl ResolutionResult {
    /// Whether this result carries a location.
    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionResult::Found(_))
    }

    /// The resolved location, if any.
    pub fn location(&self) -> Option<&ResolvedLocation> {
        match self {
            ResolutionResult::Found(location) => Some(location),
            ResolutionResult::NotFound => None,
        }
    }
}

/// Errors that escape resolution.
///
/// Transient network and parse failures never surface here - they degrade
/// to `NotFound` along the way. What remains is actionable by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// The asset-management API rejected the credential. Callers should
    /// re-authenticate rather than treat this as missing geography.
    #[error("authentication failed against the asset-management API (HTTP {status})")]
    Unauthorized {
        /// The rejecting HTTP status (401 or 403).
        status: u16,
    },

    /// The lookup was cancelled before completing (session teardown).
    #[error("resolution cancelled")]
    Cancelled,
}
