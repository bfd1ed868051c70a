//! Maximo asset API client
//!
//! Talks to the Maximo REST surface for two distinct concerns:
//!
//! * asset listings (`/os/mxapiasset`) filtered by an OSLC where clause,
//!   used to discover which location codes carry assets, and
//! * the location hierarchy (`/os/mxllocation/{code}`), used by the
//!   resolver to walk from an unmapped code up to a mappable ancestor.
//!
//! All requests authenticate with an API key passed as a query parameter.

mod client;
mod hierarchy;
mod types;

pub use client::AssetApiClient;
pub use types::{AssetApiError, AssetRecord};
