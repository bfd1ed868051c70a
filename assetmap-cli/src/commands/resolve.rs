//! Resolve command - map location codes to names and coordinates.

use std::path::PathBuf;

use assetmap::resolver::{session_from_settings, ResolutionResult, ResolveError};
use tracing::debug;

use super::common::{config_path, load_settings};
use crate::error::CliError;

/// Arguments for the resolve command.
pub struct ResolveArgs {
    pub codes: Vec<String>,
    pub config: Option<PathBuf>,
    pub api_key: Option<String>,
}

/// Run the resolve command.
pub async fn run(args: ResolveArgs) -> Result<(), CliError> {
    let path = config_path(args.config);
    let settings = load_settings(&path, args.api_key)?;
    let session = session_from_settings(&settings)?;

    debug!(codes = args.codes.len(), "starting resolution batch");

    let mut results = session.resolve_all(args.codes);
    let mut missing = 0usize;
    while let Some((code, outcome)) = results.recv().await {
        match outcome {
            Ok(ResolutionResult::Found(location)) => {
                let (lon, lat) = location.coordinate;
                println!("{code}\t{}\t{lat:.6},{lon:.6}", location.name);
            }
            Ok(ResolutionResult::NotFound) => {
                missing += 1;
                println!("{code}\t(not found)");
            }
            Err(err @ ResolveError::Unauthorized { .. }) => return Err(err.into()),
            Err(ResolveError::Cancelled) => {}
        }
    }

    if missing > 0 {
        eprintln!("{missing} code(s) could not be resolved to a location");
    }
    Ok(())
}
