//! Map command - place a department's assets at resolved locations.

use std::collections::BTreeMap;
use std::path::PathBuf;

use assetmap::assets::AssetApiClient;
use assetmap::http::AsyncReqwestClient;
use assetmap::resolver::{session_from_settings, ResolutionResult, ResolveError};
use tracing::info;

use super::common::{config_path, load_settings};
use crate::error::CliError;

/// Arguments for the map command.
pub struct MapArgs {
    pub department: String,
    pub config: Option<PathBuf>,
    pub api_key: Option<String>,
}

/// Run the map command.
pub async fn run(args: MapArgs) -> Result<(), CliError> {
    let path = config_path(args.config);
    let settings = load_settings(&path, args.api_key)?;

    let filter = settings
        .assets
        .departments
        .get(&args.department)
        .ok_or_else(|| {
            let known: Vec<&str> = settings.assets.departments.keys().map(String::as_str).collect();
            CliError::Config(format!(
                "unknown department '{}'; configured departments: {}",
                args.department,
                known.join(", ")
            ))
        })?;

    let client = AssetApiClient::new(
        AsyncReqwestClient::with_timeout(settings.resolver.timeout_secs)
            .map_err(assetmap::resolver::SetupError::Http)?,
        &settings.assets.base_url,
        &settings.assets.api_key,
    );

    let assets = client
        .fetch_assets(&settings.assets.asset_where_clause(filter))
        .await?;
    info!(department = %args.department, assets = assets.len(), "fetched asset listing");

    // Asset counts per location code; assets without a location are dropped.
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for asset in &assets {
        if let Some(location) = &asset.location {
            if !location.is_empty() {
                *counts.entry(location.clone()).or_default() += 1;
            }
        }
    }

    if counts.is_empty() {
        println!("no located assets for department {}", args.department);
        return Ok(());
    }

    let session = session_from_settings(&settings)?;
    let mut results = session.resolve_all(counts.keys().cloned());

    let mut resolved: BTreeMap<String, ResolutionResult> = BTreeMap::new();
    while let Some((code, outcome)) = results.recv().await {
        match outcome {
            Ok(result) => {
                resolved.insert(code, result);
            }
            Err(err @ ResolveError::Unauthorized { .. }) => return Err(err.into()),
            Err(ResolveError::Cancelled) => {}
        }
    }

    let mut unmapped = 0usize;
    for (code, count) in &counts {
        match resolved.get(code) {
            Some(ResolutionResult::Found(location)) => {
                let (lon, lat) = location.coordinate;
                println!("{code}\t{}\t{lat:.6},{lon:.6}\t{count} asset(s)", location.name);
            }
            _ => unmapped += count,
        }
    }
    if unmapped > 0 {
        eprintln!("{unmapped} asset(s) at locations that could not be mapped");
    }
    Ok(())
}
