//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] assetmap::config::ConfigError),

    #[error("failed to set up resolver session: {0}")]
    Setup(#[from] assetmap::resolver::SetupError),

    #[error(transparent)]
    Resolve(#[from] assetmap::resolver::ResolveError),

    #[error(transparent)]
    Assets(#[from] assetmap::assets::AssetApiError),
}

impl CliError {
    /// True when the failure is an API credential rejection.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            CliError::Resolve(assetmap::resolver::ResolveError::Unauthorized { .. })
                | CliError::Assets(assetmap::assets::AssetApiError::Unauthorized { .. })
        )
    }
}
