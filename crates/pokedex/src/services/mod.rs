pub mod config;
pub mod pokemon;
pub mod seed;
pub mod types;

pub use config::ConfigService;
pub use pokemon::PokemonService;
pub use seed::{PokeResponse, SeedReport, SeedService};
pub use types::{
    normalize_name, CatalogConfig, NewPokemon, Pagination, PokedexConfig, Pokemon, PokemonPatch,
    SeedConfig, ServerConfig, StorageConfig, ID_ALPHABET, ID_LENGTH,
};

use crate::db::DuplicateKey;

/// Errors surfaced by the catalog and seed services.
///
/// `Persistence` and `UpstreamFetch` render an opaque message; the source
/// is kept for logging only.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Pokemon already exists in db {key_value}")]
    DuplicateKey { key_value: serde_json::Value },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Storage operation failed, check server logs")]
    Persistence(#[source] anyhow::Error),

    #[error("Upstream catalog fetch failed, check server logs")]
    UpstreamFetch(#[source] anyhow::Error),
}

impl ServiceError {
    /// Classify a store fault: constraint violations become `DuplicateKey`,
    /// anything else is logged and becomes `Persistence`
    pub fn from_store(err: anyhow::Error, action: &str) -> Self {
        if let Some(dup) = err.downcast_ref::<DuplicateKey>() {
            return ServiceError::DuplicateKey {
                key_value: dup.key_value(),
            };
        }
        Self::persistence(err, action)
    }

    /// Log a store fault and wrap it as `Persistence` without classifying it
    pub fn persistence(err: anyhow::Error, action: &str) -> Self {
        tracing::error!("Failed to {}: {:#}", action, err);
        ServiceError::Persistence(err)
    }

    /// Classify an upstream fetch fault
    pub fn from_upstream(err: anyhow::Error) -> Self {
        tracing::error!("Upstream fetch failed: {:#}", err);
        ServiceError::UpstreamFetch(err)
    }

    /// Stable machine-readable kind
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::DuplicateKey { .. } | ServiceError::InvalidRequest(_) => "bad_request",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Persistence(_) | ServiceError::UpstreamFetch(_) => "internal_error",
        }
    }
}
