use anyhow::Result;
use pokedex::db::lance::LanceDatabase;
use pokedex::db::Database;
use pokedex::fetch::{HttpAdapter, ReqwestAdapter};
use pokedex::services::config::resolve_storage_uri;
use pokedex::services::{ConfigService, PokedexConfig, PokemonService, SeedService};
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pokemon_service: Arc<PokemonService>,
    pub seed_service: Arc<SeedService>,
    pub config: PokedexConfig,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, http: Arc<dyn HttpAdapter>, config: PokedexConfig) -> Self {
        let pokemon_service = Arc::new(PokemonService::new(db.clone()));
        let seed_service = Arc::new(SeedService::new(db, http, config.seed.clone()));

        Self {
            pokemon_service,
            seed_service,
            config,
        }
    }

    pub async fn from_env() -> Result<Self> {
        let config = ConfigService::from_env()?;
        let storage_uri = resolve_storage_uri(&config, Path::new("."));

        let lance_db = LanceDatabase::new(&storage_uri).await?;
        lance_db.init().await?;
        tracing::info!("Opened catalog at {}", storage_uri);

        let db: Arc<dyn Database> = Arc::new(lance_db);
        let http: Arc<dyn HttpAdapter> = Arc::new(ReqwestAdapter::new());

        Ok(Self::new(db, http, config))
    }

    /// Page size for list requests without a limit
    pub fn default_limit(&self) -> usize {
        self.config.catalog.default_limit
    }
}
