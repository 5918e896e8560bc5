use anyhow::Result;
use clap::Args;
use pokedex::db::lance::LanceDatabase;
use pokedex::services::{ConfigService, PokedexConfig};
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Page size used when `list` is called without --limit
    #[arg(long)]
    default_limit: Option<usize>,

    /// Project root directory
    #[arg(default_value = ".")]
    path: PathBuf,
}

pub async fn execute(args: InitArgs) -> Result<()> {
    let project_root = args.path;
    let config_service = ConfigService::new(&project_root);

    let config = if config_service.exists() {
        if args.default_limit.is_some() {
            return Err(anyhow::anyhow!(
                "Pokedex already initialized; use 'pokedex config set catalog.default_limit' instead"
            ));
        }
        println!("Pokedex already initialized, keeping existing config");
        config_service.load()?
    } else {
        match args.default_limit {
            Some(0) => return Err(anyhow::anyhow!("--default-limit must be at least 1")),
            Some(limit) => {
                let mut config = PokedexConfig::default();
                config.catalog.default_limit = limit;
                config_service.save(&config)?;
                config
            },
            None => config_service.init()?,
        }
    };

    let storage_uri = config_service.resolve_storage_uri(&project_root)?;
    let db = LanceDatabase::new(&storage_uri).await?;
    db.init().await?;

    println!("Initialized pokedex project at {}", project_root.display());
    println!("  Storage: {}", storage_uri);
    println!("  Default page size: {}", config.catalog.default_limit);
    println!("  Seed source: {}", config.seed.listing_url());

    Ok(())
}
