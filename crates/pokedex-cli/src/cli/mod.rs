mod config;
mod init;
mod pokemon;
mod seed;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pokedex::db::lance::LanceDatabase;
use pokedex::db::Database;
use pokedex::services::{ConfigService, PokedexConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pokedex")]
#[command(about = "Pokemon catalog with PokeAPI seeding", long_about = None)]
pub struct Cli {
    /// Enable verbose output (info logs)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new pokedex project
    Init(init::InitArgs),

    /// Add a new pokemon
    Add(pokemon::AddArgs),

    /// Get a pokemon by catalog number, id or name
    Get(pokemon::GetArgs),

    /// List pokemon
    List(pokemon::ListArgs),

    /// Update a pokemon
    Update(pokemon::UpdateArgs),

    /// Remove a pokemon by id
    Remove(pokemon::RemoveArgs),

    /// Replace the catalog with the PokeAPI listing
    Seed(seed::SeedArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

/// Execute the CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init(args) => init::execute(args).await,
        Commands::Add(args) => pokemon::execute_add(args).await,
        Commands::Get(args) => pokemon::execute_get(args).await,
        Commands::List(args) => pokemon::execute_list(args).await,
        Commands::Update(args) => pokemon::execute_update(args).await,
        Commands::Remove(args) => pokemon::execute_remove(args).await,
        Commands::Seed(args) => seed::execute(args).await,
        Commands::Config(args) => config::execute(args).await,
    }
}

/// Configuration and store of the project in the current directory
pub(crate) struct Project {
    pub config: PokedexConfig,
    pub db: Arc<dyn Database>,
}

impl Project {
    pub async fn open() -> Result<Self> {
        let project_root = PathBuf::from(".");
        let config_service = ConfigService::new(&project_root);

        if !config_service.exists() {
            return Err(anyhow::anyhow!(
                "Pokedex not initialized. Run 'pokedex init' first."
            ));
        }

        let config = config_service.load()?;
        let storage_uri = config_service.resolve_storage_uri(&project_root)?;
        tracing::debug!("Opening store at {}", storage_uri);
        let lance_db = LanceDatabase::new(&storage_uri).await?;
        lance_db.init().await?;

        Ok(Self {
            config,
            db: Arc::new(lance_db),
        })
    }
}
