use super::Project;
use anyhow::Result;
use clap::Args;
use pokedex::services::{NewPokemon, Pagination, PokemonPatch, PokemonService};

#[derive(Args)]
pub struct AddArgs {
    /// Pokemon name (stored lowercased)
    name: String,

    /// Catalog number
    no: i64,
}

#[derive(Args)]
pub struct GetArgs {
    /// Catalog number, id or name
    term: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Maximum number of results (defaults to catalog.default_limit)
    #[arg(long)]
    limit: Option<usize>,

    /// Number of records to skip
    #[arg(long)]
    offset: Option<usize>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Catalog number, id or name
    term: String,

    /// New name
    #[arg(long)]
    name: Option<String>,

    /// New catalog number
    #[arg(long)]
    no: Option<i64>,
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Pokemon id (names and numbers are not resolved)
    id: String,
}

async fn open_service() -> Result<(Project, PokemonService)> {
    let project = Project::open().await?;
    let service = PokemonService::new(project.db.clone());
    Ok((project, service))
}

pub async fn execute_add(args: AddArgs) -> Result<()> {
    let (_, service) = open_service().await?;

    let pokemon = service.create(NewPokemon::new(args.name, args.no)).await?;
    println!("Added pokemon: {}", pokemon.id);
    println!("{}", serde_json::to_string_pretty(&pokemon)?);
    Ok(())
}

pub async fn execute_get(args: GetArgs) -> Result<()> {
    let (_, service) = open_service().await?;

    let pokemon = service.find_one(&args.term).await?;
    println!("{}", serde_json::to_string_pretty(&pokemon)?);
    Ok(())
}

pub async fn execute_list(args: ListArgs) -> Result<()> {
    let (project, service) = open_service().await?;

    let pagination = Pagination::new(args.limit, args.offset);
    let pokemon = service
        .find_all(pagination, project.config.catalog.default_limit)
        .await?;

    println!("Found {} pokemon:", pokemon.len());
    for p in pokemon {
        println!("  #{} {} ({})", p.no, p.name, p.id);
    }
    Ok(())
}

pub async fn execute_update(args: UpdateArgs) -> Result<()> {
    let (_, service) = open_service().await?;

    let patch = PokemonPatch {
        name: args.name,
        no: args.no,
    };
    let pokemon = service.update(&args.term, patch).await?;
    println!("Updated pokemon: {}", pokemon.id);
    println!("{}", serde_json::to_string_pretty(&pokemon)?);
    Ok(())
}

pub async fn execute_remove(args: RemoveArgs) -> Result<()> {
    let (_, service) = open_service().await?;

    service.remove(&args.id).await?;
    println!("Removed pokemon: {}", args.id);
    Ok(())
}
