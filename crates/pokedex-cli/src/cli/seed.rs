use super::Project;
use anyhow::Result;
use clap::Args;
use pokedex::fetch::ReqwestAdapter;
use pokedex::services::SeedService;
use std::sync::Arc;

#[derive(Args)]
pub struct SeedArgs {
    /// Override the upstream listing url
    #[arg(long)]
    source_url: Option<String>,

    /// Override the number of entries requested
    #[arg(long)]
    limit: Option<usize>,
}

pub async fn execute(args: SeedArgs) -> Result<()> {
    let project = Project::open().await?;

    let mut seed_config = project.config.seed.clone();
    if let Some(source_url) = args.source_url {
        seed_config.source_url = source_url;
    }
    if let Some(limit) = args.limit {
        seed_config.limit = limit;
    }

    tracing::info!("Seeding from {}", seed_config.listing_url());
    let service = SeedService::new(project.db, Arc::new(ReqwestAdapter::new()), seed_config);
    let report = service.execute_seed().await?;

    println!("{} ({} pokemon)", report.message, report.inserted);
    Ok(())
}
