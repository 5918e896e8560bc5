use super::types::{normalize_name, Pokemon, SeedConfig};
use super::ServiceError;
use crate::db::Database;
use crate::fetch::{self, HttpAdapter};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Paginated listing returned by PokeAPI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokeResponse {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<NamedResource>,
}

/// One `{name, url}` entry of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// Outcome of a successful seed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub message: String,
    pub inserted: usize,
}

/// Catalog number carried by a resource url.
///
/// PokeAPI urls end in `/{no}/`, so the number is the second-to-last
/// slash-delimited segment.
pub fn catalog_number_from_url(url: &str) -> Result<i64> {
    let segments: Vec<&str> = url.split('/').collect();
    let segment = segments
        .len()
        .checked_sub(2)
        .and_then(|i| segments.get(i))
        .with_context(|| format!("No catalog number segment in url '{}'", url))?;

    segment
        .parse::<i64>()
        .with_context(|| format!("Invalid catalog number '{}' in url '{}'", segment, url))
}

/// Service that wipes the catalog and repopulates it from PokeAPI
pub struct SeedService {
    db: Arc<dyn Database>,
    http: Arc<dyn HttpAdapter>,
    config: SeedConfig,
}

impl SeedService {
    pub fn new(db: Arc<dyn Database>, http: Arc<dyn HttpAdapter>, config: SeedConfig) -> Self {
        Self { db, http, config }
    }

    /// Delete every record, fetch the upstream listing and bulk insert it.
    ///
    /// Delete and insert are separate writes; readers can observe an empty
    /// catalog in between, and a failed fetch leaves it empty.
    pub async fn execute_seed(&self) -> Result<SeedReport, ServiceError> {
        let removed = self
            .db
            .delete_all()
            .await
            .map_err(|e| ServiceError::persistence(e, "clear catalog before seeding"))?;
        tracing::info!("Removed {} pokemon before seeding", removed);

        let url = self.config.listing_url();
        let listing: PokeResponse = fetch::get_typed(self.http.as_ref(), &url)
            .await
            .map_err(ServiceError::from_upstream)?;

        let batch = listing
            .results
            .iter()
            .map(|entry| {
                let no = catalog_number_from_url(&entry.url)?;
                Ok(Pokemon::new(normalize_name(&entry.name), no))
            })
            .collect::<Result<Vec<_>>>()
            .map_err(ServiceError::from_upstream)?;

        self.db
            .insert_many(&batch)
            .await
            .map_err(|e| ServiceError::persistence(e, "insert seed batch"))?;

        tracing::info!("Seeded {} pokemon from {}", batch.len(), url);
        Ok(SeedReport {
            message: "Seed executed".to_string(),
            inserted: batch.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PokemonFilter;
    use crate::testing::{StubHttpAdapter, TestDatabase};
    use serde_json::json;

    fn listing(entries: &[(&str, &str)]) -> serde_json::Value {
        let results: Vec<_> = entries
            .iter()
            .map(|(name, url)| json!({"name": name, "url": url}))
            .collect();
        json!({
            "count": 1302,
            "next": "https://pokeapi.co/api/v2/pokemon?offset=650&limit=650",
            "previous": null,
            "results": results,
        })
    }

    fn service(db: Arc<TestDatabase>, http: StubHttpAdapter) -> SeedService {
        SeedService::new(db, Arc::new(http), SeedConfig::default())
    }

    #[test]
    fn catalog_number_from_trailing_slash_url() {
        assert_eq!(
            catalog_number_from_url("https://pokeapi.co/api/v2/pokemon/25/").unwrap(),
            25
        );
    }

    #[test]
    fn catalog_number_requires_integer_segment() {
        // without the trailing slash the second-to-last segment is "pokemon"
        assert!(catalog_number_from_url("https://pokeapi.co/api/v2/pokemon/25").is_err());
        assert!(catalog_number_from_url("25").is_err());
        assert!(catalog_number_from_url("").is_err());
    }

    #[tokio::test]
    async fn seed_inserts_one_record_per_entry() {
        let db = Arc::new(TestDatabase::new());
        let http = StubHttpAdapter::with_json(listing(&[
            ("bulbasaur", "https://pokeapi.co/api/v2/pokemon/1/"),
            ("ivysaur", "https://pokeapi.co/api/v2/pokemon/2/"),
            ("venusaur", "https://pokeapi.co/api/v2/pokemon/3/"),
        ]));

        let report = service(db.clone(), http).execute_seed().await.unwrap();
        assert_eq!(report.inserted, 3);
        assert_eq!(report.message, "Seed executed");

        let stored: Vec<(String, i64)> = db
            .snapshot()
            .into_iter()
            .map(|p| (p.name, p.no))
            .collect();
        assert_eq!(
            stored,
            vec![
                ("bulbasaur".to_string(), 1),
                ("ivysaur".to_string(), 2),
                ("venusaur".to_string(), 3),
            ]
        );
    }

    #[tokio::test]
    async fn seed_requests_configured_listing_url() {
        let db = Arc::new(TestDatabase::new());
        let http = Arc::new(StubHttpAdapter::with_json(listing(&[])));
        let config = SeedConfig {
            source_url: "http://localhost:9999/api/v2/pokemon".to_string(),
            limit: 5,
        };

        SeedService::new(db, http.clone(), config)
            .execute_seed()
            .await
            .unwrap();
        assert_eq!(
            http.requests(),
            vec!["http://localhost:9999/api/v2/pokemon?limit=5".to_string()]
        );
    }

    #[tokio::test]
    async fn seed_replaces_existing_catalog() {
        let db = Arc::new(TestDatabase::with_pokemon(vec![
            Pokemon::new("missingno".to_string(), 0),
            Pokemon::new("bulbasaur".to_string(), 1),
        ]));
        let http = StubHttpAdapter::with_json(listing(&[(
            "bulbasaur",
            "https://pokeapi.co/api/v2/pokemon/1/",
        )]));

        service(db.clone(), http).execute_seed().await.unwrap();

        let stored = db.snapshot();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "bulbasaur");
        assert!(db
            .find_one(&PokemonFilter::Name("missingno".to_string()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn seed_lowercases_upstream_names() {
        let db = Arc::new(TestDatabase::new());
        let http = StubHttpAdapter::with_json(listing(&[(
            "Mr-Mime",
            "https://pokeapi.co/api/v2/pokemon/122/",
        )]));

        service(db.clone(), http).execute_seed().await.unwrap();
        assert_eq!(db.snapshot()[0].name, "mr-mime");
    }

    #[tokio::test]
    async fn seed_fetch_failure_is_upstream_error() {
        let db = Arc::new(TestDatabase::new());
        let http = StubHttpAdapter::failing("connection refused");

        let err = service(db, http).execute_seed().await.unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamFetch(_)));
    }

    #[tokio::test]
    async fn seed_unexpected_shape_is_upstream_error() {
        let db = Arc::new(TestDatabase::new());
        let http = StubHttpAdapter::with_json(json!({"items": []}));

        let err = service(db, http).execute_seed().await.unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamFetch(_)));
    }

    #[tokio::test]
    async fn seed_bad_url_aborts_whole_batch() {
        let db = Arc::new(TestDatabase::new());
        let http = StubHttpAdapter::with_json(listing(&[
            ("bulbasaur", "https://pokeapi.co/api/v2/pokemon/1/"),
            ("broken", "https://pokeapi.co/api/v2/pokemon/abc/"),
        ]));

        let err = service(db.clone(), http).execute_seed().await.unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamFetch(_)));
        assert!(db.snapshot().is_empty());
    }

    #[tokio::test]
    async fn seed_duplicate_upstream_entries_are_persistence_error() {
        let db = Arc::new(TestDatabase::new());
        let http = StubHttpAdapter::with_json(listing(&[
            ("bulbasaur", "https://pokeapi.co/api/v2/pokemon/1/"),
            ("bulbasaur-copy", "https://pokeapi.co/api/v2/pokemon/1/"),
        ]));

        let err = service(db.clone(), http).execute_seed().await.unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));
        assert!(db.snapshot().is_empty());
    }
}
