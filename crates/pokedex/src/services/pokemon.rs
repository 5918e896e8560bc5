use super::types::{normalize_name, NewPokemon, Pagination, Pokemon, PokemonPatch};
use super::ServiceError;
use crate::db::{Database, PokemonFilter};
use std::sync::Arc;

/// Turns a lookup term into a store filter, or `None` when the term does
/// not have the shape this resolver handles
type Resolver = fn(&str) -> Option<PokemonFilter>;

fn by_catalog_number(term: &str) -> Option<PokemonFilter> {
    term.trim().parse::<i64>().ok().map(PokemonFilter::No)
}

fn by_native_id(term: &str) -> Option<PokemonFilter> {
    Pokemon::is_valid_id(term).then(|| PokemonFilter::Id(term.to_string()))
}

fn by_name(term: &str) -> Option<PokemonFilter> {
    Some(PokemonFilter::Name(term.to_lowercase().trim().to_string()))
}

/// Lookup strategies in priority order. The next one runs only when every
/// earlier one matched nothing.
const RESOLVERS: [Resolver; 3] = [by_catalog_number, by_native_id, by_name];

fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::InvalidRequest(
            "name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_no(no: i64) -> Result<(), ServiceError> {
    if no < 1 {
        return Err(ServiceError::InvalidRequest(format!(
            "no must be a positive integer, got {}",
            no
        )));
    }
    Ok(())
}

/// Service for catalog CRUD operations
pub struct PokemonService {
    db: Arc<dyn Database>,
}

impl PokemonService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Add a new record. The name is stored lowercased.
    pub async fn create(&self, input: NewPokemon) -> Result<Pokemon, ServiceError> {
        validate_name(&input.name)?;
        validate_no(input.no)?;

        let pokemon = Pokemon::new(normalize_name(&input.name), input.no);
        self.db
            .insert(&pokemon)
            .await
            .map_err(|e| ServiceError::from_store(e, "create pokemon"))?;

        Ok(pokemon)
    }

    /// One page of records in store order.
    ///
    /// `default_limit` applies when the request carries no limit. No total
    /// count is returned.
    pub async fn find_all(
        &self,
        pagination: Pagination,
        default_limit: usize,
    ) -> Result<Vec<Pokemon>, ServiceError> {
        let limit = pagination.limit.unwrap_or(default_limit);
        if limit == 0 {
            return Err(ServiceError::InvalidRequest(
                "limit must be at least 1".to_string(),
            ));
        }
        let offset = pagination.offset.unwrap_or(0);

        self.db
            .find_many(limit, offset)
            .await
            .map_err(|e| ServiceError::from_store(e, "list pokemon"))
    }

    /// Resolve `term` as a catalog number, then a native id, then a name
    pub async fn find_one(&self, term: &str) -> Result<Pokemon, ServiceError> {
        self.resolve(term).await?.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Pokemon with id, name or no \"{}\" not found",
                term
            ))
        })
    }

    async fn resolve(&self, term: &str) -> Result<Option<Pokemon>, ServiceError> {
        for resolver in RESOLVERS {
            let Some(filter) = resolver(term) else {
                continue;
            };
            let found = self
                .db
                .find_one(&filter)
                .await
                .map_err(|e| ServiceError::from_store(e, "look up pokemon"))?;
            if found.is_some() {
                tracing::debug!("Resolved '{}' via {:?}", term, filter);
                return Ok(found);
            }
        }
        Ok(None)
    }

    /// Apply a partial update to the record `term` resolves to.
    ///
    /// Returns the stored record overlaid with the patch.
    pub async fn update(
        &self,
        term: &str,
        mut patch: PokemonPatch,
    ) -> Result<Pokemon, ServiceError> {
        let pokemon = self.find_one(term).await?;

        if let Some(name) = patch.name.as_deref() {
            validate_name(name)?;
            patch.name = Some(normalize_name(name));
        }
        if let Some(no) = patch.no {
            validate_no(no)?;
        }

        if !patch.is_empty() {
            self.db
                .update_one(&pokemon.id, &patch)
                .await
                .map_err(|e| ServiceError::from_store(e, "update pokemon"))?;
        }

        Ok(pokemon.merged(&patch))
    }

    /// Delete by exact native id. Names and catalog numbers are not resolved.
    pub async fn remove(&self, id: &str) -> Result<(), ServiceError> {
        let deleted = self
            .db
            .delete_one(id)
            .await
            .map_err(|e| ServiceError::from_store(e, "delete pokemon"))?;

        if deleted == 0 {
            return Err(ServiceError::InvalidRequest(format!(
                "Pokemon with id {} does not exist",
                id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestDatabase;

    fn stored(id: &str, name: &str, no: i64) -> Pokemon {
        Pokemon {
            id: id.to_string(),
            name: name.to_string(),
            no,
        }
    }

    fn service_with(records: Vec<Pokemon>) -> (Arc<TestDatabase>, PokemonService) {
        let db = Arc::new(TestDatabase::with_pokemon(records));
        let service = PokemonService::new(db.clone());
        (db, service)
    }

    mod resolvers {
        use super::*;

        #[test]
        fn catalog_number_accepts_integers_only() {
            assert_eq!(by_catalog_number("25"), Some(PokemonFilter::No(25)));
            assert_eq!(by_catalog_number(" 25 "), Some(PokemonFilter::No(25)));
            assert_eq!(by_catalog_number("25.5"), None);
            assert_eq!(by_catalog_number("pikachu"), None);
            assert_eq!(by_catalog_number(""), None);
        }

        #[test]
        fn native_id_requires_id_shape() {
            assert_eq!(
                by_native_id("abcdefghjk"),
                Some(PokemonFilter::Id("abcdefghjk".to_string()))
            );
            assert_eq!(by_native_id("pikachu"), None);
        }

        #[test]
        fn name_is_lowercased_and_trimmed() {
            assert_eq!(
                by_name("  PikaChu "),
                Some(PokemonFilter::Name("pikachu".to_string()))
            );
        }
    }

    #[tokio::test]
    async fn create_lowercases_name() {
        let (_, service) = service_with(vec![]);

        let created = service
            .create(NewPokemon::new("PIKACHU", 25))
            .await
            .unwrap();
        assert_eq!(created.name, "pikachu");

        let found = service.find_one("pikachu").await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_number_and_keeps_existing() {
        let (db, service) = service_with(vec![stored("aaaaaaaaaa", "bulbasaur", 1)]);

        let err = service
            .create(NewPokemon::new("ivysaur", 1))
            .await
            .unwrap_err();
        match err {
            ServiceError::DuplicateKey { key_value } => {
                assert_eq!(key_value, serde_json::json!({"no": 1}))
            },
            other => panic!("expected DuplicateKey, got {:?}", other),
        }

        assert_eq!(db.snapshot(), vec![stored("aaaaaaaaaa", "bulbasaur", 1)]);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name_regardless_of_case() {
        let (_, service) = service_with(vec![stored("aaaaaaaaaa", "bulbasaur", 1)]);

        let err = service
            .create(NewPokemon::new("Bulbasaur", 2))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let (db, service) = service_with(vec![]);

        let blank = service.create(NewPokemon::new("   ", 1)).await;
        assert!(matches!(blank, Err(ServiceError::InvalidRequest(_))));

        let zero = service.create(NewPokemon::new("missingno", 0)).await;
        assert!(matches!(zero, Err(ServiceError::InvalidRequest(_))));

        assert!(db.snapshot().is_empty());
    }

    #[tokio::test]
    async fn create_surfaces_store_faults_as_persistence() {
        let db = Arc::new(TestDatabase::failing());
        let service = PokemonService::new(db);

        let err = service
            .create(NewPokemon::new("pikachu", 25))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));
    }

    #[tokio::test]
    async fn find_one_resolves_number_id_and_name_to_same_record() {
        let (_, service) = service_with(vec![]);
        let created = service
            .create(NewPokemon::new("charmander", 4))
            .await
            .unwrap();

        assert_eq!(service.find_one("4").await.unwrap(), created);
        assert_eq!(service.find_one(&created.id).await.unwrap(), created);
        assert_eq!(service.find_one("Charmander").await.unwrap(), created);
    }

    #[tokio::test]
    async fn find_one_prefers_number_over_id() {
        // "2345678923" is both an integer and a well-formed id
        let (_, service) = service_with(vec![
            stored("2345678923", "by-id", 7),
            stored("bbbbbbbbbb", "by-number", 2345678923),
        ]);

        let found = service.find_one("2345678923").await.unwrap();
        assert_eq!(found.name, "by-number");
    }

    #[tokio::test]
    async fn find_one_falls_back_to_id_on_number_miss() {
        let (_, service) = service_with(vec![
            stored("2345678923", "by-id", 7),
            stored("bbbbbbbbbb", "2345678923", 8),
        ]);

        let found = service.find_one("2345678923").await.unwrap();
        assert_eq!(found.name, "by-id");
    }

    #[tokio::test]
    async fn find_one_falls_back_to_name_on_number_and_id_miss() {
        let (_, service) = service_with(vec![stored("bbbbbbbbbb", "2345678923", 8)]);

        let found = service.find_one("2345678923").await.unwrap();
        assert_eq!(found.no, 8);
    }

    #[tokio::test]
    async fn find_one_reports_not_found() {
        let (_, service) = service_with(vec![stored("aaaaaaaaaa", "bulbasaur", 1)]);

        let err = service.find_one("nonexistent").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(err.to_string().contains("nonexistent"));
    }

    #[tokio::test]
    async fn find_all_applies_limit_and_offset() {
        let records: Vec<Pokemon> = (1..=20)
            .map(|no| Pokemon::new(format!("pokemon-{}", no), no))
            .collect();
        let (_, service) = service_with(records);

        let page = service
            .find_all(Pagination::new(Some(10), Some(5)), 7)
            .await
            .unwrap();
        let numbers: Vec<i64> = page.iter().map(|p| p.no).collect();
        assert_eq!(numbers, (6..=15).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn find_all_uses_default_limit() {
        let records: Vec<Pokemon> = (1..=20)
            .map(|no| Pokemon::new(format!("pokemon-{}", no), no))
            .collect();
        let (_, service) = service_with(records);

        let page = service.find_all(Pagination::default(), 7).await.unwrap();
        assert_eq!(page.len(), 7);
        assert_eq!(page[0].no, 1);
    }

    #[tokio::test]
    async fn find_all_rejects_zero_limit() {
        let (_, service) = service_with(vec![]);

        let result = service.find_all(Pagination::new(Some(0), None), 7).await;
        assert!(matches!(result, Err(ServiceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn update_merges_patch_over_stored_record() {
        let (db, service) = service_with(vec![stored("aaaaaaaaaa", "bulbasaur", 1)]);

        let patch = PokemonPatch {
            name: Some("IvySaur".to_string()),
            no: None,
        };
        let updated = service.update("1", patch).await.unwrap();

        assert_eq!(updated, stored("aaaaaaaaaa", "ivysaur", 1));
        assert_eq!(db.snapshot(), vec![stored("aaaaaaaaaa", "ivysaur", 1)]);
    }

    #[tokio::test]
    async fn update_with_empty_patch_returns_record() {
        let (_, service) = service_with(vec![stored("aaaaaaaaaa", "bulbasaur", 1)]);

        let updated = service
            .update("bulbasaur", PokemonPatch::default())
            .await
            .unwrap();
        assert_eq!(updated, stored("aaaaaaaaaa", "bulbasaur", 1));
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let (_, service) = service_with(vec![]);

        let result = service.update("mew", PokemonPatch::default()).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_collision_is_duplicate_key() {
        let (db, service) = service_with(vec![
            stored("aaaaaaaaaa", "bulbasaur", 1),
            stored("bbbbbbbbbb", "ivysaur", 2),
        ]);

        let patch = PokemonPatch {
            name: Some("ivysaur".to_string()),
            no: None,
        };
        let err = service.update("1", patch).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey { .. }));
        assert_eq!(db.snapshot()[0].name, "bulbasaur");
    }

    #[tokio::test]
    async fn remove_deletes_existing_record() {
        let (_, service) = service_with(vec![stored("aaaaaaaaaa", "bulbasaur", 1)]);

        service.remove("aaaaaaaaaa").await.unwrap();

        let err = service.find_one("aaaaaaaaaa").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_missing_id_is_invalid_request() {
        let (_, service) = service_with(vec![]);

        let err = service.remove("aaaaaaaaaa").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn remove_does_not_resolve_names_or_numbers() {
        let (db, service) = service_with(vec![stored("aaaaaaaaaa", "bulbasaur", 1)]);

        assert!(service.remove("bulbasaur").await.is_err());
        assert!(service.remove("1").await.is_err());
        assert_eq!(db.snapshot().len(), 1);
    }
}
