use super::{schema, Database, DuplicateKey, PokemonFilter};
use crate::services::{Pokemon, PokemonPatch};
use anyhow::{Context, Result};
use arrow_array::RecordBatchIterator;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::{Mutex, RwLock};

const TABLE_NAME: &str = "pokemon";

/// Quote a string literal for a Lance SQL filter
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn filter_sql(filter: &PokemonFilter) -> String {
    match filter {
        PokemonFilter::Id(id) => format!("id = {}", quote(id)),
        PokemonFilter::No(no) => format!("`no` = {}", no),
        PokemonFilter::Name(name) => format!("name = {}", quote(name)),
    }
}

/// Filter selecting every stored record that shares a name or number with
/// any of `candidates`
fn conflict_sql(candidates: &[Pokemon]) -> String {
    let names = candidates
        .iter()
        .map(|p| quote(&p.name))
        .collect::<Vec<_>>()
        .join(", ");
    let numbers = candidates
        .iter()
        .map(|p| p.no.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("name IN ({}) OR `no` IN ({})", names, numbers)
}

/// Duplicate names or numbers inside a single batch
fn batch_duplicate(batch: &[Pokemon]) -> Option<DuplicateKey> {
    let mut names = HashSet::new();
    let mut numbers = HashSet::new();
    for pokemon in batch {
        if !names.insert(pokemon.name.as_str()) {
            return Some(DuplicateKey::name(&pokemon.name));
        }
        if !numbers.insert(pokemon.no) {
            return Some(DuplicateKey::no(pokemon.no));
        }
    }
    None
}

/// LanceDB implementation supporting local paths and S3 URIs.
///
/// LanceDB has no unique indexes, so every write path holds `write_lock`
/// while it checks for conflicting names and numbers and then writes.
pub struct LanceDatabase {
    uri: String,
    connection: RwLock<Option<lancedb::Connection>>,
    write_lock: Mutex<()>,
}

impl LanceDatabase {
    /// Create a new LanceDB instance from a URI (local path or s3://...)
    pub async fn new(uri: &str) -> Result<Self> {
        if !uri.starts_with("s3://") {
            if let Some(parent) = Path::new(uri).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        Ok(Self {
            uri: uri.to_string(),
            connection: RwLock::new(None),
            write_lock: Mutex::new(()),
        })
    }

    /// Initialize the database, creating the table if it doesn't exist
    pub async fn init(&self) -> Result<()> {
        if !self.uri.starts_with("s3://") {
            tokio::fs::create_dir_all(&self.uri)
                .await
                .context("Failed to create database directory")?;
        }

        let db = lancedb::connect(&self.uri)
            .execute()
            .await
            .context("Failed to connect to LanceDB")?;

        let table_names = db.table_names().execute().await?;
        if !table_names.iter().any(|name| name == TABLE_NAME) {
            db.create_empty_table(TABLE_NAME, schema::create_schema())
                .execute()
                .await
                .context("Failed to create pokemon table")?;
            tracing::debug!("Created table {} at {}", TABLE_NAME, self.uri);
        }

        *self.connection.write().await = Some(db);
        Ok(())
    }

    async fn get_connection(&self) -> Result<lancedb::Connection> {
        let conn = self.connection.read().await;
        if let Some(ref db) = *conn {
            return Ok(db.clone());
        }
        drop(conn);

        let db = lancedb::connect(&self.uri)
            .execute()
            .await
            .context("Failed to connect to LanceDB")?;

        *self.connection.write().await = Some(db.clone());
        Ok(db)
    }

    async fn table(&self) -> Result<lancedb::Table> {
        self.get_connection()
            .await?
            .open_table(TABLE_NAME)
            .execute()
            .await
            .context("Failed to open pokemon table")
    }

    /// Run a plain scan and collect matching rows with their sequence
    async fn query(
        &self,
        filter: Option<String>,
        limit: Option<usize>,
    ) -> Result<Vec<(i64, Pokemon)>> {
        let table = self.table().await?;
        let mut query = table.query();

        if let Some(filter) = filter {
            query = query.only_if(filter);
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let mut stream = query.execute().await.context("Failed to query pokemon")?;
        let mut rows = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            rows.extend(schema::batch_to_pokemon(&batch)?);
        }
        Ok(rows)
    }

    /// Records matching `filter`, without their sequence
    async fn matching(&self, filter: String, limit: Option<usize>) -> Result<Vec<Pokemon>> {
        let rows = self.query(Some(filter), limit).await?;
        Ok(rows.into_iter().map(|(_, pokemon)| pokemon).collect())
    }

    /// Must be called with `write_lock` held
    async fn append(&self, batch: &[Pokemon]) -> Result<()> {
        let first_seq = self
            .query(None, None)
            .await?
            .iter()
            .map(|(seq, _)| seq + 1)
            .max()
            .unwrap_or(0);

        let table = self.table().await?;
        let batch = schema::pokemon_to_batch(batch, first_seq)?;
        let schema = batch.schema();

        table
            .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
            .execute()
            .await
            .context("Failed to write pokemon")?;
        Ok(())
    }

    /// Must be called with `write_lock` held
    async fn ensure_unique(&self, candidates: &[Pokemon]) -> Result<()> {
        if let Some(dup) = batch_duplicate(candidates) {
            return Err(dup.into());
        }

        let existing = self.matching(conflict_sql(candidates), None).await?;
        for candidate in candidates {
            if let Some(dup) = DuplicateKey::check(candidate, &existing) {
                return Err(dup.into());
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Database for LanceDatabase {
    async fn insert(&self, pokemon: &Pokemon) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let candidates = std::slice::from_ref(pokemon);
        self.ensure_unique(candidates).await?;
        self.append(candidates).await?;

        tracing::debug!("Inserted pokemon {} (#{})", pokemon.name, pokemon.no);
        Ok(())
    }

    async fn find_one(&self, filter: &PokemonFilter) -> Result<Option<Pokemon>> {
        let found = self.matching(filter_sql(filter), Some(1)).await?;
        Ok(found.into_iter().next())
    }

    async fn find_many(&self, limit: usize, offset: usize) -> Result<Vec<Pokemon>> {
        // Fragment order changes when rows are rewritten, so page by sequence
        let mut rows = self.query(None, None).await?;
        rows.sort_by_key(|(seq, _)| *seq);

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, pokemon)| pokemon)
            .collect())
    }

    async fn update_one(&self, id: &str, patch: &PokemonPatch) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let id_filter = filter_sql(&PokemonFilter::Id(id.to_string()));
        let current = self
            .matching(id_filter.clone(), Some(1))
            .await?
            .into_iter()
            .next()
            .with_context(|| format!("Pokemon '{}' not found", id))?;

        let updated = current.merged(patch);
        self.ensure_unique(std::slice::from_ref(&updated)).await?;

        // Single write; `seq` is untouched so the row keeps its place
        let table = self.table().await?;
        table
            .update()
            .only_if(id_filter)
            .column("name", quote(&updated.name))
            .column("no", updated.no.to_string())
            .execute()
            .await
            .context("Failed to update pokemon")?;

        tracing::debug!("Updated pokemon {}", id);
        Ok(())
    }

    async fn delete_one(&self, id: &str) -> Result<u64> {
        let _guard = self.write_lock.lock().await;

        let table = self.table().await?;
        let filter = filter_sql(&PokemonFilter::Id(id.to_string()));
        let count = table
            .count_rows(Some(filter.clone()))
            .await
            .context("Failed to count pokemon")?;
        if count == 0 {
            return Ok(0);
        }

        table
            .delete(&filter)
            .await
            .context("Failed to delete pokemon")?;

        tracing::debug!("Deleted pokemon {}", id);
        Ok(count as u64)
    }

    async fn delete_all(&self) -> Result<u64> {
        let _guard = self.write_lock.lock().await;

        let table = self.table().await?;
        let count = table
            .count_rows(None)
            .await
            .context("Failed to count pokemon")?;
        if count > 0 {
            table
                .delete("id IS NOT NULL")
                .await
                .context("Failed to delete all pokemon")?;
        }

        tracing::debug!("Deleted {} pokemon", count);
        Ok(count as u64)
    }

    async fn insert_many(&self, batch: &[Pokemon]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        self.ensure_unique(batch).await?;
        self.append(batch).await?;

        tracing::debug!("Inserted batch of {} pokemon", batch.len());
        Ok(())
    }
}
