pub mod lance;
pub mod schema;

use crate::services::{Pokemon, PokemonPatch};
use anyhow::Result;
use serde_json::Value;

/// Single-field lookup understood by every store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PokemonFilter {
    Id(String),
    No(i64),
    Name(String),
}

impl PokemonFilter {
    pub fn matches(&self, pokemon: &Pokemon) -> bool {
        match self {
            PokemonFilter::Id(id) => pokemon.id == *id,
            PokemonFilter::No(no) => pokemon.no == *no,
            PokemonFilter::Name(name) => pokemon.name == *name,
        }
    }
}

/// Unique-constraint violation raised by a store.
///
/// Stores return it wrapped in `anyhow::Error`; callers recover it with
/// `downcast_ref`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("duplicate key {field}: {value}")]
pub struct DuplicateKey {
    pub field: &'static str,
    pub value: Value,
}

impl DuplicateKey {
    pub fn name(name: &str) -> Self {
        Self {
            field: "name",
            value: Value::from(name),
        }
    }

    pub fn no(no: i64) -> Self {
        Self {
            field: "no",
            value: Value::from(no),
        }
    }

    /// The offending key and value as a JSON object, e.g. `{"no":25}`
    pub fn key_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(self.field.to_string(), self.value.clone());
        Value::Object(map)
    }

    /// First constraint `candidate` would violate against `existing`.
    ///
    /// Records sharing the candidate's id are skipped so updates do not
    /// collide with themselves.
    pub fn check<'a>(
        candidate: &Pokemon,
        existing: impl IntoIterator<Item = &'a Pokemon>,
    ) -> Option<Self> {
        for other in existing {
            if other.id == candidate.id {
                continue;
            }
            if other.name == candidate.name {
                return Some(Self::name(&candidate.name));
            }
            if other.no == candidate.no {
                return Some(Self::no(candidate.no));
            }
        }
        None
    }
}

/// Database trait for catalog storage.
///
/// Implementations enforce uniqueness of `name` and `no` and report
/// violations as [`DuplicateKey`].
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    /// Insert a new record
    async fn insert(&self, pokemon: &Pokemon) -> Result<()>;

    /// Get the first record matching the filter
    async fn find_one(&self, filter: &PokemonFilter) -> Result<Option<Pokemon>>;

    /// List records in store order
    async fn find_many(&self, limit: usize, offset: usize) -> Result<Vec<Pokemon>>;

    /// Apply a partial update to the record with the given id
    async fn update_one(&self, id: &str, patch: &PokemonPatch) -> Result<()>;

    /// Delete by exact id, returning the number of deleted records
    async fn delete_one(&self, id: &str) -> Result<u64>;

    /// Delete every record, returning the number of deleted records
    async fn delete_all(&self) -> Result<u64>;

    /// Insert a batch in a single write; nothing is written if any record
    /// violates a constraint
    async fn insert_many(&self, batch: &[Pokemon]) -> Result<()>;
}
