//! Test utilities for the pokedex crate
//!
//! This module provides reusable test doubles for unit and integration testing.
//! It includes in-memory implementations of the `Database` and `HttpAdapter` traits.

use crate::db::{Database, DuplicateKey, PokemonFilter};
use crate::fetch::HttpAdapter;
use crate::services::{Pokemon, PokemonPatch};
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Mutex;

/// In-memory database implementation for testing.
///
/// Keeps insertion order as store order and enforces the same uniqueness
/// rules as the real store.
pub struct TestDatabase {
    pokemon: Mutex<Vec<Pokemon>>,
    fail: bool,
}

impl TestDatabase {
    pub fn new() -> Self {
        Self {
            pokemon: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Preload records without constraint checks
    pub fn with_pokemon(pokemon: Vec<Pokemon>) -> Self {
        Self {
            pokemon: Mutex::new(pokemon),
            fail: false,
        }
    }

    /// A database whose every operation fails with a storage fault
    pub fn failing() -> Self {
        Self {
            pokemon: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Current contents in store order
    pub fn snapshot(&self) -> Vec<Pokemon> {
        self.pokemon.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<()> {
        if self.fail {
            return Err(anyhow::anyhow!("simulated storage fault"));
        }
        Ok(())
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Database for TestDatabase {
    async fn insert(&self, pokemon: &Pokemon) -> Result<()> {
        self.check_available()?;
        let mut stored = self.pokemon.lock().unwrap();
        if let Some(dup) = DuplicateKey::check(pokemon, stored.iter()) {
            return Err(dup.into());
        }
        stored.push(pokemon.clone());
        Ok(())
    }

    async fn find_one(&self, filter: &PokemonFilter) -> Result<Option<Pokemon>> {
        self.check_available()?;
        Ok(self
            .pokemon
            .lock()
            .unwrap()
            .iter()
            .find(|p| filter.matches(p))
            .cloned())
    }

    async fn find_many(&self, limit: usize, offset: usize) -> Result<Vec<Pokemon>> {
        self.check_available()?;
        Ok(self
            .pokemon
            .lock()
            .unwrap()
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_one(&self, id: &str, patch: &PokemonPatch) -> Result<()> {
        self.check_available()?;
        let mut stored = self.pokemon.lock().unwrap();
        let index = stored
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| anyhow::anyhow!("Pokemon '{}' not found", id))?;

        let updated = stored[index].merged(patch);
        if let Some(dup) = DuplicateKey::check(&updated, stored.iter()) {
            return Err(dup.into());
        }
        stored[index] = updated;
        Ok(())
    }

    async fn delete_one(&self, id: &str) -> Result<u64> {
        self.check_available()?;
        let mut stored = self.pokemon.lock().unwrap();
        let before = stored.len();
        stored.retain(|p| p.id != id);
        Ok((before - stored.len()) as u64)
    }

    async fn delete_all(&self) -> Result<u64> {
        self.check_available()?;
        let mut stored = self.pokemon.lock().unwrap();
        let count = stored.len() as u64;
        stored.clear();
        Ok(count)
    }

    async fn insert_many(&self, batch: &[Pokemon]) -> Result<()> {
        self.check_available()?;
        let mut stored = self.pokemon.lock().unwrap();

        let mut names = HashSet::new();
        let mut numbers = HashSet::new();
        for pokemon in batch {
            if !names.insert(pokemon.name.as_str()) {
                return Err(DuplicateKey::name(&pokemon.name).into());
            }
            if !numbers.insert(pokemon.no) {
                return Err(DuplicateKey::no(pokemon.no).into());
            }
            if let Some(dup) = DuplicateKey::check(pokemon, stored.iter()) {
                return Err(dup.into());
            }
        }

        stored.extend_from_slice(batch);
        Ok(())
    }
}

/// Canned `HttpAdapter` that records every requested url
pub struct StubHttpAdapter {
    response: std::result::Result<serde_json::Value, String>,
    requests: Mutex<Vec<String>>,
}

impl StubHttpAdapter {
    /// Respond to every request with `value`
    pub fn with_json(value: serde_json::Value) -> Self {
        Self {
            response: Ok(value),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Urls requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpAdapter for StubHttpAdapter {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        self.requests.lock().unwrap().push(url.to_string());
        self.response
            .clone()
            .map_err(|message| anyhow::anyhow!("GET {} failed: {}", url, message))
    }
}
