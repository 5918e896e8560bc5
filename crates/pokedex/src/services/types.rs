use serde::{Deserialize, Serialize};

/// Alphabet for store-assigned ids (no ambiguous characters)
pub const ID_ALPHABET: &[char] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'k', 'm',
    'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Length of a store-assigned id
pub const ID_LENGTH: usize = 10;

/// A catalog record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: String,
    pub name: String,
    pub no: i64,
}

impl Pokemon {
    /// Generate a new 10-character id using the reduced alphabet
    pub fn generate_id() -> String {
        nanoid::nanoid!(10, ID_ALPHABET)
    }

    /// Create a record with a freshly generated id. The name is stored as given.
    pub fn new(name: String, no: i64) -> Self {
        Self {
            id: Self::generate_id(),
            name,
            no,
        }
    }

    /// Whether `candidate` has the shape of a store-assigned id.
    ///
    /// This is a syntactic check only; it says nothing about whether a
    /// record with that id exists.
    pub fn is_valid_id(candidate: &str) -> bool {
        candidate.chars().count() == ID_LENGTH && candidate.chars().all(|c| ID_ALPHABET.contains(&c))
    }

    /// Overlay the supplied patch fields on this record
    pub fn merged(&self, patch: &PokemonPatch) -> Pokemon {
        Pokemon {
            id: self.id.clone(),
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            no: patch.no.unwrap_or(self.no),
        }
    }
}

/// Canonical form of a name as stored
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// Input for creating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPokemon {
    pub name: String,
    pub no: i64,
}

impl NewPokemon {
    pub fn new(name: impl Into<String>, no: i64) -> Self {
        Self {
            name: name.into(),
            no,
        }
    }
}

/// Partial update; only supplied fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no: Option<i64>,
}

impl PokemonPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.no.is_none()
    }
}

/// Page request for listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Pagination {
    pub fn new(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self { limit, offset }
    }
}

/// Configuration for storage backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage URI: local path or s3://bucket/path
    /// Default: ".pokedex/db/pokemon.lance" (relative to project root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Catalog listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Page size used when a list request omits `limit`
    pub default_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { default_limit: 7 }
    }
}

/// Upstream source for seeding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub source_url: String,
    pub limit: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            source_url: "https://pokeapi.co/api/v2/pokemon".to_string(),
            limit: 650,
        }
    }
}

impl SeedConfig {
    /// Listing URL with the page size applied
    pub fn listing_url(&self) -> String {
        format!(
            "{}?limit={}",
            self.source_url.trim_end_matches('/'),
            self.limit
        )
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Project configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PokedexConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub server: ServerConfig,
}
