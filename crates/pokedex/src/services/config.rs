use super::types::PokedexConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "POKEDEX_";

/// Service for configuration management
pub struct ConfigService {
    config_path: PathBuf,
}

impl ConfigService {
    /// Create a new config service
    pub fn new(project_root: &Path) -> Self {
        let config_path = project_root.join(".pokedex").join("config.toml");
        Self { config_path }
    }

    /// Initialize configuration with defaults
    pub fn init(&self) -> Result<PokedexConfig> {
        let config = PokedexConfig::default();
        self.save(&config)?;
        Ok(config)
    }

    /// Load configuration from file, with env var overrides (POKEDEX_ prefix, __ separator)
    pub fn load(&self) -> Result<PokedexConfig> {
        let mut figment = Figment::from(Serialized::defaults(PokedexConfig::default()));

        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment.extract().context("Failed to load configuration")
    }

    /// Load defaults and the config file without env overrides, for writes
    fn load_file(&self) -> Result<PokedexConfig> {
        let mut figment = Figment::from(Serialized::defaults(PokedexConfig::default()));
        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }
        figment.extract().context("Failed to load configuration")
    }

    /// Load configuration from defaults and environment only
    pub fn from_env() -> Result<PokedexConfig> {
        Figment::from(Serialized::defaults(PokedexConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to load configuration")
    }

    /// Save configuration to file
    pub fn save(&self, config: &PokedexConfig) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        std::fs::write(&self.config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Get a configuration value by dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.load()?;
        match key {
            "storage.uri" => Ok(config.storage.uri.unwrap_or_default()),
            "catalog.default_limit" => Ok(config.catalog.default_limit.to_string()),
            "seed.source_url" => Ok(config.seed.source_url),
            "seed.limit" => Ok(config.seed.limit.to_string()),
            "server.bind" => Ok(config.server.bind),
            _ => Err(anyhow::anyhow!("Unknown config key: {}", key)),
        }
    }

    /// Set a configuration value by dotted key
    pub fn set(&self, key: &str, value: String) -> Result<()> {
        let mut config = self.load_file()?;
        match key {
            "storage.uri" => config.storage.uri = Some(value),
            "catalog.default_limit" => {
                config.catalog.default_limit = parse_count(key, &value)?;
            },
            "seed.source_url" => config.seed.source_url = value,
            "seed.limit" => config.seed.limit = parse_count(key, &value)?,
            "server.bind" => config.server.bind = value,
            _ => return Err(anyhow::anyhow!("Unknown config key: {}", key)),
        }
        self.save(&config)
    }

    /// Resolve the storage URI from config, defaulting to local path
    pub fn resolve_storage_uri(&self, project_root: &Path) -> Result<String> {
        let config = self.load()?;
        Ok(resolve_storage_uri(&config, project_root))
    }

    /// Check if configuration exists
    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }
}

/// Storage URI for `config`, with relative paths anchored at `project_root`
pub fn resolve_storage_uri(config: &PokedexConfig, project_root: &Path) -> String {
    match &config.storage.uri {
        Some(uri) if uri.starts_with("s3://") => uri.clone(),
        Some(uri) => project_root.join(uri).to_string_lossy().to_string(),
        None => project_root
            .join(".pokedex")
            .join("db")
            .join("pokemon.lance")
            .to_string_lossy()
            .to_string(),
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    let count: usize = value
        .parse()
        .with_context(|| format!("{} must be a positive integer, got '{}'", key, value))?;
    if count == 0 {
        return Err(anyhow::anyhow!("{} must be at least 1", key));
    }
    Ok(count)
}
