mod client;

pub use client::ReqwestAdapter;

use anyhow::{Context, Result};

/// Trait for fetching JSON documents over HTTP
#[async_trait::async_trait]
pub trait HttpAdapter: Send + Sync {
    /// GET `url` and return the decoded JSON body.
    ///
    /// Non-success statuses are errors. Callers deserialize the value into
    /// the shape they expect.
    async fn get_json(&self, url: &str) -> Result<serde_json::Value>;
}

/// Fetch `url` and deserialize the body into `T`
pub async fn get_typed<T>(http: &dyn HttpAdapter, url: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let value = http.get_json(url).await?;
    serde_json::from_value(value)
        .with_context(|| format!("Unexpected response shape from {}", url))
}
