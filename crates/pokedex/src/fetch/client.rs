use super::HttpAdapter;
use anyhow::{Context, Result};

/// `HttpAdapter` backed by a shared reqwest client
#[derive(Clone, Default)]
pub struct ReqwestAdapter {
    client: reqwest::Client,
}

impl ReqwestAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl HttpAdapter for ReqwestAdapter {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("GET {} failed with {}: {}", url, status, text));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON from {}", url))
    }
}
