//! Birdeye API - Client HTTP direct
//! Résolution de prix spot pour un ou plusieurs mints

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::types::{BirdeyePrice, BirdeyePriceMap};

const BIRDEYE_API_URL: &str = "https://public-api.birdeye.so";

/// Client Birdeye HTTP
#[derive(Debug, Clone)]
pub struct BirdeyeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MultiPriceResponse {
    #[serde(default)]
    data: Option<HashMap<String, Option<BirdeyePrice>>>,
}

impl BirdeyeClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            base_url: BIRDEYE_API_URL.to_string(),
            api_key,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// Prix spot par mint. Les mints sans prix connu sont absents du
    /// résultat, jamais présents à zéro.
    pub async fn get_prices(&self, addresses: &[String]) -> Result<BirdeyePriceMap> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!(
            "{}/defi/multi_price?list_address={}",
            self.base_url,
            addresses.join(",")
        );

        let response = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("x-chain", "solana")
            .send()
            .await
            .map_err(|e| anyhow!("Erreur HTTP Birdeye: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Birdeye API error {}: {}", status, body));
        }

        let parsed = response
            .json::<MultiPriceResponse>()
            .await
            .map_err(|e| anyhow!("Erreur parsing prix: {}", e))?;

        let data = parsed
            .data
            .ok_or_else(|| anyhow!("Réponse Birdeye sans données"))?;

        Ok(data
            .into_iter()
            .filter_map(|(mint, price)| price.map(|p| (mint, p)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_address_list_no_call() {
        let client = BirdeyeClient::with_base_url(
            Client::new(),
            "key".to_string(),
            // hôte invalide: la requête échouerait si elle partait
            "http://127.0.0.1:1".to_string(),
        );
        let prices = client.get_prices(&[]).await.unwrap();
        assert!(prices.is_empty());
    }

    #[test]
    fn test_multi_price_response_null_entries() {
        let raw = r#"{"data":{"So11111111111111111111111111111111111111112":{"value":142.5},"Unknown":null},"success":true}"#;
        let parsed: MultiPriceResponse = serde_json::from_str(raw).unwrap();
        let data = parsed.data.unwrap();
        assert_eq!(data.len(), 2);
        let resolved: BirdeyePriceMap = data
            .into_iter()
            .filter_map(|(mint, price)| price.map(|p| (mint, p)))
            .collect();
        assert_eq!(resolved.len(), 1);
        assert_eq!(
            resolved["So11111111111111111111111111111111111111112"].value,
            142.5
        );
    }
}
