//! Client de l'API pools/PnL arena (listing externe, passthrough)

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::types::{ArenaPool, PnlData, PnlDataMap};

/// Client HTTP du service pools/analytics
#[derive(Debug, Clone)]
pub struct ArenaApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct PoolsResponse {
    data: Vec<ArenaPool>,
}

#[derive(Debug, Deserialize)]
struct PnlResponse {
    data: PnlPools,
}

#[derive(Debug, Deserialize)]
struct PnlPools {
    #[serde(default)]
    pools: HashMap<String, PnlData>,
}

impl ArenaApiClient {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// Liste complète des pools arena. Les pools sans group sont écartés.
    pub async fn list_pools(&self) -> Result<Vec<ArenaPool>> {
        let url = format!("{}/arena/pools", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| anyhow!("Erreur HTTP pools: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow!("Pools API error {}", status));
        }

        let parsed = response
            .json::<PoolsResponse>()
            .await
            .map_err(|e| anyhow!("Erreur parsing pools: {}", e))?;

        Ok(parsed
            .data
            .into_iter()
            .filter(|pool| !pool.group.is_empty())
            .collect())
    }

    /// PnL par group pour un wallet. L'absence d'entrée pour un group
    /// laisse le PnL indéfini côté appelant.
    pub async fn pnl_for_wallet(&self, wallet: &str) -> Result<PnlDataMap> {
        let url = format!("{}/arena/pnl/{}", self.base_url, wallet);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| anyhow!("Erreur HTTP pnl: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow!("PnL API error {}", status));
        }

        let parsed = response
            .json::<PnlResponse>()
            .await
            .map_err(|e| anyhow!("Erreur parsing pnl: {}", e))?;

        Ok(parsed.data.pools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pools_response_filters_missing_group() {
        let raw = r#"{"data":[
            {"group":"G1","base_bank":{"address":"B1","mint":{"address":"M1","decimals":9,"name":"Tok","symbol":"TOK"}},"quote_bank":{"address":"Q1","mint":{"address":"M2","decimals":6,"name":"USDC","symbol":"USDC"}},"featured":true,"created_at":"2024-01-01","created_by":"C1","lookup_tables":["L1"]},
            {"group":"","base_bank":{"address":"B2","mint":{"address":"M3","decimals":9,"name":null,"symbol":null}},"quote_bank":{"address":"Q2","mint":{"address":"M4","decimals":6,"name":null,"symbol":null}}}
        ]}"#;
        let parsed: PoolsResponse = serde_json::from_str(raw).unwrap();
        let pools: Vec<ArenaPool> = parsed
            .data
            .into_iter()
            .filter(|p| !p.group.is_empty())
            .collect();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].group, "G1");
        assert!(pools[0].featured);
        assert_eq!(pools[0].base_bank.mint.symbol.as_deref(), Some("TOK"));
    }

    #[test]
    fn test_pnl_response_shape() {
        let raw = r#"{"data":{"pools":{"G1":{"total_pnl_usd":12.5,"realized_pnl_usd":10.0,"unrealized_pnl_usd":2.5}}}}"#;
        let parsed: PnlResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.pools["G1"].total_pnl_usd, 12.5);
        assert!(!parsed.data.pools.contains_key("G2"));
    }
}
