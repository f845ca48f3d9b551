//! Chargement des caches de métadonnées de banks (standard + staked)

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::types::{BankMetadata, BankMetadataMap};

pub const BANK_METADATA_URL: &str =
    "https://storage.googleapis.com/mrgn-public/mrgn-bank-metadata-cache.json";
pub const STAKED_BANK_METADATA_URL: &str =
    "https://storage.googleapis.com/mrgn-public/mrgn-staked-bank-metadata-cache.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BankMetadataEntry {
    bank_address: String,
    token_address: String,
    #[serde(default)]
    token_name: String,
    token_symbol: String,
}

/// Charge un cache de métadonnées, indexé par adresse de bank
pub async fn load_bank_metadatas(client: &Client, url: &str) -> Result<BankMetadataMap> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| anyhow!("Erreur HTTP métadonnées: {}", e))?;

    if !response.status().is_success() {
        return Err(anyhow!("Métadonnées error {}", response.status()));
    }

    let entries = response
        .json::<Vec<BankMetadataEntry>>()
        .await
        .map_err(|e| anyhow!("Erreur parsing métadonnées: {}", e))?;

    Ok(entries
        .into_iter()
        .map(|entry| {
            (
                entry.bank_address,
                BankMetadata {
                    token_address: entry.token_address,
                    token_name: entry.token_name,
                    token_symbol: entry.token_symbol,
                },
            )
        })
        .collect())
}

/// Cache standard + cache staked fusionnés (le staked écrase en cas de
/// collision, comme le spread côté front)
pub async fn load_combined_metadatas(client: &Client) -> Result<BankMetadataMap> {
    let (standard, staked) = tokio::try_join!(
        load_bank_metadatas(client, BANK_METADATA_URL),
        load_bank_metadatas(client, STAKED_BANK_METADATA_URL),
    )?;

    let mut combined = standard;
    combined.extend(staked);
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_entry_shape() {
        let raw = r#"[{"bankAddress":"Bank1","tokenAddress":"Mint1","tokenName":"Solana","tokenSymbol":"SOL"},
                      {"bankAddress":"Bank2","tokenAddress":"Mint2","tokenSymbol":"USDC"}]"#;
        let entries: Vec<BankMetadataEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].token_symbol, "SOL");
        assert_eq!(entries[1].token_name, "");
    }
}
