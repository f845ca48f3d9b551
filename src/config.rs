//! Configuration du serveur explorer
//! Gère le chargement depuis .env et la validation des paramètres

use std::env;
use std::str::FromStr;
use anyhow::{anyhow, Result};
use solana_sdk::pubkey::Pubkey;
use serde::{Deserialize, Serialize};

/// Configuration principale du serveur
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub rpc_url: String,
    pub helius_api_key: Option<String>,
    pub port: u16,
    pub rpc_timeout_ms: u64,
    pub marginfi_api_url: String,
    #[serde(skip_serializing)]
    pub marginfi_api_key: String,
    #[serde(skip_serializing)]
    pub birdeye_api_key: String,
    pub firebase_project_id: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            helius_api_key: None,
            port: 3000,
            rpc_timeout_ms: 30000,
            marginfi_api_url: String::new(),
            marginfi_api_key: String::new(),
            birdeye_api_key: String::new(),
            firebase_project_id: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        // RPC URL - Helius prioritaire
        if let Ok(api_key) = env::var("HELIUS_API_KEY") {
            config.rpc_url = format!("https://mainnet.helius-rpc.com/?api-key={}", api_key);
            config.helius_api_key = Some(api_key);
        } else if let Ok(rpc_url) = env::var("RPC_URL") {
            config.rpc_url = rpc_url;
        }

        // Services externes - OBLIGATOIRES
        config.marginfi_api_url = env::var("MARGINFI_API_URL")
            .map_err(|_| anyhow!("MARGINFI_API_URL requis dans .env"))?;
        config.marginfi_api_key = env::var("MARGINFI_API_KEY")
            .map_err(|_| anyhow!("MARGINFI_API_KEY requis dans .env"))?;
        config.birdeye_api_key = env::var("BIRDEYE_API_KEY")
            .map_err(|_| anyhow!("BIRDEYE_API_KEY requis dans .env"))?;

        // Paramètres optionnels
        config.firebase_project_id = env::var("FIREBASE_PROJECT_ID").ok();
        if let Ok(v) = env::var("PORT") {
            config.port = v.parse().unwrap_or(3000);
        }
        if let Ok(v) = env::var("RPC_TIMEOUT_MS") {
            config.rpc_timeout_ms = v.parse().unwrap_or(30000);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.marginfi_api_url.is_empty() {
            return Err(anyhow!("URL API marginfi requise"));
        }
        if self.birdeye_api_key.is_empty() {
            return Err(anyhow!("Clé API Birdeye requise"));
        }
        if self.port == 0 {
            return Err(anyhow!("Port invalide"));
        }
        Ok(())
    }

    pub fn get_rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn display_safe(&self) {
        log::info!("══════════════════════════════════════");
        log::info!("   CONFIGURATION EXPLORER API");
        log::info!("══════════════════════════════════════");
        log::info!("RPC: {}", if self.helius_api_key.is_some() { "Helius (API Key)" } else { &self.rpc_url });
        log::info!("Port: {}", self.port);
        log::info!("API marginfi: {}", self.marginfi_api_url);
        log::info!("Points: {}", if self.firebase_project_id.is_some() { "Firestore configuré" } else { "désactivé (défauts zéro)" });
        log::info!("Timeout RPC: {}ms", self.rpc_timeout_ms);
        log::info!("══════════════════════════════════════");
    }
}

/// Adresses des programmes Solana mainnet (VRAIS PROGRAM IDs)
pub struct ProgramIds;

impl ProgramIds {
    // Marginfi V2 Program - MAINNET OFFICIEL
    pub fn marginfi() -> Pubkey {
        Pubkey::from_str("MFv2hWf31Z9kbCa1snEPYctwafyhdvnV7FZnsebVacA").unwrap()
    }

    // Marginfi Group (main lending group)
    pub fn marginfi_group() -> Pubkey {
        Pubkey::from_str("4qp6Fx6tnZkY5Wropq9wUYgtFxXKwE6viZxFHg3rdAG8").unwrap()
    }
}
