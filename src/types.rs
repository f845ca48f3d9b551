//! Types JSON de l'API (réponses) et formes wire des services externes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Métadonnées d'une bank (symbole, nom, mint) - cache mrgn-public
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankMetadata {
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
}

pub type BankMetadataMap = HashMap<String, BankMetadata>;

/// Position convertie d'un compte dans une bank
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub assets: f64,
    pub liabilities: f64,
    pub assets_usd: f64,
    pub liabilities_usd: f64,
    pub bank_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_metadata: Option<BankMetadata>,
}

/// Compte de prêt agrégé pour l'API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: String,
    pub health_factor: f64,
    pub total_assets_usd: f64,
    pub total_liabilities_usd: f64,
    pub portfolio_balance_usd: f64,
    pub balances: Vec<Balance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<ArenaPool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_details: Option<PositionDetails>,
}

/// Frais d'une bank (depuis l'interest rate config)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankFees {
    pub insurance_fee_fixed_apr: f64,
    pub insurance_ir_fee: f64,
    pub protocol_fixed_fee_apr: f64,
    pub protocol_ir_fee: f64,
    pub protocol_origination_fee: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankConfigInfo {
    pub asset_tag: String,
    pub asset_weight: f64,
    pub liability_weight: f64,
    pub borrow_limit: f64,
    pub deposit_limit: f64,
    pub operational_state: String,
    pub risk_tier: String,
    pub oracle_keys: Vec<String>,
    pub oracle_max_age: u16,
    pub oracle_setup: String,
    pub utilization: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees: Option<BankFees>,
}

/// Bank valorisée pour l'API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub address: String,
    pub token_address: String,
    pub token_symbol: String,
    pub total_assets_usd: f64,
    pub total_liabilities_usd: f64,
    pub tvl: f64,
    pub config: BankConfigInfo,
}

/// Entrée de la liste des banks (sans valorisation)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankSearchResult {
    pub address: String,
    pub token_symbol: String,
    pub token_address: String,
}

/// Points d'un wallet (datastore points)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsData {
    pub owner: String,
    pub deposit_points: f64,
    pub borrow_points: f64,
    pub referral_points: f64,
    pub total_points: f64,
    pub rank: Option<i64>,
}

impl PointsData {
    /// Valeurs par défaut quand aucun enregistrement n'existe
    pub fn zero(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            deposit_points: 0.0,
            borrow_points: 0.0,
            referral_points: 0.0,
            total_points: 0.0,
            rank: None,
        }
    }
}

// ── Formes wire de l'API pools/pnl (snake_case, passthrough) ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaMint {
    pub address: String,
    pub decimals: u8,
    pub name: Option<String>,
    pub symbol: Option<String>,
    #[serde(default)]
    pub token_program: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArenaBankDetails {
    #[serde(default)]
    pub deposit_rate: f64,
    #[serde(default)]
    pub borrow_rate: f64,
    #[serde(default)]
    pub total_deposits: f64,
    #[serde(default)]
    pub total_deposits_usd: f64,
    #[serde(default)]
    pub total_borrows: f64,
    #[serde(default)]
    pub total_borrows_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaBank {
    pub address: String,
    #[serde(default)]
    pub group: String,
    pub mint: ArenaMint,
    #[serde(default)]
    pub details: ArenaBankDetails,
}

/// Pool arena: deux banks (base/quote) sous un même group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaPool {
    #[serde(default)]
    pub group: String,
    pub quote_bank: ArenaBank,
    pub base_bank: ArenaBank,
    #[serde(default)]
    pub lookup_tables: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub created_by: String,
}

/// PnL par pool (service analytics, passthrough snake_case)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PnlData {
    #[serde(default)]
    pub realized_pnl: f64,
    #[serde(default)]
    pub unrealized_pnl: f64,
    #[serde(default)]
    pub total_pnl: f64,
    #[serde(default)]
    pub current_position: f64,
    #[serde(default)]
    pub mark_price: f64,
    #[serde(default)]
    pub quote_price_usd: f64,
    #[serde(default)]
    pub entry_prices: Vec<f64>,
    #[serde(default)]
    pub realized_pnl_usd: f64,
    #[serde(default)]
    pub unrealized_pnl_usd: f64,
    #[serde(default)]
    pub total_pnl_usd: f64,
}

pub type PnlDataMap = HashMap<String, PnlData>;

/// Statut d'une position arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Long,
    Short,
    Lp,
    None,
}

/// Détail d'une position arena (dérivé, jamais persisté)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDetails {
    pub status: PositionStatus,
    pub total_usd_value: f64,
    pub position_size_usd: f64,
    pub position_size_token: f64,
    pub leverage: f64,
}

/// Prix spot Birdeye pour un mint
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BirdeyePrice {
    pub value: f64,
}

pub type BirdeyePriceMap = HashMap<String, BirdeyePrice>;
