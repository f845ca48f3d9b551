//! Oracles: échantillons de prix et normalisation des clés oracle
//! Gère le schéma d'adressage Pyth push (PDA par shard sponsor)

use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::state::OracleSetup;

/// Programme Pyth push oracle - MAINNET OFFICIEL
pub const PYTH_PUSH_ORACLE_ID: &str = "pythWSnswVUd12oZpeFP8e9CVaEqJg25g1Vtc2biRsT";

/// Shard sponsorisé par Pyth
pub const PYTH_SPONSORED_SHARD_ID: u16 = 0;
/// Shard sponsorisé par marginfi
pub const MARGINFI_SPONSORED_SHARD_ID: u16 = 3301;

pub fn pyth_push_oracle_program() -> Pubkey {
    Pubkey::from_str(PYTH_PUSH_ORACLE_ID).unwrap()
}

/// Biais appliqué lors d'une lecture de prix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBias {
    None,
    Lowest,
    Highest,
}

/// Un contexte de prix (realtime ou pondéré)
#[derive(Debug, Clone)]
pub struct PriceWithConfidence {
    pub price: Decimal,
    pub highest_price: Decimal,
    pub lowest_price: Decimal,
    pub confidence: Decimal,
}

/// Échantillon de prix oracle pour un mint
#[derive(Debug, Clone)]
pub struct OraclePrice {
    pub price_realtime: PriceWithConfidence,
    pub price_weighted: PriceWithConfidence,
    pub timestamp: i64,
}

impl OraclePrice {
    /// Construit un échantillon depuis un prix spot (Birdeye): les deux
    /// contextes sont identiques, highest = lowest = price, confidence = 1
    pub fn from_spot(price: Decimal) -> Self {
        let sample = PriceWithConfidence {
            price,
            highest_price: price,
            lowest_price: price,
            confidence: Decimal::ONE,
        };
        Self {
            price_realtime: sample.clone(),
            price_weighted: sample,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Lecture avec biais sur le contexte realtime
    pub fn price(&self, bias: PriceBias) -> Decimal {
        Self::biased(&self.price_realtime, bias)
    }

    /// Lecture avec biais sur le contexte pondéré (requis maintenance/initial)
    pub fn price_weighted(&self, bias: PriceBias) -> Decimal {
        Self::biased(&self.price_weighted, bias)
    }

    fn biased(sample: &PriceWithConfidence, bias: PriceBias) -> Decimal {
        match bias {
            PriceBias::None => sample.price,
            PriceBias::Lowest => sample.lowest_price,
            PriceBias::Highest => sample.highest_price,
        }
    }
}

/// Dérive l'adresse du compte Pyth push pour un feed id et un shard donné.
/// Seeds: [shard_id le bytes, feed_id]
pub fn find_pyth_push_oracle_address(feed_id: &[u8], shard_id: u16) -> Pubkey {
    let shard_bytes = shard_id.to_le_bytes();
    Pubkey::find_program_address(&[&shard_bytes, feed_id], &pyth_push_oracle_program()).0
}

/// Résout les clés oracle effectivement utilisables pour lire un prix.
///
/// Les clés sentinelles (Pubkey::default) sont écartées. Pour un setup
/// PythPushOracle, chaque clé restante est un feed id et devient DEUX
/// adresses dérivées, dans l'ordre [shard Pyth, shard marginfi], par clé
/// d'entrée. Les autres setups passent la liste filtrée inchangée.
pub fn normalize_oracle_keys(setup: OracleSetup, keys: &[Pubkey]) -> Vec<Pubkey> {
    let filtered: Vec<Pubkey> = keys
        .iter()
        .filter(|key| **key != Pubkey::default())
        .copied()
        .collect();

    match setup {
        OracleSetup::PythPushOracle => filtered
            .iter()
            .flat_map(|key| {
                [
                    find_pyth_push_oracle_address(key.as_ref(), PYTH_SPONSORED_SHARD_ID),
                    find_pyth_push_oracle_address(key.as_ref(), MARGINFI_SPONSORED_SHARD_ID),
                ]
            })
            .collect(),
        _ => filtered,
    }
}
