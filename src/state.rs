//! Structures on-chain marginfi-v2 (désérialisation manuelle borsh)
//! Basé sur: https://github.com/mrgnlabs/marginfi-v2/blob/main/programs/marginfi/src/state

use borsh::{BorshDeserialize, BorshSerialize};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use solana_sdk::pubkey::Pubkey;

/// Wrapped I80F48: fixed point 16 bytes little-endian, 48 bits fractionnaires
#[derive(Debug, Clone, Copy, Default, BorshDeserialize, BorshSerialize)]
pub struct WrappedI80F48 {
    pub value: [u8; 16],
}

const FRAC_BITS: u32 = 48;
const FRAC_MASK: u128 = (1u128 << FRAC_BITS) - 1;

impl WrappedI80F48 {
    pub fn to_decimal(&self) -> Decimal {
        let raw = i128::from_le_bytes(self.value);
        let negative = raw < 0;
        let mag = raw.unsigned_abs();
        let int_part = (mag >> FRAC_BITS) as u64;
        let frac_part = (mag & FRAC_MASK) as u64;
        let dec = Decimal::from(int_part)
            + Decimal::from(frac_part) / Decimal::from(1u64 << FRAC_BITS);
        if negative {
            -dec
        } else {
            dec
        }
    }

    pub fn from_f64(value: f64) -> Self {
        let raw = (value * (1u64 << FRAC_BITS) as f64) as i128;
        Self {
            value: raw.to_le_bytes(),
        }
    }

    pub fn is_zero(&self) -> bool {
        i128::from_le_bytes(self.value) == 0
    }
}

/// Palier de risque d'une bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub enum RiskTier {
    Collateral,
    Isolated,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Collateral => "Collateral",
            RiskTier::Isolated => "Isolated",
        }
    }
}

/// État opérationnel d'une bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub enum BankOperationalState {
    Paused,
    Operational,
    ReduceOnly,
}

impl BankOperationalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BankOperationalState::Paused => "Paused",
            BankOperationalState::Operational => "Operational",
            BankOperationalState::ReduceOnly => "ReduceOnly",
        }
    }
}

/// Type de configuration oracle d'une bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub enum OracleSetup {
    None,
    PythLegacy,
    SwitchboardV2,
    PythPushOracle,
    SwitchboardPull,
    StakedWithPythPush,
}

impl OracleSetup {
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleSetup::None => "None",
            OracleSetup::PythLegacy => "PythLegacy",
            OracleSetup::SwitchboardV2 => "SwitchboardV2",
            OracleSetup::PythPushOracle => "PythPushOracle",
            OracleSetup::SwitchboardPull => "SwitchboardPull",
            OracleSetup::StakedWithPythPush => "StakedWithPythPush",
        }
    }
}

/// Asset tags marginfi (attribut indépendant du risk tier)
pub const ASSET_TAG_DEFAULT: u8 = 0;
pub const ASSET_TAG_SOL: u8 = 1;
pub const ASSET_TAG_STAKED: u8 = 2;

/// Configuration des taux d'intérêt et frais
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct InterestRateConfig {
    pub optimal_utilization_rate: WrappedI80F48,
    pub plateau_interest_rate: WrappedI80F48,
    pub max_interest_rate: WrappedI80F48,
    pub insurance_fee_fixed_apr: WrappedI80F48,
    pub insurance_ir_fee: WrappedI80F48,
    pub protocol_fixed_fee_apr: WrappedI80F48,
    pub protocol_ir_fee: WrappedI80F48,
    pub protocol_origination_fee: WrappedI80F48,
}

/// Configuration d'une bank (poids, limites, oracle)
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct BankConfig {
    pub asset_weight_init: WrappedI80F48,
    pub asset_weight_maint: WrappedI80F48,
    pub liability_weight_init: WrappedI80F48,
    pub liability_weight_maint: WrappedI80F48,
    pub deposit_limit: u64,
    pub interest_rate_config: InterestRateConfig,
    pub operational_state: BankOperationalState,
    pub oracle_setup: OracleSetup,
    pub oracle_keys: [Pubkey; 5],
    pub _pad0: [u8; 6],
    pub borrow_limit: u64,
    pub risk_tier: RiskTier,
    pub asset_tag: u8,
    pub _pad1: [u8; 6],
    pub total_asset_value_init_limit: u64,
    pub oracle_max_age: u16,
}

/// Compte Bank marginfi (une réserve de prêt pour un mint)
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct BankState {
    pub discriminator: [u8; 8],
    pub mint: Pubkey,
    pub mint_decimals: u8,
    pub group: Pubkey,
    pub _pad0: [u8; 7],
    pub asset_share_value: WrappedI80F48,
    pub liability_share_value: WrappedI80F48,
    pub liquidity_vault: Pubkey,
    pub liquidity_vault_bump: u8,
    pub liquidity_vault_authority_bump: u8,
    pub insurance_vault: Pubkey,
    pub insurance_vault_bump: u8,
    pub insurance_vault_authority_bump: u8,
    pub _pad1: [u8; 4],
    pub collected_insurance_fees_outstanding: WrappedI80F48,
    pub fee_vault: Pubkey,
    pub fee_vault_bump: u8,
    pub fee_vault_authority_bump: u8,
    pub _pad2: [u8; 6],
    pub collected_group_fees_outstanding: WrappedI80F48,
    pub total_liability_shares: WrappedI80F48,
    pub total_asset_shares: WrappedI80F48,
    pub last_update: i64,
    pub config: BankConfig,
}

impl BankState {
    /// Décode depuis les bytes bruts du compte, en tolérant le padding final
    pub fn from_account_data(data: &[u8]) -> Option<Self> {
        let mut slice = data;
        BankState::deserialize(&mut slice).ok()
    }
}

/// En-tête d'un compte marginfi (lending account)
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct MarginfiAccountHeader {
    pub discriminator: [u8; 8],
    pub group: Pubkey,
    pub authority: Pubkey,
    pub lending_account: LendingAccount,
}

impl MarginfiAccountHeader {
    pub fn from_account_data(data: &[u8]) -> Option<Self> {
        let mut slice = data;
        MarginfiAccountHeader::deserialize(&mut slice).ok()
    }

    /// Balances actives uniquement (au plus une par bank)
    pub fn active_balances(&self) -> impl Iterator<Item = &BalanceState> {
        self.lending_account.balances.iter().filter(|b| b.active)
    }
}

#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct LendingAccount {
    pub balances: [BalanceState; 16], // Max 16 positions
    pub _padding: [u64; 8],
}

/// Position d'un compte dans une bank
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize, Default)]
pub struct BalanceState {
    pub active: bool,
    pub bank_pk: Pubkey,
    pub asset_shares: WrappedI80F48,
    pub liability_shares: WrappedI80F48,
    pub emissions_outstanding: WrappedI80F48,
    pub last_update: u64,
    pub _padding: [u64; 1],
}

/// Taille d'un compte marginfi on-chain (filtre getProgramAccounts)
pub const MARGINFI_ACCOUNT_SIZE: u64 = 2304;

/// Offsets memcmp dans un compte marginfi: group puis authority après le discriminator
pub const ACCOUNT_GROUP_OFFSET: usize = 8;
pub const ACCOUNT_AUTHORITY_OFFSET: usize = 40;

/// Offset memcmp du group dans un compte Bank (discriminator + mint + mint_decimals)
pub const BANK_GROUP_OFFSET: usize = 41;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i80f48_integer_roundtrip() {
        let w = WrappedI80F48::from_f64(42.0);
        assert_eq!(w.to_decimal(), Decimal::from(42));
    }

    #[test]
    fn test_i80f48_fractional() {
        let w = WrappedI80F48::from_f64(1.5);
        assert_eq!(w.to_decimal(), Decimal::new(15, 1));
    }

    #[test]
    fn test_i80f48_negative() {
        let w = WrappedI80F48::from_f64(-2.25);
        assert_eq!(w.to_decimal(), Decimal::new(-225, 2));
    }

    #[test]
    fn test_i80f48_zero() {
        assert!(WrappedI80F48::default().is_zero());
        assert_eq!(WrappedI80F48::default().to_decimal(), Decimal::ZERO);
    }

    #[test]
    fn test_balance_default_inactive() {
        let b = BalanceState::default();
        assert!(!b.active);
        assert!(b.asset_shares.is_zero());
    }
}
