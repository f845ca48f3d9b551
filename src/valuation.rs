//! Moteur de valorisation et de risque: banks, balances, comptes
//! Conversions shares -> tokens -> USD et métriques dérivées (health, TVL)

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

use crate::oracle::{normalize_oracle_keys, OraclePrice, PriceBias};
use crate::state::{BankState, MarginfiAccountHeader, ASSET_TAG_STAKED};
use crate::types::{self, BankMetadata, BankMetadataMap};

/// Type de requirement pour une valorisation pondérée
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementType {
    Initial,
    Maintenance,
    /// Poids de 1 des deux côtés (valorisation brute)
    Equity,
}

/// Résultat d'une résolution par élément pendant une agrégation batch.
/// Les éléments Dropped sont filtrés avec log, jamais remontés en erreur.
#[derive(Debug)]
pub enum Resolution<T> {
    Resolved(T),
    Dropped(&'static str),
}

impl<T> Resolution<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Resolution::Resolved(value) => Some(value),
            Resolution::Dropped(reason) => {
                log::debug!("élément écarté: {}", reason);
                None
            }
        }
    }
}

/// Bank décodée + adresse, unité de base du moteur de valorisation
#[derive(Debug, Clone)]
pub struct Bank {
    pub address: Pubkey,
    pub state: BankState,
}

impl Bank {
    pub fn new(address: Pubkey, state: BankState) -> Self {
        Self { address, state }
    }

    pub fn mint(&self) -> Pubkey {
        self.state.mint
    }

    fn scale(&self) -> Decimal {
        Decimal::from(10u64.pow(self.state.mint_decimals as u32))
    }

    /// Shares -> quantité en unités token (échange via asset share value)
    pub fn asset_quantity(&self, shares: Decimal) -> Decimal {
        shares * self.state.asset_share_value.to_decimal()
    }

    pub fn liability_quantity(&self, shares: Decimal) -> Decimal {
        shares * self.state.liability_share_value.to_decimal()
    }

    /// Quantité en unités d'affichage (divisée par 10^decimals)
    pub fn asset_quantity_ui(&self, shares: Decimal) -> Decimal {
        self.asset_quantity(shares) / self.scale()
    }

    pub fn liability_quantity_ui(&self, shares: Decimal) -> Decimal {
        self.liability_quantity(shares) / self.scale()
    }

    /// Poids asset effectif selon le requirement. Le poids initial est
    /// soft-cappé par total_asset_value_init_limit au prix courant.
    pub fn asset_weight(&self, requirement: RequirementType, price: &OraclePrice) -> Decimal {
        match requirement {
            RequirementType::Equity => Decimal::ONE,
            RequirementType::Maintenance => self.state.config.asset_weight_maint.to_decimal(),
            RequirementType::Initial => self.effective_asset_weight_init(price),
        }
    }

    pub fn liability_weight(&self, requirement: RequirementType) -> Decimal {
        match requirement {
            RequirementType::Equity => Decimal::ONE,
            RequirementType::Maintenance => self.state.config.liability_weight_maint.to_decimal(),
            RequirementType::Initial => self.state.config.liability_weight_init.to_decimal(),
        }
    }

    /// Poids asset initial au prix courant: scale down quand la limite USD
    /// totale est dépassée (courbe de discount marginfi)
    pub fn effective_asset_weight_init(&self, price: &OraclePrice) -> Decimal {
        let weight = self.state.config.asset_weight_init.to_decimal();
        let limit = Decimal::from(self.state.config.total_asset_value_init_limit);

        if limit.is_zero() {
            return weight;
        }

        let total_usd = self.asset_quantity_ui(self.state.total_asset_shares.to_decimal())
            * price.price(PriceBias::None);

        if total_usd > limit && !total_usd.is_zero() {
            weight * limit / total_usd
        } else {
            weight
        }
    }

    fn price_for(&self, price: &OraclePrice, requirement: RequirementType, bias: PriceBias) -> Decimal {
        // Equity lit le contexte realtime, les requirements pondérés le contexte weighted
        match requirement {
            RequirementType::Equity => price.price(bias),
            _ => price.price_weighted(bias),
        }
    }

    /// Valeur USD pondérée d'un montant de shares asset
    pub fn asset_usd_value(
        &self,
        price: &OraclePrice,
        shares: Decimal,
        requirement: RequirementType,
        bias: PriceBias,
    ) -> Decimal {
        let quantity = self.asset_quantity(shares);
        let weight = self.asset_weight(requirement, price);
        quantity * weight * self.price_for(price, requirement, bias) / self.scale()
    }

    pub fn liability_usd_value(
        &self,
        price: &OraclePrice,
        shares: Decimal,
        requirement: RequirementType,
        bias: PriceBias,
    ) -> Decimal {
        let quantity = self.liability_quantity(shares);
        let weight = self.liability_weight(requirement);
        quantity * weight * self.price_for(price, requirement, bias) / self.scale()
    }

    /// TVL = assets - liabilities au même prix, requirement Equity
    pub fn tvl(&self, price: &OraclePrice) -> Decimal {
        self.asset_usd_value(
            price,
            self.state.total_asset_shares.to_decimal(),
            RequirementType::Equity,
            PriceBias::None,
        ) - self.liability_usd_value(
            price,
            self.state.total_liability_shares.to_decimal(),
            RequirementType::Equity,
            PriceBias::None,
        )
    }

    /// Utilisation = liability shares / asset shares, 0 si dénominateur nul.
    /// Fraction dans [0,1] en conditions normales, pas de clamp.
    pub fn utilization(&self) -> Decimal {
        let assets = self.state.total_asset_shares.to_decimal();
        if assets.is_zero() {
            return Decimal::ZERO;
        }
        self.state.total_liability_shares.to_decimal() / assets
    }

    /// Classification du tag: le risk tier Isolated prime sur l'asset tag
    pub fn asset_tag_label(&self) -> &'static str {
        if self.state.config.risk_tier == crate::state::RiskTier::Isolated {
            "Isolated"
        } else if self.state.config.asset_tag == ASSET_TAG_STAKED {
            "Native Stake"
        } else {
            "Global"
        }
    }
}

/// Composantes de santé d'un compte (USD pondérés maintenance + biais)
#[derive(Debug, Clone)]
pub struct HealthComponents {
    pub assets: Decimal,
    pub liabilities: Decimal,
}

/// Composantes maintenance avec biais complet d'intervalle de confiance:
/// assets au prix bas, liabilities au prix haut. Une bank ou un prix
/// introuvable écarte la balance du calcul, pas le compte entier.
pub fn compute_health_components(
    header: &MarginfiAccountHeader,
    banks: &HashMap<Pubkey, Bank>,
    prices: &HashMap<Pubkey, OraclePrice>,
) -> HealthComponents {
    let mut assets = Decimal::ZERO;
    let mut liabilities = Decimal::ZERO;

    for balance in header.active_balances() {
        let (bank, price) = match (banks.get(&balance.bank_pk), prices.get(&balance.bank_pk)) {
            (Some(bank), Some(price)) => (bank, price),
            _ => continue,
        };

        assets += bank.asset_usd_value(
            price,
            balance.asset_shares.to_decimal(),
            RequirementType::Maintenance,
            PriceBias::Lowest,
        );
        liabilities += bank.liability_usd_value(
            price,
            balance.liability_shares.to_decimal(),
            RequirementType::Maintenance,
            PriceBias::Highest,
        );
    }

    HealthComponents { assets, liabilities }
}

/// Health factor normalisé dans (-inf, 1].
/// Composante assets nulle => exactement 1 (aucun collatéral pondéré =
/// compte traité comme sain au maximum; edge case documenté).
pub fn health_factor(components: &HealthComponents) -> f64 {
    if components.assets.is_zero() {
        return 1.0;
    }
    ((components.assets - components.liabilities) / components.assets)
        .to_f64()
        .unwrap_or(0.0)
}

/// Balance convertie en unités token + USD, avant passage en f64
struct ConvertedBalance {
    assets: Decimal,
    liabilities: Decimal,
    assets_usd: Decimal,
    liabilities_usd: Decimal,
    bank_address: Pubkey,
}

/// Agrège un compte décodé en Account API: health factor, balances
/// converties et triées, totaux USD accumulés en Decimal.
///
/// Dropped quand aucune balance ne survit au filtrage (banks inconnues ou
/// positions entièrement nulles): ces comptes ne sont pas exposés.
pub fn build_account(
    address: &Pubkey,
    header: &MarginfiAccountHeader,
    banks: &HashMap<Pubkey, Bank>,
    prices: &HashMap<Pubkey, OraclePrice>,
    metadata: &BankMetadataMap,
) -> Resolution<types::Account> {
    let components = compute_health_components(header, banks, prices);
    let health = health_factor(&components);

    let mut converted: Vec<ConvertedBalance> = Vec::new();

    for balance in header.active_balances() {
        let bank = match banks.get(&balance.bank_pk) {
            Some(bank) => bank,
            None => {
                log::debug!("balance écartée: bank {} introuvable", balance.bank_pk);
                continue;
            }
        };
        let price = match prices.get(&balance.bank_pk) {
            Some(price) => price,
            None => {
                log::debug!("balance écartée: pas de prix pour {}", balance.bank_pk);
                continue;
            }
        };

        let assets = bank.asset_quantity_ui(balance.asset_shares.to_decimal());
        let liabilities = bank.liability_quantity_ui(balance.liability_shares.to_decimal());

        // Filtrage des positions nulles, appliqué après conversion
        if assets.is_zero() && liabilities.is_zero() {
            continue;
        }

        converted.push(ConvertedBalance {
            assets,
            liabilities,
            assets_usd: bank.asset_usd_value(
                price,
                balance.asset_shares.to_decimal(),
                RequirementType::Equity,
                PriceBias::None,
            ),
            liabilities_usd: bank.liability_usd_value(
                price,
                balance.liability_shares.to_decimal(),
                RequirementType::Equity,
                PriceBias::None,
            ),
            bank_address: balance.bank_pk,
        });
    }

    if converted.is_empty() {
        return Resolution::Dropped("compte sans balance résolue");
    }

    // Accumulation en Decimal avant conversion f64 (pas de dérive flottante)
    let total_assets: Decimal = converted.iter().map(|b| b.assets_usd).sum();
    let total_liabilities: Decimal = converted.iter().map(|b| b.liabilities_usd).sum();
    let portfolio = total_assets - total_liabilities;

    let mut balances: Vec<types::Balance> = converted
        .into_iter()
        .map(|b| types::Balance {
            assets: to_f64(b.assets),
            liabilities: to_f64(b.liabilities),
            assets_usd: to_f64(b.assets_usd),
            liabilities_usd: to_f64(b.liabilities_usd),
            bank_address: b.bank_address.to_string(),
            bank_metadata: metadata.get(&b.bank_address.to_string()).cloned(),
        })
        .collect();

    // Tri: assetsUsd décroissant, égalités départagées par liabilitiesUsd décroissant
    balances.sort_by(|a, b| {
        b.assets_usd
            .partial_cmp(&a.assets_usd)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.liabilities_usd
                    .partial_cmp(&a.liabilities_usd)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    Resolution::Resolved(types::Account {
        address: address.to_string(),
        health_factor: health,
        total_assets_usd: to_f64(total_assets),
        total_liabilities_usd: to_f64(total_liabilities),
        portfolio_balance_usd: to_f64(portfolio),
        balances,
        pool: None,
        group: None,
        pnl: None,
        position_details: None,
    })
}

/// Construit le payload Bank API complet pour une bank + prix résolu
pub fn bank_payload(
    bank: &Bank,
    price: &OraclePrice,
    metadata: &BankMetadata,
    include_fees: bool,
) -> types::Bank {
    let state = &bank.state;

    let total_assets_usd = bank.asset_usd_value(
        price,
        state.total_asset_shares.to_decimal(),
        RequirementType::Equity,
        PriceBias::None,
    );
    let total_liabilities_usd = bank.liability_usd_value(
        price,
        state.total_liability_shares.to_decimal(),
        RequirementType::Equity,
        PriceBias::None,
    );
    let tvl = bank.tvl(price);

    // Fallback 0 quand le poids effectif est nul (courbe de discount)
    let asset_weight = to_f64(bank.effective_asset_weight_init(price));

    // Convention réciproque: liabilityWeightInit 1.25 => 0.8 exposé
    let liability_weight_init = state.config.liability_weight_init.to_decimal();
    let liability_weight = if liability_weight_init.is_zero() {
        0.0
    } else {
        to_f64(Decimal::ONE / liability_weight_init)
    };

    let oracle_keys = normalize_oracle_keys(state.config.oracle_setup, &state.config.oracle_keys);

    let fees = include_fees.then(|| {
        let rates = &state.config.interest_rate_config;
        types::BankFees {
            insurance_fee_fixed_apr: to_f64(rates.insurance_fee_fixed_apr.to_decimal()),
            insurance_ir_fee: to_f64(rates.insurance_ir_fee.to_decimal()),
            protocol_fixed_fee_apr: to_f64(rates.protocol_fixed_fee_apr.to_decimal()),
            protocol_ir_fee: to_f64(rates.protocol_ir_fee.to_decimal()),
            protocol_origination_fee: to_f64(rates.protocol_origination_fee.to_decimal()),
        }
    });

    types::Bank {
        address: bank.address.to_string(),
        token_address: metadata.token_address.clone(),
        token_symbol: metadata.token_symbol.clone(),
        total_assets_usd: to_f64(total_assets_usd),
        total_liabilities_usd: to_f64(total_liabilities_usd),
        tvl: to_f64(tvl),
        config: types::BankConfigInfo {
            asset_tag: bank.asset_tag_label().to_string(),
            asset_weight,
            liability_weight,
            borrow_limit: state.config.borrow_limit as f64,
            deposit_limit: state.config.deposit_limit as f64,
            operational_state: state.config.operational_state.as_str().to_string(),
            risk_tier: state.config.risk_tier.as_str().to_string(),
            oracle_keys: oracle_keys.iter().map(|k| k.to_string()).collect(),
            oracle_max_age: state.config.oracle_max_age,
            oracle_setup: state.config.oracle_setup.as_str().to_string(),
            utilization: to_f64(bank.utilization()),
            fees,
        },
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
