//! Classification des positions arena (long/short/lp/none) et sizing
//! Fonction pure: balances converties + pool deux-banks en entrée

use crate::types::{ArenaPool, Balance, PositionDetails, PositionStatus};

/// Epsilon du calcul de levier, placé volontairement au DÉNOMINATEUR
/// (pas au numérateur ni sur le quotient): seule cette position évite la
/// division par zéro quand depositValue == borrowValue. Comportement à la
/// frontière pinné par les tests.
pub const LEVERAGE_EPSILON: f64 = 1e-10;

fn find_balance<'a>(balances: &'a [Balance], bank_address: &str) -> Option<&'a Balance> {
    balances.iter().find(|b| b.bank_address == bank_address)
}

/// Classifie l'exposition nette d'un compte sur un pool base/quote.
/// Totale: toute paire (balances, pool) tombe dans exactement un statut.
pub fn position_status(balances: &[Balance], pool: &ArenaPool) -> PositionStatus {
    let base = find_balance(balances, &pool.base_bank.address);
    let quote = find_balance(balances, &pool.quote_bank.address);

    if base.is_none() && quote.is_none() {
        return PositionStatus::None;
    }

    // Côté absent = exposition nulle
    let (base_assets, base_liabilities) = base
        .map(|b| (b.assets, b.liabilities))
        .unwrap_or((0.0, 0.0));
    let (quote_assets, quote_liabilities) = quote
        .map(|b| (b.assets, b.liabilities))
        .unwrap_or((0.0, 0.0));

    if (base_assets > 0.0 || quote_assets > 0.0)
        && base_liabilities == 0.0
        && quote_liabilities == 0.0
    {
        return PositionStatus::Lp;
    }
    if base_assets > 0.0 {
        return PositionStatus::Long;
    }
    if base_liabilities > 0.0 {
        return PositionStatus::Short;
    }
    PositionStatus::None
}

/// Dérive le détail complet d'une position: statut, taille, levier
pub fn position_details(balances: &[Balance], pool: &ArenaPool) -> PositionDetails {
    let status = position_status(balances, pool);
    let base = find_balance(balances, &pool.base_bank.address);
    let quote = find_balance(balances, &pool.quote_bank.address);

    let (deposit_value, borrow_value, deposit_size) = match status {
        PositionStatus::Short => (
            quote.map(|b| b.assets_usd).unwrap_or(0.0),
            base.map(|b| b.liabilities_usd).unwrap_or(0.0),
            quote.map(|b| b.assets).unwrap_or(0.0),
        ),
        PositionStatus::Long => (
            base.map(|b| b.assets_usd).unwrap_or(0.0),
            quote.map(|b| b.liabilities_usd).unwrap_or(0.0),
            base.map(|b| b.assets).unwrap_or(0.0),
        ),
        PositionStatus::Lp | PositionStatus::None => (0.0, 0.0, 0.0),
    };

    let leverage = round4(deposit_value / (deposit_value - borrow_value + LEVERAGE_EPSILON));

    PositionDetails {
        status,
        total_usd_value: deposit_value - borrow_value,
        position_size_usd: deposit_value,
        position_size_token: deposit_size,
        leverage,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArenaBank, ArenaBankDetails, ArenaMint};

    fn arena_bank(address: &str) -> ArenaBank {
        ArenaBank {
            address: address.to_string(),
            group: "group".to_string(),
            mint: ArenaMint {
                address: format!("{}-mint", address),
                decimals: 6,
                name: Some("Token".to_string()),
                symbol: Some("TKN".to_string()),
                token_program: String::new(),
            },
            details: ArenaBankDetails::default(),
        }
    }

    fn pool() -> ArenaPool {
        ArenaPool {
            group: "group".to_string(),
            base_bank: arena_bank("base"),
            quote_bank: arena_bank("quote"),
            lookup_tables: vec![],
            featured: false,
            created_at: String::new(),
            created_by: String::new(),
        }
    }

    fn bal(bank: &str, assets: f64, liabilities: f64, assets_usd: f64, liabilities_usd: f64) -> Balance {
        Balance {
            assets,
            liabilities,
            assets_usd,
            liabilities_usd,
            bank_address: bank.to_string(),
            bank_metadata: None,
        }
    }

    #[test]
    fn test_no_balances_is_none() {
        let details = position_details(&[], &pool());
        assert_eq!(details.status, PositionStatus::None);
        assert_eq!(details.position_size_usd, 0.0);
        assert_eq!(details.leverage, 0.0);
    }

    #[test]
    fn test_lp_when_assets_without_borrow_leg() {
        let balances = vec![
            bal("base", 10.0, 0.0, 100.0, 0.0),
            bal("quote", 50.0, 0.0, 50.0, 0.0),
        ];
        assert_eq!(position_status(&balances, &pool()), PositionStatus::Lp);

        // un seul côté déposé reste du lp
        let balances = vec![bal("quote", 50.0, 0.0, 50.0, 0.0)];
        assert_eq!(position_status(&balances, &pool()), PositionStatus::Lp);
    }

    #[test]
    fn test_long_sizing_and_leverage() {
        let balances = vec![
            bal("base", 100.0, 0.0, 1000.0, 0.0),
            bal("quote", 0.0, 500.0, 0.0, 500.0),
        ];
        let details = position_details(&balances, &pool());

        assert_eq!(details.status, PositionStatus::Long);
        assert_eq!(details.position_size_usd, 1000.0);
        assert_eq!(details.position_size_token, 100.0);
        assert_eq!(details.total_usd_value, 500.0);
        // depositValue 1000, borrowValue 500 => levier 2.0 arrondi à 4 décimales
        assert_eq!(details.leverage, 2.0);
    }

    #[test]
    fn test_short_sizing() {
        let balances = vec![
            bal("base", 0.0, 10.0, 0.0, 300.0),
            bal("quote", 900.0, 0.0, 900.0, 0.0),
        ];
        let details = position_details(&balances, &pool());

        assert_eq!(details.status, PositionStatus::Short);
        assert_eq!(details.position_size_usd, 900.0);
        assert_eq!(details.position_size_token, 900.0);
        assert_eq!(details.total_usd_value, 600.0);
        assert_eq!(details.leverage, 1.5);
    }

    #[test]
    fn test_leverage_epsilon_boundary() {
        // depositValue == borrowValue: l'epsilon évite la division par zéro
        let balances = vec![
            bal("base", 100.0, 0.0, 1000.0, 0.0),
            bal("quote", 0.0, 1000.0, 0.0, 1000.0),
        ];
        let details = position_details(&balances, &pool());

        assert_eq!(details.status, PositionStatus::Long);
        assert!(details.leverage.is_finite());
        assert_eq!(details.leverage, round4(1000.0 / LEVERAGE_EPSILON));
    }

    #[test]
    fn test_classification_total() {
        let pool = pool();
        let cases: Vec<Vec<Balance>> = vec![
            vec![],
            vec![bal("base", 1.0, 0.0, 1.0, 0.0)],
            vec![bal("base", 0.0, 1.0, 0.0, 1.0)],
            vec![bal("quote", 1.0, 0.0, 1.0, 0.0)],
            vec![bal("quote", 0.0, 1.0, 0.0, 1.0)],
            vec![bal("base", 0.0, 0.0, 0.0, 0.0), bal("quote", 0.0, 0.0, 0.0, 0.0)],
            vec![bal("autre", 5.0, 0.0, 5.0, 0.0)],
        ];

        for balances in &cases {
            // chaque paire tombe dans exactement un des quatre statuts
            let status = position_status(balances, &pool);
            assert!(matches!(
                status,
                PositionStatus::Long
                    | PositionStatus::Short
                    | PositionStatus::Lp
                    | PositionStatus::None
            ));
        }
    }

    #[test]
    fn test_quote_borrow_only_is_none() {
        // liabilities côté quote uniquement: ni long ni short
        let balances = vec![bal("quote", 0.0, 10.0, 0.0, 10.0)];
        assert_eq!(position_status(&balances, &pool()), PositionStatus::None);
    }
}
