//! Serveur HTTP: routes de recherche comptes/banks/arena, prix, points
//! Chaque requête est indépendante et stateless; le fan-out interne est
//! concurrent sur des données immuables

use anyhow::Result;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::arena::ArenaApiClient;
use crate::birdeye::BirdeyeClient;
use crate::client::{ClientOptions, MarginfiClient, WalletStub};
use crate::config::{AppConfig, ProgramIds};
use crate::error::ApiError;
use crate::metadata::load_combined_metadatas;
use crate::oracle::OraclePrice;
use crate::points::PointsClient;
use crate::position::position_details;
use crate::state::{MarginfiAccountHeader, OracleSetup};
use crate::types::{
    Account, ArenaPool, BankMetadata, BankMetadataMap, BankSearchResult, PnlDataMap, PointsData,
};
use crate::valuation::{self, bank_payload, build_account};

/// État partagé du serveur: clients externes construits une fois.
/// Aucun état mutable: les tables bank/prix sont reconstruites par requête.
pub struct AppState {
    pub config: AppConfig,
    pub http: reqwest::Client,
    pub rpc: Arc<RpcClient>,
    pub birdeye: BirdeyeClient,
    pub arena: ArenaApiClient,
    pub points: PointsClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let http = reqwest::Client::new();
        let rpc = Arc::new(RpcClient::new_with_timeout_and_commitment(
            config.get_rpc_url().to_string(),
            Duration::from_millis(config.rpc_timeout_ms),
            CommitmentConfig::confirmed(),
        ));
        let birdeye = BirdeyeClient::new(http.clone(), config.birdeye_api_key.clone());
        let arena = ArenaApiClient::new(
            http.clone(),
            config.marginfi_api_url.clone(),
            config.marginfi_api_key.clone(),
        );
        let points = PointsClient::new(http.clone(), config.firebase_project_id.clone());

        Self {
            config,
            http,
            rpc,
            birdeye,
            arena,
            points,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/search/accounts", get(search_accounts))
        .route("/api/search/marginfi/accounts", get(search_accounts))
        .route("/api/search/banks", get(search_banks))
        .route("/api/search/marginfi/banks", get(search_banks))
        .route("/api/search/arena/accounts", get(search_arena_accounts))
        .route("/api/search/arena/pools", get(search_arena_pool))
        .route("/api/search/arena/pools/all", get(list_arena_pools))
        .route("/api/search/marginfi/points", get(search_points))
        .route("/api/prices", get(get_prices))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let port = state.config.port;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("🌐 Serveur à l'écoute sur le port {}", port);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct WalletQuery {
    wallet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddressQuery {
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PricesQuery {
    addresses: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArenaAccountsResponse {
    accounts: Vec<Account>,
    total_portfolio_size_usd: f64,
}

#[derive(Debug, Serialize)]
struct ArenaPoolDetailResponse {
    banks: Vec<crate::types::Bank>,
}

#[derive(Debug, Serialize)]
struct ArenaPoolListResponse {
    banks: Vec<ArenaPool>,
}

/// Validation d'adresse: échoue AVANT tout accès chain
fn parse_wallet(value: &str) -> Result<Pubkey, ApiError> {
    Pubkey::from_str(value).map_err(|_| ApiError::invalid("Invalid wallet address"))
}

/// Agrège les comptes déjà chargés en réponse triée (portfolioBalanceUsd
/// décroissant). Un wallet sans compte donne une liste vide, pas une erreur.
fn aggregate_accounts(
    accounts: &[(Pubkey, MarginfiAccountHeader)],
    banks: &HashMap<Pubkey, valuation::Bank>,
    prices: &HashMap<Pubkey, OraclePrice>,
    metadata: &BankMetadataMap,
) -> Vec<Account> {
    let mut data: Vec<Account> = accounts
        .iter()
        .filter_map(|(address, header)| {
            build_account(address, header, banks, prices, metadata).ok()
        })
        .collect();

    data.sort_by(|a, b| {
        b.portfolio_balance_usd
            .partial_cmp(&a.portfolio_balance_usd)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    data
}

/// Résout une bank chargée + son prix en payload API.
/// Bank absente de la table => 404, prix absent => 404.
fn resolve_bank_payload(
    address: &Pubkey,
    banks: &HashMap<Pubkey, valuation::Bank>,
    prices: &HashMap<Pubkey, OraclePrice>,
    metadata: &BankMetadata,
    include_fees: bool,
) -> Result<crate::types::Bank, ApiError> {
    let bank = banks
        .get(address)
        .ok_or_else(|| ApiError::not_found("Bank not found"))?;
    let price = prices
        .get(address)
        .ok_or_else(|| ApiError::not_found("Price not found for bank"))?;

    Ok(bank_payload(bank, price, metadata, include_fees))
}

/// GET /api/search/accounts & /api/search/marginfi/accounts
/// Comptes d'un wallet, triés par portfolioBalanceUsd décroissant
async fn search_accounts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WalletQuery>,
) -> Result<Json<Vec<Account>>, ApiError> {
    let wallet = params
        .wallet
        .ok_or_else(|| ApiError::invalid("Wallet address is required"))?;
    let wallet = parse_wallet(&wallet)?;

    let metadata = load_combined_metadatas(&state.http).await?;
    let preloaded: Vec<Pubkey> = metadata
        .keys()
        .filter_map(|address| Pubkey::from_str(address).ok())
        .collect();

    let client = MarginfiClient::fetch(
        state.rpc.clone(),
        &state.birdeye,
        ProgramIds::marginfi_group(),
        WalletStub { public_key: wallet },
        ClientOptions {
            preloaded_bank_addresses: Some(preloaded),
        },
    )
    .await?;

    let accounts = client.get_accounts_for_authority(&wallet).await?;
    log::info!("🔍 {} comptes trouvés pour {}", accounts.len(), wallet);

    Ok(Json(aggregate_accounts(
        &accounts,
        &client.banks,
        &client.oracle_prices,
        &metadata,
    )))
}

fn bank_search_results(metadata: &BankMetadataMap) -> Vec<BankSearchResult> {
    let mut results: Vec<BankSearchResult> = metadata
        .iter()
        .map(|(address, meta)| BankSearchResult {
            address: address.clone(),
            token_symbol: meta.token_symbol.clone(),
            token_address: meta.token_address.clone(),
        })
        .collect();
    results.sort_by(|a, b| a.token_symbol.cmp(&b.token_symbol));
    results
}

/// GET /api/search/banks & /api/search/marginfi/banks
/// Sans `address`: liste complète des banks connues. Avec: bank valorisée.
async fn search_banks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddressQuery>,
) -> Result<Response, ApiError> {
    let metadata = load_combined_metadatas(&state.http).await?;

    let Some(address) = params.address else {
        return Ok(Json(bank_search_results(&metadata)).into_response());
    };

    let bank_metadata = metadata
        .get(&address)
        .ok_or_else(|| ApiError::not_found("Bank metadata not found for the given token symbol"))?
        .clone();

    let bank_address =
        Pubkey::from_str(&address).map_err(|_| ApiError::invalid("Invalid bank address"))?;

    let client = MarginfiClient::fetch(
        state.rpc.clone(),
        &state.birdeye,
        ProgramIds::marginfi_group(),
        WalletStub::default(),
        ClientOptions {
            preloaded_bank_addresses: Some(vec![bank_address]),
        },
    )
    .await?;

    let payload = resolve_bank_payload(
        &bank_address,
        &client.banks,
        &client.oracle_prices,
        &bank_metadata,
        true,
    )?;

    Ok(Json(payload).into_response())
}

/// Métadonnées par adresse de bank construites depuis le listing de pools.
/// Les pools au mint incomplet (nom/symbole absents) n'y contribuent pas.
fn arena_metadata_map(pools: &[ArenaPool]) -> BankMetadataMap {
    let mut map = BankMetadataMap::new();

    for pool in pools {
        let complete = pool.base_bank.mint.name.is_some()
            && pool.base_bank.mint.symbol.is_some()
            && pool.quote_bank.mint.name.is_some()
            && pool.quote_bank.mint.symbol.is_some();
        if !complete {
            continue;
        }

        for bank in [&pool.base_bank, &pool.quote_bank] {
            map.insert(
                bank.address.clone(),
                BankMetadata {
                    token_address: bank.mint.address.clone(),
                    token_name: bank.mint.name.clone().unwrap_or_default(),
                    token_symbol: bank.mint.symbol.clone().unwrap_or_default(),
                },
            );
        }
    }

    map
}

/// Résout le compte d'un wallet sur un pool arena. Tout échec par pool
/// écarte le pool, jamais la requête entière.
async fn resolve_arena_account(
    state: &AppState,
    pool: &ArenaPool,
    wallet: &Pubkey,
    metadata: &BankMetadataMap,
    pnl: &PnlDataMap,
) -> Option<Account> {
    let group = Pubkey::from_str(&pool.group).ok()?;
    let base = Pubkey::from_str(&pool.base_bank.address).ok()?;
    let quote = Pubkey::from_str(&pool.quote_bank.address).ok()?;

    let client = MarginfiClient::fetch(
        state.rpc.clone(),
        &state.birdeye,
        group,
        WalletStub {
            public_key: *wallet,
        },
        ClientOptions {
            preloaded_bank_addresses: Some(vec![base, quote]),
        },
    )
    .await
    .map_err(|e| log::warn!("⚠️ Pool {}: {}", pool.group, e))
    .ok()?;

    let base_bank = client.get_bank_by_pk(&base)?;
    let quote_bank = client.get_bank_by_pk(&quote)?;

    // Banks sans oracle configuré: pool écarté
    if base_bank.state.config.oracle_setup == OracleSetup::None
        || quote_bank.state.config.oracle_setup == OracleSetup::None
    {
        return None;
    }

    let accounts = client
        .get_accounts_for_authority(wallet)
        .await
        .map_err(|e| log::warn!("⚠️ Comptes du pool {}: {}", pool.group, e))
        .ok()?;
    let (address, header) = accounts.into_iter().next()?;

    let mut account = build_account(
        &address,
        &header,
        &client.banks,
        &client.oracle_prices,
        metadata,
    )
    .ok()?;

    account.position_details = Some(position_details(&account.balances, pool));
    account.pnl = pnl.get(&pool.group).map(|p| p.total_pnl_usd);
    account.group = Some(pool.group.clone());
    account.pool = Some(pool.clone());

    Some(account)
}

/// GET /api/search/arena/accounts
/// Comptes arena d'un wallet en ordre de découverte + taille totale
async fn search_arena_accounts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WalletQuery>,
) -> Result<Json<ArenaAccountsResponse>, ApiError> {
    let wallet_param = params
        .wallet
        .ok_or_else(|| ApiError::invalid("Wallet address is required"))?;
    let wallet = parse_wallet(&wallet_param)?;

    let pools = state.arena.list_pools().await.map_err(|e| {
        log::error!("❌ Listing pools: {:#}", e);
        ApiError::upstream("Internal Server Error")
    })?;

    // PnL optionnel: l'absence laisse le champ indéfini, jamais zéro
    let pnl = state
        .arena
        .pnl_for_wallet(&wallet_param)
        .await
        .unwrap_or_else(|e| {
            log::warn!("⚠️ PnL indisponible pour {}: {}", wallet_param, e);
            HashMap::new()
        });

    let metadata = arena_metadata_map(&pools);

    let results = join_all(
        pools
            .iter()
            .map(|pool| resolve_arena_account(&state, pool, &wallet, &metadata, &pnl)),
    )
    .await;

    let accounts: Vec<Account> = results.into_iter().flatten().collect();
    let total_portfolio_size_usd = accounts.iter().map(|a| a.portfolio_balance_usd).sum();

    Ok(Json(ArenaAccountsResponse {
        accounts,
        total_portfolio_size_usd,
    }))
}

/// GET /api/search/arena/pools?address=<group>
/// Les deux banks valorisées d'un pool arena
async fn search_arena_pool(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddressQuery>,
) -> Result<Json<ArenaPoolDetailResponse>, ApiError> {
    let group_address = params
        .address
        .ok_or_else(|| ApiError::invalid("Group address is required"))?;

    let pools = state.arena.list_pools().await.map_err(|e| {
        log::error!("❌ Listing pools: {:#}", e);
        ApiError::upstream("Internal Server Error")
    })?;

    let pool = pools
        .iter()
        .find(|p| p.group == group_address)
        .ok_or_else(|| ApiError::not_found("Pool not found"))?;

    let group =
        Pubkey::from_str(&pool.group).map_err(|_| ApiError::invalid("Invalid group address"))?;
    let base = Pubkey::from_str(&pool.base_bank.address)
        .map_err(|_| ApiError::invalid("Invalid bank address"))?;
    let quote = Pubkey::from_str(&pool.quote_bank.address)
        .map_err(|_| ApiError::invalid("Invalid bank address"))?;

    let client = MarginfiClient::fetch(
        state.rpc.clone(),
        &state.birdeye,
        group,
        WalletStub::default(),
        ClientOptions {
            preloaded_bank_addresses: Some(vec![base, quote]),
        },
    )
    .await?;

    let mut banks = Vec::with_capacity(2);
    for (address, arena_bank) in [(base, &pool.base_bank), (quote, &pool.quote_bank)] {
        let metadata = BankMetadata {
            token_address: arena_bank.mint.address.clone(),
            token_name: arena_bank.mint.name.clone().unwrap_or_default(),
            token_symbol: arena_bank.mint.symbol.clone().unwrap_or_default(),
        };

        banks.push(resolve_bank_payload(
            &address,
            &client.banks,
            &client.oracle_prices,
            &metadata,
            false,
        )?);
    }

    Ok(Json(ArenaPoolDetailResponse { banks }))
}

/// GET /api/search/arena/pools/all
/// Listing complet des pools arena (passthrough filtré)
async fn list_arena_pools(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ArenaPoolListResponse>, ApiError> {
    let pools = state.arena.list_pools().await.map_err(|e| {
        log::error!("❌ Listing pools: {:#}", e);
        ApiError::upstream("Internal Server Error")
    })?;

    let banks = pools
        .into_iter()
        .filter(|pool| !pool.base_bank.mint.address.is_empty())
        .collect();

    Ok(Json(ArenaPoolListResponse { banks }))
}

/// GET /api/search/marginfi/points
async fn search_points(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WalletQuery>,
) -> Result<Json<PointsData>, ApiError> {
    let wallet = params
        .wallet
        .ok_or_else(|| ApiError::invalid("Wallet is required"))?;

    Ok(Json(state.points.get_wallet_points(&wallet).await))
}

/// GET /api/prices?addresses=a,b,c
/// Proxy du service de prix externe
async fn get_prices(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PricesQuery>,
) -> Result<Json<crate::types::BirdeyePriceMap>, ApiError> {
    let addresses = params
        .addresses
        .ok_or_else(|| ApiError::invalid("Addresses are required"))?;

    let list: Vec<String> = addresses
        .split(',')
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();

    let prices = state.birdeye.get_prices(&list).await.map_err(|e| {
        log::error!("❌ Prix: {:#}", e);
        ApiError::upstream("Failed to fetch prices")
    })?;

    Ok(Json(prices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        BalanceState, BankConfig, BankOperationalState, BankState, InterestRateConfig,
        LendingAccount, RiskTier, WrappedI80F48, ASSET_TAG_DEFAULT,
    };
    use crate::types::{ArenaBank, ArenaBankDetails, ArenaMint};
    use axum::http::StatusCode;
    use rust_decimal::prelude::*;
    use rust_decimal::Decimal;

    fn test_bank() -> valuation::Bank {
        valuation::Bank::new(
            Pubkey::new_unique(),
            BankState {
                discriminator: [0; 8],
                mint: Pubkey::new_unique(),
                mint_decimals: 6,
                group: Pubkey::new_unique(),
                _pad0: [0; 7],
                asset_share_value: WrappedI80F48::from_f64(1.0),
                liability_share_value: WrappedI80F48::from_f64(1.0),
                liquidity_vault: Pubkey::new_unique(),
                liquidity_vault_bump: 0,
                liquidity_vault_authority_bump: 0,
                insurance_vault: Pubkey::new_unique(),
                insurance_vault_bump: 0,
                insurance_vault_authority_bump: 0,
                _pad1: [0; 4],
                collected_insurance_fees_outstanding: WrappedI80F48::default(),
                fee_vault: Pubkey::new_unique(),
                fee_vault_bump: 0,
                fee_vault_authority_bump: 0,
                _pad2: [0; 6],
                collected_group_fees_outstanding: WrappedI80F48::default(),
                total_liability_shares: WrappedI80F48::default(),
                total_asset_shares: WrappedI80F48::from_f64(10_000_000.0),
                last_update: 0,
                config: BankConfig {
                    asset_weight_init: WrappedI80F48::from_f64(0.8),
                    asset_weight_maint: WrappedI80F48::from_f64(0.9),
                    liability_weight_init: WrappedI80F48::from_f64(1.25),
                    liability_weight_maint: WrappedI80F48::from_f64(1.1),
                    deposit_limit: 1_000_000_000,
                    interest_rate_config: InterestRateConfig {
                        optimal_utilization_rate: WrappedI80F48::from_f64(0.8),
                        plateau_interest_rate: WrappedI80F48::from_f64(0.1),
                        max_interest_rate: WrappedI80F48::from_f64(3.0),
                        insurance_fee_fixed_apr: WrappedI80F48::default(),
                        insurance_ir_fee: WrappedI80F48::default(),
                        protocol_fixed_fee_apr: WrappedI80F48::default(),
                        protocol_ir_fee: WrappedI80F48::default(),
                        protocol_origination_fee: WrappedI80F48::default(),
                    },
                    operational_state: BankOperationalState::Operational,
                    oracle_setup: crate::state::OracleSetup::PythLegacy,
                    oracle_keys: [Pubkey::default(); 5],
                    _pad0: [0; 6],
                    borrow_limit: 500_000_000,
                    risk_tier: RiskTier::Collateral,
                    asset_tag: ASSET_TAG_DEFAULT,
                    _pad1: [0; 6],
                    total_asset_value_init_limit: 0,
                    oracle_max_age: 60,
                },
            },
        )
    }

    fn header_with_deposit(bank: &valuation::Bank, asset_shares: f64) -> MarginfiAccountHeader {
        let mut balances: [BalanceState; 16] = Default::default();
        balances[0] = BalanceState {
            active: true,
            bank_pk: bank.address,
            asset_shares: WrappedI80F48::from_f64(asset_shares),
            liability_shares: WrappedI80F48::default(),
            emissions_outstanding: WrappedI80F48::default(),
            last_update: 0,
            _padding: [0],
        };
        MarginfiAccountHeader {
            discriminator: [0; 8],
            group: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
            lending_account: LendingAccount {
                balances,
                _padding: [0; 8],
            },
        }
    }

    fn test_metadata() -> BankMetadata {
        BankMetadata {
            token_address: "Mint".to_string(),
            token_name: "Test".to_string(),
            token_symbol: "TEST".to_string(),
        }
    }

    #[test]
    fn test_parse_wallet_rejects_malformed_before_any_chain_call() {
        let err = parse_wallet("pas-une-adresse").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid wallet address");
    }

    #[test]
    fn test_parse_wallet_accepts_valid_base58() {
        let key = Pubkey::new_unique();
        assert_eq!(parse_wallet(&key.to_string()).unwrap(), key);
    }

    #[test]
    fn test_bank_search_results_sorted_by_symbol() {
        let mut metadata = BankMetadataMap::new();
        metadata.insert(
            "Bank2".to_string(),
            BankMetadata {
                token_address: "M2".to_string(),
                token_name: "Usdc".to_string(),
                token_symbol: "USDC".to_string(),
            },
        );
        metadata.insert(
            "Bank1".to_string(),
            BankMetadata {
                token_address: "M1".to_string(),
                token_name: "Bonk".to_string(),
                token_symbol: "BONK".to_string(),
            },
        );

        let results = bank_search_results(&metadata);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].token_symbol, "BONK");
        assert_eq!(results[1].token_symbol, "USDC");
        assert_eq!(results[1].address, "Bank2");
    }

    fn pool_with_names(named: bool) -> ArenaPool {
        let mint = |suffix: &str| ArenaMint {
            address: format!("Mint{}", suffix),
            decimals: 6,
            name: named.then(|| format!("Token{}", suffix)),
            symbol: named.then(|| format!("TK{}", suffix)),
            token_program: String::new(),
        };
        ArenaPool {
            group: "G".to_string(),
            base_bank: ArenaBank {
                address: "BaseBank".to_string(),
                group: "G".to_string(),
                mint: mint("B"),
                details: ArenaBankDetails::default(),
            },
            quote_bank: ArenaBank {
                address: "QuoteBank".to_string(),
                group: "G".to_string(),
                mint: mint("Q"),
                details: ArenaBankDetails::default(),
            },
            lookup_tables: vec![],
            featured: false,
            created_at: String::new(),
            created_by: String::new(),
        }
    }

    #[test]
    fn test_aggregate_accounts_zero_accounts_is_empty() {
        // wallet sans compte: liste vide, jamais une erreur
        let out = aggregate_accounts(
            &[],
            &HashMap::new(),
            &HashMap::new(),
            &BankMetadataMap::new(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_aggregate_accounts_sorted_by_portfolio_desc() {
        let bank = test_bank();
        let mut banks = HashMap::new();
        banks.insert(bank.address, bank.clone());
        let mut prices = HashMap::new();
        prices.insert(bank.address, OraclePrice::from_spot(Decimal::ONE));

        // le petit compte arrive en premier, le gros doit sortir en premier
        let accounts = vec![
            (Pubkey::new_unique(), header_with_deposit(&bank, 1_000_000.0)),
            (Pubkey::new_unique(), header_with_deposit(&bank, 5_000_000.0)),
        ];

        let out = aggregate_accounts(&accounts, &banks, &prices, &BankMetadataMap::new());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].address, accounts[1].0.to_string());
        assert!(out[0].portfolio_balance_usd > out[1].portfolio_balance_usd);
    }

    #[test]
    fn test_resolve_bank_payload_unknown_bank_not_found() {
        let err = resolve_bank_payload(
            &Pubkey::new_unique(),
            &HashMap::new(),
            &HashMap::new(),
            &test_metadata(),
            true,
        )
        .unwrap_err();

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Bank not found");
    }

    #[test]
    fn test_resolve_bank_payload_missing_price_not_found() {
        let bank = test_bank();
        let mut banks = HashMap::new();
        banks.insert(bank.address, bank.clone());

        let err = resolve_bank_payload(
            &bank.address,
            &banks,
            &HashMap::new(),
            &test_metadata(),
            false,
        )
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Price not found for bank");

        // bank + prix résolus: payload complet
        let mut prices = HashMap::new();
        prices.insert(bank.address, OraclePrice::from_spot(Decimal::TWO));
        let payload =
            resolve_bank_payload(&bank.address, &banks, &prices, &test_metadata(), false)
                .unwrap();
        assert_eq!(payload.address, bank.address.to_string());
        assert_eq!(payload.total_assets_usd, 20.0);
    }

    #[test]
    fn test_arena_metadata_map_skips_incomplete_mints() {
        let map = arena_metadata_map(&[pool_with_names(false)]);
        assert!(map.is_empty());

        let map = arena_metadata_map(&[pool_with_names(true)]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["BaseBank"].token_symbol, "TKB");
        assert_eq!(map["QuoteBank"].token_address, "MintQ");
    }
}
