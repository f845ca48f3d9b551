//! Client chain marginfi: chargement des banks et comptes décodés
//! Table de lookup immuable construite une fois par requête, lue partout

use anyhow::{anyhow, Result};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;

use crate::birdeye::BirdeyeClient;
use crate::config::ProgramIds;
use crate::oracle::OraclePrice;
use crate::state::{
    BankState, MarginfiAccountHeader, ACCOUNT_AUTHORITY_OFFSET, ACCOUNT_GROUP_OFFSET,
    BANK_GROUP_OFFSET, MARGINFI_ACCOUNT_SIZE,
};
use crate::valuation::Bank;

/// Limite getMultipleAccounts par appel RPC
const MULTIPLE_ACCOUNTS_CHUNK: usize = 100;

/// Capacité wallet minimale passée au client: une clé publique, AUCUNE
/// méthode de signature. Les chemins de valorisation ne signent jamais.
#[derive(Debug, Clone, Copy)]
pub struct WalletStub {
    pub public_key: Pubkey,
}

impl Default for WalletStub {
    fn default() -> Self {
        Self {
            public_key: Pubkey::default(),
        }
    }
}

/// Options de chargement du client
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Adresses de banks à charger directement (getMultipleAccounts)
    /// au lieu d'un scan complet du group
    pub preloaded_bank_addresses: Option<Vec<Pubkey>>,
}

/// Client marginfi en lecture seule, état figé pour la durée d'une requête
pub struct MarginfiClient {
    rpc: Arc<RpcClient>,
    pub group: Pubkey,
    pub wallet: WalletStub,
    /// Banks décodées du group, indexées par adresse
    pub banks: HashMap<Pubkey, Bank>,
    /// Prix oracle par adresse de bank (spot au moment du fetch)
    pub oracle_prices: HashMap<Pubkey, OraclePrice>,
}

impl MarginfiClient {
    /// Charge banks + prix pour un group. Les comptes indécodables et les
    /// mints sans prix sont écartés avec log, jamais fatals.
    pub async fn fetch(
        rpc: Arc<RpcClient>,
        birdeye: &BirdeyeClient,
        group: Pubkey,
        wallet: WalletStub,
        options: ClientOptions,
    ) -> Result<Self> {
        let banks = match &options.preloaded_bank_addresses {
            Some(addresses) => Self::load_banks_by_address(&rpc, addresses).await?,
            None => Self::load_banks_for_group(&rpc, &group).await?,
        };

        log::debug!("{} banks chargées pour le group {}", banks.len(), group);

        let oracle_prices = Self::load_oracle_prices(birdeye, &banks).await?;

        Ok(Self {
            rpc,
            group,
            wallet,
            banks,
            oracle_prices,
        })
    }

    async fn load_banks_by_address(
        rpc: &RpcClient,
        addresses: &[Pubkey],
    ) -> Result<HashMap<Pubkey, Bank>> {
        let mut banks = HashMap::new();

        for chunk in addresses.chunks(MULTIPLE_ACCOUNTS_CHUNK) {
            let accounts = rpc
                .get_multiple_accounts(chunk)
                .await
                .map_err(|e| anyhow!("RPC error banks: {}", e))?;

            for (address, account) in chunk.iter().zip(accounts) {
                let Some(account) = account else {
                    log::debug!("bank {} absente on-chain", address);
                    continue;
                };
                match BankState::from_account_data(&account.data) {
                    Some(state) => {
                        banks.insert(*address, Bank::new(*address, state));
                    }
                    None => log::debug!("bank {} indécodable", address),
                }
            }
        }

        Ok(banks)
    }

    async fn load_banks_for_group(
        rpc: &RpcClient,
        group: &Pubkey,
    ) -> Result<HashMap<Pubkey, Bank>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                BANK_GROUP_OFFSET,
                group.to_bytes().to_vec(),
            ))]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                data_slice: None,
                commitment: Some(CommitmentConfig::confirmed()),
                min_context_slot: None,
            },
            with_context: Some(false),
        };

        let accounts = rpc
            .get_program_accounts_with_config(&ProgramIds::marginfi(), config)
            .await
            .map_err(|e| anyhow!("RPC error banks: {}", e))?;

        let mut banks = HashMap::new();
        for (address, account) in accounts {
            match BankState::from_account_data(&account.data) {
                Some(state) => {
                    banks.insert(address, Bank::new(address, state));
                }
                None => log::debug!("bank {} indécodable", address),
            }
        }

        Ok(banks)
    }

    /// Construit la table de prix par bank depuis les prix spot des mints.
    /// Une bank dont le mint n'a pas de prix reste absente de la table.
    async fn load_oracle_prices(
        birdeye: &BirdeyeClient,
        banks: &HashMap<Pubkey, Bank>,
    ) -> Result<HashMap<Pubkey, OraclePrice>> {
        let mut mints: Vec<String> = banks.values().map(|b| b.mint().to_string()).collect();
        mints.sort();
        mints.dedup();

        let prices = birdeye.get_prices(&mints).await?;

        let mut oracle_prices = HashMap::new();
        for bank in banks.values() {
            let mint = bank.mint().to_string();
            match prices.get(&mint).and_then(|p| Decimal::from_f64(p.value)) {
                Some(price) => {
                    oracle_prices.insert(bank.address, OraclePrice::from_spot(price));
                }
                None => log::debug!("pas de prix pour le mint {}", mint),
            }
        }

        Ok(oracle_prices)
    }

    pub fn get_bank_by_pk(&self, address: &Pubkey) -> Option<&Bank> {
        self.banks.get(address)
    }

    /// Comptes marginfi du group appartenant à une authority
    pub async fn get_accounts_for_authority(
        &self,
        authority: &Pubkey,
    ) -> Result<Vec<(Pubkey, MarginfiAccountHeader)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![
                RpcFilterType::DataSize(MARGINFI_ACCOUNT_SIZE),
                RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                    ACCOUNT_GROUP_OFFSET,
                    self.group.to_bytes().to_vec(),
                )),
                RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                    ACCOUNT_AUTHORITY_OFFSET,
                    authority.to_bytes().to_vec(),
                )),
            ]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                data_slice: None,
                commitment: Some(CommitmentConfig::confirmed()),
                min_context_slot: None,
            },
            with_context: Some(false),
        };

        let accounts = self
            .rpc
            .get_program_accounts_with_config(&ProgramIds::marginfi(), config)
            .await
            .map_err(|e| anyhow!("RPC error comptes: {}", e))?;

        let mut decoded = Vec::new();
        for (address, account) in accounts {
            match MarginfiAccountHeader::from_account_data(&account.data) {
                Some(header) => decoded.push((address, header)),
                None => log::debug!("compte {} indécodable", address),
            }
        }

        Ok(decoded)
    }
}
