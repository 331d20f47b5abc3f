// ============================================================================
// Wallet provider (surface EIP-1193)
// ============================================================================
// Le cœur n'utilise qu'une surface étroite du wallet :
// - request({ method }) pour eth_accounts / eth_requestAccounts / eth_chainId
// - les événements accountsChanged / chainChanged
//
// Hors navigateur, RpcWalletProvider parle JSON-RPC à l'endpoint du wallet
// (nœud local, daemon wallet) et détecte les changements par polling.
//
// CONCEPTS RUST :
// 1. Trait + implémentation réelle + mock de test
// 2. Closure FnMut pour émettre les événements (équivalent de .on(...))
// 3. tokio::time::interval : boucle périodique async
// ============================================================================

use std::future::Future;
use std::time::Duration;

use alloy_primitives::Address;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::api::rpc::{parse_accounts, parse_chain_id, JsonRpcClient, RpcError};
use crate::models::ChainId;

/// Méthodes EIP-1193 utilisées par l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderMethod {
    /// Comptes déjà autorisés (ne demande rien à l'utilisateur)
    Accounts,

    /// Demande d'accès aux comptes (peut afficher une confirmation)
    RequestAccounts,

    /// Chaîne active du wallet
    ChainId,
}

impl ProviderMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accounts => "eth_accounts",
            Self::RequestAccounts => "eth_requestAccounts",
            Self::ChainId => "eth_chainId",
        }
    }
}

/// Événements émis par le wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// Nouvelle liste de comptes (vide = plus aucun compte autorisé)
    AccountsChanged(Vec<Address>),

    /// Le wallet a changé de chaîne
    ChainChanged(ChainId),
}

/// Wallet provider injecté
pub trait WalletProvider: Send + Sync {
    /// request({ method }) : renvoie le "result" JSON brut
    fn request(&self, method: ProviderMethod) -> impl Future<Output = Result<Value, RpcError>> + Send;
}

// ============================================================================
// Implémentation JSON-RPC
// ============================================================================

/// Wallet provider joint par JSON-RPC
pub struct RpcWalletProvider {
    rpc: JsonRpcClient,
}

impl RpcWalletProvider {
    pub fn new(url: &str) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: JsonRpcClient::new(url)?,
        })
    }

    /// Surveille les comptes et la chaîne, émet un événement à chaque changement
    ///
    /// CONCEPT : Polling différentiel
    /// - Premier tour : établit la référence, aucun événement
    /// - Tours suivants : compare et émet seulement les différences
    /// - Une erreur de lecture saute le tour (best-effort)
    pub async fn watch<F>(&self, interval: Duration, mut on_event: F)
    where
        F: FnMut(WalletEvent) + Send,
    {
        info!(host = %self.rpc.host(), ?interval, "Watching wallet provider");

        let mut ticker = tokio::time::interval(interval);
        let mut state = WatchState::default();

        loop {
            ticker.tick().await;

            let accounts = match self.request(ProviderMethod::Accounts).await {
                Ok(value) => parse_accounts(&value)
                    .map_err(|e| warn!(error = %e, "Unreadable eth_accounts response"))
                    .ok(),
                Err(e) => {
                    warn!(error = %e, "eth_accounts poll failed");
                    None
                }
            };

            let chain = match self.request(ProviderMethod::ChainId).await {
                Ok(value) => parse_chain_id(&value)
                    .map_err(|e| warn!(error = %e, "Unreadable eth_chainId response"))
                    .ok(),
                Err(e) => {
                    warn!(error = %e, "eth_chainId poll failed");
                    None
                }
            };

            for event in state.observe(accounts, chain) {
                debug!(?event, "Wallet event");
                on_event(event);
            }
        }
    }
}

impl WalletProvider for RpcWalletProvider {
    async fn request(&self, method: ProviderMethod) -> Result<Value, RpcError> {
        self.rpc.call(method.as_str(), json!([])).await
    }
}

/// Dernier état connu du wallet (pour le polling différentiel)
#[derive(Debug, Default)]
pub struct WatchState {
    accounts: Option<Vec<Address>>,
    chain: Option<ChainId>,
}

impl WatchState {
    /// Intègre une nouvelle observation, retourne les événements à émettre
    ///
    /// None = lecture échouée : on garde l'ancienne valeur sans rien émettre
    pub fn observe(
        &mut self,
        accounts: Option<Vec<Address>>,
        chain: Option<ChainId>,
    ) -> Vec<WalletEvent> {
        let mut events = Vec::new();

        if let Some(chain) = chain {
            if let Some(previous) = self.chain {
                if previous != chain {
                    events.push(WalletEvent::ChainChanged(chain));
                }
            }
            self.chain = Some(chain);
        }

        if let Some(accounts) = accounts {
            if let Some(previous) = &self.accounts {
                if *previous != accounts {
                    events.push(WalletEvent::AccountsChanged(accounts.clone()));
                }
            }
            self.accounts = Some(accounts);
        }

        events
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
