// ============================================================================
// Mocks de test : wallet provider et contrat ERC-20 en mémoire
// ============================================================================
// CONCEPT : Arc<Mutex<...>> partagé
// - Le test garde un clone pour piloter le mock (autoriser, rejeter, etc.)
// - Le manager possède l'autre clone
// ============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{address, Address, U256};
use serde_json::{json, Value};

use crate::api::{RpcError, TokenContract};
use crate::models::ChainId;
use crate::wallet::provider::{ProviderMethod, WalletProvider};

pub const ALICE: Address = address!("0x1111111111111111111111111111111111111111");
pub const BOB: Address = address!("0x2222222222222222222222222222222222222222");

// ============================================================================
// MockProvider
// ============================================================================

#[derive(Debug, Default)]
struct ProviderState {
    accounts: Vec<Address>,
    authorized: bool,
    reject: bool,
    chain: u64,
    calls: Vec<ProviderMethod>,
}

/// Wallet en mémoire
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl MockProvider {
    /// Wallet avec ces comptes, pas encore autorisé
    pub fn new(accounts: Vec<Address>, chain: ChainId) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProviderState {
                accounts,
                chain: chain.value(),
                ..ProviderState::default()
            })),
        }
    }

    /// Simule une autorisation donnée lors d'une visite précédente
    pub fn authorize(&self) {
        self.state.lock().unwrap().authorized = true;
    }

    /// Toutes les demandes eth_requestAccounts seront refusées (code 4001)
    pub fn reject_requests(&self, reject: bool) {
        self.state.lock().unwrap().reject = reject;
    }

    pub fn set_chain(&self, chain: ChainId) {
        self.state.lock().unwrap().chain = chain.value();
    }

    /// Méthodes appelées, dans l'ordre
    pub fn calls(&self) -> Vec<ProviderMethod> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl WalletProvider for MockProvider {
    async fn request(&self, method: ProviderMethod) -> Result<Value, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method);

        match method {
            ProviderMethod::Accounts => {
                if state.authorized {
                    Ok(json!(state.accounts))
                } else {
                    Ok(json!([]))
                }
            }
            ProviderMethod::RequestAccounts => {
                if state.reject {
                    return Err(RpcError::Rpc {
                        code: RpcError::USER_REJECTED_CODE,
                        message: "User rejected the request.".to_string(),
                    });
                }
                state.authorized = true;
                Ok(json!(state.accounts))
            }
            ProviderMethod::ChainId => Ok(json!(ChainId(state.chain).to_string())),
        }
    }
}

// ============================================================================
// MockToken
// ============================================================================

#[derive(Debug, Default)]
struct TokenState {
    decimals: u8,
    name: Option<String>,
    symbol: Option<String>,
    balances: HashMap<Address, U256>,
    fail_decimals: bool,
    fail_balance: bool,
    last_signer: Option<Address>,
}

/// Contrat ERC-20 en mémoire
#[derive(Debug, Clone)]
pub struct MockToken {
    state: Arc<Mutex<TokenState>>,
    decimals_calls: Arc<AtomicUsize>,
    signer: Option<Address>,
}

impl MockToken {
    pub fn new(decimals: u8) -> Self {
        Self {
            state: Arc::new(Mutex::new(TokenState {
                decimals,
                ..TokenState::default()
            })),
            decimals_calls: Arc::new(AtomicUsize::new(0)),
            signer: None,
        }
    }

    pub fn with_name(self, name: &str, symbol: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.name = Some(name.to_string());
            state.symbol = Some(symbol.to_string());
        }
        self
    }

    pub fn set_balance(&self, account: Address, balance: U256) {
        self.state.lock().unwrap().balances.insert(account, balance);
    }

    pub fn fail_decimals(&self, fail: bool) {
        self.state.lock().unwrap().fail_decimals = fail;
    }

    pub fn fail_balance(&self, fail: bool) {
        self.state.lock().unwrap().fail_balance = fail;
    }

    /// Nombre d'appels decimals() ayant atteint le "nœud"
    pub fn decimals_calls(&self) -> usize {
        self.decimals_calls.load(Ordering::SeqCst)
    }

    /// Dernier compte ayant émis un balanceOf
    pub fn last_signer(&self) -> Option<Address> {
        self.state.lock().unwrap().last_signer
    }

    fn unavailable(what: &str) -> RpcError {
        RpcError::Transport(format!("{}: node unavailable", what))
    }
}

impl TokenContract for MockToken {
    fn address(&self) -> Address {
        address!("0x7F0c6e462e391E08625DAa30a83F40607867c706")
    }

    fn bind_signer(&self, account: Address) -> Self {
        Self {
            state: Arc::clone(&self.state),
            decimals_calls: Arc::clone(&self.decimals_calls),
            signer: Some(account),
        }
    }

    async fn decimals(&self) -> Result<u8, RpcError> {
        self.decimals_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_decimals {
            return Err(Self::unavailable("decimals"));
        }
        Ok(state.decimals)
    }

    async fn name(&self) -> Result<String, RpcError> {
        let state = self.state.lock().unwrap();
        state.name.clone().ok_or_else(|| Self::unavailable("name"))
    }

    async fn symbol(&self) -> Result<String, RpcError> {
        let state = self.state.lock().unwrap();
        state.symbol.clone().ok_or_else(|| Self::unavailable("symbol"))
    }

    async fn balance_of(&self, account: Address) -> Result<U256, RpcError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_balance {
            return Err(Self::unavailable("balanceOf"));
        }
        state.last_signer = self.signer;
        Ok(state.balances.get(&account).copied().unwrap_or(U256::ZERO))
    }
}
