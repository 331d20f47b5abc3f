// ============================================================================
// Wallet Session Manager (partie async)
// ============================================================================
// Toutes les opérations qui attendent le wallet ou la chaîne :
// - load_token_metadata : connexion read-only, indépendante du wallet
// - connect / restore / establish : négociation avec le wallet provider
// - get_balance : balanceOf via le handle lié au compte connecté
//
// L'état de session lui-même vit dans App (partie synchrone). Le manager est
// sans état mutable, à part le cache des décimales.
//
// CONCEPTS RUST :
// 1. Génériques P: WalletProvider, C: TokenContract (vrai réseau ou mocks)
// 2. tokio::sync::OnceCell : cache initialisé une seule fois, même en concurrence
// 3. tokio::join! : name et symbol lus en parallèle
// ============================================================================

use alloy_primitives::Address;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::api::rpc::{parse_accounts, parse_chain_id};
use crate::api::TokenContract;
use crate::models::{Balance, ChainId, TokenDescriptor, WalletSession};
use crate::wallet::error::SessionError;
use crate::wallet::provider::{ProviderMethod, WalletProvider};

/// Wallet Session Manager
pub struct WalletSessionManager<P, C> {
    /// None = aucun wallet détecté
    provider: Option<P>,

    /// Handle read-only du contrat
    contract: C,

    /// Chaîne sur laquelle les actions sont autorisées
    expected_chain: ChainId,

    /// Décimales, mises en cache après la première lecture réussie
    decimals: OnceCell<u8>,
}

impl<P, C> WalletSessionManager<P, C>
where
    P: WalletProvider,
    C: TokenContract,
{
    pub fn new(provider: Option<P>, contract: C, expected_chain: ChainId) -> Self {
        Self {
            provider,
            contract,
            expected_chain,
            decimals: OnceCell::new(),
        }
    }

    /// Un wallet est-il disponible ?
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Wallet provider injecté (pour les watchers)
    pub fn wallet(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    /// Handle read-only du contrat
    pub fn contract(&self) -> &C {
        &self.contract
    }

    /// Décimales en cache (None tant qu'aucune lecture n'a réussi)
    pub fn cached_decimals(&self) -> Option<u8> {
        self.decimals.get().copied()
    }

    fn provider(&self) -> Result<&P, SessionError> {
        self.provider.as_ref().ok_or(SessionError::NoProviderAvailable)
    }

    // ========================================================================
    // Métadonnées
    // ========================================================================

    /// Lit les métadonnées du token sans wallet
    ///
    /// Les décimales sont obligatoires ; name/symbol sont best-effort.
    #[instrument(skip(self), fields(token = %self.contract.address()))]
    pub async fn load_token_metadata(&self) -> Result<TokenDescriptor, SessionError> {
        let decimals = *self
            .decimals
            .get_or_try_init(|| self.contract.decimals())
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to read token decimals");
                SessionError::MetadataFetchFailed(e)
            })?;

        let (name, symbol) = tokio::join!(self.contract.name(), self.contract.symbol());

        let name = name
            .map_err(|e| warn!(error = %e, "Failed to read token name"))
            .ok();
        let symbol = symbol
            .map_err(|e| warn!(error = %e, "Failed to read token symbol"))
            .ok();

        info!(decimals, ?name, ?symbol, "Token metadata loaded");
        Ok(TokenDescriptor {
            contract_address: self.contract.address(),
            name,
            symbol,
            decimals,
        })
    }

    // ========================================================================
    // Connexion
    // ========================================================================

    /// Demande l'accès aux comptes (eth_requestAccounts) puis établit la session
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<WalletSession, SessionError> {
        let provider = self.provider()?;

        let value = provider
            .request(ProviderMethod::RequestAccounts)
            .await
            .map_err(SessionError::from_provider)?;
        let accounts = parse_accounts(&value).map_err(SessionError::ProviderFailure)?;

        // Un wallet qui répond [] à une demande explicite a refusé
        let account = accounts.first().copied().ok_or(SessionError::UserRejected)?;

        self.establish(account).await
    }

    /// Auto-connexion au démarrage : comptes déjà autorisés, sans prompt
    ///
    /// Ok(None) : le wallet n'a autorisé aucun compte
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<WalletSession>, SessionError> {
        let provider = self.provider()?;

        let value = provider
            .request(ProviderMethod::Accounts)
            .await
            .map_err(SessionError::from_provider)?;
        let accounts = parse_accounts(&value).map_err(SessionError::ProviderFailure)?;

        match accounts.first() {
            Some(&account) => self.establish(account).await.map(Some),
            None => {
                debug!("No previously authorized account");
                Ok(None)
            }
        }
    }

    /// Établit la session pour un compte déjà autorisé (aucun prompt)
    ///
    /// La chaîne est lue mais pas validée ici : App affiche "wrong network"
    /// et get_balance refuse tant que la chaîne ne correspond pas.
    #[instrument(skip(self))]
    pub async fn establish(&self, account: Address) -> Result<WalletSession, SessionError> {
        let provider = self.provider()?;

        let value = provider
            .request(ProviderMethod::ChainId)
            .await
            .map_err(SessionError::from_provider)?;
        let chain_id = parse_chain_id(&value).map_err(SessionError::ProviderFailure)?;

        if chain_id != self.expected_chain {
            warn!(expected = %self.expected_chain, actual = %chain_id, "Wallet is on the wrong network");
        }

        info!(%account, chain = %chain_id, "Wallet session established");
        Ok(WalletSession::new(account, chain_id))
    }

    // ========================================================================
    // Balance
    // ========================================================================

    /// Balance du compte connecté, formatée avec les décimales
    ///
    /// CONCEPT : Handle lié au signer
    /// - bind_signer(account) : appels émis au nom du compte connecté
    /// - Si les décimales n'ont pas pu être lues au démarrage, on les relit ici
    #[instrument(skip(self, session))]
    pub async fn get_balance(&self, session: Option<&WalletSession>) -> Result<Balance, SessionError> {
        let session = session
            .filter(|s| s.is_connected)
            .ok_or(SessionError::NotConnected)?;

        if session.chain_id != self.expected_chain {
            return Err(SessionError::WrongNetwork {
                expected: self.expected_chain,
                actual: session.chain_id,
            });
        }

        let signer = self.contract.bind_signer(session.account);

        let raw = signer
            .balance_of(session.account)
            .await
            .map_err(SessionError::BalanceFetchFailed)?;

        let decimals = *self
            .decimals
            .get_or_try_init(|| signer.decimals())
            .await
            .map_err(SessionError::BalanceFetchFailed)?;

        let balance = Balance::new(raw, decimals);
        debug!(account = %session.account, balance = %balance, "Balance fetched");
        Ok(balance)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
