// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Les handlers retournent des AppCommand au lieu de faire l'I/O eux-mêmes
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - La partie async (wallet, RPC) vit dans le worker, App reste synchrone
// ============================================================================

use alloy_primitives::Address;
use tracing::{debug, info, warn};

use crate::api::TransferLog;
use crate::config::Config;
use crate::models::{Balance, BalanceView, ChainId, MetadataStatus, TokenDescriptor, WalletSession};
use crate::wallet::{SessionError, WalletEvent};
use crate::worker::{AppCommand, AppResult, Ticket};

// ============================================================================
// Enum : ConnectionStatus
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Un seul état de connexion à la fois
// - Le compilateur force à gérer tous les cas (exhaustivité)
// ============================================================================

/// État de connexion affiché dans le panneau wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Aucun wallet détecté : connect désactivé
    NoProvider,

    /// Wallet présent, pas de session
    Disconnected,

    /// Demande de comptes en cours
    Connecting,

    /// Session active (éventuellement sur la mauvaise chaîne)
    Connected,

    /// La dernière tentative a échoué
    Failed,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::NoProvider => "Web3 wallet not detected.",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Failed => "Connection failed.",
        }
    }
}

/// Dernier résultat de balanceOf pour l'époque courante
#[derive(Debug, Clone, PartialEq, Eq)]
enum BalanceFetch {
    Idle,
    Loading,
    Ready(Balance),
    Failed,
}

const INSTALL_PROMPT: &str = "Please install a Web3 wallet (set ZART_WALLET_URL) to connect.";
const BUY_SELL_INFO: &str = "Buy/Sell functionality coming soon! This would integrate with a DEX.";
const FAUCET_INFO: &str = "Faucet functionality coming soon! This would allow claiming test ZART.";

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Indique si l'utilisateur a demandé à quitter (attend confirmation)
    /// CONCEPT : Two-step quit pour éviter les sorties accidentelles
    /// - Première pression de 'q' : confirm_quit = true
    /// - Deuxième pression de 'q' : running = false (quit réel)
    /// - N'importe quelle autre touche : confirm_quit = false (annulation)
    pub confirm_quit: bool,

    /// Un wallet provider est-il configuré ?
    pub provider_available: bool,

    /// Chaîne sur laquelle les actions sont autorisées
    pub expected_chain: ChainId,

    /// Adresse du contrat (affichée avant même le chargement des métadonnées)
    pub token_address: Address,

    /// Lien explorer vers la page du token
    pub explorer_link: String,

    /// Métadonnées du token
    pub metadata: MetadataStatus,

    /// État de connexion
    pub connection: ConnectionStatus,

    /// Session active
    /// CONCEPT : Option = au plus une session à la fois
    pub session: Option<WalletSession>,

    /// Dernière chaîne observée côté wallet (même sans session)
    pub wallet_chain: Option<ChainId>,

    /// Ligne d'information (erreurs, placeholders, mauvais réseau)
    pub action_info: Option<String>,

    /// Balance lue pour l'époque courante
    balance: BalanceFetch,

    /// Époque de session
    /// CONCEPT : Last-writer-wins
    /// - Incrémentée par chaque action qui change la session
    /// - Les résultats d'une époque dépassée sont ignorés
    epoch: u64,

    /// La chaîne a changé pendant une connexion en vol : la chaîne lue par
    /// cette connexion peut être périmée
    recheck_chain: bool,
}

impl App {
    /// Crée l'état initial à partir de la configuration
    pub fn new(config: &Config, provider_available: bool) -> Self {
        let (connection, action_info) = if provider_available {
            (ConnectionStatus::Disconnected, None)
        } else {
            (ConnectionStatus::NoProvider, Some(INSTALL_PROMPT.to_string()))
        };

        Self {
            running: true,
            confirm_quit: false,
            provider_available,
            expected_chain: config.expected_chain_id,
            token_address: config.contract_address,
            explorer_link: config.token_explorer_url(),
            metadata: MetadataStatus::Loading,
            connection,
            session: None,
            wallet_chain: None,
            action_info,
            balance: BalanceFetch::Idle,
            epoch: 0,
            recheck_chain: false,
        }
    }

    /// Commandes à lancer au démarrage
    ///
    /// - Métadonnées : toujours (connexion read-only, sans wallet)
    /// - Auto-connexion : seulement si un wallet est présent
    pub fn startup(&mut self) -> Vec<AppCommand> {
        let mut commands = vec![AppCommand::LoadMetadata];
        if self.provider_available {
            let ticket = self.next_ticket();
            commands.push(AppCommand::Restore { ticket });
        }
        commands
    }

    // ========================================================================
    // Quit
    // ========================================================================

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Demande la confirmation de quitter
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    /// Annule la demande de quit
    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    /// Vérifie si on attend la confirmation de quit
    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Époque de session
    // ========================================================================

    /// Ouvre une nouvelle époque : tout résultat en vol devient obsolète
    fn next_ticket(&mut self) -> Ticket {
        self.epoch += 1;
        self.balance = BalanceFetch::Idle;
        self.recheck_chain = false;
        Ticket(self.epoch)
    }

    fn current_ticket(&self) -> Ticket {
        Ticket(self.epoch)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket == self.current_ticket()
    }

    // ========================================================================
    // Vues dérivées
    // ========================================================================

    /// Balance à afficher
    ///
    /// CONCEPT : Vue dérivée
    /// - Recalculée à chaque lecture depuis la session et la chaîne
    /// - Impossible d'afficher un nombre obsolète après un changement de chaîne
    pub fn balance_view(&self) -> BalanceView {
        match &self.session {
            Some(session) if session.is_connected => {
                if !session.is_on(self.expected_chain) {
                    return BalanceView::WrongNetwork;
                }
                match &self.balance {
                    BalanceFetch::Idle => BalanceView::Unavailable,
                    BalanceFetch::Loading => BalanceView::Loading,
                    BalanceFetch::Ready(balance) => BalanceView::Ready(balance.clone()),
                    BalanceFetch::Failed => BalanceView::Error,
                }
            }
            _ => BalanceView::Unavailable,
        }
    }

    /// Le bouton connect est-il actif ?
    pub fn connect_enabled(&self) -> bool {
        self.provider_available
    }

    /// Buy/sell et faucet : session active sur la chaîne attendue
    pub fn actions_enabled(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.is_connected && s.is_on(self.expected_chain))
            .unwrap_or(false)
    }

    /// Libellé du bouton connect
    pub fn connect_label(&self) -> &'static str {
        if self.session.is_some() {
            "Disconnect Wallet"
        } else {
            "Connect Wallet"
        }
    }

    /// Compte connecté, ou "N/A"
    pub fn account_label(&self) -> String {
        self.session
            .as_ref()
            .map(|s| s.account.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    // ========================================================================
    // Actions utilisateur
    // ========================================================================

    /// Bouton connect/disconnect
    pub fn toggle_connect(&mut self) -> Vec<AppCommand> {
        if !self.provider_available {
            self.action_info = Some(INSTALL_PROMPT.to_string());
            return Vec::new();
        }

        if self.session.is_some() {
            self.disconnect();
            return Vec::new();
        }

        info!("Requesting wallet connection");
        self.connection = ConnectionStatus::Connecting;
        self.action_info = None;
        let ticket = self.next_ticket();
        vec![AppCommand::Connect { ticket }]
    }

    /// Efface la session (idempotent)
    ///
    /// Les requêtes en vol sont invalidées, rien n'est annulé.
    pub fn disconnect(&mut self) {
        if self.session.is_some() {
            info!("Wallet disconnected");
        }
        self.session = None;
        self.connection = if self.provider_available {
            ConnectionStatus::Disconnected
        } else {
            ConnectionStatus::NoProvider
        };
        self.next_ticket();
    }

    /// Rafraîchit la balance (touche 'r' ou Transfer observé)
    pub fn refresh_balance(&mut self) -> Vec<AppCommand> {
        match &self.session {
            Some(session) if self.actions_enabled() => {
                let session = session.clone();
                // La valeur précédente reste affichée pendant la relecture
                if !matches!(self.balance, BalanceFetch::Ready(_)) {
                    self.balance = BalanceFetch::Loading;
                }
                vec![AppCommand::FetchBalance {
                    session,
                    ticket: self.current_ticket(),
                }]
            }
            _ => {
                debug!("Balance refresh ignored: no session on the expected chain");
                Vec::new()
            }
        }
    }

    /// Placeholder buy/sell
    pub fn buy_sell(&mut self) {
        if self.actions_enabled() {
            self.action_info = Some(BUY_SELL_INFO.to_string());
        }
    }

    /// Placeholder faucet
    pub fn faucet(&mut self) {
        if self.actions_enabled() {
            self.action_info = Some(FAUCET_INFO.to_string());
        }
    }

    // ========================================================================
    // Événements du wallet
    // ========================================================================

    /// accountsChanged : premier compte = connexion silencieuse, [] = déconnexion
    pub fn on_accounts_changed(&mut self, accounts: Vec<Address>) -> Vec<AppCommand> {
        match accounts.first() {
            Some(&account) => {
                let same_account = self.session.as_ref().map(|s| s.account) == Some(account);
                // Idle = un changement de session est encore en vol
                if same_account && !matches!(self.balance, BalanceFetch::Idle) {
                    // Même compte : la session et sa balance restent valides
                    debug!(%account, "Accounts changed, same account kept");
                    return Vec::new();
                }
                info!(%account, "Accounts changed");
                if self.session.is_none() {
                    self.connection = ConnectionStatus::Connecting;
                }
                let ticket = self.next_ticket();
                vec![AppCommand::Establish { account, ticket }]
            }
            None => {
                info!("Wallet reported no accounts");
                self.disconnect();
                Vec::new()
            }
        }
    }

    /// chainChanged
    ///
    /// - Autre chaîne : actions désactivées, balance WrongNetwork
    /// - Retour sur la chaîne attendue avec une session : session rétablie sans prompt
    /// - Sans session : une connexion en vol n'est pas annulée, elle relira
    ///   la chaîne si celle qu'elle rapporte diffère
    pub fn on_chain_changed(&mut self, chain: ChainId) -> Vec<AppCommand> {
        info!(%chain, "Chain changed");
        self.wallet_chain = Some(chain);

        let wrong_chain = chain != self.expected_chain;
        self.action_info = if wrong_chain {
            Some(
                SessionError::WrongNetwork {
                    expected: self.expected_chain,
                    actual: chain,
                }
                .user_message(),
            )
        } else {
            None
        };

        let Some(session) = self.session.as_mut() else {
            if self.connection == ConnectionStatus::Connecting {
                self.recheck_chain = true;
            }
            return Vec::new();
        };

        if wrong_chain {
            session.chain_id = chain;
            self.next_ticket();
            return Vec::new();
        }

        let account = session.account;
        let ticket = self.next_ticket();
        vec![AppCommand::Establish { account, ticket }]
    }

    /// Transfer observé : rafraîchit si le compte connecté est concerné
    pub fn on_transfer(&mut self, transfer: TransferLog) -> Vec<AppCommand> {
        let involved = self
            .session
            .as_ref()
            .map(|s| transfer.involves(s.account))
            .unwrap_or(false);

        if !involved {
            return Vec::new();
        }

        debug!(from = %transfer.from, to = %transfer.to, "Transfer touches connected account");
        self.refresh_balance()
    }

    // ========================================================================
    // Résultats du worker
    // ========================================================================

    /// Applique un résultat du worker, retourne les commandes de suivi
    pub fn apply(&mut self, result: AppResult) -> Vec<AppCommand> {
        match result {
            AppResult::MetadataLoaded(Ok(descriptor)) => {
                self.metadata = MetadataStatus::Ready(descriptor);
                Vec::new()
            }
            AppResult::MetadataLoaded(Err(e)) => {
                warn!(error = %e, "Token metadata unavailable");
                // Une balance déjà lue a pu fournir les décimales entre-temps
                if !matches!(self.metadata, MetadataStatus::Ready(_)) {
                    self.metadata = MetadataStatus::Failed;
                }
                Vec::new()
            }

            AppResult::Connected { ticket, result } => {
                if !self.is_current(ticket) {
                    debug!(?ticket, epoch = self.epoch, "Discarding superseded connect result");
                    return Vec::new();
                }
                match result {
                    Ok(session) => self.accept_session(session),
                    Err(e) => {
                        self.connection_failed(e);
                        Vec::new()
                    }
                }
            }

            AppResult::Restored { ticket, result } => {
                if !self.is_current(ticket) {
                    debug!(?ticket, epoch = self.epoch, "Discarding superseded restore result");
                    return Vec::new();
                }
                match result {
                    Ok(Some(session)) => self.accept_session(session),
                    Ok(None) => {
                        self.connection = ConnectionStatus::Disconnected;
                        Vec::new()
                    }
                    Err(e) => {
                        warn!(error = %e, "Could not auto-connect");
                        self.connection = ConnectionStatus::Disconnected;
                        Vec::new()
                    }
                }
            }

            AppResult::BalanceFetched { ticket, result } => {
                if !self.is_current(ticket) {
                    debug!(?ticket, epoch = self.epoch, "Discarding superseded balance");
                    return Vec::new();
                }
                match result {
                    Ok(balance) => {
                        // Décimales relues via le signer : elles complètent le panneau token
                        if !matches!(self.metadata, MetadataStatus::Ready(_)) {
                            self.metadata = MetadataStatus::Ready(TokenDescriptor::with_decimals(
                                self.token_address,
                                balance.decimals,
                            ));
                        }
                        self.balance = BalanceFetch::Ready(balance);
                    }
                    Err(e) => {
                        warn!(error = %e, "Balance fetch failed");
                        self.balance = BalanceFetch::Failed;
                    }
                }
                Vec::new()
            }

            AppResult::Wallet(WalletEvent::AccountsChanged(accounts)) => {
                self.on_accounts_changed(accounts)
            }
            AppResult::Wallet(WalletEvent::ChainChanged(chain)) => self.on_chain_changed(chain),

            AppResult::Transfer(transfer) => self.on_transfer(transfer),
        }
    }

    /// Installe une session établie et lance la lecture de balance
    fn accept_session(&mut self, session: WalletSession) -> Vec<AppCommand> {
        let chain_moved = self.wallet_chain.is_some_and(|chain| chain != session.chain_id);
        if std::mem::take(&mut self.recheck_chain) && chain_moved {
            // Relecture unique de la chaîne, sans nouveau prompt
            debug!(account = %session.account, "Chain changed during connect, re-reading it");
            let ticket = self.next_ticket();
            return vec![AppCommand::Establish {
                account: session.account,
                ticket,
            }];
        }

        self.connection = ConnectionStatus::Connected;
        self.wallet_chain = Some(session.chain_id);
        self.action_info = None;

        if !session.is_on(self.expected_chain) {
            self.action_info = Some(
                SessionError::WrongNetwork {
                    expected: self.expected_chain,
                    actual: session.chain_id,
                }
                .user_message(),
            );
            self.session = Some(session);
            return Vec::new();
        }

        self.balance = BalanceFetch::Loading;
        self.session = Some(session.clone());
        vec![AppCommand::FetchBalance {
            session,
            ticket: self.current_ticket(),
        }]
    }

    fn connection_failed(&mut self, error: SessionError) {
        warn!(error = %error, "Wallet connection failed");
        self.session = None;
        self.connection = match error {
            SessionError::NoProviderAvailable => ConnectionStatus::NoProvider,
            _ => ConnectionStatus::Failed,
        };
        self.action_info = Some(error.user_message());
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
