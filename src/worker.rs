// ============================================================================
// Background Worker
// ============================================================================
// CONCEPT RUST : Background async worker avec channels
// - Thread séparé qui possède un runtime tokio
// - Reçoit des AppCommand via un channel (command_rx)
// - Chaque commande devient une tâche tokio indépendante :
//   deux commandes peuvent s'entrelacer à chaque .await (comme sur une page web)
// - Renvoie des AppResult via un autre channel (result_tx)
// - Lance aussi les watchers : événements du wallet et logs Transfer
// ============================================================================

use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::api::{Erc20, TokenContract, TransferLog};
use crate::models::{Balance, TokenDescriptor, WalletSession};
use crate::wallet::{
    RpcWalletProvider, SessionError, WalletEvent, WalletProvider, WalletSessionManager,
};

/// Manager branché sur le vrai réseau
pub type LiveManager = WalletSessionManager<RpcWalletProvider, Erc20>;

/// Époque de session au moment où une commande a été émise
///
/// CONCEPT : Last-writer-wins explicite
/// - Chaque action qui change la session incrémente l'époque dans App
/// - Un résultat n'est appliqué que si son ticket est encore l'époque courante
/// - La dernière action émise gagne, quel que soit l'ordre de résolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(pub u64);

/// Commandes envoyées au worker
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Lecture read-only des métadonnées du token
    LoadMetadata,

    /// Connexion demandée par l'utilisateur (eth_requestAccounts)
    Connect { ticket: Ticket },

    /// Auto-connexion au démarrage (eth_accounts, sans prompt)
    Restore { ticket: Ticket },

    /// Session pour un compte déjà autorisé (accountsChanged, retour sur la bonne chaîne)
    Establish { account: Address, ticket: Ticket },

    /// Lecture de la balance de la session
    FetchBalance { session: WalletSession, ticket: Ticket },
}

/// Résultats renvoyés par le worker
#[derive(Debug)]
pub enum AppResult {
    MetadataLoaded(Result<TokenDescriptor, SessionError>),

    /// Résultat de Connect ou Establish
    Connected {
        ticket: Ticket,
        result: Result<WalletSession, SessionError>,
    },

    Restored {
        ticket: Ticket,
        result: Result<Option<WalletSession>, SessionError>,
    },

    BalanceFetched {
        ticket: Ticket,
        result: Result<Balance, SessionError>,
    },

    /// Événement émis par le wallet
    Wallet(WalletEvent),

    /// Transfert observé sur le contrat
    Transfer(TransferLog),
}

/// Exécute une commande et produit le résultat correspondant
///
/// CONCEPT RUST : Fonction générique async
/// - Utilisée par le worker (LiveManager) et par les tests (mocks)
pub async fn execute<P, C>(manager: &WalletSessionManager<P, C>, command: AppCommand) -> AppResult
where
    P: WalletProvider,
    C: TokenContract,
{
    match command {
        AppCommand::LoadMetadata => AppResult::MetadataLoaded(manager.load_token_metadata().await),

        AppCommand::Connect { ticket } => AppResult::Connected {
            ticket,
            result: manager.connect().await,
        },

        AppCommand::Restore { ticket } => AppResult::Restored {
            ticket,
            result: manager.restore().await,
        },

        AppCommand::Establish { account, ticket } => AppResult::Connected {
            ticket,
            result: manager.establish(account).await,
        },

        AppCommand::FetchBalance { session, ticket } => AppResult::BalanceFetched {
            ticket,
            result: manager.get_balance(Some(&session)).await,
        },
    }
}

/// Lance le worker thread
///
/// # Arguments
/// * `command_rx` - Receiver pour recevoir les commandes
/// * `result_tx` - Sender pour envoyer les résultats
/// * `manager` - Wallet Session Manager partagé entre les tâches
/// * `poll_interval` - Période des watchers (wallet + Transfer)
pub fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    manager: Arc<LiveManager>,
    poll_interval: Duration,
) -> Result<JoinHandle<()>> {
    // Runtime créé ici pour propager l'erreur au lieu de paniquer dans le thread
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;

    let handle = std::thread::Builder::new()
        .name("zartwallet-worker".to_string())
        .spawn(move || {
            spawn_watchers(&runtime, &manager, &result_tx, poll_interval);

            // Boucle de traitement des commandes
            // - recv() bloque le thread worker (pas l'UI)
            // - chaque commande tourne dans sa propre tâche
            loop {
                match command_rx.recv() {
                    Ok(command) => {
                        debug!(?command, "Worker received command");
                        let manager = Arc::clone(&manager);
                        let result_tx = result_tx.clone();

                        runtime.spawn(async move {
                            let result = execute(&manager, command).await;
                            let _ = result_tx.send(result);
                        });
                    }
                    Err(_) => {
                        // Channel fermé, on quitte
                        info!("Worker thread exiting (channel closed)");
                        break;
                    }
                }
            }
        })
        .context("Échec du lancement du worker thread")?;

    Ok(handle)
}

/// Lance les watchers en tâche de fond
fn spawn_watchers(
    runtime: &tokio::runtime::Runtime,
    manager: &Arc<LiveManager>,
    result_tx: &mpsc::Sender<AppResult>,
    poll_interval: Duration,
) {
    if manager.has_provider() {
        let manager = Arc::clone(manager);
        let tx = result_tx.clone();
        runtime.spawn(async move {
            if let Some(provider) = manager.wallet() {
                provider
                    .watch(poll_interval, |event| {
                        let _ = tx.send(AppResult::Wallet(event));
                    })
                    .await;
            }
        });
    }

    let manager = Arc::clone(manager);
    let tx = result_tx.clone();
    runtime.spawn(async move {
        watch_transfers(manager.contract(), poll_interval, |transfer| {
            let _ = tx.send(AppResult::Transfer(transfer));
        })
        .await;
    });
}

/// Surveille les events Transfer du token
///
/// Premier tour : apprend seulement le dernier bloc (pas d'historique).
async fn watch_transfers<F>(contract: &Erc20, interval: Duration, mut on_transfer: F)
where
    F: FnMut(TransferLog) + Send,
{
    info!(token = %contract.address(), ?interval, "Watching Transfer events");

    let mut ticker = tokio::time::interval(interval);
    let mut next_block: Option<u64> = None;

    loop {
        ticker.tick().await;

        let from = next_block.unwrap_or(u64::MAX);
        match contract.transfers_since(from).await {
            Ok((transfers, latest)) => {
                for transfer in transfers {
                    on_transfer(transfer);
                }
                next_block = Some(latest.saturating_add(1));
            }
            Err(e) => warn!(error = %e, "Transfer poll failed"),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChainId;
    use crate::wallet::mock::{MockProvider, MockToken, ALICE};
    use alloy_primitives::U256;

    #[tokio::test]
    async fn test_execute_maps_commands() {
        let provider = MockProvider::new(vec![ALICE], ChainId::SEPOLIA);
        let token = MockToken::new(18);
        token.set_balance(ALICE, U256::from(10u64).pow(U256::from(18u64)));
        let manager = WalletSessionManager::new(Some(provider), token, ChainId::SEPOLIA);

        let result = execute(&manager, AppCommand::Connect { ticket: Ticket(7) }).await;
        let session = match result {
            AppResult::Connected { ticket, result } => {
                assert_eq!(ticket, Ticket(7));
                result.unwrap()
            }
            other => panic!("unexpected result: {:?}", other),
        };

        let result = execute(
            &manager,
            AppCommand::FetchBalance {
                session,
                ticket: Ticket(7),
            },
        )
        .await;
        match result {
            AppResult::BalanceFetched { ticket, result } => {
                assert_eq!(ticket, Ticket(7));
                assert_eq!(result.unwrap().formatted(), "1.0");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_establish_uses_connected_result() {
        let provider = MockProvider::new(vec![ALICE], ChainId(1));
        let manager = WalletSessionManager::new(Some(provider), MockToken::new(18), ChainId::SEPOLIA);

        let result = execute(
            &manager,
            AppCommand::Establish {
                account: ALICE,
                ticket: Ticket(1),
            },
        )
        .await;

        match result {
            AppResult::Connected { result, .. } => {
                assert_eq!(result.unwrap().chain_id, ChainId(1));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
