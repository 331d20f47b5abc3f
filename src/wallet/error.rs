// ============================================================================
// Erreurs de session wallet
// ============================================================================
// Toutes ces erreurs sont récupérées localement : l'UI affiche un texte
// explicatif et désactive les actions dépendantes. Aucune n'est fatale.
// ============================================================================

use std::fmt;

use crate::api::RpcError;
use crate::models::ChainId;

/// Taxonomie des erreurs du Wallet Session Manager
#[derive(Debug)]
pub enum SessionError {
    /// Aucun wallet détecté : connect désactivé, message d'installation
    NoProviderAvailable,

    /// L'utilisateur a refusé la demande de comptes
    UserRejected,

    /// Le wallet est sur une autre chaîne que la chaîne attendue
    WrongNetwork { expected: ChainId, actual: ChainId },

    /// Opération qui exige une session active
    NotConnected,

    /// Le wallet a répondu mais en erreur (hors refus utilisateur)
    ProviderFailure(RpcError),

    /// Lecture des décimales impossible
    MetadataFetchFailed(RpcError),

    /// Lecture de balanceOf (ou des décimales de secours) impossible
    BalanceFetchFailed(RpcError),
}

impl SessionError {
    /// Convertit une erreur du wallet provider
    ///
    /// CONCEPT : EIP-1193 code 4001 = refus explicite de l'utilisateur
    pub fn from_provider(err: RpcError) -> Self {
        if err.is_user_rejection() {
            SessionError::UserRejected
        } else {
            SessionError::ProviderFailure(err)
        }
    }

    /// Message court affiché dans la ligne d'information
    pub fn user_message(&self) -> String {
        match self {
            SessionError::NoProviderAvailable => {
                "Please install a Web3 wallet (set ZART_WALLET_URL) to connect.".to_string()
            }
            SessionError::UserRejected => "Error: User rejected connection.".to_string(),
            SessionError::WrongNetwork { expected, actual } => format!(
                "Please switch to the expected network ({}) in your wallet. Current: {}",
                expected, actual
            ),
            SessionError::NotConnected => "Connect a wallet first.".to_string(),
            SessionError::ProviderFailure(e) => format!("Error: {}", e),
            SessionError::MetadataFetchFailed(_) => "Could not read token metadata.".to_string(),
            SessionError::BalanceFetchFailed(_) => "Could not read balance.".to_string(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoProviderAvailable => write!(f, "no wallet provider available"),
            SessionError::UserRejected => write!(f, "user rejected the request"),
            SessionError::WrongNetwork { expected, actual } => {
                write!(f, "wrong network: expected {}, got {}", expected, actual)
            }
            SessionError::NotConnected => write!(f, "no active wallet session"),
            SessionError::ProviderFailure(e) => write!(f, "wallet provider failure: {}", e),
            SessionError::MetadataFetchFailed(e) => write!(f, "metadata fetch failed: {}", e),
            SessionError::BalanceFetchFailed(e) => write!(f, "balance fetch failed: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::ProviderFailure(e)
            | SessionError::MetadataFetchFailed(e)
            | SessionError::BalanceFetchFailed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider() {
        let rejected = RpcError::Rpc {
            code: 4001,
            message: "denied".to_string(),
        };
        assert!(matches!(
            SessionError::from_provider(rejected),
            SessionError::UserRejected
        ));

        let down = RpcError::Transport("connection refused".to_string());
        assert!(matches!(
            SessionError::from_provider(down),
            SessionError::ProviderFailure(_)
        ));
    }

    #[test]
    fn test_wrong_network_message() {
        let err = SessionError::WrongNetwork {
            expected: ChainId::SEPOLIA,
            actual: ChainId(1),
        };
        assert!(err.user_message().contains("0xaa36a7"));
        assert!(err.user_message().contains("Current: 0x1"));
        assert_eq!(err.to_string(), "wrong network: expected 0xaa36a7, got 0x1");
    }
}
