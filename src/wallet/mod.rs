// ============================================================================
// Module : wallet
// ============================================================================
// Wallet Session Manager : provider, opérations async, erreurs
// ============================================================================

pub mod error;    // Taxonomie SessionError
pub mod manager;  // Opérations async (metadata, connect, balance)
pub mod provider; // Surface EIP-1193 + implémentation JSON-RPC

#[cfg(test)]
pub(crate) mod mock; // Wallet et token en mémoire pour les tests

pub use error::SessionError;
pub use manager::WalletSessionManager;
pub use provider::{ProviderMethod, RpcWalletProvider, WalletEvent, WalletProvider};
