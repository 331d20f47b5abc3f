// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod balance; // Balance brute + formatage selon les décimales
pub mod session; // ChainId et WalletSession
pub mod token;   // TokenDescriptor (métadonnées ERC-20)

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use zartwallet::models::session::WalletSession;
// On peut faire : use zartwallet::models::WalletSession;
pub use balance::{format_units, Balance, BalanceView};
pub use session::{ChainId, ParseChainIdError, WalletSession};
pub use token::{MetadataStatus, TokenDescriptor};
