// ============================================================================
// ZartWallet - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;       // JSON-RPC et contrat ERC-20
pub mod app;       // État de l'application
pub mod config;    // Constantes et configuration
pub mod models;    // Structures de données
pub mod ui;        // Interface utilisateur
pub mod wallet;    // Wallet Session Manager
pub mod worker;    // Worker async et watchers
