// ============================================================================
// Module : api
// ============================================================================
// Ce module contient les clients pour parler à la blockchain :
// - rpc : JSON-RPC Ethereum générique (HTTP)
// - erc20 : interface du token ZART et décodage des events Transfer
// ============================================================================

pub mod erc20; // Contrat ERC-20 (sol!)
pub mod rpc;   // Client JSON-RPC

// Re-export des types principaux
pub use erc20::{Erc20, TokenContract, TransferLog};
pub use rpc::{JsonRpcClient, RpcError};
