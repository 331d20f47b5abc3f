// ============================================================================
// API Client : Ethereum JSON-RPC
// ============================================================================
// Client HTTP générique pour parler à un nœud Ethereum (ou à un wallet)
//
// CONCEPTS RUST :
// 1. AtomicU64 : compteur d'id partagé sans Mutex (&self suffit)
// 2. Enum d'erreur typée : l'appelant distingue "réseau" de "refus RPC"
// 3. #[instrument] : chaque appel a son span avec la méthode RPC
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{hex, Address, Bytes};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::models::ChainId;

// ============================================================================
// Erreurs
// ============================================================================

/// Erreurs d'un appel JSON-RPC
#[derive(Debug)]
pub enum RpcError {
    /// Échec HTTP (connexion, timeout du serveur, statut non 2xx)
    Transport(String),

    /// Le serveur a répondu avec un objet "error"
    /// CONCEPT : EIP-1193 réutilise ce format (4001 = refus utilisateur)
    Rpc { code: i64, message: String },

    /// Réponse illisible (JSON, hex, ABI)
    Decode(String),
}

impl RpcError {
    /// Code EIP-1193 : l'utilisateur a refusé la requête
    pub const USER_REJECTED_CODE: i64 = 4001;

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, RpcError::Rpc { code, .. } if *code == Self::USER_REJECTED_CODE)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Transport(e) => write!(f, "transport error: {}", e),
            RpcError::Rpc { code, message } => write!(f, "RPC error {}: {}", code, message),
            RpcError::Decode(e) => write!(f, "decode error: {}", e),
        }
    }
}

impl std::error::Error for RpcError {}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        RpcError::Transport(e.to_string())
    }
}

// ============================================================================
// Structures JSON-RPC 2.0
// ============================================================================

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// Log brut renvoyé par eth_getLogs (seuls les champs utilisés)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Client JSON-RPC HTTP
///
/// Pas de timeout côté client : ceux du serveur s'appliquent.
pub struct JsonRpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Crée un client pour l'endpoint donné
    pub fn new(url: &str) -> Result<Self, RpcError> {
        let client = Client::builder()
            .user_agent(concat!("zartwallet/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Hôte de l'endpoint, pour les logs
    ///
    /// Les URLs Alchemy/Infura contiennent la clé d'API dans le chemin :
    /// on ne logue jamais l'URL complète.
    pub fn host(&self) -> String {
        redact_url(&self.url)
    }

    /// Appel JSON-RPC générique
    #[instrument(skip(self, params), fields(host = %self.host()))]
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        debug!(id, "Sending JSON-RPC request");
        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "JSON-RPC endpoint returned error status");
            return Err(RpcError::Transport(format!("HTTP {}", status)));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::Decode(format!("invalid JSON-RPC response: {}", e)))?;

        if let Some(err) = body.error {
            debug!(code = err.code, message = %err.message, "JSON-RPC error object");
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        // "result": null est une réponse valide pour certaines méthodes
        Ok(body.result.unwrap_or(Value::Null))
    }

    /// eth_blockNumber
    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let value = self.call("eth_blockNumber", json!([])).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| RpcError::Decode("eth_blockNumber: expected string".to_string()))?;
        parse_quantity(raw)
    }

    /// eth_call sur le bloc "latest"
    ///
    /// `from` : None pour un appel read-only, Some(compte) pour un handle lié au signer
    pub async fn eth_call(
        &self,
        to: Address,
        from: Option<Address>,
        data: &[u8],
    ) -> Result<Bytes, RpcError> {
        let mut tx = json!({
            "to": to,
            "data": format!("0x{}", hex::encode(data)),
        });
        if let Some(from) = from {
            tx["from"] = json!(from);
        }

        let value = self.call("eth_call", json!([tx, "latest"])).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| RpcError::Decode("eth_call: expected hex string".to_string()))?;

        decode_hex_bytes(raw)
    }

    /// eth_getLogs avec un filtre déjà construit
    pub async fn get_logs(&self, filter: Value) -> Result<Vec<RawLog>, RpcError> {
        let value = self.call("eth_getLogs", json!([filter])).await?;
        serde_json::from_value(value)
            .map_err(|e| RpcError::Decode(format!("eth_getLogs: {}", e)))
    }
}

// ============================================================================
// Helpers de parsing
// ============================================================================

/// Parse une valeur JSON "0xaa36a7" en ChainId
pub fn parse_chain_id(value: &Value) -> Result<ChainId, RpcError> {
    let raw = value
        .as_str()
        .ok_or_else(|| RpcError::Decode(format!("chain id: expected string, got {}", value)))?;

    raw.parse()
        .map_err(|e| RpcError::Decode(format!("{}", e)))
}

/// Parse une liste d'adresses (réponse de eth_accounts / eth_requestAccounts)
pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, RpcError> {
    let items = value
        .as_array()
        .ok_or_else(|| RpcError::Decode(format!("accounts: expected array, got {}", value)))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| RpcError::Decode("account: expected string".to_string()))?
                .parse::<Address>()
                .map_err(|e| RpcError::Decode(format!("account: {}", e)))
        })
        .collect()
}

/// Parse une quantité hexadécimale JSON-RPC ("0x1b4")
pub fn parse_quantity(raw: &str) -> Result<u64, RpcError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::Decode(format!("quantity without 0x prefix: {}", raw)))?;

    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Decode(format!("quantity {}: {}", raw, e)))
}

/// Décode une chaîne "0x..." en octets
pub fn decode_hex_bytes(raw: &str) -> Result<Bytes, RpcError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| RpcError::Decode(format!("hex: {}", e)))
}

/// Garde uniquement le schéma et l'hôte d'une URL
pub fn redact_url(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("{}://{}", parsed.scheme(), host),
            None => parsed.scheme().to_string(),
        },
        Err(_) => "<invalid url>".to_string(),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accounts() {
        let value = json!([
            "0x1111111111111111111111111111111111111111",
            "0x2222222222222222222222222222222222222222"
        ]);
        let accounts = parse_accounts(&value).unwrap();
        assert_eq!(accounts.len(), 2);

        assert!(parse_accounts(&json!([])).unwrap().is_empty());
        assert!(parse_accounts(&json!("0x11")).is_err());
        assert!(parse_accounts(&json!(["not-an-address"])).is_err());
    }

    #[test]
    fn test_parse_chain_id() {
        assert_eq!(parse_chain_id(&json!("0xaa36a7")).unwrap(), ChainId::SEPOLIA);
        assert!(parse_chain_id(&json!(11155111)).is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x1b4").unwrap(), 436);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert!(parse_quantity("436").is_err());
    }

    #[test]
    fn test_decode_hex_bytes() {
        assert_eq!(decode_hex_bytes("0x").unwrap().len(), 0);
        assert_eq!(decode_hex_bytes("0x0102").unwrap().as_ref(), &[1u8, 2]);
        assert!(decode_hex_bytes("0xzz").is_err());
    }

    #[test]
    fn test_user_rejection_code() {
        let rejected = RpcError::Rpc {
            code: 4001,
            message: "User rejected the request.".to_string(),
        };
        assert!(rejected.is_user_rejection());

        let other = RpcError::Rpc {
            code: -32603,
            message: "Internal error".to_string(),
        };
        assert!(!other.is_user_rejection());
        assert!(!RpcError::Transport("down".to_string()).is_user_rejection());
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://eth-sepolia.g.alchemy.com/v2/SECRETKEY"),
            "https://eth-sepolia.g.alchemy.com"
        );
        assert_eq!(redact_url("not a url"), "<invalid url>");
    }

    #[test]
    fn test_raw_log_deserialize() {
        let value = json!({
            "address": "0x7f0c6e462e391e08625daa30a83f40607867c706",
            "topics": ["0xdd", "0x01"],
            "data": "0x",
            "blockNumber": "0x10",
            "logIndex": "0x0"
        });
        let log: RawLog = serde_json::from_value(value).unwrap();
        assert_eq!(log.topics.len(), 2);
        assert_eq!(log.block_number.as_deref(), Some("0x10"));
    }
}
