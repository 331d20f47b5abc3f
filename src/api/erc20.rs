// ============================================================================
// Contrat ERC-20 : interface canonique + handle d'appel
// ============================================================================
// Une seule description de l'interface, en syntaxe Solidity via sol!
// Seuls les membres réellement utilisés par l'application sont déclarés.
//
// CONCEPTS RUST :
// 1. Macro procédurale sol! : génère les structs d'appel + selectors à la compilation
// 2. Trait avec `impl Future + Send` : async dans un trait, utilisable avec tokio::spawn
// 3. Arc<JsonRpcClient> : le handle read-only et le handle signer partagent le client
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent, SolType, SolValue};
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::api::rpc::{decode_hex_bytes, parse_quantity, JsonRpcClient, RawLog, RpcError};

sol! {
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
    }
}

// ============================================================================
// Trait TokenContract
// ============================================================================
// CONCEPT : Seam de test
// - Erc20 parle au vrai nœud
// - Les tests du manager utilisent un contrat en mémoire
// ============================================================================

/// Surface de lecture d'un token ERC-20
pub trait TokenContract: Send + Sync {
    /// Adresse du contrat
    fn address(&self) -> Address;

    /// Retourne un handle lié au compte donné (appels émis "from" ce compte)
    fn bind_signer(&self, account: Address) -> Self
    where
        Self: Sized;

    fn decimals(&self) -> impl Future<Output = Result<u8, RpcError>> + Send;

    fn name(&self) -> impl Future<Output = Result<String, RpcError>> + Send;

    fn symbol(&self) -> impl Future<Output = Result<String, RpcError>> + Send;

    fn balance_of(&self, account: Address) -> impl Future<Output = Result<U256, RpcError>> + Send;
}

/// Handle d'appel vers le contrat ERC-20 déployé
///
/// - signer = None : connexion read-only (aucune autorisation)
/// - signer = Some(compte) : handle lié au compte connecté
#[derive(Clone)]
pub struct Erc20 {
    rpc: Arc<JsonRpcClient>,
    address: Address,
    signer: Option<Address>,
}

impl Erc20 {
    /// Handle read-only
    pub fn read_only(rpc: Arc<JsonRpcClient>, address: Address) -> Self {
        Self {
            rpc,
            address,
            signer: None,
        }
    }

    /// Compte lié, si le handle est signer-bound
    pub fn signer(&self) -> Option<Address> {
        self.signer
    }

    /// Exécute un appel view et décode la valeur de retour
    ///
    /// CONCEPT RUST : Génériques avec deux traits
    /// - C : SolCall (encodage de l'appel)
    /// - R : SolValue (décodage du retour)
    async fn call_view<C, R>(&self, call: C) -> Result<R, RpcError>
    where
        C: SolCall + Send,
        R: SolValue + From<<R::SolType as SolType>::RustType>,
    {
        let data = call.abi_encode();
        let output = self.rpc.eth_call(self.address, self.signer, &data).await?;

        if output.is_empty() {
            // Pas de code au bon endroit (mauvaise chaîne, mauvaise adresse)
            return Err(RpcError::Decode(format!(
                "{}: empty return data",
                C::SIGNATURE
            )));
        }

        R::abi_decode(&output)
            .map_err(|e| RpcError::Decode(format!("{}: {}", C::SIGNATURE, e)))
    }

    /// Events Transfer du token depuis `from_block` (inclus)
    ///
    /// Retourne les transferts et le dernier bloc inspecté.
    #[instrument(skip(self), fields(token = %self.address))]
    pub async fn transfers_since(&self, from_block: u64) -> Result<(Vec<TransferLog>, u64), RpcError> {
        let latest = self.rpc.block_number().await?;
        if from_block > latest {
            return Ok((Vec::new(), latest));
        }

        let filter = json!({
            "address": self.address,
            "fromBlock": format!("0x{:x}", from_block),
            "toBlock": format!("0x{:x}", latest),
            "topics": [IERC20::Transfer::SIGNATURE_HASH],
        });

        let raw_logs = self.rpc.get_logs(filter).await?;
        let transfers = decode_transfers(&raw_logs);

        debug!(from_block, latest, count = transfers.len(), "Fetched Transfer logs");
        Ok((transfers, latest))
    }
}

impl TokenContract for Erc20 {
    fn address(&self) -> Address {
        self.address
    }

    fn bind_signer(&self, account: Address) -> Self {
        Self {
            rpc: Arc::clone(&self.rpc),
            address: self.address,
            signer: Some(account),
        }
    }

    async fn decimals(&self) -> Result<u8, RpcError> {
        // uint8 n'a pas d'impl SolValue (conflit avec les octets) : on lit un uint16
        let raw: u16 = self.call_view(IERC20::decimalsCall {}).await?;
        decimals_from_word(raw)
    }

    async fn name(&self) -> Result<String, RpcError> {
        self.call_view(IERC20::nameCall {}).await
    }

    async fn symbol(&self) -> Result<String, RpcError> {
        self.call_view(IERC20::symbolCall {}).await
    }

    async fn balance_of(&self, account: Address) -> Result<U256, RpcError> {
        self.call_view(IERC20::balanceOfCall { account }).await
    }
}

/// Réduit la valeur de retour de decimals() à un u8
fn decimals_from_word(raw: u16) -> Result<u8, RpcError> {
    u8::try_from(raw).map_err(|_| RpcError::Decode(format!("decimals() out of range: {}", raw)))
}

// ============================================================================
// Event Transfer
// ============================================================================

/// Transfert décodé depuis un log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLog {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub block_number: Option<u64>,
}

impl TransferLog {
    /// Le transfert modifie-t-il la balance de ce compte ?
    pub fn involves(&self, account: Address) -> bool {
        self.from == account || self.to == account
    }
}

/// Décode un log brut Transfer(address indexed, address indexed, uint256)
///
/// topics[0] = signature, topics[1] = from, topics[2] = to, data = value
pub fn decode_transfer(log: &RawLog) -> Result<TransferLog, RpcError> {
    if log.topics.len() != 3 {
        return Err(RpcError::Decode(format!(
            "Transfer: expected 3 topics, got {}",
            log.topics.len()
        )));
    }

    let topics = log
        .topics
        .iter()
        .map(|t| {
            t.parse::<B256>()
                .map_err(|e| RpcError::Decode(format!("Transfer topic {}: {}", t, e)))
        })
        .collect::<Result<Vec<B256>, RpcError>>()?;

    if topics[0] != IERC20::Transfer::SIGNATURE_HASH {
        return Err(RpcError::Decode("Transfer: signature mismatch".to_string()));
    }

    let data = decode_hex_bytes(&log.data)?;
    let value = U256::try_from_be_slice(&data)
        .ok_or_else(|| RpcError::Decode(format!("Transfer: bad value ({} bytes)", data.len())))?;

    let block_number = match &log.block_number {
        Some(raw) => Some(parse_quantity(raw)?),
        None => None,
    };

    Ok(TransferLog {
        from: Address::from_word(topics[1]),
        to: Address::from_word(topics[2]),
        value,
        block_number,
    })
}

/// Décode un lot de logs Transfer
///
/// Un log illisible est ignoré (warn), le reste du lot est conservé.
pub fn decode_transfers(logs: &[RawLog]) -> Vec<TransferLog> {
    logs.iter()
        .filter_map(|log| match decode_transfer(log) {
            Ok(transfer) => Some(transfer),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable Transfer log");
                None
            }
        })
        .collect()
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, hex};

    #[test]
    fn test_selectors() {
        // Selectors standard ERC-20
        assert_eq!(IERC20::decimalsCall::SELECTOR, [0x31, 0x3c, 0xe5, 0x67]);
        assert_eq!(IERC20::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(IERC20::nameCall::SELECTOR, [0x06, 0xfd, 0xde, 0x03]);
        assert_eq!(IERC20::symbolCall::SELECTOR, [0x95, 0xd8, 0x9b, 0x41]);
    }

    #[test]
    fn test_balance_of_encoding() {
        let account = address!("0x1111111111111111111111111111111111111111");
        let data = IERC20::balanceOfCall { account }.abi_encode();

        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(&data[16..], account.as_slice());
    }

    #[test]
    fn test_transfer_signature_hash() {
        assert_eq!(
            IERC20::Transfer::SIGNATURE_HASH,
            B256::from(hex!(
                "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
            ))
        );
    }

    fn transfer_log(from: Address, to: Address, value: u64) -> RawLog {
        RawLog {
            topics: vec![
                IERC20::Transfer::SIGNATURE_HASH.to_string(),
                from.into_word().to_string(),
                to.into_word().to_string(),
            ],
            data: format!("0x{}", hex::encode(U256::from(value).to_be_bytes::<32>())),
            block_number: Some("0x2a".to_string()),
        }
    }

    #[test]
    fn test_decode_transfer() {
        let from = address!("0x1111111111111111111111111111111111111111");
        let to = address!("0x2222222222222222222222222222222222222222");
        let log = transfer_log(from, to, 1_000);

        let transfer = decode_transfer(&log).unwrap();
        assert_eq!(transfer.from, from);
        assert_eq!(transfer.to, to);
        assert_eq!(transfer.value, U256::from(1_000u64));
        assert_eq!(transfer.block_number, Some(42));

        assert!(transfer.involves(from));
        assert!(transfer.involves(to));
        assert!(!transfer.involves(Address::ZERO));
    }

    #[test]
    fn test_decode_transfer_rejects_other_events() {
        let mut log = transfer_log(Address::ZERO, Address::ZERO, 1);
        log.topics[0] = B256::ZERO.to_string();
        assert!(decode_transfer(&log).is_err());

        let mut log = transfer_log(Address::ZERO, Address::ZERO, 1);
        log.topics.pop();
        assert!(decode_transfer(&log).is_err());
    }

    #[test]
    fn test_bind_signer() {
        let rpc = Arc::new(JsonRpcClient::new("http://127.0.0.1:8545").unwrap());
        let token = address!("0x7F0c6e462e391E08625DAa30a83F40607867c706");
        let account = address!("0x1111111111111111111111111111111111111111");

        let read_only = Erc20::read_only(rpc, token);
        assert_eq!(read_only.signer(), None);

        let bound = read_only.bind_signer(account);
        assert_eq!(bound.signer(), Some(account));
        assert_eq!(bound.address(), token);
    }

    #[test]
    fn test_return_decoding() {
        // decimals() -> uint8 encodé sur un mot de 32 octets, lu comme uint16
        let encoded = 18u16.abi_encode();
        assert_eq!(encoded.len(), 32);
        let raw = u16::abi_decode(&encoded).unwrap();
        assert_eq!(decimals_from_word(raw).unwrap(), 18);

        // name() -> string (offset + longueur + données)
        let encoded = "ZAR Token".to_string().abi_encode();
        assert_eq!(String::abi_decode(&encoded).unwrap(), "ZAR Token");
    }

    #[test]
    fn test_decimals_out_of_range() {
        assert_eq!(decimals_from_word(255).unwrap(), 255);
        assert!(matches!(decimals_from_word(256), Err(RpcError::Decode(_))));
    }

    #[test]
    fn test_decode_transfers_skips_bad_logs() {
        let from = address!("0x1111111111111111111111111111111111111111");
        let to = address!("0x2222222222222222222222222222222222222222");

        let mut truncated = transfer_log(from, to, 2);
        truncated.topics.pop();
        let mut bad_data = transfer_log(from, to, 3);
        bad_data.data = "0xzz".to_string();

        let logs = vec![
            transfer_log(from, to, 1),
            truncated,
            bad_data,
            transfer_log(to, from, 4),
        ];

        let transfers = decode_transfers(&logs);
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].value, U256::from(1u64));
        assert_eq!(transfers[1].value, U256::from(4u64));
        assert_eq!(transfers[1].from, to);
    }
}
