// ============================================================================
// Structures : ChainId et WalletSession
// ============================================================================
// Représente la session wallet active (un seul compte à la fois)
//
// CONCEPTS RUST :
// 1. Newtype pattern : ChainId(u64) au lieu d'un String brut
//    - Le wallet envoie "0xaa36a7", le nœud peut renvoyer "11155111"
//    - Une fois parsé, la comparaison est numérique (pas de piège de casse)
// 2. FromStr / TryFrom : conversions faillibles standardisées
// 3. Copy : types légers copiés implicitement
// ============================================================================

use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Identifiant de chaîne EVM (EIP-155)
///
/// Affiché en hexadécimal préfixé ("0xaa36a7"), comme les wallets l'émettent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(pub u64);

impl ChainId {
    /// Sepolia (11155111)
    pub const SEPOLIA: ChainId = ChainId(11_155_111);

    /// Retourne la valeur numérique
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Erreur de parsing d'un chain id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChainIdError(String);

impl fmt::Display for ParseChainIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid chain id: {:?}", self.0)
    }
}

impl std::error::Error for ParseChainIdError {}

/// Accepte "0xaa36a7", "0XAA36A7" ou "11155111"
impl FromStr for ChainId {
    type Err = ParseChainIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse::<u64>(),
        };

        parsed
            .map(ChainId)
            .map_err(|_| ParseChainIdError(s.to_string()))
    }
}

impl TryFrom<String> for ChainId {
    type Error = ParseChainIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChainId> for String {
    fn from(chain: ChainId) -> Self {
        chain.to_string()
    }
}

/// Session wallet : compte actif + chaîne sur laquelle il est connecté
///
/// CONCEPT : Une seule session à la fois
/// - Créée après un connect réussi
/// - Détruite au disconnect ou quand le wallet annonce une liste de comptes vide
/// - Option<WalletSession> dans App : None = déconnecté
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    /// Compte autorisé par le wallet
    pub account: Address,

    /// Chaîne active côté wallet
    pub chain_id: ChainId,

    /// true tant que la session n'a pas été fermée
    pub is_connected: bool,
}

impl WalletSession {
    /// Crée une session connectée
    pub fn new(account: Address, chain_id: ChainId) -> Self {
        Self {
            account,
            chain_id,
            is_connected: true,
        }
    }

    /// Vérifie que la session est utilisable sur la chaîne attendue
    pub fn is_on(&self, expected: ChainId) -> bool {
        self.is_connected && self.chain_id == expected
    }

    /// Adresse raccourcie pour l'affichage compact (0x7F0c…c706)
    pub fn short_account(&self) -> String {
        let full = self.account.to_string();
        if full.len() <= 12 {
            return full;
        }
        format!("{}…{}", &full[..6], &full[full.len() - 4..])
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_chain_id_parsing() {
        assert_eq!("0xaa36a7".parse::<ChainId>().unwrap(), ChainId::SEPOLIA);
        assert_eq!("0XAA36A7".parse::<ChainId>().unwrap(), ChainId::SEPOLIA);
        assert_eq!("11155111".parse::<ChainId>().unwrap(), ChainId::SEPOLIA);
        assert_eq!(" 0x1 ".parse::<ChainId>().unwrap(), ChainId(1));

        assert!("".parse::<ChainId>().is_err());
        assert!("0x".parse::<ChainId>().is_err());
        assert!("sepolia".parse::<ChainId>().is_err());
    }

    #[test]
    fn test_chain_id_display() {
        assert_eq!(ChainId::SEPOLIA.to_string(), "0xaa36a7");
        assert_eq!(ChainId(1).to_string(), "0x1");
    }

    #[test]
    fn test_chain_id_serde() {
        let json = serde_json::to_string(&ChainId::SEPOLIA).unwrap();
        assert_eq!(json, "\"0xaa36a7\"");

        let back: ChainId = serde_json::from_str("\"11155111\"").unwrap();
        assert_eq!(back, ChainId::SEPOLIA);

        assert!(serde_json::from_str::<ChainId>("\"nope\"").is_err());
    }

    #[test]
    fn test_session_is_on() {
        let account = address!("0x1111111111111111111111111111111111111111");
        let mut session = WalletSession::new(account, ChainId::SEPOLIA);

        assert!(session.is_on(ChainId::SEPOLIA));
        assert!(!session.is_on(ChainId(1)));

        session.is_connected = false;
        assert!(!session.is_on(ChainId::SEPOLIA));
    }

    #[test]
    fn test_short_account() {
        let account = address!("0x1234567890123456789012345678901234567890");
        let session = WalletSession::new(account, ChainId::SEPOLIA);
        assert_eq!(session.short_account(), "0x1234…7890");
    }
}
