// ============================================================================
// Structure : TokenDescriptor
// ============================================================================
// Métadonnées du token ERC-20 suivi par l'application (ZART sur Sepolia)
//
// CONCEPTS RUST :
// 1. Option<String> : name/symbol sont optionnels (lecture best-effort)
// 2. Immutabilité : une fois lu, le descripteur ne change plus
// ============================================================================

use alloy_primitives::Address;

/// Métadonnées du token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDescriptor {
    /// Adresse du contrat déployé
    pub contract_address: Address,

    /// Nom complet (ex: "ZAR Token"), None si la lecture a échoué
    pub name: Option<String>,

    /// Symbole (ex: "ZART"), None si la lecture a échoué
    pub symbol: Option<String>,

    /// Décimales (obligatoires pour formater une balance)
    pub decimals: u8,
}

impl TokenDescriptor {
    /// Descripteur minimal : seulement les décimales
    pub fn with_decimals(contract_address: Address, decimals: u8) -> Self {
        Self {
            contract_address,
            name: None,
            symbol: None,
            decimals,
        }
    }

    /// Libellé "Name (SYMBOL)" pour le panneau token
    pub fn display_name(&self) -> String {
        match (&self.name, &self.symbol) {
            (Some(name), Some(symbol)) => format!("{} ({})", name, symbol),
            (Some(name), None) => name.clone(),
            (None, Some(symbol)) => symbol.clone(),
            (None, None) => "N/A".to_string(),
        }
    }
}

/// État du chargement des métadonnées
///
/// CONCEPT : Le chargement ne dépend pas du wallet
/// - Loading au démarrage
/// - Ready après la lecture read-only
/// - Failed : marqueur "Error" dans l'UI, jamais de crash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataStatus {
    Loading,
    Ready(TokenDescriptor),
    Failed,
}

impl MetadataStatus {
    /// Texte du champ décimales
    pub fn decimals_label(&self) -> String {
        match self {
            MetadataStatus::Loading => "Loading...".to_string(),
            MetadataStatus::Ready(token) => token.decimals.to_string(),
            MetadataStatus::Failed => "Error".to_string(),
        }
    }

    pub fn descriptor(&self) -> Option<&TokenDescriptor> {
        match self {
            MetadataStatus::Ready(token) => Some(token),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let mut token = TokenDescriptor::with_decimals(Address::ZERO, 18);
        assert_eq!(token.display_name(), "N/A");

        token.symbol = Some("ZART".to_string());
        assert_eq!(token.display_name(), "ZART");

        token.name = Some("ZAR Token".to_string());
        assert_eq!(token.display_name(), "ZAR Token (ZART)");
    }

    #[test]
    fn test_decimals_label() {
        let token = TokenDescriptor::with_decimals(Address::ZERO, 18);
        assert_eq!(MetadataStatus::Ready(token).decimals_label(), "18");
        assert_eq!(MetadataStatus::Failed.decimals_label(), "Error");
        assert!(MetadataStatus::Loading.descriptor().is_none());
    }
}
