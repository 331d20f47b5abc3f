// ============================================================================
// Configuration
// ============================================================================
// Constantes du déploiement ZART + configuration runtime
//
// Ordre de priorité (le dernier gagne) :
// 1. Valeurs compilées (Config::default)
// 2. Fichier JSON optionnel : ~/.config/zartwallet/config.json (Linux)
// 3. Variables d'environnement ZART_*
//
// CONCEPTS RUST :
// 1. #[serde(default)] : champs absents du JSON = valeur par défaut
// 2. anyhow::Context : messages d'erreur lisibles pour l'utilisateur
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_primitives::{address, Address};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::ChainId;

/// Adresse du contrat ZART déployé sur Sepolia
pub const ZART_TOKEN_CONTRACT_ADDRESS: Address =
    address!("0x7F0c6e462e391E08625DAa30a83F40607867c706");

/// Chaîne attendue : Sepolia
pub const EXPECTED_CHAIN_ID: ChainId = ChainId::SEPOLIA;

/// Endpoint public Sepolia (sans clé d'API)
pub const DEFAULT_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

/// Explorer utilisé pour le lien du token
pub const DEFAULT_EXPLORER_URL: &str = "https://sepolia.etherscan.io";

/// Intervalle de polling du wallet et des events Transfer (secondes)
pub const DEFAULT_POLL_SECS: u64 = 4;

/// Configuration de l'application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Endpoint JSON-RPC en lecture seule (métadonnées, balance, logs)
    pub rpc_url: String,

    /// Endpoint du wallet provider (eth_accounts, eth_requestAccounts, eth_chainId)
    /// CONCEPT : None = aucun wallet détecté (équivalent de window.ethereum absent)
    pub wallet_url: Option<String>,

    /// Contrat du token
    pub contract_address: Address,

    /// Chaîne sur laquelle toutes les actions sont autorisées
    pub expected_chain_id: ChainId,

    /// Base de l'explorer (lien vers la page du token)
    pub explorer_url: String,

    /// Intervalle de polling en secondes
    pub poll_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            wallet_url: None,
            contract_address: ZART_TOKEN_CONTRACT_ADDRESS,
            expected_chain_id: EXPECTED_CHAIN_ID,
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            poll_secs: DEFAULT_POLL_SECS,
        }
    }
}

impl Config {
    /// Charge la configuration complète (défauts → fichier → environnement)
    pub fn load() -> Result<Self> {
        let mut config = match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;

        info!(
            contract = %config.contract_address,
            chain = %config.expected_chain_id,
            wallet = config.wallet_url.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Lit un fichier JSON de configuration
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {}", path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("Configuration invalide dans {}", path.display()))
    }

    /// Applique les surcharges d'environnement
    ///
    /// CONCEPT RUST : Injection de dépendance par closure
    /// - En prod : |key| std::env::var(key).ok()
    /// - En test : une HashMap, sans toucher à l'environnement du process
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ZART_RPC_URL") {
            self.rpc_url = url;
        }

        if let Some(url) = lookup("ZART_WALLET_URL") {
            // Variable vide = désactive explicitement le wallet
            self.wallet_url = if url.trim().is_empty() { None } else { Some(url) };
        }

        if let Some(raw) = lookup("ZART_CONTRACT_ADDRESS") {
            self.contract_address = raw
                .trim()
                .parse()
                .with_context(|| format!("ZART_CONTRACT_ADDRESS invalide : {}", raw))?;
        }

        if let Some(raw) = lookup("ZART_CHAIN_ID") {
            self.expected_chain_id = raw
                .parse()
                .with_context(|| format!("ZART_CHAIN_ID invalide : {}", raw))?;
        }

        if let Some(raw) = lookup("ZART_POLL_SECS") {
            self.poll_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("ZART_POLL_SECS invalide : {}", raw))?;
        }

        Ok(())
    }

    /// Lien explorer vers la page du token
    pub fn token_explorer_url(&self) -> String {
        format!(
            "{}/token/{}",
            self.explorer_url.trim_end_matches('/'),
            self.contract_address
        )
    }

    /// Intervalle de polling (minimum 1 seconde)
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs.max(1))
    }
}

/// Chemin par défaut du fichier de config
///
/// - Linux : ~/.config/zartwallet/config.json
/// - macOS : ~/Library/Application Support/zartwallet/config.json
/// - Windows : C:\Users\<user>\AppData\Roaming\zartwallet\config.json
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("zartwallet").join("config.json"))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.expected_chain_id.to_string(), "0xaa36a7");
        assert_eq!(config.contract_address, ZART_TOKEN_CONTRACT_ADDRESS);
        assert!(config.wallet_url.is_none());
        assert_eq!(config.poll_interval(), Duration::from_secs(4));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "wallet_url": "http://127.0.0.1:8545" }"#).unwrap();

        assert_eq!(config.wallet_url.as_deref(), Some("http://127.0.0.1:8545"));
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.expected_chain_id, EXPECTED_CHAIN_ID);
    }

    #[test]
    fn test_json_chain_id_formats() {
        let config: Config =
            serde_json::from_str(r#"{ "expected_chain_id": "31337" }"#).unwrap();
        assert_eq!(config.expected_chain_id, ChainId(31337));
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("ZART_RPC_URL", "http://localhost:8545"),
            ("ZART_WALLET_URL", "http://localhost:9545"),
            ("ZART_CHAIN_ID", "0x7a69"),
            ("ZART_POLL_SECS", "0"),
        ]);

        let mut config = Config::default();
        config.apply_env(|key| vars.get(key).cloned()).unwrap();

        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.wallet_url.as_deref(), Some("http://localhost:9545"));
        assert_eq!(config.expected_chain_id, ChainId(31337));
        // 0 seconde est ramené à 1
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_env_empty_wallet_disables_provider() {
        let vars = env(&[("ZART_WALLET_URL", "  ")]);

        let mut config = Config::default();
        config.wallet_url = Some("http://localhost:9545".to_string());
        config.apply_env(|key| vars.get(key).cloned()).unwrap();

        assert!(config.wallet_url.is_none());
    }

    #[test]
    fn test_env_invalid_values() {
        let vars = env(&[("ZART_CHAIN_ID", "sepolia")]);
        let mut config = Config::default();
        assert!(config.apply_env(|key| vars.get(key).cloned()).is_err());

        let vars = env(&[("ZART_CONTRACT_ADDRESS", "0x1234")]);
        let mut config = Config::default();
        assert!(config.apply_env(|key| vars.get(key).cloned()).is_err());
    }

    #[test]
    fn test_token_explorer_url() {
        let mut config = Config::default();
        config.explorer_url = "https://sepolia.etherscan.io/".to_string();
        let url = config.token_explorer_url();

        assert!(url.starts_with("https://sepolia.etherscan.io/token/0x"));
        assert!(url
            .to_lowercase()
            .ends_with("7f0c6e462e391e08625daa30a83f40607867c706"));
    }
}
