// ============================================================================
// Structures : Balance et BalanceView
// ============================================================================
// Balance ERC-20 du compte connecté et son état d'affichage
//
// CONCEPTS RUST :
// 1. U256 : entier 256 bits (les balances ERC-20 dépassent u128)
// 2. Enum d'état : BalanceView ne peut pas afficher un nombre périmé
//    - Le variant Ready est le seul qui porte une valeur
//    - App dérive la vue à chaque lecture, l'invariant tient par construction
// ============================================================================

use std::fmt;

use alloy_primitives::U256;

/// Balance brute d'un compte + décimales du token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    /// Valeur on-chain (unité minimale, comme wei pour l'ETH)
    pub raw: U256,

    /// Décimales du token (0–255)
    pub decimals: u8,
}

impl Balance {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Montant formaté pour l'affichage ("1.5", "0.0", "100.0")
    pub fn formatted(&self) -> String {
        format_units(self.raw, self.decimals)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

/// Formate une valeur brute avec `decimals` chiffres après la virgule
///
/// CONCEPT : Arithmétique sur chaîne plutôt que 10^decimals
/// - 10^255 ne tient pas dans un U256 (max ≈ 1.16e77)
/// - On découpe la représentation décimale à la bonne position
///
/// Format : partie entière, ".", fraction sans zéros finaux mais au moins un chiffre
/// - format_units(0, 18) → "0.0"
/// - format_units(1_500_000_000_000_000_000, 18) → "1.5"
/// - format_units(100, 0) → "100.0"
pub fn format_units(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    let decimals = decimals as usize;

    // Padding à gauche pour avoir au moins un chiffre de partie entière
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };

    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_trimmed = frac_part.trim_end_matches('0');

    if frac_trimmed.is_empty() {
        format!("{}.0", int_part)
    } else {
        format!("{}.{}", int_part, frac_trimmed)
    }
}

/// État d'affichage de la balance
///
/// CONCEPT RUST : Enum pour state machine d'affichage
/// - Unavailable : pas de session (ou session fermée)
/// - WrongNetwork : session sur une autre chaîne que la chaîne attendue
/// - Loading : requête balanceOf en cours
/// - Ready : valeur fraîche
/// - Error : la dernière requête a échoué
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceView {
    Unavailable,
    WrongNetwork,
    Loading,
    Ready(Balance),
    Error,
}

impl BalanceView {
    /// Texte affiché dans le champ balance
    pub fn label(&self) -> String {
        match self {
            BalanceView::Unavailable => "N/A".to_string(),
            BalanceView::WrongNetwork => "N/A (Wrong Network)".to_string(),
            BalanceView::Loading => "Loading...".to_string(),
            BalanceView::Ready(balance) => balance.formatted(),
            BalanceView::Error => "Error".to_string(),
        }
    }

    /// Retourne la balance si elle est affichable
    pub fn balance(&self) -> Option<&Balance> {
        match self {
            BalanceView::Ready(balance) => Some(balance),
            _ => None,
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units_basic() {
        let one_and_half = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(format_units(one_and_half, 18), "1.5");

        assert_eq!(format_units(U256::ZERO, 18), "0.0");
        assert_eq!(format_units(U256::from(100u64), 0), "100.0");
        assert_eq!(format_units(U256::from(1u64), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::from(1_000_000u64), 6), "1.0");
        assert_eq!(format_units(U256::from(1_234_567u64), 6), "1.234567");
    }

    #[test]
    fn test_format_units_extreme_decimals() {
        // 10^255 déborderait un U256, le découpage par chaîne fonctionne
        let formatted = format_units(U256::from(5u64), 255);
        assert!(formatted.starts_with("0.000"));
        assert!(formatted.ends_with('5'));
        assert_eq!(formatted.len(), "0.".len() + 255);

        let max = format_units(U256::MAX, 0);
        assert_eq!(max, format!("{}.0", U256::MAX));
    }

    #[test]
    fn test_balance_view_labels() {
        let balance = Balance::new(U256::from(2_000_000_000_000_000_000u128), 18);

        assert_eq!(BalanceView::Unavailable.label(), "N/A");
        assert_eq!(BalanceView::WrongNetwork.label(), "N/A (Wrong Network)");
        assert_eq!(BalanceView::Error.label(), "Error");
        assert_eq!(BalanceView::Ready(balance).label(), "2.0");
        assert_eq!(BalanceView::Ready(balance).balance(), Some(&balance));
        assert!(BalanceView::Loading.balance().is_none());
    }
}
