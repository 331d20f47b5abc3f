// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Polling non bloquant : la boucle UI reste réactive aux résultats du worker
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

// ============================================================================
// Enum Event
// ============================================================================
// CONCEPT RUST : Enums avec données
// - Chaque variant peut contenir des données différentes
// - Key(KeyEvent) : stocke l'événement clavier complet
// - Tick : variant sans données (unit variant)
//
// C'est plus puissant que les enums en C/Java !
// ============================================================================

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (laisse la boucle appliquer les résultats du worker)
    Tick,
}

// ============================================================================
// Structure EventHandler
// ============================================================================
// CONCEPT : Singleton pattern pour gérer les événements
// - Un seul handler pour toute l'application
// - Pas besoin de stocker d'état (stateless)
// ============================================================================

/// Gestionnaire d'événements
pub struct EventHandler;

impl EventHandler {
    /// Crée un nouveau gestionnaire d'événements
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT RUST : Result et ?
    /// - poll() peut échouer (I/O error)
    /// - read() peut échouer
    /// - ? propage automatiquement les erreurs
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend max 250ms
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    /// - Si événement, le lit et le convertit
    pub fn next(&self) -> Result<Event> {
        // Poll avec timeout de 250ms
        // CONCEPT RUST : if expression
        // - if retourne une valeur en Rust (comme un ternaire ?)
        if event::poll(Duration::from_millis(250))? {
            // Il y a un événement, on le lit
            match event::read()? {
                // Événement clavier
                CrosstermEvent::Key(key) => {
                    // CONCEPT : Filter sur KeyEventKind
                    // Sur certains OS, on reçoit Press ET Release
                    // On ne veut gérer que Press pour éviter les doublons
                    if key.kind == KeyEventKind::Press {
                        Ok(Event::Key(key))
                    } else {
                        // Ignore Release, retourne Tick
                        Ok(Event::Tick)
                    }
                }

                // Autres événements (resize, mouse, etc.) ignorés pour l'instant
                _ => Ok(Event::Tick),
            }
        } else {
            // Timeout : pas d'événement, retourne Tick
            Ok(Event::Tick)
        }
    }
}

// ============================================================================
// Helper : Convertir KeyEvent en action
// ============================================================================
// CONCEPT RUST : Pattern matching avancé
// - Match sur KeyCode pour identifier la touche
// - Peut aussi matcher sur les modifiers (Ctrl, Alt, Shift)
// ============================================================================

/// Vérifie si l'événement est la touche 'q' (quitter)
pub fn is_quit_event(event: &Event) -> bool {
    // CONCEPT RUST : Pattern matching avec if let
    // - Destructure Event::Key et vérifie le KeyCode en une ligne
    // - Plus élégant que match pour un seul cas
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
    } else {
        false
    }
}

/// Vérifie si l'événement est Échap
pub fn is_escape_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Esc)
    } else {
        false
    }
}

/// Vérifie si l'événement est 'c' (connect / disconnect)
///
/// CONCEPT : Un seul bouton toggle
/// - Sans session : demande de connexion
/// - Avec session : déconnexion
pub fn is_connect_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
    } else {
        false
    }
}

/// Vérifie si l'événement est 'b' (buy/sell)
pub fn is_buy_sell_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('b') | KeyCode::Char('B'))
    } else {
        false
    }
}

/// Vérifie si l'événement est 'f' (faucet)
pub fn is_faucet_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('f') | KeyCode::Char('F'))
    } else {
        false
    }
}

/// Vérifie si l'événement est 'r' (relire la balance)
pub fn is_refresh_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('r') | KeyCode::Char('R'))
    } else {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_quit_event() {
        let quit_event = Event::Key(KeyEvent::new(KeyCode::Char('q'), event::KeyModifiers::empty()));
        assert!(is_quit_event(&quit_event));

        let other_event = Event::Key(KeyEvent::new(KeyCode::Char('a'), event::KeyModifiers::empty()));
        assert!(!is_quit_event(&other_event));

        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_action_keys() {
        let key = |c| Event::Key(KeyEvent::new(KeyCode::Char(c), event::KeyModifiers::empty()));

        assert!(is_connect_event(&key('c')));
        assert!(is_connect_event(&key('C')));
        assert!(is_buy_sell_event(&key('b')));
        assert!(is_faucet_event(&key('f')));
        assert!(is_refresh_event(&key('r')));

        assert!(!is_connect_event(&key('b')));
        assert!(!is_refresh_event(&Event::Tick));
    }

    #[test]
    fn test_is_escape_event() {
        let esc = Event::Key(KeyEvent::new(KeyCode::Esc, event::KeyModifiers::empty()));
        assert!(is_escape_event(&esc));
        assert!(!is_escape_event(&Event::Tick));
    }
}
