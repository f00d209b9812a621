// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier, les resize du terminal et les ticks
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Error handling avec Result
// 3. Pattern matching : une fonction is_*_event par action
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Événements de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Terminal redimensionné (colonnes, lignes)
    Resize(u16, u16),

    /// Tick régulier : redessine pour afficher les résultats arrivés entre-temps
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(tick_rate) attend au plus tick_rate
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.tick_rate)? {
            return Ok(Event::Tick);
        }

        let event = match event::read()? {
            // Sur certains OS, on reçoit Press ET Release : on ne garde que Press
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
            CrosstermEvent::Resize(cols, rows) => Event::Resize(cols, rows),
            _ => Event::Tick,
        };
        Ok(event)
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

// ============================================================================
// Helpers : Convertir KeyEvent en action
// ============================================================================

fn key_matches(event: &Event, accept: impl Fn(KeyCode) -> bool) -> bool {
    match event {
        Event::Key(key) => accept(key.code),
        _ => false,
    }
}

/// 'q' : quitter (two-step)
pub fn is_quit_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('q') | KeyCode::Char('Q')))
}

/// Flèche vers le haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K')))
}

/// Flèche vers le bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J')))
}

/// 'l' ou flèche droite : fenêtre suivante
pub fn is_next_range_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('l') | KeyCode::Right))
}

/// 'h' ou flèche gauche : fenêtre précédente
pub fn is_previous_range_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('h') | KeyCode::Left))
}

/// 't' : thème clair / sombre
pub fn is_theme_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('t') | KeyCode::Char('T')))
}

/// 'r' : relancer un chargement en échec
pub fn is_retry_event(event: &Event) -> bool {
    key_matches(event, |code| matches!(code, KeyCode::Char('r') | KeyCode::Char('R')))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_range_and_navigation_keys() {
        assert!(is_next_range_event(&key(KeyCode::Char('l'))));
        assert!(is_next_range_event(&key(KeyCode::Right)));
        assert!(is_previous_range_event(&key(KeyCode::Char('h'))));
        assert!(is_up_event(&key(KeyCode::Char('k'))));
        assert!(is_down_event(&key(KeyCode::Down)));
        assert!(!is_down_event(&Event::Resize(80, 24)));
    }

    #[test]
    fn test_theme_and_retry_keys() {
        assert!(is_theme_event(&key(KeyCode::Char('t'))));
        assert!(is_retry_event(&key(KeyCode::Char('r'))));
        assert!(!is_retry_event(&key(KeyCode::Char('t'))));
    }
}
