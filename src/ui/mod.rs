// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod chart;      // Grand graphique (aire + ligne, axes, bannière)
pub mod dashboard;  // Rendu de l'écran principal
pub mod events;     // Gestion des événements clavier et resize
pub mod mini_chart; // Sparklines de la watchlist

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
