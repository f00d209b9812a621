// ============================================================================
// CoinWatch - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;     // Source des historiques de prix (CoinGecko)
pub mod app;     // État de l'application
pub mod config;  // Constantes de réglage et configuration du service
pub mod models;  // Structures de données
pub mod service; // Cache, rate limit, file de requêtes
pub mod ui;      // Interface utilisateur
