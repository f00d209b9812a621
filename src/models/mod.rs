// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module public (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod coin;           // Table des coins connus, couleurs, format des prix
pub mod series;         // PricePoint, PriceSeries, Provenance
pub mod synthetic;      // Générateur de séries synthétiques
pub mod time_range;     // Fenêtres de temps (1h ... all)
pub mod watchlist_item; // Une ligne de la watchlist et son abonnement

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use coinwatch::models::series::PriceSeries;
// On peut faire : use coinwatch::models::PriceSeries;
pub use series::{PricePoint, PriceSeries, Provenance, ResolvedSeries};
pub use time_range::TimeRange;
pub use watchlist_item::WatchlistItem;
