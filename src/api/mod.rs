// ============================================================================
// Module : api
// ============================================================================
// Source des historiques de prix et taxonomie des échecs de fetch
//
// CONCEPT RUST : Trait comme point d'injection
// - PriceSource abstrait le transport HTTP
// - CoinGeckoClient est l'implémentation réelle
// - Les tests injectent des sources scriptées
// ============================================================================

pub mod coingecko; // Client API CoinGecko (market_chart)

use std::time::Duration;

use async_trait::async_trait;

use crate::models::{PriceSeries, TimeRange};

pub use coingecko::CoinGeckoClient;

/// Échec classifié d'un fetch d'historique
///
/// Tous ces échecs sont récupérables : le service les remplace par le cache
/// ou par des données synthétiques.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchFailure {
    /// HTTP 429, avec éventuellement un délai Retry-After
    #[error("rate limit atteint (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// HTTP 401 / 403
    #[error("autorisation refusée (HTTP {status})")]
    Auth { status: u16 },

    /// Réponse reçue mais sans série exploitable
    #[error("réponse malformée : {0}")]
    Malformed(String),

    /// Requête échouée (connexion, timeout) ou statut HTTP inattendu
    #[error("erreur réseau : {0}")]
    Network(String),
}

impl FetchFailure {
    /// Nom court pour les logs
    pub fn kind(&self) -> &'static str {
        match self {
            FetchFailure::RateLimited { .. } => "rate_limited",
            FetchFailure::Auth { .. } => "auth_error",
            FetchFailure::Malformed(_) => "malformed_response",
            FetchFailure::Network(_) => "network_error",
        }
    }

    /// Délai suggéré par l'API avant de réessayer
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FetchFailure::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Résultat d'un fetch : série validée ou échec classifié
pub type FetchOutcome = Result<PriceSeries, FetchFailure>;

/// Source d'historiques de prix
///
/// CONCEPT RUST : async_trait
/// - Les méthodes async dans un trait objet (dyn) nécessitent la macro
/// - Le Future retourné est Send, donc utilisable dans tokio::spawn
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Récupère l'historique de prix d'un coin sur une fenêtre
    async fn fetch_market_chart(&self, coin_id: &str, range: TimeRange) -> FetchOutcome;
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_and_retry_after() {
        let limited = FetchFailure::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(limited.kind(), "rate_limited");
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(30)));

        let auth = FetchFailure::Auth { status: 401 };
        assert_eq!(auth.kind(), "auth_error");
        assert_eq!(auth.retry_after(), None);
        assert_eq!(auth.to_string(), "autorisation refusée (HTTP 401)");
    }
}
