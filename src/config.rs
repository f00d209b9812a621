// ============================================================================
// Module : config
// ============================================================================
// Constantes de réglage du service de données de prix
//
// Les valeurs par défaut équilibrent les limites de l'API gratuite CoinGecko
// (10 à 50 requêtes par minute) et la fraîcheur des graphiques.
// Seules l'URL et la clé d'API peuvent venir de l'environnement.
// ============================================================================

use std::time::Duration;

/// Durée pendant laquelle une entrée du cache est considérée fraîche
pub const CACHE_DURATION: Duration = Duration::from_secs(20 * 60);

/// Délai minimum entre deux requêtes de la file
pub const REQUEST_DELAY: Duration = Duration::from_secs(3);

/// Intervalle de re-vérification pendant un cooldown de rate limit
pub const RATE_LIMIT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Nombre d'échecs consécutifs qui déclenche le cooldown
pub const ERROR_THRESHOLD: u32 = 5;

/// Durée du cooldown quand l'API ne fournit pas de Retry-After
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(15 * 60);

/// Timeout d'une requête (dépassement = erreur réseau)
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// URL de base de l'API (ou d'un proxy local qui la relaie)
pub const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Variables d'environnement reconnues
pub const API_URL_ENV: &str = "COINWATCH_API_URL";
pub const API_KEY_ENV: &str = "COINWATCH_API_KEY";

/// Configuration du service de données de prix
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub cache_duration: Duration,
    pub request_delay: Duration,
    pub rate_limit_poll_interval: Duration,
    pub error_threshold: u32,
    pub rate_limit_cooldown: Duration,
    pub request_timeout: Duration,
    pub api_url: String,
    /// Clé envoyée dans le header x-cg-pro-api-key (optionnelle)
    pub api_key: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_duration: CACHE_DURATION,
            request_delay: REQUEST_DELAY,
            rate_limit_poll_interval: RATE_LIMIT_POLL_INTERVAL,
            error_threshold: ERROR_THRESHOLD,
            rate_limit_cooldown: RATE_LIMIT_COOLDOWN,
            request_timeout: REQUEST_TIMEOUT,
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
        }
    }
}

impl ServiceConfig {
    /// Configuration par défaut, surchargée par les variables d'environnement
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// CONCEPT RUST : injection d'une closure de lecture
    /// - from_env() passe std::env::var
    /// - les tests passent une table en mémoire
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }
        config.api_key = lookup(API_KEY_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        config
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.cache_duration, Duration::from_secs(1200));
        assert!(config.request_delay >= Duration::from_secs(3));
        assert_eq!(config.error_threshold, 5);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (API_URL_ENV, "http://localhost:3000/api/coingecko/"),
            (API_KEY_ENV, "  secret  "),
        ]
        .into_iter()
        .collect();

        let config = ServiceConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.api_url, "http://localhost:3000/api/coingecko");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let config = ServiceConfig::from_lookup(|_| Some("   ".to_string()));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.api_key.is_none());
    }
}
